use anyhow::{bail, Context, Result};
use boolsearch_core::{Analyzer, DocId, TokenizedDoc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One corpus record: either pre-stemmed or raw text to analyze.
#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    #[serde(default)]
    stems: Option<Vec<String>>,
    #[serde(default)]
    text: Option<String>,
}

/// Collects `.json` / `.jsonl` files under `input` (or `input` itself).
pub fn corpus_files(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input {} does not exist", input.display());
    }
    Ok(files)
}

pub fn read_corpus(input: &Path, analyzer: &dyn Analyzer) -> Result<Vec<TokenizedDoc>> {
    let mut docs = Vec::new();
    for file in corpus_files(input)? {
        let before = docs.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, analyzer, &mut docs)?;
        } else {
            read_json(&file, analyzer, &mut docs)?;
        }
        tracing::debug!(file = %file.display(), docs = docs.len() - before, "read corpus file");
    }
    tracing::info!(num_docs = docs.len(), "corpus loaded");
    Ok(docs)
}

fn read_jsonl(file: &Path, analyzer: &dyn Analyzer, docs: &mut Vec<TokenizedDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed record", file.display(), lineno + 1))?;
        docs.push(into_tokenized(doc, analyzer)?);
    }
    Ok(())
}

fn read_json(file: &Path, analyzer: &dyn Analyzer, docs: &mut Vec<TokenizedDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(into_tokenized(serde_json::from_value(v)?, analyzer)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(into_tokenized(serde_json::from_value(json)?, analyzer)?),
        _ => bail!("{}: expected an object or an array of objects", file.display()),
    }
    Ok(())
}

fn into_tokenized(doc: InputDoc, analyzer: &dyn Analyzer) -> Result<TokenizedDoc> {
    if doc.id == 0 {
        bail!("document ids must be positive");
    }
    let stems = match (doc.stems, doc.text) {
        (Some(stems), _) => stems,
        (None, Some(text)) => analyzer.analyze(&text),
        (None, None) => bail!("document {} has neither stems nor text", doc.id),
    };
    Ok(TokenizedDoc { doc_id: doc.id, stems })
}
