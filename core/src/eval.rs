//! Postfix stack machine over document-id sets.

use crate::error::{Result, SearchError};
use crate::postings::PostingList;
use crate::query::Token;
use crate::tokenizer::Normalizer;
use crate::{DocId, InvertedIndex};
use std::borrow::Cow;

/// Evaluates postfix token streams against one resident index. Synchronous,
/// no I/O.
pub struct Evaluator<'a> {
    index: &'a InvertedIndex,
    normalizer: &'a dyn Normalizer,
}

impl<'a> Evaluator<'a> {
    pub fn new(index: &'a InvertedIndex, normalizer: &'a dyn Normalizer) -> Self {
        Self { index, normalizer }
    }

    /// Result in ascending doc-id order. Any arity violation fails the whole
    /// query; no partial result is produced.
    pub fn evaluate(&self, postfix: &[Token]) -> Result<Vec<DocId>> {
        self.evaluate_set(postfix).map(PostingList::into_vec)
    }

    pub fn evaluate_set(&self, postfix: &[Token]) -> Result<PostingList> {
        let mut stack: Vec<Cow<'a, PostingList>> = Vec::with_capacity(postfix.len());

        for (pos, token) in postfix.iter().enumerate() {
            match token {
                Token::Term(raw) => stack.push(Cow::Borrowed(self.resolve(raw)?)),
                Token::And => {
                    let (lhs, rhs) = pop_pair(&mut stack, token, pos)?;
                    stack.push(Cow::Owned(lhs.intersect(&rhs)));
                }
                Token::Or => {
                    let (lhs, rhs) = pop_pair(&mut stack, token, pos)?;
                    stack.push(Cow::Owned(lhs.union(&rhs)));
                }
                Token::Not => {
                    // Unary: complements only the most recent set.
                    let operand = stack.pop().ok_or_else(|| underflow(token, pos))?;
                    stack.push(Cow::Owned(self.index.universe().difference(&operand)));
                }
            }
        }

        match stack.len() {
            1 => {
                let result = stack.pop().map(Cow::into_owned).unwrap_or_default();
                tracing::debug!(hits = result.len(), "query evaluated");
                Ok(result)
            }
            0 => Err(SearchError::QueryEvaluation("empty query".into())),
            n => Err(SearchError::QueryEvaluation(format!(
                "query left {n} unconnected operands; join them with AND or OR"
            ))),
        }
    }

    fn resolve(&self, raw: &str) -> Result<&'a PostingList> {
        let term = self.normalizer.normalize(raw);
        if term.is_empty() {
            return Err(SearchError::InputEncoding(format!("operand {raw:?} is empty after normalization")));
        }
        Ok(self.index.lookup(&term))
    }
}

fn underflow(token: &Token, pos: usize) -> SearchError {
    SearchError::QueryEvaluation(format!("operator {token} at position {pos} is missing an operand"))
}

fn pop_pair<'a>(
    stack: &mut Vec<Cow<'a, PostingList>>,
    token: &Token,
    pos: usize,
) -> Result<(Cow<'a, PostingList>, Cow<'a, PostingList>)> {
    if stack.len() < 2 {
        return Err(underflow(token, pos));
    }
    let rhs = stack.pop().ok_or_else(|| underflow(token, pos))?;
    let lhs = stack.pop().ok_or_else(|| underflow(token, pos))?;
    Ok((lhs, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::to_postfix;
    use crate::tokenizer::Identity;
    use crate::TokenizedDoc;

    fn index() -> InvertedIndex {
        InvertedIndex::build(&[
            TokenizedDoc::new(1, ["a", "b"]),
            TokenizedDoc::new(2, ["b", "c"]),
            TokenizedDoc::new(3, ["c"]),
        ])
    }

    fn run(q: &str) -> Result<Vec<DocId>> {
        let index = index();
        Evaluator::new(&index, &Identity).evaluate(&to_postfix(q)?)
    }

    #[test]
    fn basic_operators() {
        assert_eq!(run("a AND b").unwrap(), vec![1]);
        assert_eq!(run("a OR c").unwrap(), vec![1, 2, 3]);
        assert_eq!(run("NOT b").unwrap(), vec![3]);
        assert_eq!(run("NOT missing").unwrap(), vec![1, 2, 3]);
        assert_eq!(run("b NOT a").unwrap(), vec![2]);
        assert!(run("missing").unwrap().is_empty());
    }

    #[test]
    fn not_is_strictly_unary() {
        let index = index();
        let ev = Evaluator::new(&index, &Identity);
        // Without the implicit AND two sets remain on the stack.
        let tokens = vec![Token::Term("b".into()), Token::Term("a".into()), Token::Not];
        assert!(matches!(ev.evaluate(&tokens), Err(SearchError::QueryEvaluation(_))));
    }

    #[test]
    fn arity_errors() {
        assert!(matches!(run("AND a"), Err(SearchError::QueryEvaluation(_))));
        assert!(matches!(run("a OR"), Err(SearchError::QueryEvaluation(_))));
        assert!(matches!(run("NOT"), Err(SearchError::QueryEvaluation(_))));
        assert!(matches!(run("a b"), Err(SearchError::QueryEvaluation(_))));
        assert!(matches!(run(""), Err(SearchError::QueryEvaluation(_))));
    }

    #[test]
    fn empty_operand_after_normalization() {
        struct Blank;
        impl Normalizer for Blank {
            fn normalize(&self, _raw: &str) -> String {
                String::new()
            }
        }
        let index = index();
        let err = Evaluator::new(&index, &Blank).evaluate(&to_postfix("a").unwrap()).unwrap_err();
        assert!(matches!(err, SearchError::InputEncoding(_)));
    }
}
