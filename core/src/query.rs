//! Infix boolean expression → postfix token stream.
//!
//! Grammar: bare-term operands, binary `AND` / `OR` (left-associative), unary
//! prefix `NOT`, parentheses. Precedence `NOT` > `AND` > `OR`. Operator
//! keywords are case-insensitive and emitted uppercase; operands are emitted
//! lowercase.
//!
//! An operand or `)` directly followed by `NOT` gets an implicit `AND`, so
//! `a NOT b` compiles to `a b NOT AND`. Other arity mistakes (`a b`,
//! `AND a`) are left for the evaluator to reject.

use crate::error::{Result, SearchError};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Term(String),
    And,
    Or,
    Not,
}

impl Token {
    fn precedence(&self) -> u8 {
        match self {
            Token::Not => 3,
            Token::And => 2,
            Token::Or => 1,
            Token::Term(_) => 0,
        }
    }

    pub fn is_operator(&self) -> bool {
        !matches!(self, Token::Term(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Term(t) => f.write_str(t),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::Not => f.write_str("NOT"),
        }
    }
}

/// Space-joined postfix form, e.g. `a b NOT AND`.
pub fn render(tokens: &[Token]) -> String {
    tokens.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Lexeme {
    Open,
    Close,
    Tok(Token),
}

fn lex(query: &str) -> Vec<Lexeme> {
    let mut out = Vec::new();
    for word in query.split_whitespace() {
        let mut rest = word;
        while !rest.is_empty() {
            match rest.find(['(', ')']) {
                Some(0) => {
                    out.push(if rest.starts_with('(') { Lexeme::Open } else { Lexeme::Close });
                    rest = &rest[1..];
                }
                Some(i) => {
                    out.push(Lexeme::Tok(classify(&rest[..i])));
                    rest = &rest[i..];
                }
                None => {
                    out.push(Lexeme::Tok(classify(rest)));
                    rest = "";
                }
            }
        }
    }
    out
}

fn classify(word: &str) -> Token {
    if word.eq_ignore_ascii_case("and") {
        Token::And
    } else if word.eq_ignore_ascii_case("or") {
        Token::Or
    } else if word.eq_ignore_ascii_case("not") {
        Token::Not
    } else {
        Token::Term(word.to_lowercase())
    }
}

#[derive(Debug)]
enum Pending {
    Open,
    Op(Token),
}

/// Shunting-yard translation. Empty input yields an empty stream.
pub fn to_postfix(query: &str) -> Result<Vec<Token>> {
    let mut output: Vec<Token> = Vec::new();
    let mut ops: Vec<Pending> = Vec::new();
    // True when the previous lexeme closed an operand (a term or `)`).
    let mut after_operand = false;

    for lexeme in lex(query) {
        match lexeme {
            Lexeme::Tok(Token::Term(t)) => {
                output.push(Token::Term(t));
                after_operand = true;
            }
            Lexeme::Tok(Token::Not) => {
                if after_operand {
                    push_binary(Token::And, &mut ops, &mut output);
                }
                // Prefix unary: never pops what is already pending.
                ops.push(Pending::Op(Token::Not));
                after_operand = false;
            }
            Lexeme::Tok(op) => {
                push_binary(op, &mut ops, &mut output);
                after_operand = false;
            }
            Lexeme::Open => {
                ops.push(Pending::Open);
                after_operand = false;
            }
            Lexeme::Close => {
                loop {
                    match ops.pop() {
                        Some(Pending::Op(op)) => output.push(op),
                        Some(Pending::Open) => break,
                        None => return Err(SearchError::Syntax("unmatched ')'".into())),
                    }
                }
                after_operand = true;
            }
        }
    }

    while let Some(pending) = ops.pop() {
        match pending {
            Pending::Op(op) => output.push(op),
            Pending::Open => return Err(SearchError::Syntax("unmatched '('".into())),
        }
    }

    tracing::debug!(query, postfix = %render(&output), "compiled query");
    Ok(output)
}

/// Same as [`to_postfix`] for raw bytes that have not been checked for UTF-8.
pub fn to_postfix_bytes(query: &[u8]) -> Result<Vec<Token>> {
    let text = std::str::from_utf8(query)
        .map_err(|e| SearchError::InputEncoding(format!("query is not valid UTF-8: {e}")))?;
    to_postfix(text)
}

fn push_binary(op: Token, ops: &mut Vec<Pending>, output: &mut Vec<Token>) {
    while let Some(Pending::Op(top)) = ops.last() {
        if top.precedence() < op.precedence() {
            break;
        }
        if let Some(Pending::Op(top)) = ops.pop() {
            output.push(top);
        }
    }
    ops.push(Pending::Op(op));
}
