//! # AICC Prerequisite Expressions
//!
//! Boolean expressions over AICC system ids, as written in `.pre` files and
//! SCORM 1.2 `aicc_script` prerequisites:
//!
//! ```text
//! expr    := or
//! or      := and ('|' and)*
//! and     := not ('&' not)*
//! not     := '~' not | primary
//! primary := '(' expr ')' | IDENT
//! ```
//!
//! `AND`, `OR` and `NOT` (any case) are accepted as keyword spellings of
//! the operators. The tree is immutable; n-ary `And`/`Or` nodes are
//! flattened on construction and a run of `~` collapses to its parity, so
//! parsed trees never hold `Not(Not(..))`.

use crate::PackageError;
use crate::primitives::MAX_TREE_DEPTH;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A parsed prerequisite expression.
///
/// `And` and `Or` always hold at least two operands when built by
/// [`PrerequisiteExpression::parse`], [`PrerequisiteExpression::and`] or
/// [`PrerequisiteExpression::or`]. An empty operand list has no textual
/// form and does not survive `Display`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrerequisiteExpression {
    /// A structure element that must be completed.
    Reference(String),
    Not(Box<PrerequisiteExpression>),
    /// All operands hold. Never nests another `And`.
    And(Vec<PrerequisiteExpression>),
    /// Any operand holds. Never nests another `Or`.
    Or(Vec<PrerequisiteExpression>),
}

impl PrerequisiteExpression {
    /// Parse an expression.
    pub fn parse(input: &str) -> Result<Self, PackageError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens,
            index: 0,
        };
        let expression = parser.expression(0)?;
        if let Some(token) = parser.peek() {
            return Err(parser.error_at(token.position, "unexpected token after expression"));
        }
        Ok(expression)
    }

    /// Conjunction of `operands`, flattened. `None` when there are none.
    #[must_use]
    pub fn and(operands: impl IntoIterator<Item = Self>) -> Option<Self> {
        let mut operands = operands.into_iter();
        let first = operands.next()?;
        Some(Self::combine(first, operands, true))
    }

    /// Disjunction of `operands`, flattened. `None` when there are none.
    #[must_use]
    pub fn or(operands: impl IntoIterator<Item = Self>) -> Option<Self> {
        let mut operands = operands.into_iter();
        let first = operands.next()?;
        Some(Self::combine(first, operands, false))
    }

    /// Logical negation; negating a `Not` unwraps it.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    fn combine(first: Self, rest: impl IntoIterator<Item = Self>, conjunction: bool) -> Self {
        let mut flat = Vec::new();
        for operand in std::iter::once(first).chain(rest) {
            match operand {
                Self::And(inner) if conjunction => flat.extend(inner),
                Self::Or(inner) if !conjunction => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            if let Some(single) = flat.pop() {
                return single;
            }
        }
        if conjunction { Self::And(flat) } else { Self::Or(flat) }
    }

    /// Evaluate against a completion predicate.
    pub fn evaluate<F: Fn(&str) -> bool>(&self, completed: F) -> bool {
        self.eval(&completed)
    }

    fn eval(&self, completed: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Self::Reference(id) => completed(id),
            Self::Not(inner) => !inner.eval(completed),
            Self::And(operands) => operands.iter().all(|o| o.eval(completed)),
            Self::Or(operands) => operands.iter().any(|o| o.eval(completed)),
        }
    }

    /// Referenced ids in order of first appearance, without duplicates.
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        fn collect<'a>(expression: &'a PrerequisiteExpression, out: &mut Vec<&'a str>) {
            match expression {
                PrerequisiteExpression::Reference(id) => {
                    if !out.contains(&id.as_str()) {
                        out.push(id);
                    }
                }
                PrerequisiteExpression::Not(inner) => collect(inner, out),
                PrerequisiteExpression::And(operands) | PrerequisiteExpression::Or(operands) => {
                    for operand in operands {
                        collect(operand, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }
}

// =============================================================================
// DISPLAY / SERDE
// =============================================================================

impl fmt::Display for PrerequisiteExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(id) => f.write_str(id),
            Self::Not(inner) => match inner.as_ref() {
                Self::Reference(_) | Self::Not(_) => write!(f, "~{}", inner),
                _ => write!(f, "~({})", inner),
            },
            Self::And(operands) => {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    match operand {
                        Self::Or(_) | Self::And(_) => write!(f, "({})", operand)?,
                        _ => write!(f, "{}", operand)?,
                    }
                }
                Ok(())
            }
            Self::Or(operands) => {
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    match operand {
                        Self::Or(_) => write!(f, "({})", operand)?,
                        _ => write!(f, "{}", operand)?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl FromStr for PrerequisiteExpression {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PrerequisiteExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PrerequisiteExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TOKENIZER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Ident(String),
    And,
    Or,
    Not,
    Open,
    Close,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

fn tokenize(input: &str) -> Result<Vec<Token>, PackageError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((position, c)) = chars.next() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            '&' => TokenKind::And,
            '|' => TokenKind::Or,
            '~' => TokenKind::Not,
            '(' => TokenKind::Open,
            ')' => TokenKind::Close,
            c if is_ident_char(c) => {
                let mut end = position + c.len_utf8();
                while let Some(&(next, n)) = chars.peek() {
                    if !is_ident_char(n) {
                        break;
                    }
                    end = next + n.len_utf8();
                    chars.next();
                }
                let word = &input[position..end];
                if word.eq_ignore_ascii_case("and") {
                    TokenKind::And
                } else if word.eq_ignore_ascii_case("or") {
                    TokenKind::Or
                } else if word.eq_ignore_ascii_case("not") {
                    TokenKind::Not
                } else {
                    TokenKind::Ident(word.to_string())
                }
            }
            other => {
                return Err(PackageError::InvalidPrerequisite {
                    expression: input.to_string(),
                    position,
                    message: format!("unexpected character '{}'", other),
                });
            }
        };
        tokens.push(Token { kind, position });
    }
    Ok(tokens)
}

// =============================================================================
// PARSER
// =============================================================================

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    index: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn error_at(&self, position: usize, message: &str) -> PackageError {
        PackageError::InvalidPrerequisite {
            expression: self.input.to_string(),
            position,
            message: message.to_string(),
        }
    }

    fn error_at_end(&self, message: &str) -> PackageError {
        self.error_at(self.input.len(), message)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expression(&mut self, depth: usize) -> Result<PrerequisiteExpression, PackageError> {
        if depth > MAX_TREE_DEPTH {
            let position = self.peek().map_or(self.input.len(), |t| t.position);
            return Err(self.error_at(position, "expression nested too deeply"));
        }
        let first = self.conjunction(depth)?;
        let mut rest = Vec::new();
        while self.eat(&TokenKind::Or) {
            rest.push(self.conjunction(depth)?);
        }
        Ok(PrerequisiteExpression::combine(first, rest, false))
    }

    fn conjunction(&mut self, depth: usize) -> Result<PrerequisiteExpression, PackageError> {
        let first = self.negation(depth)?;
        let mut rest = Vec::new();
        while self.eat(&TokenKind::And) {
            rest.push(self.negation(depth)?);
        }
        Ok(PrerequisiteExpression::combine(first, rest, true))
    }

    fn negation(&mut self, depth: usize) -> Result<PrerequisiteExpression, PackageError> {
        let mut negated = false;
        while self.eat(&TokenKind::Not) {
            negated = !negated;
        }
        let expression = self.primary(depth)?;
        Ok(if negated { expression.negate() } else { expression })
    }

    fn primary(&mut self, depth: usize) -> Result<PrerequisiteExpression, PackageError> {
        let Some(token) = self.peek().cloned() else {
            let message = if self.tokens.is_empty() {
                "empty expression"
            } else {
                "expected an identifier or '(' after operator"
            };
            return Err(self.error_at_end(message));
        };
        self.index += 1;
        match token.kind {
            TokenKind::Ident(id) => Ok(PrerequisiteExpression::Reference(id)),
            TokenKind::Open => {
                let inner = self.expression(depth + 1)?;
                if !self.eat(&TokenKind::Close) {
                    return Err(self.error_at(
                        self.peek().map_or(self.input.len(), |t| t.position),
                        &format!("unbalanced parenthesis opened at {}", token.position),
                    ));
                }
                Ok(inner)
            }
            TokenKind::Close => Err(self.error_at(token.position, "unexpected ')'")),
            TokenKind::And | TokenKind::Or | TokenKind::Not => Err(self.error_at(
                token.position,
                "dangling operator: expected an identifier or '('",
            )),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use PrerequisiteExpression::{And, Not, Or, Reference};

    fn r(id: &str) -> PrerequisiteExpression {
        Reference(id.to_string())
    }

    fn parse(s: &str) -> PrerequisiteExpression {
        PrerequisiteExpression::parse(s).expect("parse")
    }

    fn position(s: &str) -> usize {
        match PrerequisiteExpression::parse(s) {
            Err(PackageError::InvalidPrerequisite { position, .. }) => position,
            other => panic!("expected InvalidPrerequisite, got {:?}", other),
        }
    }

    #[test]
    fn precedence_and_flattening() {
        assert_eq!(parse("A1 | A2 & ~A3"), Or(vec![r("A1"), And(vec![r("A2"), Not(Box::new(r("A3")))])]));
        assert_eq!(parse("a&b&(c&d)"), And(vec![r("a"), r("b"), r("c"), r("d")]));
        assert_eq!(parse("((A))"), r("A"));
        assert_eq!(parse("~~A"), r("A"));
        assert_eq!(parse("~ ~ ~A"), Not(Box::new(r("A"))));
        assert_eq!(parse("not ~(~A)"), Not(Box::new(r("A"))));
    }

    #[test]
    fn keyword_aliases() {
        assert_eq!(parse("A and not B OR c"), parse("A & ~B | c"));
    }

    #[test]
    fn evaluates() {
        let e = parse("(A1 | A2) & ~A3");
        assert!(e.evaluate(|id| id == "A1"));
        assert!(!e.evaluate(|id| id == "A1" || id == "A3"));
        assert!(!e.evaluate(|_| false));
    }

    #[test]
    fn references_in_first_appearance_order() {
        assert_eq!(parse("B & (A | B) & ~C").references(), vec!["B", "A", "C"]);
    }

    #[test]
    fn display_is_canonical_and_reparses() {
        let e = parse("~(a|b) & (c | d&e) | f");
        assert_eq!(e.to_string(), "~(a | b) & (c | d & e) | f");
        assert_eq!(parse(&e.to_string()), e);
    }

    #[test]
    fn errors_report_positions() {
        assert_eq!(position(""), 0);
        assert_eq!(position("   "), 3);
        assert_eq!(position("A & "), 4);
        assert_eq!(position("(A | B"), 6);
        assert_eq!(position("A B"), 2);
        assert_eq!(position("A | )"), 4);
        assert_eq!(position("A # B"), 2);
        assert_eq!(position("& A"), 0);
    }

    #[test]
    fn rejects_excessive_nesting() {
        let deep = format!("{}A{}", "(".repeat(200), ")".repeat(200));
        assert!(PrerequisiteExpression::parse(&deep).is_err());
    }

    #[test]
    fn serializes_as_canonical_string() {
        let e = parse("A&B");
        let json = serde_json::to_string(&e).expect("serialize");
        assert_eq!(json, "\"A & B\"");
        let back: PrerequisiteExpression = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, e);
    }

    #[test]
    fn long_negation_runs_collapse() {
        let even = parse(&format!("{}A", "~".repeat(100_000)));
        assert_eq!(even, r("A"));
        let odd = parse(&format!("{}A & B", "~".repeat(100_001)));
        assert_eq!(odd.to_string(), "~A & B");
    }

    #[test]
    fn constructors_keep_operands_non_empty() {
        assert_eq!(PrerequisiteExpression::and(Vec::new()), None);
        assert_eq!(PrerequisiteExpression::or([r("A")]), Some(r("A")));
        let nested = PrerequisiteExpression::and([r("A"), parse("B & C")]).expect("and");
        assert_eq!(nested, And(vec![r("A"), r("B"), r("C")]));
        assert_eq!(r("A").negate().negate(), r("A"));
    }
}
