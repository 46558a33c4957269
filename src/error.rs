use thiserror::Error;

use crate::lr1::Conflict;

/// Failure reported by a scanner while producing the next token.
pub type ScanError = Box<dyn std::error::Error + Send + Sync>;

/// Raised while building a grammar, before any parse is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("nonterminal {0} is referenced but has no rule")]
    UndefinedNonTerminal(String),

    #[error("unknown symbol {0}")]
    UnknownSymbol(String),

    #[error("duplicate symbol {0}")]
    DuplicateSymbol(String),

    #[error("duplicate rule {0}")]
    DuplicateRule(String),

    #[error("start symbol {0} is not a nonterminal of the grammar")]
    MissingStart(String),

    #[error("grammar has no rules")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is not in the language. `furthest` is the last input
    /// position that still had live items (Earley) or the position of the
    /// token the LR driver could not act on.
    #[error("input rejected at position {furthest}{}", describe_found(.found))]
    Rejected {
        furthest: usize,
        expected: Vec<String>,
        found: Option<String>,
    },

    #[error("scanner failed at position {position}: {source}")]
    Scanner {
        position: usize,
        #[source]
        source: ScanError,
    },
}

fn describe_found(found: &Option<String>) -> String {
    match found {
        Some(token) => format!(" (found {})", token),
        None => " (found end of input)".to_string(),
    }
}

/// An LR(1) automaton that has shift-reduce or reduce-reduce conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("automaton has {} conflict(s)", .conflicts.len())]
pub struct AutomatonConflict {
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Conflict(#[from] AutomatonConflict),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_mentions_found_token() {
        let e = ParseError::Rejected {
            furthest: 3,
            expected: vec!["b".to_string()],
            found: Some("c".to_string()),
        };
        assert_eq!(e.to_string(), "input rejected at position 3 (found c)");

        let e = ParseError::Rejected {
            furthest: 0,
            expected: Vec::new(),
            found: None,
        };
        assert_eq!(
            e.to_string(),
            "input rejected at position 0 (found end of input)"
        );
    }

    #[test]
    fn grammar_error_converts() {
        let e: Error = GrammarError::Empty.into();
        assert!(matches!(e, Error::Grammar(GrammarError::Empty)));
    }
}
