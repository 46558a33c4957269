use crate::error::GrammarError;
use crate::Grammar;

use super::{END_MARK, EPSILON};

fn is_epsilon(s: &str) -> bool {
    s == EPSILON || s == "ϵ" || s == "epsilon"
}

fn malformed(line: usize, reason: &str) -> GrammarError {
    GrammarError::Malformed {
        line,
        reason: reason.to_string(),
    }
}

impl Grammar {
    /// Loads rule strings of the form `A -> x y | z`, one left side per line.
    /// A line starting with `|` adds alternatives to the previous left side.
    /// Symbols appearing on some left side are nonterminals, all others are
    /// terminals. The first left side is the start symbol.
    pub fn parse(grammar: &str) -> Result<Self, GrammarError> {
        let mut g = Self::new();

        let mut raw_productions: Vec<(usize, usize, &str)> = Vec::new();

        let mut previous_left: Option<usize> = None;
        let mut start: Option<usize> = None;
        for (i, line) in grammar.lines().enumerate() {
            let line_no = i + 1;
            if line.chars().all(|c| c.is_whitespace()) {
                continue;
            }
            let parts: Vec<&str> = line.split("->").collect();
            if parts.len() > 2 {
                return Err(malformed(line_no, "too many \"->\""));
            }
            let (left, rights): (usize, &str) = if parts.len() == 2 {
                let left_str = parts[0].trim();
                if left_str.is_empty() {
                    return Err(malformed(line_no, "empty left side"));
                } else if left_str.split_whitespace().count() != 1 {
                    return Err(malformed(line_no, "left side contains whitespace"));
                } else if left_str == END_MARK || is_epsilon(left_str) {
                    return Err(malformed(line_no, "reserved symbol on left side"));
                }
                let idx = match g.get_symbol_index(left_str) {
                    Some(idx) => idx,
                    None => g.add_non_terminal(left_str),
                };
                (idx, parts[1].trim())
            } else {
                let rest = parts[0].trim();
                match (previous_left, rest.strip_prefix('|')) {
                    (Some(idx), Some(rights)) => (idx, rights.trim()),
                    _ => return Err(malformed(line_no, "cannot find left side")),
                }
            };

            previous_left = Some(left);
            if start.is_none() {
                start = Some(left);
            }

            raw_productions.push((line_no, left, rights));
        }

        for (line_no, left, rights) in raw_productions {
            for right in rights.split('|') {
                let mut symbols = Vec::new();
                for s in right.split_whitespace() {
                    if is_epsilon(s) {
                        continue;
                    }
                    if s == END_MARK {
                        return Err(malformed(line_no, "\"$\" is reserved for end of input"));
                    }
                    let idx = match g.get_symbol_index(s) {
                        Some(idx) => idx,
                        None => g.add_terminal(s.to_string()),
                    };
                    symbols.push(idx);
                }
                if g.rules_of(left).any(|r| r.right == symbols) {
                    let text = format!(
                        "{} -> {}",
                        g.get_symbol_name(left),
                        g.production_to_vec_str(&symbols).join(" ")
                    );
                    return Err(GrammarError::DuplicateRule(text));
                }
                g.add_rule(left, symbols);
            }
        }

        g.start_symbol = start.ok_or(GrammarError::Empty)?;
        g.finish()
    }
}
