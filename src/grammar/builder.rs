use crate::error::GrammarError;
use crate::Grammar;

use super::END_MARK;

/// Builds a grammar from explicitly declared symbols. Unlike `Grammar::parse`
/// a nonterminal may be declared without rules, which `build` reports as
/// `GrammarError::UndefinedNonTerminal` when something refers to it.
#[derive(Debug)]
pub struct GrammarBuilder {
    grammar: Grammar,
    error: Option<GrammarError>,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self {
            grammar: Grammar::new(),
            error: None,
        }
    }
}

impl GrammarBuilder {
    fn declare(&mut self, name: String, terminal: bool) {
        if self.error.is_some() {
            return;
        }
        if self.grammar.get_symbol_index(&name).is_some() || name == END_MARK {
            self.error = Some(GrammarError::DuplicateSymbol(name));
        } else if terminal {
            self.grammar.add_terminal(name);
        } else {
            self.grammar.add_non_terminal(&name);
        }
    }

    pub fn nonterm(mut self, name: impl Into<String>) -> Self {
        self.declare(name.into(), false);
        self
    }

    pub fn terminal(mut self, name: impl Into<String>) -> Self {
        self.declare(name.into(), true);
        self
    }

    pub fn rule<S: AsRef<str>>(mut self, left: &str, right: &[S]) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.add_rule(left, right) {
                self.error = Some(e);
            }
        }
        self
    }

    fn add_rule<S: AsRef<str>>(&mut self, left: &str, right: &[S]) -> Result<(), GrammarError> {
        let g = &mut self.grammar;
        let left_idx = g
            .get_symbol_index(left)
            .filter(|&idx| !g.is_terminal(idx))
            .ok_or_else(|| GrammarError::UnknownSymbol(left.to_string()))?;
        let right_idx = right
            .iter()
            .map(|s| {
                g.get_symbol_index(s.as_ref())
                    .ok_or_else(|| GrammarError::UnknownSymbol(s.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if g.rules_of(left_idx).any(|r| r.right == right_idx) {
            let text = format!("{} -> {}", left, g.production_to_vec_str(&right_idx).join(" "));
            return Err(GrammarError::DuplicateRule(text));
        }
        g.add_rule(left_idx, right_idx);
        Ok(())
    }

    pub fn build(self, start: &str) -> Result<Grammar, GrammarError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let mut g = self.grammar;
        g.start_symbol = g
            .get_symbol_index(start)
            .filter(|&idx| !g.is_terminal(idx))
            .ok_or_else(|| GrammarError::MissingStart(start.to_string()))?;
        g.finish()
    }
}
