use serde::Serialize;

use crate::error::{Error, ParseError};
use crate::scanner::{Scanner, Token};
use crate::tree::ParseTree;

use super::dfa::Lr1Automaton;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "target", rename_all = "lowercase")]
pub enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
}

/// ACTION/GOTO table of an LR(1) automaton. Rows are DFA state ids; a cell
/// with more than one action is a conflict.
#[derive(Debug, Clone, Serialize)]
pub struct ParsingTable {
    pub terminals: Vec<String>,
    pub non_terminals: Vec<String>,
    /// `(left, right)` of every rule, indexed like the grammar's rules.
    pub productions: Vec<(String, Vec<String>)>,
    pub action: Vec<Vec<Vec<Action>>>,
    pub goto: Vec<Vec<Option<usize>>>,
}

impl Lr1Automaton {
    pub fn to_parsing_table(&self) -> ParsingTable {
        let mut action = Vec::with_capacity(self.states.len());
        let mut goto = Vec::with_capacity(self.states.len());
        for state in &self.states {
            let row: Vec<Vec<Action>> = self
                .terminals
                .iter()
                .map(|t| {
                    let mut cell = Vec::new();
                    if let Some(&to) = state.transitions.get(t) {
                        cell.push(Action::Shift(to));
                    }
                    for &rule in state.reductions.get(t).into_iter().flatten() {
                        cell.push(if rule == self.augmented_rule {
                            Action::Accept
                        } else {
                            Action::Reduce(rule)
                        });
                    }
                    cell
                })
                .collect();
            action.push(row);
            goto.push(
                self.non_terminals
                    .iter()
                    .map(|nt| state.transitions.get(nt).cloned())
                    .collect(),
            );
        }

        ParsingTable {
            terminals: self.names_of(&self.terminals),
            non_terminals: self.names_of(&self.non_terminals),
            productions: self.rules[..self.augmented_rule]
                .iter()
                .map(|r| {
                    (
                        self.names[r.left].clone(),
                        self.names_of(&r.right),
                    )
                })
                .collect(),
            action,
            goto,
        }
    }

    fn names_of(&self, symbols: &[usize]) -> Vec<String> {
        symbols.iter().map(|&s| self.names[s].clone()).collect()
    }

    /// Terminal index of a token kind. `$` never comes from the scanner.
    fn terminal_of(&self, token: Option<&Token>) -> Option<usize> {
        match token {
            None => Some(self.end_mark),
            Some(token) => self
                .symbol_index(&token.kind)
                .filter(|&s| s != self.end_mark && self.is_terminal(s)),
        }
    }

    fn expected_in(&self, state: usize) -> Vec<String> {
        let state = &self.states[state];
        let mut expected: Vec<String> = self
            .terminals
            .iter()
            .filter(|&&t| state.transitions.contains_key(&t) || state.reductions.contains_key(&t))
            .map(|&t| self.names[t].clone())
            .collect();
        expected.sort();
        expected
    }

    /// Shift-reduce driver. Refuses automata with conflicts; otherwise runs
    /// the table over the scanner's tokens with one token of lookahead.
    pub fn parse<S: Scanner>(&self, mut scanner: S) -> Result<ParseTree, Error> {
        self.deterministic()?;

        let mut position = 0;
        let mut next = |position: usize| -> Result<Option<Token>, ParseError> {
            scanner
                .next_token()
                .map_err(|source| ParseError::Scanner { position, source })
        };

        let mut states: Vec<usize> = vec![self.start];
        let mut trees: Vec<ParseTree> = Vec::new();
        let mut lookahead = next(position)?;

        loop {
            let top = *states.last().unwrap_or(&self.start);
            let state = &self.states[top];
            let symbol = self.terminal_of(lookahead.as_ref());

            let shift = symbol.and_then(|s| state.transitions.get(&s).cloned());
            let reduce = symbol.and_then(|s| state.reductions.get(&s).and_then(|r| r.first().cloned()));

            match (shift, reduce) {
                (Some(to), _) => {
                    let token = match lookahead.take() {
                        Some(token) => token,
                        None => break,
                    };
                    log::trace!("I{} shift {:?} -> I{}", top, token.kind, to);
                    trees.push(ParseTree::Leaf {
                        symbol: token.kind,
                        text: token.text,
                    });
                    states.push(to);
                    position += 1;
                    lookahead = next(position)?;
                }
                (None, Some(rule)) if rule == self.augmented_rule => {
                    log::debug!("lr1 accept after {} tokens", position);
                    if let Some(tree) = trees.pop() {
                        return Ok(tree);
                    }
                    break;
                }
                (None, Some(rule)) => {
                    let r = &self.rules[rule];
                    log::trace!("I{} reduce {}", top, self.rule_to_plaintext(rule));
                    let (tree_base, state_base) =
                        match (trees.len().checked_sub(r.len()), states.len().checked_sub(r.len())) {
                            (Some(t), Some(s)) if s > 0 => (t, s),
                            _ => break,
                        };
                    let children = trees.split_off(tree_base);
                    states.truncate(state_base);
                    let exposed = *states.last().unwrap_or(&self.start);
                    let to = match self.states[exposed].transitions.get(&r.left) {
                        Some(&to) => to,
                        None => break,
                    };
                    trees.push(ParseTree::Node {
                        symbol: self.names[r.left].clone(),
                        rule,
                        children,
                    });
                    states.push(to);
                }
                (None, None) => break,
            }
        }

        let top = *states.last().unwrap_or(&self.start);
        Err(ParseError::Rejected {
            furthest: position,
            expected: self.expected_in(top),
            found: lookahead.map(|t| t.kind),
        }
        .into())
    }
}
