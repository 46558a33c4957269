use std::fmt;

use serde::Serialize;

pub use crate::error::AutomatonConflict;

use super::dfa::Lr1Automaton;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictKind {
    ShiftReduce { shift_to: usize, rule: usize },
    ReduceReduce { rules: Vec<usize> },
}

/// Two or more actions for one (state, lookahead) cell. Nothing is resolved
/// here; a caller may still choose to drive a conflicting table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub state: usize,
    pub lookahead: String,
    pub kind: ConflictKind,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConflictKind::ShiftReduce { shift_to, rule } => write!(
                f,
                "I{}: shift-reduce on {} (shift {} / reduce rule {})",
                self.state, self.lookahead, shift_to, rule
            ),
            ConflictKind::ReduceReduce { rules } => write!(
                f,
                "I{}: reduce-reduce on {} (rules {})",
                self.state,
                self.lookahead,
                rules
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Every conflict of the automaton, by state id then lookahead index.
pub(crate) fn find_conflicts(automaton: &Lr1Automaton) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for state in &automaton.states {
        for (&lookahead, rules) in &state.reductions {
            let name = automaton.symbol_name(lookahead).to_string();
            if let Some(&shift_to) = state.transitions.get(&lookahead) {
                for &rule in rules {
                    conflicts.push(Conflict {
                        state: state.id,
                        lookahead: name.clone(),
                        kind: ConflictKind::ShiftReduce { shift_to, rule },
                    });
                }
            }
            if rules.len() > 1 {
                conflicts.push(Conflict {
                    state: state.id,
                    lookahead: name,
                    kind: ConflictKind::ReduceReduce {
                        rules: rules.clone(),
                    },
                });
            }
        }
    }
    for c in &conflicts {
        log::debug!("conflict {}", c);
    }
    conflicts
}
