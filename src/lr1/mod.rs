pub mod conflict;
pub mod dfa;
pub mod nfa;
pub mod table;

pub use conflict::{AutomatonConflict, Conflict, ConflictKind};
pub use dfa::{content_string, DfaState, Lr1Automaton, Lr1Item};
pub use nfa::{Nfa, NfaState, Station, Transition};
pub use table::{Action, ParsingTable};
