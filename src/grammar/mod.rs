pub mod builder;
pub mod grammar;
pub mod item;
pub mod nullable_first_follow;
pub mod parse;
pub mod pretty_print;
pub use builder::GrammarBuilder;
pub use grammar::{Grammar, NonTerminal, Rule, Symbol};
pub use item::DottedItem;

pub const EPSILON: &str = "ε";
pub const END_MARK: &str = "$";
