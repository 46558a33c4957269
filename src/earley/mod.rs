pub mod chart;
pub mod forest;
pub mod parser;

pub use chart::{Chart, EarleyItem, ItemSet};
pub use forest::{Forest, ForestNode, NodeId, NodeKind, Pack};
pub use parser::EarleyParser;
