use std::fmt;

use serde::Serialize;

/// One derivation, as produced by tree extraction from the forest, by the
/// LR(1) driver and by the Unger parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParseTree {
    Node {
        symbol: String,
        rule: usize,
        children: Vec<ParseTree>,
    },
    Leaf {
        symbol: String,
        text: String,
    },
}

impl ParseTree {
    pub fn symbol(&self) -> &str {
        match self {
            ParseTree::Node { symbol, .. } => symbol,
            ParseTree::Leaf { symbol, .. } => symbol,
        }
    }

    pub fn children(&self) -> &[ParseTree] {
        match self {
            ParseTree::Node { children, .. } => children,
            ParseTree::Leaf { .. } => &[],
        }
    }

    /// Lexemes of the leaves, left to right.
    pub fn leaves(&self) -> Vec<&str> {
        match self {
            ParseTree::Leaf { text, .. } => vec![text.as_str()],
            ParseTree::Node { children, .. } => children.iter().flat_map(|c| c.leaves()).collect(),
        }
    }

    /// Compact one-line form: `(E (E n) + (E n))`.
    pub fn to_bracketed(&self) -> String {
        match self {
            ParseTree::Leaf { text, .. } => text.clone(),
            ParseTree::Node {
                symbol, children, ..
            } => {
                let mut out = format!("({}", symbol);
                for c in children {
                    out.push(' ');
                    out.push_str(&c.to_bracketed());
                }
                out.push(')');
                out
            }
        }
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn fmt_indent(node: &ParseTree, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
            let pad = "  ".repeat(indent);
            match node {
                ParseTree::Leaf { symbol, text } => writeln!(f, "{}{} \"{}\"", pad, symbol, text),
                ParseTree::Node {
                    symbol, children, ..
                } => {
                    writeln!(f, "{}{}", pad, symbol)?;
                    for child in children {
                        fmt_indent(child, f, indent + 1)?;
                    }
                    Ok(())
                }
            }
        }
        fmt_indent(self, f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::ParseTree;

    fn leaf(s: &str) -> ParseTree {
        ParseTree::Leaf {
            symbol: s.to_string(),
            text: s.to_string(),
        }
    }

    #[test]
    fn renderings() {
        let t = ParseTree::Node {
            symbol: "S".to_string(),
            rule: 0,
            children: vec![
                leaf("a"),
                ParseTree::Node {
                    symbol: "S".to_string(),
                    rule: 1,
                    children: vec![],
                },
                leaf("b"),
            ],
        };
        assert_eq!(t.to_bracketed(), "(S a (S) b)");
        assert_eq!(t.leaves(), vec!["a", "b"]);
        assert_eq!(t.to_string(), "S\n  a \"a\"\n  S\n  b \"b\"\n");
    }
}
