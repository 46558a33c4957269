use std::collections::{HashMap, HashSet};

use crate::error::ParseError;
use crate::grammar::Grammar;
use crate::scanner::{Scanner, Token};
use crate::tree::ParseTree;

type Span = (usize, usize, usize);

/// Top-down parser that tries every partition of the input among the
/// symbols of each rule. Reads the whole input before matching.
#[derive(Debug, Clone, Copy)]
pub struct UngerParser<'g> {
    grammar: &'g Grammar,
}

impl<'g> UngerParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        UngerParser { grammar }
    }

    /// First derivation found, trying rules in grammar order and shorter
    /// leading parts first.
    pub fn parse<S: Scanner>(&self, mut scanner: S) -> Result<ParseTree, ParseError> {
        let mut tokens: Vec<Token> = Vec::new();
        loop {
            match scanner.next_token() {
                Ok(Some(token)) => tokens.push(token),
                Ok(None) => break,
                Err(source) => {
                    return Err(ParseError::Scanner {
                        position: tokens.len(),
                        source,
                    })
                }
            }
        }

        let mut run = Run {
            grammar: self.grammar,
            tokens: &tokens,
            memo: HashMap::new(),
            active: HashSet::new(),
            cuts: 0,
        };
        let result = run.symbol(self.grammar.start_symbol(), 0, tokens.len());
        log::debug!(
            "unger: {} tokens, {} spans memoized, accepted: {}",
            tokens.len(),
            run.memo.len(),
            result.is_some()
        );

        result.ok_or_else(|| {
            let g = self.grammar;
            let mut expected: Vec<String> = g
                .non_terminal(g.start_symbol())
                .map(|nt| {
                    nt.first
                        .iter()
                        .map(|&t| g.get_symbol_name(t).to_string())
                        .collect()
                })
                .unwrap_or_default();
            expected.sort();
            ParseError::Rejected {
                furthest: 0,
                expected,
                found: tokens.first().map(|t| t.kind.clone()),
            }
        })
    }
}

struct Run<'a> {
    grammar: &'a Grammar,
    tokens: &'a [Token],
    memo: HashMap<Span, Option<ParseTree>>,
    /// Spans being expanded on the current path.
    active: HashSet<Span>,
    /// Times a span was cut because it was already active.
    cuts: usize,
}

impl Run<'_> {
    fn min_len(&self, symbol: usize) -> usize {
        if self.grammar.is_nullable(symbol) {
            0
        } else {
            1
        }
    }

    fn symbol(&mut self, symbol: usize, start: usize, end: usize) -> Option<ParseTree> {
        let g = self.grammar;
        if g.is_terminal(symbol) {
            let token = self.tokens.get(start)?;
            return if end == start + 1 && token.kind == g.get_symbol_name(symbol) {
                Some(ParseTree::Leaf {
                    symbol: token.kind.clone(),
                    text: token.text.clone(),
                })
            } else {
                None
            };
        }

        let key = (symbol, start, end);
        if let Some(known) = self.memo.get(&key) {
            return known.clone();
        }
        if !self.active.insert(key) {
            self.cuts += 1;
            return None;
        }
        let cuts_before = self.cuts;

        let mut found = None;
        for rule in g.rules_of(symbol) {
            if let Some(children) = self.sequence(&rule.right, start, end) {
                found = Some(ParseTree::Node {
                    symbol: g.get_symbol_name(symbol).to_string(),
                    rule: rule.index,
                    children,
                });
                break;
            }
        }

        self.active.remove(&key);
        // a failure that depended on a cut may succeed from another path
        if found.is_some() || self.cuts == cuts_before {
            self.memo.insert(key, found.clone());
        }
        found
    }

    fn sequence(&mut self, body: &[usize], start: usize, end: usize) -> Option<Vec<ParseTree>> {
        let (&first, rest) = match body.split_first() {
            Some(split) => split,
            None => return if start == end { Some(Vec::new()) } else { None },
        };
        let rest_min: usize = rest.iter().map(|&s| self.min_len(s)).sum();
        let available = (end - start).checked_sub(rest_min)?;
        let longest = if self.grammar.is_terminal(first) {
            1
        } else {
            available
        };

        for len in self.min_len(first)..=longest.min(available) {
            let tree = match self.symbol(first, start, start + len) {
                Some(tree) => tree,
                None => continue,
            };
            if let Some(mut children) = self.sequence(rest, start + len, end) {
                children.insert(0, tree);
                return Some(children);
            }
        }
        None
    }
}
