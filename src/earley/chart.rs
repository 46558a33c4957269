use std::collections::HashMap;
use std::{fmt, hash};

use crate::error::ParseError;
use crate::grammar::{DottedItem, Grammar, Rule};
use crate::scanner::Token;

/// A dotted rule plus the position where its match began. `set` is the
/// column holding this copy of the item and does not take part in identity.
#[derive(Clone, Copy)]
pub struct EarleyItem {
    pub item: DottedItem,
    pub origin: usize,
    pub set: usize,
}

pub type ItemKey = (DottedItem, usize);

impl EarleyItem {
    pub fn key(&self) -> ItemKey {
        (self.item, self.origin)
    }

    pub fn rule<'g>(&self, grammar: &'g Grammar) -> &'g Rule {
        grammar.rule(self.item.rule)
    }

    pub fn is_complete(&self, grammar: &Grammar) -> bool {
        self.item.is_complete(self.rule(grammar))
    }

    pub fn to_plaintext(&self, grammar: &Grammar) -> String {
        format!(
            "{}, {}",
            self.item
                .to_plaintext(self.rule(grammar), |s| grammar.get_symbol_name(s)),
            self.origin
        )
    }
}

impl hash::Hash for EarleyItem {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialEq for EarleyItem {
    fn eq(&self, other: &EarleyItem) -> bool {
        self.key() == other.key()
    }
}

impl Eq for EarleyItem {}

impl fmt::Debug for EarleyItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}.{} @{}) in S{}",
            self.item.rule, self.item.dot, self.origin, self.set
        )
    }
}

/// One chart column. `items` is the work list in discovery order; the maps
/// index into it.
#[derive(Debug, Clone)]
pub struct ItemSet {
    pub index: usize,
    items: Vec<EarleyItem>,
    complete: HashMap<ItemKey, usize>,
    completed_order: Vec<usize>,
    active: HashMap<ItemKey, usize>,
    asking: HashMap<usize, Vec<usize>>,
}

impl ItemSet {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            items: Vec::new(),
            complete: HashMap::new(),
            completed_order: Vec::new(),
            active: HashMap::new(),
            asking: HashMap::new(),
        }
    }

    /// Adds the item unless an equal one is already present. Returns whether
    /// the set grew.
    pub fn add(&mut self, rule: &Rule, item: DottedItem, origin: usize) -> bool {
        let key = (item, origin);
        if self.complete.contains_key(&key) || self.active.contains_key(&key) {
            return false;
        }
        let pos = self.items.len();
        self.items.push(EarleyItem {
            item,
            origin,
            set: self.index,
        });
        match item.asking(rule) {
            Some(symbol) => {
                self.active.insert(key, pos);
                self.asking.entry(symbol).or_default().push(pos);
            }
            None => {
                self.complete.insert(key, pos);
                self.completed_order.push(pos);
            }
        }
        true
    }

    pub fn items(&self) -> &[EarleyItem] {
        &self.items
    }

    pub fn get(&self, pos: usize) -> Option<&EarleyItem> {
        self.items.get(pos)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item: DottedItem, origin: usize) -> bool {
        let key = (item, origin);
        self.active.contains_key(&key) || self.complete.contains_key(&key)
    }

    /// Items waiting on `symbol`, in discovery order.
    pub fn asking(&self, symbol: usize) -> impl Iterator<Item = &EarleyItem> {
        self.asking
            .get(&symbol)
            .into_iter()
            .flatten()
            .map(move |&pos| &self.items[pos])
    }

    /// Complete items, in discovery order.
    pub fn completed(&self) -> impl Iterator<Item = &EarleyItem> {
        self.completed_order.iter().map(move |&pos| &self.items[pos])
    }

    /// Symbols some item in this set is waiting on, sorted by index.
    pub fn asked_symbols(&self) -> Vec<usize> {
        let mut symbols: Vec<usize> = self.asking.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

/// The item sets built for one input, plus the tokens that were scanned.
#[derive(Debug, Clone)]
pub struct Chart<'g> {
    pub(crate) grammar: &'g Grammar,
    pub(crate) sets: Vec<ItemSet>,
    pub(crate) tokens: Vec<Token>,
}

impl<'g> Chart<'g> {
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn sets(&self) -> &[ItemSet] {
        &self.sets
    }

    pub fn set(&self, index: usize) -> &ItemSet {
        &self.sets[index]
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens read from the scanner.
    pub fn input_len(&self) -> usize {
        self.tokens.len()
    }

    /// Complete start-symbol items spanning the whole input.
    pub fn accepting_items(&self) -> impl Iterator<Item = &EarleyItem> {
        let grammar: &Grammar = self.grammar;
        self.sets
            .last()
            .into_iter()
            .flat_map(|set| set.completed())
            .filter(move |item| {
                item.origin == 0 && item.rule(grammar).left == grammar.start_symbol()
            })
    }

    pub fn accepted(&self) -> bool {
        self.sets.len() == self.tokens.len() + 1 && self.accepting_items().next().is_some()
    }

    /// The last column that still holds items: every token before it was
    /// scanned by some item.
    pub fn furthest(&self) -> usize {
        self.sets
            .iter()
            .rposition(|set| !set.is_empty())
            .unwrap_or(0)
    }

    /// Terminal names some item at `position` could have scanned.
    pub fn expected_at(&self, position: usize) -> Vec<String> {
        let mut expected: Vec<String> = self
            .sets
            .get(position)
            .map(|set| set.asked_symbols())
            .unwrap_or_default()
            .into_iter()
            .filter(|&s| self.grammar.is_terminal(s))
            .map(|s| self.grammar.get_symbol_name(s).to_string())
            .collect();
        expected.sort();
        expected
    }

    pub fn rejection(&self) -> ParseError {
        let furthest = self.furthest();
        ParseError::Rejected {
            furthest,
            expected: self.expected_at(furthest),
            found: self.tokens.get(furthest).map(|t| t.kind.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ItemSet;
    use crate::grammar::DottedItem;
    use crate::Grammar;

    #[test]
    fn item_set_dedup_and_indices() {
        let g = Grammar::parse("S -> S + n | n").unwrap();
        let plus_rule = g.rule(0);
        let mut set = ItemSet::new(0);

        assert!(set.add(plus_rule, DottedItem::new(0), 0));
        assert!(!set.add(plus_rule, DottedItem::new(0), 0));
        assert!(set.add(plus_rule, DottedItem::new(0), 1));
        assert_eq!(set.len(), 2);

        let s = g.get_symbol_index("S").unwrap();
        assert_eq!(set.asking(s).count(), 2);
        assert_eq!(set.completed().count(), 0);

        let done = DottedItem { rule: 1, dot: 1 };
        assert!(set.add(g.rule(1), done, 0));
        assert!(!set.add(g.rule(1), done, 0));
        assert_eq!(set.completed().count(), 1);
        assert!(set.contains(done, 0));
        assert!(!set.contains(done, 1));
        assert!(set.items().iter().all(|i| i.set == 0));
    }
}
