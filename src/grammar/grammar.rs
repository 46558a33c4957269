use std::collections::{HashMap, HashSet};

use crate::error::GrammarError;

#[derive(Debug, Clone)]
pub struct NonTerminal {
    pub index: usize,
    pub name: String,
    pub first: HashSet<usize>,
    pub follow: HashSet<usize>,
    pub nullable: bool,
    /// Indices into `Grammar::rules` of every rule with this symbol on the left.
    pub rules: Vec<usize>,
}

impl NonTerminal {
    pub fn new(index: usize, name: String) -> Self {
        Self {
            index,
            name,
            first: HashSet::new(),
            follow: HashSet::new(),
            nullable: false,
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Symbol {
    NonTerminal(NonTerminal),
    Terminal(String),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::NonTerminal(nt) => nt.name.as_str(),
            Symbol::Terminal(name) => name.as_str(),
        }
    }

    pub fn non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn mut_non_terminal(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

/// A production `left -> right`. Symbols are indices into `Grammar::symbols`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub index: usize,
    pub left: usize,
    pub right: Vec<usize>,
}

impl Rule {
    pub fn len(&self) -> usize {
        self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.right.is_empty()
    }
}

/// An immutable context-free grammar. Built by `Grammar::parse` or
/// `GrammarBuilder`; nullable/first/follow are computed once at build time.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) symbol_table: HashMap<String, usize>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) start_symbol: usize,
}

impl Grammar {
    pub(crate) fn new() -> Self {
        let mut g = Self {
            symbols: Vec::new(),
            symbol_table: HashMap::new(),
            rules: Vec::new(),
            start_symbol: 0,
        };
        g.add_terminal(super::END_MARK.to_string());
        g
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = &String> {
        self.symbols.iter().filter_map(|s| {
            if let Symbol::Terminal(name) = s {
                Some(name)
            } else {
                None
            }
        })
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.symbols.iter().filter_map(|s| s.non_terminal())
    }

    pub(crate) fn non_terminal_iter_mut(&mut self) -> impl Iterator<Item = &mut NonTerminal> {
        self.symbols.iter_mut().filter_map(|s| s.mut_non_terminal())
    }

    pub fn get_symbol_index(&self, name: &str) -> Option<usize> {
        self.symbol_table.get(name).cloned()
    }

    pub fn get_symbol_name(&self, index: usize) -> &str {
        self.symbols[index].name()
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        self.symbols[index].is_terminal()
    }

    pub fn non_terminal(&self, index: usize) -> Option<&NonTerminal> {
        self.symbols.get(index).and_then(|s| s.non_terminal())
    }

    pub fn end_mark(&self) -> usize {
        self.symbol_table[super::END_MARK]
    }

    pub fn start_symbol(&self) -> usize {
        self.start_symbol
    }

    pub fn start_name(&self) -> &str {
        self.get_symbol_name(self.start_symbol)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Rules whose left-hand side is `symbol`, in grammar order.
    pub fn rules_of(&self, symbol: usize) -> impl Iterator<Item = &Rule> {
        let indices: &[usize] = match self.non_terminal(symbol) {
            Some(nt) => &nt.rules,
            None => &[],
        };
        indices.iter().map(move |&i| &self.rules[i])
    }

    pub fn rule_to_plaintext(&self, rule: &Rule) -> String {
        let right = if rule.right.is_empty() {
            super::EPSILON.to_string()
        } else {
            self.production_to_vec_str(&rule.right).join(" ")
        };
        format!("{} -> {}", self.get_symbol_name(rule.left), right)
    }

    pub fn production_to_vec_str(&self, production: &[usize]) -> Vec<&str> {
        production
            .iter()
            .map(|&idx| self.get_symbol_name(idx))
            .collect()
    }

    pub(crate) fn add_non_terminal(&mut self, name: &str) -> usize {
        let idx = self.symbols.len();
        self.symbols
            .push(Symbol::NonTerminal(NonTerminal::new(idx, name.to_string())));
        self.symbol_table.insert(name.to_string(), idx);
        idx
    }

    pub(crate) fn add_terminal(&mut self, name: String) -> usize {
        let idx = self.symbols.len();
        self.symbols.push(Symbol::Terminal(name.clone()));
        self.symbol_table.insert(name, idx);
        idx
    }

    pub(crate) fn add_rule(&mut self, left: usize, right: Vec<usize>) -> usize {
        let index = self.rules.len();
        self.rules.push(Rule { index, left, right });
        self.symbols[left]
            .mut_non_terminal()
            .expect("rule left side must be a nonterminal")
            .rules
            .push(index);
        index
    }

    pub fn get_symbol_prime_name(&self, mut name: String) -> String {
        while self.symbol_table.contains_key(&name) {
            name.push('\'');
        }
        name
    }

    /// Re-targets the grammar at another start symbol.
    pub fn with_start(mut self, name: &str) -> Result<Self, GrammarError> {
        match self.get_symbol_index(name) {
            Some(idx) if !self.is_terminal(idx) => {
                self.start_symbol = idx;
                self.finish()
            }
            _ => Err(GrammarError::MissingStart(name.to_string())),
        }
    }

    /// Checks closedness and computes nullable/first/follow. Every builder
    /// path ends here; the grammar is read-only afterwards.
    pub(crate) fn finish(mut self) -> Result<Self, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::Empty);
        }
        if self.is_terminal(self.start_symbol) {
            return Err(GrammarError::MissingStart(
                self.start_name().to_string(),
            ));
        }

        let referenced = std::iter::once(self.start_symbol)
            .chain(self.rules.iter().flat_map(|r| r.right.iter().cloned()));
        for idx in referenced {
            if let Some(nt) = self.non_terminal(idx) {
                if nt.rules.is_empty() {
                    return Err(GrammarError::UndefinedNonTerminal(nt.name.clone()));
                }
            }
        }

        self.reset_nullable_first_follow();
        self.calculate_nullable_first_follow();
        log::debug!(
            "grammar ready: {} symbols, {} rules, start {}",
            self.symbols.len(),
            self.rules.len(),
            self.start_name()
        );
        Ok(self)
    }
}
