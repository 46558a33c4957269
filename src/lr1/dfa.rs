use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::error::AutomatonConflict;
use crate::grammar::{DottedItem, Grammar, Rule};

use super::conflict::{find_conflicts, Conflict};
use super::nfa::Nfa;

/// One LR(1) item as held by a DFA state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lr1Item {
    pub item: DottedItem,
    pub lookahead: usize,
}

#[derive(Debug, Clone)]
pub struct DfaState {
    pub id: usize,
    /// Display form of the items: see `content_string`.
    pub content: String,
    pub items: Vec<Lr1Item>,
    /// symbol -> target state
    pub transitions: BTreeMap<usize, usize>,
    /// lookahead terminal -> rules reducible under it
    pub reductions: BTreeMap<usize, Vec<usize>>,
}

impl DfaState {
    pub fn is_shift_only(&self) -> bool {
        self.reductions.is_empty()
    }
}

/// Description of a set of NFA states: every item as `A -> α . β, a`,
/// sorted and deduplicated, one per line. Two sets holding the same items
/// get the same string whatever order they were reached in. Symbol names may
/// contain `.` or `,`, so the string is for display only and states are
/// keyed by their NFA state sets.
pub fn content_string(nfa: &Nfa, states: &BTreeSet<usize>) -> String {
    let lines: BTreeSet<String> = states.iter().map(|&s| nfa.state_to_plaintext(s)).collect();
    lines.into_iter().collect::<Vec<_>>().join("\n")
}

/// Deterministic LR(1) automaton. State 0 is the closure of `S' -> . S, $`;
/// the remaining ids follow breadth-first discovery with outgoing symbols
/// visited in symbol-index order.
#[derive(Debug, Clone)]
pub struct Lr1Automaton {
    pub states: Vec<DfaState>,
    pub start: usize,
    pub conflicts: Vec<Conflict>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) names: Vec<String>,
    pub(crate) terminals: Vec<usize>,
    pub(crate) non_terminals: Vec<usize>,
    pub(crate) augmented_rule: usize,
    pub(crate) end_mark: usize,
}

impl Lr1Automaton {
    pub fn new(grammar: &Grammar) -> Self {
        let nfa = Nfa::new(grammar);
        let mut builder = DfaBuilder {
            nfa: &nfa,
            states: Vec::new(),
            sets: Vec::new(),
            index: HashMap::new(),
            q: VecDeque::new(),
        };

        let start = builder.state_or_insert(nfa.closure([0]));
        while let Some(u) = builder.q.pop_front() {
            let mut edges: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
            for &s in &builder.sets[u] {
                if let Some(t) = nfa.state(s).shift {
                    edges.entry(t.symbol).or_default().insert(t.to);
                }
            }
            for (symbol, targets) in edges {
                let v = builder.state_or_insert(nfa.closure(targets));
                builder.states[u].transitions.insert(symbol, v);
            }
        }
        let states = builder.states;

        let mut terminals: Vec<usize> = Vec::new();
        let mut non_terminals: Vec<usize> = Vec::new();
        for (idx, symbol) in grammar.symbols().iter().enumerate() {
            if idx == nfa.end_mark {
                continue;
            }
            if symbol.is_terminal() {
                terminals.push(idx);
            } else {
                non_terminals.push(idx);
            }
        }
        terminals.push(nfa.end_mark);

        let mut automaton = Lr1Automaton {
            states,
            start,
            conflicts: Vec::new(),
            rules: nfa.rules.clone(),
            names: nfa.names.clone(),
            terminals,
            non_terminals,
            augmented_rule: nfa.augmented_rule,
            end_mark: nfa.end_mark,
        };
        automaton.conflicts = find_conflicts(&automaton);
        log::debug!(
            "lr1 automaton: {} states, {} conflicts",
            automaton.states.len(),
            automaton.conflicts.len()
        );
        automaton
    }

    fn make_state(nfa: &Nfa, id: usize, content: String, set: &BTreeSet<usize>) -> DfaState {
        let mut items: Vec<Lr1Item> = set
            .iter()
            .map(|&s| {
                let state = nfa.state(s);
                Lr1Item {
                    item: state.item,
                    lookahead: state.lookahead,
                }
            })
            .collect();
        items.sort();

        let mut reductions: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in &items {
            if i.item.is_complete(nfa.rule(i.item.rule)) {
                let rules = reductions.entry(i.lookahead).or_default();
                if !rules.contains(&i.item.rule) {
                    rules.push(i.item.rule);
                }
            }
        }

        DfaState {
            id,
            content,
            items,
            transitions: BTreeMap::new(),
            reductions,
        }
    }

    pub fn state(&self, id: usize) -> &DfaState {
        &self.states[id]
    }

    pub fn rule(&self, idx: usize) -> &Rule {
        &self.rules[idx]
    }

    /// Grammar rules plus the augmented `S' -> S` as the last entry.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn augmented_rule(&self) -> usize {
        self.augmented_rule
    }

    pub fn symbol_name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn symbol_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn is_terminal(&self, idx: usize) -> bool {
        self.terminals.contains(&idx)
    }

    /// Terminals in table column order, `$` last.
    pub fn terminals(&self) -> &[usize] {
        &self.terminals
    }

    pub fn non_terminals(&self) -> &[usize] {
        &self.non_terminals
    }

    pub fn end_mark(&self) -> usize {
        self.end_mark
    }

    pub fn rule_to_plaintext(&self, idx: usize) -> String {
        let rule = &self.rules[idx];
        let right = if rule.right.is_empty() {
            crate::grammar::EPSILON.to_string()
        } else {
            rule.right
                .iter()
                .map(|&s| self.names[s].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        };
        format!("{} -> {}", self.names[rule.left], right)
    }

    pub fn item_to_plaintext(&self, item: &Lr1Item) -> String {
        format!(
            "{}, {}",
            item.item
                .to_plaintext(&self.rules[item.item.rule], |s| self.names[s].as_str()),
            self.names[item.lookahead]
        )
    }

    pub fn is_deterministic(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// The automaton itself when it has no conflicts, the conflict list
    /// otherwise.
    pub fn deterministic(&self) -> Result<&Self, AutomatonConflict> {
        if self.conflicts.is_empty() {
            Ok(self)
        } else {
            Err(AutomatonConflict {
                conflicts: self.conflicts.clone(),
            })
        }
    }
}

struct DfaBuilder<'n> {
    nfa: &'n Nfa,
    states: Vec<DfaState>,
    sets: Vec<BTreeSet<usize>>,
    index: HashMap<BTreeSet<usize>, usize>,
    q: VecDeque<usize>,
}

impl DfaBuilder<'_> {
    /// Id of the DFA state holding exactly `set`, allocating and queueing a
    /// new one the first time the set is seen. NFA state ids are unique per
    /// (item, lookahead), so equal sets mean equal item sets.
    fn state_or_insert(&mut self, set: BTreeSet<usize>) -> usize {
        if let Some(&id) = self.index.get(&set) {
            return id;
        }
        let id = self.states.len();
        let content = content_string(self.nfa, &set);
        log::trace!("new lr1 state I{}:\n{}", id, content);
        self.states
            .push(Lr1Automaton::make_state(self.nfa, id, content, &set));
        self.index.insert(set.clone(), id);
        self.sets.push(set);
        self.q.push_back(id);
        id
    }
}

impl Grammar {
    pub fn to_lr1_automaton(&self) -> Lr1Automaton {
        Lr1Automaton::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_string_is_sorted_and_stable() {
        let g = Grammar::parse("S -> A b\nA -> a").unwrap();
        let a = g.to_lr1_automaton();
        assert_eq!(
            a.state(0).content,
            "A -> . a, b\nS -> . A b, $\nS' -> . S, $"
        );

        let b = g.to_lr1_automaton();
        let ca: Vec<&str> = a.states.iter().map(|s| s.content.as_str()).collect();
        let cb: Vec<&str> = b.states.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(ca, cb);
    }

    #[test]
    fn generation_is_deterministic() {
        let g = Grammar::parse("E -> E + T | T\nT -> T * F | F\nF -> ( E ) | n").unwrap();
        let a = g.to_lr1_automaton();
        let b = g.to_lr1_automaton();
        assert_eq!(a.states.len(), b.states.len());
        for (x, y) in a.states.iter().zip(&b.states) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.content, y.content);
            assert_eq!(x.transitions, y.transitions);
        }
    }

    #[test]
    fn small_automaton_shape() {
        let g = Grammar::parse("S -> A b\nA -> a").unwrap();
        let m = g.to_lr1_automaton();
        // I0, its targets on S, A and a, then S -> A b .
        assert_eq!(m.states.len(), 5);
        let s = g.get_symbol_index("S").unwrap();
        let a = g.get_symbol_index("a").unwrap();
        let big_a = g.get_symbol_index("A").unwrap();

        let after_s = m.state(0).transitions[&s];
        assert_eq!(m.state(after_s).reductions[&g.end_mark()], vec![m.augmented_rule()]);

        let after_a = m.state(0).transitions[&a];
        assert_eq!(m.state(after_a).content, "A -> a ., b");

        let after_big_a = m.state(0).transitions[&big_a];
        assert!(m.state(after_big_a).is_shift_only());
        assert!(m.is_deterministic());
        assert!(m.deterministic().is_ok());
    }

    #[test]
    fn augmented_name_is_fresh() {
        let g = Grammar::parse("S -> S' a | b\nS' -> c").unwrap();
        let m = g.to_lr1_automaton();
        assert_eq!(m.rule_to_plaintext(m.augmented_rule()), "S'' -> S");
    }

    #[test]
    fn dotted_terminal_states_stay_apart() {
        // with a terminal named `.` the item text hides where the dot is
        let g = Grammar::parse("S -> x A | y A | y T\nA -> . T\nT -> .").unwrap();
        let m = g.to_lr1_automaton();
        assert!(m.is_deterministic());

        let y = g.get_symbol_index("y").unwrap();
        let dot = g.get_symbol_index(".").unwrap();
        let after_y = m.state(0).transitions[&y];
        let after_dot = m.state(after_y).transitions[&dot];
        assert_eq!(m.state(after_dot).items.len(), 3);
        let t = g.get_symbol_index("T").unwrap();
        let t_rule = g.rules_of(t).next().unwrap().index;
        assert_eq!(m.state(after_dot).reductions[&g.end_mark()], vec![t_rule]);

        let tree = m.parse(crate::scanner::WordScanner::new("y .")).unwrap();
        assert_eq!(tree.to_bracketed(), "(S y (T .))");
        assert!(m.parse(crate::scanner::WordScanner::new("x . .")).is_ok());
    }

    #[test]
    fn distinct_states_hold_distinct_items() {
        for text in [
            "E -> E + T | T\nT -> T * F | F\nF -> ( E ) | n",
            "S -> x A | y A | y T\nA -> . T\nT -> .",
            "S -> a S b | ε",
            "S -> if c S | if c S else S | s",
        ] {
            let g = Grammar::parse(text).unwrap();
            let m = g.to_lr1_automaton();
            for (i, a) in m.states.iter().enumerate() {
                for b in &m.states[i + 1..] {
                    assert_ne!(a.items, b.items, "I{} and I{} in {:?}", a.id, b.id, text);
                }
            }
        }
    }
}
