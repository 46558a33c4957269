use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::grammar::{DottedItem, Grammar, Rule};

/// Consuming edge: `A -> α . X β, a` to `A -> α X . β, a` on `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub symbol: usize,
    pub to: usize,
}

/// An LR(1) item: a dotted rule plus one lookahead terminal.
#[derive(Debug, Clone)]
pub struct NfaState {
    pub item: DottedItem,
    pub lookahead: usize,
    pub shift: Option<Transition>,
    /// Epsilon edges, as station ids.
    pub epsilon: Vec<usize>,
}

/// Entry point for `symbol` under `lookahead`: the dot-0 states of every rule
/// of `symbol`, all carrying that lookahead.
#[derive(Debug, Clone)]
pub struct Station {
    pub symbol: usize,
    pub lookahead: usize,
    pub states: Vec<usize>,
}

/// Nondeterministic LR(1) automaton over the grammar augmented with
/// `S' -> S`. The augmented rule is the last entry of `rules` and its left
/// side is the symbol right after the grammar's own symbols.
#[derive(Debug, Clone)]
pub struct Nfa {
    pub(crate) rules: Vec<Rule>,
    pub(crate) names: Vec<String>,
    pub(crate) augmented_rule: usize,
    pub(crate) end_mark: usize,
    states: Vec<NfaState>,
    stations: Vec<Station>,
    state_index: HashMap<(DottedItem, usize), usize>,
    station_index: HashMap<(usize, usize), usize>,
}

impl Nfa {
    pub fn new(grammar: &Grammar) -> Self {
        let mut rules = grammar.rules().to_vec();
        let mut names: Vec<String> = grammar
            .symbols()
            .iter()
            .map(|s| s.name().to_string())
            .collect();

        let augmented_symbol = names.len();
        names.push(grammar.get_symbol_prime_name(grammar.start_name().to_string()));
        let augmented_rule = rules.len();
        rules.push(Rule {
            index: augmented_rule,
            left: augmented_symbol,
            right: vec![grammar.start_symbol()],
        });

        let mut nfa = Nfa {
            rules,
            names,
            augmented_rule,
            end_mark: grammar.end_mark(),
            states: Vec::new(),
            stations: Vec::new(),
            state_index: HashMap::new(),
            station_index: HashMap::new(),
        };
        nfa.build(grammar);
        nfa
    }

    fn build(&mut self, grammar: &Grammar) {
        let mut q: VecDeque<usize> = VecDeque::new();
        let start = self.state_or_insert(DottedItem::new(self.augmented_rule), self.end_mark, &mut q);
        debug_assert_eq!(start, 0);

        while let Some(u) = q.pop_front() {
            let NfaState {
                item, lookahead, ..
            } = self.states[u];
            let rule = &self.rules[item.rule];
            let symbol = match item.asking(rule) {
                Some(symbol) => symbol,
                None => continue,
            };
            let beta = rule.right[item.dot + 1..].to_vec();

            let to = self.state_or_insert(item.advance(), lookahead, &mut q);
            self.states[u].shift = Some(Transition { symbol, to });

            if grammar.is_terminal(symbol) {
                continue;
            }
            // lookaheads for the predicted rules: FIRST(β a)
            let (first, nullable) = grammar.first_of_sequence(&beta);
            let mut lookaheads: BTreeSet<usize> = first.into_iter().collect();
            if nullable {
                lookaheads.insert(lookahead);
            }
            for b in lookaheads {
                let station = self.station_or_insert(grammar, symbol, b, &mut q);
                self.states[u].epsilon.push(station);
            }
        }

        log::debug!(
            "lr1 nfa: {} states, {} stations",
            self.states.len(),
            self.stations.len()
        );
    }

    fn state_or_insert(&mut self, item: DottedItem, lookahead: usize, q: &mut VecDeque<usize>) -> usize {
        if let Some(&idx) = self.state_index.get(&(item, lookahead)) {
            return idx;
        }
        let idx = self.states.len();
        self.states.push(NfaState {
            item,
            lookahead,
            shift: None,
            epsilon: Vec::new(),
        });
        self.state_index.insert((item, lookahead), idx);
        q.push_back(idx);
        idx
    }

    fn station_or_insert(
        &mut self,
        grammar: &Grammar,
        symbol: usize,
        lookahead: usize,
        q: &mut VecDeque<usize>,
    ) -> usize {
        if let Some(&idx) = self.station_index.get(&(symbol, lookahead)) {
            return idx;
        }
        let states = grammar
            .rules_of(symbol)
            .map(|r| r.index)
            .collect::<Vec<_>>()
            .into_iter()
            .map(|rule| self.state_or_insert(DottedItem::new(rule), lookahead, q))
            .collect();
        let idx = self.stations.len();
        self.stations.push(Station {
            symbol,
            lookahead,
            states,
        });
        self.station_index.insert((symbol, lookahead), idx);
        idx
    }

    pub fn states(&self) -> &[NfaState] {
        &self.states
    }

    pub fn state(&self, idx: usize) -> &NfaState {
        &self.states[idx]
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn rule(&self, idx: usize) -> &Rule {
        &self.rules[idx]
    }

    pub fn symbol_name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    /// States reachable from `seeds` through epsilon edges, seeds included.
    pub fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> BTreeSet<usize> {
        let mut closure: BTreeSet<usize> = BTreeSet::new();
        let mut stack: Vec<usize> = seeds.into_iter().collect();
        while let Some(u) = stack.pop() {
            if !closure.insert(u) {
                continue;
            }
            for &station in &self.states[u].epsilon {
                stack.extend(
                    self.stations[station]
                        .states
                        .iter()
                        .filter(|&&s| !closure.contains(&s)),
                );
            }
        }
        closure
    }

    /// `A -> α . β, a`
    pub fn state_to_plaintext(&self, idx: usize) -> String {
        let state = &self.states[idx];
        format!(
            "{}, {}",
            state
                .item
                .to_plaintext(&self.rules[state.item.rule], |s| self.names[s].as_str()),
            self.names[state.lookahead]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Nfa;
    use crate::Grammar;

    #[test]
    fn start_state_is_augmented_rule() {
        let g = Grammar::parse("S -> a S b | ε").unwrap();
        let nfa = Nfa::new(&g);
        assert_eq!(nfa.state_to_plaintext(0), "S' -> . S, $");
        assert_eq!(nfa.rule(nfa.augmented_rule).right, vec![g.start_symbol()]);
    }

    #[test]
    fn lookaheads_follow_first_of_rest() {
        let g = Grammar::parse("S -> A b\nA -> a").unwrap();
        let nfa = Nfa::new(&g);
        let closure: Vec<String> = nfa
            .closure([0])
            .into_iter()
            .map(|s| nfa.state_to_plaintext(s))
            .collect();
        assert!(closure.contains(&"S -> . A b, $".to_string()));
        assert!(closure.contains(&"A -> . a, b".to_string()));
        assert_eq!(closure.len(), 3);
    }

    #[test]
    fn recursive_rules_share_stations() {
        let g = Grammar::parse("E -> E + n | n").unwrap();
        let nfa = Nfa::new(&g);
        let e = g.get_symbol_index("E").unwrap();
        // one station per (E, lookahead) pair: $ and +
        assert_eq!(nfa.stations().iter().filter(|s| s.symbol == e).count(), 2);
        for station in nfa.stations() {
            assert_eq!(station.states.len(), 2);
        }
    }
}
