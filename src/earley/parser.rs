use std::collections::HashSet;

use crate::error::ParseError;
use crate::grammar::{DottedItem, Grammar};
use crate::scanner::{Scanner, Token};

use super::chart::{Chart, EarleyItem, ItemSet};
use super::forest::Forest;

/// Earley recognizer over a shared, read-only grammar. Each call owns its
/// own chart, so one parser can serve many inputs.
#[derive(Debug, Clone, Copy)]
pub struct EarleyParser<'g> {
    grammar: &'g Grammar,
}

impl<'g> EarleyParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        EarleyParser { grammar }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// Builds every column for the input. Rejection is not an error here:
    /// inspect `Chart::accepted`. Only a failing scanner stops the run early.
    pub fn chart<S: Scanner>(&self, mut scanner: S) -> Result<Chart<'g>, ParseError> {
        let g = self.grammar;
        let mut s0 = ItemSet::new(0);
        for rule in g.rules_of(g.start_symbol()) {
            s0.add(rule, DottedItem::new(rule.index), 0);
        }

        let mut chart = Chart {
            grammar: g,
            sets: vec![s0],
            tokens: Vec::new(),
        };

        for idx in 0.. {
            self.close(&mut chart, idx);

            let token = match scanner.next_token() {
                Ok(Some(token)) => token,
                Ok(None) => break,
                Err(source) => {
                    return Err(ParseError::Scanner {
                        position: idx,
                        source,
                    })
                }
            };
            let next = self.scan(&chart.sets[idx], &token);
            if next.is_empty() && !chart.sets[idx].is_empty() {
                log::debug!("no item scans {:?} at position {}", token.kind, idx);
            }
            chart.sets.push(next);
            chart.tokens.push(token);
        }

        log::debug!(
            "earley chart: {} tokens, {} items, accepted: {}",
            chart.tokens.len(),
            chart.sets.iter().map(|s| s.len()).sum::<usize>(),
            chart.accepted()
        );
        Ok(chart)
    }

    pub fn recognize<S: Scanner>(&self, scanner: S) -> Result<bool, ParseError> {
        Ok(self.chart(scanner)?.accepted())
    }

    /// Parses the input and builds the shared packed forest of all
    /// derivations, or reports how far the input matched.
    pub fn parse<S: Scanner>(&self, scanner: S) -> Result<Forest, ParseError> {
        let chart = self.chart(scanner)?;
        Forest::build(&chart).ok_or_else(|| chart.rejection())
    }

    /// Predict and complete until the column stops growing.
    fn close(&self, chart: &mut Chart<'g>, idx: usize) {
        let g = self.grammar;
        // nonterminals already completed with origin == idx (nullable here)
        let mut nulled: HashSet<usize> = HashSet::new();

        let mut pos = 0;
        while let Some(&item) = chart.sets[idx].get(pos) {
            pos += 1;
            let rule = item.rule(g);
            match item.item.asking(rule) {
                Some(symbol) if !g.is_terminal(symbol) => {
                    for predicted in g.rules_of(symbol) {
                        if chart.sets[idx].add(predicted, DottedItem::new(predicted.index), idx) {
                            log::trace!("S{} predict {}", idx, g.rule_to_plaintext(predicted));
                        }
                    }
                    if nulled.contains(&symbol) {
                        chart.sets[idx].add(rule, item.item.advance(), item.origin);
                    }
                }
                Some(_) => {}
                None => {
                    if item.origin == idx {
                        nulled.insert(rule.left);
                    }
                    let waiting: Vec<EarleyItem> =
                        chart.sets[item.origin].asking(rule.left).cloned().collect();
                    for w in waiting {
                        let advanced = w.item.advance();
                        if chart.sets[idx].add(w.rule(g), advanced, w.origin) {
                            log::trace!(
                                "S{} complete {} -> {}",
                                idx,
                                g.rule_to_plaintext(rule),
                                w.to_plaintext(g)
                            );
                        }
                    }
                }
            }
        }
    }

    /// Items of `set` waiting on the token's terminal, advanced into a new set.
    fn scan(&self, set: &ItemSet, token: &Token) -> ItemSet {
        let g = self.grammar;
        let mut next = ItemSet::new(set.index + 1);
        let terminal = g
            .get_symbol_index(&token.kind)
            .filter(|&idx| g.is_terminal(idx));
        if let Some(terminal) = terminal {
            for item in set.asking(terminal) {
                next.add(item.rule(g), item.item.advance(), item.origin);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::EarleyParser;
    use crate::error::ParseError;
    use crate::scanner::{CharScanner, Token, TokenStream, WordScanner};
    use crate::Grammar;

    fn accepts(grammar: &str, input: &str) -> bool {
        let g = Grammar::parse(grammar).unwrap();
        EarleyParser::new(&g)
            .recognize(CharScanner::new(input))
            .unwrap()
    }

    #[test]
    fn balanced_pairs() {
        let g = "S -> a S b | ε";
        assert!(accepts(g, "aabb"));
        assert!(accepts(g, ""));
        assert!(!accepts(g, "aab"));
        assert!(!accepts(g, "abab"));
    }

    #[test]
    fn left_and_right_recursion() {
        assert!(accepts("S -> S + N | N\nN -> 1 | 2", "1+2+1"));
        assert!(accepts("P -> N ^ P | N\nN -> 1 | 2", "1^2^1"));
        assert!(!accepts("P -> N ^ P | N\nN -> 1 | 2", "1^"));
    }

    #[test]
    fn nullable_in_the_middle() {
        // the nullable B completes in the column where A is still waiting on it
        let g = "S -> A B C\nA -> a\nB -> ε | b\nC -> c";
        assert!(accepts(g, "ac"));
        assert!(accepts(g, "abc"));
        assert!(!accepts(g, "ab"));
    }

    #[test]
    fn nullable_chain() {
        let g = "S -> A A x\nA -> B\nB -> ε";
        assert!(accepts(g, "x"));
    }

    #[test]
    fn items_are_discovered_in_stable_order() {
        let g = Grammar::parse("E -> E + E | n").unwrap();
        let p = EarleyParser::new(&g);
        let a = p.chart(CharScanner::new("n+n+n")).unwrap();
        let b = p.chart(CharScanner::new("n+n+n")).unwrap();
        for (x, y) in a.sets().iter().zip(b.sets()) {
            let xs: Vec<_> = x.items().iter().map(|i| i.key()).collect();
            let ys: Vec<_> = y.items().iter().map(|i| i.key()).collect();
            assert_eq!(xs, ys);
        }
    }

    #[test]
    fn rejection_reports_furthest_position() {
        let g = Grammar::parse("S -> a S b | ε").unwrap();
        let err = EarleyParser::new(&g)
            .parse(CharScanner::new("aabx b"))
            .unwrap_err();
        match err {
            ParseError::Rejected {
                furthest,
                expected,
                found,
            } => {
                assert_eq!(furthest, 3);
                assert_eq!(expected, vec!["b"]);
                assert_eq!(found.as_deref(), Some("x"));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn rejection_at_end_of_input() {
        let g = Grammar::parse("S -> a S b | ε").unwrap();
        let chart = EarleyParser::new(&g).chart(CharScanner::new("aab")).unwrap();
        assert!(!chart.accepted());
        assert_eq!(chart.furthest(), 3);
        match chart.rejection() {
            ParseError::Rejected { found, .. } => assert_eq!(found, None),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn scanner_failure_is_not_end_of_stream() {
        let g = Grammar::parse("S -> a S b | ε").unwrap();
        let tokens = vec![Ok(Token::word("a")), Err("broken input".into())];
        let err = EarleyParser::new(&g)
            .chart(TokenStream::new(tokens.into_iter()))
            .unwrap_err();
        match err {
            ParseError::Scanner { position, source } => {
                assert_eq!(position, 1);
                assert_eq!(source.to_string(), "broken input");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn word_tokens_match_terminal_names() {
        let g = Grammar::parse("E -> E + T | T\nT -> id").unwrap();
        let p = EarleyParser::new(&g);
        assert!(p.recognize(WordScanner::new("id + id + id")).unwrap());
        assert!(!p.recognize(WordScanner::new("id + + id")).unwrap());
        // a nonterminal name never matches a token
        assert!(!p.recognize(WordScanner::new("T")).unwrap());
    }

    #[test]
    fn unknown_tokens_keep_being_read() {
        let g = Grammar::parse("S -> a").unwrap();
        let chart = EarleyParser::new(&g).chart(CharScanner::new("zzz")).unwrap();
        assert_eq!(chart.input_len(), 3);
        assert_eq!(chart.sets().len(), 4);
        assert_eq!(chart.furthest(), 0);
    }

    /// Every string over `alphabet` of length at most `max`.
    fn all_inputs(alphabet: &str, max: usize) -> Vec<String> {
        let mut all = vec![String::new()];
        let mut layer = vec![String::new()];
        for _ in 0..max {
            layer = layer
                .iter()
                .flat_map(|prefix| alphabet.chars().map(move |c| format!("{}{}", prefix, c)))
                .collect();
            all.extend(layer.iter().cloned());
        }
        all
    }

    #[test]
    fn agrees_with_unger_and_lr1() {
        let cases = [
            ("S -> a S b | ε", "ab", 6),
            ("E -> E + E | n", "n+", 6),
            ("E -> E + T | T\nT -> T * F | F\nF -> ( E ) | n", "n+*()", 4),
            ("S -> A B\nA -> a | ε\nB -> b B | ε", "ab", 6),
            ("A -> ε | B | a\nB -> A", "a", 3),
            ("S -> i c S | i c S e S | s", "ices", 5),
        ];
        for (text, alphabet, max) in cases {
            let g = Grammar::parse(text).unwrap();
            let earley = EarleyParser::new(&g);
            let unger = crate::UngerParser::new(&g);
            let lr1 = g.to_lr1_automaton();

            for input in all_inputs(alphabet, max) {
                let expected = earley.recognize(CharScanner::new(&input)).unwrap();
                let by_unger = unger.parse(CharScanner::new(&input)).is_ok();
                assert_eq!(expected, by_unger, "unger on {:?} for {:?}", input, text);
                if lr1.is_deterministic() {
                    let by_lr1 = lr1.parse(CharScanner::new(&input)).is_ok();
                    assert_eq!(expected, by_lr1, "lr1 on {:?} for {:?}", input, text);
                }
            }
        }
    }
}
