use std::collections::HashSet;

use super::{grammar::Symbol, Grammar};

impl Grammar {
    pub(crate) fn calculate_nullable_first_follow(&mut self) {
        let end_mark = self.end_mark();
        let start = self.start_symbol;
        if let Some(nt) = self.symbols[start].mut_non_terminal() {
            nt.follow.insert(end_mark);
        }
        self.calculate_nullable();
        self.calculate_first();
        self.calculate_follow();
    }

    pub(crate) fn reset_nullable_first_follow(&mut self) {
        for nt in self.non_terminal_iter_mut() {
            nt.nullable = false;
            nt.first = HashSet::new();
            nt.follow = HashSet::new();
        }
    }

    pub fn is_nullable(&self, symbol: usize) -> bool {
        self.non_terminal(symbol).map_or(false, |nt| nt.nullable)
    }

    fn calculate_nullable(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..self.rules.len() {
                let left = self.rules[i].left;
                if self.is_nullable(left) {
                    continue;
                }
                if self.rules[i].right.iter().all(|&s| self.is_nullable(s)) {
                    if let Some(nt) = self.symbols[left].mut_non_terminal() {
                        nt.nullable = true;
                    }
                    changed = true;
                }
            }
        }
    }

    /// FIRST of a symbol sequence. The flag tells whether the whole sequence
    /// can derive the empty string.
    pub fn first_of_sequence(&self, production: &[usize]) -> (HashSet<usize>, bool) {
        let mut first: HashSet<usize> = HashSet::new();
        for (idx, symbol) in production.iter().map(|i| (*i, &self.symbols[*i])) {
            match symbol {
                Symbol::Terminal(_) => {
                    first.insert(idx);
                    return (first, false);
                }
                Symbol::NonTerminal(nt) => {
                    first.extend(nt.first.iter().cloned());
                    if !nt.nullable {
                        return (first, false);
                    }
                }
            }
        }
        (first, true)
    }

    pub fn calculate_first_for_production(&self, production: &[usize]) -> HashSet<usize> {
        self.first_of_sequence(production).0
    }

    fn calculate_first(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..self.rules.len() {
                let first = self.calculate_first_for_production(&self.rules[i].right);
                let left = self.rules[i].left;
                if let Some(nt) = self.symbols[left].mut_non_terminal() {
                    let before = nt.first.len();
                    nt.first.extend(first);
                    changed |= nt.first.len() != before;
                }
            }
        }
    }

    fn calculate_follow(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..self.rules.len() {
                let right = self.rules[i].right.clone();
                let left_follow = self.symbols[self.rules[i].left]
                    .non_terminal()
                    .map(|nt| nt.follow.clone())
                    .unwrap_or_default();

                for (pos, &s) in right.iter().enumerate() {
                    if self.is_terminal(s) {
                        continue;
                    }
                    let (mut follow, rest_nullable) = self.first_of_sequence(&right[pos + 1..]);
                    if rest_nullable {
                        follow.extend(left_follow.iter().cloned());
                    }
                    if let Some(nt) = self.symbols[s].mut_non_terminal() {
                        let before = nt.follow.len();
                        nt.follow.extend(follow);
                        changed |= nt.follow.len() != before;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::Grammar;

    fn names<'a>(g: &'a Grammar, set: &HashSet<usize>) -> Vec<&'a str> {
        let mut v: Vec<&str> = set.iter().map(|&i| g.get_symbol_name(i)).collect();
        v.sort();
        v
    }

    #[test]
    fn expression_grammar() {
        let g = Grammar::parse(
            "E -> T E'\nE' -> + T E' | ε\nT -> F T'\nT' -> * F T' | ε\nF -> ( E ) | id",
        )
        .unwrap();
        let nt = |n: &str| g.non_terminal(g.get_symbol_index(n).unwrap()).unwrap();

        assert!(nt("E'").nullable);
        assert!(!nt("E").nullable);
        assert_eq!(names(&g, &nt("E").first), vec!["(", "id"]);
        assert_eq!(names(&g, &nt("T'").first), vec!["*"]);
        assert_eq!(names(&g, &nt("E").follow), vec!["$", ")"]);
        assert_eq!(names(&g, &nt("T").follow), vec!["$", ")", "+"]);
        assert_eq!(names(&g, &nt("F").follow), vec!["$", ")", "*", "+"]);
    }

    #[test]
    fn sequence_first_reports_nullability() {
        let g = Grammar::parse("S -> A B c\nA -> a | ε\nB -> b | ε").unwrap();
        let a = g.get_symbol_index("A").unwrap();
        let b = g.get_symbol_index("B").unwrap();
        let c = g.get_symbol_index("c").unwrap();

        let (first, nullable) = g.first_of_sequence(&[a, b]);
        assert_eq!(names(&g, &first), vec!["a", "b"]);
        assert!(nullable);

        let (first, nullable) = g.first_of_sequence(&[a, b, c]);
        assert_eq!(names(&g, &first), vec!["a", "b", "c"]);
        assert!(!nullable);

        assert!(g.first_of_sequence(&[]).1);
    }
}
