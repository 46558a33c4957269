use std::collections::HashSet;

use crowbook_text_processing::escape;
use serde::Serialize;

use super::{Grammar, EPSILON};
use crate::earley::{Forest, NodeKind};
use crate::lr1::{Action, Conflict, Lr1Automaton, Lr1Item, ParsingTable};
use crate::tree::ParseTree;

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput<'a> {
    pub left: &'a str,
    pub rights: Vec<Vec<&'a str>>,
}

impl ProductionOutput<'_> {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .map(|right| {
                if right.is_empty() {
                    EPSILON.to_string()
                } else {
                    right.join(" ")
                }
            })
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow &", escape::tex(self.left))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left))
        };
        let right = self
            .rights
            .iter()
            .map(|right| {
                if right.is_empty() {
                    "\\epsilon".to_string()
                } else {
                    right
                        .iter()
                        .map(|s| escape::tex(*s))
                        .collect::<Vec<_>>()
                        .join(" \\ ")
                }
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");

        left + &right
    }
}

#[derive(Serialize)]
pub struct ProductionOutputVec<'a> {
    productions: Vec<ProductionOutput<'a>>,
}

impl ProductionOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.chars().count())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(self.productions.iter().map(|s| s.to_latex(true)))
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Grammar {
    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        let productions = self
            .non_terminal_iter()
            .map(|nt| ProductionOutput {
                left: nt.name.as_str(),
                rights: self
                    .rules_of(nt.index)
                    .map(|r| self.production_to_vec_str(&r.right))
                    .collect(),
            })
            .collect();
        ProductionOutputVec { productions }
    }
}

#[derive(Serialize)]
struct NonTerminalOutput<'a> {
    name: &'a str,
    nullable: bool,
    first: Vec<&'a str>,
    follow: Vec<&'a str>,
}

impl NonTerminalOutput<'_> {
    fn to_plaintext(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", ")
        )
    }

    fn to_latex(&self) -> String {
        fn f(a: &[&str]) -> String {
            a.iter()
                .map(|s| escape::tex(*s))
                .collect::<Vec<_>>()
                .join(r"\ ")
                .replace(EPSILON, r"$\epsilon$")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Serialize)]
pub struct NonTerminalOutputVec<'a> {
    data: Vec<NonTerminalOutput<'a>>,
}

impl NonTerminalOutputVec<'_> {
    pub fn to_plaintext(&self) -> String {
        self.data
            .iter()
            .map(|s| s.to_plaintext())
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

impl Grammar {
    pub fn to_non_terminal_output_vec(&self) -> NonTerminalOutputVec {
        let mut data = Vec::new();
        for nt in self.non_terminal_iter() {
            let mut t = NonTerminalOutput {
                name: nt.name.as_str(),
                nullable: nt.nullable,
                first: nt.first.iter().map(|&idx| self.get_symbol_name(idx)).collect(),
                follow: nt.follow.iter().map(|&idx| self.get_symbol_name(idx)).collect(),
            };
            t.first.sort();
            t.follow.sort();

            if nt.nullable {
                t.first.push(EPSILON);
            }
            data.push(t);
        }
        NonTerminalOutputVec { data }
    }
}

impl Lr1Automaton {
    fn item_to_latex(&self, item: &Lr1Item) -> String {
        let rule = self.rule(item.item.rule);
        let mut right: Vec<String> = Vec::new();
        for (i, &s) in rule.right.iter().enumerate() {
            if i == item.item.dot {
                right.push(".".to_string());
            }
            right.push(escape::tex(self.symbol_name(s)).to_string());
        }
        if item.item.dot >= rule.right.len() {
            right.push(".".to_string());
        }
        format!(
            "${} \\rightarrow {}$, {}",
            escape::tex(self.symbol_name(rule.left)),
            right.join(" "),
            escape::tex(self.symbol_name(item.lookahead))
        )
    }

    fn state_to_plaintext(&self, id: usize) -> String {
        let state = self.state(id);
        let items = state.content.clone();
        let edges = if state.transitions.is_empty() {
            String::new()
        } else {
            format!(
                "\n===\n{}",
                state
                    .transitions
                    .iter()
                    .map(|(&k, v)| format!("- {} -> {}", self.symbol_name(k), v))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        };
        format!("I{}\n{}{}", id, items, edges)
    }

    pub fn to_plaintext(&self) -> String {
        let states = (0..self.states.len())
            .map(|i| self.state_to_plaintext(i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let conflicts = if self.conflicts.is_empty() {
            String::new()
        } else {
            format!(
                "\n\nconflicts:\n{}",
                self.conflicts
                    .iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        };
        format!("{}\n\nstart: {}{}", states, self.start, conflicts)
    }

    fn node_to_latex(&self, id: usize) -> String {
        let content = self
            .state(id)
            .items
            .iter()
            .map(|e| self.item_to_latex(e))
            .collect::<Vec<_>>()
            .join(" \\\\ \n");
        format!(
            "\\node [block] (I_{}){}\n{{\n$I_{}$\\\\\n{}\n}};",
            id,
            if id > 0 {
                if id % 2 == 0 {
                    format!(" [below of = I_{}] ", id - 2)
                } else {
                    format!(" [right of = I_{}] ", id - 1)
                }
            } else {
                String::new()
            },
            id,
            content
        )
    }

    fn edge_to_latex(&self, id: usize) -> String {
        self.state(id)
            .transitions
            .iter()
            .map(|(&e, &v)| {
                format!(
                    "\\path [->] (I_{}) edge {} node [above]{{{}}} (I_{});",
                    id,
                    if id == v { "[loop left]" } else { "[right]" },
                    escape::tex(self.symbol_name(e)),
                    v
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        format!(
            "\\begin{{tikzpicture}}[node distance=5cm,block/.style={{state, rectangle, text width=6em}}]\n{}\n\\end{{tikzpicture}}",
            (0..self.states.len())
                .map(|i| self.node_to_latex(i))
                .chain((0..self.states.len()).map(|i| self.edge_to_latex(i)))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }

    pub fn to_output(&self) -> AutomatonOutput {
        AutomatonOutput {
            start: self.start,
            states: self
                .states
                .iter()
                .map(|s| StateOutput {
                    id: s.id,
                    items: s.items.iter().map(|i| self.item_to_plaintext(i)).collect(),
                    transitions: s
                        .transitions
                        .iter()
                        .map(|(&k, &v)| (self.symbol_name(k), v))
                        .collect(),
                    reductions: s
                        .reductions
                        .iter()
                        .map(|(&k, rules)| (self.symbol_name(k), rules.clone()))
                        .collect(),
                })
                .collect(),
            conflicts: &self.conflicts,
        }
    }
}

#[derive(Serialize)]
pub struct StateOutput<'a> {
    id: usize,
    items: Vec<String>,
    transitions: Vec<(&'a str, usize)>,
    reductions: Vec<(&'a str, Vec<usize>)>,
}

#[derive(Serialize)]
pub struct AutomatonOutput<'a> {
    start: usize,
    states: Vec<StateOutput<'a>>,
    conflicts: &'a [Conflict],
}

impl AutomatonOutput<'_> {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ParsingTable {
    fn action_to_plaintext(&self, action: &Action) -> String {
        match action {
            Action::Reduce(r) => {
                let (left, right) = &self.productions[*r];
                if right.is_empty() {
                    format!("r({} -> {})", left, EPSILON)
                } else {
                    format!("r({} -> {})", left, right.join(" "))
                }
            }
            Action::Shift(s) => format!("s{}", s),
            Action::Accept => "acc".to_string(),
        }
    }

    fn action_to_latex(&self, action: &Action, terminal_set: &HashSet<&String>) -> String {
        match action {
            Action::Reduce(r) => {
                let (left, right) = &self.productions[*r];
                let right = if right.is_empty() {
                    "\\epsilon".to_string()
                } else {
                    right
                        .iter()
                        .map(|s| {
                            if terminal_set.contains(s) {
                                format!("\\text{{{}}}", escape::tex(s))
                            } else {
                                escape::tex(s).to_string()
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(" \\  ")
                };
                format!("reduce ${} \\rightarrow {}$", escape::tex(left), right)
            }
            Action::Shift(s) => format!("shift {}", s),
            Action::Accept => "accept".to_string(),
        }
    }

    pub fn to_plaintext(&self) -> String {
        let mut output: Vec<Vec<String>> = Vec::new();

        output.push(vec![String::new()]);
        for s in self.terminals.iter().chain(self.non_terminals.iter()) {
            output[0].push(s.clone());
        }

        for (r1, r2) in self.action.iter().zip(self.goto.iter()) {
            let i = output.len() - 1;
            let row: Vec<String> = std::iter::once(i.to_string())
                .chain(r1.iter().map(|actions| {
                    actions
                        .iter()
                        .map(|action| self.action_to_plaintext(action))
                        .collect::<Vec<_>>()
                        .join("; ")
                }))
                .chain(r2.iter().map(|goto| match goto {
                    Some(goto) => goto.to_string(),
                    None => String::new(),
                }))
                .collect::<Vec<_>>();
            output.push(row);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| {
                output
                    .iter()
                    .map(|row| row[j].chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let header: String = format!(
            "\\begin{{tabular}}{{c{}}}\n & \\multicolumn{{{}}}{{c}}{{action}} & \\multicolumn{{{}}}{{|c}}{{goto}}\\\\",
            "|l".repeat(self.terminals.len() + self.non_terminals.len()),
            self.terminals.len(),
            self.non_terminals.len(),
        );

        let mut first_row: Vec<String> = vec![String::new()];
        for s in self.terminals.iter().chain(self.non_terminals.iter()) {
            first_row.push(escape::tex(s).to_string());
        }
        let first_row = first_row.join(" & ");

        let terminal_set: HashSet<&String> = self.terminals.iter().collect();

        let mut content: Vec<Vec<String>> = Vec::new();
        for (r1, r2) in self.action.iter().zip(self.goto.iter()) {
            let i = content.len();
            let row: Vec<String> = std::iter::once(i.to_string())
                .chain(r1.iter().map(|actions| {
                    let r = actions
                        .iter()
                        .map(|action| self.action_to_latex(action, &terminal_set))
                        .collect::<Vec<_>>()
                        .join("; ");
                    if actions.len() > 1 {
                        format!("{{\\color{{red}}{}}}", r)
                    } else {
                        r
                    }
                }))
                .chain(r2.iter().map(|goto| match goto {
                    Some(goto) => goto.to_string(),
                    None => String::new(),
                }))
                .collect::<Vec<_>>();
            content.push(row);
        }

        let content = content
            .iter()
            .map(|row| row.join(" & "))
            .collect::<Vec<_>>()
            .join(" \\\\\n");

        format!(
            "{}\n{} \\\\\\hline\n{}\n\\end{{tabular}}",
            header, first_row, content
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Forest {
    /// One line per branch node: `E[0,5] ::= E[0,3] + E[4,5] | ...`.
    pub fn to_plaintext(&self) -> String {
        let span = |id: usize| {
            let n = self.node(id);
            match &n.kind {
                NodeKind::Leaf { text } => text.clone(),
                NodeKind::Branch { .. } => format!("{}[{},{}]", n.name, n.start, n.end),
            }
        };
        self.nodes()
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| {
                let packs = n
                    .packs()
                    .iter()
                    .map(|p| {
                        if p.children.is_empty() {
                            EPSILON.to_string()
                        } else {
                            p.children.iter().map(|&c| span(c)).collect::<Vec<_>>().join(" ")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" | ");
                format!("{} ::= {}", span(n.id), packs)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ParseTree {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::earley::EarleyParser;
    use crate::scanner::CharScanner;
    use crate::Grammar;

    #[test]
    fn productions_plaintext_and_latex() {
        let g = Grammar::parse("S -> a S b | ε\nLong -> x").unwrap();
        let out = g.to_production_output_vec();
        assert_eq!(
            out.to_plaintext(),
            "   S -> a S b\n      | ε\nLong -> x"
        );
        assert!(out.to_latex().contains("S & \\rightarrow &a \\ S \\ b \\mid \\epsilon"));
    }

    #[test]
    fn nff_plaintext() {
        let g = Grammar::parse("S -> A b\nA -> a | ε").unwrap();
        assert_eq!(
            g.to_non_terminal_output_vec().to_plaintext(),
            "S | false | a, b | $\nA | true | a, ε | b"
        );
        let json = g.to_non_terminal_output_vec().to_json().unwrap();
        assert!(json.starts_with("{\"data\":[{\"name\":\"S\""));
    }

    #[test]
    fn automaton_renderings() {
        let g = Grammar::parse("S -> A b\nA -> a").unwrap();
        let m = g.to_lr1_automaton();
        let text = m.to_plaintext();
        assert!(text.starts_with("I0\nA -> . a, b\nS -> . A b, $\nS' -> . S, $\n===\n- S -> 1"));
        assert!(text.ends_with("start: 0"));
        assert!(m.to_latex().contains("\\node [block] (I_0)"));
        let json = m.to_output().to_json().unwrap();
        assert!(json.contains("\"conflicts\":[]"));
    }

    #[test]
    fn table_plaintext() {
        let g = Grammar::parse("S -> a").unwrap();
        let t = g.to_lr1_automaton().to_parsing_table();
        let text = t.to_plaintext();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], " |  a |         $ | S");
        assert_eq!(lines[1], "0 | s2 |           | 1");
        assert!(text.contains("r(S -> a)"));
        assert!(text.contains("acc"));
        assert!(t.to_latex().starts_with("\\begin{tabular}"));
    }

    #[test]
    fn table_plaintext_empty_rule() {
        let g = Grammar::parse("S -> a S b | ε").unwrap();
        let text = g.to_lr1_automaton().to_parsing_table().to_plaintext();
        assert!(text.contains("r(S -> ε)"));
        assert!(!text.contains("r(S -> )"));
    }

    #[test]
    fn forest_plaintext() {
        let g = Grammar::parse("E -> E + E | n").unwrap();
        let f = EarleyParser::new(&g)
            .parse(CharScanner::new("n+n+n"))
            .unwrap();
        let text = f.to_plaintext();
        assert_eq!(
            text.lines().next(),
            Some("E[0,5] ::= E[0,3] + E[4,5] | E[0,1] + E[2,5]")
        );
    }
}
