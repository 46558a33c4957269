use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::grammar::{DottedItem, Grammar};
use crate::tree::ParseTree;

use super::chart::Chart;

pub type NodeId = usize;

/// One derivation of a node's span: the rule used and one child per body
/// symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pack {
    pub rule: usize,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Leaf { text: String },
    Branch { packs: Vec<Pack> },
}

/// Forest node keyed by (symbol, start, end). A branch with more than one
/// pack is an ambiguity at that span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForestNode {
    pub id: NodeId,
    pub symbol: usize,
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub kind: NodeKind,
}

impl ForestNode {
    pub fn packs(&self) -> &[Pack] {
        match &self.kind {
            NodeKind::Branch { packs } => packs,
            NodeKind::Leaf { .. } => &[],
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn is_ambiguous(&self) -> bool {
        self.packs().len() > 1
    }
}

/// Shared packed parse forest stored as an arena. Children are referenced by
/// id, so nullable cycles point back at an existing node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Forest {
    nodes: Vec<ForestNode>,
    root: NodeId,
    #[serde(skip)]
    index: HashMap<(usize, usize, usize), NodeId>,
}

impl Forest {
    /// Forest of an accepting chart, rooted at (start, 0, n).
    pub fn build(chart: &Chart) -> Option<Forest> {
        if !chart.accepted() {
            return None;
        }
        let mut builder = ForestBuilder {
            chart,
            grammar: chart.grammar(),
            nodes: Vec::new(),
            index: HashMap::new(),
            pending: VecDeque::new(),
        };
        let root = builder.node(chart.grammar().start_symbol(), 0, chart.input_len())?;
        while let Some(id) = builder.pending.pop_front() {
            builder.expand(id);
        }
        log::debug!("forest: {} nodes", builder.nodes.len());
        Some(Forest {
            nodes: builder.nodes,
            root,
            index: builder.index,
        })
    }

    pub fn root(&self) -> &ForestNode {
        &self.nodes[self.root]
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ForestNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[ForestNode] {
        &self.nodes
    }

    pub fn find(&self, symbol: usize, start: usize, end: usize) -> Option<&ForestNode> {
        self.index.get(&(symbol, start, end)).map(|&id| &self.nodes[id])
    }

    pub fn is_ambiguous(&self) -> bool {
        self.nodes.iter().any(|n| n.is_ambiguous())
    }

    /// Enumerates up to `limit` derivation trees in pack order. Packs that
    /// lead back into a node already on the current path are skipped, so
    /// cyclic derivations contribute only their finite unfoldings.
    pub fn trees(&self, limit: usize) -> Vec<ParseTree> {
        let mut on_path = vec![false; self.nodes.len()];
        let mut stack: Vec<Frame> = Vec::new();
        // trees of the node that just finished, handed to the frame below
        let mut done = self.enter(self.root, limit, &mut on_path, &mut stack);

        loop {
            let frame = match stack.last_mut() {
                Some(frame) => frame,
                None => break,
            };
            if let Some(options) = done.take() {
                frame.partial = extend(std::mem::take(&mut frame.partial), options, limit);
                frame.child += 1;
            }

            let packs = frame.packs;
            if let Some(pack) = packs.get(frame.pack) {
                if frame.child < pack.children.len() && !frame.partial.is_empty() {
                    let child = pack.children[frame.child];
                    done = self.enter(child, limit, &mut on_path, &mut stack);
                    continue;
                }
                let name = &self.nodes[frame.id].name;
                for children in std::mem::replace(&mut frame.partial, vec![Vec::new()]) {
                    if frame.trees.len() >= limit {
                        break;
                    }
                    frame.trees.push(ParseTree::Node {
                        symbol: name.clone(),
                        rule: pack.rule,
                        children,
                    });
                }
                frame.pack += 1;
                frame.child = 0;
                continue;
            }

            let id = frame.id;
            done = Some(std::mem::take(&mut frame.trees));
            stack.pop();
            on_path[id] = false;
        }

        done.unwrap_or_default()
    }

    /// Trees of a leaf or of a node that cannot be entered, or `None` after
    /// pushing a frame for a branch node.
    fn enter<'f>(
        &'f self,
        id: NodeId,
        limit: usize,
        on_path: &mut [bool],
        stack: &mut Vec<Frame<'f>>,
    ) -> Option<Vec<ParseTree>> {
        let node = &self.nodes[id];
        let packs = match &node.kind {
            NodeKind::Leaf { text } => {
                return Some(vec![ParseTree::Leaf {
                    symbol: node.name.clone(),
                    text: text.clone(),
                }])
            }
            NodeKind::Branch { packs } => packs,
        };
        if on_path[id] || limit == 0 {
            return Some(Vec::new());
        }
        on_path[id] = true;
        stack.push(Frame {
            id,
            packs,
            pack: 0,
            child: 0,
            partial: vec![Vec::new()],
            trees: Vec::new(),
        });
        None
    }
}

/// A branch node being expanded by `Forest::trees`: the pack and child under
/// work, the child sequences built so far for that pack and the finished
/// trees of earlier packs.
struct Frame<'f> {
    id: NodeId,
    packs: &'f [Pack],
    pack: usize,
    child: usize,
    partial: Vec<Vec<ParseTree>>,
    trees: Vec<ParseTree>,
}

/// Every prefix in `partial` followed by every option, capped at `limit`.
fn extend(
    mut partial: Vec<Vec<ParseTree>>,
    options: Vec<ParseTree>,
    limit: usize,
) -> Vec<Vec<ParseTree>> {
    if partial.len() == 1 && options.len() == 1 {
        partial[0].extend(options);
        return partial;
    }
    let mut next = Vec::new();
    for prefix in &partial {
        for option in &options {
            if next.len() >= limit {
                return next;
            }
            let mut extended = prefix.clone();
            extended.push(option.clone());
            next.push(extended);
        }
    }
    next
}

struct ForestBuilder<'c, 'g> {
    chart: &'c Chart<'g>,
    grammar: &'g Grammar,
    nodes: Vec<ForestNode>,
    index: HashMap<(usize, usize, usize), NodeId>,
    /// Branch nodes registered but not yet given their packs.
    pending: VecDeque<NodeId>,
}

impl ForestBuilder<'_, '_> {
    /// Node for `symbol` spanning `start..end`. Terminals become leaves at
    /// once; a nonterminal is registered and queued, so a later request for
    /// the same span gets the id back and cycles are never expanded twice.
    fn node(&mut self, symbol: usize, start: usize, end: usize) -> Option<NodeId> {
        if let Some(&id) = self.index.get(&(symbol, start, end)) {
            return Some(id);
        }
        let g = self.grammar;
        let id = self.nodes.len();

        let kind = if g.is_terminal(symbol) {
            let token = self.chart.tokens().get(start)?;
            if end != start + 1 || token.kind != g.get_symbol_name(symbol) {
                return None;
            }
            NodeKind::Leaf {
                text: token.text.clone(),
            }
        } else {
            self.pending.push_back(id);
            NodeKind::Branch { packs: Vec::new() }
        };

        self.nodes.push(ForestNode {
            id,
            symbol,
            name: g.get_symbol_name(symbol).to_string(),
            start,
            end,
            kind,
        });
        self.index.insert((symbol, start, end), id);
        Some(id)
    }

    /// Resolves the packs of a queued branch node from the completed items
    /// of its end column.
    fn expand(&mut self, id: NodeId) {
        let g = self.grammar;
        let (symbol, start, end) = {
            let n = &self.nodes[id];
            (n.symbol, n.start, n.end)
        };

        let completions: Vec<usize> = self
            .chart
            .set(end)
            .completed()
            .filter(|item| item.origin == start && item.rule(g).left == symbol)
            .map(|item| item.item.rule)
            .collect();

        for rule in completions {
            let len = g.rule(rule).len();
            for children in self.walk_back(rule, len, end, start) {
                if let NodeKind::Branch { packs } = &mut self.nodes[id].kind {
                    let pack = Pack { rule, children };
                    if !packs.contains(&pack) {
                        packs.push(pack);
                    }
                }
            }
        }
    }

    /// All ways to split `origin..end` among the first `dot` body symbols of
    /// `rule`, following the items the chart actually recorded.
    fn walk_back(&mut self, rule: usize, dot: usize, end: usize, origin: usize) -> Vec<Vec<NodeId>> {
        if dot == 0 {
            return if end == origin { vec![Vec::new()] } else { Vec::new() };
        }
        let g = self.grammar;
        let symbol = g.rule(rule).right[dot - 1];

        let mut splits: Vec<usize> = Vec::new();
        if g.is_terminal(symbol) {
            if end > origin {
                splits.push(end - 1);
            }
        } else {
            for item in self.chart.set(end).completed() {
                if item.rule(g).left == symbol
                    && item.origin >= origin
                    && !splits.contains(&item.origin)
                {
                    splits.push(item.origin);
                }
            }
        }

        let prefix = DottedItem { rule, dot: dot - 1 };
        let mut results = Vec::new();
        for k in splits {
            if !self.chart.set(k).contains(prefix, origin) {
                continue;
            }
            let child = match self.node(symbol, k, end) {
                Some(child) => child,
                None => continue,
            };
            for mut path in self.walk_back(rule, dot - 1, k, origin) {
                path.push(child);
                results.push(path);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use crate::earley::EarleyParser;
    use crate::scanner::CharScanner;
    use crate::Grammar;

    fn forest(grammar: &Grammar, input: &str) -> super::Forest {
        EarleyParser::new(grammar)
            .parse(CharScanner::new(input))
            .unwrap()
    }

    #[test]
    fn balanced_pairs_have_one_derivation() {
        let g = Grammar::parse("S -> a S b | ε").unwrap();
        let f = forest(&g, "aabb");
        let root = f.root();
        assert_eq!((root.name.as_str(), root.start, root.end), ("S", 0, 4));
        assert_eq!(root.packs().len(), 1);
        assert!(!f.is_ambiguous());

        let s = g.get_symbol_index("S").unwrap();
        let inner = f.find(s, 1, 3).unwrap();
        assert_eq!(inner.packs().len(), 1);
        let empty = f.find(s, 2, 2).unwrap();
        assert_eq!(empty.packs()[0].children.len(), 0);

        let trees = f.trees(10);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].to_bracketed(), "(S a (S a (S) b) b)");
    }

    #[test]
    fn ambiguous_sum_has_two_packs() {
        let g = Grammar::parse("E -> E + E | n").unwrap();
        let f = forest(&g, "n+n+n");
        let root = f.root();
        assert_eq!((root.start, root.end), (0, 5));
        assert_eq!(root.packs().len(), 2);

        let spans: Vec<Vec<(usize, usize)>> = root
            .packs()
            .iter()
            .map(|p| p.children.iter().map(|&c| (f.node(c).start, f.node(c).end)).collect())
            .collect();
        assert_eq!(
            spans,
            vec![
                vec![(0, 3), (3, 4), (4, 5)],
                vec![(0, 1), (1, 2), (2, 5)],
            ]
        );

        let trees: Vec<String> = f.trees(10).iter().map(|t| t.to_bracketed()).collect();
        assert_eq!(
            trees,
            vec![
                "(E (E (E n) + (E n)) + (E n))",
                "(E (E n) + (E (E n) + (E n)))",
            ]
        );
    }

    #[test]
    fn empty_input_empty_rule() {
        let g = Grammar::parse("S -> ε").unwrap();
        let f = forest(&g, "");
        let root = f.root();
        assert_eq!((root.start, root.end), (0, 0));
        assert_eq!(root.packs().len(), 1);
        assert!(root.packs()[0].children.is_empty());
    }

    #[test]
    fn nullable_cycle_is_shared_not_duplicated() {
        // A -> B -> A loops on the empty span
        let g = Grammar::parse("A -> ε | B\nB -> A").unwrap();
        let f = forest(&g, "");
        let a = g.get_symbol_index("A").unwrap();
        let b = g.get_symbol_index("B").unwrap();
        assert_eq!(f.nodes().len(), 2);

        let a_node = f.find(a, 0, 0).unwrap();
        let b_node = f.find(b, 0, 0).unwrap();
        assert_eq!(a_node.packs().len(), 2);
        assert_eq!(b_node.packs()[0].children, vec![a_node.id]);

        let trees: Vec<String> = f.trees(10).iter().map(|t| t.to_bracketed()).collect();
        assert_eq!(trees, vec!["(A)"]);
    }

    #[test]
    fn forests_are_reproducible() {
        let g = Grammar::parse("S -> S S | b\nS -> S S X\nX -> ε").unwrap();
        assert_eq!(forest(&g, "bbb"), forest(&g, "bbb"));
    }

    #[test]
    fn long_right_recursion_builds() {
        let g = Grammar::parse("S -> a S | ε").unwrap();
        let input = "a".repeat(2000);
        let f = forest(&g, &input);
        let s = g.get_symbol_index("S").unwrap();
        assert_eq!((f.root().start, f.root().end), (0, 2000));
        assert!(f.find(s, 1999, 2000).is_some());
        assert!(!f.is_ambiguous());

        let trees = f.trees(2);
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].children().len(), 2);
    }

    #[test]
    fn tree_limit_is_respected() {
        let g = Grammar::parse("E -> E + E | n").unwrap();
        let f = forest(&g, "n+n+n+n+n");
        assert_eq!(f.trees(100).len(), 14);
        assert_eq!(f.trees(3).len(), 3);
    }
}
