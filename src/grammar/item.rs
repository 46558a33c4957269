use super::grammar::Rule;

/// A rule with a dot marking how much of its body has been matched.
/// The item refers to its rule by index; callers pass the rule back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DottedItem {
    pub rule: usize,
    pub dot: usize,
}

impl DottedItem {
    pub fn new(rule: usize) -> Self {
        Self { rule, dot: 0 }
    }

    pub fn is_complete(&self, rule: &Rule) -> bool {
        self.dot >= rule.right.len()
    }

    /// The symbol right after the dot, if the item is not complete.
    pub fn asking(&self, rule: &Rule) -> Option<usize> {
        rule.right.get(self.dot).cloned()
    }

    pub fn advance(&self) -> Self {
        Self {
            rule: self.rule,
            dot: self.dot + 1,
        }
    }

    /// `A -> x . y z`. Symbol names come from `name`.
    pub fn to_plaintext<'a>(&self, rule: &Rule, name: impl Fn(usize) -> &'a str) -> String {
        let mut right: Vec<&str> = Vec::with_capacity(rule.right.len() + 1);
        for (i, &s) in rule.right.iter().enumerate() {
            if i == self.dot {
                right.push(".");
            }
            right.push(name(s));
        }
        if self.dot >= rule.right.len() {
            right.push(".");
        }
        format!("{} -> {}", name(rule.left), right.join(" "))
    }
}
