/// Template syntax tree produced by the parser and consumed by the evaluator.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named post-selection text transform attached to a table reference
/// with dotted-path syntax: `[weapon.capitalize]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modifier {
    Capitalize,
    Lowercase,
    PluralForm,
    /// Replaces selection with a word generated from the whole candidate list.
    Markov,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [
        Modifier::Capitalize,
        Modifier::Lowercase,
        Modifier::PluralForm,
        Modifier::Markov,
    ];

    /// Look up a modifier by the name used in templates.
    pub fn from_name(name: &str) -> Option<Modifier> {
        match name {
            "capitalize" => Some(Modifier::Capitalize),
            "lowercase" => Some(Modifier::Lowercase),
            "pluralForm" => Some(Modifier::PluralForm),
            "markov" => Some(Modifier::Markov),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Modifier::Capitalize => "capitalize",
            Modifier::Lowercase => "lowercase",
            Modifier::PluralForm => "pluralForm",
            Modifier::Markov => "markov",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How many independent draws a table reference makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repetition {
    /// `*N`, or no clause at all (`Fixed(1)`).
    Fixed(u32),
    /// `*{min-max}`, drawn once per evaluation.
    Range { min: u32, max: u32 },
}

impl Default for Repetition {
    fn default() -> Self {
        Repetition::Fixed(1)
    }
}

impl Repetition {
    /// Resolve to a concrete iteration count.
    pub fn count(&self, rng: &mut dyn RngCore) -> u32 {
        match *self {
            Repetition::Fixed(n) => n,
            Repetition::Range { min, max } if min <= max => rng.gen_range(min..=max),
            Repetition::Range { min, max } => rng.gen_range(max..=min),
        }
    }
}

/// A single `[...]` reference with its trailing decorations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRef {
    /// Dotted path into the table store, modifiers already peeled off.
    pub path: String,
    /// Applied first to last.
    pub modifiers: Vec<Modifier>,
    pub is_optional: bool,
    /// Case-insensitive substrings; matching entries are never selected.
    pub exclusions: Vec<String>,
    pub repetition: Repetition,
}

impl TableRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            modifiers: Vec::new(),
            is_optional: false,
            exclusions: Vec::new(),
            repetition: Repetition::default(),
        }
    }
}

/// A node of a parsed template. The set is closed: the evaluator
/// matches every variant exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Literal passthrough content.
    Text(String),
    TableRef(TableRef),
    /// `{A&B&...}`: every operand, concatenated.
    And(Vec<Node>),
    /// `{A|B|...}`: exactly one operand, chosen uniformly.
    Or(Vec<Node>),
    /// `(...)` inside an inline expression.
    Group(Box<Node>),
    /// `{N-M}`, inclusive on both ends.
    NumberRange { min: u64, max: u64 },
    /// `{a}`, resolved to `a`/`an` after the whole output is assembled.
    IndefiniteArticle,
    /// Text interleaved with sigil regions.
    Mixed(Vec<Node>),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Node {
        Node::Text(value.into())
    }

    /// Every table reference reachable from this node, in source order.
    pub fn table_refs(&self) -> Vec<&TableRef> {
        let mut refs = Vec::new();
        self.collect_table_refs(&mut refs);
        refs
    }

    fn collect_table_refs<'a>(&'a self, out: &mut Vec<&'a TableRef>) {
        match self {
            Node::TableRef(table_ref) => out.push(table_ref),
            Node::And(children) | Node::Or(children) | Node::Mixed(children) => {
                for child in children {
                    child.collect_table_refs(out);
                }
            }
            Node::Group(child) => child.collect_table_refs(out),
            Node::Text(_) | Node::NumberRange { .. } | Node::IndefiniteArticle => {}
        }
    }
}
