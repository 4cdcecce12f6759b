/// AST evaluator — resolves a parsed template against the table store.

use rand::{Rng, RngCore};

use crate::core::markov::{generate_markov, MarkovOptions};
use crate::core::modifiers::{self, ARTICLE_PLACEHOLDER};
use crate::core::parser;
use crate::core::weighted;
use crate::schema::ast::{Modifier, Node, TableRef};
use crate::schema::table::TableStore;

/// Per-call evaluation state. Created fresh for every top-level
/// `generate` call and never shared between calls.
///
/// The depth counter is one budget for the whole call, not a stack depth.
/// Every re-parse of a selected value spends one unit and nothing gives it
/// back, so `[npc*12]` over a templated `npc` list resolves the first
/// `max_depth` draws and returns the rest as raw text. Plain values cost
/// nothing.
pub struct EvaluationSession<'r> {
    depth: usize,
    max_depth: usize,
    rng: &'r mut dyn RngCore,
}

impl<'r> EvaluationSession<'r> {
    pub fn new(max_depth: usize, rng: &'r mut dyn RngCore) -> Self {
        Self {
            depth: 0,
            max_depth,
            rng,
        }
    }

    /// Number of template re-resolutions performed so far. Never decreases.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn exhausted(&self) -> bool {
        self.depth >= self.max_depth
    }

    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }
}

/// Walks a `Node` tree bottom-up, producing output text.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    tables: &'a TableStore,
    debug: bool,
    markov: MarkovOptions,
}

impl<'a> Evaluator<'a> {
    pub fn new(tables: &'a TableStore) -> Self {
        Self {
            tables,
            debug: false,
            markov: MarkovOptions::default(),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_markov_options(mut self, options: MarkovOptions) -> Self {
        self.markov = options;
        self
    }

    /// Evaluate a node. `{a}` placeholders are left in the output for
    /// `modifiers::resolve_articles`.
    pub fn evaluate(&self, node: &Node, session: &mut EvaluationSession<'_>) -> String {
        match node {
            Node::Text(value) => value.clone(),
            Node::TableRef(table_ref) => self.evaluate_table_ref(table_ref, session),
            Node::And(children) => children
                .iter()
                .map(|child| match child {
                    Node::TableRef(table_ref) if table_ref.is_optional => {
                        let forced = TableRef {
                            is_optional: false,
                            ..table_ref.clone()
                        };
                        self.evaluate_table_ref(&forced, session)
                    }
                    other => self.evaluate(other, session),
                })
                .collect(),
            Node::Or(children) => {
                if children.is_empty() {
                    return String::new();
                }
                let pick = session.rng().gen_range(0..children.len());
                self.evaluate(&children[pick], session)
            }
            Node::Group(child) => self.evaluate(child, session),
            Node::NumberRange { min, max } => {
                let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
                session.rng().gen_range(lo..=hi).to_string()
            }
            Node::IndefiniteArticle => ARTICLE_PLACEHOLDER.to_string(),
            Node::Mixed(children) => children
                .iter()
                .map(|child| self.evaluate(child, session))
                .collect(),
        }
    }

    /// Treat a selected raw value as a template of its own. Past the
    /// depth bound the value comes back unresolved.
    pub fn expand(&self, value: &str, session: &mut EvaluationSession<'_>) -> String {
        if let Some(literal) = strip_literal_quotes(value) {
            return literal.to_string();
        }
        if !value.contains(['[', '{']) {
            return value.to_string();
        }
        if session.exhausted() {
            if self.debug {
                tracing::warn!(
                    value,
                    max_depth = session.max_depth,
                    "recursion limit reached, returning value unresolved"
                );
            }
            return value.to_string();
        }

        session.depth += 1;
        let node = parser::parse(value);
        self.evaluate(&node, session)
    }

    fn evaluate_table_ref(
        &self,
        table_ref: &TableRef,
        session: &mut EvaluationSession<'_>,
    ) -> String {
        if table_ref.is_optional && !session.rng().gen_bool(0.5) {
            return String::new();
        }

        let count = table_ref
            .repetition
            .count(session.rng())
            .min(parser::MAX_REPETITION);
        let mut results = Vec::new();
        for _ in 0..count {
            let value = self.select_once(table_ref, session);
            if !value.is_empty() {
                results.push(value);
            }
        }
        results.join(", ")
    }

    /// One independent draw from the referenced table, fully resolved
    /// and modified. Missing tables and exhausted filters yield "".
    fn select_once(&self, table_ref: &TableRef, session: &mut EvaluationSession<'_>) -> String {
        let Some(items) = self.tables.resolve(&table_ref.path) else {
            if self.debug {
                tracing::warn!(path = %table_ref.path, "table not found or not a list");
            }
            return String::new();
        };

        let candidates: Vec<&str> = items
            .iter()
            .map(String::as_str)
            .filter(|raw| !is_excluded(weighted::strip_weight(raw), &table_ref.exclusions))
            .collect();
        if candidates.is_empty() {
            if self.debug {
                tracing::warn!(
                    path = %table_ref.path,
                    exclusions = ?table_ref.exclusions,
                    "every entry excluded"
                );
            }
            return String::new();
        }

        let resolved = if table_ref.modifiers.contains(&Modifier::Markov) {
            generate_markov(&candidates, &self.markov, session.rng())
        } else {
            let Some(selected) = weighted::choose_weighted(&candidates, session.rng()) else {
                return String::new();
            };
            if self.debug {
                tracing::debug!(
                    path = %table_ref.path,
                    selected,
                    depth = session.depth,
                    "resolved table reference"
                );
            }
            self.expand(selected, session)
        };

        modifiers::apply_all(&table_ref.modifiers, resolved)
    }
}

/// Inner text of a value wrapped in matching single or double quotes.
pub fn strip_literal_quotes(value: &str) -> Option<&str> {
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    if value.len() >= 2 && value.ends_with(quote) {
        Some(&value[1..value.len() - 1])
    } else {
        None
    }
}

fn is_excluded(value: &str, exclusions: &[String]) -> bool {
    if exclusions.is_empty() {
        return false;
    }
    let value = value.to_lowercase();
    exclusions
        .iter()
        .any(|word| value.contains(&word.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ast::Repetition;
    use crate::schema::table::TableValue;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store(tables: &[(&str, &[&str])]) -> TableStore {
        let mut store = TableStore::new();
        for (name, items) in tables {
            store.insert(
                *name,
                TableValue::List(items.iter().map(|s| s.to_string()).collect()),
            );
        }
        store
    }

    fn run(tables: &TableStore, template: &str, seed: u64) -> String {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut session = EvaluationSession::new(10, &mut rng);
        let node = parser::parse(template);
        Evaluator::new(tables).evaluate(&node, &mut session)
    }

    #[test]
    fn text_passes_through() {
        let tables = TableStore::new();
        assert_eq!(run(&tables, "just words", 1), "just words");
    }

    #[test]
    fn missing_table_contributes_nothing() {
        let tables = TableStore::new();
        assert_eq!(run(&tables, "a [ghost] b", 1), "a  b");
    }

    #[test]
    fn and_forces_optional_operands() {
        let tables = store(&[("a", &["x"]), ("b", &["y"])]);
        for seed in 0..200 {
            assert_eq!(run(&tables, "{[a]&[b?]}", seed), "xy");
            assert_eq!(run(&tables, "{[a]&[b]?}", seed), "xy");
        }
    }

    #[test]
    fn and_does_not_reach_into_nested_groups() {
        let tables = store(&[("a", &["x"]), ("b", &["y"])]);
        let mut saw_empty = false;
        for seed in 0..200 {
            let out = run(&tables, "{[a]&([b?])}", seed);
            assert!(out == "x" || out == "xy", "unexpected {:?}", out);
            saw_empty |= out == "x";
        }
        assert!(saw_empty, "optional inside a group should sometimes be skipped");
    }

    #[test]
    fn or_picks_exactly_one() {
        let tables = store(&[("a", &["x"]), ("b", &["y"])]);
        let mut seen_x = false;
        let mut seen_y = false;
        for seed in 0..200 {
            let out = run(&tables, "{[a]|[b]}", seed);
            assert!(out == "x" || out == "y", "unexpected {:?}", out);
            seen_x |= out == "x";
            seen_y |= out == "y";
        }
        assert!(seen_x && seen_y);
    }

    #[test]
    fn optional_is_sometimes_skipped() {
        let tables = store(&[("a", &["x"])]);
        let outputs: Vec<String> = (0..200).map(|seed| run(&tables, "[a?]", seed)).collect();
        assert!(outputs.iter().any(|o| o.is_empty()));
        assert!(outputs.iter().any(|o| o == "x"));
    }

    #[test]
    fn repetition_draws_independently() {
        let tables = store(&[("coin", &["heads", "tails"])]);
        let out = run(&tables, "[coin*5]", 9);
        assert_eq!(out.split(", ").count(), 5);

        let mut saw_mixed = false;
        for seed in 0..50 {
            let out = run(&tables, "[coin*4]", seed);
            saw_mixed |= out.contains("heads") && out.contains("tails");
        }
        assert!(saw_mixed, "repeated draws should not reuse a single pick");
    }

    #[test]
    fn repetition_range_bounds() {
        let tables = store(&[("gem", &["ruby", "opal", "jade"])]);
        for seed in 0..300 {
            let out = run(&tables, "[gem*{2-4}]", seed);
            let n = out.split(", ").count();
            assert!((2..=4).contains(&n), "{} segments in {:?}", n, out);
        }
    }

    #[test]
    fn zero_repetition_is_empty() {
        let tables = store(&[("gem", &["ruby"])]);
        assert_eq!(run(&tables, "[gem*0]", 1), "");
        assert_eq!(run(&tables, "<[gem*{0-0}]>", 1), "<>");
    }

    #[test]
    fn empty_iterations_are_not_joined() {
        let tables = store(&[("blank", &[""])]);
        assert_eq!(run(&tables, "[blank*3]", 1), "");
    }

    #[test]
    fn exclusions_filter_case_insensitively() {
        let tables = store(&[("gem", &["Ruby ^5", "opal", "jade"])]);
        for seed in 0..200 {
            let out = run(&tables, "[gem!ruby!JA]", seed);
            assert_eq!(out, "opal");
        }
        assert_eq!(run(&tables, "[gem!ruby!opal!jade]", 1), "");
    }

    #[test]
    fn number_range_is_inclusive() {
        let tables = TableStore::new();
        let mut seen = [false; 3];
        for seed in 0..300 {
            let n: usize = run(&tables, "{1-3}", seed).parse().unwrap();
            assert!((1..=3).contains(&n));
            seen[n - 1] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn selected_values_are_re_resolved() {
        let tables = store(&[
            ("level1", &["[level2]"]),
            ("level2", &["[level3]"]),
            ("level3", &["deep"]),
        ]);
        assert_eq!(run(&tables, "[level1]", 1), "deep");
    }

    #[test]
    fn modifiers_apply_after_resolution() {
        let tables = store(&[("outer", &["[inner] blade"]), ("inner", &["BRIGHT"])]);
        assert_eq!(run(&tables, "[outer.capitalize]", 1), "Bright blade");
        assert_eq!(run(&tables, "[inner.lowercase.capitalize]", 1), "Bright");
    }

    #[test]
    fn weight_suffix_is_stripped() {
        let tables = store(&[("gem", &["ruby ^3"])]);
        assert_eq!(run(&tables, "[gem]", 1), "ruby");
    }

    #[test]
    fn quoted_values_are_not_expanded() {
        let tables = store(&[("sign", &["\"[not a table]\""])]);
        assert_eq!(run(&tables, "[sign]", 1), "[not a table]");
    }

    #[test]
    fn cycles_terminate_at_depth_bound() {
        let tables = store(&[("a", &["[b]"]), ("b", &["[a]"])]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = EvaluationSession::new(10, &mut rng);
        let out = Evaluator::new(&tables).evaluate(&parser::parse("[a]"), &mut session);
        assert!(out == "[a]" || out == "[b]", "unexpected {:?}", out);
        assert_eq!(session.depth(), 10);
    }

    #[test]
    fn plain_values_do_not_consume_depth() {
        let tables = store(&[("word", &["plain"])]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = EvaluationSession::new(2, &mut rng);
        let out = Evaluator::new(&tables).evaluate(&parser::parse("[word*20]"), &mut session);
        assert_eq!(out.split(", ").count(), 20);
        assert_eq!(session.depth(), 0);
    }

    #[test]
    fn depth_budget_is_shared_across_repetitions() {
        let tables = store(&[
            ("npc", &["[first] [last]"]),
            ("first", &["Ann"]),
            ("last", &["Bo"]),
        ]);
        let out = run(&tables, "[npc*12]", 1);
        let draws: Vec<&str> = out.split(", ").collect();
        assert_eq!(draws.len(), 12);
        assert!(draws[..10].iter().all(|d| *d == "Ann Bo"), "{:?}", draws);
        assert_eq!(draws[10..], ["[first] [last]", "[first] [last]"]);
    }

    #[test]
    fn repetition_is_capped() {
        let tables = store(&[("coin", &["heads"])]);
        let out = run(&tables, "[coin*4000000000]", 1);
        assert_eq!(out.split(", ").count(), parser::MAX_REPETITION as usize);

        let forced = Node::TableRef(TableRef {
            repetition: Repetition::Fixed(u32::MAX),
            ..TableRef::new("coin")
        });
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = EvaluationSession::new(10, &mut rng);
        let out = Evaluator::new(&tables).evaluate(&forced, &mut session);
        assert_eq!(out.split(", ").count(), parser::MAX_REPETITION as usize);
    }

    #[test]
    fn article_placeholder_survives_evaluation() {
        let tables = TableStore::new();
        assert_eq!(run(&tables, "{a} owl", 1), "{a} owl");
    }

    #[test]
    fn markov_modifier_generates_from_candidates() {
        let tables = store(&[(
            "names",
            &["Aldric", "Aldwin", "Alden", "Baldric", "Cedric", "Edric", "Godric"],
        )]);
        let out = run(&tables, "[names.markov]", 5);
        assert!(!out.is_empty());
        assert!(out.chars().next().unwrap().is_uppercase());
        assert!(!out.starts_with('['), "markov should not hit a sentinel: {}", out);
    }

    #[test]
    fn strip_literal_quotes_requires_matching_pair() {
        assert_eq!(strip_literal_quotes("\"abc\""), Some("abc"));
        assert_eq!(strip_literal_quotes("'abc'"), Some("abc"));
        assert_eq!(strip_literal_quotes("\"\""), Some(""));
        assert_eq!(strip_literal_quotes("\"abc'"), None);
        assert_eq!(strip_literal_quotes("\""), None);
        assert_eq!(strip_literal_quotes("abc"), None);
    }
}
