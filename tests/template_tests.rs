/// Template language integration tests — generation behavior through the
/// public engine API.

use sigil_engine::core::loader::load_tables_str;
use sigil_engine::SigilEngine;

fn build_engine(yaml: &str) -> SigilEngine {
    engine_seeded(yaml, "template-tests")
}

fn engine_seeded(yaml: &str, seed: &str) -> SigilEngine {
    SigilEngine::builder()
        .seed(seed)
        .with_tables(load_tables_str(yaml).unwrap())
        .build()
        .unwrap()
}

const XY: &str = "a: [x]\nb: [y]\n";

#[test]
fn and_overrides_optional_operands() {
    let mut engine = build_engine(XY);
    for _ in 0..500 {
        assert_eq!(engine.generate("{[a]&[b]?}"), "xy");
        assert_eq!(engine.generate("{[a?]&[b?]}"), "xy");
    }
}

#[test]
fn or_is_exclusive() {
    let mut engine = build_engine(XY);
    let mut seen = (false, false);
    for _ in 0..500 {
        let out = engine.generate("{[a]|[b]}");
        assert!(out == "x" || out == "y", "unexpected {:?}", out);
        seen.0 |= out == "x";
        seen.1 |= out == "y";
    }
    assert!(seen.0 && seen.1, "both branches should be taken");
}

#[test]
fn and_binds_looser_than_or() {
    let mut engine = build_engine("a: [x]\nb: [y]\nc: [z]\n");
    for _ in 0..200 {
        let out = engine.generate("{[a]|[b]&[c]}");
        assert!(out == "xz" || out == "yz", "unexpected {:?}", out);
    }
}

#[test]
fn groups_nest_inside_expressions() {
    let mut engine = build_engine("a: [x]\nb: [y]\nc: [z]\n");
    for _ in 0..200 {
        let out = engine.generate("{([a]&[b])|[c]}");
        assert!(out == "xy" || out == "z", "unexpected {:?}", out);

        let out = engine.generate("{[a]&{[b]|[c?]}}");
        assert!(out == "xy" || out == "xz" || out == "x", "unexpected {:?}", out);
    }
}

#[test]
fn number_range_bounds() {
    let mut engine = build_engine("");
    for _ in 0..1000 {
        let n: u64 = engine.generate("{3-17}").parse().unwrap();
        assert!((3..=17).contains(&n));
    }
    assert_eq!(engine.generate("{5-5}"), "5");
}

#[test]
fn reversed_number_range_is_normalized() {
    let mut engine = build_engine("");
    for _ in 0..200 {
        let n: u64 = engine.generate("{9-2}").parse().unwrap();
        assert!((2..=9).contains(&n));
    }
}

#[test]
fn exclusion_filtering() {
    let mut engine = build_engine("beast: [wolf, werewolf, bear, boar ^10]\n");
    for _ in 0..500 {
        let out = engine.generate("[beast!wolf]");
        assert!(out == "bear" || out == "boar", "unexpected {:?}", out);
        assert_eq!(engine.generate("[beast!WOLF!b]"), "");
    }
}

#[test]
fn repetition_range_distribution() {
    let mut engine = build_engine("gem: [ruby, opal, jade]\n");
    let mut counts = [0usize; 5];
    for _ in 0..500 {
        let out = engine.generate("[gem*{2-4}]");
        let segments = out.split(", ").count();
        assert!((2..=4).contains(&segments), "{} segments in {:?}", segments, out);
        counts[segments] += 1;
    }
    assert!(counts[2] > 0 && counts[3] > 0 && counts[4] > 0);
    assert_eq!(engine.generate("[gem*3]").split(", ").count(), 3);
}

#[test]
fn operand_repetition_matches_in_bracket_form() {
    let mut engine = build_engine(XY);
    assert_eq!(engine.generate("{[a]*2&[b]}"), "x, xy");
    assert_eq!(engine.generate("{[a]*{2-2}&[b]}"), "x, xy");
    assert_eq!(engine.generate("{[a*{2-2}]&[b]}"), "x, xy");
}

#[test]
fn huge_repetition_counts_are_capped() {
    let mut engine = build_engine(XY);
    let started = std::time::Instant::now();
    let out = engine.generate("[a*4000000000]");
    assert_eq!(out.split(", ").count(), 1000);
    assert_eq!(engine.generate("[ghost*4000000000]"), "");
    assert!(started.elapsed().as_secs() < 5, "took {:?}", started.elapsed());
}

const NPC: &str = "npc: [\"[first] [last]\"]\nfirst: [Ann]\nlast: [Bo]\n";

#[test]
fn depth_budget_spans_the_whole_call() {
    let mut engine = build_engine(NPC);
    let out = engine.generate("[npc*12]");
    let draws: Vec<&str> = out.split(", ").collect();
    assert_eq!(draws.len(), 12);
    assert!(draws[..10].iter().all(|d| *d == "Ann Bo"), "{:?}", draws);
    assert_eq!(draws[10..], ["[first] [last]", "[first] [last]"]);

    // A larger budget resolves every draw
    let mut engine = SigilEngine::builder()
        .max_depth(12)
        .with_tables(load_tables_str(NPC).unwrap())
        .build()
        .unwrap();
    assert_eq!(engine.generate("[npc*12]"), vec!["Ann Bo"; 12].join(", "));
}

#[test]
fn weighted_selection_skew() {
    let mut engine = build_engine("pick: [\"a ^0\", \"b ^100\"]\n");
    let b_count = (0..1000).filter(|_| engine.generate("[pick]") == "b").count();
    assert!(b_count > 990, "b chosen only {} times", b_count);

    let mut engine = build_engine("pick: [\"common ^9\", rare]\n");
    let common = (0..2000)
        .filter(|_| engine.generate("[pick]") == "common")
        .count();
    assert!((1600..=1990).contains(&common), "common chosen {} times", common);
}

#[test]
fn cycle_termination() {
    let mut engine = build_engine("a: [\"[b]\"]\nb: [\"[a]\"]\n");
    for _ in 0..50 {
        let out = engine.generate("[a]");
        assert!(out == "[a]" || out == "[b]", "unexpected {:?}", out);
    }

    let mut engine = build_engine("me: [\"more [me]\"]\n");
    let out = engine.generate("[me]");
    assert_eq!(out, format!("{}[me]", "more ".repeat(11)));
}

#[test]
fn deep_valid_chaining() {
    let mut engine = build_engine(
        "level1: [\"[level2]\"]\nlevel2: [\"[level3]\"]\nlevel3: [deep]\n",
    );
    assert_eq!(engine.generate("[level1]"), "deep");
}

#[test]
fn indefinite_articles() {
    let mut engine = build_engine("fruit: [apple, orange]\nblade: [sword]\n");
    assert!(engine.generate("{a} apple").starts_with("an apple"));
    assert!(engine.generate("{a} sword").starts_with("a sword"));
    let out = engine.generate("{a} [blade] and {a} [fruit.capitalize]");
    assert!(
        out == "a sword and an Apple" || out == "a sword and an Orange",
        "unexpected {:?}",
        out
    );
    for _ in 0..50 {
        let out = engine.generate("{a} [fruit]");
        assert!(out == "an apple" || out == "an orange", "unexpected {:?}", out);
    }
    assert_eq!(engine.generate("I see {a} Elephant"), "I see an Elephant");
}

#[test]
fn modifier_chain_order() {
    let mut engine = build_engine("table: [TEST]\n");
    assert_eq!(engine.generate("[table.lowercase.capitalize]"), "Test");
    assert_eq!(engine.generate("[table.capitalize.lowercase]"), "test");
}

#[test]
fn plural_form_modifier() {
    let mut engine = build_engine("w: [wolf]\nk: [knife]\nf: [fly]\nb: [box]\nc: [cat]\n");
    assert_eq!(engine.generate("[w.pluralForm]"), "wolves");
    assert_eq!(engine.generate("[k.pluralForm]"), "knives");
    assert_eq!(engine.generate("[f.pluralForm]"), "flies");
    assert_eq!(engine.generate("[b.pluralForm]"), "boxes");
    assert_eq!(engine.generate("[c.pluralForm.capitalize]"), "Cats");
}

#[test]
fn quoted_literals_are_untouched() {
    let mut engine = build_engine(XY);
    assert_eq!(engine.generate("\"[a] {1-2} {a}\""), "[a] {1-2} {a}");
    assert_eq!(engine.generate("'{[a]|[b]}'"), "{[a]|[b]}");

    let mut engine = build_engine("sign: [\"'[closed]'\"]\n");
    assert_eq!(engine.generate("The sign reads [sign]."), "The sign reads [closed].");
}

#[test]
fn nested_paths_resolve() {
    let mut engine = build_engine("npc:\n  elf:\n    name: [Lirael]\n");
    assert_eq!(engine.generate("[npc.elf.name]"), "Lirael");
    assert_eq!(engine.generate("[npc.elf]"), "");
    assert_eq!(engine.generate("[npc.dwarf.name]"), "");
}

#[test]
fn missing_tables_are_silent() {
    let mut engine = build_engine("");
    assert_eq!(engine.generate("A [ghost] appears."), "A  appears.");
}

#[test]
fn malformed_syntax_degrades_to_text() {
    let mut engine = build_engine(XY);
    assert_eq!(engine.generate("[a"), "[a");
    assert_eq!(engine.generate("a]"), "a]");
    assert_eq!(engine.generate("{[a]|"), "{x|");
    assert_eq!(engine.generate("[]"), "[]");
    let _ = engine.generate("[weapon.[materials.capitalize]]");
}

#[test]
fn optional_reference_is_sometimes_skipped() {
    let mut engine = build_engine(XY);
    let outputs: Vec<String> = engine.generate_many("<[a?]>", 200);
    assert!(outputs.iter().any(|o| o == "<>"));
    assert!(outputs.iter().any(|o| o == "<x>"));
    assert!(outputs.iter().all(|o| o == "<>" || o == "<x>"));
}

#[test]
fn markov_names_come_from_the_whole_list() {
    let mut engine = build_engine(
        "name: [Aldric, Aldwin, Alden, Baldric, Cedric, Edric, Godric, Harwin, Osric]\n",
    );
    for _ in 0..20 {
        let out = engine.generate("[name.markov]");
        assert!(!out.is_empty());
        assert!(out.chars().next().unwrap().is_uppercase(), "{}", out);
    }
    assert_eq!(engine.generate("[ghost.markov]"), "");
}

#[test]
fn same_seed_same_output() {
    let yaml = "gem: [ruby, opal, jade]\n";
    let template = "[gem*{1-5}] and {1-1000}";
    let mut a = engine_seeded(yaml, "alpha");
    let mut b = engine_seeded(yaml, "alpha");
    assert_eq!(a.generate_many(template, 20), b.generate_many(template, 20));
}
