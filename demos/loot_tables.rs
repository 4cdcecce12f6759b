/// Loot Tables demo — rolls treasure hoards and tavern scenes from the
/// bundled YAML tables.
///
/// Shows weighted picks, repetition, exclusions, optional references,
/// OR groups, number ranges, articles, Markov names and literal values.
///
/// Run with: cargo run --example loot_tables

use sigil_engine::SigilEngine;

fn main() {
    let mut engine = SigilEngine::builder()
        .seed("dragon-hoard")
        .tables_path("demos/data")
        .build()
        .expect("Failed to build engine");

    println!("=== Treasure Hoards ===\n");
    for (i, hoard) in engine.generate_many("[loot.hoard]", 6).iter().enumerate() {
        println!("  Hoard {}: {}", i + 1, hoard);
    }

    println!("\n=== Tavern Scenes ===\n");
    for _ in 0..4 {
        println!("  {}", engine.generate("[tavern.scene]"));
        println!();
    }

    println!("=== Wandering Strangers ===\n");
    for _ in 0..5 {
        let template =
            "[npc.first_name.markov] the [occupation.capitalize], carrying {a} [loot.weapon!mace]";
        println!("  {}", engine.generate(template));
    }

    println!("\n=== Inspection ===\n");
    let template = "{a} [loot.material.capitalize] [loot.weapon*{1-2}!knife?]";
    for token in engine.parse_tokens(template) {
        println!(
            "  {} -> path '{}', modifiers {:?}, span {:?}",
            token.raw, token.path, token.modifiers, token.span
        );
    }
    let report = engine.validate_template("[loot.gem*] and {[loot.coin]|}");
    println!("  valid: {}", report.valid);
    for error in &report.errors {
        println!("    - {}", error);
    }
    if let Some(pick) = engine.resolve_selected("loot.material") {
        println!("  one unevaluated material pick: {}", pick);
    }
    println!("  cursed (literal): {}", engine.generate("[loot.cursed]"));
}
