/// Template Linter — validates table data and the templates inside it.
///
/// Usage: template_linter <tables_path> [--template <text>]... [--debug]

use sigil_engine::core::loader;
use sigil_engine::core::tokens;
use sigil_engine::core::weighted::strip_weight;
use sigil_engine::schema::ast::Modifier;
use sigil_engine::schema::table::TableStore;
use std::path::Path;
use std::process;

/// Markov output from very short lists is mostly the input echoed back.
const MIN_MARKOV_ENTRIES: usize = 5;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: template_linter <tables_path> [--template <text>]... [--debug]");
        process::exit(0);
    }

    let tables_path = &args[1];
    let mut templates = Vec::new();
    let mut debug = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--template" if i + 1 < args.len() => {
                i += 1;
                templates.push(args[i].clone());
            }
            "--debug" => debug = true,
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "sigil_engine=debug".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let path = Path::new(tables_path);
    if !path.exists() {
        eprintln!("ERROR: Path '{}' does not exist", tables_path);
        process::exit(1);
    }

    let tables = match loader::load_tables_path(path) {
        Ok(tables) => tables,
        Err(e) => {
            eprintln!("ERROR: Failed to load tables: {}", e);
            process::exit(1);
        }
    };

    let mut list_count = 0;
    tables.for_each_list(|_, _| list_count += 1);
    println!("Loaded {} top-level tables ({} lists)", tables.len(), list_count);

    let (mut errors, mut warnings) = lint_tables(&tables);
    for template in &templates {
        let (e, w) = lint_template(&tables, &format!("Template {:?}", template), template);
        errors.extend(e);
        warnings.extend(w);
    }

    println!("\n=== Template Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_tables(tables: &TableStore) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    tables.for_each_list(|name, items| {
        if items.is_empty() {
            warnings.push(format!("Table '{}' is empty", name));
            return;
        }
        if items.len() < 2 {
            warnings.push(format!(
                "Table '{}' has only {} entry (no variety)",
                name,
                items.len()
            ));
        }

        for (index, item) in items.iter().enumerate() {
            let label = format!("Table '{}' entry {}", name, index);
            let (e, w) = lint_template(tables, &label, strip_weight(item));
            errors.extend(e);
            warnings.extend(w);
        }

        // A table whose every entry refers back to itself can never bottom out.
        let all_self_ref = items.iter().all(|item| {
            tokens::parse_tokens(strip_weight(item))
                .iter()
                .any(|token| token.path == name && !token.optional)
        });
        if all_self_ref {
            errors.push(format!(
                "Table '{}' has no non-recursive entry (always hits the depth limit)",
                name
            ));
        }
    });

    (errors, warnings)
}

fn lint_template(tables: &TableStore, label: &str, template: &str) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if template.starts_with(['"', '\'']) {
        return (errors, warnings);
    }

    for issue in tokens::find_issues(template) {
        errors.push(format!("{}: {}", label, issue));
    }

    for token in tokens::parse_tokens(template) {
        let Some(items) = tables.resolve(&token.path) else {
            errors.push(format!(
                "{} references non-existent table '{}'",
                label, token.path
            ));
            continue;
        };
        if token.modifiers.contains(&Modifier::Markov) && items.len() < MIN_MARKOV_ENTRIES {
            warnings.push(format!(
                "{} applies markov to '{}', which has only {} entries",
                label,
                token.path,
                items.len()
            ));
        }
    }

    (errors, warnings)
}
