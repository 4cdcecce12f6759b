/// Name Sampler — trains a character model on one table and prints samples.
///
/// Usage: name_sampler --tables <path> --table <dotted.path> [--count <n>]
///        [--order <1-4>] [--min <n>] [--max <n>] [--seed <text>]

use rand::rngs::StdRng;
use rand::SeedableRng;
use sigil_engine::core::loader;
use sigil_engine::core::markov::{try_generate_markov, MarkovOptions, NameModel};
use sigil_engine::core::weighted::strip_weight;
use sigil_engine::schema::config::seed_from_str;
use std::env;
use std::path::Path;
use std::process;

const USAGE: &str = "Usage: name_sampler --tables <path> --table <dotted.path> [--count <n>] \
                     [--order <1-4>] [--min <n>] [--max <n>] [--seed <text>]";

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut tables_path = None;
    let mut table = None;
    let mut count = 10usize;
    let mut seed = None;
    let mut options = MarkovOptions::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tables" if i + 1 < args.len() => {
                i += 1;
                tables_path = Some(args[i].clone());
            }
            "--table" if i + 1 < args.len() => {
                i += 1;
                table = Some(args[i].clone());
            }
            "--count" if i + 1 < args.len() => {
                i += 1;
                count = parse_number(&args[i], "--count");
            }
            "--order" if i + 1 < args.len() => {
                i += 1;
                options.order = parse_number(&args[i], "--order");
            }
            "--min" if i + 1 < args.len() => {
                i += 1;
                options.min_length = parse_number(&args[i], "--min");
            }
            "--max" if i + 1 < args.len() => {
                i += 1;
                options.max_length = parse_number(&args[i], "--max");
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = Some(args[i].clone());
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    let tables_path = tables_path.unwrap_or_else(|| {
        eprintln!("Error: --tables is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let table = table.unwrap_or_else(|| {
        eprintln!("Error: --table is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    if !(1..=4).contains(&options.order) {
        eprintln!("Error: --order must be between 1 and 4");
        process::exit(1);
    }
    if options.min_length > options.max_length {
        eprintln!("Error: --min must not exceed --max");
        process::exit(1);
    }

    let tables = loader::load_tables_path(Path::new(&tables_path)).unwrap_or_else(|e| {
        eprintln!("Error loading tables from '{}': {}", tables_path, e);
        process::exit(1);
    });

    let Some(words) = tables.resolve(&table) else {
        eprintln!("Error: no list table at '{}'", table);
        process::exit(1);
    };

    let cleaned: Vec<&str> = words.iter().map(|w| strip_weight(w).trim()).collect();
    let model = NameModel::train(&cleaned, options.order);
    let transition_count: usize = model.transitions.values().map(|v| v.len()).sum();
    println!(
        "Trained order-{} model on {} words: {} unique prefixes, {} transitions",
        model.order,
        words.len(),
        model.transitions.len(),
        transition_count
    );

    let mut rng = match seed {
        Some(ref seed) => StdRng::seed_from_u64(seed_from_str(seed)),
        None => StdRng::from_entropy(),
    };

    let mut novel = 0;
    for _ in 0..count {
        match try_generate_markov(words, &options, &mut rng) {
            Ok(name) => {
                let known = cleaned.iter().any(|w| w.eq_ignore_ascii_case(&name));
                if !known {
                    novel += 1;
                }
                println!("  {}{}", name, if known { "  (from input)" } else { "" });
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }

    println!("\n{} of {} samples are new words", novel, count);
}

fn parse_number(value: &str, flag: &str) -> usize {
    value.parse().unwrap_or_else(|_| {
        eprintln!("Error: {} expects a number, got '{}'", flag, value);
        process::exit(1);
    })
}
