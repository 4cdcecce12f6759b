/// Preview — interactive generation shell for testing tables and templates.
///
/// Usage: preview --tables <path> [--config <file.ron>] [--seed <text>] [--max-depth <n>] [--debug]
///
/// Commands:
///   gen <template>          — generate once
///   bulk <n> <template>     — generate n times with variety stats
///   tokens <template>       — list table references
///   check <template>        — validate without generating
///   raw <path>              — show a stored value
///   pick <path>             — one weighted pick, unevaluated
///   seed <text>             — re-seed the engine
///   help                    — list commands
///   quit                    — exit
///
/// Any other input is treated as a template.

use sigil_engine::schema::table::TableValue;
use sigil_engine::SigilEngine;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut tables_path = None;
    let mut config_path = None;
    let mut seed = None;
    let mut max_depth = None;
    let mut debug = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tables" if i + 1 < args.len() => {
                i += 1;
                tables_path = Some(args[i].clone());
            }
            "--config" if i + 1 < args.len() => {
                i += 1;
                config_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = Some(args[i].clone());
            }
            "--max-depth" if i + 1 < args.len() => {
                i += 1;
                max_depth = match args[i].parse::<usize>() {
                    Ok(n) => Some(n),
                    Err(_) => {
                        eprintln!("Invalid --max-depth: {}", args[i]);
                        std::process::exit(1);
                    }
                };
            }
            "--debug" => debug = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
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
            .with_writer(io::stderr)
            .init();
    }

    let mut builder = SigilEngine::builder();
    if let Some(ref path) = config_path {
        builder = builder.config_path(path);
    }
    if let Some(ref path) = tables_path {
        builder = builder.tables_path(path);
    }
    if let Some(ref seed) = seed {
        builder = builder.seed(seed);
    }
    if let Some(depth) = max_depth {
        builder = builder.max_depth(depth);
    }
    if debug {
        builder = builder.debug(true);
    }

    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loaded {} top-level tables", engine.tables().len());
    match engine.config().seed {
        Some(ref seed) => println!("Seed: {}", seed),
        None => println!("Seed: (random)"),
    }
    println!("Max depth: {}", engine.config().max_depth);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
            None => (line.to_lowercase(), ""),
        };

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => print_help(),
            "gen" => {
                if rest.is_empty() {
                    println!("Usage: gen <template>");
                    continue;
                }
                println!("{}", engine.generate(rest));
            }
            "bulk" => {
                let Some((count, template)) = rest.split_once(char::is_whitespace) else {
                    println!("Usage: bulk <n> <template>");
                    continue;
                };
                let count: usize = match count.parse() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        println!("Invalid count: {}", count);
                        continue;
                    }
                };
                let outputs = engine.generate_many(template.trim(), count);
                for (n, output) in outputs.iter().enumerate() {
                    println!("{:>4}. {}", n + 1, output);
                }
                print_variety(&outputs);
            }
            "tokens" => {
                let tokens = engine.parse_tokens(rest);
                if tokens.is_empty() {
                    println!("No table references.");
                }
                for token in tokens {
                    let modifiers: Vec<&str> = token.modifiers.iter().map(|m| m.name()).collect();
                    println!(
                        "  {:?} at {}..{}  path={} modifiers={:?} optional={} \
                         exclusions={:?} repetition={:?}",
                        token.raw,
                        token.span.start,
                        token.span.end,
                        token.path,
                        modifiers,
                        token.optional,
                        token.exclusions,
                        token.repetition
                    );
                }
            }
            "check" => {
                let report = engine.validate_template(rest);
                if report.valid {
                    println!("Template is valid.");
                }
                for error in report.errors {
                    println!("ERROR: {}", error);
                }
            }
            "raw" => match engine.resolve_raw(rest) {
                Some(value) => print_value(value, 1),
                None => println!("No table at '{}'", rest),
            },
            "pick" => match engine.resolve_selected(rest) {
                Some(value) => println!("{}", value),
                None => println!("No list at '{}'", rest),
            },
            "seed" => {
                if rest.is_empty() {
                    match engine.config().seed {
                        Some(ref seed) => println!("Current seed: {}", seed),
                        None => println!("Current seed: (random)"),
                    }
                    continue;
                }
                engine.reseed(rest);
                println!("Seed set to {}", rest);
            }
            _ => println!("{}", engine.generate(line)),
        }
    }
}

fn print_value(value: &TableValue, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        TableValue::Scalar(text) => println!("{}{}", pad, text),
        TableValue::List(items) => {
            for item in items {
                println!("{}- {}", pad, item);
            }
        }
        TableValue::Map(map) => {
            for (key, child) in map {
                println!("{}{}:", pad, key);
                print_value(child, indent + 1);
            }
        }
    }
}

fn print_variety(outputs: &[String]) {
    let unique: HashSet<&String> = outputs.iter().collect();
    let total_len: usize = outputs.iter().map(|o| o.chars().count()).sum();
    println!("\n--- Variety ---");
    println!(
        "  {} unique of {} ({:.0}%)",
        unique.len(),
        outputs.len(),
        unique.len() as f64 * 100.0 / outputs.len() as f64
    );
    println!(
        "  average length: {:.1} chars",
        total_len as f64 / outputs.len() as f64
    );
}

fn print_usage() {
    println!(
        "Usage: preview --tables <path> [--config <file.ron>] [--seed <text>] \
         [--max-depth <n>] [--debug]"
    );
}

fn print_help() {
    println!("Commands:");
    println!("  gen <template>        generate once");
    println!("  bulk <n> <template>   generate n times with variety stats");
    println!("  tokens <template>     list table references");
    println!("  check <template>      validate without generating");
    println!("  raw <path>            show a stored value");
    println!("  pick <path>           one weighted pick, unevaluated");
    println!("  seed <text>           re-seed the engine");
    println!("  help                  list commands");
    println!("  quit                  exit");
    println!("Any other input is treated as a template.");
}
