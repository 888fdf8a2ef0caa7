//! CLI entry point for keepsake
//!
//! This provides the interactive player and sequence validation.

use keepsake::cli::play::Outcome;
use keepsake::config::PlayerConfig;
use keepsake::sequencer::debug::{self, DebugConfig};
use std::path::PathBuf;
use std::process;

/// Positional arguments and options of one command line
struct Args {
    positional: Vec<String>,
    debug: bool,
    config: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args {
        positional: Vec::new(),
        debug: false,
        config: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" => parsed.debug = true,
            "--config" => {
                let path = iter.next().ok_or("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            other if other.starts_with("--") => return Err(format!("Unknown option '{other}'")),
            other => parsed.positional.push(other.to_string()),
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = &args[1];
    if matches!(command.as_str(), "--help" | "-h") {
        print_usage();
        return;
    }

    let parsed = match parse_args(&args[2..]) {
        Ok(parsed) => parsed,
        Err(err) => fail_usage(&err),
    };
    let config = load_config(&parsed).await;

    match command.as_str() {
        "play" => {
            let [file] = parsed.positional.as_slice() else {
                fail_usage("Expected exactly one sequence file");
            };
            report(keepsake::cli::play::run_play(&PathBuf::from(file), &config, parsed.debug).await);
        }
        "visit" => {
            let [intro, main] = parsed.positional.as_slice() else {
                fail_usage("Expected an intro and a main sequence file");
            };
            let result = keepsake::cli::play::run_visit(
                &PathBuf::from(intro),
                &PathBuf::from(main),
                &config,
                parsed.debug,
            )
            .await;
            report(result);
        }
        "check" => {
            let [file] = parsed.positional.as_slice() else {
                fail_usage("Expected exactly one sequence file");
            };
            match keepsake::cli::check::run_check(&PathBuf::from(file), &config).await {
                Ok(true) => {}
                Ok(false) => process::exit(1),
                Err(err) => {
                    eprintln!("Error: {err:#}");
                    process::exit(1);
                }
            }
        }
        _ => fail_usage(&format!("Unknown command '{command}'")),
    }
}

async fn load_config(args: &Args) -> PlayerConfig {
    let mut config = match PlayerConfig::load(args.config.as_deref()).await {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    };

    if args.debug {
        config.debug = DebugConfig {
            enabled: true,
            ..config.debug
        };
    }
    if config.debug.enabled
        && let Err(err) = debug::init(config.debug.clone())
    {
        eprintln!("Warning: debug logging unavailable: {err}");
    }
    config
}

fn report(result: anyhow::Result<Outcome>) {
    if let Err(err) = result {
        eprintln!("Error: Player mode failed");
        eprintln!("Reason: {err:#}");
        process::exit(1);
    }
}

fn fail_usage(message: &str) -> ! {
    eprintln!("Error: {message}");
    eprintln!();
    print_usage();
    process::exit(1);
}

fn print_usage() {
    println!("keepsake - Timed and gated presentation player");
    println!();
    println!("USAGE:");
    println!("    keepsake <command> [options]");
    println!();
    println!("COMMANDS:");
    println!("    play <file>             Play one sequence in the terminal");
    println!("    visit <intro> <main>    Play the intro on a first visit, then the main sequence");
    println!("    check <file>            Validate and lint a sequence");
    println!("    --help, -h              Show this help message");
    println!();
    println!("OPTIONS:");
    println!("    --debug            Log sequencer activity to stderr and show stage state");
    println!("    --config <path>    Player configuration (JSON)");
    println!();
    println!("ENVIRONMENT:");
    println!("    KEEPSAKE_STATE_DIR    Directory for visit flags (default .keepsake)");
    println!("    KEEPSAKE_DEBUG        Enable debug logging");
    println!();
    println!("EXAMPLES:");
    println!("    keepsake play demos/intro.json");
    println!("    keepsake visit demos/intro.json demos/main.json --debug");
}
