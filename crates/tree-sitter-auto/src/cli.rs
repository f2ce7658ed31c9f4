//! `auto-probe`: check that an Auto Lang grammar descriptor loads.
//!
//! Exits 0 when the grammar loads, 1 with the diagnostic when it does not, and
//! 2 when the arguments or the input file cannot be read.

use facet::Facet;
use std::error::Error;
use std::process::ExitCode;
use tree_sitter_auto::{probe_json, ABI_VERSION, GRAMMAR_JSON};

/// Check that an Auto Lang grammar descriptor loads.
#[derive(Facet, Debug)]
struct Args {
    /// Path to a `grammar.json` to probe instead of the bundled descriptor.
    #[facet(named, short = 'g', default)]
    grammar: Option<String>,

    /// ABI version the descriptor was generated for.
    #[facet(named, default)]
    abi: Option<u32>,

    /// Log each loading step.
    #[facet(named, short = 'v', default)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let args: Args = match facet_args::from_std_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };
    init_tracing(args.verbose);

    let json = match &args.grammar {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("cannot read {path}: {e}");
                return ExitCode::from(2);
            }
        },
        None => GRAMMAR_JSON.to_string(),
    };
    let abi_version = args.abi.unwrap_or(ABI_VERSION);

    match probe_json(&json, abi_version) {
        Ok(language) => {
            println!(
                "{}: {} node kinds, {} fields (ABI {})",
                language.name(),
                language.node_kind_count(),
                language.field_count(),
                language.abi_version()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            let mut cause = err.source();
            while let Some(e) = cause {
                eprintln!("  caused by: {e}");
                cause = e.source();
            }
            ExitCode::FAILURE
        }
    }
}
