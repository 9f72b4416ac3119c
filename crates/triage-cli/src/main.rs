//! # triage CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, loads
//! configuration, and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use triage_cli::classify::{run_classify, ClassifyArgs};
use triage_cli::dispatch::{run_dispatch, DispatchArgs};
use triage_cli::explain::{run_explain, ExplainArgs};
use triage_cli::lint::{run_lint, LintArgs};
use triage_cli::train::{run_train, TrainArgs};
use triage_cli::TriageConfig;

/// Emergency triage toolchain.
///
/// Rule-based overrides fused with a cost-sensitive decision over a
/// probabilistic severity estimate, and a severity-ordered patient queue.
#[derive(Parser, Debug)]
#[command(name = "triage", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify one case from vitals, symptoms, and explicit facts.
    Classify(ClassifyArgs),

    /// Report configuration-time findings for a rule set.
    Lint(LintArgs),

    /// Render the explanation trail for rule ids or for a set of facts.
    Explain(ExplainArgs),

    /// Fit the naive Bayes estimator and report holdout metrics.
    Train(TrainArgs),

    /// Classify cases into the priority queue and run a command script.
    Dispatch(DispatchArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("triage CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match TriageConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command {
        Commands::Classify(args) => run_classify(&args, &config),
        Commands::Lint(args) => run_lint(&args, &config),
        Commands::Explain(args) => run_explain(&args, &config),
        Commands::Train(args) => run_train(&args, &config),
        Commands::Dispatch(args) => run_dispatch(&args, &config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_classify_vitals() {
        let cli = Cli::try_parse_from([
            "triage", "classify", "--spo2", "91.5", "--rr", "32", "--dyspnea", "yes",
        ])
        .unwrap();
        if let Commands::Classify(args) = cli.command {
            assert_eq!(args.spo2, Some(91.5));
            assert_eq!(args.rr, Some(32.0));
            assert!(args.sbp.is_none());
            assert!(args.dyspnea.is_some());
            assert!(!args.json);
        } else {
            panic!("expected classify");
        }
    }

    #[test]
    fn cli_parse_classify_repeated_facts() {
        let cli = Cli::try_parse_from([
            "triage",
            "classify",
            "--fact",
            "chest_pain=yes",
            "--fact",
            "dyspnea=yes",
            "--json",
        ])
        .unwrap();
        if let Commands::Classify(args) = cli.command {
            assert_eq!(args.facts, vec!["chest_pain=yes", "dyspnea=yes"]);
            assert!(args.json);
        }
    }

    #[test]
    fn cli_classify_flags_have_help() {
        use clap::CommandFactory;

        let cli = Cli::command();
        let classify = cli.find_subcommand("classify").unwrap();
        for id in [
            "chest_pain",
            "dyspnea",
            "altered_consciousness",
            "major_trauma",
            "massive_bleeding",
        ] {
            let arg = classify.get_arguments().find(|a| a.get_id() == id).unwrap();
            assert!(arg.get_help().is_some(), "--{id} has no help text");
        }
    }

    #[test]
    fn cli_parse_classify_rejects_bad_answer() {
        assert!(Cli::try_parse_from(["triage", "classify", "--dyspnea", "maybe"]).is_err());
    }

    #[test]
    fn cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "triage",
            "lint",
            "-vv",
            "--log-json",
            "--config",
            "triage.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert_eq!(cli.config, Some(PathBuf::from("triage.yaml")));
    }

    #[test]
    fn cli_parse_lint_dump_conflicts_with_deny() {
        assert!(Cli::try_parse_from(["triage", "lint", "--dump", "--deny"]).is_err());
    }

    #[test]
    fn cli_parse_explain_ids() {
        let cli = Cli::try_parse_from(["triage", "explain", "CRIT_SPO2", "CRIT_SBP"]).unwrap();
        if let Commands::Explain(args) = cli.command {
            assert_eq!(args.ids, vec!["CRIT_SPO2", "CRIT_SBP"]);
            assert!(args.facts.is_empty());
        }
    }

    #[test]
    fn cli_parse_train_defaults() {
        let cli = Cli::try_parse_from([
            "triage",
            "train",
            "--dataset",
            "cases.json",
            "--out",
            "model.json",
        ])
        .unwrap();
        if let Commands::Train(args) = cli.command {
            assert_eq!(args.holdout, 0.2);
            assert_eq!(args.seed, 42);
            assert_eq!(args.alpha, 1.0);
            assert!(!args.no_class_weights);
        }
    }

    #[test]
    fn cli_parse_train_requires_dataset() {
        assert!(Cli::try_parse_from(["triage", "train", "--out", "m.json"]).is_err());
    }

    #[test]
    fn cli_parse_dispatch_stdin_script() {
        let cli = Cli::try_parse_from(["triage", "dispatch", "--script", "-"]).unwrap();
        if let Commands::Dispatch(args) = cli.command {
            assert_eq!(args.script, Some(PathBuf::from("-")));
            assert!(args.cases.is_none());
        }
    }
}
