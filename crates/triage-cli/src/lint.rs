//! # Lint — Rule Set Findings
//!
//! ```bash
//! triage lint                       # the configured or built-in rule set
//! triage lint --rules rules.yaml --deny
//! triage lint --dump > rules.yaml   # export the rule set as YAML
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use triage_rules::RuleSet;

use crate::config::TriageConfig;

/// Arguments for `triage lint`.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Rule set file (YAML, or JSON by extension). Defaults to the configured set.
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Exit with status 2 when any finding is reported.
    #[arg(long)]
    pub deny: bool,

    /// Print findings as JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the rule set as YAML instead of linting it.
    #[arg(long, conflicts_with_all = ["deny", "json"])]
    pub dump: bool,
}

/// Rule set named by `--rules`, else the configured one.
pub(crate) fn resolve_rules(rules: Option<&PathBuf>, config: &TriageConfig) -> Result<RuleSet> {
    match rules {
        Some(path) => RuleSet::load(path)
            .with_context(|| format!("failed to load rule set {}", path.display())),
        None => config.rule_set(),
    }
}

/// Execute `triage lint`.
pub fn run_lint(args: &LintArgs, config: &TriageConfig) -> Result<u8> {
    let set = resolve_rules(args.rules.as_ref(), config)?;

    if args.dump {
        print!("{}", set.to_yaml_string().context("failed to render rule set")?);
        return Ok(0);
    }

    let findings = set.lint();
    if args.json {
        let text =
            serde_json::to_string_pretty(&findings).context("failed to serialize findings")?;
        println!("{text}");
    } else if findings.is_empty() {
        println!("{} rules, no findings", set.len());
    } else {
        for finding in &findings {
            println!("{finding}");
        }
        println!("{} rules, {} findings", set.len(), findings.len());
    }

    if args.deny && !findings.is_empty() {
        return Ok(2);
    }
    Ok(0)
}
