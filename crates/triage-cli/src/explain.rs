//! # Explain — Readable Rule Trails
//!
//! Renders explanation lines either for rule ids given directly or for the
//! rules that fire on a set of facts.
//!
//! ```bash
//! triage explain CRIT_SPO2 MIN_CHEST_PAIN_DYSPNEA
//! triage explain --fact chest_pain=yes --fact dyspnea=yes
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use triage_core::FactSet;
use triage_rules::{render_explanation, RuleEngine, RuleId};

use crate::config::TriageConfig;
use crate::lint::resolve_rules;

/// Arguments for `triage explain`.
#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Rule ids to explain, in trail order.
    #[arg(conflicts_with = "facts")]
    pub ids: Vec<String>,

    /// Evaluate these `feature=category` facts and explain what fires.
    #[arg(long = "fact", value_name = "FEATURE=CATEGORY")]
    pub facts: Vec<String>,

    /// Rule set file. Defaults to the configured set.
    #[arg(long)]
    pub rules: Option<PathBuf>,
}

/// Execute `triage explain`.
pub fn run_explain(args: &ExplainArgs, config: &TriageConfig) -> Result<u8> {
    let set = resolve_rules(args.rules.as_ref(), config)?;

    if args.ids.is_empty() && args.facts.is_empty() {
        bail!("nothing to explain: pass rule ids or --fact assignments");
    }

    let ids: Vec<RuleId> = if args.ids.is_empty() {
        let mut facts = FactSet::new();
        for assignment in &args.facts {
            facts
                .apply_assignment(assignment)
                .with_context(|| format!("invalid --fact {assignment:?}"))?;
        }
        let evaluation = RuleEngine::new(Arc::new(set.clone())).evaluate(&facts);
        if let Some(floor) = evaluation.floor {
            println!("floor: >= {floor}");
        }
        if let Some(hard) = evaluation.hard_severity {
            println!("hard assignment: {hard}");
        }
        evaluation.fired
    } else {
        args.ids.iter().map(RuleId::new).collect()
    };

    let lines = set.explain(&ids);
    println!("{}", render_explanation(&lines));

    let missing: Vec<&RuleId> = ids
        .iter()
        .filter(|id| set.get(id.as_str()).is_none())
        .collect();
    for id in &missing {
        tracing::warn!(rule_id = %id, "no such rule");
    }
    Ok(if missing.is_empty() { 0 } else { 1 })
}
