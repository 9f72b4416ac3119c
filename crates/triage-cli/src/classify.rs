//! # Classify — One Case Through the Fused Pipeline
//!
//! ```bash
//! triage classify --spo2 88 --sbp 120
//! triage classify --temp 39.4 --dyspnea no --altered-consciousness no --model nb.json
//! triage classify --fact chest_pain=yes --fact dyspnea=yes --json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use triage_core::{FactSet, Vitals};

use crate::case::{CaseInput, OutcomeReport};
use crate::config::TriageConfig;

/// Symptom answer on the command line. Omitting the flag means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Answer {
    /// Symptom present.
    Yes,
    /// Symptom absent.
    No,
}

impl From<Answer> for bool {
    fn from(answer: Answer) -> bool {
        matches!(answer, Answer::Yes)
    }
}

/// Arguments for `triage classify`.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Oxygen saturation, percent.
    #[arg(long)]
    pub spo2: Option<f64>,

    /// Systolic blood pressure, mmHg.
    #[arg(long)]
    pub sbp: Option<f64>,

    /// Respiratory rate, breaths per minute.
    #[arg(long)]
    pub rr: Option<f64>,

    /// Body temperature, °C.
    #[arg(long)]
    pub temp: Option<f64>,

    /// Chest pain.
    #[arg(long, value_enum)]
    pub chest_pain: Option<Answer>,

    /// Shortness of breath.
    #[arg(long, value_enum)]
    pub dyspnea: Option<Answer>,

    /// Altered level of consciousness.
    #[arg(long, value_enum)]
    pub altered_consciousness: Option<Answer>,

    /// High-energy or major trauma.
    #[arg(long, value_enum)]
    pub major_trauma: Option<Answer>,

    /// Uncontrolled external bleeding.
    #[arg(long, value_enum)]
    pub massive_bleeding: Option<Answer>,

    /// Explicit `feature=category` fact. Repeatable; wins over vitals.
    #[arg(long = "fact", value_name = "FEATURE=CATEGORY")]
    pub facts: Vec<String>,

    /// Trained model file, overriding the configured one.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Print the full outcome as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ClassifyArgs {
    /// Assemble the case. Explicit facts are parsed strictly.
    pub fn to_case(&self) -> Result<CaseInput> {
        let vitals = Vitals {
            spo2: self.spo2,
            sbp: self.sbp,
            rr: self.rr,
            temp: self.temp,
            chest_pain: self.chest_pain.map(bool::from),
            dyspnea: self.dyspnea.map(bool::from),
            altered_consciousness: self.altered_consciousness.map(bool::from),
            major_trauma: self.major_trauma.map(bool::from),
            massive_bleeding: self.massive_bleeding.map(bool::from),
        };
        let mut facts = FactSet::new();
        for assignment in &self.facts {
            facts
                .apply_assignment(assignment)
                .with_context(|| format!("invalid --fact {assignment:?}"))?;
        }
        Ok(CaseInput {
            name: None,
            vitals,
            facts,
        })
    }
}

/// Execute `triage classify`.
pub fn run_classify(args: &ClassifyArgs, config: &TriageConfig) -> Result<u8> {
    let case = args.to_case()?;
    let facts = case.to_facts(&config.normalizer());
    let fuser = config.fuser(args.model.as_deref())?;

    let outcome = fuser.classify(&facts).context("classification failed")?;
    tracing::info!(severity = %outcome.severity, source = %outcome.source, "case classified");

    if args.json {
        let text = serde_json::to_string_pretty(&outcome).context("failed to serialize outcome")?;
        println!("{text}");
    } else {
        print!(
            "{}",
            OutcomeReport {
                outcome: &outcome,
                facts: &facts,
            }
        );
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::{Category, Feature};

    fn args() -> ClassifyArgs {
        ClassifyArgs {
            spo2: None,
            sbp: None,
            rr: None,
            temp: None,
            chest_pain: None,
            dyspnea: None,
            altered_consciousness: None,
            major_trauma: None,
            massive_bleeding: None,
            facts: Vec::new(),
            model: None,
            json: false,
        }
    }

    #[test]
    fn test_to_case_maps_flags() {
        let a = ClassifyArgs {
            spo2: Some(88.0),
            dyspnea: Some(Answer::No),
            facts: vec!["chest_pain=yes".to_string()],
            ..args()
        };
        let case = a.to_case().unwrap();
        assert_eq!(case.vitals.spo2, Some(88.0));
        assert_eq!(case.vitals.dyspnea, Some(false));
        assert_eq!(case.facts.get(Feature::ChestPain), Category::Yes);
    }

    #[test]
    fn test_bad_fact_rejected() {
        let a = ClassifyArgs {
            facts: vec!["spo2=purple".to_string()],
            ..args()
        };
        assert!(a.to_case().is_err());
    }

    #[test]
    fn test_rule_override_without_model() {
        let a = ClassifyArgs {
            spo2: Some(85.0),
            ..args()
        };
        assert_eq!(run_classify(&a, &TriageConfig::default()).unwrap(), 0);
    }

    #[test]
    fn test_no_model_and_no_override_fails() {
        let a = ClassifyArgs {
            temp: Some(37.0),
            ..args()
        };
        assert!(run_classify(&a, &TriageConfig::default()).is_err());
    }
}
