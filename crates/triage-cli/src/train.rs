//! # Train — Fit and Evaluate the Naive Bayes Estimator
//!
//! Loads a labelled JSON dataset, holds out a seeded fraction, fits on the
//! rest, reports holdout accuracy, per-level recall, and the under-triage
//! count, then writes the model file. Without `--out`, the model goes to
//! the path configured under `model`, where `classify` and `dispatch` load
//! it from.
//!
//! ```bash
//! triage train --dataset data/cases.json --out data/nb_model.json
//! triage train --dataset data/cases.json --out nb.json --holdout 0 --alpha 0.5
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;

use triage_core::SeverityLevel;
use triage_decision::{load_dataset, split_holdout, FitOptions, NaiveBayesModel};

use crate::config::TriageConfig;

/// Arguments for `triage train`.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Labelled dataset (JSON array of `{facts, label}` records).
    #[arg(long)]
    pub dataset: PathBuf,

    /// Where to write the trained model. Defaults to the configured model path.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Fraction of samples held out for evaluation, in [0, 1).
    #[arg(long, default_value_t = 0.2)]
    pub holdout: f64,

    /// Shuffle seed for the holdout split.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Laplace smoothing constant.
    #[arg(long, default_value_t = 1.0)]
    pub alpha: f64,

    /// Fit on raw class frequencies instead of balanced class weights.
    #[arg(long)]
    pub no_class_weights: bool,
}

impl TrainArgs {
    fn fit_options(&self) -> FitOptions {
        FitOptions {
            alpha: self.alpha,
            class_weighted: !self.no_class_weights,
        }
    }
}

/// Execute `triage train`.
pub fn run_train(args: &TrainArgs, config: &TriageConfig) -> Result<u8> {
    let out = args
        .out
        .as_deref()
        .or(config.model.as_deref())
        .ok_or_else(|| anyhow!("no output path: pass --out or set `model` in the config"))?;
    let samples = load_dataset(&args.dataset)
        .with_context(|| format!("failed to load dataset {}", args.dataset.display()))?;
    let (train, holdout) =
        split_holdout(&samples, args.holdout, args.seed).context("invalid holdout split")?;
    println!(
        "dataset: {} samples ({} train, {} holdout)",
        samples.len(),
        train.len(),
        holdout.len()
    );

    let model = NaiveBayesModel::fit(&train, args.fit_options()).context("training failed")?;

    if holdout.is_empty() {
        println!("holdout: empty, skipping evaluation");
    } else {
        let matrix = model.evaluate(&holdout).context("holdout evaluation failed")?;
        if let Some(accuracy) = matrix.accuracy() {
            println!("accuracy: {:.3} ({}/{})", accuracy, matrix.correct(), matrix.total());
        }
        for level in SeverityLevel::descending() {
            match matrix.recall(level) {
                Some(r) => println!("recall[{level}]: {r:.3}"),
                None => println!("recall[{level}]: n/a"),
            }
        }
        println!("under-triaged: {}", matrix.under_triaged());
        print!("{matrix}");
    }

    model
        .save(out)
        .with_context(|| format!("failed to save model {}", out.display()))?;
    tracing::info!(path = %out.display(), trained_on = model.trained_on(), "model saved");
    println!("model written to {}", out.display());
    Ok(0)
}
