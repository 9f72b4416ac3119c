//! # Categorical Naive Bayes Estimator
//!
//! A [`PosteriorEstimator`](crate::PosteriorEstimator) over the closed
//! feature categories. Its persisted state is an inspectable, versioned
//! JSON document:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "alpha": 1.0,
//!   "class_weighted": true,
//!   "trained_on": 120,
//!   "priors": { "white": 0.25, "green": 0.25, "yellow": 0.25, "red": 0.25 },
//!   "likelihoods": {
//!     "red": { "spo2": { "severe": 0.61, "moderate": 0.17, "ok": 0.11, "unknown": 0.11 }, ... },
//!     ...
//!   }
//! }
//! ```
//!
//! ## Invariants
//!
//! - Priors cover every level and sum to one. A class absent from the
//!   training data has prior zero and always receives posterior zero.
//! - Every class with a non-zero prior has, for every feature, a
//!   likelihood for each category in that feature's list (including
//!   `unknown`), summing to one.
//! - [`NaiveBayesModel::load`] validates before returning; a model that
//!   fails validation is never used.

mod dataset;
mod evaluate;
mod fit;
mod model;

pub use dataset::{load_dataset, parse_dataset, split_holdout, Sample};
pub use evaluate::{evaluate, ConfusionMatrix};
pub use fit::FitOptions;
pub use model::{LikelihoodTable, NaiveBayesModel, MODEL_SCHEMA_VERSION};
