//! # Posterior Estimators
//!
//! The narrow seam between the decision layer and any probabilistic
//! model: facts in, distribution over severity levels out.

use std::sync::Arc;

use triage_core::FactSet;

use crate::error::EstimatorError;
use crate::posterior::Posterior;

/// Produces a posterior distribution from observed facts.
///
/// Implementations must be pure with respect to the facts and safe to
/// share across threads.
pub trait PosteriorEstimator: Send + Sync {
    /// Short name used in logs and error context.
    fn name(&self) -> &str;

    /// Distribution over every severity level for `facts`.
    fn posterior(&self, facts: &FactSet) -> Result<Posterior, EstimatorError>;
}

impl<T: PosteriorEstimator + ?Sized> PosteriorEstimator for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn posterior(&self, facts: &FactSet) -> Result<Posterior, EstimatorError> {
        (**self).posterior(facts)
    }
}
