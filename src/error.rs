//! Error types shared by the extractor, the graph builder and the threshold sweep
//!

use thiserror::Error;

/// which external collaborator failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalService {
    Sampler,
    MatchingOracle,
}

impl std::fmt::Display for ExternalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sampler => write!(f, "shot sampler"),
            Self::MatchingOracle => write!(f, "matching oracle"),
        }
    }
}

/// the (distance, probability) batch an error belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchId {
    pub distance: usize,
    pub probability: f64,
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d = {}, p = {}", self.distance, self.probability)
    }
}

#[derive(Error, Debug)]
pub enum ThresholdError {
    #[error("measurement record has {actual} bits but distance {distance} expects {expected} (shot {shot:?})")]
    Shape {
        distance: usize,
        expected: usize,
        actual: usize,
        shot: Option<usize>,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("zero-run batch requested at d = {distance}, p = {probability}")]
    InsufficientSamples { distance: usize, probability: f64 },

    #[error("{service} failed ({}): {cause}", describe_batch(.batch))]
    ExternalService {
        service: ExternalService,
        batch: Option<BatchId>,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl ThresholdError {
    pub fn external(service: ExternalService, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::ExternalService {
            service,
            batch: None,
            cause: cause.into(),
        }
    }

    /// attach the offending batch to an external failure; other kinds already carry their context
    pub fn in_batch(self, distance: usize, probability: f64) -> Self {
        match self {
            Self::ExternalService {
                service,
                batch: None,
                cause,
            } => Self::ExternalService {
                service,
                batch: Some(BatchId { distance, probability }),
                cause,
            },
            other => other,
        }
    }
}

fn describe_batch(batch: &Option<BatchId>) -> String {
    match batch {
        Some(batch) => batch.to_string(),
        None => "no batch".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ThresholdError>;

/// reject probabilities outside [0, 1], including NaN
pub fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0. ..=1.).contains(&value) {
        Ok(())
    } else {
        Err(ThresholdError::Configuration(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_batch_attached_to_external_only() {
        // cargo test error_batch_attached_to_external_only -- --nocapture
        let error = ThresholdError::external(ExternalService::Sampler, "disk on fire").in_batch(5, 0.1);
        match &error {
            ThresholdError::ExternalService { batch, .. } => {
                assert_eq!(*batch, Some(BatchId { distance: 5, probability: 0.1 }))
            }
            _ => unreachable!(),
        }
        println!("{error}");
        let error = ThresholdError::InsufficientSamples {
            distance: 3,
            probability: 0.2,
        }
        .in_batch(7, 0.3);
        assert!(matches!(
            error,
            ThresholdError::InsufficientSamples { distance: 3, .. }
        ));
    }

    #[test]
    fn error_probability_domain() {
        // cargo test error_probability_domain -- --nocapture
        assert!(check_probability("p", 0.).is_ok());
        assert!(check_probability("p", 1.).is_ok());
        assert!(check_probability("p", -0.01).is_err());
        assert!(check_probability("p", 1.01).is_err());
        assert!(check_probability("p", f64::NAN).is_err());
    }
}
