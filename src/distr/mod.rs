use std::fmt::{self, Debug, Display};
use rand::Rng;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::sample::{Sample, SampleError};

pub mod binomial;

pub use binomial::*;

pub mod poisson;

pub use poisson::*;

/// Closed interval of admissible values for a scalar parameter. The upper
/// limit might be infinite (e.g. the rate of a Poisson), in which case only
/// finite values are admissible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub lower : f64,
    pub upper : f64
}

impl Domain {

    pub const PROBABILITY : Domain = Domain { lower : 0.0, upper : 1.0 };

    pub const RATE : Domain = Domain { lower : 0.0, upper : f64::INFINITY };

    pub fn contains(&self, theta : f64) -> bool {
        theta.is_finite() && theta >= self.lower && theta <= self.upper
    }

    /// Verifies the closed interval [lower, upper] is inside this domain.
    pub fn covers(&self, lower : f64, upper : f64) -> bool {
        self.contains(lower) && self.contains(upper)
    }

}

impl Display for Domain {

    fn fmt(&self, f : &mut fmt::Formatter) -> fmt::Result {
        if self.upper.is_infinite() {
            write!(f, "[{}, inf)", self.lower)
        } else {
            write!(f, "[{}, {}]", self.lower, self.upper)
        }
    }

}

#[derive(Debug, Error)]
pub enum DistrError {

    #[error("Informed parameter {name} = {value} outside distribution domain {domain}")]
    ParameterDomain { name : &'static str, value : f64, domain : Domain },

    #[error("Sample value {value} outside domain for {distribution} ({reason})")]
    SampleDomain { distribution : &'static str, value : u32, reason : &'static str },

    #[error("Invalid number of trials: {0} (must be at least one)")]
    InvalidTrials(u32),

    #[error(transparent)]
    Sample(#[from] SampleError)

}

/// Trait shared by the one-parameter discrete distributions used as likelihoods for
/// independent observations. Implementors are evaluated with respect to a candidate
/// parameter value theta (the parameter on the canonical scale, i.e. the same scale as
/// the maximum likelihood estimate) and a sample, which holds the data fixed.
///
/// Every evaluation verifies the candidate lies in the distribution domain and that
/// each observation belongs to the distribution support. Values at the domain boundary are
/// admissible, and evaluate to a zero likelihood (or negative infinite log-likelihood)
/// wherever the probability mass vanishes.
pub trait Likelihood
    where Self : Debug
{

    /// Short identifier of the distribution family.
    fn name(&self) -> &'static str;

    /// Name of the scalar parameter, as printed in reports.
    fn parameter(&self) -> &'static str;

    fn domain(&self) -> Domain;

    /// Fails if the informed outcome does not belong to the support of the distribution.
    fn check_observation(&self, y : u32) -> Result<(), DistrError>;

    /// Log-probability of the single outcome y, assuming theta was already verified.
    fn unchecked_log_prob(&self, theta : f64, y : u32) -> f64;

    /// Closed-form maximum likelihood estimate.
    fn mle(&self, sample : &Sample) -> Result<f64, DistrError>;

    /// Bounded interval over which a numerical search for the maximum likelihood estimate
    /// can be carried, and that is guaranteed to contain it.
    fn search_interval(&self, sample : &Sample) -> (f64, f64);

    /// Transforms a canonical parameter into the natural parameter of the
    /// exponential-family representation.
    fn link(&self, theta : f64) -> f64;

    /// Transforms a natural parameter back to the canonical scale (the exact inverse of link).
    fn link_inverse(&self, eta : f64) -> f64;

    /// Draws n independent outcomes with the informed parameter value.
    fn simulate<R>(&self, theta : f64, n : usize, rng : &mut R) -> Result<Sample, DistrError>
    where
        R : Rng + ?Sized,
        Self : Sized;

    fn check_parameter(&self, theta : f64) -> Result<(), DistrError> {
        let domain = self.domain();
        if domain.contains(theta) {
            Ok(())
        } else {
            Err(DistrError::ParameterDomain { name : self.parameter(), value : theta, domain })
        }
    }

    /// Evaluates the log-probability of the outcome y with respect to theta.
    fn log_prob(&self, theta : f64, y : u32) -> Result<f64, DistrError> {
        self.check_parameter(theta)?;
        self.check_observation(y)?;
        Ok(self.unchecked_log_prob(theta, y))
    }

    /// Sum of the per-observation log-probabilities. Preferred over the likelihood
    /// for larger samples, since the product of many probabilities underflows quickly.
    fn log_likelihood(&self, theta : f64, sample : &Sample) -> Result<f64, DistrError> {
        self.check_parameter(theta)?;
        let mut lp = 0.0;
        for y in sample.iter() {
            self.check_observation(y)?;
            lp += self.unchecked_log_prob(theta, y);
        }
        Ok(lp)
    }

    /// Joint probability of the sample, as the product of the individual probabilities.
    fn likelihood(&self, theta : f64, sample : &Sample) -> Result<f64, DistrError> {
        self.check_parameter(theta)?;
        let mut p = 1.0;
        for y in sample.iter() {
            self.check_observation(y)?;
            p *= self.unchecked_log_prob(theta, y).exp();
        }
        Ok(p)
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn domains() {
        assert!(Domain::PROBABILITY.contains(0.0));
        assert!(Domain::PROBABILITY.contains(1.0));
        assert!(!Domain::PROBABILITY.contains(1.0 + 1E-12));
        assert!(!Domain::PROBABILITY.contains(f64::NAN));
        assert!(Domain::RATE.contains(1E6));
        assert!(!Domain::RATE.contains(f64::INFINITY));
        assert!(!Domain::RATE.contains(-0.1));
        assert!(Domain::RATE.covers(0.0, 7.0));
        assert_eq!(format!("{}", Domain::RATE), "[0, inf)");
        assert_eq!(format!("{}", Domain::PROBABILITY), "[0, 1]");
    }

}
