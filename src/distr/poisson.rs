use super::*;
use rand_distr::{self, Distribution};
use crate::calc;

/// The Poisson is the distribution used as the likelihood for countable outcomes
/// (e.g. bacterial colonies per dish). Each realization is parametrized
/// by a rate parameter λ (λ >= 0), whose natural parameter transformation is its logarithm ln(λ).
///
/// # Example
///
/// ```
/// use likely::distr::*;
/// use likely::sample::Sample;
///
/// let colonies = Sample::new(vec![1, 2, 4, 5, 7, 2, 3, 5, 6, 3, 7, 2]).unwrap();
/// let mle = Poisson.mle(&colonies).unwrap();
/// assert!((mle - 47. / 12.).abs() < 1E-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Poisson;

fn poisson_log_prob(y : u32, lambda : f64) -> f64 {
    if y == 0 {
        -lambda
    } else {
        (y as f64) * lambda.ln() - lambda - calc::ln_factorial(y)
    }
}

impl Likelihood for Poisson {

    fn name(&self) -> &'static str {
        "poisson"
    }

    fn parameter(&self) -> &'static str {
        "lambda"
    }

    fn domain(&self) -> Domain {
        Domain::RATE
    }

    // Any count is in the support.
    fn check_observation(&self, _y : u32) -> Result<(), DistrError> {
        Ok(())
    }

    fn unchecked_log_prob(&self, theta : f64, y : u32) -> f64 {
        poisson_log_prob(y, theta)
    }

    fn mle(&self, sample : &Sample) -> Result<f64, DistrError> {
        Ok(sample.mean())
    }

    /// The sample mean never exceeds the largest count, so the search is bounded
    /// by it (or by 1 when every count is zero).
    fn search_interval(&self, sample : &Sample) -> (f64, f64) {
        (0.0, f64::from(sample.max().max(1)))
    }

    fn link(&self, theta : f64) -> f64 {
        theta.ln()
    }

    fn link_inverse(&self, eta : f64) -> f64 {
        eta.exp()
    }

    fn simulate<R>(&self, theta : f64, n : usize, rng : &mut R) -> Result<Sample, DistrError>
    where
        R : Rng + ?Sized
    {
        self.check_parameter(theta)?;
        if theta == 0.0 {
            return Ok(Sample::new(vec![0; n])?);
        }
        let sampler = rand_distr::Poisson::new(theta)
            .map_err(|_| DistrError::ParameterDomain { name : "lambda", value : theta, domain : self.domain() })?;
        let obs : Vec<u32> = (0..n).map(|_| { let y : f64 = sampler.sample(rng); y as u32 }).collect();
        Ok(Sample::new(obs)?)
    }

}
