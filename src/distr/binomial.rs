use super::*;
use rand_distr::{self, Distribution};
use crate::calc::{self, Variate};

/// The Binomial is the distribution of the number of successes out of a fixed number of
/// independent trials sharing a success probability p (0 <= p <= 1). A Binomial with a
/// single trial is a Bernoulli, the distribution of an individual coin toss. The natural
/// parameter is the log-odds ln(p / (1-p)).
///
/// # Example
///
/// ```
/// use likely::distr::*;
/// use likely::sample::Sample;
///
/// let tosses = Sample::new(vec![0, 1, 0, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 0, 1]).unwrap();
/// let bern = Binomial::bernoulli();
/// let mle = bern.mle(&tosses).unwrap();
/// assert!((mle - 0.4).abs() < 1E-12);
/// assert!(bern.log_likelihood(mle, &tosses).unwrap() > bern.log_likelihood(0.5, &tosses).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binomial {
    trials : u32
}

impl Binomial {

    pub fn new(trials : u32) -> Result<Self, DistrError> {
        if trials == 0 {
            return Err(DistrError::InvalidTrials(trials));
        }
        Ok(Binomial { trials })
    }

    pub fn bernoulli() -> Self {
        Binomial { trials : 1 }
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

}

// Boundary cases are split so that 0 * ln(0) never shows up when p is 0 or 1.
fn binomial_log_prob(x : u32, n : u32, theta : f64) -> f64 {
    if x == 0 {
        (n as f64) * (1. - theta).ln()
    } else if x == n {
        (x as f64) * theta.ln()
    } else {
        calc::log_binomial_coef(n, x) + (x as f64) * theta.ln() + ((n - x) as f64) * (1. - theta).ln()
    }
}

impl Likelihood for Binomial {

    fn name(&self) -> &'static str {
        if self.trials == 1 { "bernoulli" } else { "binomial" }
    }

    fn parameter(&self) -> &'static str {
        "p"
    }

    fn domain(&self) -> Domain {
        Domain::PROBABILITY
    }

    fn check_observation(&self, y : u32) -> Result<(), DistrError> {
        if y > self.trials {
            let reason = if self.trials == 1 {
                "outcomes must be 0 or 1"
            } else {
                "successes cannot exceed the number of trials"
            };
            Err(DistrError::SampleDomain { distribution : self.name(), value : y, reason })
        } else {
            Ok(())
        }
    }

    fn unchecked_log_prob(&self, theta : f64, y : u32) -> f64 {
        binomial_log_prob(y, self.trials, theta)
    }

    fn mle(&self, sample : &Sample) -> Result<f64, DistrError> {
        for y in sample.iter() {
            self.check_observation(y)?;
        }
        Ok(sample.sum() as f64 / (sample.len() as f64 * self.trials as f64))
    }

    fn search_interval(&self, _sample : &Sample) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn link(&self, theta : f64) -> f64 {
        theta.logit()
    }

    fn link_inverse(&self, eta : f64) -> f64 {
        eta.sigmoid()
    }

    fn simulate<R>(&self, theta : f64, n : usize, rng : &mut R) -> Result<Sample, DistrError>
    where
        R : Rng + ?Sized
    {
        self.check_parameter(theta)?;
        let sampler = rand_distr::Binomial::new(u64::from(self.trials), theta)
            .map_err(|_| DistrError::ParameterDomain { name : "p", value : theta, domain : self.domain() })?;
        let obs : Vec<u32> = (0..n).map(|_| sampler.sample(rng) as u32 ).collect();
        Ok(Sample::new(obs)?)
    }

}
