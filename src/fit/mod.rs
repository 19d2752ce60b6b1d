use std::fmt::{self, Display};
use std::str::FromStr;
use anyhow::Context;
use serde::{Serialize, Deserialize};
use tracing::{info, warn};
use crate::distr::{DistrError, Likelihood};
use crate::optim::{self, Method, OptimError, OptimParam};
use crate::sample::Sample;

/// Function of the parameter handed to the bounded search. All three variants share
/// the same optimum, since the logarithm is monotonic; the likelihood itself is only
/// well-behaved for small samples, for which the product of probabilities does not underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {

    /// Maximize the product of the probabilities.
    Likelihood,

    /// Maximize the sum of the log-probabilities.
    LogLikelihood,

    /// Minimize the negated sum of the log-probabilities.
    NegLogLikelihood

}

impl Default for Objective {

    fn default() -> Self {
        Objective::LogLikelihood
    }

}

impl Display for Objective {

    fn fmt(&self, f : &mut fmt::Formatter) -> fmt::Result {
        match self {
            Objective::Likelihood => write!(f, "likelihood"),
            Objective::LogLikelihood => write!(f, "log-likelihood"),
            Objective::NegLogLikelihood => write!(f, "negative log-likelihood")
        }
    }

}

impl FromStr for Objective {

    type Err = String;

    fn from_str(s : &str) -> Result<Self, String> {
        match s {
            "likelihood" | "lik" => Ok(Objective::Likelihood),
            "log-likelihood" | "loglik" => Ok(Objective::LogLikelihood),
            "neg-log-likelihood" | "nll" => Ok(Objective::NegLogLikelihood),
            o => Err(format!("Unknown objective: {} (expected likelihood, log-likelihood or neg-log-likelihood)", o))
        }
    }

}

/// Maximum likelihood estimate found by a bounded search, paired with the
/// closed-form solution for the same sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {

    pub distribution : String,

    pub parameter : String,

    pub objective : Objective,

    pub method : Method,

    /// Number of observations.
    pub n : usize,

    /// Interval the search was carried over.
    pub interval : (f64, f64),

    /// Maximizer found by the bounded search.
    pub numerical : f64,

    /// Closed-form maximum likelihood estimate.
    pub analytical : f64,

    /// Numerical estimate on the natural parameter scale.
    pub natural : f64,

    /// Log-likelihood evaluated at the numerical estimate.
    pub log_likelihood : f64,

    pub iters : u64,

    pub evals : u64,

    pub converged : bool

}

impl Estimate {

    pub fn abs_error(&self) -> f64 {
        (self.numerical - self.analytical).abs()
    }

}

/// Maximum likelihood estimator that recovers the parameter by a bounded search
/// over the likelihood (or a transformation of it), instead of using the closed-form
/// expression, which is reported alongside for comparison. The search is carried over the
/// distribution default interval unless one is informed, in which case it must lie inside
/// the distribution domain. Settings can be loaded from JSON, with absent fields taking
/// their default values.
///
/// # Example
///
/// ```
/// use likely::distr::Poisson;
/// use likely::fit::Mle;
/// use likely::sample::Sample;
///
/// let colonies = Sample::new(vec![1, 2, 4, 5, 7, 2, 3, 5, 6, 3, 7, 2]).unwrap();
/// let est = Mle::default().fit(&Poisson, &colonies).unwrap();
/// assert!((est.numerical - 3.917).abs() < 1E-3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mle {

    pub optim : OptimParam,

    pub objective : Objective,

    pub interval : Option<(f64, f64)>

}

impl Mle {

    pub fn new(optim : OptimParam) -> Self {
        Mle { optim, ..Default::default() }
    }

    pub fn objective(mut self, objective : Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn interval(mut self, lower : f64, upper : f64) -> Self {
        self.interval = Some((lower, upper));
        self
    }

    fn search_interval<L>(&self, lik : &L, sample : &Sample) -> Result<(f64, f64), DistrError>
    where
        L : Likelihood
    {
        match self.interval {
            Some((lower, upper)) => {
                let domain = lik.domain();
                if !domain.contains(lower) {
                    Err(DistrError::ParameterDomain { name : lik.parameter(), value : lower, domain })
                } else if !domain.contains(upper) {
                    Err(DistrError::ParameterDomain { name : lik.parameter(), value : upper, domain })
                } else {
                    Ok((lower, upper))
                }
            },
            None => Ok(lik.search_interval(sample))
        }
    }

    pub fn fit<L>(&self, lik : &L, sample : &Sample) -> anyhow::Result<Estimate>
    where
        L : Likelihood
    {
        let analytical = lik.mle(sample)
            .with_context(|| format!("Invalid sample for the {} likelihood", lik.name()) )?;
        let (lower, upper) = self.search_interval(lik, sample)
            .context("Invalid search interval")?;
        let ext = match self.objective {
            Objective::Likelihood => {
                optim::maximize(|theta| Ok(lik.likelihood(theta, sample)?), lower, upper, &self.optim)
            },
            Objective::LogLikelihood => {
                optim::maximize(|theta| Ok(lik.log_likelihood(theta, sample)?), lower, upper, &self.optim)
            },
            Objective::NegLogLikelihood => {
                optim::minimize(|theta| Ok(-lik.log_likelihood(theta, sample)?), lower, upper, &self.optim)
            }
        };
        let ext = ext
            .map_err(|e| match e {
                OptimError::Objective(inner) => inner,
                other => anyhow::Error::from(other)
            })
            .with_context(|| format!("Maximum likelihood search for {} over [{}, {}] failed", lik.parameter(), lower, upper) )?;
        if self.objective == Objective::Likelihood && ext.value == 0.0 {
            warn!(n = sample.len(), "likelihood underflows to zero; prefer the log-likelihood objective");
        }
        let log_likelihood = lik.log_likelihood(ext.arg, sample)?;
        let est = Estimate {
            distribution : lik.name().to_string(),
            parameter : lik.parameter().to_string(),
            objective : self.objective,
            method : self.optim.method,
            n : sample.len(),
            interval : (lower, upper),
            numerical : ext.arg,
            analytical,
            natural : lik.link(ext.arg),
            log_likelihood,
            iters : ext.iters,
            evals : ext.evals,
            converged : ext.converged
        };
        info!(
            distribution = %est.distribution,
            objective = %est.objective,
            numerical = est.numerical,
            analytical = est.analytical,
            iters = est.iters,
            "maximum likelihood estimate"
        );
        Ok(est)
    }

}
