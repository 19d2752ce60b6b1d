use std::cell::Cell;
use std::fmt::{self, Display};
use std::str::FromStr;
use argmin::core::{ArgminError, CostFunction, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::brent::BrentOpt;
use argmin::solver::goldensectionsearch::GoldenSectionSearch;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Derivative-free line search used to bracket the extremum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {

    /// Shrinks the bracket by the golden ratio at every iteration. The tolerance
    /// is relative to the magnitude of the current bracket points.
    GoldenSection,

    /// Golden-section steps interleaved with parabolic interpolation (Brent, 1973).
    /// The tolerance is absolute.
    Brent

}

impl Default for Method {

    fn default() -> Self {
        Method::Brent
    }

}

impl Display for Method {

    fn fmt(&self, f : &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::GoldenSection => write!(f, "golden-section"),
            Method::Brent => write!(f, "brent")
        }
    }

}

impl FromStr for Method {

    type Err = String;

    fn from_str(s : &str) -> Result<Self, String> {
        match s {
            "golden-section" | "golden" => Ok(Method::GoldenSection),
            "brent" => Ok(Method::Brent),
            m => Err(format!("Unknown method: {} (expected golden-section or brent)", m))
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sense {
    Maximize,
    Minimize
}

/// Settings shared by all bounded searches. Can be deserialized from JSON, with
/// absent fields taking their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimParam {

    /// Line search algorithm.
    pub method : Method,

    /// Convergence tolerance over the parameter (not the objective).
    pub tolerance : f64,

    /// Maximum number of iterations the algorithm will run.
    pub max_iter : u64

}

impl Default for OptimParam {

    fn default() -> Self {
        OptimParam { method : Method::Brent, tolerance : 1E-8, max_iter : 500 }
    }

}

impl OptimParam {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn method(mut self, method : Method) -> Self {
        self.method = method;
        self
    }

    pub fn tolerance(mut self, tolerance : f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn max_iter(mut self, iter : u64) -> Self {
        self.max_iter = iter;
        self
    }

    pub fn validate(&self) -> Result<(), OptimError> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(OptimError::InvalidTolerance(self.tolerance));
        }
        if self.max_iter == 0 {
            return Err(OptimError::InvalidIterations);
        }
        Ok(())
    }

}

#[derive(Debug, Error)]
pub enum OptimError {

    #[error("Invalid search interval [{lower}, {upper}]: bounds must be finite with lower < upper")]
    InvalidInterval { lower : f64, upper : f64 },

    #[error("Invalid tolerance {0}: must be finite and positive")]
    InvalidTolerance(f64),

    #[error("Invalid iteration limit: at least one iteration is required")]
    InvalidIterations,

    #[error("Objective is not evaluable at {at} (yielded NaN)")]
    NotEvaluable { at : f64 },

    /// The objective returned an error, which is carried unchanged.
    #[error(transparent)]
    Objective(anyhow::Error),

    #[error("Error running optimizer: {0}")]
    Exec(String)

}

/// Result of a bounded search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {

    /// Argument at which the extremum was found.
    pub arg : f64,

    /// Objective value at arg, on the original (unsigned) scale.
    pub value : f64,

    pub iters : u64,

    pub evals : u64,

    /// False when the iteration limit was hit before the tolerance was met.
    pub converged : bool

}

// Adapts a closure to argmin, which always minimizes. The solver sees the
// argument shifted by offset; shifted-back arguments are kept inside bounds.
struct Objective<'a, F> {
    f : F,
    sign : f64,
    offset : f64,
    bounds : (f64, f64),
    evals : &'a Cell<u64>
}

impl<'a, F> CostFunction for Objective<'a, F>
where
    F : Fn(f64) -> Result<f64, anyhow::Error>
{

    type Param = f64;

    type Output = f64;

    fn cost(&self, x : &f64) -> Result<f64, argmin::core::Error> {
        self.evals.set(self.evals.get() + 1);
        let at = (*x - self.offset).max(self.bounds.0).min(self.bounds.1);
        let v = (self.f)(at)?;
        if v.is_nan() {
            return Err(OptimError::NotEvaluable { at }.into());
        }
        Ok(self.sign * v)
    }

}

fn check_interval(lower : f64, upper : f64) -> Result<(), OptimError> {
    if lower.is_finite() && upper.is_finite() && lower < upper {
        Ok(())
    } else {
        Err(OptimError::InvalidInterval { lower, upper })
    }
}

fn has_converged(status : &TerminationStatus) -> bool {
    !matches!(status, TerminationStatus::Terminated(TerminationReason::MaxItersReached))
}

fn classify(e : argmin::core::Error) -> OptimError {
    if e.is::<ArgminError>() {
        return OptimError::Exec(e.to_string());
    }
    match e.downcast::<OptimError>() {
        Ok(optim_err) => optim_err,
        Err(e) => OptimError::Objective(e)
    }
}

/// Searches for the extremum of a unimodal objective over the closed interval [lower, upper].
/// The objective might fail (e.g. if evaluated outside the domain of a likelihood), in which case
/// the search stops and the error is returned as OptimError::Objective. Evaluating to NaN anywhere
/// the search visits also aborts the search; infinite values are accepted.
///
/// # Example
///
/// ```
/// use likely::optim::*;
///
/// let ext = maximize(|x| Ok(-(x - 0.3) * (x - 0.3)), 0.0, 1.0, &OptimParam::new()).unwrap();
/// assert!((ext.arg - 0.3).abs() < 1E-6);
/// ```
pub fn optimize<F>(
    f : F,
    lower : f64,
    upper : f64,
    sense : Sense,
    param : &OptimParam
) -> Result<Extremum, OptimError>
where
    F : Fn(f64) -> Result<f64, anyhow::Error>
{
    check_interval(lower, upper)?;
    param.validate()?;
    let sign = match sense {
        Sense::Maximize => -1.0,
        Sense::Minimize => 1.0
    };
    let evals = Cell::new(0);
    let max_iter = param.max_iter;
    let width = upper - lower;
    let (best, cost, iters, converged) = match param.method {
        Method::GoldenSection => {
            // Golden-section stops on a bracket relative to |x|, which never shrinks enough
            // around zero. Searching over [width, 2 width] makes the stop relative to the width.
            let offset = width - lower;
            let obj = Objective { f, sign, offset, bounds : (lower, upper), evals : &evals };
            let solver = GoldenSectionSearch::new(width, 2.0 * width)
                .and_then(|s| s.with_tolerance(param.tolerance) )
                .map_err(classify)?;
            let init = 1.5 * width;
            let res = Executor::new(obj, solver)
                .configure(|state| state.param(init).max_iters(max_iter) )
                .run()
                .map_err(classify)?;
            let state = res.state();
            let best = state.get_best_param().map(|x| (x - offset).max(lower).min(upper) );
            (best, state.get_best_cost(), state.get_iter(), has_converged(state.get_termination_status()))
        },
        Method::Brent => {
            let obj = Objective { f, sign, offset : 0.0, bounds : (lower, upper), evals : &evals };
            let solver = BrentOpt::new(lower, upper)
                .set_tolerance(f64::EPSILON.sqrt(), param.tolerance);
            let res = Executor::new(obj, solver)
                .configure(|state| state.max_iters(max_iter) )
                .run()
                .map_err(classify)?;
            let state = res.state();
            (state.get_best_param().copied(), state.get_best_cost(), state.get_iter(), has_converged(state.get_termination_status()))
        }
    };
    let arg = best.ok_or_else(|| OptimError::Exec("Optimizer finished without a best parameter".into()) )?;
    let evals = evals.get();
    let ext = Extremum { arg, value : sign * cost, iters, evals, converged };
    debug!(
        method = %param.method,
        lower,
        upper,
        arg = ext.arg,
        value = ext.value,
        iters = ext.iters,
        evals = ext.evals,
        "bounded search finished"
    );
    if !converged {
        warn!(method = %param.method, max_iter, arg = ext.arg, "bounded search reached the iteration limit");
    }
    Ok(ext)
}

pub fn maximize<F>(f : F, lower : f64, upper : f64, param : &OptimParam) -> Result<Extremum, OptimError>
where
    F : Fn(f64) -> Result<f64, anyhow::Error>
{
    optimize(f, lower, upper, Sense::Maximize, param)
}

pub fn minimize<F>(f : F, lower : f64, upper : f64, param : &OptimParam) -> Result<Extremum, OptimError>
where
    F : Fn(f64) -> Result<f64, anyhow::Error>
{
    optimize(f, lower, upper, Sense::Minimize, param)
}

#[cfg(test)]
mod tests {

    use super::*;

    const TOL : f64 = 1E-6;

    fn both() -> Vec<OptimParam> {
        vec![OptimParam::new().method(Method::Brent), OptimParam::new().method(Method::GoldenSection)]
    }

    #[test]
    fn parabola() {
        for param in both() {
            let min = minimize(|x| Ok((x - 1.5).powi(2) + 2.0), -4.0, 4.0, &param).unwrap();
            assert!((min.arg - 1.5).abs() < TOL, "{} found {}", param.method, min.arg);
            assert!((min.value - 2.0).abs() < TOL);
            assert!(min.converged);
            assert!(min.evals >= min.iters);
            let max = maximize(|x| Ok(-(x - 1.5).powi(2) + 2.0), -4.0, 4.0, &param).unwrap();
            assert!((max.arg - 1.5).abs() < TOL);
            assert!((max.value - 2.0).abs() < TOL);
        }
    }

    #[test]
    fn monotone_objective_ends_near_bound() {
        for param in both() {
            let max = maximize(|x| Ok(x), 0.0, 2.0, &param).unwrap();
            assert!((max.arg - 2.0).abs() < 1E-4, "{} found {}", param.method, max.arg);
        }
    }

    #[test]
    fn invalid_intervals() {
        let param = OptimParam::new();
        let f = |x : f64| Ok(x * x);
        assert!(matches!(minimize(f, 1.0, 1.0, &param), Err(OptimError::InvalidInterval { .. })));
        assert!(matches!(minimize(f, 2.0, 1.0, &param), Err(OptimError::InvalidInterval { .. })));
        assert!(matches!(minimize(f, f64::NAN, 1.0, &param), Err(OptimError::InvalidInterval { .. })));
        assert!(matches!(minimize(f, 0.0, f64::INFINITY, &param), Err(OptimError::InvalidInterval { .. })));
    }

    #[test]
    fn invalid_settings() {
        let f = |x : f64| Ok(x * x);
        let bad_tol = OptimParam::new().tolerance(0.0);
        assert!(matches!(minimize(f, -1.0, 1.0, &bad_tol), Err(OptimError::InvalidTolerance(_))));
        let bad_iter = OptimParam::new().max_iter(0);
        assert!(matches!(minimize(f, -1.0, 1.0, &bad_iter), Err(OptimError::InvalidIterations)));
    }

    #[test]
    fn nan_objective_is_reported() {
        for param in both() {
            let res = minimize(|_| Ok(f64::NAN), -1.0, 1.0, &param);
            assert!(matches!(res, Err(OptimError::NotEvaluable { .. })));
        }
    }

    #[test]
    fn objective_errors_are_propagated() {
        let res = minimize(|_| Err(anyhow::anyhow!("boom")), -1.0, 1.0, &OptimParam::new());
        match res {
            Err(OptimError::Objective(e)) => assert_eq!(e.to_string(), "boom"),
            other => panic!("Unexpected result: {:?}", other)
        }
    }

    #[test]
    fn optimum_at_zero_bound_converges() {
        for param in both() {
            let max = maximize(|x| Ok(-x), 0.0, 1.0, &param).unwrap();
            assert!(max.converged, "{} did not converge", param.method);
            assert!(max.arg >= 0.0 && max.arg < TOL, "{} found {}", param.method, max.arg);
            assert!(max.iters < 100);
            let min = minimize(|x| Ok(x * x), 0.0, 7.0, &param).unwrap();
            assert!(min.converged);
            assert!(min.arg < TOL);
        }
    }

    #[test]
    fn iteration_limit_is_not_an_error() {
        let param = OptimParam::new().method(Method::GoldenSection).max_iter(3);
        let min = minimize(|x| Ok((x - 0.123).powi(2)), 0.0, 10.0, &param).unwrap();
        assert!(!min.converged);
        assert!(min.iters <= 3);
    }

    #[test]
    fn settings_from_json() {
        let param : OptimParam = serde_json::from_str(r#"{ "method" : "golden-section" }"#).unwrap();
        assert_eq!(param.method, Method::GoldenSection);
        assert_eq!(param.max_iter, 500);
        assert_eq!("brent".parse::<Method>().unwrap(), Method::Brent);
        assert!("newton".parse::<Method>().is_err());
    }

}
