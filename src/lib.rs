/// Numerical helpers shared by the likelihood evaluators (log-factorials, logit and
/// sigmoid transformations, evenly-spaced grids).
pub mod calc;

/// Samples of non-negative integer observations (binary outcomes, successes out of a fixed
/// number of trials or event counts), read from literals or CSV files.
pub mod sample;

/// Likelihood trait and its implementations for the binomial (Bernoulli) and Poisson
/// distributions.
pub mod distr;

/// Derivative-free bounded search for the extremum of a univariate function (golden-section
/// and Brent's method).
pub mod optim;

/// Maximum likelihood estimation by bounded search, compared against the closed-form estimator.
pub mod fit;

/// Text, CSV and JSON reports of estimates and likelihood curves.
pub mod report;

/// Finite-state discrete-time Markov chains and their stationary distributions.
pub mod markov;
