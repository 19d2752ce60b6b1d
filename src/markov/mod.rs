use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

/// Tolerance used to verify transition rows and distributions sum to one.
pub const STOCHASTIC_TOL : f64 = 1E-9;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {

    #[error("Empty transition matrix")]
    Empty,

    #[error("Transition matrix must be square (got {rows}x{cols})")]
    NotSquare { rows : usize, cols : usize },

    #[error("Invalid transition probability {value} at ({row}, {col})")]
    InvalidProbability { row : usize, col : usize, value : f64 },

    #[error("Transition probabilities at row {row} sum to {sum} (should sum to 1)")]
    NotStochastic { row : usize, sum : f64 },

    #[error("Invalid state distribution: {0}")]
    InvalidDistribution(String),

    #[error("State {state} outside chain with {n} states")]
    InvalidState { state : usize, n : usize },

    #[error("Chain does not have a unique stationary distribution")]
    Singular,

    #[error("Malformed transition matrix: {0}")]
    Malformed(String)

}

/// A MarkovChain is a discrete-time process over a finite number of states, represented by
/// its row-stochastic transition matrix: entry (i, j) is the probability of moving to state j
/// given the chain is at state i. State distributions are represented as row vectors (stored as
/// DVectors), and evolve by right-multiplication by the transition matrix.
///
/// A stationary distribution π satisfies π P = π. For irreducible chains it is unique, and
/// for irreducible aperiodic chains it is also the limit of the state distribution from any
/// starting point, and the long-run fraction of time the chain spends at each state.
///
/// # Example
///
/// ```
/// use likely::markov::MarkovChain;
/// use nalgebra::DMatrix;
///
/// let p = DMatrix::from_row_slice(2, 2, &[0.9, 0.1, 0.5, 0.5]);
/// let chain = MarkovChain::new(p).unwrap();
/// let pi = chain.stationary().unwrap();
/// assert!((pi[0] - 5. / 6.).abs() < 1E-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkovChain {
    trans : DMatrix<f64>
}

impl MarkovChain {

    pub fn new(trans : DMatrix<f64>) -> Result<Self, ChainError> {
        if trans.nrows() == 0 || trans.ncols() == 0 {
            return Err(ChainError::Empty);
        }
        if trans.nrows() != trans.ncols() {
            return Err(ChainError::NotSquare { rows : trans.nrows(), cols : trans.ncols() });
        }
        for (i, row) in trans.row_iter().enumerate() {
            for (j, p) in row.iter().enumerate() {
                if !p.is_finite() || *p < 0.0 || *p > 1.0 {
                    return Err(ChainError::InvalidProbability { row : i, col : j, value : *p });
                }
            }
            let sum = row.sum();
            if (sum - 1.0).abs() > STOCHASTIC_TOL {
                return Err(ChainError::NotStochastic { row : i, sum });
            }
        }
        Ok(MarkovChain { trans })
    }

    pub fn from_rows(rows : &[Vec<f64>]) -> Result<Self, ChainError> {
        let n = rows.len();
        let ncols = rows.first().map(|r| r.len() ).unwrap_or(0);
        if let Some(r) = rows.iter().find(|r| r.len() != ncols ) {
            return Err(ChainError::NotSquare { rows : n, cols : r.len() });
        }
        let flat : Vec<f64> = rows.iter().flat_map(|r| r.iter().copied() ).collect();
        Self::new(DMatrix::from_row_slice(n, ncols, &flat[..]))
    }

    pub fn states(&self) -> usize {
        self.trans.nrows()
    }

    pub fn transitions(&self) -> &DMatrix<f64> {
        &self.trans
    }

    /// Solves π (P - I) = 0 subject to Σπ = 1. The normalization replaces one of the
    /// equations, since the system is rank-deficient by one for irreducible chains.
    pub fn stationary(&self) -> Result<DVector<f64>, ChainError> {
        let n = self.states();
        let mut a = self.trans.transpose() - DMatrix::<f64>::identity(n, n);
        a.row_mut(n - 1).fill(1.0);
        let mut b = DVector::zeros(n);
        b[n - 1] = 1.0;
        let pi = a.lu().solve(&b).ok_or(ChainError::Singular)?;
        // Reducible chains might still yield a (non-unique) solution when the
        // factorization is nearly singular; such solutions fail to be distributions
        // or fail to be invariant.
        if pi.iter().any(|p| !p.is_finite() || *p < -STOCHASTIC_TOL ) {
            return Err(ChainError::Singular);
        }
        let pi = pi.map(|p| p.max(0.0) );
        let residual = (self.step(&pi) - &pi).amax();
        if residual > 1E-8 {
            return Err(ChainError::Singular);
        }
        debug!(states = n, residual, "stationary distribution");
        Ok(pi)
    }

    /// Moduli of the transition matrix eigenvalues, in decreasing order. The leading modulus
    /// is always one; the second-largest governs how fast distributions approach stationarity.
    pub fn eigenvalue_moduli(&self) -> Vec<f64> {
        let mut moduli : Vec<f64> = self.trans.complex_eigenvalues()
            .iter()
            .map(|c| c.norm() )
            .collect();
        moduli.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal) );
        moduli
    }

    fn step(&self, dist : &DVector<f64>) -> DVector<f64> {
        self.trans.tr_mul(dist)
    }

    pub fn check_distribution(&self, dist : &DVector<f64>) -> Result<(), ChainError> {
        if dist.nrows() != self.states() {
            return Err(ChainError::InvalidDistribution(
                format!("expected {} states, got {}", self.states(), dist.nrows())
            ));
        }
        if dist.iter().any(|p| !p.is_finite() || *p < 0.0 ) {
            return Err(ChainError::InvalidDistribution(String::from("negative or non-finite probability")));
        }
        if (dist.sum() - 1.0).abs() > STOCHASTIC_TOL {
            return Err(ChainError::InvalidDistribution(format!("probabilities sum to {}", dist.sum())));
        }
        Ok(())
    }

    /// Distribution over states after the informed number of transitions, starting from dist.
    pub fn propagate(&self, dist : &DVector<f64>, steps : usize) -> Result<DVector<f64>, ChainError> {
        self.check_distribution(dist)?;
        let mut curr = dist.clone();
        for _ in 0..steps {
            curr = self.step(&curr);
        }
        Ok(curr)
    }

    /// Draws a trajectory of steps transitions starting at state start. The trajectory
    /// includes the start state, so it has steps + 1 entries.
    pub fn simulate<R>(&self, start : usize, steps : usize, rng : &mut R) -> Result<Vec<usize>, ChainError>
    where
        R : Rng + ?Sized
    {
        let n = self.states();
        if start >= n {
            return Err(ChainError::InvalidState { state : start, n });
        }
        let mut samplers = Vec::with_capacity(n);
        for row in self.trans.row_iter() {
            let weights : Vec<f64> = row.iter().copied().collect();
            let sampler = WeightedIndex::new(&weights)
                .map_err(|e| ChainError::Malformed(e.to_string()) )?;
            samplers.push(sampler);
        }
        let mut traj = Vec::with_capacity(steps + 1);
        let mut curr = start;
        traj.push(curr);
        for _ in 0..steps {
            curr = samplers[curr].sample(rng);
            traj.push(curr);
        }
        Ok(traj)
    }

    /// Fraction of the trajectory spent at each state.
    pub fn occupancy(&self, traj : &[usize]) -> Result<DVector<f64>, ChainError> {
        let n = self.states();
        let mut counts = DVector::<f64>::zeros(n);
        for s in traj.iter() {
            if *s >= n {
                return Err(ChainError::InvalidState { state : *s, n });
            }
            counts[*s] += 1.0;
        }
        if traj.is_empty() {
            return Ok(counts);
        }
        Ok(counts / traj.len() as f64)
    }

}

impl std::str::FromStr for MarkovChain {

    type Err = ChainError;

    /// Parses rows separated by semicolons, with entries separated by commas
    /// (e.g. "0.9,0.1;0.5,0.5").
    fn from_str(s : &str) -> Result<Self, ChainError> {
        let mut rows = Vec::new();
        for row in s.split(';').map(|r| r.trim() ).filter(|r| !r.is_empty() ) {
            let mut entries = Vec::new();
            for e in row.split(',') {
                let v = e.trim().parse::<f64>()
                    .map_err(|_| ChainError::Malformed(format!("'{}' is not a number", e.trim())) )?;
                entries.push(v);
            }
            rows.push(entries);
        }
        if rows.is_empty() {
            return Err(ChainError::Empty);
        }
        MarkovChain::from_rows(&rows[..])
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS : f64 = 1E-10;

    fn weather() -> MarkovChain {
        "0.5,0.4,0.1; 0.3,0.4,0.3; 0.2,0.3,0.5".parse().unwrap()
    }

    #[test]
    fn two_state_stationary() {
        let chain = MarkovChain::from_rows(&[vec![0.9, 0.1], vec![0.5, 0.5]]).unwrap();
        let pi = chain.stationary().unwrap();
        assert!((pi[0] - 5. / 6.).abs() < EPS);
        assert!((pi[1] - 1. / 6.).abs() < EPS);
    }

    #[test]
    fn stationary_is_invariant() {
        let chain = weather();
        let pi = chain.stationary().unwrap();
        assert!((pi.sum() - 1.0).abs() < EPS);
        let next = chain.propagate(&pi, 1).unwrap();
        assert!((next - &pi).amax() < EPS);
    }

    #[test]
    fn propagation_converges() {
        let chain = weather();
        let pi = chain.stationary().unwrap();
        let start = DVector::from_column_slice(&[1.0, 0.0, 0.0]);
        let limit = chain.propagate(&start, 200).unwrap();
        assert!((limit - pi).amax() < 1E-9);
        assert_eq!(chain.propagate(&start, 0).unwrap(), start);
    }

    #[test]
    fn spectrum() {
        let chain = MarkovChain::from_rows(&[vec![0.9, 0.1], vec![0.5, 0.5]]).unwrap();
        let moduli = chain.eigenvalue_moduli();
        assert_eq!(moduli.len(), 2);
        assert!((moduli[0] - 1.0).abs() < 1E-9);
        // trace - 1
        assert!((moduli[1] - 0.4).abs() < 1E-9);
    }

    #[test]
    fn reducible_chain_has_no_unique_stationary() {
        let chain = MarkovChain::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(chain.stationary(), Err(ChainError::Singular));
    }

    #[test]
    fn invalid_matrices() {
        assert_eq!(MarkovChain::new(DMatrix::zeros(0, 0)), Err(ChainError::Empty));
        assert!(matches!(MarkovChain::new(DMatrix::from_element(2, 3, 1. / 3.)), Err(ChainError::NotSquare { .. })));
        assert!(matches!(MarkovChain::from_rows(&[vec![0.5, 0.6], vec![0.5, 0.5]]), Err(ChainError::NotStochastic { row : 0, .. })));
        assert!(matches!(MarkovChain::from_rows(&[vec![1.5, -0.5], vec![0.5, 0.5]]), Err(ChainError::InvalidProbability { .. })));
        assert!(matches!("0.5,x;0.5,0.5".parse::<MarkovChain>(), Err(ChainError::Malformed(_))));
        assert!(matches!("".parse::<MarkovChain>(), Err(ChainError::Empty)));
    }

    #[test]
    fn invalid_distributions() {
        let chain = weather();
        let short = DVector::from_column_slice(&[1.0, 0.0]);
        assert!(matches!(chain.propagate(&short, 1), Err(ChainError::InvalidDistribution(_))));
        let unnormalized = DVector::from_column_slice(&[0.5, 0.2, 0.2]);
        assert!(matches!(chain.propagate(&unnormalized, 1), Err(ChainError::InvalidDistribution(_))));
    }

    #[test]
    fn simulated_occupancy_approaches_stationary() {
        let chain = weather();
        let pi = chain.stationary().unwrap();
        let traj = chain.simulate(0, 50_000, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(traj.len(), 50_001);
        assert_eq!(traj[0], 0);
        let occ = chain.occupancy(&traj).unwrap();
        assert!((occ - pi).amax() < 0.02);
        assert!(matches!(chain.simulate(3, 1, &mut StdRng::seed_from_u64(3)), Err(ChainError::InvalidState { state : 3, n : 3 })));
    }

}
