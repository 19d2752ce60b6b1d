use serde::{Serialize, Deserialize};
use std::convert::TryFrom;
use std::io::Read;
use thiserror::Error;
use crate::calc;

#[derive(Debug, Error)]
pub enum SampleError {

    #[error("Empty sample: at least one observation is required")]
    EmptySample,

    #[error("Malformed record at line {line}: '{content}' is not a non-negative integer")]
    MalformedRecord { line : u64, content : String },

    #[error(transparent)]
    Csv(#[from] csv::Error)

}

/// A Sample holds independent observations of a discrete random variable: binary outcomes
/// (coin tosses) or non-negative counts (e.g. colonies per dish). Samples are never empty
/// and cannot be modified after creation, so any statistic calculated from them (sum, mean, maximum)
/// stays valid for the lifetime of the sample. Whether an outcome belongs to the support of a given
/// distribution is verified by the distribution itself when it evaluates the sample.
///
/// # Example
///
/// ```
/// use likely::sample::Sample;
///
/// let tosses = Sample::new(vec![0, 1, 0, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 0, 1]).unwrap();
/// assert_eq!(tosses.sum(), 6);
/// assert!((tosses.mean() - 0.4).abs() < 1E-12);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct Sample {
    obs : Vec<u32>
}

impl Sample {

    pub fn new(obs : Vec<u32>) -> Result<Self, SampleError> {
        if obs.is_empty() {
            return Err(SampleError::EmptySample);
        }
        Ok(Sample { obs })
    }

    pub fn from_slice(obs : &[u32]) -> Result<Self, SampleError> {
        Self::new(obs.to_vec())
    }

    /// Reads the first column of a CSV source as a sequence of observations.
    /// Blank cells are skipped; anything else must parse as an unsigned integer.
    pub fn from_csv<R>(reader : R, has_headers : bool) -> Result<Self, SampleError>
    where
        R : Read
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .flexible(true)
            .from_reader(reader);
        let mut obs = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line() ).unwrap_or(0);
            let cell = match record.get(0) {
                Some(cell) if !cell.trim().is_empty() => cell.trim(),
                _ => continue
            };
            let y = cell.parse::<u32>()
                .map_err(|_| SampleError::MalformedRecord { line, content : cell.to_string() })?;
            obs.push(y);
        }
        Self::new(obs)
    }

    pub fn values(&self) -> &[u32] {
        &self.obs[..]
    }

    pub fn len(&self) -> usize {
        self.obs.len()
    }

    pub fn sum(&self) -> u64 {
        self.obs.iter().map(|y| u64::from(*y) ).sum()
    }

    pub fn max(&self) -> u32 {
        self.obs.iter().copied().max().unwrap_or(0)
    }

    pub fn mean(&self) -> f64 {
        calc::mean(&self.obs[..]).unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item=u32> + '_ {
        self.obs.iter().copied()
    }

}

impl TryFrom<Vec<u32>> for Sample {

    type Error = SampleError;

    fn try_from(obs : Vec<u32>) -> Result<Self, SampleError> {
        Sample::new(obs)
    }

}

impl From<Sample> for Vec<u32> {

    fn from(s : Sample) -> Vec<u32> {
        s.obs
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn empty_sample_is_rejected() {
        assert!(matches!(Sample::new(Vec::new()), Err(SampleError::EmptySample)));
    }

    #[test]
    fn colony_statistics() {
        let s = Sample::new(vec![1, 2, 4, 5, 7, 2, 3, 5, 6, 3, 7, 2]).unwrap();
        assert_eq!(s.len(), 12);
        assert_eq!(s.sum(), 47);
        assert_eq!(s.max(), 7);
        assert!((s.mean() - 47. / 12.).abs() < 1E-12);
    }

    #[test]
    fn reads_first_csv_column() {
        let content = "count,dish\n1,a\n2,b\n\n4,c\n";
        let s = Sample::from_csv(content.as_bytes(), true).unwrap();
        assert_eq!(s.values(), &[1, 2, 4]);
        let bad = Sample::from_csv("1\n-2\n".as_bytes(), false);
        assert!(matches!(bad, Err(SampleError::MalformedRecord { .. })));
        assert!(matches!(Sample::from_csv("count\n".as_bytes(), true), Err(SampleError::EmptySample)));
    }

    #[test]
    fn json_roundtrip_validates() {
        let s : Sample = serde_json::from_str("[0, 1, 1]").unwrap();
        assert_eq!(s.sum(), 2);
        assert_eq!(serde_json::to_string(&s).unwrap(), "[0,1,1]");
        assert!(serde_json::from_str::<Sample>("[]").is_err());
    }

}
