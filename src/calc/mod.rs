use num_traits::ToPrimitive;
use special::Gamma;

/// Functions applicable to distribution parameters when moving between
/// the canonical scale (probabilities) and the natural scale (log-odds).
pub trait Variate {

    // Probability on [0, 1] mapped to the odds on [0, inf].
    fn odds(&self) -> Self;

    // Log-odds, the natural parameter of the Bernoulli.
    fn logit(&self) -> Self;

    // Inverse of the logit: maps the real line back to [0, 1].
    fn sigmoid(&self) -> Self;

}

impl Variate for f64 {

    fn odds(&self) -> f64 {
        *self / (1. - *self)
    }

    // -inf at 0 and inf at 1.
    fn logit(&self) -> f64 {
        self.odds().ln()
    }

    fn sigmoid(&self) -> f64 {
        1. / (1. + (-*self).exp())
    }

}

/// Natural logarithm of n!, via the log-gamma function.
pub fn ln_factorial(n : u32) -> f64 {
    (f64::from(n) + 1.0).ln_gamma().0
}

/// Natural logarithm of the binomial coefficient (n k). Requires k <= n.
pub fn log_binomial_coef(n : u32, k : u32) -> f64 {
    ln_factorial(n) - ( ln_factorial(k) + ln_factorial(n - k) )
}

/// Arithmetic mean of any slice of numeric values. Returns None for
/// empty slices or values that cannot be represented as f64.
pub fn mean<T>(vals : &[T]) -> Option<f64>
where
    T : ToPrimitive
{
    if vals.is_empty() {
        return None;
    }
    let mut total = 0.0;
    for v in vals.iter() {
        total += v.to_f64()?;
    }
    Some(total / vals.len() as f64)
}

/// Evenly-spaced grid of n points over [lower, upper], endpoints included.
pub fn linspace(lower : f64, upper : f64, n : usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lower],
        _ => {
            let step = (upper - lower) / (n - 1) as f64;
            (0..n).map(|i| if i == n - 1 { upper } else { lower + step * i as f64 } ).collect()
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    const EPS : f64 = 1E-10;

    #[test]
    fn factorials() {
        assert!(ln_factorial(0).abs() < EPS);
        assert!((ln_factorial(5) - (120f64).ln()).abs() < EPS);
        assert!((log_binomial_coef(15, 6) - (5005f64).ln()).abs() < 1E-8);
        let largest = ln_factorial(u32::MAX);
        assert!(largest.is_finite() && largest > 0.0);
        assert!(log_binomial_coef(u32::MAX, u32::MAX).abs() < 1E-6);
    }

    #[test]
    fn logit_inverts_sigmoid() {
        for p in [0.1, 0.4, 0.5, 0.9].iter() {
            assert!((p.logit().sigmoid() - p).abs() < EPS);
        }
        assert!((0.5f64).logit().abs() < EPS);
        assert_eq!((0.0f64).logit(), f64::NEG_INFINITY);
    }

    #[test]
    fn means_and_grids() {
        assert_eq!(mean::<u32>(&[]), None);
        assert!((mean(&[1u32, 2, 3, 4]).unwrap() - 2.5).abs() < EPS);
        let g = linspace(0.0, 1.0, 5);
        assert_eq!(g, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
    }

}
