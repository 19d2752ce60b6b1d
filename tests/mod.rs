use std::io::Write;
use rand::SeedableRng;
use rand::rngs::StdRng;
use likely::distr::*;
use likely::fit::{Mle, Objective};
use likely::markov::MarkovChain;
use likely::optim::{Method, OptimParam};
use likely::report::{self, Scale};
use likely::sample::Sample;

const EPS : f64 = 10E-10;

fn factorial(n : u32) -> f64 {
    (1..=n).map(|i| i as f64 ).product()
}

fn tosses() -> Sample {
    Sample::new(vec![0, 1, 0, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 0, 1]).unwrap()
}

fn colonies() -> Sample {
    Sample::new(vec![1, 2, 4, 5, 7, 2, 3, 5, 6, 3, 7, 2]).unwrap()
}

#[test]
fn binomial() {
    let binom = Binomial::new(5).unwrap();
    for p in (1..100).map(|p| 0.01 * p as f64) {
        for k in 0..=5 {
            let coef = factorial(5) / (factorial(k) * factorial(5 - k));
            let expected = coef * p.powi(k as i32) * (1. - p).powi(5 - k as i32);
            assert!((binom.log_prob(p, k).unwrap().exp() - expected).abs() < EPS);
        }
    }
}

#[test]
fn poisson() {
    for lambda in [0.1f64, 1.0, 3.5, 12.0].iter() {
        for y in 0..20 {
            let expected = lambda.powi(y as i32) * (-lambda).exp() / factorial(y);
            assert!((Poisson.log_prob(*lambda, y).unwrap().exp() - expected).abs() < EPS);
        }
    }
}

#[test]
fn coin_tosses_estimate() {
    let est = Mle::default().fit(&Binomial::bernoulli(), &tosses()).unwrap();
    assert!((est.numerical - 0.4).abs() < 1E-6);
    let expected = 6. * 0.4f64.ln() + 9. * 0.6f64.ln();
    assert!((est.log_likelihood - expected).abs() < 1E-9);
    assert!((est.natural - (0.4f64 / 0.6).ln()).abs() < 1E-5);
}

#[test]
fn colony_estimate() {
    let s = colonies();
    let est = Mle::new(OptimParam::new().method(Method::GoldenSection))
        .objective(Objective::Likelihood)
        .fit(&Poisson, &s)
        .unwrap();
    assert!((est.numerical - 3.917).abs() < 1E-3);
    let direct : f64 = s.iter()
        .map(|y| est.numerical.powi(y as i32) * (-est.numerical).exp() / factorial(y) )
        .product();
    assert!((Poisson.likelihood(est.numerical, &s).unwrap() - direct).abs() < 1E-20);
}

#[test]
fn estimate_from_csv_file() {
    let path = std::env::temp_dir().join("likely_colonies.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "colonies").unwrap();
    for y in colonies().iter() {
        writeln!(file, "{}", y).unwrap();
    }
    drop(file);
    let s = Sample::from_csv(std::fs::File::open(&path).unwrap(), true).unwrap();
    assert_eq!(s, colonies());
    let est = Mle::default().objective(Objective::NegLogLikelihood).fit(&Poisson, &s).unwrap();
    assert!((est.numerical - est.analytical).abs() < 1E-6);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn simulated_binomial_recovers_parameter() {
    let binom = Binomial::new(10).unwrap();
    let s = binom.simulate(0.3, 500, &mut StdRng::seed_from_u64(11)).unwrap();
    let est = Mle::default().fit(&binom, &s).unwrap();
    assert!((est.numerical - est.analytical).abs() < 1E-6);
    assert!((est.numerical - 0.3).abs() < 0.02);
}

#[test]
fn report_round_trip_through_json() {
    let est = Mle::default().fit(&Poisson, &colonies()).unwrap();
    let rep = report::likelihood_report(&Poisson, &colonies(), est.clone(), 50, Scale::Likelihood).unwrap();
    let parsed : likely::report::Report = serde_json::from_str(&rep.to_json().unwrap()).unwrap();
    assert_eq!(parsed.estimate.distribution, "poisson");
    assert_eq!(parsed.estimate.iters, est.iters);
    assert!((parsed.estimate.numerical - est.numerical).abs() < 1E-12);
    let curve = parsed.curve.unwrap();
    assert_eq!(curve.points.len(), 50);
    assert_eq!(curve.scale, Scale::Likelihood);
}

#[test]
fn weather_chain() {
    let chain : MarkovChain = "0.5,0.4,0.1; 0.3,0.4,0.3; 0.2,0.3,0.5".parse().unwrap();
    let pi = chain.stationary().unwrap();
    // Solved by hand: pi = (21, 23, 18) / 62
    assert!((pi[0] - 21. / 62.).abs() < 1E-10);
    assert!((pi[1] - 23. / 62.).abs() < 1E-10);
    assert!((pi[2] - 18. / 62.).abs() < 1E-10);
}
