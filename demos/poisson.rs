use likely::distr::*;
use likely::fit::{Mle, Objective};
use likely::report::{self, Scale};
use likely::sample::Sample;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() {
    let colonies = Sample::new(vec![1, 2, 4, 5, 7, 2, 3, 5, 6, 3, 7, 2]).unwrap();
    let est = Mle::default().fit(&Poisson, &colonies).unwrap();
    let rep = report::likelihood_report(&Poisson, &colonies, est, 101, Scale::LogLikelihood)
        .unwrap()
        .plot(60, 16);
    println!("{}\n", rep);

    // The product of probabilities underflows for large samples, while the log-likelihood does not.
    let mut rng = StdRng::seed_from_u64(7);
    for n in [10, 100, 1000].iter() {
        let sample = Poisson.simulate(4.0, *n, &mut rng).unwrap();
        let lik = Mle::default().objective(Objective::Likelihood).fit(&Poisson, &sample).unwrap();
        let loglik = Mle::default().fit(&Poisson, &sample).unwrap();
        println!(
            "n = {:>4}: likelihood search {:.6}; log-likelihood search {:.6}; sample mean {:.6}",
            n, lik.numerical, loglik.numerical, loglik.analytical
        );
    }
}
