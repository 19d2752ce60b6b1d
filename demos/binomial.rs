use likely::distr::*;
use likely::fit::{Mle, Objective};
use likely::optim::{Method, OptimParam};
use likely::report::{self, Scale};
use likely::sample::Sample;

/* Check against the closed form:

k successes in n trials yield p = k / n, here 6 / 15 = 0.4 */

fn main() {
    let tosses = Sample::new(vec![0, 1, 0, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 0, 1]).unwrap();
    let bern = Binomial::bernoulli();
    for method in [Method::GoldenSection, Method::Brent].iter() {
        for objective in [Objective::Likelihood, Objective::LogLikelihood, Objective::NegLogLikelihood].iter() {
            let mle = Mle::new(OptimParam::new().method(*method)).objective(*objective);
            let est = mle.fit(&bern, &tosses).unwrap();
            println!("{}\n", est);
        }
    }

    // The same tosses, grouped as successes out of three trials
    let grouped = Sample::new(vec![1, 1, 1, 2, 1]).unwrap();
    let est = Mle::default().fit(&Binomial::new(3).unwrap(), &grouped).unwrap();
    println!("{}\n", est);

    let est = Mle::default().objective(Objective::Likelihood).fit(&bern, &tosses).unwrap();
    let rep = report::likelihood_report(&bern, &tosses, est, 101, Scale::Likelihood)
        .unwrap()
        .plot(60, 16);
    println!("{}", rep);
}
