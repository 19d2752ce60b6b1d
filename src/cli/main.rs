use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use anyhow::{bail, Context};
use nalgebra::DVector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;
use likely::distr::{Binomial, Likelihood, Poisson};
use likely::fit::{Mle, Objective};
use likely::markov::MarkovChain;
use likely::optim::Method;
use likely::report::{self, Scale};
use likely::sample::Sample;

const TOSSES : [u32; 15] = [0, 1, 0, 0, 0, 1, 1, 0, 1, 0, 0, 1, 0, 0, 1];

const COLONIES : [u32; 12] = [1, 2, 4, 5, 7, 2, 3, 5, 6, 3, 7, 2];

const WEATHER : &str = "0.5,0.4,0.1; 0.3,0.4,0.3; 0.2,0.3,0.5";

/// Options shared by the estimation subcommands.
#[derive(StructOpt, Debug)]
struct FitOpts {

    /// Observations. When neither these nor a data file are informed,
    /// a built-in example sample is used.
    values : Vec<u32>,

    /// CSV file with observations at the first column, or JSON file with an array of observations
    #[structopt(short, long, parse(from_os_str))]
    data : Option<PathBuf>,

    /// Skip the first line of the data file
    #[structopt(long)]
    headers : bool,

    /// Search method (brent or golden-section)
    #[structopt(short, long)]
    method : Option<Method>,

    /// Function searched over (likelihood, log-likelihood or neg-log-likelihood)
    #[structopt(short, long)]
    objective : Option<Objective>,

    /// JSON file with estimator settings. Method and objective flags take precedence.
    #[structopt(short, long, parse(from_os_str))]
    config : Option<PathBuf>,

    /// Write the likelihood curve to this CSV file
    #[structopt(long, parse(from_os_str))]
    curve : Option<PathBuf>,

    /// Number of points of the likelihood curve
    #[structopt(long, default_value = "101")]
    points : usize,

    /// Print a text plot of the likelihood curve
    #[structopt(long)]
    plot : bool,

    /// Print the report as JSON
    #[structopt(long)]
    json : bool,

    /// Draw the sample from the distribution with this parameter value instead
    #[structopt(long)]
    simulate : Option<f64>,

    /// Size of the simulated sample
    #[structopt(short = "n", long, default_value = "100")]
    size : usize,

    #[structopt(long, default_value = "1")]
    seed : u64

}

/// Maximum likelihood estimation by bounded search, compared against closed-form estimates
#[derive(StructOpt, Debug)]
#[structopt(name = "likely")]
enum Likely {

    /// Estimate the success probability of binomial outcomes (coin tosses by default)
    Binomial {

        /// Number of trials per observation
        #[structopt(short, long, default_value = "1")]
        trials : u32,

        #[structopt(flatten)]
        opts : FitOpts

    },

    /// Estimate the rate of Poisson counts (bacterial colonies per dish by default)
    Poisson {

        #[structopt(flatten)]
        opts : FitOpts

    },

    /// Stationary distribution, spectrum and simulation of a Markov chain
    Markov {

        /// Transition matrix with rows separated by semicolons (e.g. "0.9,0.1;0.5,0.5")
        #[structopt(long)]
        matrix : Option<String>,

        /// Initial state of the propagated distribution and simulated trajectory
        #[structopt(long, default_value = "0")]
        start : usize,

        #[structopt(long, default_value = "1000")]
        steps : usize,

        #[structopt(long, default_value = "1")]
        seed : u64,

        #[structopt(long)]
        json : bool

    }

}

fn load_sample<L>(lik : &L, default : &[u32], opts : &FitOpts) -> anyhow::Result<Sample>
where
    L : Likelihood
{
    if let Some(path) = &opts.data {
        let file = File::open(path)
            .with_context(|| format!("Could not open {}", path.display()) )?;
        let is_json = path.extension().map(|ext| ext == "json" ).unwrap_or(false);
        return if is_json {
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Could not read sample from {}", path.display()) )
        } else {
            Sample::from_csv(file, opts.headers)
                .with_context(|| format!("Could not read sample from {}", path.display()) )
        };
    }
    if let Some(theta) = opts.simulate {
        let mut rng = StdRng::seed_from_u64(opts.seed);
        info!(theta, n = opts.size, seed = opts.seed, "simulating sample");
        return Ok(lik.simulate(theta, opts.size, &mut rng)?);
    }
    if opts.values.is_empty() {
        Ok(Sample::from_slice(default)?)
    } else {
        Ok(Sample::from_slice(&opts.values[..])?)
    }
}

fn settings(opts : &FitOpts) -> anyhow::Result<Mle> {
    let mut mle = match &opts.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Could not read {}", path.display()) )?;
            serde_json::from_str::<Mle>(&content)
                .with_context(|| format!("Invalid estimator settings at {}", path.display()) )?
        },
        None => Mle::default()
    };
    if let Some(method) = opts.method {
        mle.optim.method = method;
    }
    if let Some(objective) = opts.objective {
        mle.objective = objective;
    }
    Ok(mle)
}

fn estimate<L>(lik : &L, default : &[u32], opts : &FitOpts) -> anyhow::Result<()>
where
    L : Likelihood
{
    let sample = load_sample(lik, default, opts)?;
    let mle = settings(opts)?;
    let est = mle.fit(lik, &sample)?;
    let scale = match mle.objective {
        Objective::Likelihood => Scale::Likelihood,
        _ => Scale::LogLikelihood
    };
    let mut rep = if opts.curve.is_some() || opts.plot {
        report::likelihood_report(lik, &sample, est, opts.points, scale)?
    } else {
        report::Report::new(est)
    };
    if let (Some(path), Some(curve)) = (&opts.curve, &rep.curve) {
        let file = File::create(path)
            .with_context(|| format!("Could not create {}", path.display()) )?;
        curve.write_csv(file)?;
        info!(path = %path.display(), points = curve.points.len(), "likelihood curve written");
    }
    if opts.json {
        println!("{}", rep.to_json()?);
    } else {
        if opts.plot {
            rep = rep.plot(60, 16);
        }
        println!("{}", rep);
    }
    Ok(())
}

fn to_vec(v : &DVector<f64>) -> Vec<f64> {
    v.iter().copied().collect()
}

fn markov(matrix : &str, start : usize, steps : usize, seed : u64, as_json : bool) -> anyhow::Result<()> {
    let chain : MarkovChain = matrix.parse()
        .with_context(|| format!("Invalid transition matrix \"{}\"", matrix) )?;
    let n = chain.states();
    if start >= n {
        bail!("Start state {} outside chain with {} states", start, n);
    }
    let pi = chain.stationary()?;
    let moduli = chain.eigenvalue_moduli();
    let mut init = DVector::zeros(n);
    init[start] = 1.0;
    let propagated = chain.propagate(&init, steps)?;
    let traj = chain.simulate(start, steps, &mut StdRng::seed_from_u64(seed))?;
    let occupancy = chain.occupancy(&traj)?;
    if as_json {
        let out = json!({
            "states" : n,
            "stationary" : to_vec(&pi),
            "eigenvalue_moduli" : moduli,
            "propagated" : to_vec(&propagated),
            "occupancy" : to_vec(&occupancy),
            "steps" : steps
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Transition matrix:{}", chain.transitions());
        println!("Stationary distribution: {:.6?}", to_vec(&pi));
        println!("Eigenvalue moduli: {:.6?}", moduli);
        println!("Distribution after {} steps from state {}: {:.6?}", steps, start, to_vec(&propagated));
        println!("Occupancy of a simulated trajectory of {} steps: {:.6?}", steps, to_vec(&occupancy));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn") );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    match Likely::from_args() {
        Likely::Binomial { trials, opts } => {
            let lik = Binomial::new(trials)?;
            estimate(&lik, &TOSSES[..], &opts)
        },
        Likely::Poisson { opts } => {
            estimate(&Poisson, &COLONIES[..], &opts)
        },
        Likely::Markov { matrix, start, steps, seed, json } => {
            markov(matrix.as_deref().unwrap_or(WEATHER), start, steps, seed, json)
        }
    }
}
