use likely::markov::MarkovChain;
use nalgebra::DVector;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn main() {
    // Sunny, cloudy and rainy days
    let chain : MarkovChain = "0.5,0.4,0.1; 0.3,0.4,0.3; 0.2,0.3,0.5".parse().unwrap();
    let pi = chain.stationary().unwrap();
    println!("Stationary distribution: {}", pi.transpose());
    println!("Eigenvalue moduli: {:?}", chain.eigenvalue_moduli());

    let sunny = DVector::from_column_slice(&[1.0, 0.0, 0.0]);
    for steps in [1, 2, 5, 10, 20].iter() {
        let dist = chain.propagate(&sunny, *steps).unwrap();
        println!("After {:>2} days: {}", steps, dist.transpose());
    }

    let traj = chain.simulate(0, 10_000, &mut StdRng::seed_from_u64(1)).unwrap();
    println!("Occupancy over 10000 days: {}", chain.occupancy(&traj).unwrap().transpose());
}
