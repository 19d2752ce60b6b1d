use std::fmt::{self, Display};
use std::io::Write;
use anyhow::bail;
use serde::{Serialize, Deserialize};
use crate::calc;
use crate::distr::Likelihood;
use crate::fit::Estimate;
use crate::sample::Sample;

impl Display for Estimate {

    fn fmt(&self, f : &mut fmt::Formatter) -> fmt::Result {
        let status = if self.converged { "converged" } else { "iteration limit reached" };
        writeln!(f, "{} maximum likelihood estimate (n = {}; {} search over the {})",
            self.distribution, self.n, self.method, self.objective)?;
        writeln!(f, "  numerical  {} = {:.6}", self.parameter, self.numerical)?;
        writeln!(f, "  analytical {} = {:.6}", self.parameter, self.analytical)?;
        writeln!(f, "  |numerical - analytical| = {:.3e}", self.abs_error())?;
        writeln!(f, "  natural parameter = {:.6}", self.natural)?;
        writeln!(f, "  log-likelihood = {:.6}", self.log_likelihood)?;
        write!(f, "  {} iterations, {} evaluations ({})", self.iters, self.evals, status)
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scale {
    Likelihood,
    LogLikelihood
}

impl Display for Scale {

    fn fmt(&self, f : &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scale::Likelihood => write!(f, "likelihood"),
            Scale::LogLikelihood => write!(f, "log_likelihood")
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub theta : f64,
    pub value : f64
}

/// Likelihood (or log-likelihood) tabulated over an evenly-spaced grid of
/// parameter values, with the data held fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub parameter : String,
    pub scale : Scale,
    pub points : Vec<Point>
}

impl Curve {

    pub fn evaluate<L>(
        lik : &L,
        sample : &Sample,
        lower : f64,
        upper : f64,
        n : usize,
        scale : Scale
    ) -> anyhow::Result<Self>
    where
        L : Likelihood
    {
        if n < 2 {
            bail!("A curve requires at least two points (got {})", n);
        }
        if !(lower < upper) {
            bail!("Invalid curve interval [{}, {}]", lower, upper);
        }
        let mut points = Vec::with_capacity(n);
        for theta in calc::linspace(lower, upper, n) {
            let value = match scale {
                Scale::Likelihood => lik.likelihood(theta, sample)?,
                Scale::LogLikelihood => lik.log_likelihood(theta, sample)?
            };
            points.push(Point { theta, value });
        }
        Ok(Curve { parameter : lik.parameter().to_string(), scale, points })
    }

    /// Grid point with the largest value.
    pub fn argmax(&self) -> Option<Point> {
        self.points.iter()
            .filter(|p| !p.value.is_nan() )
            .fold(None, |best : Option<Point>, p| match best {
                Some(b) if b.value >= p.value => Some(b),
                _ => Some(*p)
            })
    }

    pub fn write_csv<W>(&self, writer : W) -> Result<(), csv::Error>
    where
        W : Write
    {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&[self.parameter.clone(), self.scale.to_string()])?;
        for p in self.points.iter() {
            wtr.write_record(&[p.theta.to_string(), p.value.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Text plot of the curve with the informed number of columns and rows. Points that
    /// do not have a finite value (the log-likelihood at the domain boundary) are left blank.
    /// If mark is informed, the column closest to it is highlighted with a vertical bar.
    pub fn render(&self, width : usize, height : usize, mark : Option<f64>) -> String {
        let width = width.max(2);
        let height = height.max(2);
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (f.theta, l.theta),
            _ => return String::new()
        };
        let cols : Vec<f64> = (0..width).map(|c| {
            let ix = (c * (self.points.len() - 1) + (width - 1) / 2) / (width - 1);
            self.points[ix].value
        }).collect();
        let finite : Vec<f64> = cols.iter().copied().filter(|v| v.is_finite() ).collect();
        let (min, max) = finite.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)) );
        let mark_col = mark.filter(|m| *m >= first && *m <= last )
            .map(|m| (((m - first) / (last - first)) * (width - 1) as f64).round() as usize );
        let mut grid = vec![vec![' '; width]; height];
        for (c, v) in cols.iter().enumerate() {
            if !v.is_finite() {
                continue;
            }
            let level = if max > min {
                (((v - min) / (max - min)) * (height - 1) as f64).round() as usize
            } else {
                height - 1
            };
            grid[height - 1 - level][c] = '*';
        }
        if let Some(mc) = mark_col {
            for row in grid.iter_mut() {
                if row[mc] == ' ' {
                    row[mc] = '|';
                }
            }
        }
        let top = if finite.is_empty() { String::from("-") } else { format!("{:.4e}", max) };
        let bottom = if finite.is_empty() { String::from("-") } else { format!("{:.4e}", min) };
        let label_width = top.len().max(bottom.len());
        let mut out = String::new();
        for (r, row) in grid.iter().enumerate() {
            let label = if r == 0 {
                top.clone()
            } else if r == height - 1 {
                bottom.clone()
            } else {
                String::new()
            };
            let line : String = row.iter().collect();
            out += &format!("{:>w$} |{}\n", label, line.trim_end(), w = label_width);
        }
        out += &format!("{:>w$} +{}\n", "", "-".repeat(width), w = label_width);
        let lo = format!("{}", first);
        let hi = format!("{}", last);
        let gap = width.saturating_sub(lo.len() + hi.len());
        out += &format!("{:>w$}  {}{}{}  ({})", "", lo, " ".repeat(gap), hi, self.parameter, w = label_width);
        out
    }

}

/// Bundles an estimate and (optionally) the curve it was extracted from,
/// for printing or JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {

    pub estimate : Estimate,

    pub curve : Option<Curve>,

    #[serde(skip)]
    plot : Option<(usize, usize)>

}

impl Report {

    pub fn new(estimate : Estimate) -> Self {
        Report { estimate, curve : None, plot : None }
    }

    pub fn with_curve(mut self, curve : Curve) -> Self {
        self.curve = Some(curve);
        self
    }

    /// Render the curve as a text plot of the informed size when displaying.
    pub fn plot(mut self, width : usize, height : usize) -> Self {
        self.plot = Some((width, height));
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

}

impl Display for Report {

    fn fmt(&self, f : &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.estimate)?;
        if let (Some(curve), Some((width, height))) = (&self.curve, self.plot) {
            write!(f, "\n\n{} over {}:\n", curve.scale, curve.parameter)?;
            write!(f, "{}", curve.render(width, height, Some(self.estimate.numerical)))?;
        }
        Ok(())
    }

}

/// Tabulates the curve over the interval used by the estimate and bundles both.
pub fn likelihood_report<L>(
    lik : &L,
    sample : &Sample,
    estimate : Estimate,
    points : usize,
    scale : Scale
) -> anyhow::Result<Report>
where
    L : Likelihood
{
    let (lower, upper) = estimate.interval;
    let curve = Curve::evaluate(lik, sample, lower, upper, points, scale)?;
    Ok(Report::new(estimate).with_curve(curve))
}
