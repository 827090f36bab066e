//! Gaussian χ² fits of histogram peaks
use argmin::core::{CostFunction, Executor, State};
use argmin::solver::neldermead::NelderMead;
use log::{debug, warn};

use crate::histogram::Hist1D;

const MIN_BINS: usize = 3;
const MAX_ITERS: u64 = 1000;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GaussianFit {
    pub amplitude: f64,
    pub mean: f64,
    pub sigma: f64,
    pub chi2: f64,
    pub ndf: usize,
}

impl GaussianFit {
    pub fn eval(&self, x: f64) -> f64 {
        gaussian(&[self.amplitude, self.mean, self.sigma], x)
    }

    /// Relative width σ/μ
    pub fn resolution(&self) -> f64 {
        self.sigma.abs() / self.mean
    }
}

fn gaussian(par: &[f64], x: f64) -> f64 {
    let t = (x - par[1]) / par[2];
    par[0] * (-0.5 * t * t).exp()
}

struct Chi2 {
    // (centre, content, error)
    points: Vec<(f64, f64, f64)>,
}

impl CostFunction for Chi2 {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, par: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        if par[2] == 0. {
            return Ok(f64::INFINITY);
        }
        let chi2 = self
            .points
            .iter()
            .map(|&(x, y, err)| {
                let d = (y - gaussian(par, x)) / err;
                d * d
            })
            .sum();
        Ok(chi2)
    }
}

/// Fit a Gaussian to the bins of `hist` with centres inside `[min, max]`
///
/// Bins with zero error are ignored. Returns `None` if fewer than three
/// bins are usable or the minimisation fails.
pub fn fit_gaussian(hist: &Hist1D, min: f64, max: f64) -> Option<GaussianFit> {
    let axis = &hist.axis;
    let points: Vec<_> = (1..=axis.n_bins)
        .map(|bin| (axis.centre(bin), hist.bin_content(bin), hist.bin_error(bin)))
        .filter(|&(x, _, err)| x >= min && x <= max && err > 0.)
        .collect();
    if points.len() < MIN_BINS {
        warn!(
            "Not enough bins to fit {} in [{min}, {max}]: {}",
            hist.name,
            points.len()
        );
        return None;
    }
    let seed = seed(&points);
    debug!("Fitting {} with seed {seed:?}", hist.name);
    let simplex = simplex(&seed);
    let ndf = points.len() - seed.len();
    let solver = NelderMead::new(simplex);
    let res = Executor::new(Chi2 { points }, solver)
        .configure(|state| state.max_iters(MAX_ITERS))
        .run();
    let res = match res {
        Ok(res) => res,
        Err(err) => {
            warn!("Failed to fit {}: {err}", hist.name);
            return None;
        }
    };
    let state = res.state();
    let par = state.get_best_param()?;
    let fit = GaussianFit {
        amplitude: par[0],
        mean: par[1],
        sigma: par[2].abs(),
        chi2: state.get_best_cost(),
        ndf,
    };
    debug!("Fit result for {}: {fit:?}", hist.name);
    Some(fit)
}

fn seed(points: &[(f64, f64, f64)]) -> Vec<f64> {
    let sum: f64 = points.iter().map(|p| p.1).sum();
    let amplitude = points.iter().map(|p| p.1).fold(f64::MIN, f64::max);
    if sum <= 0. {
        let centre = (points[0].0 + points[points.len() - 1].0) / 2.;
        return vec![amplitude, centre, points[points.len() - 1].0 - points[0].0];
    }
    let mean = points.iter().map(|p| p.0 * p.1).sum::<f64>() / sum;
    let var = points.iter().map(|p| (p.0 - mean).powi(2) * p.1).sum::<f64>() / sum;
    let width = points[1].0 - points[0].0;
    vec![amplitude, mean, var.sqrt().max(width)]
}

fn simplex(seed: &[f64]) -> Vec<Vec<f64>> {
    let sigma = seed[2];
    let steps = [0.1 * seed[0].abs().max(1e-3), 0.2 * sigma, 0.2 * sigma];
    let mut simplex = vec![seed.to_vec()];
    for (i, step) in steps.into_iter().enumerate() {
        let mut vertex = seed.to_vec();
        vertex[i] += step;
        simplex.push(vertex);
    }
    simplex
}
