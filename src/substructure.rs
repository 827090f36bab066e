//! Jet substructure observables
use jetty::{kt_f, PseudoJet};

use crate::clustering::recluster;
use crate::kinematics::wta_combine;

const EXCLUSIVE_RADIUS: f64 = 1000.;

fn angular_weights(constituents: &[PseudoJet], beta: f64) -> Vec<Vec<f64>> {
    let n = constituents.len();
    let mut dr = vec![vec![0.; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = f64::from(constituents[i].delta_r(&constituents[j])).powf(beta);
            dr[i][j] = d;
            dr[j][i] = d;
        }
    }
    dr
}

/// Energy correlation functions ECF1, ECF2, ECF3 with angular exponent `beta`
pub fn energy_correlators(constituents: &[PseudoJet], beta: f64) -> [f64; 3] {
    let pt: Vec<f64> = constituents.iter().map(|p| p.pt().into()).collect();
    let dr = angular_weights(constituents, beta);
    let n = pt.len();
    let ecf1 = pt.iter().sum();
    let mut ecf2 = 0.;
    let mut ecf3 = 0.;
    for i in 0..n {
        for j in (i + 1)..n {
            let pair = pt[i] * pt[j] * dr[i][j];
            ecf2 += pair;
            for k in (j + 1)..n {
                ecf3 += pair * pt[k] * dr[i][k] * dr[j][k];
            }
        }
    }
    [ecf1, ecf2, ecf3]
}

/// The D2 ratio ECF3 ECF1³ / ECF2³
///
/// Undefined if ECF2 vanishes, e.g. for a single constituent.
pub fn d2(constituents: &[PseudoJet], beta: f64) -> Option<f64> {
    let [ecf1, ecf2, ecf3] = energy_correlators(constituents, beta);
    if ecf2 <= 0. {
        return None;
    }
    Some(ecf3 * ecf1.powi(3) / ecf2.powi(3))
}

/// N-subjettiness with winner-take-all exclusive kt axes
///
/// Undefined if there are fewer than `n` constituents.
pub fn n_subjettiness(constituents: &[PseudoJet], n: usize, beta: f64, r0: f64) -> Option<f64> {
    if n == 0 || constituents.len() < n {
        return None;
    }
    let tree = recluster(constituents, kt_f(EXCLUSIVE_RADIUS), |p1, p2| {
        Some(wta_combine(p1, p2))
    });
    let axes: Vec<_> = tree
        .exclusive_jets(n)
        .into_iter()
        .map(|a| tree.momentum(a))
        .collect();
    let mut num = 0.;
    let mut den = 0.;
    for p in constituents {
        let pt = f64::from(p.pt());
        let dist = axes
            .iter()
            .map(|a| f64::from(p.delta_r(a)))
            .fold(f64::INFINITY, f64::min);
        num += pt * dist.powf(beta);
        den += pt * r0.powf(beta);
    }
    if den <= 0. {
        return None;
    }
    Some(num / den)
}

/// τ₃/τ₂, undefined for fewer than three constituents or vanishing τ₂
pub fn tau32(constituents: &[PseudoJet], beta: f64) -> Option<f64> {
    let tau2 = n_subjettiness(constituents, 2, beta, 1.)?;
    let tau3 = n_subjettiness(constituents, 3, beta, 1.)?;
    if tau2 <= 0. {
        return None;
    }
    Some(tau3 / tau2)
}
