use jetty::PseudoJet;
use num_traits::{Float, FloatConst};

/// Difference in azimuth, mapped into (-π, π]
pub fn delta_phi<T: Float + FloatConst>(phi1: T, phi2: T) -> T {
    let pi = T::PI();
    let two_pi = pi + pi;
    let dphi = (phi1 - phi2) % two_pi;
    if dphi > pi {
        dphi - two_pi
    } else if dphi <= -pi {
        dphi + two_pi
    } else {
        dphi
    }
}

/// Angular distance in the (η, φ) or (y, φ) plane
pub fn delta_r<T: Float + FloatConst>(eta1: T, phi1: T, eta2: T, phi2: T) -> T {
    (eta1 - eta2).hypot(delta_phi(phi1, phi2))
}

pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> PseudoJet {
    let px = pt * phi.cos();
    let py = pt * phi.sin();
    let pz = pt * eta.sinh();
    let e = (px * px + py * py + pz * pz + m * m).sqrt();
    [e, px, py, pz].into()
}

/// A massless momentum with the given transverse momentum and direction
pub fn massless(pt: f64, y: f64, phi: f64) -> PseudoJet {
    [pt * y.cosh(), pt * phi.cos(), pt * phi.sin(), pt * y.sinh()].into()
}

/// Invariant mass, negative for space-like momenta
pub fn mass(p: &PseudoJet) -> f64 {
    let [e, px, py, pz]: [f64; 4] = [0, 1, 2, 3].map(|i| p[i].into());
    let m2 = e * e - px * px - py * py - pz * pz;
    m2.signum() * m2.abs().sqrt()
}

/// Winner-take-all combination: the harder direction with the summed
/// transverse momentum
pub fn wta_combine(p1: &PseudoJet, p2: &PseudoJet) -> PseudoJet {
    let harder = if p1.pt2() >= p2.pt2() { p1 } else { p2 };
    massless(
        f64::from(p1.pt() + p2.pt()),
        harder.rap().into(),
        harder.phi().into(),
    )
}
