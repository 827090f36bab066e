use jetty::PseudoJet;

use crate::columns::{required, ColumnTable};
use crate::error::{Error, Result};
use crate::kinematics::{delta_r, from_pt_eta_phi_m};
use crate::step::kinematic_columns;

/// Pileup measures of an event
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PileupInfo {
    pub mu_average: f64,
    pub npv: u32,
}

/// A jet candidate
///
/// `jvf` is the jet vertex fraction, available for calorimeter jets
/// only.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Jet {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub m: f64,
    pub jvf: Option<f64>,
}

impl Jet {
    pub fn new(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        Self {
            pt,
            eta,
            phi,
            m,
            jvf: None,
        }
    }

    pub fn with_jvf(self, jvf: f64) -> Self {
        Self {
            jvf: Some(jvf),
            ..self
        }
    }

    pub fn delta_r(&self, other: &Jet) -> f64 {
        delta_r(self.eta, self.phi, other.eta, other.phi)
    }

    pub fn momentum(&self) -> PseudoJet {
        from_pt_eta_phi_m(self.pt, self.eta, self.phi, self.m)
    }
}

/// The first, i.e. hardest jet of a collection
pub fn leading(jets: &[Jet]) -> Option<&Jet> {
    jets.first()
}

/// Number of jets strictly above a transverse momentum threshold
pub fn count_above(jets: &[Jet], min_pt: f64) -> usize {
    jets.iter().filter(|j| j.pt > min_pt).count()
}

/// The `<prefix>_{pt,eta,phi,m}` columns of a jet or constituent collection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JetColumns {
    names: [String; 4],
    pt: Vec<Vec<f32>>,
    eta: Vec<Vec<f32>>,
    phi: Vec<Vec<f32>>,
    m: Vec<Vec<f32>>,
}

impl JetColumns {
    /// Take the columns of a collection, `None` if no active step reads it
    pub fn take(table: &mut ColumnTable, prefix: &str) -> Result<Option<Self>> {
        let names = kinematic_columns(prefix).map(|c| c.name);
        let Some(pt) = table.take_f32_vec(&names[0])? else {
            return Ok(None);
        };
        let [eta, phi, m] = [1, 2, 3].map(|i| table.take_f32_vec(&names[i]));
        Ok(Some(Self {
            pt,
            eta: required(&names[1], eta?)?,
            phi: required(&names[2], phi?)?,
            m: required(&names[3], m?)?,
            names,
        }))
    }

    /// The jets of event `idx`
    pub fn jets(&self, idx: usize) -> Result<Vec<Jet>> {
        let pt = &self.pt[idx];
        for (name, col) in self.names.iter().skip(1).zip([&self.eta, &self.phi, &self.m]) {
            if col[idx].len() != pt.len() {
                return Err(Error::ColumnLength {
                    column: name.clone(),
                    event: idx,
                });
            }
        }
        let jets = (0..pt.len())
            .map(|i| {
                Jet::new(
                    pt[i] as f64,
                    self.eta[idx][i] as f64,
                    self.phi[idx][i] as f64,
                    self.m[idx][i] as f64,
                )
            })
            .collect();
        Ok(jets)
    }

    /// The four-momenta of event `idx`
    pub fn momenta(&self, idx: usize) -> Result<Vec<PseudoJet>> {
        Ok(self.jets(idx)?.iter().map(Jet::momentum).collect())
    }
}
