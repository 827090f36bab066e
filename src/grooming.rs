//! Large-radius jet grooming
//!
//! All groomers take the constituents of an ungroomed jet and return
//! the groomed jet together with its remaining constituents.
use log::trace;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use jetty::{cambridge_aachen_f, PseudoJet};

use crate::clustering::{recluster, ClusterTree, JetAlgorithm, JetDefinition};
use crate::kinematics::mass;

/// Large enough to recluster everything into a single jet
pub const RECLUSTER_RADIUS: f64 = 1000.;

#[derive(
    Display, EnumIter, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Deserialize, Serialize,
)]
pub enum GroomingVariant {
    #[strum(to_string = "Ungroomed jets")]
    Ungroomed,
    #[strum(to_string = "Trimmed jets")]
    Trimmed,
    #[strum(to_string = "Pruned jets")]
    Pruned,
    #[strum(to_string = "Soft Drop jets")]
    SoftDrop,
    #[strum(to_string = "Recursive Soft Drop jets")]
    RecursiveSoftDrop,
    #[strum(to_string = "Bottom-Up Soft Drop jets")]
    BottomUpSoftDrop,
    #[strum(to_string = "Tighter Bottom-Up Soft Drop jets")]
    BottomUpSoftDropTight,
}

impl GroomingVariant {
    /// Short tag used in histogram names
    pub fn tag(self) -> &'static str {
        use GroomingVariant::*;
        match self {
            Ungroomed => "Ungroomed",
            Trimmed => "Trimmed",
            Pruned => "Pruned",
            SoftDrop => "SD",
            RecursiveSoftDrop => "RSD",
            BottomUpSoftDrop => "BUSD",
            BottomUpSoftDropTight => "BUSDT",
        }
    }

    /// Description used in histogram titles
    pub fn title(self) -> &'static str {
        use GroomingVariant::*;
        match self {
            Ungroomed => "ungroomed",
            Trimmed => "trimmed",
            Pruned => "pruned",
            SoftDrop => "SD",
            RecursiveSoftDrop => "RSD",
            BottomUpSoftDrop => "BUSD",
            BottomUpSoftDropTight => "tight BUSD",
        }
    }
}

/// A large-radius jet with its constituents
#[derive(Clone, Debug, PartialEq)]
pub struct GroomedJet {
    pub variant: GroomingVariant,
    pub momentum: PseudoJet,
    pub constituents: Vec<PseudoJet>,
}

impl GroomedJet {
    pub fn from_tree(variant: GroomingVariant, tree: &ClusterTree, node: usize) -> Self {
        Self {
            variant,
            momentum: tree.momentum(node),
            constituents: tree.constituents(node),
        }
    }

    fn from_parts(variant: GroomingVariant, parts: &[(PseudoJet, Vec<PseudoJet>)]) -> Self {
        Self {
            variant,
            momentum: parts.iter().fold(PseudoJet::new(), |sum, (p, _)| sum + *p),
            constituents: parts.iter().flat_map(|(_, c)| c.iter().copied()).collect(),
        }
    }

    pub fn with_variant(self, variant: GroomingVariant) -> Self {
        Self { variant, ..self }
    }

    pub fn pt(&self) -> f64 {
        self.momentum.pt().into()
    }

    pub fn m(&self) -> f64 {
        mass(&self.momentum)
    }
}

pub trait Groomer {
    /// Groom a jet, `None` if nothing is left
    fn groom(&self, jet: &GroomedJet) -> Option<GroomedJet>;
}

impl<G: Groomer + ?Sized> Groomer for Box<G> {
    fn groom(&self, jet: &GroomedJet) -> Option<GroomedJet> {
        (**self).groom(jet)
    }
}

/// The SoftDrop condition for a pair of branches
fn passes_soft_drop(p1: &PseudoJet, p2: &PseudoJet, z_cut: f64, beta: f64, r0: f64) -> bool {
    let (pt1, pt2) = (f64::from(p1.pt()), f64::from(p2.pt()));
    let z = pt1.min(pt2) / (pt1 + pt2);
    z > z_cut * (f64::from(p1.delta_r(p2)) / r0).powf(beta)
}

fn recluster_ca(constituents: &[PseudoJet]) -> ClusterTree {
    ClusterTree::new(
        constituents,
        &JetDefinition::new(JetAlgorithm::CambridgeAachen, RECLUSTER_RADIUS),
    )
}

/// Keep kt subjets carrying at least a fraction `f_cut` of the jet pt
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Trimmer {
    pub r_sub: f64,
    pub f_cut: f64,
}

impl Default for Trimmer {
    fn default() -> Self {
        Self {
            r_sub: 0.2,
            f_cut: 0.05,
        }
    }
}

impl Groomer for Trimmer {
    fn groom(&self, jet: &GroomedJet) -> Option<GroomedJet> {
        let min_pt = self.f_cut * jet.pt();
        let def = JetDefinition::new(JetAlgorithm::Kt, self.r_sub).with_min_pt(min_pt);
        let tree = ClusterTree::new(&jet.constituents, &def);
        let kept: Vec<_> = tree
            .jets()
            .into_iter()
            .map(|j| (tree.momentum(j), tree.constituents(j)))
            .collect();
        trace!("Trimming keeps {} subjets", kept.len());
        if kept.is_empty() {
            return None;
        }
        Some(GroomedJet::from_parts(GroomingVariant::Trimmed, &kept))
    }
}

/// C/A reclustering that drops soft wide-angle recombinations
///
/// The reclustering radius defaults to [RECLUSTER_RADIUS], so that the
/// whole jet ends up in a single pruned jet.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pruner {
    pub radius: f64,
    pub z_cut: f64,
    pub r_cut_factor: f64,
}

impl Default for Pruner {
    fn default() -> Self {
        Self {
            radius: RECLUSTER_RADIUS,
            z_cut: 0.1,
            r_cut_factor: 0.5,
        }
    }
}

impl Groomer for Pruner {
    fn groom(&self, jet: &GroomedJet) -> Option<GroomedJet> {
        let r_cut = self.r_cut_factor * 2. * jet.m().max(0.) / jet.pt();
        let z_cut = self.z_cut;
        let distance = cambridge_aachen_f(self.radius);
        let tree = recluster(&jet.constituents, distance, |p1, p2| {
            let merged = *p1 + *p2;
            let z = f64::from(p1.pt().min(p2.pt()) / merged.pt());
            let pruned = z < z_cut && p1.delta_r(p2) > r_cut;
            (!pruned).then_some(merged)
        });
        let leading = tree.leading_jet()?;
        Some(GroomedJet::from_tree(GroomingVariant::Pruned, &tree, leading))
    }
}

/// Decluster until a splitting passes the SoftDrop condition
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SoftDrop {
    pub beta: f64,
    pub z_cut: f64,
    pub r0: f64,
}

impl Default for SoftDrop {
    fn default() -> Self {
        Self {
            beta: 0.,
            z_cut: 0.1,
            r0: 1.0,
        }
    }
}

impl Groomer for SoftDrop {
    fn groom(&self, jet: &GroomedJet) -> Option<GroomedJet> {
        let tree = recluster_ca(&jet.constituents);
        let mut node = tree.leading_jet()?;
        while let Some((harder, softer)) = tree.parents(node) {
            let (p1, p2) = (tree.momentum(harder), tree.momentum(softer));
            if passes_soft_drop(&p1, &p2, self.z_cut, self.beta, self.r0) {
                break;
            }
            node = harder;
        }
        Some(GroomedJet::from_tree(GroomingVariant::SoftDrop, &tree, node))
    }
}

/// SoftDrop applied recursively to both prongs, widest splitting first
///
/// Stops after `n` splittings have passed the condition, or never if
/// `n` is negative.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RecursiveSoftDrop {
    pub beta: f64,
    pub z_cut: f64,
    pub r0: f64,
    pub n: i32,
}

impl Default for RecursiveSoftDrop {
    fn default() -> Self {
        Self {
            beta: 0.,
            z_cut: 0.1,
            r0: 1.0,
            n: 3,
        }
    }
}

impl Groomer for RecursiveSoftDrop {
    fn groom(&self, jet: &GroomedJet) -> Option<GroomedJet> {
        let tree = recluster_ca(&jet.constituents);
        let mut prongs = vec![tree.leading_jet()?];
        let mut n_passed = 0;
        while self.n < 0 || n_passed < self.n {
            let widest = prongs
                .iter()
                .enumerate()
                .filter_map(|(pos, &node)| {
                    let (h, s) = tree.parents(node)?;
                    Some((pos, h, s, tree.momentum(h).delta_r(&tree.momentum(s))))
                })
                .max_by_key(|widest| widest.3);
            let Some((pos, harder, softer, _)) = widest else {
                break;
            };
            let (p1, p2) = (tree.momentum(harder), tree.momentum(softer));
            if passes_soft_drop(&p1, &p2, self.z_cut, self.beta, self.r0) {
                prongs[pos] = harder;
                prongs.push(softer);
                n_passed += 1;
            } else {
                prongs[pos] = harder;
            }
        }
        let parts: Vec<_> = prongs
            .into_iter()
            .map(|p| (tree.momentum(p), tree.constituents(p)))
            .collect();
        Some(GroomedJet::from_parts(GroomingVariant::RecursiveSoftDrop, &parts))
    }
}

/// C/A reclustering where recombinations failing the SoftDrop
/// condition drop the softer branch
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BottomUpSoftDrop {
    pub beta: f64,
    pub z_cut: f64,
    pub r0: f64,
}

impl BottomUpSoftDrop {
    pub fn tight() -> Self {
        Self {
            z_cut: 0.1,
            ..Default::default()
        }
    }
}

impl Default for BottomUpSoftDrop {
    fn default() -> Self {
        Self {
            beta: 1.,
            z_cut: 0.05,
            r0: 1.0,
        }
    }
}

impl Groomer for BottomUpSoftDrop {
    fn groom(&self, jet: &GroomedJet) -> Option<GroomedJet> {
        let distance = cambridge_aachen_f(RECLUSTER_RADIUS);
        let tree = recluster(&jet.constituents, distance, |p1, p2| {
            passes_soft_drop(p1, p2, self.z_cut, self.beta, self.r0).then(|| *p1 + *p2)
        });
        let leading = tree.leading_jet()?;
        Some(GroomedJet::from_tree(GroomingVariant::BottomUpSoftDrop, &tree, leading))
    }
}
