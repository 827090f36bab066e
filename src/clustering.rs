//! Jet clustering with the merge history kept for grooming
//!
//! Plain clustering runs through jetty and its steps are recorded into
//! a [ClusterTree]. Recombinations jetty cannot express, vetoes and
//! winner-take-all merging, go through [recluster].
use std::collections::HashMap;
use std::str::FromStr;

use jetty::distance::Distance;
use jetty::{anti_kt_f, cambridge_aachen_f, kt_f, ClusterHistory, ClusterStep, PseudoJet};
use log::{error, trace};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use thiserror::Error;

#[derive(
    Display,
    EnumIter,
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Debug,
    Deserialize,
    Serialize,
)]
pub enum JetAlgorithm {
    #[default]
    #[strum(to_string = "anti-kt")]
    AntiKt,
    #[strum(to_string = "kt")]
    Kt,
    #[strum(to_string = "Cambridge/Aachen")]
    CambridgeAachen,
}

impl JetAlgorithm {
    /// Step through the clustering of `partons` with radius `r`
    pub fn history<'a>(self, partons: Vec<PseudoJet>, r: f64) -> ClusterHistory<'a> {
        use JetAlgorithm::*;
        match self {
            AntiKt => ClusterHistory::new(partons, anti_kt_f(r)),
            Kt => ClusterHistory::new(partons, kt_f(r)),
            CambridgeAachen => ClusterHistory::new(partons, cambridge_aachen_f(r)),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown jet algorithm: {0}")]
pub struct UnknownJetAlgorithm(String);

impl FromStr for JetAlgorithm {
    type Err = UnknownJetAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anti-kt" | "antikt" | "anti_kt" => Ok(Self::AntiKt),
            "kt" => Ok(Self::Kt),
            "cambridge/aachen" | "cambridge-aachen" | "cambridge_aachen" | "ca" => {
                Ok(Self::CambridgeAachen)
            }
            _ => Err(UnknownJetAlgorithm(s.to_owned())),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct JetDefinition {
    pub algorithm: JetAlgorithm,
    pub radius: f64,
    pub min_pt: f64,
}

impl JetDefinition {
    pub fn new(algorithm: JetAlgorithm, radius: f64) -> Self {
        Self {
            algorithm,
            radius,
            min_pt: 0.,
        }
    }

    pub fn with_min_pt(self, min_pt: f64) -> Self {
        Self { min_pt, ..self }
    }
}

/// A pseudojet in the clustering history
#[derive(Copy, Clone, Debug, PartialEq)]
struct Node {
    p: PseudoJet,
    parents: Option<(usize, usize)>,
}

/// The clustering history of a set of input momenta
///
/// Nodes `0..n_inputs` are the inputs, every recombination appends a
/// new node. Jets are identified by their node index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterTree {
    nodes: Vec<Node>,
    n_inputs: usize,
    jets: Vec<usize>,
    discarded: Vec<usize>,
    min_pt: f64,
}

// inputs without transverse momentum have no direction and are never clustered
fn clusterable(p: &PseudoJet) -> bool {
    p.pt2() > 0.
}

impl ClusterTree {
    /// Cluster `partons` according to `jet_def`
    pub fn new(partons: &[PseudoJet], jet_def: &JetDefinition) -> Self {
        let mut tree = Self::with_inputs(partons, jet_def.min_pt);
        let active = partons.iter().copied().filter(clusterable).collect();
        tree.record(jet_def.algorithm.history(active, jet_def.radius));
        tree
    }

    fn with_inputs(partons: &[PseudoJet], min_pt: f64) -> Self {
        let nodes: Vec<_> = partons
            .iter()
            .map(|&p| Node { p, parents: None })
            .collect();
        Self {
            n_inputs: nodes.len(),
            nodes,
            min_pt,
            ..Default::default()
        }
    }

    fn record(&mut self, history: impl Iterator<Item = ClusterStep>) {
        // pseudojets are identified by their momentum, identical
        // inputs are told apart by taking them in turn
        let mut by_momentum: HashMap<PseudoJet, Vec<usize>> = HashMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if clusterable(&node.p) {
                by_momentum.entry(node.p).or_default().push(idx);
            }
        }
        fn take(map: &mut HashMap<PseudoJet, Vec<usize>>, p: &PseudoJet) -> Option<usize> {
            map.get_mut(p).and_then(|idx| idx.pop())
        }
        for step in history {
            match step {
                ClusterStep::Combine([p1, p2]) => {
                    let n1 = take(&mut by_momentum, &p1);
                    let n2 = take(&mut by_momentum, &p2);
                    let (Some(n1), Some(n2)) = (n1, n2) else {
                        error!("Lost track of pseudojets {p1:?} and {p2:?}");
                        continue;
                    };
                    let node = self.combine(n1, n2, p1 + p2);
                    by_momentum.entry(self.nodes[node].p).or_default().push(node);
                }
                ClusterStep::Jet(jet) => match take(&mut by_momentum, &jet) {
                    Some(node) => self.jets.push(node),
                    None => error!("Lost track of jet {jet:?}"),
                },
            }
        }
    }

    fn combine(&mut self, n1: usize, n2: usize, p: PseudoJet) -> usize {
        let parents = if self.nodes[n1].p.pt2() >= self.nodes[n2].p.pt2() {
            (n1, n2)
        } else {
            (n2, n1)
        };
        self.nodes.push(Node {
            p,
            parents: Some(parents),
        });
        self.nodes.len() - 1
    }

    /// Final jets above the minimum transverse momentum, hardest first
    pub fn jets(&self) -> Vec<usize> {
        let min_pt2 = self.min_pt * self.min_pt;
        let mut jets: Vec<_> = self
            .jets
            .iter()
            .copied()
            .filter(|&j| self.nodes[j].p.pt2() > min_pt2)
            .collect();
        jets.sort_by(|&a, &b| self.nodes[b].p.pt2().cmp(&self.nodes[a].p.pt2()));
        jets
    }

    /// The hardest jet
    pub fn leading_jet(&self) -> Option<usize> {
        self.jets().first().copied()
    }

    pub fn momentum(&self, node: usize) -> PseudoJet {
        self.nodes[node].p
    }

    /// The two pseudojets combined into `node`, harder first
    pub fn parents(&self, node: usize) -> Option<(usize, usize)> {
        self.nodes[node].parents
    }

    /// Indices of the inputs making up `node`
    pub fn constituent_indices(&self, node: usize) -> Vec<usize> {
        let mut res = Vec::new();
        let mut todo = vec![node];
        while let Some(n) = todo.pop() {
            match self.nodes[n].parents {
                Some((a, b)) => todo.extend([a, b]),
                None => res.push(n),
            }
        }
        res.sort_unstable();
        res
    }

    pub fn constituents(&self, node: usize) -> Vec<PseudoJet> {
        self.constituent_indices(node)
            .into_iter()
            .map(|i| self.nodes[i].p)
            .collect()
    }

    /// Pseudojets that were dropped by a veto
    pub fn discarded(&self) -> &[usize] {
        &self.discarded
    }

    /// The pseudojets present when exactly `n` of them were left
    ///
    /// Only meaningful if the clustering ends in a single jet without
    /// vetoes, e.g. for kt with a radius much larger than the event.
    pub fn exclusive_jets(&self, n: usize) -> Vec<usize> {
        let inputs = &self.nodes[..self.n_inputs];
        let n_active = inputs.iter().filter(|node| clusterable(&node.p)).count();
        let last = self.n_inputs + n_active.saturating_sub(n);
        let mut alive: Vec<_> = inputs.iter().map(|node| clusterable(&node.p)).collect();
        alive.resize(last, true);
        for node in &self.nodes[self.n_inputs..last] {
            if let Some((a, b)) = node.parents {
                alive[a] = false;
                alive[b] = false;
            }
        }
        (0..last).filter(|&i| alive[i]).collect()
    }
}

// bookkeeping for a pseudojet that is still being reclustered
#[derive(Copy, Clone, Debug)]
struct Slot {
    node: usize,
    p: PseudoJet,
    alive: bool,
    beam_dist: f64,
    nn: Option<usize>,
    nn_dist: f64,
}

impl Slot {
    fn new<D: Distance>(node: usize, p: PseudoJet, distance: &D) -> Self {
        Self {
            node,
            p,
            alive: true,
            beam_dist: distance.beam_distance(&p).into(),
            nn: None,
            nn_dist: f64::INFINITY,
        }
    }
}

fn find_nn<D: Distance>(slots: &mut [Slot], i: usize, distance: &D) {
    let mut nn = None;
    let mut nn_dist = f64::INFINITY;
    for (j, other) in slots.iter().enumerate() {
        if j == i || !other.alive {
            continue;
        }
        let d = f64::from(distance.distance(&slots[i].p, &other.p));
        if d < nn_dist {
            nn = Some(j);
            nn_dist = d;
        }
    }
    slots[i].nn = nn;
    slots[i].nn_dist = nn_dist;
}

/// Recluster with a custom recombination
///
/// `combine` returns the merged pseudojet for a pair about to be
/// recombined, or `None` to veto the recombination. A vetoed pair
/// loses its softer member, which ends up in
/// [discarded](ClusterTree::discarded).
pub fn recluster<D, F>(partons: &[PseudoJet], distance: D, mut combine: F) -> ClusterTree
where
    D: Distance,
    F: FnMut(&PseudoJet, &PseudoJet) -> Option<PseudoJet>,
{
    let mut tree = ClusterTree::with_inputs(partons, 0.);
    let mut slots: Vec<Slot> = partons
        .iter()
        .enumerate()
        .filter(|(_, p)| clusterable(p))
        .map(|(i, p)| Slot::new(i, *p, &distance))
        .collect();
    for i in 0..slots.len() {
        find_nn(&mut slots, i, &distance);
    }

    loop {
        let mut best: Option<(usize, f64)> = None;
        for (i, s) in slots.iter().enumerate() {
            if !s.alive {
                continue;
            }
            let d = s.nn_dist.min(s.beam_dist);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }
        let Some((i, _)) = best else {
            break;
        };

        let slot = slots[i];
        let partner = slot.nn.filter(|_| slot.nn_dist < slot.beam_dist);
        let changed = match partner {
            Some(j) => {
                let (pi, pj) = (slot.p, slots[j].p);
                match combine(&pi, &pj) {
                    Some(p) => {
                        let node = tree.combine(slot.node, slots[j].node, p);
                        slots[i] = Slot::new(node, p, &distance);
                        slots[j].alive = false;
                        [Some(i), Some(j)]
                    }
                    None => {
                        let soft = if pi.pt2() < pj.pt2() { i } else { j };
                        trace!("Discarding node {}", slots[soft].node);
                        tree.discarded.push(slots[soft].node);
                        slots[soft].alive = false;
                        [Some(soft), None]
                    }
                }
            }
            None => {
                tree.jets.push(slot.node);
                slots[i].alive = false;
                [Some(i), None]
            }
        };

        for k in 0..slots.len() {
            if !slots[k].alive {
                continue;
            }
            let stale = changed.contains(&Some(k)) || changed.contains(&slots[k].nn);
            if stale {
                find_nn(&mut slots, k, &distance);
            }
        }
        // a merged pseudojet may now be the nearest neighbour of others
        if let Some(m) = changed[0].filter(|&m| slots[m].alive) {
            for k in 0..slots.len() {
                if k == m || !slots[k].alive {
                    continue;
                }
                let d = f64::from(distance.distance(&slots[k].p, &slots[m].p));
                if d < slots[k].nn_dist {
                    slots[k].nn = Some(m);
                    slots[k].nn_dist = d;
                }
            }
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::massless;
    use approx::assert_relative_eq;
    use jetty::Cluster;
    use strum::IntoEnumIterator;

    // small deterministic generator for test events
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> f64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    fn event(seed: u64, n: usize) -> Vec<PseudoJet> {
        let mut rng = Lcg(seed);
        (0..n)
            .map(|_| {
                let pt = 1. + 100. * rng.next().powi(3);
                let y = 4. * rng.next() - 2.;
                let phi = std::f64::consts::TAU * rng.next() - std::f64::consts::PI;
                massless(pt, y, phi)
            })
            .collect()
    }

    fn total(p: impl IntoIterator<Item = PseudoJet>) -> PseudoJet {
        p.into_iter().fold(PseudoJet::new(), |acc, p| acc + p)
    }

    #[test]
    fn algorithm_names() {
        for algo in JetAlgorithm::iter() {
            assert_eq!(algo.to_string().parse::<JetAlgorithm>().unwrap(), algo);
        }
        assert!("siscone".parse::<JetAlgorithm>().is_err());
    }

    #[test]
    fn two_distant_particles() {
        let p = [massless(100., 0., 0.), massless(50., 0., 3.)];
        let tree = ClusterTree::new(&p, &JetDefinition::new(JetAlgorithm::AntiKt, 1.0));
        let jets = tree.jets();
        assert_eq!(jets.len(), 2);
        assert_relative_eq!(f64::from(tree.momentum(jets[0]).pt()), 100.);
        assert_eq!(tree.constituent_indices(jets[1]), [1]);
    }

    #[test]
    fn momentum_conservation() {
        // large enough for every clustering strategy jetty picks from
        for n in [10, 30, 60] {
            let p = event(7, n);
            let sum = total(p.iter().copied());
            for algo in JetAlgorithm::iter() {
                let tree = ClusterTree::new(&p, &JetDefinition::new(algo, 0.6));
                let jets = tree.jets();
                let jet_sum = total(jets.iter().map(|&j| tree.momentum(j)));
                for i in 0..4 {
                    assert_relative_eq!(
                        f64::from(jet_sum[i]),
                        f64::from(sum[i]),
                        epsilon = 1e-8,
                        max_relative = 1e-10
                    );
                }
                let mut all: Vec<_> =
                    jets.iter().flat_map(|&j| tree.constituent_indices(j)).collect();
                all.sort_unstable();
                assert_eq!(all, (0..p.len()).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn jets_match_plain_clustering() {
        for seed in [1, 2, 3] {
            let p = event(seed, 80);
            for algo in JetAlgorithm::iter() {
                let r = 0.8;
                let tree = ClusterTree::new(&p, &JetDefinition::new(algo, r).with_min_pt(10.));
                let ours: Vec<f64> = tree
                    .jets()
                    .iter()
                    .map(|&j| tree.momentum(j).pt().into())
                    .collect();

                let cut = |jet: PseudoJet| jet.pt2() > 100.;
                let pj = p.clone();
                let theirs = match algo {
                    JetAlgorithm::AntiKt => pj.cluster_if(anti_kt_f(r), cut),
                    JetAlgorithm::Kt => pj.cluster_if(kt_f(r), cut),
                    JetAlgorithm::CambridgeAachen => pj.cluster_if(cambridge_aachen_f(r), cut),
                };
                let mut theirs: Vec<f64> = theirs.iter().map(|j| f64::from(j.pt())).collect();
                theirs.sort_by(|a, b| b.total_cmp(a));

                assert_eq!(ours.len(), theirs.len(), "{algo}");
                for (a, b) in ours.iter().zip(&theirs) {
                    assert_relative_eq!(a, b, max_relative = 1e-12);
                }
            }
        }
    }

    #[test]
    fn identical_inputs() {
        let p = [massless(40., 0., 0.), massless(40., 0., 0.), PseudoJet::new()];
        let tree = ClusterTree::new(&p, &JetDefinition::new(JetAlgorithm::CambridgeAachen, 0.4));
        let jets = tree.jets();
        assert_eq!(jets.len(), 1);
        assert_eq!(tree.constituent_indices(jets[0]), [0, 1]);
        assert_relative_eq!(f64::from(tree.momentum(jets[0]).pt()), 80.);
    }

    #[test]
    fn recluster_plain_agrees() {
        let p = event(5, 40);
        let tree = ClusterTree::new(&p, &JetDefinition::new(JetAlgorithm::CambridgeAachen, 0.5));
        let re = recluster(&p, cambridge_aachen_f(0.5), |p1, p2| Some(*p1 + *p2));
        let pts = |t: &ClusterTree| -> Vec<f64> {
            t.jets().iter().map(|&j| t.momentum(j).pt().into()).collect()
        };
        let (a, b) = (pts(&tree), pts(&re));
        assert_eq!(a.len(), b.len());
        for (a, b) in a.iter().zip(&b) {
            assert_relative_eq!(a, b, max_relative = 1e-12);
        }
    }

    #[test]
    fn veto_discards_softer() {
        let p = [
            massless(100., 0., 0.),
            massless(1., 0.3, 0.),
            massless(80., 0., 0.5),
        ];
        let tree = recluster(&p, cambridge_aachen_f(1.0), |a, b| {
            (a.pt().min(b.pt()) >= 5.).then(|| *a + *b)
        });
        assert_eq!(tree.discarded(), [1]);
        let jets = tree.jets();
        assert_eq!(jets.len(), 1);
        assert_eq!(tree.constituent_indices(jets[0]), [0, 2]);
    }

    #[test]
    fn exclusive() {
        let p = event(11, 20);
        let tree = ClusterTree::new(&p, &JetDefinition::new(JetAlgorithm::Kt, 1000.));
        assert_eq!(tree.jets().len(), 1);
        for n in 1..=5 {
            let excl = tree.exclusive_jets(n);
            assert_eq!(excl.len(), n);
            let mut all: Vec<_> = excl.iter().flat_map(|&j| tree.constituent_indices(j)).collect();
            all.sort_unstable();
            assert_eq!(all, (0..p.len()).collect::<Vec<_>>());
        }
        assert_eq!(tree.exclusive_jets(30).len(), 20);
    }
}
