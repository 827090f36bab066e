//! Analysis of large-radius R=1.0 jets
//!
//! Pre-built ungroomed and trimmed jets are compared with jets
//! clustered from the calorimeter clusters (or truth particles), which
//! are then groomed in several ways and characterised by their
//! substructure.
use log::{debug, trace};
use strum::IntoEnumIterator;

use crate::analysis::{Accumulator, Accumulators, EventSource};
use jetty::PseudoJet;

use crate::clustering::{ClusterTree, JetAlgorithm, JetDefinition};
use crate::columns::{required, ColumnSource, ColumnTable};
use crate::config::GroomingConfig;
use crate::error::{Error, Result};
use crate::event::{JetColumns, PileupInfo};
use crate::grooming::{GroomedJet, Groomer, GroomingVariant};
use crate::histogram::{Hist1D, Histogram};
use crate::step::{kinematic_columns, required_columns, ColumnSpec, Step, StepSelection};
use crate::substructure::{d2, tau32};

/// Minimum pt of jets entering mass and substructure distributions
pub const HIGH_PT: f64 = 400e3;

/// Whether to run on calorimeter or truth level inputs
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Level {
    #[default]
    Reco,
    Truth,
}

impl Level {
    pub fn jet_prefix(self) -> &'static str {
        match self {
            Level::Reco => "RecoJets_R10",
            Level::Truth => "TruthJets_R10",
        }
    }

    pub fn constituent_prefix(self) -> &'static str {
        match self {
            Level::Reco => "Clusters",
            Level::Truth => "Particles",
        }
    }

    fn jet_columns(self) -> [String; 4] {
        let prefix = self.jet_prefix();
        [
            format!("{prefix}_pt"),
            format!("{prefix}_m"),
            format!("{prefix}_Trimmed_pt"),
            format!("{prefix}_Trimmed_m"),
        ]
    }
}

pub fn steps(level: Level) -> Vec<Step> {
    let mut step2 = vec![ColumnSpec::f32("EventWeight")];
    step2.extend(level.jet_columns().map(ColumnSpec::f32_vec));
    vec![
        Step::new(
            1,
            "event-level information",
            [ColumnSpec::f32("mu_average"), ColumnSpec::u32("NPV")],
        ),
        Step::new(2, "existing jets and the event weight", step2),
        Step::new(
            3,
            "building our own R=1.0 jets from topoclusters",
            kinematic_columns(level.constituent_prefix()),
        ),
        Step::new(
            4,
            "building other types of R=1.0 jets from topoclusters",
            [],
        ),
        Step::new(5, "calculating substructure variables for R=1.0 jets", []),
    ]
}

/// Transverse momentum and mass of a pre-built jet
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PrebuiltJet {
    pub pt: f64,
    pub m: f64,
}

/// One event as seen by the large-radius jet analysis
///
/// `jets` holds the leading jet we clustered ourselves followed by its
/// groomed versions, as far as the active steps require them. It is
/// empty if clustering produced no jet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroomEvent {
    pub pileup: PileupInfo,
    pub weight: f64,
    pub ungroomed: Vec<PrebuiltJet>,
    pub trimmed: Vec<PrebuiltJet>,
    pub jets: Vec<GroomedJet>,
}

impl GroomEvent {
    pub fn jet(&self, variant: GroomingVariant) -> Option<&GroomedJet> {
        self.jets.iter().find(|j| j.variant == variant)
    }
}

#[derive(Clone, Debug, Default)]
struct PrebuiltColumns {
    pt: Vec<Vec<f32>>,
    m: Vec<Vec<f32>>,
}

impl PrebuiltColumns {
    fn take(table: &mut ColumnTable, pt: &str, m: &str) -> Result<Option<Self>> {
        let Some(pt) = table.take_f32_vec(pt)? else {
            return Ok(None);
        };
        let m = required(m, table.take_f32_vec(m)?)?;
        Ok(Some(Self { pt, m }))
    }

    fn jets(&self, idx: usize, m_name: &str) -> Result<Vec<PrebuiltJet>> {
        let (pt, m) = (&self.pt[idx], &self.m[idx]);
        if pt.len() != m.len() {
            return Err(Error::ColumnLength {
                column: m_name.to_owned(),
                event: idx,
            });
        }
        Ok(pt
            .iter()
            .zip(m)
            .map(|(&pt, &m)| PrebuiltJet {
                pt: pt as f64,
                m: m as f64,
            })
            .collect())
    }
}

/// The input columns of the active steps together with the tools to
/// build and groom our own jets
pub struct EventTable {
    n_events: usize,
    selection: StepSelection,
    level: Level,
    mu: Vec<f32>,
    npv: Vec<u32>,
    weight: Option<Vec<f32>>,
    ungroomed: Option<PrebuiltColumns>,
    trimmed: Option<PrebuiltColumns>,
    constituents: Option<JetColumns>,
    jet_def: JetDefinition,
    trimmer: Box<dyn Groomer>,
    groomers: Vec<(GroomingVariant, Box<dyn Groomer>)>,
}

impl EventTable {
    pub fn read<S: ColumnSource + ?Sized>(
        source: &S,
        selection: StepSelection,
        level: Level,
        config: &GroomingConfig,
    ) -> Result<Self> {
        let steps = steps(level);
        debug!(
            "Reading columns {:?}",
            required_columns(&steps, selection)
        );
        let mut columns = ColumnTable::read(source, &steps, selection)?;
        let [pt, m, trimmed_pt, trimmed_m] = level.jet_columns();
        Ok(Self {
            n_events: columns.n_events(),
            selection,
            level,
            mu: required("mu_average", columns.take_f32("mu_average")?)?,
            npv: required("NPV", columns.take_u32("NPV")?)?,
            weight: columns.take_f32("EventWeight")?,
            ungroomed: PrebuiltColumns::take(&mut columns, &pt, &m)?,
            trimmed: PrebuiltColumns::take(&mut columns, &trimmed_pt, &trimmed_m)?,
            constituents: JetColumns::take(&mut columns, level.constituent_prefix())?,
            jet_def: JetDefinition::new(JetAlgorithm::AntiKt, config.radius),
            trimmer: Box::new(config.trimming),
            groomers: config.groomers(),
        })
    }

    /// Our own leading jet with its groomed versions
    fn build_jets(&self, constituents: &[PseudoJet]) -> Vec<GroomedJet> {
        let tree = ClusterTree::new(constituents, &self.jet_def);
        let Some(leading) = tree.leading_jet() else {
            trace!("No jet clustered");
            return Vec::new();
        };
        let ungroomed = GroomedJet::from_tree(GroomingVariant::Ungroomed, &tree, leading);
        let mut jets = Vec::with_capacity(2 + self.groomers.len());
        if let Some(trimmed) = self.trimmer.groom(&ungroomed) {
            jets.push(trimmed.with_variant(GroomingVariant::Trimmed));
        }
        if self.selection.includes(4) {
            for (variant, groomer) in &self.groomers {
                if let Some(groomed) = groomer.groom(&ungroomed) {
                    jets.push(groomed.with_variant(*variant));
                }
            }
        }
        jets.insert(0, ungroomed);
        jets
    }
}

impl EventSource for EventTable {
    type Event = GroomEvent;

    fn len(&self) -> usize {
        self.n_events
    }

    fn event(&self, idx: usize) -> Result<GroomEvent> {
        let mut event = GroomEvent {
            pileup: PileupInfo {
                mu_average: self.mu[idx] as f64,
                npv: self.npv[idx],
            },
            weight: self.weight.as_ref().map_or(1., |w| w[idx] as f64),
            ..Default::default()
        };
        let [_, m, _, trimmed_m] = self.level.jet_columns();
        if let Some(ungroomed) = &self.ungroomed {
            event.ungroomed = ungroomed.jets(idx, &m)?;
        }
        if let Some(trimmed) = &self.trimmed {
            event.trimmed = trimmed.jets(idx, &trimmed_m)?;
        }
        if let Some(constituents) = &self.constituents {
            let constituents = constituents.momenta(idx)?;
            event.jets = self.build_jets(&constituents);
        }
        Ok(event)
    }
}

fn pt_hist(name: impl Into<String>, title: impl Into<String>) -> Hist1D {
    Hist1D::new(name, title, 215, 50e3, 2200e3)
}

fn mass_hist(name: impl Into<String>, title: impl Into<String>) -> Hist1D {
    Hist1D::new(name, title, 99, 10e3, 1000e3)
}

/// Step 1: pileup conditions
pub struct EventInfo {
    mu: Hist1D,
    npv: Hist1D,
}

impl EventInfo {
    pub fn new() -> Self {
        Self {
            mu: Hist1D::new("Step1_mu", "#mu_{average}", 100, 0., 100.),
            npv: Hist1D::new("Step1_npv", "NPV", 50, 0., 50.),
        }
    }
}

impl Default for EventInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<GroomEvent> for EventInfo {
    fn fill(&mut self, event: &GroomEvent) {
        self.mu.fill(event.pileup.mu_average);
        self.npv.fill(event.pileup.npv as f64);
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        let Self { mu, npv } = *self;
        vec![mu.into(), npv.into()]
    }
}

/// Step 2: pre-built ungroomed and trimmed jets
pub struct PrebuiltJets {
    ungroomed_pt_nw: Hist1D,
    ungroomed_pt: Hist1D,
    trimmed_pt: Hist1D,
    ungroomed_m: Hist1D,
    trimmed_m: Hist1D,
}

impl PrebuiltJets {
    pub fn new() -> Self {
        Self {
            ungroomed_pt_nw: pt_hist(
                "Step2_UngroomPt_noweight",
                "Leading ungroomed R=1.0 jet p_{T}, no weights",
            ),
            ungroomed_pt: pt_hist("Step2_UngroomPt", "Leading ungroomed R=1.0 jet p_{T}"),
            trimmed_pt: pt_hist("Step2_TrimmedPt", "Leading trimmed R=1.0 jet p_{T}"),
            ungroomed_m: mass_hist("Step2_UngroomMass", "Leading ungroomed R=1.0 jet mass"),
            trimmed_m: mass_hist("Step2_TrimmedMass", "Leading trimmed R=1.0 jet mass"),
        }
    }
}

impl Default for PrebuiltJets {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<GroomEvent> for PrebuiltJets {
    fn fill(&mut self, event: &GroomEvent) {
        let w = event.weight;
        if let Some(jet) = event.ungroomed.first() {
            self.ungroomed_pt_nw.fill(jet.pt);
            self.ungroomed_pt.fill_weighted(jet.pt, w);
            if jet.pt > HIGH_PT {
                self.ungroomed_m.fill_weighted(jet.m, w);
            }
        }
        if let Some(jet) = event.trimmed.first() {
            self.trimmed_pt.fill_weighted(jet.pt, w);
            if jet.pt > HIGH_PT {
                self.trimmed_m.fill_weighted(jet.m, w);
            }
        }
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        let Self {
            ungroomed_pt_nw,
            ungroomed_pt,
            trimmed_pt,
            ungroomed_m,
            trimmed_m,
        } = *self;
        [ungroomed_pt_nw, ungroomed_pt, trimmed_pt, ungroomed_m, trimmed_m]
            .into_iter()
            .map(Histogram::from)
            .collect()
    }
}

/// Step 3: our own ungroomed and trimmed jets
pub struct OwnJets {
    ungroomed_pt_nw: Hist1D,
    ungroomed_pt: Hist1D,
    trimmed_pt_nw: Hist1D,
    trimmed_pt: Hist1D,
}

impl OwnJets {
    pub fn new() -> Self {
        Self {
            ungroomed_pt_nw: pt_hist(
                "Step3_MyUngroomPt_noweight",
                "My leading ungroomed R=1.0 jet p_{T}, no weights",
            ),
            ungroomed_pt: pt_hist("Step3_MyUngroomPt", "My leading ungroomed R=1.0 jet p_{T}"),
            trimmed_pt_nw: pt_hist(
                "Step3_MyTrimmedPt_noweight",
                "My leading trimmed R=1.0 jet p_{T}, no weights",
            ),
            trimmed_pt: pt_hist("Step3_MyTrimmedPt", "My leading trimmed R=1.0 jet p_{T}"),
        }
    }
}

impl Default for OwnJets {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<GroomEvent> for OwnJets {
    fn fill(&mut self, event: &GroomEvent) {
        let w = event.weight;
        if let Some(jet) = event.jet(GroomingVariant::Ungroomed) {
            self.ungroomed_pt_nw.fill(jet.pt());
            self.ungroomed_pt.fill_weighted(jet.pt(), w);
        }
        if let Some(jet) = event.jet(GroomingVariant::Trimmed) {
            self.trimmed_pt_nw.fill(jet.pt());
            self.trimmed_pt.fill_weighted(jet.pt(), w);
        }
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        let Self {
            ungroomed_pt_nw,
            ungroomed_pt,
            trimmed_pt_nw,
            trimmed_pt,
        } = *self;
        [ungroomed_pt_nw, ungroomed_pt, trimmed_pt_nw, trimmed_pt]
            .into_iter()
            .map(Histogram::from)
            .collect()
    }
}

/// The variants groomed in step 4
pub const GROOMED: [GroomingVariant; 5] = [
    GroomingVariant::Pruned,
    GroomingVariant::SoftDrop,
    GroomingVariant::RecursiveSoftDrop,
    GroomingVariant::BottomUpSoftDrop,
    GroomingVariant::BottomUpSoftDropTight,
];

/// Step 4: groomed versions of our own jets
pub struct GroomedJets {
    hists: Vec<(GroomingVariant, Hist1D, Hist1D)>,
}

impl GroomedJets {
    pub fn new() -> Self {
        let hists = GROOMED
            .into_iter()
            .map(|variant| {
                let (tag, title) = (variant.tag(), variant.title());
                let pt = pt_hist(
                    format!("Step4_My{tag}Pt"),
                    format!("My leading {title} R=1.0 jet p_{{T}}"),
                );
                let name = format!("Step4_My{tag}Mass");
                let title = format!("My leading {title} R=1.0 jet mass");
                let m = if variant == GroomingVariant::Pruned {
                    Hist1D::new(name, title, 215, 10e3, 1000e3)
                } else {
                    mass_hist(name, title)
                };
                (variant, pt, m)
            })
            .collect();
        Self { hists }
    }
}

impl Default for GroomedJets {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<GroomEvent> for GroomedJets {
    fn fill(&mut self, event: &GroomEvent) {
        for (variant, pt, m) in self.hists.iter_mut() {
            if let Some(jet) = event.jet(*variant) {
                pt.fill_weighted(jet.pt(), event.weight);
                if jet.pt() > HIGH_PT {
                    m.fill_weighted(jet.m(), event.weight);
                }
            }
        }
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        self.hists
            .into_iter()
            .flat_map(|(_, pt, m)| [pt.into(), m.into()])
            .collect()
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Step 5: substructure of all jet variants
pub struct Substructure {
    beta: f64,
    hists: Vec<(GroomingVariant, Hist1D, Hist1D)>,
}

impl Substructure {
    pub fn new(beta: f64) -> Self {
        let hists = GroomingVariant::iter()
            .map(|variant| {
                let (tag, title) = (variant.tag(), capitalise(variant.title()));
                let d2 = Hist1D::new(
                    format!("Step5_{tag}_D2"),
                    format!("{title} R=1.0 jet D_{{2}}^{{#beta={beta}}}"),
                    20,
                    0.,
                    5.,
                );
                let tau32 = Hist1D::new(
                    format!("Step5_{tag}_Tau32"),
                    format!("{title} R=1.0 jet #tau_{{32}}^{{WTA}}"),
                    20,
                    0.,
                    1.,
                );
                (variant, d2, tau32)
            })
            .collect();
        Self { beta, hists }
    }
}

impl Accumulator<GroomEvent> for Substructure {
    fn fill(&mut self, event: &GroomEvent) {
        for (variant, d2_hist, tau32_hist) in self.hists.iter_mut() {
            let Some(jet) = event.jet(*variant) else {
                continue;
            };
            if jet.pt() <= HIGH_PT {
                continue;
            }
            if let Some(d2) = d2(&jet.constituents, self.beta) {
                d2_hist.fill_weighted(d2, event.weight);
            }
            if let Some(tau32) = tau32(&jet.constituents, self.beta) {
                tau32_hist.fill_weighted(tau32, event.weight);
            }
        }
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        self.hists
            .into_iter()
            .flat_map(|(_, d2, tau32)| [d2.into(), tau32.into()])
            .collect()
    }
}

/// The accumulators of all active steps
pub fn accumulators(selection: StepSelection, config: &GroomingConfig) -> Accumulators<GroomEvent> {
    let mut res: Accumulators<GroomEvent> = Vec::new();
    if selection.includes(1) {
        res.push(Box::new(EventInfo::new()));
    }
    if selection.includes(2) {
        res.push(Box::new(PrebuiltJets::new()));
    }
    if selection.includes(3) {
        res.push(Box::new(OwnJets::new()));
    }
    if selection.includes(4) {
        res.push(Box::new(GroomedJets::new()));
    }
    if selection.includes(5) {
        res.push(Box::new(Substructure::new(config.substructure.beta)));
    }
    res
}
