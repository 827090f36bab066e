//! Analysis of pre-built R=0.4 jets
//!
//! Step 1 looks at the pileup conditions, step 2 at the leading
//! calorimeter and truth jets, step 3 at the pileup dependence of the
//! jet multiplicity, step 4 at the jet vertex fraction and track jets,
//! and step 5 at the response of jets matched to the leading truth jet.
use log::debug;

use crate::analysis::{Accumulator, Accumulators, EventSource, PileupRegime};
use crate::columns::{required, ColumnSource, ColumnTable};
use crate::error::{Error, Result};
use crate::event::{count_above, leading, Jet, JetColumns, PileupInfo};
use crate::histogram::{Axis, Hist1D, Hist2D, Histogram, Profile2D};
use crate::step::{kinematic_columns, required_columns, ColumnSpec, Step, StepSelection};

pub const RECO_JETS: &str = "RecoJets_R4";
pub const TRUTH_JETS: &str = "TruthJets_R4";
pub const TRACK_JETS: &str = "TrackJets_R4";
pub const RECO_JVF: &str = "RecoJets_R4_jvf";

/// Minimum pt for jets entering the multiplicity
pub const MULTIPLICITY_MIN_PT: f64 = 20e3;
/// Leading jet pt floors of the JVF distributions
pub const JVF_PT_FLOORS: [(f64, &str); 3] = [(20e3, "pt20"), (60e3, "pt60"), (100e3, "pt100")];
/// Minimum |JVF| for hard-scatter jets
pub const JVF_CUT: f64 = 0.5;
/// Maximum ΔR between matched jets
pub const MATCH_DR: f64 = 0.3;
/// Truth pt floors of the response distributions
pub const RESPONSE_PT_FLOORS: [(f64, &str); 3] =
    [(20e3, "pt20"), (100e3, "pt100"), (1000e3, "pt1000")];

pub fn steps() -> Vec<Step> {
    let mut step2 = vec![ColumnSpec::f32("EventWeight")];
    step2.extend(kinematic_columns(RECO_JETS));
    step2.extend(kinematic_columns(TRUTH_JETS));
    let mut step4 = vec![ColumnSpec::f32_vec(RECO_JVF)];
    step4.extend(kinematic_columns(TRACK_JETS));
    vec![
        Step::new(
            1,
            "event-level information",
            [ColumnSpec::f32("mu_average"), ColumnSpec::u32("NPV")],
        ),
        Step::new(2, "cluster and truth jets and the event weight", step2),
        Step::new(3, "pileup dependence", []),
        Step::new(4, "tracks and track jets", step4),
        Step::new(5, "jet response studies", []),
    ]
}

/// One event as seen by the R=0.4 jet analysis
///
/// Collections that were not read are empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpEvent {
    pub pileup: PileupInfo,
    pub weight: f64,
    pub reco: Vec<Jet>,
    pub truth: Vec<Jet>,
    pub track: Vec<Jet>,
}

/// The input columns of the active steps
#[derive(Clone, Debug)]
pub struct EventTable {
    n_events: usize,
    mu: Vec<f32>,
    npv: Vec<u32>,
    weight: Option<Vec<f32>>,
    reco: Option<JetColumns>,
    truth: Option<JetColumns>,
    jvf: Option<Vec<Vec<f32>>>,
    track: Option<JetColumns>,
}

impl EventTable {
    pub fn read<S: ColumnSource + ?Sized>(source: &S, selection: StepSelection) -> Result<Self> {
        let steps = steps();
        debug!(
            "Reading columns {:?}",
            required_columns(&steps, selection)
        );
        let mut columns = ColumnTable::read(source, &steps, selection)?;
        Ok(Self {
            n_events: columns.n_events(),
            mu: required("mu_average", columns.take_f32("mu_average")?)?,
            npv: required("NPV", columns.take_u32("NPV")?)?,
            weight: columns.take_f32("EventWeight")?,
            reco: JetColumns::take(&mut columns, RECO_JETS)?,
            truth: JetColumns::take(&mut columns, TRUTH_JETS)?,
            jvf: columns.take_f32_vec(RECO_JVF)?,
            track: JetColumns::take(&mut columns, TRACK_JETS)?,
        })
    }
}

impl EventSource for EventTable {
    type Event = ExpEvent;

    fn len(&self) -> usize {
        self.n_events
    }

    fn event(&self, idx: usize) -> Result<ExpEvent> {
        let mut event = ExpEvent {
            pileup: PileupInfo {
                mu_average: self.mu[idx] as f64,
                npv: self.npv[idx],
            },
            weight: self.weight.as_ref().map_or(1., |w| w[idx] as f64),
            ..Default::default()
        };
        if let Some(reco) = &self.reco {
            event.reco = reco.jets(idx)?;
        }
        if let Some(truth) = &self.truth {
            event.truth = truth.jets(idx)?;
        }
        if let Some(jvf) = &self.jvf {
            let jvf = &jvf[idx];
            if jvf.len() != event.reco.len() {
                return Err(Error::ColumnLength {
                    column: RECO_JVF.to_owned(),
                    event: idx,
                });
            }
            for (jet, jvf) in event.reco.iter_mut().zip(jvf) {
                jet.jvf = Some(*jvf as f64);
            }
        }
        if let Some(track) = &self.track {
            event.track = track.jets(idx)?;
        }
        Ok(event)
    }
}

/// ΔR between two leading jets and the pt response if they match
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Match {
    pub delta_r: f64,
    pub response: Option<f64>,
}

pub fn match_leading(truth: &Jet, other: &Jet) -> Match {
    let delta_r = truth.delta_r(other);
    let response = if delta_r < MATCH_DR {
        Some(other.pt / truth.pt)
    } else {
        None
    };
    Match { delta_r, response }
}

fn passes_jvf(jet: &Jet) -> bool {
    jet.jvf.map_or(false, |jvf| jvf.abs() > JVF_CUT)
}

const PT_BINS: (usize, f64, f64) = (199, 10e3, 2000e3);

fn pt_hist(name: &str, title: &str) -> Hist1D {
    let (n, min, max) = PT_BINS;
    Hist1D::new(name, title, n, min, max)
}

fn mu_npv_axes() -> (Axis, Axis) {
    (Axis::new(90, 0., 90.), Axis::new(60, 0., 60.))
}

/// Step 1: pileup conditions
pub struct EventInfo {
    mu: Hist1D,
    npv: Hist1D,
    mu_npv: Hist2D,
}

impl EventInfo {
    pub fn new() -> Self {
        let (x, y) = mu_npv_axes();
        Self {
            mu: Hist1D::new("Step1_mu", "#mu_{average}", 90, 0., 90.),
            npv: Hist1D::new("Step1_npv", "NPV", 60, 0., 60.),
            mu_npv: Hist2D::new(
                "Step1_mu_npv",
                "Correlation between #mu_{average} and NPV",
                x,
                y,
            ),
        }
    }
}

impl Default for EventInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<ExpEvent> for EventInfo {
    fn fill(&mut self, event: &ExpEvent) {
        let PileupInfo { mu_average, npv } = event.pileup;
        self.mu.fill(mu_average);
        self.npv.fill(npv as f64);
        self.mu_npv.fill(mu_average, npv as f64);
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        vec![self.mu.into(), self.npv.into(), self.mu_npv.into()]
    }
}

/// Step 2: leading calorimeter and truth jets
pub struct LeadingJets {
    reco_nw: Hist1D,
    reco: Hist1D,
    truth_nw: Hist1D,
    truth: Hist1D,
}

impl LeadingJets {
    pub fn new() -> Self {
        Self {
            reco_nw: pt_hist(
                "Step2_RecoJet_pt_noweight",
                "Leading R=0.4 cluster jet p_{T}, no weights",
            ),
            reco: pt_hist("Step2_RecoJet_pt", "Leading R=0.4 cluster jet p_{T}"),
            truth_nw: pt_hist(
                "Step2_TruthJet_pt_noweight",
                "Leading R=0.4 truth jet p_{T}",
            ),
            truth: pt_hist("Step2_TruthJet_pt", "Leading R=0.4 truth jet p_{T}"),
        }
    }
}

impl Default for LeadingJets {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<ExpEvent> for LeadingJets {
    fn fill(&mut self, event: &ExpEvent) {
        if let Some(jet) = leading(&event.reco) {
            self.reco_nw.fill(jet.pt);
            self.reco.fill_weighted(jet.pt, event.weight);
        }
        if let Some(jet) = leading(&event.truth) {
            self.truth_nw.fill(jet.pt);
            self.truth.fill_weighted(jet.pt, event.weight);
        }
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        vec![
            self.reco_nw.into(),
            self.reco.into(),
            self.truth_nw.into(),
            self.truth.into(),
        ]
    }
}

/// Jet multiplicity split by pileup regime and as a function of
/// (μ, NPV)
pub struct Multiplicity {
    by_regime: [Hist1D; 3],
    profile: Profile2D,
}

impl Multiplicity {
    /// `hist_prefix` is e.g. `Step3_RecoJet`, `kind` a description
    /// like `cluster`
    pub fn new(hist_prefix: &str, kind: &str) -> Self {
        let by_regime = PileupRegime::ALL.map(|regime| {
            Hist1D::new(
                format!("{hist_prefix}_njets_{}", regime.tag()),
                format!("Number of {kind} jets above 20 GeV, {}", regime.title()),
                15,
                0.,
                30.,
            )
        });
        let (x, y) = mu_npv_axes();
        let profile = Profile2D::new(
            format!("{hist_prefix}s_njets_2D"),
            format!("Average number of {kind} jets above 20 GeV, vs #mu_{{average}} and NPV"),
            x,
            y,
        );
        Self { by_regime, profile }
    }

    fn fill_jets(&mut self, jets: &[Jet], pileup: PileupInfo, weight: f64) {
        let n = count_above(jets, MULTIPLICITY_MIN_PT) as f64;
        if let Some(regime) = PileupRegime::classify(pileup.mu_average) {
            self.by_regime[regime.index()].fill_weighted(n, weight);
        }
        self.profile
            .fill(pileup.mu_average, pileup.npv as f64, n, weight);
    }

    fn into_histograms(self) -> impl Iterator<Item = Histogram> {
        self.by_regime
            .into_iter()
            .map(Histogram::from)
            .chain(std::iter::once(self.profile.into()))
    }
}

/// Step 3: pileup dependence of calorimeter and truth jet multiplicities
pub struct PileupDependence {
    reco: Multiplicity,
    truth: Multiplicity,
}

impl PileupDependence {
    pub fn new() -> Self {
        Self {
            reco: Multiplicity::new("Step3_RecoJet", "cluster"),
            truth: Multiplicity::new("Step3_TruthJet", "truth"),
        }
    }
}

impl Default for PileupDependence {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<ExpEvent> for PileupDependence {
    fn fill(&mut self, event: &ExpEvent) {
        self.reco.fill_jets(&event.reco, event.pileup, event.weight);
        self.truth.fill_jets(&event.truth, event.pileup, event.weight);
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        let Self { reco, truth } = *self;
        reco.into_histograms()
            .chain(truth.into_histograms())
            .collect()
    }
}

/// Step 4: jet vertex fraction and track jets
pub struct Tracking {
    jvf: [Hist1D; 3],
    pt_jvf: Hist1D,
    track_pt: Hist1D,
    track: Multiplicity,
}

impl Tracking {
    pub fn new() -> Self {
        let jvf = JVF_PT_FLOORS.map(|(floor, tag)| {
            Hist1D::new(
                format!("Step4_RecoJet_jvf_{tag}"),
                format!("Leading R=0.4 jet JVF, p_{{T}} > {} GeV", floor / 1e3),
                44,
                -1.1,
                1.1,
            )
        });
        Self {
            jvf,
            pt_jvf: pt_hist(
                "Step4_RecoJet_pt_jvf",
                "Leading R=0.4 cluster jet p_{T} after |JVF|>0.5",
            ),
            track_pt: pt_hist("Step4_TrackJet_pt", "Leading R=0.4 track jet p_{T}"),
            track: Multiplicity::new("Step4_TrackJet", "track"),
        }
    }
}

impl Default for Tracking {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<ExpEvent> for Tracking {
    fn fill(&mut self, event: &ExpEvent) {
        let w = event.weight;
        if let Some(jet) = leading(&event.reco) {
            if let Some(jvf) = jet.jvf {
                for ((floor, _), hist) in JVF_PT_FLOORS.iter().zip(self.jvf.iter_mut()) {
                    if jet.pt > *floor {
                        hist.fill_weighted(jvf, w);
                    }
                }
            }
            if passes_jvf(jet) {
                self.pt_jvf.fill_weighted(jet.pt, w);
            }
        }
        if let Some(jet) = leading(&event.track) {
            self.track_pt.fill_weighted(jet.pt, w);
        }
        self.track.fill_jets(&event.track, event.pileup, w);
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        let Self {
            jvf,
            pt_jvf,
            track_pt,
            track,
        } = *self;
        jvf.into_iter()
            .chain([pt_jvf, track_pt])
            .map(Histogram::from)
            .chain(track.into_histograms())
            .collect()
    }
}

fn response_hists(kind: &str, desc: &str) -> [Hist1D; 3] {
    RESPONSE_PT_FLOORS.map(|(floor, tag)| {
        Hist1D::new(
            format!("Step5_response_{kind}_{tag}"),
            format!(
                "{desc} jet p_{{T}} response, p_{{T}}^{{truth}} > {} GeV",
                floor / 1e3
            ),
            100,
            0.,
            2.,
        )
    })
}

fn fill_response(hists: &mut [Hist1D; 3], truth: &Jet, response: f64, weight: f64) {
    for ((floor, _), hist) in RESPONSE_PT_FLOORS.iter().zip(hists.iter_mut()) {
        if truth.pt > *floor {
            hist.fill_weighted(response, weight);
        }
    }
}

/// Step 5: matching to the leading truth jet and jet response
pub struct Response {
    dr_reco: Hist1D,
    dr_reco_jvf: Hist1D,
    dr_track: Hist1D,
    reco: [Hist1D; 3],
    track: [Hist1D; 3],
}

impl Response {
    pub fn new() -> Self {
        let dr = |name: &str, title: &str| Hist1D::new(name, title, 10, 0., 1.);
        Self {
            dr_reco: dr(
                "Step5_DRtruth_reco",
                "DR between leading truth and reco jet",
            ),
            dr_reco_jvf: dr(
                "Step5_DRtruth_reco_jvf",
                "DR between leading truth and reco jet, after |JVF| > 0.5",
            ),
            dr_track: dr(
                "Step5_DRtruth_track",
                "DR between leading truth and track jet",
            ),
            reco: response_hists("reco", "Cluster"),
            track: response_hists("track", "Track"),
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator<ExpEvent> for Response {
    fn fill(&mut self, event: &ExpEvent) {
        let Some(truth) = leading(&event.truth) else {
            return;
        };
        if let Some(reco) = leading(&event.reco) {
            let m = match_leading(truth, reco);
            self.dr_reco.fill(m.delta_r);
            if passes_jvf(reco) {
                self.dr_reco_jvf.fill(m.delta_r);
            }
            if let Some(response) = m.response {
                fill_response(&mut self.reco, truth, response, event.weight);
            }
        }
        if let Some(track) = leading(&event.track) {
            let m = match_leading(truth, track);
            self.dr_track.fill(m.delta_r);
            if let Some(response) = m.response {
                fill_response(&mut self.track, truth, response, event.weight);
            }
        }
    }

    fn into_histograms(self: Box<Self>) -> Vec<Histogram> {
        let Self {
            dr_reco,
            dr_reco_jvf,
            dr_track,
            reco,
            track,
        } = *self;
        [dr_reco, dr_reco_jvf, dr_track]
            .into_iter()
            .chain(reco)
            .chain(track)
            .map(Histogram::from)
            .collect()
    }
}

/// The accumulators of all active steps
pub fn accumulators(selection: StepSelection) -> Accumulators<ExpEvent> {
    let mut res: Accumulators<ExpEvent> = Vec::new();
    if selection.includes(1) {
        res.push(Box::new(EventInfo::new()));
    }
    if selection.includes(2) {
        res.push(Box::new(LeadingJets::new()));
    }
    if selection.includes(3) {
        res.push(Box::new(PileupDependence::new()));
    }
    if selection.includes(4) {
        res.push(Box::new(Tracking::new()));
    }
    if selection.includes(5) {
        res.push(Box::new(Response::new()));
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{Column, MemoryColumns};
    use approx::assert_relative_eq;

    fn event() -> ExpEvent {
        ExpEvent {
            pileup: PileupInfo {
                mu_average: 40.,
                npv: 20,
            },
            weight: 2.,
            ..Default::default()
        }
    }

    fn fill<A: Accumulator<ExpEvent>>(mut acc: A, events: &[ExpEvent]) -> Vec<Histogram> {
        for event in events {
            acc.fill(event);
        }
        Box::new(acc).into_histograms()
    }

    fn h1<'a>(hists: &'a [Histogram], name: &str) -> &'a Hist1D {
        match hists.iter().find(|h| h.name() == name) {
            Some(Histogram::H1(h)) => h,
            _ => panic!("no 1D histogram named {name}"),
        }
    }

    #[test]
    fn step_columns() {
        let steps = steps();
        let cols = required_columns(&steps, StepSelection::new(3).unwrap());
        assert_eq!(cols.len(), 11);
        assert!(!cols.contains(&RECO_JVF));
        let cols = required_columns(&steps, StepSelection::ALL);
        assert!(cols.contains(&"TrackJets_R4_m"));
    }

    #[test]
    fn multiplicity_by_regime() {
        let mut ev = event();
        ev.reco = vec![
            Jet::new(50e3, 0., 0., 0.),
            Jet::new(25e3, 1., 0., 0.),
            Jet::new(15e3, 2., 0., 0.),
        ];
        let hists = fill(PileupDependence::new(), &[ev]);
        assert_eq!(hists.len(), 8);
        let mid = h1(&hists, "Step3_RecoJet_njets_midmu");
        assert_eq!(mid.bin_content(mid.axis.find_bin(2.)), 2.);
        assert_eq!(h1(&hists, "Step3_RecoJet_njets_lowmu").entries(), 0);
        // no truth jets is a multiplicity of zero
        let truth = h1(&hists, "Step3_TruthJet_njets_midmu");
        assert_eq!(truth.bin_content(1), 2.);
        match hists.iter().find(|h| h.name() == "Step3_RecoJets_njets_2D") {
            Some(Histogram::P2(p)) => {
                let ix = p.x.find_bin(40.);
                let iy = p.y.find_bin(20.);
                assert_eq!(p.mean(ix, iy), Some(2.));
            }
            _ => panic!("missing profile"),
        }
    }

    #[test]
    fn cumulative_jvf_floors() {
        let mut ev = event();
        ev.reco = vec![Jet::new(70e3, 0., 0., 0.).with_jvf(0.3)];
        let hists = fill(Tracking::new(), &[ev.clone()]);
        assert_eq!(h1(&hists, "Step4_RecoJet_jvf_pt20").integral(), 2.);
        assert_eq!(h1(&hists, "Step4_RecoJet_jvf_pt60").integral(), 2.);
        assert_eq!(h1(&hists, "Step4_RecoJet_jvf_pt100").integral(), 0.);
        assert_eq!(h1(&hists, "Step4_RecoJet_pt_jvf").integral(), 0.);

        ev.reco[0].jvf = Some(-0.7);
        let hists = fill(Tracking::new(), &[ev]);
        assert_eq!(h1(&hists, "Step4_RecoJet_pt_jvf").integral(), 2.);
    }

    #[test]
    fn matched_response() {
        let mut ev = event();
        ev.truth = vec![Jet::new(50e3, 0., 0., 5e3)];
        ev.reco = vec![Jet::new(45e3, 0.05, 0.05, 4e3).with_jvf(0.9)];
        let hists = fill(Response::new(), &[ev]);

        let dr = h1(&hists, "Step5_DRtruth_reco");
        assert_eq!(dr.bin_content(1), 1.);
        assert_eq!(h1(&hists, "Step5_DRtruth_reco_jvf").bin_content(1), 1.);

        let response = h1(&hists, "Step5_response_reco_pt20");
        let bin = response.axis.find_bin(0.9);
        assert_relative_eq!(response.bin_content(bin), 2.);
        assert_eq!(h1(&hists, "Step5_response_reco_pt100").integral(), 0.);
        assert_eq!(h1(&hists, "Step5_response_track_pt20").integral(), 0.);
        assert_eq!(h1(&hists, "Step5_DRtruth_track").entries(), 0);
    }

    #[test]
    fn unmatched() {
        let mut ev = event();
        ev.truth = vec![Jet::new(150e3, 0., 0., 5e3)];
        ev.track = vec![Jet::new(100e3, 0.3, 0.2, 4e3)];
        let hists = fill(Response::new(), &[ev]);
        assert_eq!(h1(&hists, "Step5_DRtruth_track").bin_content(4), 1.);
        for tag in ["pt20", "pt100", "pt1000"] {
            let name = format!("Step5_response_track_{tag}");
            assert_eq!(h1(&hists, &name).entries(), 0);
        }
    }

    #[test]
    fn nested_response_floors() {
        let mut ev = event();
        ev.truth = vec![Jet::new(150e3, 0., 0., 0.)];
        ev.track = vec![Jet::new(120e3, 0.1, 0., 0.)];
        let hists = fill(Response::new(), &[ev]);
        assert_eq!(h1(&hists, "Step5_response_track_pt20").integral(), 2.);
        assert_eq!(h1(&hists, "Step5_response_track_pt100").integral(), 2.);
        assert_eq!(h1(&hists, "Step5_response_track_pt1000").integral(), 0.);
    }

    #[test]
    fn no_jets() {
        let hists = fill(LeadingJets::new(), &[event()]);
        assert!(hists.iter().all(|h| match h {
            Histogram::H1(h) => h.entries() == 0,
            _ => false,
        }));
        let hists = fill(Response::new(), &[event()]);
        assert_eq!(h1(&hists, "Step5_DRtruth_reco").entries(), 0);
    }

    #[test]
    fn matching_radius_is_exclusive() {
        let truth = Jet::new(50e3, 0., 0., 0.);
        let reco = Jet::new(45e3, 0.3, 0., 0.);
        let m = match_leading(&truth, &reco);
        assert_eq!(m.delta_r, MATCH_DR);
        assert!(m.response.is_none());

        let mut ev = event();
        ev.truth = vec![truth];
        ev.reco = vec![reco];
        let hists = fill(Response::new(), &[ev]);
        assert_eq!(h1(&hists, "Step5_DRtruth_reco").entries(), 1);
        for tag in ["pt20", "pt100", "pt1000"] {
            let name = format!("Step5_response_reco_{tag}");
            assert_eq!(h1(&hists, &name).entries(), 0);
        }
    }

    #[test]
    fn leading_jet_titles() {
        let hists = fill(LeadingJets::new(), &[]);
        let title = |name| h1(&hists, name).title.as_str();
        assert_eq!(
            title("Step2_RecoJet_pt_noweight"),
            "Leading R=0.4 cluster jet p_{T}, no weights"
        );
        assert_eq!(
            title("Step2_TruthJet_pt_noweight"),
            "Leading R=0.4 truth jet p_{T}"
        );
    }

    fn two_events() -> MemoryColumns {
        let jets = |pt: f32| Column::F32Vec(vec![vec![pt], vec![]]);
        let mut src = MemoryColumns::new()
            .with("mu_average", Column::F32(vec![30., 50.]))
            .with("NPV", Column::U32(vec![12, 25]))
            .with("EventWeight", Column::F32(vec![2., 3.]))
            .with(RECO_JVF, jets(0.8));
        for prefix in [RECO_JETS, TRUTH_JETS, TRACK_JETS] {
            for spec in kinematic_columns(prefix) {
                let value = if spec.name.ends_with("_pt") { 50e3 } else { 0. };
                src.insert(spec.name, jets(value));
            }
        }
        src
    }

    #[test]
    fn reads_follow_step_depth() {
        let src = two_events();

        let table = EventTable::read(&src, StepSelection::new(1).unwrap()).unwrap();
        assert_eq!(table.len(), 2);
        let ev = table.event(0).unwrap();
        assert_eq!(ev.pileup.npv, 12);
        assert_eq!(ev.weight, 1.);
        assert!(ev.reco.is_empty());

        let table = EventTable::read(&src, StepSelection::new(3).unwrap()).unwrap();
        let ev = table.event(0).unwrap();
        assert_eq!(ev.weight, 2.);
        assert_eq!(ev.reco.len(), 1);
        assert_eq!(ev.truth.len(), 1);
        assert_eq!(ev.reco[0].jvf, None);
        assert!(ev.track.is_empty());

        let table = EventTable::read(&src, StepSelection::ALL).unwrap();
        let ev = table.event(0).unwrap();
        assert_eq!(ev.reco[0].jvf, Some(0.8f32 as f64));
        assert_eq!(ev.track.len(), 1);
        assert!(table.event(1).unwrap().reco.is_empty());
    }

    #[test]
    fn shallow_reads_skip_missing_columns() {
        let mut src = two_events();
        src.remove(RECO_JVF);
        assert!(EventTable::read(&src, StepSelection::new(3).unwrap()).is_ok());
        match EventTable::read(&src, StepSelection::new(4).unwrap()) {
            Err(Error::MissingColumn(name)) => assert_eq!(name, RECO_JVF),
            other => panic!("unexpected result {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn phi_wraps_in_matching() {
        let truth = Jet::new(100e3, 0., std::f64::consts::PI - 0.05, 0.);
        let reco = Jet::new(95e3, 0., -std::f64::consts::PI + 0.05, 0.);
        let m = match_leading(&truth, &reco);
        assert_relative_eq!(m.delta_r, 0.1, epsilon = 1e-12);
        assert_relative_eq!(m.response.unwrap(), 0.95);
    }
}
