//! Summary pages of the R=0.4 jet analysis
use crate::analysis::PileupRegime;
use crate::error::Result;
use crate::exp::{JVF_PT_FLOORS, RESPONSE_PT_FLOORS};
use crate::histogram::HistogramSet;
use crate::plot::{ColourMap, Curve, Page};
use crate::step::StepSelection;
use crate::style::{colour, fit_window, BLUE, GREEN, RED, VIOLET};

const MU_LABEL: &str = "Average number of interactions";
const NPV_LABEL: &str = "Number of primary vertices";
const PT_LABEL: &str = "Jet p_{T} [GeV]";
const EVENTS: &str = "Number of events";
const WEIGHTED_EVENTS: &str = "Weighted number of events";
const WEIGHTED_FRACTION: &str = "Weighted fraction of events";
const FRACTION: &str = "Fraction of events";
const LEADING_PT: &str = "Leading R=0.4 jet p_{T}";

/// All pages of the active steps
///
/// Fails on the first histogram that is missing from `hists`.
pub fn pages(hists: &HistogramSet, selection: StepSelection) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    if selection.includes(1) {
        pages.extend(event_info(hists)?);
    }
    if selection.includes(2) {
        pages.extend(leading_jets(hists)?);
    }
    if selection.includes(3) {
        pages.push(multiplicity(hists, "Step3_RecoJet", "cluster")?);
        pages.push(multiplicity(hists, "Step3_TruthJet", "truth")?);
        pages.push(multiplicity_profile(hists, "Step3_RecoJet")?);
        pages.push(multiplicity_profile(hists, "Step3_TruthJet")?);
    }
    if selection.includes(4) {
        pages.extend(tracking(hists)?);
    }
    if selection.includes(5) {
        pages.extend(response(hists)?);
    }
    Ok(pages)
}

fn event_info(hists: &HistogramSet) -> Result<Vec<Page>> {
    let mu = hists.h1("Step1_mu")?;
    let npv = hists.h1("Step1_npv")?;
    let mu_npv = hists.h2("Step1_mu_npv")?;
    Ok(vec![
        Page::single(mu, MU_LABEL, EVENTS),
        Page::single(npv, NPV_LABEL, EVENTS),
        Page::colour_map(
            "Number of events vs #mu_{average} and NPV",
            MU_LABEL,
            NPV_LABEL,
            ColourMap::from_hist(mu_npv),
        )
        .with_z_label(EVENTS),
    ])
}

fn truth_and_cluster(hists: &HistogramSet, suffix: &str) -> Result<Vec<Curve>> {
    let truth = hists.h1(&format!("Step2_TruthJet_pt{suffix}"))?;
    let reco = hists.h1(&format!("Step2_RecoJet_pt{suffix}"))?;
    Ok(vec![
        Curve::new(truth, RED).in_gev().labelled("Truth jet"),
        Curve::new(reco, BLUE).in_gev().labelled("Cluster jet"),
    ])
}

fn leading_jets(hists: &HistogramSet) -> Result<Vec<Page>> {
    let unweighted = truth_and_cluster(hists, "_noweight")?;
    let weighted = truth_and_cluster(hists, "")?;
    Ok(vec![
        Page::curves(
            "Leading R=0.4 jet p_{T}, no weights",
            PT_LABEL,
            EVENTS,
            unweighted,
        )
        .with_y_range(0., 4000.),
        Page::curves(LEADING_PT, PT_LABEL, WEIGHTED_EVENTS, weighted).log_log(),
    ])
}

/// Multiplicity per pileup regime
fn multiplicity(hists: &HistogramSet, prefix: &str, kind: &str) -> Result<Page> {
    let regimes = [
        (PileupRegime::High, RED, "#mu > 50"),
        (PileupRegime::Mid, BLUE, "35 < #mu < 45"),
        (PileupRegime::Low, GREEN, "#mu < 30"),
    ];
    let mut curves = Vec::with_capacity(regimes.len());
    for (regime, colour, label) in regimes {
        let hist = hists.h1(&format!("{prefix}_njets_{}", regime.tag()))?;
        curves.push(Curve::new(hist, colour).normalized().labelled(label));
    }
    Ok(Page::curves(
        format!("Number of {kind} jets with p_{{T}} > 20 GeV"),
        "Number of jets",
        WEIGHTED_FRACTION,
        curves,
    )
    .with_y_range(1e-3, 1.))
}

/// Average multiplicity as a function of (μ, NPV)
fn multiplicity_profile(hists: &HistogramSet, prefix: &str) -> Result<Page> {
    let profile = hists.p2(&format!("{prefix}s_njets_2D"))?;
    Ok(Page::colour_map(
        profile.title.clone(),
        MU_LABEL,
        NPV_LABEL,
        ColourMap::from_profile(profile).with_z_range(0., 80.),
    )
    .with_z_label("Average number of jets"))
}

fn tracking(hists: &HistogramSet) -> Result<Vec<Page>> {
    let mut jvf = Vec::with_capacity(JVF_PT_FLOORS.len());
    for (n, (floor, tag)) in JVF_PT_FLOORS.iter().enumerate() {
        let hist = hists.h1(&format!("Step4_RecoJet_jvf_{tag}"))?;
        jvf.push(
            Curve::new(hist, colour(n))
                .normalized()
                .labelled(format!("p_{{T}} > {} GeV", floor / 1e3)),
        );
    }
    let truth = hists.h1("Step2_TruthJet_pt")?;
    let reco = hists.h1("Step2_RecoJet_pt")?;
    let reco_jvf = hists.h1("Step4_RecoJet_pt_jvf")?;
    let track = hists.h1("Step4_TrackJet_pt")?;

    let truth = Curve::new(truth, RED).in_gev().labelled("Truth jet");
    let reco_jvf = Curve::new(reco_jvf, GREEN)
        .in_gev()
        .labelled("Cluster jet, |JVF|>0.5");

    let mut pages = vec![
        Page::curves(
            "Leading jet JVF distribution",
            "Jet vertex fraction",
            WEIGHTED_FRACTION,
            jvf,
        )
        .with_y_range(0., 0.4),
        Page::curves(
            LEADING_PT,
            PT_LABEL,
            WEIGHTED_EVENTS,
            vec![
                truth.clone(),
                Curve::new(reco, BLUE).in_gev().labelled("Cluster jet"),
                reco_jvf.clone(),
            ],
        )
        .log_log(),
    ];
    pages.push(multiplicity(hists, "Step4_TrackJet", "track")?);
    pages.push(multiplicity_profile(hists, "Step4_TrackJet")?);
    pages.push(
        Page::curves(
            LEADING_PT,
            PT_LABEL,
            WEIGHTED_EVENTS,
            vec![
                truth,
                reco_jvf,
                Curve::new(track, VIOLET).in_gev().labelled("Track jet"),
            ],
        )
        .log_log(),
    );
    Ok(pages)
}

fn response_curves(hists: &HistogramSet, kind: &str) -> Result<Vec<Curve>> {
    let mut curves = Vec::with_capacity(RESPONSE_PT_FLOORS.len());
    for (n, (floor, tag)) in RESPONSE_PT_FLOORS.iter().enumerate() {
        let name = format!("Step5_response_{kind}_{tag}");
        let mut curve = Curve::new(hists.h1(&name)?, colour(n))
            .normalized()
            .labelled(format!("p_{{T}}^{{truth}} > {} GeV", floor / 1e3));
        if let Some(window) = fit_window(&name) {
            curve = curve.fitted(window);
        }
        curves.push(curve);
    }
    Ok(curves)
}

fn response(hists: &HistogramSet) -> Result<Vec<Page>> {
    let dr = [
        ("Step5_DRtruth_reco", RED, "Cluster jets"),
        ("Step5_DRtruth_reco_jvf", GREEN, "Cluster jets, |JVF|>0.5"),
        ("Step5_DRtruth_track", VIOLET, "Track jets"),
    ];
    let mut dr_curves = Vec::with_capacity(dr.len());
    for (name, colour, label) in dr {
        dr_curves.push(Curve::new(hists.h1(name)?, colour).normalized().labelled(label));
    }
    let reco = response_curves(hists, "reco")?;
    let track = response_curves(hists, "track")?;
    Ok(vec![
        Page::curves(
            "Delta R from the leading truth jet, p_{T}^{truth} > 20 GeV",
            "Delta R",
            FRACTION,
            dr_curves,
        )
        .with_y_range(0., 1.),
        Page::curves(
            "Cluster jet p_{T} response, p_{T}^{cluster}/p_{T}^{truth}",
            "Jet response",
            WEIGHTED_FRACTION,
            reco,
        )
        .with_y_range(0., 0.25),
        Page::curves(
            "Track jet p_{T} response, p_{T}^{track}/p_{T}^{truth}",
            "Jet response",
            WEIGHTED_FRACTION,
            track,
        )
        .with_y_range(0., 0.25),
    ])
}
