//! Summary pages of the R=1.0 jet grooming analysis
use strum::IntoEnumIterator;

use crate::error::Result;
use crate::groom::GROOMED;
use crate::grooming::GroomingVariant;
use crate::histogram::HistogramSet;
use crate::plot::{Curve, Page};
use crate::step::StepSelection;
use crate::style::{colour, BLUE, RED};

const PT_LABEL: &str = "Jet p_{T} [GeV]";
const MASS_LABEL: &str = "Jet mass [GeV]";
const EVENTS: &str = "Number of events";
const WEIGHTED_EVENTS: &str = "Weighted number of events";
const WEIGHTED_FRACTION: &str = "Fraction of weighted events";
const LEADING_PT: &str = "Leading R=1.0 jet p_{T}";
const LEADING_MASS: &str = "Leading R=1.0 jet mass, p_{T} > 400 GeV";

/// All pages of the active steps
///
/// Fails on the first histogram that is missing from `hists`.
pub fn pages(hists: &HistogramSet, selection: StepSelection) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    if selection.includes(1) {
        pages.push(Page::single(
            hists.h1("Step1_mu")?,
            "Average number of interactions",
            EVENTS,
        ));
        pages.push(Page::single(
            hists.h1("Step1_npv")?,
            "Number of primary vertices",
            EVENTS,
        ));
    }
    if selection.includes(2) {
        pages.extend(prebuilt(hists)?);
    }
    if selection.includes(3) {
        pages.extend(rebuilt(hists)?);
    }
    if selection.includes(4) {
        pages.extend(groomed(hists)?);
    }
    if selection.includes(5) {
        pages.extend(substructure(hists)?);
    }
    Ok(pages)
}

fn prebuilt(hists: &HistogramSet) -> Result<Vec<Page>> {
    let pt_nw = hists.h1("Step2_UngroomPt_noweight")?;
    let pt = hists.h1("Step2_UngroomPt")?;
    let trimmed_pt = hists.h1("Step2_TrimmedPt")?;
    let m = hists.h1("Step2_UngroomMass")?;
    let trimmed_m = hists.h1("Step2_TrimmedMass")?;
    Ok(vec![
        Page::curves(
            pt_nw.title.clone(),
            PT_LABEL,
            EVENTS,
            vec![Curve::new(pt_nw, RED).in_gev()],
        ),
        Page::curves(
            LEADING_PT,
            PT_LABEL,
            WEIGHTED_EVENTS,
            vec![
                Curve::new(pt, RED).in_gev().labelled(&pt.title),
                Curve::new(trimmed_pt, BLUE)
                    .in_gev()
                    .labelled(&trimmed_pt.title),
            ],
        )
        .log_log(),
        Page::curves(
            LEADING_MASS,
            MASS_LABEL,
            WEIGHTED_EVENTS,
            vec![
                Curve::new(m, RED).in_gev().labelled(&m.title),
                Curve::new(trimmed_m, BLUE).in_gev().labelled(&trimmed_m.title),
            ],
        )
        .log_log(),
    ])
}

fn comparison(hists: &HistogramSet, original: &str, rebuilt: &str) -> Result<Vec<Curve>> {
    Ok(vec![
        Curve::new(hists.h1(original)?, RED)
            .in_gev()
            .labelled("Original jets"),
        Curve::new(hists.h1(rebuilt)?, BLUE)
            .in_gev()
            .labelled("Rebuilt jets"),
    ])
}

/// Pre-built jets against our own clustering
fn rebuilt(hists: &HistogramSet) -> Result<Vec<Page>> {
    let pt_nw = comparison(hists, "Step2_UngroomPt_noweight", "Step3_MyUngroomPt_noweight")?;
    let pt = comparison(hists, "Step2_UngroomPt", "Step3_MyUngroomPt")?;
    let trimmed = comparison(hists, "Step2_TrimmedPt", "Step3_MyTrimmedPt")?;
    Ok(vec![
        Page::curves(
            "Leading ungroomed R=1.0 jet p_{T}, no weights",
            PT_LABEL,
            EVENTS,
            pt_nw,
        ),
        Page::curves(
            "Leading ungroomed R=1.0 jet p_{T}",
            PT_LABEL,
            WEIGHTED_EVENTS,
            pt,
        )
        .log_log(),
        Page::curves(
            "Leading trimmed R=1.0 jet p_{T}",
            PT_LABEL,
            WEIGHTED_EVENTS,
            trimmed,
        )
        .log_log(),
    ])
}

fn groomed(hists: &HistogramSet) -> Result<Vec<Page>> {
    let mut pt_names = vec![
        (GroomingVariant::Ungroomed, "Step3_MyUngroomPt".to_owned()),
        (GroomingVariant::Trimmed, "Step3_MyTrimmedPt".to_owned()),
    ];
    let mut mass_names = vec![
        (GroomingVariant::Ungroomed, "Step2_UngroomMass".to_owned()),
        (GroomingVariant::Trimmed, "Step2_TrimmedMass".to_owned()),
    ];
    for variant in GROOMED {
        pt_names.push((variant, format!("Step4_My{}Pt", variant.tag())));
        mass_names.push((variant, format!("Step4_My{}Mass", variant.tag())));
    }

    let mut pt = Vec::with_capacity(pt_names.len());
    for (n, (variant, name)) in pt_names.iter().enumerate() {
        pt.push(
            Curve::new(hists.h1(name)?, colour(n))
                .in_gev()
                .labelled(variant.to_string()),
        );
    }
    let mut mass = Vec::with_capacity(mass_names.len());
    for (n, (variant, name)) in mass_names.iter().enumerate() {
        mass.push(
            Curve::new(hists.h1(name)?, colour(n))
                .in_gev()
                .normalized()
                .labelled(variant.to_string()),
        );
    }
    Ok(vec![
        Page::curves(LEADING_PT, PT_LABEL, WEIGHTED_EVENTS, pt)
            .log_log()
            .with_x_range(150., 1000.),
        Page::curves(LEADING_MASS, MASS_LABEL, WEIGHTED_FRACTION, mass)
            .log_log()
            .with_x_range(10., 500.)
            .with_y_range(1e-4, 0.25),
    ])
}

fn substructure(hists: &HistogramSet) -> Result<Vec<Page>> {
    let mut d2 = Vec::new();
    let mut tau32 = Vec::new();
    for (n, variant) in GroomingVariant::iter().enumerate() {
        let tag = variant.tag();
        let label = variant.to_string();
        d2.push(
            Curve::new(hists.h1(&format!("Step5_{tag}_D2"))?, colour(n))
                .normalized()
                .labelled(label.clone()),
        );
        tau32.push(
            Curve::new(hists.h1(&format!("Step5_{tag}_Tau32"))?, colour(n))
                .normalized()
                .labelled(label),
        );
    }
    Ok(vec![
        Page::curves(
            "Leading R=1.0 jet D_{2}^{#beta=1}, p_{T} > 400 GeV",
            "Jet D_{2}^{#beta=1}",
            WEIGHTED_FRACTION,
            d2,
        )
        .with_y_range(0., 0.2),
        Page::curves(
            "Leading R=1.0 jet #tau_{32}^{WTA}, p_{T} > 400 GeV",
            "Jet #tau_{32}^{WTA}",
            WEIGHTED_FRACTION,
            tau32,
        )
        .with_y_range(0., 0.5),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{run, EventSource};
    use crate::config::GroomingConfig;
    use crate::error::Error;
    use crate::groom::{accumulators, GroomEvent};

    struct NoEvents;

    impl EventSource for NoEvents {
        type Event = GroomEvent;

        fn len(&self) -> usize {
            0
        }

        fn event(&self, idx: usize) -> Result<GroomEvent> {
            unreachable!("no event {idx}")
        }
    }

    fn histograms(depth: u8) -> HistogramSet {
        let selection = StepSelection::new(depth).unwrap();
        run(&NoEvents, accumulators(selection, &GroomingConfig::default())).unwrap()
    }

    #[test]
    fn page_count() {
        let hists = histograms(0);
        assert_eq!(pages(&hists, StepSelection::ALL).unwrap().len(), 12);
        let step4 = pages(&hists, StepSelection::new(4).unwrap()).unwrap();
        assert_eq!(step4.len(), 10);
        let mass = &step4[9];
        assert_eq!(mass.curves_iter().count(), 7);
        assert_eq!(
            mass.curves_iter().last().unwrap().label.as_deref(),
            Some("Tighter Bottom-Up Soft Drop jets")
        );
    }

    #[test]
    fn missing_histogram() {
        let hists = histograms(3);
        let err = pages(&hists, StepSelection::ALL).unwrap_err();
        assert!(matches!(err, Error::MissingHistogram(name) if name == "Step4_MyPrunedPt"));
    }
}
