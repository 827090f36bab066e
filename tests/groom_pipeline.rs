use jetreco::analysis::run;
use jetreco::columns::{Column, MemoryColumns};
use jetreco::config::GroomingConfig;
use jetreco::groom::{accumulators, EventTable, Level};
use jetreco::histogram::HistogramSet;
use jetreco::plot;
use jetreco::step::StepSelection;
use jetreco::Error;

/// One event with a 600 GeV three-prong jet built from clusters, one
/// event without any clusters
fn columns(prefix: &str) -> MemoryColumns {
    let c = |v: &[f32]| Column::F32Vec(vec![v.to_vec(), vec![]]);
    MemoryColumns::new()
        .with("mu_average", Column::F32(vec![40., 60.]))
        .with("NPV", Column::U32(vec![20, 30]))
        .with("EventWeight", Column::F32(vec![0.5, 1.]))
        .with(format!("{prefix}_R10_pt"), c(&[610e3]))
        .with(format!("{prefix}_R10_m"), c(&[120e3]))
        .with(format!("{prefix}_R10_Trimmed_pt"), c(&[590e3]))
        .with(format!("{prefix}_R10_Trimmed_m"), c(&[100e3]))
        .with("Clusters_pt", c(&[300e3, 180e3, 120e3]))
        .with("Clusters_eta", c(&[0., 0.4, -0.3]))
        .with("Clusters_phi", c(&[0., 0.2, 0.4]))
        .with("Clusters_m", c(&[0., 0., 0.]))
}

fn analyse(
    cols: &MemoryColumns,
    selection: StepSelection,
    level: Level,
) -> jetreco::Result<HistogramSet> {
    let config = GroomingConfig::default();
    let table = EventTable::read(cols, selection, level, &config)?;
    run(&table, accumulators(selection, &config))
}

#[test]
fn full_run() {
    let hists = analyse(&columns("RecoJets"), StepSelection::ALL, Level::Reco).unwrap();
    assert_eq!(hists.len(), 2 + 5 + 4 + 10 + 14);

    assert_eq!(hists.h1("Step1_npv").unwrap().entries(), 2);
    assert_eq!(hists.h1("Step2_UngroomPt").unwrap().integral(), 0.5);
    assert_eq!(hists.h1("Step2_TrimmedMass").unwrap().integral(), 0.5);

    let pt = hists.h1("Step3_MyUngroomPt_noweight").unwrap();
    assert_eq!(pt.entries(), 1);
    assert_eq!(pt.bin_content(pt.axis.find_bin(595e3)), 1.);
    assert_eq!(hists.h1("Step3_MyUngroomPt").unwrap().integral(), 0.5);

    assert_eq!(hists.h1("Step5_Ungroomed_D2").unwrap().integral(), 0.5);
}

#[test]
fn truth_level_reads_particles() {
    let err = analyse(&columns("TruthJets"), StepSelection::ALL, Level::Truth).unwrap_err();
    assert!(matches!(err, Error::MissingColumn(name) if name == "Particles_pt"));

    let hists = analyse(&columns("TruthJets"), StepSelection::new(2).unwrap(), Level::Truth)
        .unwrap();
    assert_eq!(hists.h1("Step2_UngroomPt_noweight").unwrap().entries(), 1);
}

#[test]
fn container_round_trip_and_plots() {
    let hists = analyse(&columns("RecoJets"), StepSelection::ALL, Level::Reco).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groom.root");
    hists.save(&path).unwrap();
    let read = HistogramSet::load(&path).unwrap();
    assert_eq!(read, hists);
    assert_eq!(plot::groom::pages(&read, StepSelection::ALL).unwrap().len(), 12);

    let exp_err = plot::exp::pages(&read, StepSelection::ALL).unwrap_err();
    assert!(matches!(exp_err, Error::HistogramKind { .. } | Error::MissingHistogram(_)));
}
