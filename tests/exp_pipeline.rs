use approx::assert_relative_eq;

use jetreco::analysis::{run, EventSource};
use jetreco::columns::{Column, MemoryColumns};
use jetreco::exp::{accumulators, EventTable};
use jetreco::histogram::HistogramSet;
use jetreco::plot;
use jetreco::step::StepSelection;
use jetreco::Error;

fn jets(mut cols: MemoryColumns, prefix: &str, jets: &[&[(f32, f32, f32, f32)]]) -> MemoryColumns {
    let component = |i: usize| -> Vec<Vec<f32>> {
        jets.iter()
            .map(|ev| {
                ev.iter()
                    .map(|j| [j.0, j.1, j.2, j.3][i])
                    .collect()
            })
            .collect()
    };
    for (i, var) in ["pt", "eta", "phi", "m"].into_iter().enumerate() {
        cols.insert(format!("{prefix}_{var}"), Column::F32Vec(component(i)));
    }
    cols
}

/// Event 0: a matched cluster jet with large JVF and no track jets.
/// Event 1: no cluster jets and a track jet close to the truth jet.
fn columns() -> MemoryColumns {
    let cols = MemoryColumns::new()
        .with("mu_average", Column::F32(vec![40., 20.]))
        .with("NPV", Column::U32(vec![20, 11]))
        .with("EventWeight", Column::F32(vec![2., 0.5]))
        .with("RecoJets_R4_jvf", Column::F32Vec(vec![vec![0.9], vec![]]));
    let cols = jets(cols, "RecoJets_R4", &[&[(45e3, 0.05, 0.05, 4e3)], &[]]);
    let cols = jets(
        cols,
        "TruthJets_R4",
        &[&[(50e3, 0., 0., 5e3)], &[(150e3, 1., 1., 10e3)]],
    );
    jets(cols, "TrackJets_R4", &[&[], &[(120e3, 1.1, 1., 8e3)]])
}

fn analyse(cols: &MemoryColumns, selection: StepSelection) -> jetreco::Result<HistogramSet> {
    let table = EventTable::read(cols, selection)?;
    run(&table, accumulators(selection))
}

#[test]
fn full_run() {
    let hists = analyse(&columns(), StepSelection::ALL).unwrap();

    let mu = hists.h1("Step1_mu").unwrap();
    assert_eq!(mu.entries(), 2);
    assert_eq!(hists.h2("Step1_mu_npv").unwrap().integral(), 2.);

    // event 1 has no cluster jet
    assert_eq!(hists.h1("Step2_RecoJet_pt").unwrap().entries(), 1);
    assert_eq!(hists.h1("Step2_TruthJet_pt").unwrap().integral(), 2.5);

    let low = hists.h1("Step3_RecoJet_njets_lowmu").unwrap();
    assert_eq!(low.bin_content(1), 0.5);
    let mid = hists.h1("Step3_RecoJet_njets_midmu").unwrap();
    assert_eq!(mid.bin_content(mid.axis.find_bin(1.)), 2.);

    assert_eq!(hists.h1("Step4_RecoJet_jvf_pt20").unwrap().integral(), 2.);
    assert_eq!(hists.h1("Step4_RecoJet_jvf_pt60").unwrap().integral(), 0.);
    assert_eq!(hists.h1("Step4_RecoJet_pt_jvf").unwrap().integral(), 2.);

    let dr = hists.h1("Step5_DRtruth_reco").unwrap();
    assert_eq!(dr.bin_content(1), 1.);
    assert_eq!(dr.entries(), 1);
    let response = hists.h1("Step5_response_reco_pt20").unwrap();
    assert_relative_eq!(response.bin_content(response.axis.find_bin(0.9)), 2.);

    assert_eq!(hists.h1("Step5_DRtruth_track").unwrap().bin_content(2), 1.);
    assert_eq!(hists.h1("Step5_response_track_pt20").unwrap().integral(), 0.5);
    assert_eq!(hists.h1("Step5_response_track_pt100").unwrap().integral(), 0.5);
    assert_eq!(hists.h1("Step5_response_track_pt1000").unwrap().integral(), 0.);
}

#[test]
fn shallow_runs_need_fewer_columns() {
    let cols = MemoryColumns::new()
        .with("mu_average", Column::F32(vec![40., 20.]))
        .with("NPV", Column::U32(vec![20, 11]));
    let hists = analyse(&cols, StepSelection::new(1).unwrap()).unwrap();
    assert_eq!(hists.len(), 3);

    let err = analyse(&cols, StepSelection::new(2).unwrap()).unwrap_err();
    assert!(matches!(err, Error::MissingColumn(name) if name == "EventWeight"));
}

#[test]
fn inconsistent_columns() {
    let cols = columns().with("NPV", Column::U32(vec![20]));
    assert!(matches!(
        analyse(&cols, StepSelection::ALL),
        Err(Error::ColumnLength { .. })
    ));

    let cols = columns().with("RecoJets_R4_jvf", Column::F32Vec(vec![vec![], vec![]]));
    let table = EventTable::read(&cols, StepSelection::ALL).unwrap();
    assert!(matches!(
        table.event(0),
        Err(Error::ColumnLength { column, event: 0 }) if column == "RecoJets_R4_jvf"
    ));
}

#[test]
fn container_round_trip_and_plots() {
    let selection = StepSelection::new(3).unwrap();
    let hists = analyse(&columns(), selection).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exp.root");
    hists.save(&path).unwrap();
    let read = HistogramSet::load(&path).unwrap();
    assert_eq!(read, hists);

    assert_eq!(plot::exp::pages(&read, selection).unwrap().len(), 9);
    let err = plot::exp::pages(&read, StepSelection::ALL).unwrap_err();
    assert!(matches!(err, Error::MissingHistogram(name) if name == "Step4_RecoJet_jvf_pt20"));
}
