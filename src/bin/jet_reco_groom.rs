use anyhow::{Context, Result};
use log::info;

use jetreco::analysis::run;
use jetreco::columns::RootTree;
use jetreco::config::GroomingConfig;
use jetreco::groom::{accumulators, EventTable, Level};
use jetreco::opt::{init_logging, parse, GroomOpt};

fn main() -> Result<()> {
    let opt: GroomOpt = parse();
    let args = &opt.args;
    init_logging(&args.verbosity);

    let config = match &opt.config {
        Some(path) => GroomingConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {path:?}"))?,
        None => GroomingConfig::default(),
    };
    let level = if opt.truth { Level::Truth } else { Level::Reco };
    info!("Running {} on {level:?} level", args.step);

    let tree = RootTree::open(&args.input, &args.tree)
        .with_context(|| format!("Failed to read tree {} from {:?}", args.tree, args.input))?;
    let events = EventTable::read(&tree, args.step, level, &config)
        .with_context(|| format!("Failed to read input columns from {:?}", args.input))?;
    let hists = run(&events, accumulators(args.step, &config)).context("Event loop failed")?;
    hists
        .save(&args.output)
        .with_context(|| format!("Failed to write histograms to {:?}", args.output))?;
    info!("Wrote {} histograms to {:?}", hists.len(), args.output);
    Ok(())
}
