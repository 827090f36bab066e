use anyhow::{Context, Result};
use log::info;

use jetreco::analysis::run;
use jetreco::columns::RootTree;
use jetreco::exp::{accumulators, EventTable};
use jetreco::opt::{init_logging, parse, ExpOpt};

fn main() -> Result<()> {
    let ExpOpt { args } = parse();
    init_logging(&args.verbosity);

    info!("Running {}", args.step);
    let tree = RootTree::open(&args.input, &args.tree)
        .with_context(|| format!("Failed to read tree {} from {:?}", args.tree, args.input))?;
    let events = EventTable::read(&tree, args.step)
        .with_context(|| format!("Failed to read input columns from {:?}", args.input))?;
    let hists = run(&events, accumulators(args.step)).context("Event loop failed")?;
    hists
        .save(&args.output)
        .with_context(|| format!("Failed to write histograms to {:?}", args.output))?;
    info!("Wrote {} histograms to {:?}", hists.len(), args.output);
    Ok(())
}
