use anyhow::{Context, Result};

use jetreco::histogram::HistogramSet;
use jetreco::opt::{init_logging, parse, PlotOpt};
use jetreco::plot::{groom::pages, Document};

fn main() -> Result<()> {
    let opt: PlotOpt = parse();
    init_logging(&opt.verbosity);
    opt.validate()?;

    let hists = HistogramSet::load(&opt.input)
        .with_context(|| format!("Failed to load histograms from {:?}", opt.input))?;
    let pages = pages(&hists, opt.step)?;
    let mut doc = Document::new();
    for page in &pages {
        doc.add_page(page)
            .with_context(|| format!("Failed to draw page {:?}", page.title))?;
    }
    doc.write(&opt.output)
        .with_context(|| format!("Failed to write {:?}", opt.output))
}
