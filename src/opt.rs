use std::path::{Path, PathBuf};

use clap::{Args, Parser};
use env_logger::Env;

use crate::error::{Error, Result};
use crate::step::StepSelection;

#[derive(Debug, Args)]
pub struct RecoArgs {
    /// Verbosity level: 'off', 'error', 'warn', 'info', 'debug', 'trace'
    #[arg(short, long, default_value = "info")]
    pub verbosity: String,

    /// Output file for the histograms
    pub output: PathBuf,

    /// Number of steps to run, 0 runs all steps
    pub step: StepSelection,

    /// Name of the tree in the input file
    pub tree: String,

    /// Input ROOT file
    pub input: PathBuf,
}

#[derive(Debug, Parser)]
#[command(
    name = "jet_reco_exp",
    about = "Pileup, jet vertex fraction and response study of R=0.4 jets"
)]
pub struct ExpOpt {
    #[command(flatten)]
    pub args: RecoArgs,
}

#[derive(Debug, Parser)]
#[command(
    name = "jet_reco_groom",
    about = "Reclustering, grooming and substructure study of R=1.0 jets"
)]
pub struct GroomOpt {
    /// JSON file with grooming parameters
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use truth jets and particles instead of calorimeter jets and clusters
    #[arg(short, long)]
    pub truth: bool,

    #[command(flatten)]
    pub args: RecoArgs,
}

#[derive(Debug, Parser)]
#[command(about = "Draw the histograms of an analysis into a pdf file")]
pub struct PlotOpt {
    /// Verbosity level: 'off', 'error', 'warn', 'info', 'debug', 'trace'
    #[arg(short, long, default_value = "info")]
    pub verbosity: String,

    /// Output pdf file
    pub output: PathBuf,

    /// Number of steps to plot, 0 plots all steps
    pub step: StepSelection,

    /// Histogram file written by the analysis
    pub input: PathBuf,
}

impl PlotOpt {
    pub fn validate(&self) -> Result<()> {
        check_extension(&self.output, "output", "pdf")?;
        check_extension(&self.input, "input", "root")
    }
}

fn check_extension(path: &Path, kind: &'static str, ext: &'static str) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) == Some(ext) {
        Ok(())
    } else {
        Err(Error::InvalidExtension {
            kind,
            ext,
            path: path.to_owned(),
        })
    }
}

/// Parse the command line, exiting with status 1 on usage errors
pub fn parse<T: Parser>() -> T {
    T::try_parse().unwrap_or_else(|err| {
        let _ = err.print();
        std::process::exit(if err.use_stderr() { 1 } else { 0 })
    })
}

pub fn init_logging(verbosity: &str) {
    let env = Env::default().filter_or("JETRECO_LOG", verbosity);
    env_logger::init_from_env(env);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groom_args() {
        let opt = GroomOpt::try_parse_from([
            "jet_reco_groom",
            "--truth",
            "-v",
            "debug",
            "out.root",
            "4",
            "JetRecoTree",
            "in.root",
        ])
        .unwrap();
        assert!(opt.truth);
        assert!(opt.config.is_none());
        assert_eq!(opt.args.verbosity, "debug");
        assert_eq!(opt.args.step, StepSelection::new(4).unwrap());
        assert_eq!(opt.args.tree, "JetRecoTree");
    }

    #[test]
    fn invalid_step() {
        let res = ExpOpt::try_parse_from(["jet_reco_exp", "out.root", "6", "tree", "in.root"]);
        assert!(res.is_err());
    }

    #[test]
    fn plot_extensions() {
        let opt = PlotOpt::try_parse_from(["plots", "summary.pdf", "0", "hists.root"]).unwrap();
        assert!(opt.validate().is_ok());
        let opt = PlotOpt::try_parse_from(["plots", "summary.png", "0", "hists.root"]).unwrap();
        let err = opt.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "The output file should be a pdf file, check that the file name ends with .pdf: \"summary.png\""
        );
        let opt = PlotOpt::try_parse_from(["plots", "summary.pdf", "0", "hists.json"]).unwrap();
        assert!(matches!(
            opt.validate(),
            Err(Error::InvalidExtension { ext: "root", .. })
        ));
    }
}
