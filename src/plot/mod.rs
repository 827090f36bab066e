//! Multi-page PDF summaries of the analysis histograms
pub mod exp;
pub mod groom;
pub mod label;
pub mod pdf;
mod render;

use log::warn;
use plotters::style::RGBColor;

use crate::fit::{fit_gaussian, GaussianFit};
use crate::histogram::{Hist1D, Hist2D, Profile2D};
use crate::style::{BLACK, MEV_TO_GEV};

pub use pdf::Document;
pub use render::render_svg;

/// A histogram drawn as a line
#[derive(Clone, Debug, PartialEq)]
pub struct Curve {
    pub hist: Hist1D,
    pub colour: RGBColor,
    pub label: Option<String>,
    pub fit: Option<(GaussianFit, (f64, f64))>,
}

impl Curve {
    pub fn new(hist: &Hist1D, colour: RGBColor) -> Self {
        Self {
            hist: hist.clone(),
            colour,
            label: None,
            fit: None,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Convert the axis from MeV to GeV
    pub fn in_gev(mut self) -> Self {
        self.hist.rescale_axis(MEV_TO_GEV);
        self
    }

    pub fn normalized(mut self) -> Self {
        if !self.hist.normalize() {
            warn!(
                "Histogram {} has vanishing integral, leaving it unnormalised",
                self.hist.name
            );
        }
        self
    }

    /// Fit a Gaussian in the window `[min, max]`
    pub fn fitted(mut self, (min, max): (f64, f64)) -> Self {
        self.fit = fit_gaussian(&self.hist, min, max).map(|fit| (fit, (min, max)));
        self
    }

    /// Legend entry, including the resolution of a successful fit
    pub fn legend(&self) -> Option<String> {
        let label = self.label.as_deref()?;
        match &self.fit {
            Some((fit, _)) => Some(format!(
                "{label}, #sigma/#mu = {:.2}",
                fit.resolution()
            )),
            None => Some(label.to_owned()),
        }
    }
}

/// One cell of a colour map
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Cell {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: f64,
}

/// Two-dimensional histogram or profile drawn as coloured cells
#[derive(Clone, Debug, PartialEq)]
pub struct ColourMap {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: Option<(f64, f64)>,
    pub cells: Vec<Cell>,
}

impl ColourMap {
    pub fn from_hist(hist: &Hist2D) -> Self {
        let mut cells = Vec::new();
        for iy in 1..=hist.y.n_bins {
            for ix in 1..=hist.x.n_bins {
                let z = hist.bin_content(ix, iy);
                if z != 0. {
                    cells.push(Cell {
                        x: (hist.x.low_edge(ix), hist.x.up_edge(ix)),
                        y: (hist.y.low_edge(iy), hist.y.up_edge(iy)),
                        z,
                    });
                }
            }
        }
        Self {
            x: (hist.x.min, hist.x.max),
            y: (hist.y.min, hist.y.max),
            z: None,
            cells,
        }
    }

    /// Mean values of a profile, skipping empty bins
    pub fn from_profile(profile: &Profile2D) -> Self {
        let mut cells = Vec::new();
        for iy in 1..=profile.y.n_bins {
            for ix in 1..=profile.x.n_bins {
                if let Some(z) = profile.mean(ix, iy) {
                    cells.push(Cell {
                        x: (profile.x.low_edge(ix), profile.x.up_edge(ix)),
                        y: (profile.y.low_edge(iy), profile.y.up_edge(iy)),
                        z,
                    });
                }
            }
        }
        Self {
            x: (profile.x.min, profile.x.max),
            y: (profile.y.min, profile.y.max),
            z: None,
            cells,
        }
    }

    pub fn with_z_range(mut self, min: f64, max: f64) -> Self {
        self.z = Some((min, max));
        self
    }

    /// The colour scale range, from the cells unless set explicitly
    pub fn z_range(&self) -> (f64, f64) {
        if let Some(z) = self.z {
            return z;
        }
        let min = self.cells.iter().map(|c| c.z).fold(f64::INFINITY, f64::min);
        let max = self.cells.iter().map(|c| c.z).fold(f64::NEG_INFINITY, f64::max);
        if !(min < max) {
            let centre = if min.is_finite() { min } else { 0. };
            return (centre - 1., centre + 1.);
        }
        (min, max)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Curves(Vec<Curve>),
    ColourMap(ColourMap),
}

/// A single page of the summary document
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub z_label: Option<String>,
    pub log_x: bool,
    pub log_y: bool,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub content: Content,
}

impl Page {
    pub fn curves(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        curves: Vec<Curve>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            z_label: None,
            log_x: false,
            log_y: false,
            x_range: None,
            y_range: None,
            content: Content::Curves(curves),
        }
    }

    /// A page with a single black histogram titled after the histogram
    pub fn single(hist: &Hist1D, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self::curves(
            hist.title.clone(),
            x_label,
            y_label,
            vec![Curve::new(hist, BLACK)],
        )
    }

    pub fn colour_map(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        map: ColourMap,
    ) -> Self {
        Self {
            content: Content::ColourMap(map),
            ..Self::curves(title, x_label, y_label, Vec::new())
        }
    }

    pub fn with_z_label(mut self, label: impl Into<String>) -> Self {
        self.z_label = Some(label.into());
        self
    }

    pub fn log_log(mut self) -> Self {
        self.log_x = true;
        self.log_y = true;
        self
    }

    pub fn with_x_range(mut self, min: f64, max: f64) -> Self {
        self.x_range = Some((min, max));
        self
    }

    pub fn with_y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = Some((min, max));
        self
    }

    pub fn curves_iter(&self) -> impl Iterator<Item = &Curve> {
        let curves: &[Curve] = match &self.content {
            Content::Curves(c) => c,
            Content::ColourMap(_) => &[],
        };
        curves.iter()
    }
}
