//! Weighted histograms and the named container written by the analyses
//!
//! Bin contents are stored with underflow at index 0 and overflow at
//! index `n_bins + 1`, so in-range bins are numbered from 1.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Uniform binning
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Axis {
    pub n_bins: usize,
    pub min: f64,
    pub max: f64,
}

impl Axis {
    pub fn new(n_bins: usize, min: f64, max: f64) -> Self {
        assert!(n_bins > 0 && min < max, "invalid binning");
        Self { n_bins, min, max }
    }

    /// Index of the bin containing `x`, including under- and overflow
    pub fn find_bin(&self, x: f64) -> usize {
        if x.is_nan() || x >= self.max {
            return self.n_bins + 1;
        }
        if x < self.min {
            return 0;
        }
        let pos = (x - self.min) / (self.max - self.min) * self.n_bins as f64;
        1 + (pos as usize).min(self.n_bins - 1)
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.n_bins as f64
    }

    /// Lower edge of in-range bin `i`
    pub fn low_edge(&self, i: usize) -> f64 {
        self.min + (i - 1) as f64 * self.bin_width()
    }

    pub fn up_edge(&self, i: usize) -> f64 {
        self.low_edge(i + 1)
    }

    pub fn centre(&self, i: usize) -> f64 {
        self.low_edge(i) + 0.5 * self.bin_width()
    }

    /// Multiply the axis limits, e.g. by `1e-3` to go from MeV to GeV
    pub fn rescale(&mut self, factor: f64) {
        self.min *= factor;
        self.max *= factor;
    }

    fn n_cells(&self) -> usize {
        self.n_bins + 2
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Hist1D {
    pub name: String,
    pub title: String,
    pub axis: Axis,
    contents: Vec<f64>,
    sumw2: Vec<f64>,
    entries: u64,
}

impl Hist1D {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        n_bins: usize,
        min: f64,
        max: f64,
    ) -> Self {
        let axis = Axis::new(n_bins, min, max);
        let n = axis.n_cells();
        Self {
            name: name.into(),
            title: title.into(),
            axis,
            contents: vec![0.; n],
            sumw2: vec![0.; n],
            entries: 0,
        }
    }

    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.)
    }

    pub fn fill_weighted(&mut self, x: f64, w: f64) {
        let bin = self.axis.find_bin(x);
        self.contents[bin] += w;
        self.sumw2[bin] += w * w;
        self.entries += 1;
    }

    pub fn bin_content(&self, bin: usize) -> f64 {
        self.contents[bin]
    }

    pub fn bin_error(&self, bin: usize) -> f64 {
        self.sumw2[bin].sqrt()
    }

    pub fn underflow(&self) -> f64 {
        self.contents[0]
    }

    pub fn overflow(&self) -> f64 {
        self.contents[self.axis.n_bins + 1]
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum over the in-range bins
    pub fn integral(&self) -> f64 {
        self.contents[1..=self.axis.n_bins].iter().sum()
    }

    /// In-range bins as `(low edge, high edge, content)`
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        (1..=self.axis.n_bins).map(move |i| {
            (self.axis.low_edge(i), self.axis.up_edge(i), self.contents[i])
        })
    }

    pub fn scale(&mut self, factor: f64) {
        for c in &mut self.contents {
            *c *= factor;
        }
        for s in &mut self.sumw2 {
            *s *= factor * factor;
        }
    }

    /// Scale to unit integral
    ///
    /// Returns `false` and leaves the histogram unchanged if the
    /// integral vanishes.
    pub fn normalize(&mut self) -> bool {
        let integral = self.integral();
        if integral == 0. {
            return false;
        }
        self.scale(1. / integral);
        true
    }

    /// Rescale the axis limits, leaving all bin contents unchanged
    pub fn rescale_axis(&mut self, factor: f64) {
        self.axis.rescale(factor)
    }

    /// Largest in-range bin content
    pub fn maximum(&self) -> f64 {
        self.contents[1..=self.axis.n_bins]
            .iter()
            .copied()
            .fold(f64::MIN, f64::max)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Hist2D {
    pub name: String,
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    contents: Vec<f64>,
    entries: u64,
}

impl Hist2D {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        x: Axis,
        y: Axis,
    ) -> Self {
        let n = x.n_cells() * y.n_cells();
        Self {
            name: name.into(),
            title: title.into(),
            x,
            y,
            contents: vec![0.; n],
            entries: 0,
        }
    }

    fn cell(&self, ix: usize, iy: usize) -> usize {
        iy * self.x.n_cells() + ix
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        self.fill_weighted(x, y, 1.)
    }

    pub fn fill_weighted(&mut self, x: f64, y: f64, w: f64) {
        let cell = self.cell(self.x.find_bin(x), self.y.find_bin(y));
        self.contents[cell] += w;
        self.entries += 1;
    }

    pub fn bin_content(&self, ix: usize, iy: usize) -> f64 {
        self.contents[self.cell(ix, iy)]
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn integral(&self) -> f64 {
        let mut sum = 0.;
        for iy in 1..=self.y.n_bins {
            for ix in 1..=self.x.n_bins {
                sum += self.bin_content(ix, iy);
            }
        }
        sum
    }
}

/// Weighted running mean of a value in bins of two variables
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Profile2D {
    pub name: String,
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    sum_w: Vec<f64>,
    sum_wz: Vec<f64>,
    sum_wz2: Vec<f64>,
    entries: u64,
}

impl Profile2D {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        x: Axis,
        y: Axis,
    ) -> Self {
        let n = x.n_cells() * y.n_cells();
        Self {
            name: name.into(),
            title: title.into(),
            x,
            y,
            sum_w: vec![0.; n],
            sum_wz: vec![0.; n],
            sum_wz2: vec![0.; n],
            entries: 0,
        }
    }

    fn cell(&self, ix: usize, iy: usize) -> usize {
        iy * self.x.n_cells() + ix
    }

    pub fn fill(&mut self, x: f64, y: f64, z: f64, w: f64) {
        let cell = self.cell(self.x.find_bin(x), self.y.find_bin(y));
        self.sum_w[cell] += w;
        self.sum_wz[cell] += w * z;
        self.sum_wz2[cell] += w * z * z;
        self.entries += 1;
    }

    /// Mean value in a bin, `None` if the bin is empty
    pub fn mean(&self, ix: usize, iy: usize) -> Option<f64> {
        let cell = self.cell(ix, iy);
        let w = self.sum_w[cell];
        if w == 0. {
            None
        } else {
            Some(self.sum_wz[cell] / w)
        }
    }

    /// Spread of the values in a bin
    pub fn std_dev(&self, ix: usize, iy: usize) -> Option<f64> {
        let cell = self.cell(ix, iy);
        let mean = self.mean(ix, iy)?;
        let var = self.sum_wz2[cell] / self.sum_w[cell] - mean * mean;
        Some(var.max(0.).sqrt())
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind")]
pub enum Histogram {
    H1(Hist1D),
    H2(Hist2D),
    P2(Profile2D),
}

impl Histogram {
    pub fn name(&self) -> &str {
        match self {
            Histogram::H1(h) => &h.name,
            Histogram::H2(h) => &h.name,
            Histogram::P2(h) => &h.name,
        }
    }
}

impl From<Hist1D> for Histogram {
    fn from(h: Hist1D) -> Self {
        Self::H1(h)
    }
}

impl From<Hist2D> for Histogram {
    fn from(h: Hist2D) -> Self {
        Self::H2(h)
    }
}

impl From<Profile2D> for Histogram {
    fn from(h: Profile2D) -> Self {
        Self::P2(h)
    }
}

/// Histograms keyed by their unique names
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct HistogramSet {
    histograms: BTreeMap<String, Histogram>,
}

impl HistogramSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hist: impl Into<Histogram>) -> Result<()> {
        let hist = hist.into();
        let name = hist.name().to_owned();
        if self.histograms.contains_key(&name) {
            return Err(Error::DuplicateHistogram(name));
        }
        self.histograms.insert(name, hist);
        Ok(())
    }

    pub fn extend<I, H>(&mut self, hists: I) -> Result<()>
    where
        I: IntoIterator<Item = H>,
        H: Into<Histogram>,
    {
        for hist in hists {
            self.insert(hist)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Histogram> {
        self.histograms
            .get(name)
            .ok_or_else(|| Error::MissingHistogram(name.to_owned()))
    }

    pub fn h1(&self, name: &str) -> Result<&Hist1D> {
        match self.get(name)? {
            Histogram::H1(h) => Ok(h),
            _ => Err(kind_error(name, "1D histogram")),
        }
    }

    pub fn h2(&self, name: &str) -> Result<&Hist2D> {
        match self.get(name)? {
            Histogram::H2(h) => Ok(h),
            _ => Err(kind_error(name, "2D histogram")),
        }
    }

    pub fn p2(&self, name: &str) -> Result<&Profile2D> {
        match self.get(name)? {
            Histogram::P2(h) => Ok(h),
            _ => Err(kind_error(name, "2D profile")),
        }
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.histograms.keys().map(String::as_str)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        debug!("Writing {} histograms to {path:?}", self.len());
        let file = File::create(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).map_err(|source| Error::Json {
            path: path.to_owned(),
            source,
        })?;
        writer.flush().map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading histograms from {path:?}");
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
            path: path.to_owned(),
            source,
        })
    }
}

fn kind_error(name: &str, expected: &'static str) -> Error {
    Error::HistogramKind {
        name: name.to_owned(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn binning() {
        let axis = Axis::new(10, 0., 1.);
        assert_eq!(axis.find_bin(-0.1), 0);
        assert_eq!(axis.find_bin(0.), 1);
        assert_eq!(axis.find_bin(0.0707), 1);
        assert_eq!(axis.find_bin(0.1), 2);
        assert_eq!(axis.find_bin(0.999), 10);
        assert_eq!(axis.find_bin(1.), 11);
        assert_eq!(axis.find_bin(f64::NAN), 11);
        assert_abs_diff_eq!(axis.centre(1), 0.05);
    }

    #[test]
    fn weighted_fill() {
        let mut h = Hist1D::new("h", "h", 100, 0., 2.);
        h.fill_weighted(0.9, 2.);
        h.fill(0.9);
        h.fill(5.);
        let bin = h.axis.find_bin(0.9);
        assert_eq!(h.bin_content(bin), 3.);
        assert_abs_diff_eq!(h.bin_error(bin), 5f64.sqrt());
        assert_eq!(h.integral(), 3.);
        assert_eq!(h.overflow(), 1.);
        assert_eq!(h.entries(), 3);
    }

    #[test]
    fn rescale_keeps_contents() {
        let mut h = Hist1D::new("pt", "pt", 199, 10e3, 2000e3);
        for x in [15e3, 50e3, 50e3, 1999e3, 3000e3] {
            h.fill_weighted(x, 1.5);
        }
        let before = h.clone();
        h.rescale_axis(1e-3);
        assert_eq!(h.axis.n_bins, 199);
        assert_abs_diff_eq!(h.axis.min, 10.);
        assert_abs_diff_eq!(h.axis.max, 2000.);
        for i in 0..=200 {
            assert_eq!(h.bin_content(i), before.bin_content(i));
        }
        assert_eq!(h.integral(), before.integral());
    }

    #[test]
    fn normalize() {
        let mut h = Hist1D::new("n", "n", 15, 0., 30.);
        h.fill_weighted(3., 2.);
        h.fill_weighted(7., 6.);
        h.fill_weighted(-1., 100.);
        assert!(h.normalize());
        assert_abs_diff_eq!(h.integral(), 1.);
        assert_abs_diff_eq!(h.bin_content(h.axis.find_bin(7.)), 0.75);

        let mut empty = Hist1D::new("e", "e", 15, 0., 30.);
        assert!(!empty.normalize());
        assert_eq!(empty.integral(), 0.);
    }

    #[test]
    fn profile_mean() {
        let x = Axis::new(90, 0., 90.);
        let y = Axis::new(60, 0., 60.);
        let mut p = Profile2D::new("p", "p", x, y);
        p.fill(20.5, 10., 4., 1.);
        p.fill(20.5, 10., 10., 3.);
        let (ix, iy) = (p.x.find_bin(20.5), p.y.find_bin(10.));
        assert_abs_diff_eq!(p.mean(ix, iy).unwrap(), 8.5);
        assert!(p.mean(1, 1).is_none());
    }

    #[test]
    fn hist2d() {
        let mut h = Hist2D::new("h", "h", Axis::new(90, 0., 90.), Axis::new(60, 0., 60.));
        h.fill(30.2, 12.);
        h.fill(30.2, 12.);
        h.fill(100., 12.);
        assert_eq!(h.bin_content(31, 13), 2.);
        assert_eq!(h.integral(), 2.);
        assert_eq!(h.entries(), 3);
    }

    #[test]
    fn container() {
        let mut set = HistogramSet::new();
        let mut h = Hist1D::new("Step1_npv", "NPV", 60, 0., 60.);
        h.fill(12.);
        set.insert(h).unwrap();
        set.insert(Hist2D::new("Step1_mu_npv", "", Axis::new(2, 0., 1.), Axis::new(2, 0., 1.)))
            .unwrap();
        assert!(matches!(
            set.insert(Hist1D::new("Step1_npv", "", 1, 0., 1.)),
            Err(Error::DuplicateHistogram(_))
        ));
        assert!(matches!(set.h1("Step1_mu"), Err(Error::MissingHistogram(n)) if n == "Step1_mu"));
        assert!(matches!(set.h1("Step1_mu_npv"), Err(Error::HistogramKind { .. })));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hists.root");
        set.save(&path).unwrap();
        let read = HistogramSet::load(&path).unwrap();
        assert_eq!(read, set);
        assert_eq!(read.h1("Step1_npv").unwrap().bin_content(13), 1.);
    }
}
