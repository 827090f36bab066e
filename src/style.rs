//! Presentation policy of the plot programs
use std::collections::HashMap;

use lazy_static::lazy_static;
use plotters::style::RGBColor;

pub const PAGE_SIZE: (u32, u32) = (800, 600);

/// Axis rescaling from MeV to GeV
pub const MEV_TO_GEV: f64 = 1e-3;

pub const BLACK: RGBColor = RGBColor(0, 0, 0);
pub const RED: RGBColor = RGBColor(255, 0, 0);
pub const BLUE: RGBColor = RGBColor(0, 0, 255);
pub const GREEN: RGBColor = RGBColor(0, 153, 0);
pub const VIOLET: RGBColor = RGBColor(204, 0, 255);
pub const CYAN: RGBColor = RGBColor(0, 255, 255);
pub const ORANGE: RGBColor = RGBColor(255, 153, 0);

/// Line colours of overlaid histograms, in order
pub const COLOURS: [RGBColor; 7] = [RED, BLUE, GREEN, VIOLET, CYAN, ORANGE, BLACK];

lazy_static! {
    static ref FIT_WINDOWS: HashMap<&'static str, (f64, f64)> = HashMap::from([
        ("Step5_response_reco_pt20", (0.7, 1.6)),
        ("Step5_response_reco_pt100", (0.8, 1.2)),
        ("Step5_response_reco_pt1000", (0.8, 1.2)),
        ("Step5_response_track_pt20", (0.3, 1.1)),
        ("Step5_response_track_pt100", (0.3, 1.0)),
        ("Step5_response_track_pt1000", (0.2, 1.0)),
    ]);
}

/// Colour of the `n`th histogram on a page
pub fn colour(n: usize) -> RGBColor {
    COLOURS[n % COLOURS.len()]
}

/// The window of the Gaussian fit to a response histogram
pub fn fit_window(name: &str) -> Option<(f64, f64)> {
    FIT_WINDOWS.get(name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows() {
        assert_eq!(fit_window("Step5_response_track_pt20"), Some((0.3, 1.1)));
        assert_eq!(fit_window("Step5_response_reco_pt20"), Some((0.7, 1.6)));
        assert_eq!(fit_window("Step5_DRtruth_reco"), None);
    }

    #[test]
    fn colours_cycle() {
        assert_eq!(colour(0), RED);
        assert_eq!(colour(6), BLACK);
        assert_eq!(colour(7), RED);
    }
}
