//! Text roles on the summary pages
use plotters::style::{FontDesc, FontFamily, FontStyle};
use strum::{Display, EnumIter};

#[derive(Copy, Clone, Default, Display, EnumIter, PartialEq, Eq, Hash, Debug)]
pub enum Font {
    Title,
    #[default]
    AxisLabel,
    TickLabel,
    Legend,
}

impl Font {
    /// Size in pixels
    pub fn size(self) -> f64 {
        match self {
            Font::Title => 24.,
            Font::AxisLabel => 18.,
            Font::TickLabel => 14.,
            Font::Legend => 15.,
        }
    }

    pub fn style(self) -> FontStyle {
        match self {
            Font::Title => FontStyle::Bold,
            _ => FontStyle::Normal,
        }
    }
}

impl From<Font> for FontDesc<'static> {
    fn from(font: Font) -> Self {
        FontDesc::new(FontFamily::SansSerif, font.size(), font.style())
    }
}
