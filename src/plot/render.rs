use plotters::coord::ranged1d::ValueFormatter;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::label::to_unicode;
use super::{ColourMap, Content, Curve, Page};
use crate::error::{Error, Result};
use crate::font::Font;
use crate::style::PAGE_SIZE;

const MARGIN: u32 = 20;
const X_LABEL_AREA_SIZE: u32 = 55;
const Y_LABEL_AREA_SIZE: u32 = 80;
const COLOUR_BAR_WIDTH: u32 = 110;
const COLOUR_BAR_STEPS: usize = 100;
const FIT_POINTS: usize = 200;
const LEGEND_LINE_LEN: i32 = 25;
// hue of the lowest value in a colour map, the highest is red
const HEAT_HUE: f64 = 0.7;

fn render_error<E: std::fmt::Display>(err: E) -> Error {
    Error::Render(err.to_string())
}

/// Draw a page into an SVG document
pub fn render_svg(page: &Page) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PAGE_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        match &page.content {
            Content::Curves(curves) => draw_curves(&root, page, curves)?,
            Content::ColourMap(map) => draw_colour_map(&root, page, map)?,
        }
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

fn draw_curves<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    page: &Page,
    curves: &[Curve],
) -> Result<()> {
    let x = x_range(page, curves);
    let y = y_range(page, curves);
    let mut builder = ChartBuilder::on(root);
    builder
        .caption(to_unicode(&page.title), FontDesc::from(Font::Title))
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA_SIZE)
        .y_label_area_size(Y_LABEL_AREA_SIZE);
    match (page.log_x, page.log_y) {
        (false, false) => {
            let chart = builder
                .build_cartesian_2d(x.0..x.1, y.0..y.1)
                .map_err(render_error)?;
            draw_curve_chart(chart, page, curves, x, y)
        }
        (true, false) => {
            let chart = builder
                .build_cartesian_2d((x.0..x.1).log_scale(), y.0..y.1)
                .map_err(render_error)?;
            draw_curve_chart(chart, page, curves, x, y)
        }
        (false, true) => {
            let chart = builder
                .build_cartesian_2d(x.0..x.1, (y.0..y.1).log_scale())
                .map_err(render_error)?;
            draw_curve_chart(chart, page, curves, x, y)
        }
        (true, true) => {
            let chart = builder
                .build_cartesian_2d((x.0..x.1).log_scale(), (y.0..y.1).log_scale())
                .map_err(render_error)?;
            draw_curve_chart(chart, page, curves, x, y)
        }
    }
}

fn draw_curve_chart<'a, DB, X, Y>(
    mut chart: ChartContext<'a, DB, Cartesian2d<X, Y>>,
    page: &Page,
    curves: &[Curve],
    x: (f64, f64),
    y: (f64, f64),
) -> Result<()>
where
    DB: DrawingBackend + 'a,
    X: Ranged<ValueType = f64> + ValueFormatter<f64>,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let (log_x, log_y) = (page.log_x, page.log_y);
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(to_unicode(&page.x_label))
        .y_desc(to_unicode(&page.y_label))
        .axis_desc_style(FontDesc::from(Font::AxisLabel))
        .label_style(FontDesc::from(Font::TickLabel))
        .x_label_formatter(&|v: &f64| tick_label(*v, log_x))
        .y_label_formatter(&|v: &f64| tick_label(*v, log_y))
        .draw()
        .map_err(render_error)?;

    for curve in curves {
        let colour = curve.colour;
        let series = chart
            .draw_series(LineSeries::new(
                step_points(curve, x, y),
                colour.stroke_width(2),
            ))
            .map_err(render_error)?;
        if let Some(legend) = curve.legend() {
            series.label(to_unicode(&legend)).legend(move |(px, py)| {
                PathElement::new(
                    vec![(px, py), (px + LEGEND_LINE_LEN, py)],
                    colour.stroke_width(2),
                )
            });
        }
        if let Some((fit, (min, max))) = &curve.fit {
            let (min, max) = (min.max(x.0), max.min(x.1));
            let points = (0..=FIT_POINTS).map(|i| {
                let xi = min + (max - min) * i as f64 / FIT_POINTS as f64;
                (xi, clamp(fit.eval(xi), y))
            });
            chart
                .draw_series(LineSeries::new(points, colour.mix(0.6).stroke_width(1)))
                .map_err(render_error)?;
        }
    }

    if curves.iter().any(|c| c.label.is_some()) {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(FontDesc::from(Font::Legend))
            .draw()
            .map_err(render_error)?;
    }
    Ok(())
}

fn clamp(v: f64, (min, max): (f64, f64)) -> f64 {
    v.max(min).min(max)
}

// histogram outline restricted to the visible window
fn step_points(curve: &Curve, x: (f64, f64), y: (f64, f64)) -> Vec<(f64, f64)> {
    let mut points = Vec::new();
    for (low, high, content) in curve.hist.bins() {
        if high <= x.0 || low >= x.1 {
            continue;
        }
        let content = clamp(content, y);
        points.push((low.max(x.0), content));
        points.push((high.min(x.1), content));
    }
    points
}

fn x_range(page: &Page, curves: &[Curve]) -> (f64, f64) {
    if let Some(range) = page.x_range {
        return range;
    }
    let min = curves
        .iter()
        .map(|c| c.hist.axis.min)
        .fold(f64::INFINITY, f64::min);
    let max = curves
        .iter()
        .map(|c| c.hist.axis.max)
        .fold(f64::NEG_INFINITY, f64::max);
    if !(min < max) {
        return (0., 1.);
    }
    if page.log_x && min <= 0. {
        return (max * 1e-3, max);
    }
    (min, max)
}

fn y_range(page: &Page, curves: &[Curve]) -> (f64, f64) {
    if let Some(range) = page.y_range {
        return range;
    }
    let max = curves
        .iter()
        .map(|c| c.hist.maximum())
        .fold(f64::NEG_INFINITY, f64::max);
    if page.log_y {
        let min = curves
            .iter()
            .flat_map(|c| c.hist.bins())
            .map(|(_, _, content)| content)
            .filter(|&content| content > 0.)
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() && max > 0. {
            (0.5 * min, 2. * max)
        } else {
            (1e-3, 1.)
        }
    } else if max > 0. {
        (0., 1.1 * max)
    } else {
        (0., 1.)
    }
}

fn tick_label(v: f64, log: bool) -> String {
    if log && v > 0. {
        let exp = v.log10().round();
        if (v - 10f64.powf(exp)).abs() < 1e-9 * v && !(-2. ..=3.).contains(&exp) {
            return format!("10{}", fmt_superscript(exp as i64));
        }
    }
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_owned()
    } else {
        s.to_owned()
    }
}

fn fmt_superscript(i: i64) -> String {
    const SUPERSCRIPT_MINUS: char = '⁻';
    const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
    let mut res: String = i
        .unsigned_abs()
        .to_string()
        .chars()
        .filter_map(|d| d.to_digit(10))
        .map(|d| SUPERSCRIPT_DIGITS[d as usize])
        .collect();
    if i < 0 {
        res.insert(0, SUPERSCRIPT_MINUS);
    }
    res
}

fn heat(z: f64, (min, max): (f64, f64)) -> HSLColor {
    let t = clamp((z - min) / (max - min), (0., 1.));
    HSLColor(HEAT_HUE * (1. - t), 1., 0.5)
}

fn draw_colour_map<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    page: &Page,
    map: &ColourMap,
) -> Result<()> {
    let (plot_area, bar_area) = root.split_horizontally(PAGE_SIZE.0 - COLOUR_BAR_WIDTH);
    let z = map.z_range();

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(to_unicode(&page.title), FontDesc::from(Font::Title))
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA_SIZE)
        .y_label_area_size(Y_LABEL_AREA_SIZE)
        .build_cartesian_2d(map.x.0..map.x.1, map.y.0..map.y.1)
        .map_err(render_error)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(to_unicode(&page.x_label))
        .y_desc(to_unicode(&page.y_label))
        .axis_desc_style(FontDesc::from(Font::AxisLabel))
        .label_style(FontDesc::from(Font::TickLabel))
        .draw()
        .map_err(render_error)?;
    chart
        .draw_series(map.cells.iter().map(|cell| {
            Rectangle::new(
                [(cell.x.0, cell.y.0), (cell.x.1, cell.y.1)],
                heat(cell.z, z).filled(),
            )
        }))
        .map_err(render_error)?;

    let mut bar = ChartBuilder::on(&bar_area)
        .margin_top(MARGIN + 40)
        .margin_bottom(MARGIN + X_LABEL_AREA_SIZE)
        .margin_left(5)
        .right_y_label_area_size(Y_LABEL_AREA_SIZE - 20)
        .build_cartesian_2d(0f64..1f64, z.0..z.1)
        .map_err(render_error)?;
    let z_label = page.z_label.as_deref().map(to_unicode).unwrap_or_default();
    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(z_label)
        .axis_desc_style(FontDesc::from(Font::AxisLabel))
        .label_style(FontDesc::from(Font::TickLabel))
        .y_label_formatter(&|v: &f64| tick_label(*v, false))
        .draw()
        .map_err(render_error)?;
    let step = (z.1 - z.0) / COLOUR_BAR_STEPS as f64;
    bar.draw_series((0..COLOUR_BAR_STEPS).map(|i| {
        let low = z.0 + i as f64 * step;
        Rectangle::new([(0., low), (1., low + step)], heat(low + 0.5 * step, z).filled())
    }))
    .map_err(render_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{Axis, Hist1D, Hist2D};
    use crate::plot::ColourMap;
    use crate::style::{BLUE, RED};

    #[test]
    fn ticks() {
        assert_eq!(tick_label(0.25, false), "0.25");
        assert_eq!(tick_label(40., false), "40");
        assert_eq!(tick_label(1e-4, true), "10⁻⁴");
        assert_eq!(tick_label(100., true), "100");
        assert_eq!(fmt_superscript(-12), "⁻¹²");
        assert_eq!(fmt_superscript(0), "⁰");
    }

    #[test]
    fn log_range_ignores_empty_bins() {
        let mut h = Hist1D::new("pt", "pt", 10, 10., 110.);
        h.fill_weighted(15., 0.01);
        h.fill_weighted(55., 4.);
        let page = Page::curves("", "", "", vec![Curve::new(&h, RED)]).log_log();
        let curves: Vec<_> = page.curves_iter().cloned().collect();
        assert_eq!(y_range(&page, &curves), (0.005, 8.));
        assert_eq!(x_range(&page, &curves), (10., 110.));
    }

    #[test]
    fn clipped_outline() {
        let mut h = Hist1D::new("m", "m", 4, 0., 4.);
        h.fill_weighted(1.5, 10.);
        let curve = Curve::new(&h, RED);
        let points = step_points(&curve, (1., 2.5), (0., 5.));
        assert_eq!(points, vec![(1., 5.), (2., 5.), (2., 0.), (2.5, 0.)]);
    }

    #[test]
    fn svg_pages() {
        let mut h = Hist1D::new("r", "Jet p_{T} response", 100, 0., 2.);
        h.fill_weighted(0.9, 2.);
        let page = Page::curves(
            "Cluster jet p_{T} response",
            "Jet response",
            "Fraction of events",
            vec![
                Curve::new(&h, RED).labelled("p_{T}^{truth} > 20 GeV"),
                Curve::new(&h, BLUE),
            ],
        )
        .with_y_range(0., 0.25);
        let svg = render_svg(&page).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("pTᵗʳᵘᵗʰ &gt; 20 GeV") || svg.contains("pTᵗʳᵘᵗʰ > 20 GeV"));

        let mut h2 = Hist2D::new("mu_npv", "", Axis::new(90, 0., 90.), Axis::new(60, 0., 60.));
        h2.fill(30., 12.);
        let page = Page::colour_map("#mu vs NPV", "#mu", "NPV", ColourMap::from_hist(&h2))
            .with_z_label("Number of events");
        assert!(render_svg(&page).unwrap().contains("μ vs NPV"));
    }

    #[test]
    fn log_axes() {
        let mut h = Hist1D::new("pt", "Leading jet p_{T}", 199, 10e3, 2000e3);
        h.fill(50e3);
        h.fill(400e3);
        let curve = Curve::new(&h, RED).in_gev();
        let page = Page::curves("Leading jet p_{T}", "p_{T} [GeV]", "Events", vec![curve.clone()])
            .log_log();
        assert!(render_svg(&page).unwrap().contains("<svg"));

        let mut page = Page::curves("Leading jet p_{T}", "p_{T} [GeV]", "Events", vec![curve]);
        page.log_x = true;
        assert!(render_svg(&page).unwrap().contains("<svg"));
    }
}
