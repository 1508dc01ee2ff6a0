//! Line charts for the analysis steps
//!
//! Every step hands its result to a [`ChartRenderer`] as a [`Chart`]: a
//! labelled series drawn as a line with markers. Two renderers ship here:
//! [`PngChartRenderer`] writes one PNG per chart, [`TextChartRenderer`]
//! prints an aligned listing with proportional bars.

use crate::analysis::Tally;
use anyhow::{Context, Result};
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// An RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const BLUE: Rgb = Rgb(31, 119, 180);
    pub const GREEN: Rgb = Rgb(44, 160, 44);
    pub const PURPLE: Rgb = Rgb(128, 0, 128);
    pub const TEAL: Rgb = Rgb(0, 128, 128);
    pub const ORANGE: Rgb = Rgb(255, 127, 14);
    pub const BROWN: Rgb = Rgb(140, 86, 75);
    pub const RED: Rgb = Rgb(214, 39, 40);
}

/// A second copy of the series drawn as a dashed line on top of the first
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub label: String,
    pub color: Rgb,
}

/// A labelled series to be drawn as a line with markers
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub color: Rgb,
    pub points: Vec<(String, f64)>,
    pub overlay: Option<Overlay>,
}

impl Chart {
    pub fn line(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        color: Rgb,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            color,
            points: Vec::new(),
            overlay: None,
        }
    }

    pub fn with_points(mut self, points: impl IntoIterator<Item = (String, f64)>) -> Self {
        self.points = points.into_iter().collect();
        self
    }

    pub fn with_tallies(self, tallies: &[Tally]) -> Self {
        self.with_points(tallies.iter().map(|t| (t.label.clone(), t.value as f64)))
    }

    /// Redraw the series as a dashed line with a legend entry
    pub fn with_dashed_overlay(mut self, label: impl Into<String>, color: Rgb) -> Self {
        self.overlay = Some(Overlay {
            label: label.into(),
            color,
        });
        self
    }

    fn max_value(&self) -> f64 {
        self.points.iter().map(|(_, v)| *v).fold(0.0, f64::max)
    }
}

/// Anything that can display a chart
pub trait ChartRenderer {
    fn render(&mut self, chart: &Chart) -> Result<()>;
}

// ─── Text output ─────────────────────────────────────────────────────────────

/// Prints each chart as a label/value listing with a bar per point
pub struct TextChartRenderer<W: Write> {
    out: W,
    bar_width: usize,
}

impl<W: Write> TextChartRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, bar_width: 40 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartRenderer for TextChartRenderer<W> {
    fn render(&mut self, chart: &Chart) -> Result<()> {
        writeln!(self.out, "\n{:=^72}", format!(" {} ", chart.title))?;
        writeln!(self.out, "{:<32} {:>12}", chart.x_label, chart.y_label)?;
        writeln!(self.out, "{:-<72}", "")?;

        let max = chart.max_value();
        for (label, value) in &chart.points {
            // Zero gets no bar; any positive value gets at least one cell
            let bar_len = if max > 0.0 && *value > 0.0 {
                (((value / max) * self.bar_width as f64).round() as usize).max(1)
            } else {
                0
            };
            writeln!(
                self.out,
                "{:<32} {:>12} {}",
                truncate_label(label, 32),
                format_value(*value),
                "o".repeat(bar_len)
            )?;
        }
        if chart.points.is_empty() {
            writeln!(self.out, "(no data)")?;
        }
        if let Some(overlay) = &chart.overlay {
            writeln!(self.out, "- - {}", overlay.label)?;
        }
        Ok(())
    }
}

/// Integers print without decimals, everything else with two
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

// ─── PNG output ──────────────────────────────────────────────────────────────

/// Family name the caption font is registered under
const CAPTION_FONT: &str = "sans-serif";

/// Fonts tried, in order, for chart captions
const FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

impl From<Rgb> for RGBColor {
    fn from(c: Rgb) -> Self {
        RGBColor(c.0, c.1, c.2)
    }
}

/// Writes each chart to `<out_dir>/<NN>_<title-slug>.png`
pub struct PngChartRenderer {
    out_dir: PathBuf,
    captions: bool,
    width: u32,
    height: u32,
    written: Vec<PathBuf>,
}

impl PngChartRenderer {
    /// Create the output directory and register a font for captions.
    ///
    /// Without a font the charts are still drawn, just without text.
    pub fn new(out_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create chart directory {}", out_dir.display()))?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
            captions: register_caption_font(),
            width: 1000,
            height: 500,
            written: Vec::new(),
        })
    }

    /// Draw lines and markers only: no title, axes, tick labels or legend
    pub fn without_text(mut self) -> Self {
        self.captions = false;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Files written so far, in render order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn draw(&self, chart: &Chart, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        // Points sit on x = 0, 1, 2, ... and the tick labels are the point labels
        let n = chart.points.len();
        let keys: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let labels: Vec<String> = chart
            .points
            .iter()
            .map(|(label, _)| truncate_label(label, 18))
            .collect();
        let points: Vec<(f64, f64)> = chart
            .points
            .iter()
            .enumerate()
            .map(|(i, (_, value))| (i as f64, *value))
            .collect();
        let x_range = (-0.5..n.max(1) as f64 - 0.5).with_key_points(keys);
        let y_range = 0.0..axis_ceiling(chart.max_value());

        {
            let mut builder = ChartBuilder::on(&root);
            builder.margin(20);
            if self.captions {
                builder
                    .caption(&chart.title, (CAPTION_FONT, 24))
                    .x_label_area_size(60)
                    .y_label_area_size(70);
            }
            let mut ctx = builder.build_cartesian_2d(x_range, y_range)?;

            if self.captions {
                ctx.configure_mesh()
                    .disable_x_mesh()
                    .x_label_formatter(&|x| tick_label(&labels, *x))
                    .x_desc(chart.x_label.as_str())
                    .y_desc(chart.y_label.as_str())
                    .draw()?;
            }

            let color = RGBColor::from(chart.color);
            ctx.draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?;
            ctx.draw_series(
                points
                    .iter()
                    .map(|&point| Circle::new(point, 4, color.filled())),
            )?;

            if let Some(overlay) = &chart.overlay {
                let dash = RGBColor::from(overlay.color);
                ctx.draw_series(DashedLineSeries::new(
                    points.clone(),
                    8,
                    6,
                    dash.stroke_width(2),
                ))?
                .label(overlay.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], dash.stroke_width(2)));

                if self.captions {
                    ctx.configure_series_labels()
                        .position(SeriesLabelPosition::UpperRight)
                        .background_style(WHITE.mix(0.8))
                        .border_style(BLACK)
                        .draw()?;
                }
            }
        }

        root.present()?;
        Ok(())
    }
}

impl ChartRenderer for PngChartRenderer {
    fn render(&mut self, chart: &Chart) -> Result<()> {
        let path = self.out_dir.join(format!(
            "{:02}_{}.png",
            self.written.len() + 1,
            slug(&chart.title)
        ));
        self.draw(chart, &path)
            .map_err(|e| anyhow::anyhow!("Failed to draw chart {}: {}", path.display(), e))?;
        log::info!("Wrote chart {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

/// Register the first readable system font for chart text.
///
/// Runs once per process; returns whether captions can be drawn.
fn register_caption_font() -> bool {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    *REGISTERED.get_or_init(|| {
        let found = FONT_PATHS
            .iter()
            .find_map(|path| std::fs::read(path).ok().map(|bytes| (*path, bytes)));
        let Some((path, bytes)) = found else {
            log::warn!("No system font found; charts will have no captions");
            return false;
        };
        // plotters keeps registered font data for the life of the process
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match register_font(CAPTION_FONT, FontStyle::Normal, bytes) {
            Ok(()) => {
                log::debug!("Chart font: {}", path);
                true
            }
            Err(_) => {
                log::warn!("Unusable font {}; charts will have no captions", path);
                false
            }
        }
    })
}

/// Top of the y axis: the largest value plus headroom, or 1 for an all-zero series
fn axis_ceiling(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// Label for an x tick; empty between points
fn tick_label(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() > 1e-6 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Truncate a label to fit in a column
fn truncate_label(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        label.to_string()
    } else {
        let head: String = label.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Lowercase ASCII file name fragment for a chart title
pub fn slug(title: &str) -> String {
    let mut out = String::new();
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}
