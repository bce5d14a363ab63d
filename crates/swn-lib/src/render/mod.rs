//! Overlay planning for per-cell or per-reach result arrays.
//!
//! This is a boundary adapter: it turns value grids into RGBA pixel buffers
//! and legend descriptions and hands them to a caller-supplied [`Canvas`].
//! It has no topology logic and performs no I/O. Whether drawing is possible
//! at all is decided by the caller when constructing an [`OverlayPlot`] with
//! a canvas.
//!
//! Stacked legends alternate their padding and label side so that successive
//! overlays on one canvas do not collide; the adapter counts legends itself.

mod grid;
mod scheme;

pub use grid::{Extent, Grid, ModelGrid, RegularGrid};
pub use scheme::{categorical_palette, evaluate, ColorScheme, ColorStop, Normalization, Rgb};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Relative width of a legend bar next to the plot.
const LEGEND_SIZE: f64 = 0.05;

/// Padding before the first legend.
const FIRST_LEGEND_PAD: f64 = 0.2;

/// Padding before every later legend.
const LEGEND_PAD: f64 = 0.5;

/// Draw order and transparency of the inactive-cell mask.
const MASK_Z_ORDER: i32 = 20;
const MASK_ALPHA: f64 = 0.5;

/// Drawing backend receiving rendered overlays.
pub trait Canvas {
    fn draw_image(&mut self, image: &RgbaImage, extent: Extent, z_order: i32);
    fn draw_legend(&mut self, legend: &Legend);
}

/// Row-major RGBA pixel buffer, one pixel per grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// RGBA of the pixel at `(row, col)`.
    pub fn pixel(&self, row: usize, col: usize) -> Option<[u8; 4]> {
        if row >= self.height || col >= self.width {
            return None;
        }
        let offset = (row * self.width + col) * 4;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(rgba)
    }
}

/// Which side of the legend bar carries its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSide {
    Above,
    Below,
}

/// Placement of a legend relative to the ones already on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LegendLayout {
    pub pad: f64,
    pub size: f64,
    pub label_side: LabelSide,
}

/// Placement for the next legend given how many are already placed.
///
/// With an even count the label goes above the bar, and the very first legend
/// gets a small pad; with an odd count the label goes below.
pub fn legend_layout(existing: usize) -> LegendLayout {
    if existing % 2 == 0 {
        LegendLayout {
            pad: if existing == 0 {
                FIRST_LEGEND_PAD
            } else {
                LEGEND_PAD
            },
            size: LEGEND_SIZE,
            label_side: LabelSide::Above,
        }
    } else {
        LegendLayout {
            pad: LEGEND_PAD,
            size: LEGEND_SIZE,
            label_side: LabelSide::Below,
        }
    }
}

/// Tick on a legend bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendTick {
    pub value: f64,
    pub label: String,
}

/// Colour-scale legend for one overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub label: String,
    pub layout: LegendLayout,
    pub normalization: Normalization,
    /// Explicit ticks; empty for continuous scales.
    pub ticks: Vec<LegendTick>,
}

/// How layer values are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerColors {
    /// Linear scale over the value range.
    Continuous(ColorScheme),
    /// Scale centred on zero.
    Divergent(ColorScheme),
    /// One palette colour per distinct value.
    Categorical,
}

impl Default for LayerColors {
    fn default() -> Self {
        LayerColors::Continuous(ColorScheme::Viridis)
    }
}

/// Per-layer drawing options.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOptions {
    /// Explicit `(min, max)`; derived from the data when absent.
    pub range: Option<(f64, f64)>,
    pub colors: LayerColors,
    pub alpha: f64,
    pub z_order: i32,
    pub legend: bool,
    pub label: Option<String>,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            range: None,
            colors: LayerColors::default(),
            alpha: 0.8,
            z_order: 10,
            legend: true,
            label: None,
        }
    }
}

impl LayerOptions {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn with_colors(mut self, colors: LayerColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn without_legend(mut self) -> Self {
        self.legend = false;
        self
    }

    /// Surface-water exchange style: fully opaque, drawn above plain layers.
    pub fn exchange(label: impl Into<String>) -> Self {
        Self {
            colors: LayerColors::Divergent(ColorScheme::RedWhiteBlue),
            alpha: 1.0,
            z_order: 11,
            ..Self::labelled(label)
        }
    }
}

/// Result of adding one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub image: RgbaImage,
    pub normalization: Normalization,
    pub legend: Option<Legend>,
}

/// Default `(min, max)` for a layer.
///
/// Uses the data range, widened to ±2.5 % around the midpoint when the range
/// is narrower than 5 % of the midpoint. `None` when nothing is unmasked.
pub fn value_range(values: &Grid) -> Option<(f64, f64)> {
    let (min, max) = values
        .values()
        .fold(None, |acc: Option<(f64, f64)>, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })?;
    let mid = (min + max) / 2.0;
    if max - min < (0.05 * mid).abs() {
        let half = (0.025 * mid).abs();
        Some((mid - half, mid + half))
    } else {
        Some((min, max))
    }
}

/// Overlay planner bound to one model grid and canvas.
pub struct OverlayPlot<'g, G: ModelGrid + ?Sized, C: Canvas> {
    grid: &'g G,
    canvas: C,
    domain_extent: Extent,
    legends: usize,
}

impl<'g, G: ModelGrid + ?Sized, C: Canvas> OverlayPlot<'g, G, C> {
    /// `domain_extent` defaults to the grid extent.
    pub fn new(grid: &'g G, canvas: C, domain_extent: Option<Extent>) -> Self {
        let domain_extent = domain_extent.unwrap_or_else(|| grid.extent());
        Self {
            grid,
            canvas,
            domain_extent,
            legends: 0,
        }
    }

    pub fn domain_extent(&self) -> Extent {
        self.domain_extent
    }

    /// Number of legends placed so far.
    pub fn legend_count(&self) -> usize {
        self.legends
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    /// Render `values` and place it on the canvas.
    pub fn add_layer(&mut self, values: &Grid, options: &LayerOptions) -> Result<Overlay> {
        self.check_shape(values)?;

        let (min, max) = match options.range {
            Some((min, max)) if min < max => (min, max),
            Some((min, max)) => return Err(Error::InvalidRange { min, max }),
            None => value_range(values).unwrap_or((0.0, 1.0)),
        };

        let normalization = match options.colors {
            LayerColors::Continuous(_) => Normalization::Linear { min, max },
            LayerColors::Divergent(_) => Normalization::Midpoint {
                min,
                midpoint: 0.0,
                max,
            },
            LayerColors::Categorical => Normalization::Categorical {
                bounds: category_bounds(values),
            },
        };

        let image = rasterize(values, &normalization, options.colors, options.alpha);
        self.canvas
            .draw_image(&image, self.grid.extent(), options.z_order);

        let legend = options
            .legend
            .then(|| self.place_legend(options.label.as_deref(), &normalization));

        debug!(
            rows = values.rows(),
            cols = values.cols(),
            legends = self.legends,
            "added overlay layer"
        );

        Ok(Overlay {
            image,
            normalization,
            legend,
        })
    }

    /// Shade cells whose `active` value is zero.
    pub fn add_inactive_mask(&mut self, active: &Grid) -> Result<RgbaImage> {
        self.check_shape(active)?;
        let alpha = (MASK_ALPHA * 255.0).round() as u8;
        let pixels = active
            .data()
            .iter()
            .flat_map(|&value| {
                if value == 0.0 {
                    [64, 64, 64, alpha]
                } else {
                    [0, 0, 0, 0]
                }
            })
            .collect();
        let image = RgbaImage {
            width: active.cols(),
            height: active.rows(),
            pixels,
        };
        self.canvas
            .draw_image(&image, self.grid.extent(), MASK_Z_ORDER);
        Ok(image)
    }

    fn check_shape(&self, values: &Grid) -> Result<()> {
        let (expected_rows, expected_cols) = self.grid.shape();
        if values.shape() != (expected_rows, expected_cols) {
            return Err(Error::GridShape {
                expected_rows,
                expected_cols,
                rows: values.rows(),
                cols: values.cols(),
            });
        }
        Ok(())
    }

    fn place_legend(&mut self, label: Option<&str>, normalization: &Normalization) -> Legend {
        let label = label.map(str::to_string).unwrap_or_else(|| {
            warn!("no label passed for legend");
            String::new()
        });

        let ticks = match normalization {
            Normalization::Categorical { bounds } => bounds
                .windows(2)
                .map(|pair| LegendTick {
                    value: pair[0] + (pair[1] - pair[0]) / 2.0,
                    label: format!("{}", pair[0] as i64),
                })
                .collect(),
            _ => Vec::new(),
        };

        let legend = Legend {
            label,
            layout: legend_layout(self.legends),
            normalization: normalization.clone(),
            ticks,
        };
        self.legends += 1;
        self.canvas.draw_legend(&legend);
        legend
    }
}

/// Sorted distinct values plus one upper bound past the largest.
fn category_bounds(values: &Grid) -> Vec<f64> {
    let mut distinct: Vec<f64> = values.values().collect();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if let Some(&last) = distinct.last() {
        distinct.push(last + 1.0);
    }
    distinct
}

fn rasterize(
    values: &Grid,
    normalization: &Normalization,
    colors: LayerColors,
    alpha: f64,
) -> RgbaImage {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    let palette = match normalization {
        Normalization::Categorical { bounds } => {
            categorical_palette(bounds.len().saturating_sub(1))
        }
        _ => Vec::new(),
    };

    let mut pixels = vec![0u8; values.data().len() * 4];
    for (i, &value) in values.data().iter().enumerate() {
        if !value.is_finite() {
            continue;
        }
        let color = match colors {
            LayerColors::Continuous(scheme) | LayerColors::Divergent(scheme) => {
                evaluate(scheme, normalization.position(value))
            }
            LayerColors::Categorical => match normalization.bin(value) {
                Some(bin) => palette[bin],
                None => continue,
            },
        };
        let offset = i * 4;
        pixels[offset..offset + 4].copy_from_slice(&[color.r, color.g, color.b, alpha]);
    }

    RgbaImage {
        width: values.cols(),
        height: values.rows(),
        pixels,
    }
}

/// Canvas that records draw calls; useful headless and in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingCanvas {
    pub images: Vec<(Extent, i32)>,
    pub legends: Vec<Legend>,
}

impl Canvas for RecordingCanvas {
    fn draw_image(&mut self, _image: &RgbaImage, extent: Extent, z_order: i32) {
        self.images.push((extent, z_order));
    }

    fn draw_legend(&mut self, legend: &Legend) {
        self.legends.push(legend.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_grid() -> RegularGrid {
        RegularGrid {
            rows: 2,
            cols: 2,
            x_origin: 0.0,
            y_origin: 20.0,
            cell_width: 10.0,
            cell_height: 10.0,
        }
    }

    #[test]
    fn legend_layout_alternates() {
        let first = legend_layout(0);
        assert_eq!(first.pad, 0.2);
        assert_eq!(first.label_side, LabelSide::Above);

        let second = legend_layout(1);
        assert_eq!(second.pad, 0.5);
        assert_eq!(second.label_side, LabelSide::Below);

        let third = legend_layout(2);
        assert_eq!(third.pad, 0.5);
        assert_eq!(third.label_side, LabelSide::Above);
    }

    #[test]
    fn value_range_widens_narrow_data() {
        let narrow = Grid::new(1, 2, vec![100.0, 101.0]).expect("shape");
        let (min, max) = value_range(&narrow).expect("values");
        assert!((min - 97.9875).abs() < 1e-9);
        assert!((max - 103.0125).abs() < 1e-9);

        let wide = Grid::new(1, 3, vec![1.0, f64::NAN, 10.0]).expect("shape");
        assert_eq!(value_range(&wide), Some((1.0, 10.0)));

        assert_eq!(value_range(&Grid::masked(2, 2)), None);
    }

    #[test]
    fn layers_stack_legends() {
        let grid = model_grid();
        let mut plot = OverlayPlot::new(&grid, RecordingCanvas::default(), None);
        assert_eq!(plot.domain_extent(), grid.extent());

        let values = Grid::new(2, 2, vec![0.0, 1.0, 2.0, f64::NAN]).expect("shape");
        let first = plot
            .add_layer(&values, &LayerOptions::labelled("head"))
            .expect("layer");
        let second = plot
            .add_layer(&values, &LayerOptions::labelled("depth"))
            .expect("layer");
        plot.add_layer(&values, &LayerOptions::default().without_legend())
            .expect("layer");

        assert_eq!(plot.legend_count(), 2);
        let first = first.legend.expect("legend");
        let second = second.legend.expect("legend");
        assert_eq!(first.layout.label_side, LabelSide::Above);
        assert_eq!(second.layout.label_side, LabelSide::Below);

        let canvas = plot.into_canvas();
        assert_eq!(canvas.images.len(), 3);
        assert_eq!(canvas.legends.len(), 2);
    }

    #[test]
    fn masked_cells_are_transparent() {
        let grid = model_grid();
        let mut plot = OverlayPlot::new(&grid, RecordingCanvas::default(), None);
        let values = Grid::new(2, 2, vec![0.0, 1.0, 2.0, f64::NAN]).expect("shape");
        let overlay = plot
            .add_layer(
                &values,
                &LayerOptions::labelled("x").with_colors(LayerColors::Continuous(
                    ColorScheme::Grayscale,
                )),
            )
            .expect("layer");

        assert_eq!(overlay.image.pixel(0, 0), Some([0, 0, 0, 204]));
        assert_eq!(overlay.image.pixel(1, 0), Some([255, 255, 255, 204]));
        assert_eq!(overlay.image.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn categorical_layer_ticks_sit_in_bin_centres() {
        let grid = model_grid();
        let mut plot = OverlayPlot::new(&grid, RecordingCanvas::default(), None);
        let values = Grid::new(2, 2, vec![3.0, 1.0, 3.0, 7.0]).expect("shape");
        let overlay = plot
            .add_layer(
                &values,
                &LayerOptions::labelled("catchment").with_colors(LayerColors::Categorical),
            )
            .expect("layer");

        let legend = overlay.legend.expect("legend");
        let ticks: Vec<_> = legend.ticks.iter().map(|t| (t.value, t.label.as_str())).collect();
        assert_eq!(ticks, vec![(2.0, "1"), (5.0, "3"), (7.5, "7")]);
        assert_eq!(overlay.image.pixel(0, 0), overlay.image.pixel(1, 0));
        assert_ne!(overlay.image.pixel(0, 0), overlay.image.pixel(0, 1));
    }

    #[test]
    fn exchange_layer_centres_on_zero() {
        let grid = model_grid();
        let mut plot = OverlayPlot::new(&grid, RecordingCanvas::default(), None);
        let values = Grid::new(2, 2, vec![-4.0, 0.0, 1.0, f64::NAN]).expect("shape");
        let overlay = plot
            .add_layer(&values, &LayerOptions::exchange("exchange"))
            .expect("layer");

        assert_eq!(overlay.image.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(overlay.image.pixel(0, 1), Some([255, 255, 255, 255]));
        assert_eq!(overlay.image.pixel(1, 0), Some([0, 0, 255, 255]));
    }

    #[test]
    fn shape_and_range_are_checked() {
        let grid = model_grid();
        let mut plot = OverlayPlot::new(&grid, RecordingCanvas::default(), None);
        let err = plot
            .add_layer(&Grid::filled(3, 2, 1.0), &LayerOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::GridShape { rows: 3, .. }));

        let err = plot
            .add_layer(
                &Grid::filled(2, 2, 1.0),
                &LayerOptions::default().with_range(5.0, 5.0),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRange { .. }));
        assert_eq!(plot.legend_count(), 0);
    }

    #[test]
    fn inactive_mask_marks_zero_cells() {
        let grid = model_grid();
        let mut plot = OverlayPlot::new(&grid, RecordingCanvas::default(), None);
        let ibound = Grid::new(2, 2, vec![1.0, 0.0, 1.0, -1.0]).expect("shape");
        let image = plot.add_inactive_mask(&ibound).expect("mask");
        assert_eq!(image.pixel(0, 1), Some([64, 64, 64, 128]));
        assert_eq!(image.pixel(1, 1), Some([0, 0, 0, 0]));
        assert_eq!(plot.canvas().images[0].1, MASK_Z_ORDER);
    }
}
