//! Colour schemes, multi-stop interpolation and value normalisation.

use serde::Serialize;

/// RGB colour with channels in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A colour stop: position in `[0, 1]` mapped to a colour.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Continuous colour schemes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    /// Purple -> Teal -> Yellow
    #[default]
    Viridis,
    /// Red -> White -> Blue (surface water exchange; losing reaches red)
    RedWhiteBlue,
    /// Black -> White
    Grayscale,
}

const VIRIDIS_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 68, 1, 84),
    ColorStop::new(0.25, 59, 82, 139),
    ColorStop::new(0.50, 33, 145, 140),
    ColorStop::new(0.75, 94, 201, 98),
    ColorStop::new(1.00, 253, 231, 37),
];

const RED_WHITE_BLUE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 255, 0, 0),
    ColorStop::new(0.5, 255, 255, 255),
    ColorStop::new(1.0, 0, 0, 255),
];

const GRAYSCALE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 0, 0, 0),
    ColorStop::new(1.0, 255, 255, 255),
];

/// Qualitative palette for categorical layers.
const CATEGORICAL_PALETTE: &[Rgb] = &[
    Rgb::new(102, 194, 165),
    Rgb::new(252, 141, 98),
    Rgb::new(141, 160, 203),
    Rgb::new(231, 138, 195),
    Rgb::new(166, 216, 84),
    Rgb::new(255, 217, 47),
    Rgb::new(229, 196, 148),
    Rgb::new(179, 179, 179),
];

impl ColorScheme {
    fn stops(self) -> &'static [ColorStop] {
        match self {
            ColorScheme::Viridis => VIRIDIS_STOPS,
            ColorScheme::RedWhiteBlue => RED_WHITE_BLUE_STOPS,
            ColorScheme::Grayscale => GRAYSCALE_STOPS,
        }
    }
}

/// Colour at position `t`; values outside `[0, 1]` are clamped, `NaN` maps to 0.
pub fn evaluate(scheme: ColorScheme, t: f64) -> Rgb {
    let stops = scheme.stops();
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

    let upper = stops
        .iter()
        .position(|stop| stop.t >= t)
        .unwrap_or(stops.len() - 1);
    if upper == 0 {
        return stops[0].color;
    }
    let (lo, hi) = (stops[upper - 1], stops[upper]);
    let span = hi.t - lo.t;
    let f = if span > 0.0 { (t - lo.t) / span } else { 0.0 };

    Rgb::new(
        lerp(lo.color.r, hi.color.r, f),
        lerp(lo.color.g, hi.color.g, f),
        lerp(lo.color.b, hi.color.b, f),
    )
}

fn lerp(a: u8, b: u8, f: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * f).round() as u8
}

/// `n` categorical colours, cycling the palette when `n` exceeds it.
pub fn categorical_palette(n: usize) -> Vec<Rgb> {
    CATEGORICAL_PALETTE.iter().copied().cycle().take(n).collect()
}

/// Mapping from data values to colour positions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Normalization {
    /// Linear between `min` and `max`.
    Linear { min: f64, max: f64 },
    /// Piecewise linear with `midpoint` mapped to 0.5.
    Midpoint { min: f64, midpoint: f64, max: f64 },
    /// Bins `[bounds[i], bounds[i + 1])`, one colour each.
    Categorical { bounds: Vec<f64> },
}

impl Normalization {
    /// Position in `[0, 1]` for continuous normalisations.
    pub fn position(&self, value: f64) -> f64 {
        match self {
            Normalization::Linear { min, max } => {
                let span = max - min;
                let inv = if span.abs() > f64::EPSILON {
                    1.0 / span
                } else {
                    1.0
                };
                ((value - min) * inv).clamp(0.0, 1.0)
            }
            Normalization::Midpoint { min, midpoint, max } => {
                if value <= *midpoint {
                    half_span(*min, *midpoint, value, 0.0)
                } else {
                    half_span(*midpoint, *max, value, 0.5)
                }
            }
            Normalization::Categorical { bounds } => match self.bin(value) {
                Some(bin) if bounds.len() > 2 => bin as f64 / (bounds.len() - 2) as f64,
                Some(_) => 0.0,
                None => f64::NAN,
            },
        }
    }

    /// Bin index of `value` for categorical normalisations.
    pub fn bin(&self, value: f64) -> Option<usize> {
        let Normalization::Categorical { bounds } = self else {
            return None;
        };
        bounds
            .windows(2)
            .position(|pair| value >= pair[0] && value < pair[1])
    }
}

fn half_span(lo: f64, hi: f64, value: f64, offset: f64) -> f64 {
    if hi - lo <= 0.0 {
        return if value >= hi { offset + 0.5 } else { offset };
    }
    (offset + 0.5 * (value - lo) / (hi - lo)).clamp(offset, offset + 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_hits_stops_and_clamps() {
        assert_eq!(evaluate(ColorScheme::Grayscale, 0.0), Rgb::new(0, 0, 0));
        assert_eq!(evaluate(ColorScheme::Grayscale, 0.5), Rgb::new(128, 128, 128));
        assert_eq!(evaluate(ColorScheme::Grayscale, 2.0), Rgb::new(255, 255, 255));
        assert_eq!(evaluate(ColorScheme::Viridis, f64::NAN), Rgb::new(68, 1, 84));
        assert_eq!(
            evaluate(ColorScheme::RedWhiteBlue, 0.5),
            Rgb::new(255, 255, 255)
        );
    }

    #[test]
    fn midpoint_maps_zero_to_centre() {
        let norm = Normalization::Midpoint {
            min: -4.0,
            midpoint: 0.0,
            max: 1.0,
        };
        assert_eq!(norm.position(-4.0), 0.0);
        assert_eq!(norm.position(-2.0), 0.25);
        assert_eq!(norm.position(0.0), 0.5);
        assert_eq!(norm.position(1.0), 1.0);
        assert_eq!(norm.position(5.0), 1.0);
    }

    #[test]
    fn categorical_bins_by_bounds() {
        let norm = Normalization::Categorical {
            bounds: vec![1.0, 3.0, 7.0, 8.0],
        };
        assert_eq!(norm.bin(1.0), Some(0));
        assert_eq!(norm.bin(3.0), Some(1));
        assert_eq!(norm.bin(7.0), Some(2));
        assert_eq!(norm.bin(8.0), None);
        assert_eq!(norm.position(7.0), 1.0);
    }

    #[test]
    fn palette_cycles() {
        let palette = categorical_palette(10);
        assert_eq!(palette.len(), 10);
        assert_eq!(palette[8], palette[0]);
    }
}
