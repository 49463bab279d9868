//! Color distance metrics.
//!
//! Every metric satisfies `distance(x, x) == 0`, `distance(a, b) ==
//! distance(b, a)` and `distance(a, b) >= 0` by construction (all arithmetic
//! is over non-negative squared/absolute differences). The triangle
//! inequality is deliberately not required — several perceptual metrics
//! (CompuPhase, CIEDE2000) do not obey it.

use super::Color;
use std::str::FromStr;

/// Channel weighting presets for [`MetricKind::WeightedEuclidean`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ChannelWeights {
    /// ITU-R BT.709 luma coefficients, scaled to integers.
    Bt709,
    /// Nommyde's red/green/blue weighting (close to NTSC luma).
    Nommyde,
    /// De-emphasizes red, used when red dominates the source gamut.
    LowRed,
    /// Emphasizes red.
    HighRed,
}

impl ChannelWeights {
    fn weights(self) -> (u32, u32, u32) {
        match self {
            ChannelWeights::Bt709 => (2126, 7152, 722),
            ChannelWeights::Nommyde => (2990, 5870, 1140),
            ChannelWeights::LowRed => (1000, 4000, 5000),
            ChannelWeights::HighRed => (5000, 3000, 2000),
        }
    }
}

/// CIE94's two standard application-specific parameter sets.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Cie94Application {
    GraphicArts,
    Textiles,
}

impl Cie94Application {
    fn params(self) -> (f64, f64) {
        // (K1, K2); KL = 1, KC = KH = 1 for both application sets.
        match self {
            Cie94Application::GraphicArts => (0.045, 0.015),
            Cie94Application::Textiles => (0.048, 0.014),
        }
    }
}

/// Selects which distance algorithm [`distance`] computes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MetricKind {
    EuclideanRgb,
    EuclideanRgba,
    WeightedEuclidean(ChannelWeights),
    CompuPhase,
    Manhattan,
    WeightedManhattan(ChannelWeights),
    WeightedYuv,
    PngQuant,
    Cie94(Cie94Application),
    Ciede2000,
}

impl Default for MetricKind {
    /// The pipeline's default metric is CompuPhase.
    fn default() -> Self {
        MetricKind::CompuPhase
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct MetricParseError;

impl std::fmt::Display for MetricParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("invalid color distance metric name")
    }
}

impl std::error::Error for MetricParseError {}

impl FromStr for MetricKind {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "euclidean" | "rgb" => Ok(MetricKind::EuclideanRgb),
            "euclidean-rgba" | "rgba" => Ok(MetricKind::EuclideanRgba),
            "weighted-bt709" => Ok(MetricKind::WeightedEuclidean(ChannelWeights::Bt709)),
            "weighted-nommyde" => Ok(MetricKind::WeightedEuclidean(ChannelWeights::Nommyde)),
            "weighted-low-red" => Ok(MetricKind::WeightedEuclidean(ChannelWeights::LowRed)),
            "weighted-high-red" => Ok(MetricKind::WeightedEuclidean(ChannelWeights::HighRed)),
            "compuphase" | "redmean" | "default" => Ok(MetricKind::CompuPhase),
            "manhattan" | "l1" => Ok(MetricKind::Manhattan),
            "weighted-manhattan" => Ok(MetricKind::WeightedManhattan(ChannelWeights::Bt709)),
            "yuv" | "ycbcr" => Ok(MetricKind::WeightedYuv),
            "pngquant" => Ok(MetricKind::PngQuant),
            "cie94" | "cie94-graphic-arts" => Ok(MetricKind::Cie94(Cie94Application::GraphicArts)),
            "cie94-textiles" => Ok(MetricKind::Cie94(Cie94Application::Textiles)),
            "ciede2000" => Ok(MetricKind::Ciede2000),
            _ => Err(MetricParseError),
        }
    }
}

/// Computes the configured distance between two colors. Always finite,
/// always `>= 0`.
pub fn distance(kind: MetricKind, a: Color, b: Color) -> u32 {
    match kind {
        MetricKind::EuclideanRgb => euclidean_rgb(a, b),
        MetricKind::EuclideanRgba => euclidean_rgba(a, b),
        MetricKind::WeightedEuclidean(w) => weighted_euclidean(a, b, w),
        MetricKind::CompuPhase => compuphase(a, b),
        MetricKind::Manhattan => manhattan(a, b),
        MetricKind::WeightedManhattan(w) => weighted_manhattan(a, b, w),
        MetricKind::WeightedYuv => weighted_yuv(a, b),
        MetricKind::PngQuant => pngquant(a, b),
        MetricKind::Cie94(app) => cie94(a, b, app),
        MetricKind::Ciede2000 => ciede2000(a, b),
    }
}

fn sq_diff(a: u8, b: u8) -> u32 {
    let d = a as i32 - b as i32;
    (d * d) as u32
}

fn abs_diff(a: u8, b: u8) -> u32 {
    (a as i32 - b as i32).unsigned_abs()
}

fn euclidean_rgb(a: Color, b: Color) -> u32 {
    sq_diff(a.r, b.r) + sq_diff(a.g, b.g) + sq_diff(a.b, b.b)
}

fn euclidean_rgba(a: Color, b: Color) -> u32 {
    euclidean_rgb(a, b) + sq_diff(a.a, b.a)
}

fn weighted_euclidean(a: Color, b: Color, w: ChannelWeights) -> u32 {
    let (wr, wg, wb) = w.weights();
    let dr = sq_diff(a.r, b.r) as u64 * wr as u64;
    let dg = sq_diff(a.g, b.g) as u64 * wg as u64;
    let db = sq_diff(a.b, b.b) as u64 * wb as u64;
    ((dr + dg + db) / 10000) as u32
}

/// CompuPhase's "redmean" approximation of perceptual distance.
/// `rMean = (r1+r2)/2`; `d = ((512+rMean)*dr^2 >> 8) + 4*dg^2 + ((767-rMean)*db^2 >> 8)`.
fn compuphase(a: Color, b: Color) -> u32 {
    let r_mean = (a.r as i64 + b.r as i64) / 2;
    let dr = a.r as i64 - b.r as i64;
    let dg = a.g as i64 - b.g as i64;
    let db = a.b as i64 - b.b as i64;
    let term_r = ((512 + r_mean) * dr * dr) >> 8;
    let term_g = 4 * dg * dg;
    let term_b = ((767 - r_mean) * db * db) >> 8;
    (term_r + term_g + term_b).max(0) as u32
}

fn manhattan(a: Color, b: Color) -> u32 {
    abs_diff(a.r, b.r) + abs_diff(a.g, b.g) + abs_diff(a.b, b.b)
}

fn weighted_manhattan(a: Color, b: Color, w: ChannelWeights) -> u32 {
    let (wr, wg, wb) = w.weights();
    let dr = abs_diff(a.r, b.r) as u64 * wr as u64;
    let dg = abs_diff(a.g, b.g) as u64 * wg as u64;
    let db = abs_diff(a.b, b.b) as u64 * wb as u64;
    ((dr + dg + db) / 10000) as u32
}

fn to_ycbcr(c: Color) -> (f32, f32, f32) {
    let (r, g, b) = (c.r as f32, c.g as f32, c.b as f32);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0;
    let cr = 0.5 * r - 0.418688 * g - 0.081312 * b + 128.0;
    (y, cb, cr)
}

fn weighted_yuv(a: Color, b: Color) -> u32 {
    let (y1, cb1, cr1) = to_ycbcr(a);
    let (y2, cb2, cr2) = to_ycbcr(b);
    // Luma differences are weighted more heavily than chroma, matching the
    // perceptual dominance of brightness over color in YCbCr space.
    let dy = (y1 - y2) * 2.0;
    let dcb = cb1 - cb2;
    let dcr = cr1 - cr2;
    (dy * dy + dcb * dcb + dcr * dcr) as u32
}

/// pngquant's weighting: emphasizes green, then red, then blue, with an
/// alpha-difference term folded in so transparent/opaque boundaries count.
fn pngquant(a: Color, b: Color) -> u32 {
    let dr = sq_diff(a.r, b.r) as f32;
    let dg = sq_diff(a.g, b.g) as f32;
    let db = sq_diff(a.b, b.b) as f32;
    let da = sq_diff(a.a, b.a) as f32;
    (0.5 * dr + 1.0 * dg + 0.45 * db + 0.25 * da) as u32
}

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn to_lab(c: Color) -> (f64, f64, f64) {
    let r = srgb_to_linear(c.r);
    let g = srgb_to_linear(c.g);
    let b = srgb_to_linear(c.b);

    // sRGB -> XYZ (D65).
    let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
    let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
    let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

    // Normalize by the D65 white point.
    let (xn, yn, zn) = (0.95047, 1.0, 1.08883);
    let f = |t: f64| {
        if t > 216.0 / 24389.0 {
            t.cbrt()
        } else {
            (24389.0 / 27.0 * t + 16.0) / 116.0
        }
    };
    let (fx, fy, fz) = (f(x / xn), f(y / yn), f(z / zn));

    let l = 116.0 * fy - 16.0;
    let a_star = 500.0 * (fx - fy);
    let b_star = 200.0 * (fy - fz);
    (l, a_star, b_star)
}

/// CIE94 color difference, parameterized by application (textiles vs
/// graphic arts use different K1/K2 tolerances).
fn cie94(a: Color, b: Color, app: Cie94Application) -> u32 {
    let (l1, a1, b1) = to_lab(a);
    let (l2, a2, b2) = to_lab(b);
    let (k1, k2) = app.params();

    let c1 = (a1 * a1 + b1 * b1).sqrt();
    let c2 = (a2 * a2 + b2 * b2).sqrt();
    let delta_l = l1 - l2;
    let delta_c = c1 - c2;
    let delta_a = a1 - a2;
    let delta_b = b1 - b2;
    let delta_h_sq = (delta_a * delta_a + delta_b * delta_b - delta_c * delta_c).max(0.0);

    let sl = 1.0;
    let sc = 1.0 + k1 * c1;
    let sh = 1.0 + k2 * c1;

    let term_l = delta_l / sl;
    let term_c = delta_c / sc;
    let term_h_sq = delta_h_sq / (sh * sh);

    (term_l * term_l + term_c * term_c + term_h_sq).max(0.0) as u32
}

/// CIEDE2000, the most perceptually accurate of the CIE family. Scaled by
/// 100 and rounded so the result stays meaningful as an integer distance.
fn ciede2000(a: Color, b: Color) -> u32 {
    let (l1, a1, b1) = to_lab(a);
    let (l2, a2, b2) = to_lab(b);

    let c1 = (a1 * a1 + b1 * b1).sqrt();
    let c2 = (a2 * a2 + b2 * b2).sqrt();
    let c_bar = (c1 + c2) / 2.0;

    let c_bar7 = c_bar.powi(7);
    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + 25f64.powi(7))).sqrt());

    let a1p = a1 * (1.0 + g);
    let a2p = a2 * (1.0 + g);

    let c1p = (a1p * a1p + b1 * b1).sqrt();
    let c2p = (a2p * a2p + b2 * b2).sqrt();

    let h1p = if a1p == 0.0 && b1 == 0.0 {
        0.0
    } else {
        b1.atan2(a1p).to_degrees().rem_euclid(360.0)
    };
    let h2p = if a2p == 0.0 && b2 == 0.0 {
        0.0
    } else {
        b2.atan2(a2p).to_degrees().rem_euclid(360.0)
    };

    let delta_lp = l2 - l1;
    let delta_cp = c2p - c1p;

    let delta_hp_raw = if c1p * c2p == 0.0 {
        0.0
    } else {
        let diff = h2p - h1p;
        if diff.abs() <= 180.0 {
            diff
        } else if diff > 180.0 {
            diff - 360.0
        } else {
            diff + 360.0
        }
    };
    let delta_hp = 2.0 * (c1p * c2p).sqrt() * (delta_hp_raw.to_radians() / 2.0).sin();

    let l_bar_p = (l1 + l2) / 2.0;
    let c_bar_p = (c1p + c2p) / 2.0;

    let h_bar_p = if c1p * c2p == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 360.0 {
        (h1p + h2p + 360.0) / 2.0
    } else {
        (h1p + h2p - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (h_bar_p - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_bar_p).to_radians().cos()
        + 0.32 * (3.0 * h_bar_p + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_bar_p - 63.0).to_radians().cos();

    let delta_theta = 30.0 * (-(((h_bar_p - 275.0) / 25.0).powi(2))).exp();
    let c_bar_p7 = c_bar_p.powi(7);
    let rc = 2.0 * (c_bar_p7 / (c_bar_p7 + 25f64.powi(7))).sqrt();
    let sl = 1.0 + (0.015 * (l_bar_p - 50.0).powi(2)) / (20.0 + (l_bar_p - 50.0).powi(2)).sqrt();
    let sc = 1.0 + 0.045 * c_bar_p;
    let sh = 1.0 + 0.015 * c_bar_p * t;
    let rt = -rc * (2.0 * delta_theta.to_radians()).sin();

    let kl = 1.0;
    let kc = 1.0;
    let kh = 1.0;

    let term_l = delta_lp / (kl * sl);
    let term_c = delta_cp / (kc * sc);
    let term_h = delta_hp / (kh * sh);

    let delta_e = (term_l * term_l + term_c * term_c + term_h * term_h
        + rt * term_c * term_h)
        .max(0.0)
        .sqrt();

    (delta_e * 100.0).round() as u32
}
