//! Color values.
//!
//! Colors keep the syntax they were authored in so the printer can reproduce
//! modern notations faithfully. Downleveling converts a modern color space to
//! its sRGB equivalent, preserving the rendered color within numeric
//! tolerance for targets that cannot parse the modern function.

use std::fmt;

use crate::compat::Feature;
use crate::error::Result;
use crate::printer::{Printer, ToCss};

/// An sRGB color with 8-bit channels and fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f32,
}

impl Rgba {
    pub fn new(red: u8, green: u8, blue: u8, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Build from floating channels in `0..=1`, clamping out-of-gamut values.
    pub fn from_floats(r: f32, g: f32, b: f32, alpha: f32) -> Self {
        Self {
            red: (r.clamp(0.0, 1.0) * 255.0).round() as u8,
            green: (g.clamp(0.0, 1.0) * 255.0).round() as u8,
            blue: (b.clamp(0.0, 1.0) * 255.0).round() as u8,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

/// A parsed color value, tagged by authored syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum CssColor {
    /// Hex or `rgb()`/`rgba()` notation. Legacy-safe.
    Rgba(Rgba),
    /// `hsl()`/`hsla()` notation. Legacy-safe.
    Hsl { h: f32, s: f32, l: f32, alpha: f32 },
    /// `hwb()` notation.
    Hwb { h: f32, w: f32, b: f32, alpha: f32 },
    /// `lab()` notation (CIE Lab, D50 white point). `l` in `0..=100`.
    Lab { l: f32, a: f32, b: f32, alpha: f32 },
    /// `lch()` notation.
    Lch { l: f32, c: f32, h: f32, alpha: f32 },
    /// `oklab()` notation. `l` in `0..=1`.
    Oklab { l: f32, a: f32, b: f32, alpha: f32 },
    /// `oklch()` notation.
    Oklch { l: f32, c: f32, h: f32, alpha: f32 },
}

impl CssColor {
    /// Parse a hex color token body (without the `#`).
    pub fn parse_hash(hash: &str) -> Option<CssColor> {
        let digit = |i: usize| -> Option<u8> {
            let c = hash.as_bytes().get(i)?;
            (*c as char).to_digit(16).map(|d| d as u8)
        };
        let pair = |i: usize| -> Option<u8> { Some(digit(i)? << 4 | digit(i + 1)?) };
        let dup = |i: usize| -> Option<u8> { Some(digit(i)? << 4 | digit(i)?) };

        let (r, g, b, a) = match hash.len() {
            3 => (dup(0)?, dup(1)?, dup(2)?, 255),
            4 => (dup(0)?, dup(1)?, dup(2)?, dup(3)?),
            6 => (pair(0)?, pair(2)?, pair(4)?, 255),
            8 => (pair(0)?, pair(2)?, pair(4)?, pair(6)?),
            _ => return None,
        };
        Some(CssColor::Rgba(Rgba::new(r, g, b, a as f32 / 255.0)))
    }

    /// The compatibility feature this syntax depends on, if any.
    pub fn feature(&self) -> Option<Feature> {
        match self {
            CssColor::Rgba(_) | CssColor::Hsl { .. } => None,
            CssColor::Hwb { .. } => Some(Feature::HwbColors),
            CssColor::Lab { .. } | CssColor::Lch { .. } => Some(Feature::LabColors),
            CssColor::Oklab { .. } | CssColor::Oklch { .. } => Some(Feature::OklabColors),
        }
    }

    /// Convert to sRGB, clamping out-of-gamut channels.
    pub fn to_rgba(&self) -> Rgba {
        match *self {
            CssColor::Rgba(rgba) => rgba,
            CssColor::Hsl { h, s, l, alpha } => {
                let (r, g, b) = hsl_to_rgb(h, s, l);
                Rgba::from_floats(r, g, b, alpha)
            }
            CssColor::Hwb { h, w, b, alpha } => {
                let (r, g, bl) = hwb_to_rgb(h, w, b);
                Rgba::from_floats(r, g, bl, alpha)
            }
            CssColor::Lab { l, a, b, alpha } => {
                let (r, g, bl) = lab_to_srgb(l, a, b);
                Rgba::from_floats(r, g, bl, alpha)
            }
            CssColor::Lch { l, c, h, alpha } => {
                let hr = h.to_radians();
                let (r, g, bl) = lab_to_srgb(l, c * hr.cos(), c * hr.sin());
                Rgba::from_floats(r, g, bl, alpha)
            }
            CssColor::Oklab { l, a, b, alpha } => {
                let (r, g, bl) = oklab_to_srgb(l, a, b);
                Rgba::from_floats(r, g, bl, alpha)
            }
            CssColor::Oklch { l, c, h, alpha } => {
                let hr = h.to_radians();
                let (r, g, bl) = oklab_to_srgb(l, c * hr.cos(), c * hr.sin());
                Rgba::from_floats(r, g, bl, alpha)
            }
        }
    }

    /// Rewrite this color in place to its legacy sRGB form.
    pub fn downlevel(&mut self) {
        *self = CssColor::Rgba(self.to_rgba());
    }
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// `h` in degrees, `s`/`l` in `0..=1`.
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> (f32, f32, f32) {
    if s == 0.0 {
        return (l, l, l);
    }
    let h = (h.rem_euclid(360.0)) / 360.0;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

/// `h` in degrees, `w`/`b` in `0..=1`.
fn hwb_to_rgb(h: f32, w: f32, b: f32) -> (f32, f32, f32) {
    if w + b >= 1.0 {
        let gray = w / (w + b);
        return (gray, gray, gray);
    }
    let (r, g, bl) = hsl_to_rgb(h, 1.0, 0.5);
    let scale = |c: f32| c * (1.0 - w - b) + w;
    (scale(r), scale(g), scale(bl))
}

fn srgb_gamma(c: f32) -> f32 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// CIE Lab (D50) to gamma-encoded sRGB.
fn lab_to_srgb(l: f32, a: f32, b: f32) -> (f32, f32, f32) {
    const EPSILON: f32 = 216.0 / 24389.0;
    const KAPPA: f32 = 24389.0 / 27.0;

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let finv = |t: f32| {
        let t3 = t * t * t;
        if t3 > EPSILON { t3 } else { (116.0 * t - 16.0) / KAPPA }
    };

    // D50 reference white.
    let x = finv(fx) * 0.96422;
    let y = if l > KAPPA * EPSILON {
        fy * fy * fy
    } else {
        l / KAPPA
    };
    let z = finv(fz) * 0.82521;

    // Combined D50 XYZ -> linear sRGB (includes Bradford adaptation to D65).
    let r = 3.1338561 * x - 1.6168667 * y - 0.4906146 * z;
    let g = -0.9787684 * x + 1.9161415 * y + 0.0334540 * z;
    let bl = 0.0719453 * x - 0.2289914 * y + 1.4052427 * z;

    (srgb_gamma(r), srgb_gamma(g), srgb_gamma(bl))
}

/// Oklab to gamma-encoded sRGB.
fn oklab_to_srgb(l: f32, a: f32, b: f32) -> (f32, f32, f32) {
    let l_ = l + 0.39633778 * a + 0.21580376 * b;
    let m_ = l - 0.105561346 * a - 0.06385417 * b;
    let s_ = l - 0.08948418 * a - 1.2914855 * b;

    let l3 = l_ * l_ * l_;
    let m3 = m_ * m_ * m_;
    let s3 = s_ * s_ * s_;

    let r = 4.0767417 * l3 - 3.3077116 * m3 + 0.23096992 * s3;
    let g = -1.268438 * l3 + 2.6097574 * m3 - 0.34131938 * s3;
    let bl = -0.0041960863 * l3 - 0.7034186 * m3 + 1.7076147 * s3;

    (srgb_gamma(r), srgb_gamma(g), srgb_gamma(bl))
}

impl ToCss for CssColor {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        match *self {
            CssColor::Rgba(rgba) => {
                if rgba.alpha >= 1.0 {
                    write_hex(rgba, dest)
                } else {
                    // rgba() stays parseable by every legacy grammar.
                    dest.write_str("rgba(")?;
                    dest.write_number(rgba.red as f32)?;
                    dest.delim(',', false)?;
                    dest.write_number(rgba.green as f32)?;
                    dest.delim(',', false)?;
                    dest.write_number(rgba.blue as f32)?;
                    dest.delim(',', false)?;
                    dest.write_number(round3(rgba.alpha))?;
                    dest.write_char(')')
                }
            }
            CssColor::Hsl { h, s, l, alpha } => {
                dest.write_str(if alpha < 1.0 { "hsla(" } else { "hsl(" })?;
                dest.write_number(h)?;
                dest.delim(',', false)?;
                dest.write_number(s * 100.0)?;
                dest.write_char('%')?;
                dest.delim(',', false)?;
                dest.write_number(l * 100.0)?;
                dest.write_char('%')?;
                if alpha < 1.0 {
                    dest.delim(',', false)?;
                    dest.write_number(round3(alpha))?;
                }
                dest.write_char(')')
            }
            CssColor::Hwb { h, w, b, alpha } => {
                dest.write_str("hwb(")?;
                dest.write_number(h)?;
                dest.write_char(' ')?;
                dest.write_number(w * 100.0)?;
                dest.write_char('%')?;
                dest.write_char(' ')?;
                dest.write_number(b * 100.0)?;
                dest.write_char('%')?;
                write_alpha_slash(alpha, dest)?;
                dest.write_char(')')
            }
            CssColor::Lab { l, a, b, alpha } => {
                dest.write_str("lab(")?;
                dest.write_number(l)?;
                dest.write_char('%')?;
                dest.write_char(' ')?;
                dest.write_number(a)?;
                dest.write_char(' ')?;
                dest.write_number(b)?;
                write_alpha_slash(alpha, dest)?;
                dest.write_char(')')
            }
            CssColor::Lch { l, c, h, alpha } => {
                dest.write_str("lch(")?;
                dest.write_number(l)?;
                dest.write_char('%')?;
                dest.write_char(' ')?;
                dest.write_number(c)?;
                dest.write_char(' ')?;
                dest.write_number(h)?;
                write_alpha_slash(alpha, dest)?;
                dest.write_char(')')
            }
            CssColor::Oklab { l, a, b, alpha } => {
                dest.write_str("oklab(")?;
                dest.write_number(l)?;
                dest.write_char(' ')?;
                dest.write_number(a)?;
                dest.write_char(' ')?;
                dest.write_number(b)?;
                write_alpha_slash(alpha, dest)?;
                dest.write_char(')')
            }
            CssColor::Oklch { l, c, h, alpha } => {
                dest.write_str("oklch(")?;
                dest.write_number(l)?;
                dest.write_char(' ')?;
                dest.write_number(c)?;
                dest.write_char(' ')?;
                dest.write_number(h)?;
                write_alpha_slash(alpha, dest)?;
                dest.write_char(')')
            }
        }
    }
}

fn write_alpha_slash<W: fmt::Write>(alpha: f32, dest: &mut Printer<'_, W>) -> Result<()> {
    if alpha < 1.0 {
        dest.write_str(" / ")?;
        dest.write_number(round3(alpha))?;
    }
    Ok(())
}

fn write_hex<W: fmt::Write>(rgba: Rgba, dest: &mut Printer<'_, W>) -> Result<()> {
    let (r, g, b) = (rgba.red, rgba.green, rgba.blue);
    let fold = |c: u8| -> Option<u8> {
        if c >> 4 == c & 0xf { Some(c & 0xf) } else { None }
    };
    if dest.minify
        && let (Some(r4), Some(g4), Some(b4)) = (fold(r), fold(g), fold(b))
    {
        return dest.write_fmt(format_args!("#{:x}{:x}{:x}", r4, g4, b4));
    }
    dest.write_fmt(format_args!("#{:02x}{:02x}{:02x}", r, g, b))
}

fn round3(v: f32) -> f32 {
    (v * 1000.0).round() / 1000.0
}
