//! Parsing and formatting of unit-tagged and color values (`"30px"`, `"rgba(0, 0, 0, 0.5)"`).
//!
//! Values are decomposed into a numeric magnitude plus a tag so they can be interpolated
//! numerically (or channel-wise for colors) and re-tagged afterwards.

use std::fmt;

use crate::foundation::core::lerp;
use crate::foundation::error::{SeqError, SeqResult};

/// Length, angle and time units understood by [`parse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Bare number written as a string (`"1.5"`).
    None,
    Px,
    Percent,
    Em,
    Rem,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Deg,
    Rad,
    Turn,
    S,
    Ms,
}

impl Unit {
    pub const ALL: [Unit; 14] = [
        Unit::None,
        Unit::Px,
        Unit::Percent,
        Unit::Em,
        Unit::Rem,
        Unit::Vw,
        Unit::Vh,
        Unit::Vmin,
        Unit::Vmax,
        Unit::Deg,
        Unit::Rad,
        Unit::Turn,
        Unit::S,
        Unit::Ms,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Px => "px",
            Self::Percent => "%",
            Self::Em => "em",
            Self::Rem => "rem",
            Self::Vw => "vw",
            Self::Vh => "vh",
            Self::Vmin => "vmin",
            Self::Vmax => "vmax",
            Self::Deg => "deg",
            Self::Rad => "rad",
            Self::Turn => "turn",
            Self::S => "s",
            Self::Ms => "ms",
        }
    }

    fn from_suffix(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|u| u.suffix().eq_ignore_ascii_case(s))
    }
}

/// Straight-alpha color; `r,g,b` in `0..=255`, `a` in `0..=1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            r: lerp(self.r, other.r, t),
            g: lerp(self.g, other.g, t),
            b: lerp(self.b, other.b, t),
            a: lerp(self.a, other.a, t),
        }
    }
}

/// A parsed string value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CssValue {
    Length { value: f64, unit: Unit },
    Color(Rgba),
}

impl CssValue {
    /// Numeric magnitude of a length value.
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Self::Length { value, .. } => Some(*value),
            Self::Color(_) => None,
        }
    }

    /// Fail with [`SeqError::UnitMismatch`] unless `self` and `other` interpolate together.
    pub fn check_compatible(&self, other: &Self) -> SeqResult<()> {
        match (self, other) {
            (Self::Length { unit: a, .. }, Self::Length { unit: b, .. }) if a == b => Ok(()),
            (Self::Color(_), Self::Color(_)) => Ok(()),
            _ => Err(SeqError::unit_mismatch(format!(
                "cannot interpolate '{self}' to '{other}'"
            ))),
        }
    }

    /// Interpolate towards `other` by `t`. Cross-unit pairs are rejected, never coerced.
    pub fn interpolate(&self, other: &Self, t: f64) -> SeqResult<Self> {
        match (self, other) {
            (Self::Length { value: a, unit: ua }, Self::Length { value: b, unit: ub })
                if ua == ub =>
            {
                Ok(Self::Length {
                    value: lerp(*a, *b, t),
                    unit: *ua,
                })
            }
            (Self::Color(a), Self::Color(b)) => Ok(Self::Color(a.lerp(*b, t))),
            _ => self.check_compatible(other).map(|_| *self),
        }
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length { value, unit } => write!(f, "{}{}", fmt_num(*value), unit.suffix()),
            Self::Color(c) => write!(
                f,
                "rgba({}, {}, {}, {})",
                c.r.round().clamp(0.0, 255.0),
                c.g.round().clamp(0.0, 255.0),
                c.b.round().clamp(0.0, 255.0),
                fmt_num(c.a.clamp(0.0, 1.0)),
            ),
        }
    }
}

/// Parse a unit-tagged number or a color string.
pub fn parse(s: &str) -> SeqResult<CssValue> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SeqError::parse("empty value string"));
    }
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex).map(CssValue::Color);
    }
    let lower = s.to_ascii_lowercase();
    if lower.starts_with("rgb") {
        return parse_rgb_fn(&lower).map(CssValue::Color);
    }

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(s.len());
    let (num, suffix) = s.split_at(split);
    let value: f64 = num
        .parse()
        .map_err(|_| SeqError::parse(format!("invalid number in '{s}'")))?;
    let unit = Unit::from_suffix(suffix.trim())
        .ok_or_else(|| SeqError::parse(format!("unsupported unit '{suffix}' in '{s}'")))?;
    Ok(CssValue::Length { value, unit })
}

/// Inverse of [`parse`].
pub fn format(v: &CssValue) -> String {
    v.to_string()
}

fn fmt_num(v: f64) -> String {
    // Trim float noise from interpolation (0.30000000000000004).
    let r = (v * 1_000_000.0).round() / 1_000_000.0;
    let r = if r == 0.0 { 0.0 } else { r };
    format!("{r}")
}

fn parse_hex(hex: &str) -> SeqResult<Rgba> {
    fn byte(pair: &str) -> SeqResult<f64> {
        u8::from_str_radix(pair, 16)
            .map(f64::from)
            .map_err(|_| SeqError::parse(format!("invalid hex byte \"{pair}\"")))
    }

    if !hex.is_ascii() {
        return Err(SeqError::parse(format!("invalid hex color '#{hex}'")));
    }
    match hex.len() {
        3 => {
            let mut ch = [0.0; 3];
            for (i, c) in hex.chars().enumerate() {
                ch[i] = byte(&format!("{c}{c}"))?;
            }
            Ok(Rgba::new(ch[0], ch[1], ch[2], 1.0))
        }
        6 => Ok(Rgba::new(
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            1.0,
        )),
        8 => Ok(Rgba::new(
            byte(&hex[0..2])?,
            byte(&hex[2..4])?,
            byte(&hex[4..6])?,
            byte(&hex[6..8])? / 255.0,
        )),
        _ => Err(SeqError::parse(
            "hex color must be #RGB, #RRGGBB or #RRGGBBAA",
        )),
    }
}

fn parse_rgb_fn(s: &str) -> SeqResult<Rgba> {
    let open = s
        .find('(')
        .ok_or_else(|| SeqError::parse(format!("missing '(' in '{s}'")))?;
    let inner = s[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| SeqError::parse(format!("missing ')' in '{s}'")))?;
    let parts = inner
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| SeqError::parse(format!("invalid color channel '{}'", p.trim())))
        })
        .collect::<SeqResult<Vec<_>>>()?;
    match parts.as_slice() {
        [r, g, b] => Ok(Rgba::new(*r, *g, *b, 1.0)),
        [r, g, b, a] => Ok(Rgba::new(*r, *g, *b, *a)),
        _ => Err(SeqError::parse(format!(
            "color function needs 3 or 4 channels, got {}",
            parts.len()
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/units.rs"]
mod tests;
