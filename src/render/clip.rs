//! Inset clip driven by progress.

use std::collections::BTreeMap;

use crate::animation::mapper::{MappedValue, ProgressMapper, RangedSegment, SegmentValue};
use crate::animation::units::{self, CssValue, Unit};
use crate::foundation::core::{Rect, RoundedRect, Size};
use crate::foundation::error::{SeqError, SeqResult};

/// Mapper ids the clip mapper writes.
pub const CLIP_TOP: &str = "top";
pub const CLIP_RIGHT: &str = "right";
pub const CLIP_BOTTOM: &str = "bottom";
pub const CLIP_LEFT: &str = "left";
pub const CLIP_BORDER_RADIUS: &str = "borderRadius";

/// Rectangular inset with rounded corners. Each side is a fraction of the container.
///
/// Clip segments take plain numbers (`0.1`), unitless strings (`"0.1"`) or percentages
/// (`"10%"`). Absolute units are rejected when the clip is set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InsetClip {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    /// Corner radius as a fraction of the container's shorter side.
    pub border_radius: f64,
}

impl InsetClip {
    /// Build from the latest clip mapper output. Missing ids default to `0`.
    pub fn from_values(values: &BTreeMap<String, MappedValue>) -> Self {
        let get = |id: &str| values.get(id).map(fraction).unwrap_or(0.0);
        Self {
            top: get(CLIP_TOP),
            right: get(CLIP_RIGHT),
            bottom: get(CLIP_BOTTOM),
            left: get(CLIP_LEFT),
            border_radius: get(CLIP_BORDER_RADIUS),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.top <= 0.0
            && self.right <= 0.0
            && self.bottom <= 0.0
            && self.left <= 0.0
            && self.border_radius <= 0.0
    }

    /// Visible rectangle inside `container`; collapses to zero area instead of inverting.
    pub fn to_rect(&self, container: Size) -> Rect {
        let x0 = container.width * self.left;
        let y0 = container.height * self.top;
        let x1 = (container.width - container.width * self.right).max(x0);
        let y1 = (container.height - container.height * self.bottom).max(y0);
        Rect::new(x0, y0, x1, y1)
    }

    pub fn to_rounded_rect(&self, container: Size) -> RoundedRect {
        let rect = self.to_rect(container);
        let max_radius = rect.width().min(rect.height()) * 0.5;
        let radius = (container.width.min(container.height) * self.border_radius)
            .clamp(0.0, max_radius.max(0.0));
        RoundedRect::from_rect(rect, radius)
    }
}

fn fraction(v: &MappedValue) -> f64 {
    match v {
        MappedValue::Number(n) => *n,
        MappedValue::Css(CssValue::Length {
            value,
            unit: Unit::Percent,
        }) => value / 100.0,
        MappedValue::Css(CssValue::Length { value, .. }) => *value,
        MappedValue::Css(CssValue::Color(_)) => 0.0,
    }
}

fn check_fraction(side: &str, v: &SegmentValue) -> SeqResult<()> {
    let SegmentValue::Text(text) = v else {
        return Ok(());
    };
    match units::parse(text)? {
        CssValue::Length {
            unit: Unit::None | Unit::Percent,
            ..
        } => Ok(()),
        _ => Err(SeqError::unit_mismatch(format!(
            "clip {side} value '{text}' must be a fraction or a percentage"
        ))),
    }
}

/// Clip animation over progress.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClipInterpolation {
    Inset(InsetSegments),
}

/// Segment lists per inset side. Sides left empty stay at `0`.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InsetSegments {
    pub top: Vec<RangedSegment>,
    pub right: Vec<RangedSegment>,
    pub bottom: Vec<RangedSegment>,
    pub left: Vec<RangedSegment>,
    pub border_radius: Vec<RangedSegment>,
}

impl ClipInterpolation {
    pub(crate) fn into_mapper(self) -> SeqResult<ProgressMapper> {
        let Self::Inset(sides) = self;
        let targets = [
            (CLIP_TOP, sides.top),
            (CLIP_RIGHT, sides.right),
            (CLIP_BOTTOM, sides.bottom),
            (CLIP_LEFT, sides.left),
            (CLIP_BORDER_RADIUS, sides.border_radius),
        ]
        .into_iter()
        .filter(|(_, segs)| !segs.is_empty())
        .collect::<Vec<_>>();
        for (side, segs) in &targets {
            for seg in segs {
                check_fraction(side, &seg.start)?;
                check_fraction(side, &seg.end)?;
            }
        }
        ProgressMapper::new(targets)
    }
}
