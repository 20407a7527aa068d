use std::collections::BTreeMap;
use std::fmt;

use crate::animation::ease::Easing;
use crate::animation::units::{self, CssValue};
use crate::foundation::core::{clamp01, lerp};
use crate::foundation::error::{SeqError, SeqResult};

/// Endpoint value of a ranged segment: a plain number or a unit/color string.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum SegmentValue {
    Number(f64),
    Text(String),
}

impl From<f64> for SegmentValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for SegmentValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SegmentValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One piece of a piecewise progress-to-value mapping.
///
/// Over `[from, to]` of the global progress, the output moves from `start` to `end` along
/// `easing_function`.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangedSegment {
    pub from: f64,
    pub to: f64,
    pub start: SegmentValue,
    pub end: SegmentValue,
    #[serde(default, alias = "easing")]
    pub easing_function: Easing,
}

impl RangedSegment {
    pub fn new(
        from: f64,
        to: f64,
        start: impl Into<SegmentValue>,
        end: impl Into<SegmentValue>,
    ) -> Self {
        Self {
            from,
            to,
            start: start.into(),
            end: end.into(),
            easing_function: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: impl Into<Easing>) -> Self {
        self.easing_function = easing.into();
        self
    }
}

/// Output of a mapped target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MappedValue {
    Number(f64),
    Css(CssValue),
}

impl MappedValue {
    /// Numeric view: the number itself, or the magnitude of a length value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Css(c) => c.magnitude(),
        }
    }
}

impl fmt::Display for MappedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Css(c) => write!(f, "{c}"),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Endpoints {
    Number(f64, f64),
    Css(CssValue, CssValue),
}

#[derive(Clone, Debug)]
struct CompiledSegment {
    from: f64,
    to: f64,
    values: Endpoints,
    easing: Easing,
}

impl CompiledSegment {
    fn compile(id: &str, seg: &RangedSegment) -> SeqResult<Self> {
        if !seg.from.is_finite() || !seg.to.is_finite() {
            return Err(SeqError::invalid_range(format!(
                "target '{id}': segment bounds must be finite (from={}, to={})",
                seg.from, seg.to
            )));
        }
        if seg.from == seg.to {
            return Err(SeqError::invalid_range(format!(
                "target '{id}': from == to ({})",
                seg.from
            )));
        }
        if seg.from > seg.to {
            return Err(SeqError::invalid_range(format!(
                "target '{id}': from ({}) > to ({})",
                seg.from, seg.to
            )));
        }

        let values = match (&seg.start, &seg.end) {
            (SegmentValue::Number(a), SegmentValue::Number(b)) => Endpoints::Number(*a, *b),
            (SegmentValue::Text(a), SegmentValue::Text(b)) => {
                let a = units::parse(a)?;
                let b = units::parse(b)?;
                a.check_compatible(&b)?;
                Endpoints::Css(a, b)
            }
            (a, b) => {
                return Err(SeqError::unit_mismatch(format!(
                    "target '{id}': cannot interpolate {a:?} to {b:?}"
                )));
            }
        };

        Ok(Self {
            from: seg.from,
            to: seg.to,
            values,
            easing: seg.easing_function.clone(),
        })
    }

    fn constant(from: f64, to: f64, value: Endpoints, at_end: bool) -> Self {
        let values = match value {
            Endpoints::Number(a, b) => {
                let v = if at_end { b } else { a };
                Endpoints::Number(v, v)
            }
            Endpoints::Css(a, b) => {
                let v = if at_end { b } else { a };
                Endpoints::Css(v, v)
            }
        };
        Self {
            from,
            to,
            values,
            easing: Easing::default(),
        }
    }

    fn evaluate(&self, progress: f64) -> MappedValue {
        let child = clamp01((progress - self.from) / (self.to - self.from));
        let t = self.easing.apply(child);
        match self.values {
            Endpoints::Number(a, b) => MappedValue::Number(lerp(a, b, t)),
            // Endpoints were checked for compatibility at compile time.
            Endpoints::Css(a, b) => MappedValue::Css(a.interpolate(&b, t).unwrap_or(a)),
        }
    }
}

/// Converts one global progress scalar into independently configured output values.
#[derive(Clone, Debug, Default)]
pub struct ProgressMapper {
    targets: BTreeMap<String, Vec<CompiledSegment>>,
    last_computed_values: BTreeMap<String, MappedValue>,
}

impl ProgressMapper {
    /// Validate and compile every target's segments.
    pub fn new<I, K>(targets: I) -> SeqResult<Self>
    where
        I: IntoIterator<Item = (K, Vec<RangedSegment>)>,
        K: Into<String>,
    {
        let mut compiled = BTreeMap::new();
        for (id, segments) in targets {
            let id = id.into();
            let segs = compile_target(&id, &segments)?;
            compiled.insert(id, segs);
        }
        Ok(Self {
            targets: compiled,
            last_computed_values: BTreeMap::new(),
        })
    }

    /// Mapper with a single target.
    pub fn single(id: impl Into<String>, segments: Vec<RangedSegment>) -> SeqResult<Self> {
        Self::new([(id.into(), segments)])
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target_ids(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// Evaluate every target at `progress` and memoize the result.
    pub fn calculate(&mut self, progress: f64) -> &BTreeMap<String, MappedValue> {
        self.last_computed_values.clear();
        for (id, segs) in &self.targets {
            let matched = match_segment(segs, progress);
            self.last_computed_values
                .insert(id.clone(), matched.evaluate(progress));
        }
        &self.last_computed_values
    }

    /// Values from the most recent [`ProgressMapper::calculate`] call.
    pub fn get_calculations(&self) -> &BTreeMap<String, MappedValue> {
        &self.last_computed_values
    }

    pub fn value(&self, id: &str) -> Option<&MappedValue> {
        self.last_computed_values.get(id)
    }
}

fn compile_target(id: &str, segments: &[RangedSegment]) -> SeqResult<Vec<CompiledSegment>> {
    let mut out = segments
        .iter()
        .map(|s| CompiledSegment::compile(id, s))
        .collect::<SeqResult<Vec<_>>>()?;

    let (Some(first), Some(last)) = (out.first().cloned(), out.last().cloned()) else {
        return Err(SeqError::invalid_range(format!(
            "target '{id}' has no segments"
        )));
    };

    if first.from > 0.0 {
        out.insert(
            0,
            CompiledSegment::constant(0.0, first.from, first.values, false),
        );
    }
    if last.to < 1.0 {
        out.push(CompiledSegment::constant(last.to, 1.0, last.values, true));
    }
    Ok(out)
}

/// Declaration-order scan: advance while the current match ends at or before `progress`, but
/// never onto a segment that starts after it. Gaps keep the earlier segment.
fn match_segment(segs: &[CompiledSegment], progress: f64) -> &CompiledSegment {
    let mut matched = &segs[0];
    for s in segs {
        let prev = matched;
        if matched.to <= progress {
            matched = s;
        }
        if matched.from > progress {
            matched = prev;
        }
    }
    matched
}

#[cfg(test)]
#[path = "../../tests/unit/animation/mapper.rs"]
mod tests;
