//! Background-image style placement shared by every backend.

use crate::foundation::core::{Affine, Rect, Size};

/// How the image is fitted into the container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingMode {
    /// Fill the container, cropping the overflow.
    #[default]
    Cover,
    /// Fit entirely inside the container, letterboxing the rest.
    Contain,
}

/// Sizing and alignment of frames inside the container.
///
/// Edge overrides are fractions. On each axis the later-evaluated override wins (`right` over
/// `left`, `bottom` over `top`) because they are applied in that order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizingPolicy {
    pub mode: SizingMode,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub top_no_clip: bool,
    pub bottom_no_clip: bool,
    pub left_no_clip: bool,
    pub right_no_clip: bool,
    /// Accessible description of the sequence, surfaced to hosts that render one.
    pub aria_label: Option<String>,
}

impl SizingPolicy {
    pub fn cover() -> Self {
        Self::default()
    }

    pub fn contain() -> Self {
        Self {
            mode: SizingMode::Contain,
            ..Self::default()
        }
    }
}

/// Where and how large the image is drawn, in container pixels.
///
/// `x_offset`/`y_offset` are the per-axis slack `scaled - container`: the overflow available for
/// cropping in cover mode, negative letterbox space in contain mode. `x`/`y` is the resolved draw
/// origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub width: f64,
    pub height: f64,
    pub x_offset: f64,
    pub y_offset: f64,
    pub scalar: f64,
    pub x: f64,
    pub y: f64,
}

impl Placement {
    const EMPTY: Self = Self {
        width: 0.0,
        height: 0.0,
        x_offset: 0.0,
        y_offset: 0.0,
        scalar: 0.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn dest_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Image space to container space.
    pub fn transform(&self) -> Affine {
        Affine::translate((self.x, self.y)) * Affine::scale(self.scalar)
    }

    fn scaled(container: Size, image: Size, scalar: f64) -> Self {
        let width = image.width * scalar;
        let height = image.height * scalar;
        let x_offset = width - container.width;
        let y_offset = height - container.height;
        Self {
            width,
            height,
            x_offset,
            y_offset,
            scalar,
            x: -x_offset * 0.5,
            y: -y_offset * 0.5,
        }
    }
}

/// Scale to cover, centered.
pub fn calculate_background_cover(container: Size, image: Size) -> Placement {
    if container.is_empty() || image.is_empty() {
        return Placement::EMPTY;
    }
    let scalar = if image.aspect() >= container.aspect() {
        container.height / image.height
    } else {
        container.width / image.width
    };
    Placement::scaled(container, image, scalar)
}

/// Scale to fit inside, centered.
pub fn calculate_background_contain(container: Size, image: Size) -> Placement {
    if container.is_empty() || image.is_empty() {
        return Placement::EMPTY;
    }
    let scalar = (container.width / image.width).min(container.height / image.height);
    Placement::scaled(container, image, scalar)
}

/// Full placement for `policy`, including edge overrides.
pub fn place(container: Size, image: Size, policy: &SizingPolicy) -> Placement {
    match policy.mode {
        SizingMode::Cover => {
            let mut p = calculate_background_cover(container, image);
            if p.is_empty() {
                return p;
            }
            // Cover overrides pick how much of the overflow is cropped from the leading edge.
            if let Some(left) = policy.left {
                p.x = -p.x_offset * left;
            }
            if let Some(right) = policy.right {
                p.x = -p.x_offset * (1.0 - right);
            }
            if let Some(top) = policy.top {
                p.y = -p.y_offset * top;
            }
            if let Some(bottom) = policy.bottom {
                p.y = -p.y_offset * (1.0 - bottom);
            }
            p
        }
        SizingMode::Contain => {
            let mut p = calculate_background_contain(container, image);
            if p.is_empty() {
                return p;
            }
            let free_x = container.width - p.width;
            let free_y = container.height - p.height;
            if let Some(left) = policy.left {
                p.x = if policy.left_no_clip {
                    free_x * left.clamp(0.0, 1.0)
                } else {
                    container.width * left
                };
            }
            if let Some(right) = policy.right {
                p.x = if policy.right_no_clip {
                    free_x * (1.0 - right.clamp(0.0, 1.0))
                } else {
                    free_x - container.width * right
                };
            }
            if let Some(top) = policy.top {
                p.y = if policy.top_no_clip {
                    free_y * top.clamp(0.0, 1.0)
                } else {
                    container.height * top
                };
            }
            if let Some(bottom) = policy.bottom {
                p.y = if policy.bottom_no_clip {
                    free_y * (1.0 - bottom.clamp(0.0, 1.0))
                } else {
                    free_y - container.height * bottom
                };
            }
            p
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/placement.rs"]
mod tests;
