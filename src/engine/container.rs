use std::sync::RwLock;

use crate::foundation::core::Size;

/// Viewport the sequence is drawn into.
pub trait Container: Send + Sync {
    /// Current content box in CSS pixels.
    fn content_box(&self) -> Size;

    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }
}

/// Container with a host-controlled size.
#[derive(Debug)]
pub struct FixedContainer {
    size: RwLock<Size>,
    dpr: f64,
}

impl FixedContainer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: RwLock::new(Size::new(width, height)),
            dpr: 1.0,
        }
    }

    pub fn with_device_pixel_ratio(mut self, dpr: f64) -> Self {
        self.dpr = dpr;
        self
    }

    /// Change the content box. The engine picks it up on its next smart resize.
    pub fn set_size(&self, width: f64, height: f64) {
        match self.size.write() {
            Ok(mut size) => *size = Size::new(width, height),
            Err(poisoned) => *poisoned.into_inner() = Size::new(width, height),
        }
    }
}

impl Container for FixedContainer {
    fn content_box(&self) -> Size {
        match self.size.read() {
            Ok(size) => *size,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }
}
