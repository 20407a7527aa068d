use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{SeqError, SeqResult};
use crate::render::backend::BackendKind;

/// Engine tuning knobs.
///
/// Every field has a default, so a JSON options file only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineOpts {
    /// Paint ceiling in frames per second. `None` disables rate limiting.
    pub fps: Option<f64>,
    /// Fraction of the remaining distance covered per tick when converging. `1.0` snaps.
    pub lerp_amount: f64,
    /// Extra attempts per resource after a failed fetch.
    pub max_retries: u32,
    /// Overrides the host device pixel ratio when set.
    pub device_pixel_ratio: Option<f64>,
    /// Clear color painted behind every frame (straight RGBA8).
    pub clear_rgba: Option<[u8; 4]>,
    pub backend: BackendKind,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            fps: Some(60.0),
            lerp_amount: 1.0,
            max_retries: 3,
            device_pixel_ratio: None,
            clear_rgba: None,
            backend: BackendKind::Raster,
        }
    }
}

impl EngineOpts {
    pub fn with_fps(mut self, fps: Option<f64>) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_lerp_amount(mut self, lerp_amount: f64) -> Self {
        self.lerp_amount = lerp_amount;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_device_pixel_ratio(mut self, dpr: Option<f64>) -> Self {
        self.device_pixel_ratio = dpr;
        self
    }

    pub fn with_clear_rgba(mut self, clear: Option<[u8; 4]>) -> Self {
        self.clear_rgba = clear;
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn validate(&self) -> SeqResult<()> {
        if let Some(fps) = self.fps
            && !(fps.is_finite() && fps > 0.0)
        {
            return Err(SeqError::config(format!("fps must be finite and > 0, got {fps}")));
        }
        if !(self.lerp_amount > 0.0 && self.lerp_amount <= 1.0) {
            return Err(SeqError::config(format!(
                "lerpAmount must be in (0, 1], got {}",
                self.lerp_amount
            )));
        }
        if let Some(dpr) = self.device_pixel_ratio
            && !(dpr.is_finite() && dpr > 0.0)
        {
            return Err(SeqError::config(format!(
                "devicePixelRatio must be finite and > 0, got {dpr}"
            )));
        }
        Ok(())
    }

    /// Read and validate options from a JSON file.
    pub fn from_json_path(path: &Path) -> SeqResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read engine options '{}'", path.display()))?;
        let opts: Self = serde_json::from_str(&text)
            .map_err(|e| SeqError::config(format!("{}: {e}", path.display())))?;
        opts.validate()?;
        Ok(opts)
    }
}
