use crate::assets::decode::DecodeSlot;
use crate::assets::loader::ResourceCache;
use crate::foundation::core::{Lifecycle, Size};
use crate::foundation::error::SeqResult;
use crate::render::backend::{FrameBackend, FrameRGBA, PaintRequest};
use crate::render::clip::InsetClip;
use crate::render::placement::{SizingPolicy, place};

/// Counters describing what the renderer actually did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub paints: u64,
    pub decodes: u64,
    pub decode_failures: u64,
    pub skipped_identical: u64,
    pub skipped_missing: u64,
    /// Largest number of decoded frames alive at once.
    pub max_live_decoded: usize,
}

/// Why a draw request did not reach the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Disposed,
    Identical,
    NoSource,
    NotCached,
    DecodeFailed,
    BackendFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    Painted,
    Skipped(SkipReason),
}

/// Paints the requested cached frame onto a [`FrameBackend`].
///
/// At most one decoded frame is alive at any time: each draw decodes through a single transient
/// handle and drops the pixels once the backend has consumed them.
pub struct Renderer {
    backend: Box<dyn FrameBackend>,
    slot: DecodeSlot,
    sizing: SizingPolicy,
    /// Surface size in device pixels.
    surface: Size,
    clip: Option<InsetClip>,
    last_requested: Option<String>,
    last_render_source: Option<String>,
    natural_size: Option<Size>,
    lifecycle: Lifecycle,
    stats: RenderStats,
}

impl Renderer {
    pub fn new(backend: Box<dyn FrameBackend>, sizing: SizingPolicy) -> Self {
        let (w, h) = backend.size();
        Self {
            backend,
            slot: DecodeSlot::new(),
            sizing,
            surface: Size::new(f64::from(w), f64::from(h)),
            clip: None,
            last_requested: None,
            last_render_source: None,
            natural_size: None,
            lifecycle: Lifecycle::Active,
            stats: RenderStats::default(),
        }
    }

    /// Draw `source` from `cache`.
    ///
    /// Requesting the same source twice in a row is a no-op until something invalidates the
    /// surface (resize, sizing change, clip change).
    #[tracing::instrument(level = "trace", skip(self, cache))]
    pub fn draw(&mut self, source: Option<&str>, cache: Option<&ResourceCache>) -> DrawOutcome {
        if self.lifecycle.is_disposed() {
            return DrawOutcome::Skipped(SkipReason::Disposed);
        }
        if self.last_requested.as_deref() == source {
            self.stats.skipped_identical += 1;
            return DrawOutcome::Skipped(SkipReason::Identical);
        }
        self.last_requested = source.map(str::to_owned);

        let Some(source) = source else {
            return DrawOutcome::Skipped(SkipReason::NoSource);
        };
        let Some(bytes) = cache.and_then(|c| c.get(source)).cloned() else {
            tracing::trace!(source, "frame not cached yet");
            self.stats.skipped_missing += 1;
            self.last_requested = None;
            return DrawOutcome::Skipped(SkipReason::NotCached);
        };

        let frame = match self.slot.acquire(source, bytes).decode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(source, error = %e, "frame decode failed");
                self.stats.decode_failures += 1;
                self.last_requested = None;
                return DrawOutcome::Skipped(SkipReason::DecodeFailed);
            }
        };
        self.stats.decodes += 1;

        let image = Size::new(f64::from(frame.width), f64::from(frame.height));
        self.natural_size.get_or_insert(image);

        let placement = place(self.surface, image, &self.sizing);
        let clip = self
            .clip
            .filter(|c| !c.is_noop())
            .map(|c| c.to_rounded_rect(self.surface));

        let painted = self.backend.paint(PaintRequest {
            frame: &frame,
            placement,
            clip,
        });
        self.stats.max_live_decoded = self.stats.max_live_decoded.max(self.slot.peak_decoded());
        drop(frame);

        match painted {
            Ok(()) => {
                self.stats.paints += 1;
                self.last_render_source = Some(source.to_owned());
                DrawOutcome::Painted
            }
            Err(e) => {
                tracing::warn!(source, error = %e, "backend paint failed");
                self.last_requested = None;
                DrawOutcome::Skipped(SkipReason::BackendFailed)
            }
        }
    }

    /// `true` if drawing `source` now would hit the identity check.
    pub fn is_current(&self, source: &str) -> bool {
        self.last_requested.as_deref() == Some(source)
    }

    /// Forget the last request so the next draw always paints.
    pub fn invalidate(&mut self) {
        self.last_requested = None;
    }

    pub fn set_clip(&mut self, clip: Option<InsetClip>) {
        if self.clip != clip {
            self.clip = clip;
            self.invalidate();
        }
    }

    pub fn set_sizing_policy(&mut self, sizing: SizingPolicy) {
        if self.sizing != sizing {
            self.sizing = sizing;
            self.invalidate();
        }
    }

    pub fn sizing_policy(&self) -> &SizingPolicy {
        &self.sizing
    }

    /// Resize the surface in device pixels.
    pub fn resize(&mut self, width: u32, height: u32) -> SeqResult<()> {
        self.backend.resize(width, height)?;
        self.surface = Size::new(f64::from(width), f64::from(height));
        self.invalidate();
        Ok(())
    }

    /// Forget everything tied to the previous image set.
    pub fn reset_sources(&mut self) {
        self.last_requested = None;
        self.last_render_source = None;
        self.natural_size = None;
    }

    pub fn surface_size(&self) -> Size {
        self.surface
    }

    pub fn last_render_source(&self) -> Option<&str> {
        self.last_render_source.as_deref()
    }

    /// Natural size of the first frame decoded for the current set.
    pub fn natural_size(&self) -> Option<Size> {
        self.natural_size
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn live_decoded(&self) -> usize {
        self.slot.live_decoded()
    }

    pub fn live_textures(&self) -> usize {
        self.backend.live_textures()
    }

    pub fn snapshot(&mut self) -> SeqResult<FrameRGBA> {
        self.backend.snapshot()
    }

    pub fn dispose(&mut self) {
        self.lifecycle = Lifecycle::Disposed;
        self.reset_sources();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
