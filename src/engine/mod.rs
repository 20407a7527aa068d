//! The public facade wiring loader, mapper, scheduler, renderer and playback together.

pub mod container;
pub mod image_set;

use std::sync::Arc;

use crate::animation::mapper::{ProgressMapper, RangedSegment};
use crate::assets::decode::read_dimensions;
use crate::assets::fetch::{AnyFetcher, Fetcher};
use crate::assets::loader::{LoadSummary, ResourceLoader};
use crate::config::EngineOpts;
use crate::foundation::core::{Lifecycle, Size, clamp01, lerp};
use crate::foundation::error::{SeqError, SeqResult};
use crate::playback::{PlaybackController, PlaybackHandle, PlaybackOutcome};
use crate::render::backend::{FrameBackend, FrameRGBA, RenderSettings, create_backend};
use crate::render::clip::{ClipInterpolation, InsetClip};
use crate::render::placement::SizingPolicy;
use crate::render::renderer::{DrawOutcome, RenderStats, Renderer};
use crate::schedule::clock::{Clock, SystemClock};
use crate::schedule::scheduler::{FrameScheduler, FrameState};

use self::container::Container;
use self::image_set::{ImageSet, select_active};

/// Mapper id whose value drives frame selection.
pub const FRAME_TARGET: &str = "progress";

/// Configures and validates a [`SequenceEngine`].
pub struct SequenceEngineBuilder<F = AnyFetcher> {
    container: Option<Arc<dyn Container>>,
    image_sets: Vec<ImageSet>,
    sizing: SizingPolicy,
    dpr: Option<f64>,
    opts: EngineOpts,
    clock: Option<Arc<dyn Clock>>,
    fetcher: F,
    backend: Option<Box<dyn FrameBackend>>,
}

impl<F: Fetcher> SequenceEngineBuilder<F> {
    pub fn container(mut self, container: Arc<dyn Container>) -> Self {
        self.container = Some(container);
        self
    }

    pub fn image_sets(mut self, sets: impl IntoIterator<Item = ImageSet>) -> Self {
        self.image_sets = sets.into_iter().collect();
        self
    }

    pub fn image_set(mut self, set: ImageSet) -> Self {
        self.image_sets.push(set);
        self
    }

    pub fn sizing_policy(mut self, sizing: SizingPolicy) -> Self {
        self.sizing = sizing;
        self
    }

    /// Overrides both the container's ratio and `EngineOpts::device_pixel_ratio`.
    pub fn device_pixel_ratio(mut self, dpr: f64) -> Self {
        self.dpr = Some(dpr);
        self
    }

    pub fn opts(mut self, opts: EngineOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a caller-provided surface instead of creating one from `EngineOpts::backend`.
    pub fn backend(mut self, backend: Box<dyn FrameBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn fetcher<G: Fetcher>(self, fetcher: G) -> SequenceEngineBuilder<G> {
        SequenceEngineBuilder {
            container: self.container,
            image_sets: self.image_sets,
            sizing: self.sizing,
            dpr: self.dpr,
            opts: self.opts,
            clock: self.clock,
            fetcher,
            backend: self.backend,
        }
    }

    pub fn build(self) -> SeqResult<SequenceEngine<F>> {
        let container = self.container.ok_or(SeqError::NoElement)?;
        if self.image_sets.is_empty() {
            return Err(SeqError::NoImageSets);
        }
        self.opts.validate()?;

        let active_set = select_active(&self.image_sets);
        if let Some(idx) = active_set
            && self.image_sets[idx].images.is_empty()
        {
            return Err(SeqError::no_images(format!("image set #{idx} is empty")));
        }

        let dpr_override = self.dpr.or(self.opts.device_pixel_ratio);
        let dpr = resolve_dpr(dpr_override, container.as_ref());
        let (width, height) = container.content_box().scale(dpr).to_pixels();
        let backend = match self.backend {
            Some(mut backend) => {
                backend.resize(width, height)?;
                backend
            }
            None => create_backend(
                self.opts.backend,
                &RenderSettings {
                    clear_rgba: self.opts.clear_rgba,
                },
                width,
                height,
            )?,
        };
        tracing::debug!(width, height, dpr, ?active_set, "sequence engine built");

        Ok(SequenceEngine {
            container,
            image_sets: self.image_sets,
            active_set,
            dpr_override,
            loader: ResourceLoader::new(self.fetcher, self.opts.max_retries),
            loaded: None,
            image_size: None,
            mapper: None,
            clip_mapper: None,
            scheduler: FrameScheduler::new(self.opts.lerp_amount, self.opts.fps),
            renderer: Renderer::new(backend, self.sizing),
            playback: PlaybackController::new(),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            lifecycle: Lifecycle::Active,
            last_progress: None,
            last_driven: None,
        })
    }
}

/// Progress-driven image sequence player.
///
/// The host feeds progress through [`SequenceEngine::render_by_progress`] or
/// [`SequenceEngine::play`], and calls [`SequenceEngine::tick`] once per animation frame to let
/// smoothing, playback and trailing paints advance.
pub struct SequenceEngine<F = AnyFetcher> {
    container: Arc<dyn Container>,
    image_sets: Vec<ImageSet>,
    active_set: Option<usize>,
    dpr_override: Option<f64>,
    loader: ResourceLoader<F>,
    loaded: Option<(usize, LoadSummary)>,
    image_size: Option<Size>,
    mapper: Option<ProgressMapper>,
    clip_mapper: Option<ProgressMapper>,
    scheduler: FrameScheduler,
    renderer: Renderer,
    playback: PlaybackController,
    clock: Arc<dyn Clock>,
    lifecycle: Lifecycle,
    /// Last progress passed in by the caller, before any mapping.
    last_progress: Option<f64>,
    /// Last progress that drove frame selection.
    last_driven: Option<f64>,
}

impl SequenceEngine {
    pub fn builder() -> SequenceEngineBuilder {
        SequenceEngineBuilder {
            container: None,
            image_sets: Vec::new(),
            sizing: SizingPolicy::default(),
            dpr: None,
            opts: EngineOpts::default(),
            clock: None,
            fetcher: AnyFetcher::default(),
            backend: None,
        }
    }
}

impl<F: Fetcher> SequenceEngine<F> {
    /// Fetch every image of the active set. Idempotent per active set.
    #[tracing::instrument(skip(self))]
    pub async fn load(&mut self) -> LoadSummary {
        if self.lifecycle.is_disposed() {
            return LoadSummary::default();
        }
        let Some(idx) = self.active_set else {
            return LoadSummary::default();
        };
        if let Some((loaded_idx, summary)) = &self.loaded
            && *loaded_idx == idx
        {
            return summary.clone();
        }

        let sources = self.image_sets[idx].images.clone();
        let summary = self.loader.load(sources).await;
        if summary.discarded || self.lifecycle.is_disposed() {
            return summary;
        }
        if !summary.failed.is_empty() {
            tracing::debug!(failed = summary.failed.len(), "some frames failed to load");
        }

        self.image_size = self.header_image_size();
        self.loaded = Some((idx, summary.clone()));
        self.renderer.invalidate();
        if let Some(p) = self.last_driven {
            self.drive(p);
        }
        summary
    }

    /// Show the frame for `progress`. Ignored while a playback is running.
    pub fn render_by_progress(&mut self, progress: f64, bypass_progress_mapper: bool) {
        if self.lifecycle.is_disposed() || self.playback.is_playing() {
            return;
        }
        self.last_progress = Some(progress);
        self.apply_clip(progress);
        let mapped = if bypass_progress_mapper {
            progress
        } else {
            self.map_progress(progress)
        };
        self.drive(mapped);
    }

    /// Replace the progress remapping curve. An empty list removes it.
    pub fn set_interpolation(&mut self, segments: Vec<RangedSegment>) -> SeqResult<()> {
        if self.lifecycle.is_disposed() {
            return Ok(());
        }
        self.mapper = if segments.is_empty() {
            None
        } else {
            Some(ProgressMapper::single(FRAME_TARGET, segments)?)
        };
        Ok(())
    }

    /// Animate the inset clip over progress. `None` removes the clip.
    pub fn set_clip_interpolation(&mut self, clip: Option<ClipInterpolation>) -> SeqResult<()> {
        if self.lifecycle.is_disposed() {
            return Ok(());
        }
        self.clip_mapper = clip.map(ClipInterpolation::into_mapper).transpose()?;
        if self.clip_mapper.is_none() {
            self.renderer.set_clip(None);
        } else if let Some(p) = self.last_progress {
            self.apply_clip(p);
        }
        self.repaint_current();
        Ok(())
    }

    /// Drive progress from `from` to `to` over `duration_ms`, one step per [`Self::tick`].
    ///
    /// Playback frames skip the progress mapper; manual scrubbing applies it.
    pub fn play(&mut self, from: f64, to: f64, duration_ms: f64) -> PlaybackHandle {
        if self.lifecycle.is_disposed() {
            return PlaybackHandle::resolved(PlaybackOutcome::Stopped);
        }
        let now = self.clock.now_ms();
        let handle = self.playback.play(from, to, duration_ms, now);
        self.scheduler.set_playing(true);
        handle
    }

    pub fn stop(&mut self) {
        if self.lifecycle.is_disposed() {
            return;
        }
        self.playback.stop();
        self.scheduler.set_playing(false);
    }

    /// Advance playback, smoothing and trailing paints. Returns `true` while more ticks are
    /// needed.
    pub fn tick(&mut self) -> bool {
        if self.lifecycle.is_disposed() {
            return false;
        }
        let now = self.clock.now_ms();

        if let Some(step) = self.playback.tick(now) {
            self.last_progress = Some(step.progress);
            self.apply_clip(step.progress);
            self.drive(step.progress);
            if step.finished {
                self.scheduler.set_playing(false);
            }
        }

        if self.scheduler.tick() {
            self.request_frame();
        }

        if let Some(source) = self.scheduler.poll_trailing(now) {
            tracing::trace!(%source, "trailing paint");
            if self.paint(&source) {
                self.scheduler.commit(now);
            }
        }

        self.playback.is_playing() || self.scheduler.is_busy()
    }

    /// Re-measure the container and re-select the active image set.
    ///
    /// When the set changes the previous cache is released and [`Self::load`] must be called
    /// again. Otherwise the last painted frame is repainted at the new size, bypassing the paint
    /// rate limit.
    pub fn on_smart_resize(&mut self) -> SeqResult<()> {
        if self.lifecycle.is_disposed() {
            return Ok(());
        }
        let dpr = self.device_pixel_ratio();
        let (width, height) = self.container.content_box().scale(dpr).to_pixels();
        self.renderer.resize(width, height)?;

        let next = select_active(&self.image_sets);
        if next != self.active_set {
            self.switch_set(next);
            return Ok(());
        }

        let Some(source) = self.renderer.last_render_source().map(str::to_owned) else {
            return Ok(());
        };
        self.scheduler.lock(false);
        let now = self.clock.now_ms();
        if let Some(source) = self.scheduler.gate(source, now) {
            // Out-of-band repaint; the rate window is left as it was.
            self.paint(&source);
        }
        self.scheduler.lock(true);
        Ok(())
    }

    pub fn set_sizing_policy(&mut self, sizing: SizingPolicy) {
        if self.lifecycle.is_disposed() {
            return;
        }
        self.renderer.set_sizing_policy(sizing);
        self.repaint_current();
    }

    pub fn sizing_policy(&self) -> &SizingPolicy {
        self.renderer.sizing_policy()
    }

    /// Natural size of the active set's images, once loaded.
    pub fn image_size(&self) -> Option<Size> {
        self.image_size.or_else(|| self.renderer.natural_size())
    }

    /// Release everything. Every later call is a silent no-op.
    pub fn dispose(&mut self) {
        if self.lifecycle.is_disposed() {
            return;
        }
        self.lifecycle = Lifecycle::Disposed;
        self.playback.stop();
        self.scheduler.set_playing(false);
        self.scheduler.cancel_trailing();
        self.loader.dispose();
        self.renderer.dispose();
        self.mapper = None;
        self.clip_mapper = None;
        self.loaded = None;
        tracing::debug!("sequence engine disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn snapshot(&mut self) -> SeqResult<FrameRGBA> {
        self.renderer.snapshot()
    }

    pub fn stats(&self) -> RenderStats {
        self.renderer.stats()
    }

    pub fn frame_state(&self) -> FrameState {
        self.scheduler.state()
    }

    /// Images of the active set; empty when no set matches.
    pub fn active_images(&self) -> &[String] {
        self.active_set
            .and_then(|idx| self.image_sets.get(idx))
            .map(|set| set.images.as_slice())
            .unwrap_or(&[])
    }

    pub fn last_render_source(&self) -> Option<&str> {
        self.renderer.last_render_source()
    }

    pub fn surface_size(&self) -> Size {
        self.renderer.surface_size()
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        resolve_dpr(self.dpr_override, self.container.as_ref())
    }

    /// Decoded frames alive right now; `0` between paints.
    pub fn live_decoded(&self) -> usize {
        self.renderer.live_decoded()
    }

    pub fn live_textures(&self) -> usize {
        self.renderer.live_textures()
    }

    fn map_progress(&mut self, progress: f64) -> f64 {
        self.mapper
            .as_mut()
            .and_then(|m| m.calculate(progress).get(FRAME_TARGET))
            .and_then(|v| v.as_f64())
            .unwrap_or(progress)
    }

    fn apply_clip(&mut self, progress: f64) {
        if let Some(mapper) = self.clip_mapper.as_mut() {
            let clip = InsetClip::from_values(mapper.calculate(progress));
            self.renderer.set_clip(Some(clip));
        }
    }

    /// Internal progress path shared by scrubbing and playback.
    fn drive(&mut self, progress: f64) {
        self.last_driven = Some(progress);
        let count = self.active_images().len();
        if count == 0 {
            return;
        }
        let target = lerp(0.0, (count - 1) as f64, clamp01(progress));
        if self.scheduler.set_target(target) {
            self.request_frame();
        }
    }

    fn repaint_current(&mut self) {
        if self.last_driven.is_some() {
            self.request_frame();
        }
    }

    fn request_frame(&mut self) {
        let images = self.active_images();
        let Some(idx) = self.scheduler.frame_index(images.len()) else {
            return;
        };
        let source = images[idx].clone();
        if self.renderer.is_current(&source) {
            // Already on screen; a pending trailing paint would now be stale.
            self.scheduler.cancel_trailing();
            return;
        }
        let now = self.clock.now_ms();
        match self.scheduler.gate(source, now) {
            Some(source) => {
                if self.paint(&source) {
                    self.scheduler.commit(now);
                }
            }
            None => tracing::trace!("paint throttled; deferred to trailing call"),
        }
    }

    /// `true` when the frame reached the surface.
    fn paint(&mut self, source: &str) -> bool {
        match self.renderer.draw(Some(source), self.loader.cache()) {
            DrawOutcome::Painted => true,
            DrawOutcome::Skipped(reason) => {
                tracing::trace!(source, ?reason, "paint skipped");
                false
            }
        }
    }

    fn switch_set(&mut self, next: Option<usize>) {
        tracing::debug!(from = ?self.active_set, to = ?next, "active image set changed");
        if let Some(idx) = next
            && self.image_sets[idx].images.is_empty()
        {
            tracing::warn!(idx, "newly active image set is empty");
        }
        self.active_set = next;
        self.loader.dispose();
        self.loaded = None;
        self.image_size = None;
        self.renderer.reset_sources();
        self.scheduler.reset();
    }

    fn header_image_size(&self) -> Option<Size> {
        self.active_images().iter().find_map(|source| {
            let bytes = self.loader.get(source)?;
            match read_dimensions(bytes) {
                Ok((w, h)) => Some(Size::new(f64::from(w), f64::from(h))),
                Err(e) => {
                    tracing::debug!(source, error = %e, "could not read image dimensions");
                    None
                }
            }
        })
    }
}

fn resolve_dpr(dpr_override: Option<f64>, container: &dyn Container) -> f64 {
    let dpr = dpr_override.unwrap_or_else(|| container.device_pixel_ratio());
    if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 }
}
