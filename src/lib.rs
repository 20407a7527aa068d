//! framescrub plays a pre-rendered image sequence as a scrubbable "video".
//!
//! A progress scalar in `[0, 1]` (scroll position, a timeline, a playback timer) selects which
//! frame is painted onto a raster or GPU surface:
//!
//! - build a [`SequenceEngine`] from a [`Container`] and one or more [`ImageSet`]s
//! - [`SequenceEngine::load`] the active set
//! - feed progress with [`SequenceEngine::render_by_progress`] or [`SequenceEngine::play`]
//! - call [`SequenceEngine::tick`] once per animation frame
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod assets;
pub mod config;
pub mod engine;
pub mod playback;
pub mod render;
pub mod schedule;

pub use crate::foundation::core::{Affine, Lifecycle, Point, Rect, Rgba8Premul, Size};
pub use crate::foundation::error::{SeqError, SeqResult};

pub use crate::animation::ease::{Ease, Easing};
pub use crate::animation::mapper::{MappedValue, ProgressMapper, RangedSegment, SegmentValue};
pub use crate::animation::units::{CssValue, Unit};
pub use crate::assets::fetch::{AnyFetcher, FetchResponse, Fetcher, FsFetcher, HttpFetcher};
pub use crate::assets::loader::{LoadSummary, ResourceCache, ResourceLoader};
pub use crate::config::EngineOpts;
pub use crate::engine::container::{Container, FixedContainer};
pub use crate::engine::image_set::{ImageSet, ImageSetSpec};
pub use crate::engine::{FRAME_TARGET, SequenceEngine, SequenceEngineBuilder};
pub use crate::playback::{PlaybackHandle, PlaybackOutcome};
pub use crate::render::backend::{BackendKind, FrameBackend, FrameRGBA, PaintRequest};
pub use crate::render::clip::{ClipInterpolation, InsetClip, InsetSegments};
pub use crate::render::placement::{
    Placement, SizingMode, SizingPolicy, calculate_background_contain, calculate_background_cover,
};
pub use crate::render::renderer::RenderStats;
pub use crate::schedule::clock::{Clock, ManualClock, SystemClock};
pub use crate::schedule::scheduler::FrameState;
