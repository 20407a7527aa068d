use std::sync::{Arc, Mutex};

use super::*;
use crate::assets::loader::Blob;
use crate::render::placement::Placement;

#[derive(Default)]
struct Recorded {
    paints: Vec<(u32, u32, Placement, bool)>,
}

struct RecordingBackend {
    size: (u32, u32),
    log: Arc<Mutex<Recorded>>,
}

impl FrameBackend for RecordingBackend {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) -> SeqResult<()> {
        self.size = (width, height);
        Ok(())
    }

    fn paint(&mut self, req: PaintRequest<'_>) -> SeqResult<()> {
        let mut log = self.log.lock().unwrap();
        log.paints.push((
            req.frame.width,
            req.frame.height,
            req.placement,
            req.clip.is_some(),
        ));
        Ok(())
    }

    fn clear(&mut self) -> SeqResult<()> {
        Ok(())
    }

    fn snapshot(&mut self) -> SeqResult<FrameRGBA> {
        Ok(FrameRGBA {
            width: self.size.0,
            height: self.size.1,
            data: vec![0; (self.size.0 * self.size.1 * 4) as usize],
            premultiplied: true,
        })
    }
}

fn png(w: u32, h: u32) -> Blob {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([9, 9, 9, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    Blob::from(buf)
}

fn cache_with(entries: &[(&str, Blob)]) -> ResourceCache {
    let mut cache = ResourceCache::default();
    for (k, v) in entries {
        cache.insert((*k).to_owned(), v.clone());
    }
    cache
}

fn renderer(w: u32, h: u32) -> (Renderer, Arc<Mutex<Recorded>>) {
    let log = Arc::new(Mutex::new(Recorded::default()));
    let backend = RecordingBackend {
        size: (w, h),
        log: log.clone(),
    };
    (
        Renderer::new(Box::new(backend), SizingPolicy::default()),
        log,
    )
}

#[test]
fn same_source_twice_paints_once() {
    let (mut r, log) = renderer(100, 50);
    let cache = cache_with(&[("a.png", png(5, 5))]);

    assert_eq!(r.draw(Some("a.png"), Some(&cache)), DrawOutcome::Painted);
    assert_eq!(
        r.draw(Some("a.png"), Some(&cache)),
        DrawOutcome::Skipped(SkipReason::Identical)
    );
    assert_eq!(log.lock().unwrap().paints.len(), 1);
    assert_eq!(r.stats().decodes, 1);
    assert_eq!(r.last_render_source(), Some("a.png"));
}

#[test]
fn placement_uses_surface_and_natural_size() {
    let (mut r, log) = renderer(1000, 500);
    let cache = cache_with(&[("a.png", png(50, 50))]);
    r.draw(Some("a.png"), Some(&cache));

    let (w, h, p, clipped) = log.lock().unwrap().paints[0];
    assert_eq!((w, h), (50, 50));
    assert_eq!(p.scalar, 20.0);
    assert_eq!(p.y, -250.0);
    assert!(!clipped);
    assert_eq!(r.natural_size(), Some(Size::new(50.0, 50.0)));
}

#[test]
fn missing_and_undecodable_sources_are_skipped_and_retried() {
    let (mut r, log) = renderer(10, 10);
    let empty = ResourceCache::default();
    assert_eq!(
        r.draw(Some("a.png"), Some(&empty)),
        DrawOutcome::Skipped(SkipReason::NotCached)
    );

    let bad = cache_with(&[("a.png", Blob::from(&b"nope"[..]))]);
    assert_eq!(
        r.draw(Some("a.png"), Some(&bad)),
        DrawOutcome::Skipped(SkipReason::DecodeFailed)
    );
    assert_eq!(r.stats().decode_failures, 1);

    let good = cache_with(&[("a.png", png(2, 2))]);
    assert_eq!(r.draw(Some("a.png"), Some(&good)), DrawOutcome::Painted);
    assert_eq!(log.lock().unwrap().paints.len(), 1);
    assert_eq!(r.live_decoded(), 0);
}

#[test]
fn clip_and_resize_invalidate_identity() {
    let (mut r, log) = renderer(10, 10);
    let cache = cache_with(&[("a.png", png(2, 2))]);
    r.draw(Some("a.png"), Some(&cache));

    r.set_clip(Some(InsetClip {
        top: 0.1,
        ..InsetClip::default()
    }));
    assert_eq!(r.draw(Some("a.png"), Some(&cache)), DrawOutcome::Painted);
    assert!(log.lock().unwrap().paints[1].3);

    r.resize(20, 20).unwrap();
    assert_eq!(r.draw(Some("a.png"), Some(&cache)), DrawOutcome::Painted);
    assert_eq!(r.surface_size(), Size::new(20.0, 20.0));
    assert_eq!(log.lock().unwrap().paints.len(), 3);
}

#[test]
fn at_most_one_decoded_frame_alive() {
    let log = Arc::new(Mutex::new(Recorded::default()));
    let mut r = Renderer::new(
        Box::new(RecordingBackend {
            size: (10, 10),
            log: log.clone(),
        }),
        SizingPolicy::default(),
    );
    let cache = cache_with(&[("a", png(3, 3)), ("b", png(3, 3)), ("c", png(3, 3))]);
    for src in ["a", "b", "c", "a", "b"] {
        r.draw(Some(src), Some(&cache));
    }
    assert_eq!(r.stats().paints, 5);
    assert_eq!(r.stats().max_live_decoded, 1);
    assert_eq!(r.live_decoded(), 0);
}

#[test]
fn disposed_renderer_ignores_draws() {
    let (mut r, log) = renderer(10, 10);
    let cache = cache_with(&[("a.png", png(2, 2))]);
    r.dispose();
    assert_eq!(
        r.draw(Some("a.png"), Some(&cache)),
        DrawOutcome::Skipped(SkipReason::Disposed)
    );
    assert!(log.lock().unwrap().paints.is_empty());
}
