use super::*;
use crate::assets::decode::{DecodeSlot, DecodedFrame};
use crate::assets::loader::Blob;
use crate::foundation::core::Size;
use crate::render::clip::InsetClip;
use crate::render::placement::{calculate_background_contain, calculate_background_cover};

fn solid_frame(slot: &mut DecodeSlot, w: u32, h: u32, px: [u8; 4]) -> DecodedFrame {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    slot.acquire("solid", Blob::from(buf)).decode().unwrap()
}

#[test]
fn cover_paint_fills_surface() {
    let mut slot = DecodeSlot::new();
    let frame = solid_frame(&mut slot, 2, 2, [255, 0, 0, 255]);
    let mut backend = RasterBackend::new(RenderSettings::default(), 4, 4).unwrap();
    let placement = calculate_background_cover(Size::new(4.0, 4.0), Size::new(2.0, 2.0));

    backend
        .paint(PaintRequest {
            frame: &frame,
            placement,
            clip: None,
        })
        .unwrap();

    let snap = backend.snapshot().unwrap();
    assert_eq!((snap.width, snap.height), (4, 4));
    assert!(snap.premultiplied);
    assert_eq!(snap.pixel(1, 1), Some([255, 0, 0, 255]));
    assert_eq!(snap.pixel(3, 3), Some([255, 0, 0, 255]));
}

#[test]
fn inset_clip_hides_outside_pixels() {
    let mut slot = DecodeSlot::new();
    let frame = solid_frame(&mut slot, 2, 2, [0, 0, 255, 255]);
    let mut backend = RasterBackend::new(RenderSettings::default(), 4, 4).unwrap();
    let container = Size::new(4.0, 4.0);
    let clip = InsetClip {
        left: 0.5,
        ..InsetClip::default()
    };

    backend
        .paint(PaintRequest {
            frame: &frame,
            placement: calculate_background_cover(container, Size::new(2.0, 2.0)),
            clip: Some(clip.to_rounded_rect(container)),
        })
        .unwrap();

    let snap = backend.snapshot().unwrap();
    assert_eq!(snap.pixel(0, 1), Some([0, 0, 0, 0]));
    assert_eq!(snap.pixel(3, 1), Some([0, 0, 255, 255]));
}

#[test]
fn contain_letterbox_shows_clear_color() {
    let mut slot = DecodeSlot::new();
    let frame = solid_frame(&mut slot, 2, 1, [0, 255, 0, 255]);
    let settings = RenderSettings {
        clear_rgba: Some([10, 20, 30, 255]),
    };
    let mut backend = RasterBackend::new(settings, 4, 4).unwrap();

    backend
        .paint(PaintRequest {
            frame: &frame,
            placement: calculate_background_contain(Size::new(4.0, 4.0), Size::new(2.0, 1.0)),
            clip: None,
        })
        .unwrap();

    let snap = backend.snapshot().unwrap();
    assert_eq!(snap.pixel(0, 0), Some([10, 20, 30, 255]));
    assert_eq!(snap.pixel(1, 2), Some([0, 255, 0, 255]));
}

#[test]
fn resize_reallocates_and_rejects_oversized_surfaces() {
    let mut backend = RasterBackend::new(RenderSettings::default(), 4, 4).unwrap();
    backend.resize(8, 2).unwrap();
    assert_eq!(backend.size(), (8, 2));
    assert_eq!(backend.snapshot().unwrap().data.len(), 8 * 2 * 4);
    assert!(backend.resize(70_000, 1).is_err());
}
