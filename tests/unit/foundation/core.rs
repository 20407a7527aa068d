use super::*;

#[test]
fn lerp_and_clamp01_basics() {
    assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
    assert_eq!(lerp(10.0, 0.0, 0.25), 7.5);
    assert_eq!(clamp01(-0.5), 0.0);
    assert_eq!(clamp01(1.5), 1.0);
    assert_eq!(clamp01(f64::NAN), 0.0);
}

#[test]
fn size_aspect_and_pixels() {
    let s = Size::new(1000.0, 500.0);
    assert_eq!(s.aspect(), 2.0);
    assert!(!s.is_empty());
    assert!(Size::ZERO.is_empty());
    assert_eq!(Size::ZERO.aspect(), 0.0);
    assert_eq!(Size::new(10.4, 0.2).to_pixels(), (10, 1));
    assert_eq!(s.scale(2.0), Size::new(2000.0, 1000.0));
}

#[test]
fn premul_rounds_like_integer_math() {
    let c = Rgba8Premul::from_straight_rgba(100, 50, 200, 128);
    assert_eq!(
        c.to_array(),
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );
    assert_eq!(Rgba8Premul::transparent().a, 0);
}
