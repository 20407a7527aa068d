use super::*;

#[test]
fn endpoints_are_stable() {
    for ease in Ease::ALL {
        assert!(ease.apply(0.0).abs() < 1e-12, "{ease:?} at 0");
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?} at 1");
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in Ease::ALL {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b, "{ease:?}");
        assert!(b < c, "{ease:?}");
    }
}

#[test]
fn custom_easing_is_not_clamped() {
    let overshoot = Easing::custom(|t| t * 1.5);
    assert_eq!(overshoot.apply(1.0), 1.5);
    assert_eq!(Easing::default().apply(0.3), 0.3);
    assert_eq!(format!("{overshoot:?}"), "Custom(..)");
}

#[test]
fn easing_deserializes_from_preset_name() {
    let e: Easing = serde_json::from_str("\"inOutCubic\"").unwrap();
    assert!(matches!(e, Easing::Preset(Ease::InOutCubic)));
}
