use super::*;

#[test]
fn format_parse_round_trips_every_unit() {
    for unit in Unit::ALL {
        let s = format!("30{}", unit.suffix());
        assert_eq!(format(&parse(&s).unwrap()), s);
    }
    assert_eq!(format(&parse("-2.5vw").unwrap()), "-2.5vw");
    assert_eq!(format(&parse("0.75").unwrap()), "0.75");
}

#[test]
fn parses_hex_and_rgb_functions() {
    assert_eq!(
        parse("#ff0000").unwrap(),
        CssValue::Color(Rgba::new(255.0, 0.0, 0.0, 1.0))
    );
    assert_eq!(
        parse("#0f0").unwrap(),
        CssValue::Color(Rgba::new(0.0, 255.0, 0.0, 1.0))
    );
    assert_eq!(
        parse("rgba(10, 20, 30, 0.5)").unwrap(),
        CssValue::Color(Rgba::new(10.0, 20.0, 30.0, 0.5))
    );
    assert_eq!(
        parse("RGB(1,2,3)").unwrap(),
        CssValue::Color(Rgba::new(1.0, 2.0, 3.0, 1.0))
    );
}

#[test]
fn rejects_garbage() {
    assert!(parse("").is_err());
    assert!(parse("px").is_err());
    assert!(parse("10furlongs").is_err());
    assert!(parse("#12345").is_err());
    assert!(parse("rgba(1,2)").is_err());
}

#[test]
fn interpolates_lengths_and_colors() {
    let a = parse("10px").unwrap();
    let b = parse("30px").unwrap();
    assert_eq!(format(&a.interpolate(&b, 0.5).unwrap()), "20px");

    let black = parse("rgba(0, 0, 0, 0)").unwrap();
    let white = parse("#ffffff").unwrap();
    assert_eq!(
        format(&black.interpolate(&white, 0.5).unwrap()),
        "rgba(128, 128, 128, 0.5)"
    );
}

#[test]
fn cross_unit_interpolation_is_rejected() {
    let px = parse("10px").unwrap();
    let vw = parse("10vw").unwrap();
    let red = parse("#f00").unwrap();
    assert!(matches!(
        px.interpolate(&vw, 0.5),
        Err(SeqError::UnitMismatch(_))
    ));
    assert!(px.check_compatible(&red).is_err());
}

#[test]
fn float_noise_is_trimmed() {
    let a = CssValue::Length {
        value: 0.1 + 0.2,
        unit: Unit::Em,
    };
    assert_eq!(format(&a), "0.3em");
}
