use super::*;
use crate::animation::ease::Ease;

fn num(m: &ProgressMapper, id: &str) -> f64 {
    m.value(id).and_then(MappedValue::as_f64).unwrap()
}

fn gapped() -> ProgressMapper {
    ProgressMapper::single(
        "x",
        vec![
            RangedSegment::new(0.1, 0.4, 0.0, 10.0),
            RangedSegment::new(0.7, 0.8, 20.0, 30.0),
        ],
    )
    .unwrap()
}

#[test]
fn endpoints_match_first_start_and_last_end() {
    let mut m = gapped();
    m.calculate(0.0);
    assert_eq!(num(&m, "x"), 0.0);
    m.calculate(1.0);
    assert_eq!(num(&m, "x"), 30.0);
}

#[test]
fn endpoint_synthesis_follows_declaration_order() {
    // Declared back to front: the first declared segment starts at 0.5 and the last ends at 0.5,
    // so both synthesized constants hold 50 even though the range is covered from 0 to 1.
    let mut m = ProgressMapper::single(
        "x",
        vec![
            RangedSegment::new(0.5, 1.0, 50.0, 100.0),
            RangedSegment::new(0.0, 0.5, 0.0, 50.0),
        ],
    )
    .unwrap();
    m.calculate(0.0);
    assert_eq!(num(&m, "x"), 50.0);
    m.calculate(1.0);
    assert_eq!(num(&m, "x"), 50.0);
}

#[test]
fn gap_persists_earlier_segment_end() {
    let mut m = gapped();
    m.calculate(0.55);
    assert_eq!(num(&m, "x"), 10.0);
    m.calculate(0.4);
    assert_eq!(num(&m, "x"), 10.0);
    m.calculate(0.75);
    assert!((num(&m, "x") - 25.0).abs() < 1e-9);
}

#[test]
fn out_of_range_progress_clamps() {
    let mut m = gapped();
    m.calculate(-3.0);
    assert_eq!(num(&m, "x"), 0.0);
    m.calculate(0.05);
    assert_eq!(num(&m, "x"), 0.0);
    m.calculate(0.95);
    assert_eq!(num(&m, "x"), 30.0);
    m.calculate(7.0);
    assert_eq!(num(&m, "x"), 30.0);
}

#[test]
fn every_target_gets_a_value() {
    let mut m = ProgressMapper::new([
        ("a", vec![RangedSegment::new(0.0, 1.0, 0.0, 100.0)]),
        (
            "b",
            vec![RangedSegment::new(0.0, 0.5, "0px", "50px").with_easing(Ease::InQuad)],
        ),
    ])
    .unwrap();
    for i in 0..=10 {
        let p = f64::from(i) / 10.0;
        let out = m.calculate(p);
        assert_eq!(out.len(), 2);
    }
    m.calculate(0.25);
    assert_eq!(num(&m, "a"), 25.0);
    // child progress 0.5 eased by InQuad -> 0.25
    assert_eq!(m.value("b").unwrap().to_string(), "12.5px");
    assert_eq!(m.get_calculations().len(), 2);
}

#[test]
fn custom_easing_is_applied() {
    let mut m = ProgressMapper::single(
        "x",
        vec![RangedSegment::new(0.0, 1.0, 0.0, 1.0).with_easing(Easing::custom(|_| 0.5))],
    )
    .unwrap();
    m.calculate(0.9);
    assert_eq!(num(&m, "x"), 0.5);
}

#[test]
fn colors_interpolate_channel_wise() {
    let mut m = ProgressMapper::single(
        "c",
        vec![RangedSegment::new(0.0, 1.0, "#000000", "rgba(200, 100, 0, 1)")],
    )
    .unwrap();
    m.calculate(0.5);
    assert_eq!(m.value("c").unwrap().to_string(), "rgba(100, 50, 0, 1)");
    assert_eq!(m.value("c").unwrap().as_f64(), None);
}

#[test]
fn invalid_ranges_fail_at_construction() {
    let eq = ProgressMapper::single("x", vec![RangedSegment::new(0.5, 0.5, 0.0, 1.0)]);
    assert!(matches!(eq, Err(SeqError::InvalidRange(_))));

    let inverted = ProgressMapper::single("x", vec![RangedSegment::new(0.8, 0.2, 0.0, 1.0)]);
    assert!(matches!(inverted, Err(SeqError::InvalidRange(_))));

    let nan = ProgressMapper::single("x", vec![RangedSegment::new(f64::NAN, 1.0, 0.0, 1.0)]);
    assert!(matches!(nan, Err(SeqError::InvalidRange(_))));

    let empty = ProgressMapper::single("x", vec![]);
    assert!(matches!(empty, Err(SeqError::InvalidRange(_))));
}

#[test]
fn mixed_units_fail_at_construction() {
    let cross = ProgressMapper::single("x", vec![RangedSegment::new(0.0, 1.0, "0px", "10vw")]);
    assert!(matches!(cross, Err(SeqError::UnitMismatch(_))));

    let mixed = ProgressMapper::single("x", vec![RangedSegment::new(0.0, 1.0, 0.0, "10px")]);
    assert!(matches!(mixed, Err(SeqError::UnitMismatch(_))));
}

#[test]
fn segments_deserialize_from_json() {
    let segs: Vec<RangedSegment> = serde_json::from_str(
        r#"[
            {"from": 0.0, "to": 0.5, "start": 0, "end": 0.2},
            {"from": 0.5, "to": 1.0, "start": "0.2", "end": "1", "easingFunction": "outCubic"}
        ]"#,
    )
    .unwrap();
    assert_eq!(segs[0].start, SegmentValue::Number(0.0));
    assert_eq!(segs[1].start, SegmentValue::Text("0.2".to_owned()));
    assert!(matches!(segs[1].easing_function, Easing::Preset(Ease::OutCubic)));
}
