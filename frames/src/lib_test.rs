use super::*;

fn sample_series() -> (PointSeries, MaskSet) {
    let series = PointSeries::new(
        vec![0.1, 0.5, 0.9],
        vec![0.2, 0.5, 0.8],
        vec![2.0, 3.0, 4.0],
        vec!["red".to_owned(), "green".to_owned(), "blue".to_owned()],
    )
    .expect("series");
    let mut masks = MaskSet::new(3);
    masks.select([0], false);
    masks.mask([2]);
    masks.set_highlight([1], 4);
    (series, masks)
}

#[test]
fn full_update_shares_series_columns() {
    let (series, masks) = sample_series();
    let update = DataUpdate::full(&series, &masks, AxisBounds::new(0.0, 10.0, 0.0, 5.0));
    let x = update.x.as_ref().expect("x column");
    assert!(Arc::ptr_eq(x, series.x()));
    assert_eq!(update.color.as_deref().map(<[String]>::len), Some(3));
    assert_eq!(update.picked.as_deref(), Some(&[true, false, false][..]));
    assert_eq!(update.masked.as_deref(), Some(&[false, false, true][..]));
    assert_eq!(update.highlighted.as_deref(), Some(&[0, 4, 0][..]));
    assert_eq!(update.bounds, Some(AxisBounds::new(0.0, 10.0, 0.0, 5.0)));
}

#[test]
fn mask_update_leaves_columns_unset() {
    let (_, masks) = sample_series();
    let update = DataUpdate::masks(&masks);
    assert!(update.x.is_none());
    assert!(update.color.is_none());
    assert!(update.bounds.is_none());
    assert!(update.picked.is_some());
    assert!(!update.is_empty());
}

#[test]
fn picked_update_carries_only_the_selection() {
    let (_, masks) = sample_series();
    let update = DataUpdate::picked(&masks);
    assert_eq!(update.picked.as_deref(), Some(&[true, false, false][..]));
    assert!(update.masked.is_none());
    assert!(update.highlighted.is_none());
}

#[test]
fn default_update_is_empty() {
    assert!(DataUpdate::default().is_empty());
}

#[test]
fn geometry_captures_view_and_viewport() {
    let mut view = ViewState::from_parts(12.0, -4.0, 2.5).expect("view");
    view.set_bounds(AxisBounds::new(1.0, 2.0, 3.0, 4.0));
    let geometry = Geometry::new(&view, Viewport::new(640.0, 480.0));
    assert_eq!(geometry.viewport(), Viewport::new(640.0, 480.0));

    let rebuilt = geometry.view(view.bounds()).expect("valid geometry");
    assert_eq!(rebuilt, view);
}

#[test]
fn geometry_with_invalid_scale_has_no_view() {
    let geometry = Geometry { width: 10.0, height: 10.0, pan_x: 0.0, pan_y: 0.0, scale: 0.0 };
    assert!(geometry.view(AxisBounds::default()).is_none());
}

#[test]
fn geometry_with_non_finite_or_negative_size_is_invalid() {
    let ok = Geometry { width: 10.0, height: 10.0, pan_x: 0.0, pan_y: 0.0, scale: 1.0 };
    assert!(ok.is_valid());
    assert!(Geometry { width: 0.0, height: 0.0, ..ok }.is_valid());
    for bad in [
        Geometry { width: f64::NAN, ..ok },
        Geometry { height: f64::INFINITY, ..ok },
        Geometry { width: -1.0, ..ok },
        Geometry { pan_x: f64::NAN, ..ok },
    ] {
        assert!(!bad.is_valid(), "{bad:?}");
        assert!(bad.view(AxisBounds::default()).is_none());
    }
}

#[test]
fn message_names_match_protocol_kinds() {
    let task = RenderTask {
        uid: 7,
        target: 0,
        geometry: Geometry { width: 1.0, height: 1.0, pan_x: 0.0, pan_y: 0.0, scale: 1.0 },
    };
    assert_eq!(Message::Reset.name(), "reset");
    assert_eq!(Message::AddTarget { index: 0 }.name(), "add");
    assert_eq!(Message::RenderPlot(task).name(), "plot");
    assert_eq!(Message::RenderSelection(task).name(), "sele");
    assert_eq!(Message::RenderSelection(task).uid(), Some(7));
    assert_eq!(Message::Reset.uid(), None);
}

#[test]
fn messages_serialize_with_type_tag() {
    let json = serde_json::to_value(Message::AddTarget { index: 2 }).expect("serialize");
    assert_eq!(json, serde_json::json!({"type": "add_target", "index": 2}));

    let json = serde_json::to_value(Message::Reset).expect("serialize");
    assert_eq!(json, serde_json::json!({"type": "reset"}));
}

#[test]
fn render_kind_serializes_as_lowercase_json() {
    assert_eq!(serde_json::to_string(&RenderKind::Plot).expect("serialize"), "\"plot\"");
    assert_eq!(serde_json::to_string(&RenderKind::Selection).expect("serialize"), "\"selection\"");
}

#[test]
fn data_message_json_round_trips() {
    let (series, masks) = sample_series();
    let msg = Message::Data(DataUpdate::full(&series, &masks, AxisBounds::default()));
    let json = serde_json::to_string(&msg).expect("serialize");
    let back: Message = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, msg);
}

#[test]
fn engine_layers_map_to_render_kinds() {
    assert_eq!(RenderKind::from(Layer::Plot), RenderKind::Plot);
    assert_eq!(RenderKind::from(Layer::Selection), RenderKind::Selection);
}
