use std::time::Duration;

use canvas::camera::{AxisBounds, ViewState, Viewport};
use canvas::series::{MaskSet, PointSeries};
use canvas::surface::Picture;

use super::*;

fn completion(uid: Uid, kind: RenderKind) -> Completion {
    completion_for(uid, 0, kind)
}

fn completion_for(uid: Uid, target: usize, kind: RenderKind) -> Completion {
    Completion { uid, target, kind, main: None, highlight: None, selection: None }
}

fn geometry() -> Geometry {
    Geometry::new(&ViewState::default(), Viewport::new(120.0, 80.0))
}

// =============================================================
// TaskTracker
// =============================================================

#[test]
fn uids_start_at_one_and_increase() {
    let mut tracker = TaskTracker::new();
    assert_eq!(tracker.latest_uid(), 0);
    assert_eq!(tracker.issue(0, RenderKind::Plot, geometry()).uid, 1);
    assert_eq!(tracker.issue(1, RenderKind::Plot, geometry()).uid, 2);
    assert_eq!(tracker.latest_uid(), 2);
}

#[test]
fn only_the_newest_completion_is_accepted() {
    let mut tracker = TaskTracker::new();
    for _ in 0..3 {
        tracker.issue(0, RenderKind::Plot, geometry());
    }
    assert!(!tracker.accept(&completion(1, RenderKind::Plot)));
    assert!(!tracker.accept(&completion(2, RenderKind::Plot)));
    assert!(tracker.accept(&completion(3, RenderKind::Plot)));
    assert!(tracker.is_idle());
    assert_eq!(tracker.accepted(), 1);
    assert_eq!(tracker.stale(), 2);
}

#[test]
fn uid_zero_is_a_no_op() {
    let mut tracker = TaskTracker::new();
    tracker.issue(0, RenderKind::Plot, geometry());
    assert!(!tracker.accept(&completion(0, RenderKind::Plot)));
    assert!(tracker.pending(0).is_some());
}

#[test]
fn duplicate_completion_is_stale() {
    let mut tracker = TaskTracker::new();
    tracker.issue(0, RenderKind::Selection, geometry());
    assert!(tracker.accept(&completion(1, RenderKind::Selection)));
    assert!(!tracker.accept(&completion(1, RenderKind::Selection)));
}

#[test]
fn completion_for_the_wrong_target_is_stale() {
    let mut tracker = TaskTracker::new();
    tracker.issue(0, RenderKind::Plot, geometry());
    assert!(!tracker.accept(&completion_for(1, 1, RenderKind::Plot)));
    assert!(tracker.pending(0).is_some());
}

#[test]
fn selection_during_pending_plot_is_upgraded() {
    let mut tracker = TaskTracker::new();
    tracker.issue(0, RenderKind::Plot, geometry());
    let pending = tracker.issue(0, RenderKind::Selection, geometry());
    assert_eq!(pending, Pending { uid: 2, target: 0, kind: RenderKind::Plot, geometry: geometry() });
}

#[test]
fn selection_after_accepted_plot_stays_selection() {
    let mut tracker = TaskTracker::new();
    tracker.issue(0, RenderKind::Plot, geometry());
    tracker.accept(&completion(1, RenderKind::Plot));
    assert_eq!(tracker.issue(0, RenderKind::Selection, geometry()).kind, RenderKind::Selection);
}

#[test]
fn targets_are_tracked_independently() {
    let mut tracker = TaskTracker::new();
    tracker.issue(0, RenderKind::Plot, geometry());
    assert_eq!(tracker.issue(1, RenderKind::Selection, geometry()).kind, RenderKind::Selection);
    assert_eq!(tracker.pending_count(), 2);
    assert_eq!(tracker.pending(0).map(|p| p.uid), Some(1));
    assert!(tracker.accept(&completion_for(1, 0, RenderKind::Plot)));
    assert!(tracker.accept(&completion_for(2, 1, RenderKind::Selection)));
    assert!(tracker.is_idle());
}

#[test]
fn request_on_another_target_marks_the_earlier_one_cancelled() {
    let mut tracker = TaskTracker::new();
    let plot = tracker.issue(0, RenderKind::Plot, geometry());
    tracker.issue(1, RenderKind::Selection, geometry());
    assert_eq!(tracker.cancelled_before(2), Some(plot));
    assert!(tracker.accept(&completion_for(2, 1, RenderKind::Selection)));
    assert_eq!(tracker.cancelled_before(2), Some(plot));

    let retry = tracker.issue(plot.target, plot.kind, plot.geometry);
    assert_eq!(retry.uid, 3);
    assert_eq!(tracker.cancelled_before(3), None);
}

#[test]
fn answered_requests_are_never_cancelled() {
    let mut tracker = TaskTracker::new();
    tracker.issue(0, RenderKind::Plot, geometry());
    tracker.issue(1, RenderKind::Plot, geometry());
    assert!(tracker.accept(&completion_for(1, 0, RenderKind::Plot)));
    assert!(tracker.accept(&completion_for(2, 1, RenderKind::Plot)));
    assert_eq!(tracker.cancelled_before(2), None);
}

#[test]
fn forget_clears_pending_but_keeps_counting() {
    let mut tracker = TaskTracker::new();
    tracker.issue(0, RenderKind::Plot, geometry());
    tracker.issue(1, RenderKind::Plot, geometry());
    tracker.forget();
    assert!(tracker.is_idle());
    assert!(!tracker.accept(&completion(1, RenderKind::Plot)));
    assert_eq!(tracker.issue(0, RenderKind::Selection, geometry()).uid, 3);
}

// =============================================================
// RenderClient
// =============================================================

fn dataset() -> DataUpdate {
    let series = PointSeries::new(
        vec![0.1, 0.4, 0.7],
        vec![0.2, 0.5, 0.8],
        vec![5.0, 5.0, 5.0],
        vec!["red".to_owned(), "blue".to_owned(), "red".to_owned()],
    )
    .expect("series");
    let mut masks = MaskSet::new(3);
    masks.select([1], false);
    DataUpdate::full(&series, &masks, AxisBounds::default())
}

async fn frame(client: &mut RenderClient) -> Option<Completion> {
    tokio::time::timeout(Duration::from_secs(5), client.next_frame())
        .await
        .expect("frame within timeout")
        .expect("worker alive")
}

#[tokio::test]
async fn next_frame_without_request_returns_none() {
    let mut client = RenderClient::spawn(RenderConfig::default(), Transport::Direct).expect("spawn");
    assert!(frame(&mut client).await.is_none());
    client.shutdown().expect("shutdown");
}

#[tokio::test]
async fn client_renders_and_accepts_latest_frame() {
    let mut client = RenderClient::spawn(RenderConfig::default(), Transport::Encoded).expect("spawn");
    client.send_data(dataset()).expect("data");
    client.add_target(0).expect("add");

    client.request_layer(0, Layer::Plot, geometry()).expect("plot");
    let pending = client.request_layer(0, Layer::Plot, geometry()).expect("plot");
    let done = frame(&mut client).await.expect("completion");
    assert_eq!(done.uid, pending.uid);
    assert_eq!(done.main.as_ref().map(Picture::fill_count), Some(2));
    assert_eq!(done.selection.as_ref().map(Picture::fill_count), Some(1));
    assert_eq!(client.tracker().accepted(), 1);
    client.shutdown().expect("shutdown");
}

#[tokio::test]
async fn client_upgrades_selection_while_plot_is_pending() {
    let mut client = RenderClient::spawn(RenderConfig::default(), Transport::Direct).expect("spawn");
    client.send_data(dataset()).expect("data");
    client.add_target(0).expect("add");

    client.request(0, RenderKind::Plot, geometry()).expect("plot");
    let pending = client.request(0, RenderKind::Selection, geometry()).expect("sele");
    assert_eq!(pending.kind, RenderKind::Plot);
    let done = frame(&mut client).await.expect("completion");
    assert!(done.main.is_some());
    client.shutdown().expect("shutdown");
}

#[tokio::test]
async fn reset_forgets_pending_render() {
    let mut client = RenderClient::spawn(RenderConfig::default(), Transport::Direct).expect("spawn");
    client.send_data(dataset()).expect("data");
    client.add_target(0).expect("add");
    client.request(0, RenderKind::Plot, geometry()).expect("plot");
    client.reset().expect("reset");
    assert!(client.tracker().is_idle());
    assert!(frame(&mut client).await.is_none());
    client.shutdown().expect("shutdown");
}

#[tokio::test]
async fn plot_cancelled_by_another_target_is_resent() {
    let mut client = RenderClient::spawn(RenderConfig::default(), Transport::Direct).expect("spawn");
    client.send_data(dataset()).expect("data");
    client.add_target(0).expect("add main");
    client.add_target(1).expect("add mini-view");

    client.request(0, RenderKind::Plot, geometry()).expect("plot");
    client.request(1, RenderKind::Selection, geometry()).expect("sele");

    let mut seen = Vec::new();
    while let Some(done) = frame(&mut client).await {
        seen.push(done);
    }
    let main = seen.iter().find(|d| d.target == 0).expect("target 0 redrawn");
    assert_eq!(main.kind, RenderKind::Plot);
    assert_eq!(main.main.as_ref().map(Picture::fill_count), Some(2));
    assert!(seen.iter().any(|d| d.target == 1 && d.kind == RenderKind::Selection));
    assert!(client.tracker().is_idle());
    client.shutdown().expect("shutdown");
}

#[tokio::test]
async fn request_for_unregistered_target_is_refused() {
    let mut client = RenderClient::spawn(RenderConfig::default(), Transport::Direct).expect("spawn");
    client.send_data(dataset()).expect("data");

    let err = client.request(0, RenderKind::Plot, geometry()).expect_err("no target");
    assert!(matches!(err, WorkerError::UnknownTarget(0)));
    assert!(client.tracker().is_idle());
    assert_eq!(client.tracker().latest_uid(), 0);
    assert!(frame(&mut client).await.is_none());
    client.shutdown().expect("shutdown");
}

#[tokio::test]
async fn reset_unregisters_targets() {
    let mut client = RenderClient::spawn(RenderConfig::default(), Transport::Direct).expect("spawn");
    client.send_data(dataset()).expect("data");
    client.add_target(0).expect("add");
    client.reset().expect("reset");

    let err = client.request_layer(0, Layer::Selection, geometry()).expect_err("target cleared");
    assert!(matches!(err, WorkerError::UnknownTarget(0)));
    assert!(frame(&mut client).await.is_none());

    client.send_data(dataset()).expect("data");
    client.add_target(0).expect("add again");
    client.request(0, RenderKind::Plot, geometry()).expect("plot");
    assert!(frame(&mut client).await.is_some());
    client.shutdown().expect("shutdown");
}

#[tokio::test]
async fn non_finite_geometry_is_refused() {
    let mut client = RenderClient::spawn(RenderConfig::default(), Transport::Encoded).expect("spawn");
    client.add_target(0).expect("add");
    let nan_width = Geometry { width: f64::NAN, ..geometry() };
    let err = client.request(0, RenderKind::Plot, nan_width).expect_err("nan");
    assert!(matches!(err, WorkerError::InvalidGeometry));
    assert!(frame(&mut client).await.is_none());
    client.shutdown().expect("shutdown");
}

#[tokio::test]
async fn empty_data_update_is_not_sent() {
    let client = RenderClient::spawn(RenderConfig::default(), Transport::Direct).expect("spawn");
    client.send_data(DataUpdate::default()).expect("no-op");
    client.shutdown().expect("shutdown");
}
