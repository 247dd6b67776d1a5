//! End-to-end replays of recorded input traces.

use snapctl::carousel::{NavReason, Notice};
use snapctl::click::ClickVerdict;
use snapctl::config::Profile;
use snapctl::replay::{LogEvent, PageEvent, Report, Trace, run_trace};
use snapctl::snap::SnapState;

fn replay(json: &str) -> Report {
    let trace = Trace::from_json_str(json).expect("trace parses");
    run_trace(&trace, &Profile::default())
}

fn notices<'a>(report: &'a Report, source: &'a str) -> Vec<&'a Notice> {
    report
        .entries_for(source)
        .filter_map(|e| match &e.event {
            LogEvent::Notice(n) => Some(n),
            LogEvent::Page(_) => None,
        })
        .collect()
}

fn navigations(report: &Report, source: &str) -> Vec<(usize, NavReason)> {
    notices(report, source)
        .into_iter()
        .filter_map(|n| match n {
            Notice::Navigate { index, reason, .. } => Some((*index, *reason)),
            _ => None,
        })
        .collect()
}

#[test]
fn mouse_drag_snaps_to_nearest_slide_once_scrolling_pauses() {
    let report = replay(
        r#"{
        "carousels": [{"name": "hero", "slide_width": 300, "slide_count": 5}],
        "events": [
            {"at": 0,  "target": "hero", "type": "mouse_down", "x": 600},
            {"at": 60, "target": "hero", "type": "mouse_move", "x": 400},
            {"at": 80, "target": "hero", "type": "mouse_up",   "x": 400}
        ]
    }"#,
    );

    assert_eq!(navigations(&report, "hero"), vec![(1, NavReason::Snap)]);
    let started: Vec<_> = notices(&report, "hero")
        .into_iter()
        .filter(|n| matches!(n, Notice::SnapStarted { .. }))
        .collect();
    assert_eq!(started.len(), 1);

    let snap_at = report
        .entries_for("hero")
        .find(|e| matches!(e.event, LogEvent::Notice(Notice::SnapStarted { .. })))
        .map(|e| e.at_ms)
        .unwrap();
    // first scroll event is delivered on the 64ms frame; one full poll period later
    assert_eq!(snap_at, 264);

    let hero = report.carousel("hero").unwrap();
    assert_eq!(hero.offset, 300.0);
    assert_eq!(hero.current_slide, 1);
    assert_eq!(hero.snap_state, SnapState::Idle);
    assert!(!hero.flags.grabbing);
    assert!(hero.has_focus);
    assert_eq!(report.pending_tasks, 0);
}

#[test]
fn quick_click_does_not_move_the_viewport() {
    let report = replay(
        r#"{
        "carousels": [{"name": "hero", "slide_width": 300, "slide_count": 5}],
        "events": [
            {"at": 0,  "target": "hero", "type": "mouse_down", "x": 600, "y": 10},
            {"at": 20, "target": "hero", "type": "mouse_move", "x": 500, "y": 10},
            {"at": 30, "target": "hero", "type": "mouse_up",   "x": 500, "y": 10},
            {"at": 30, "target": "hero", "type": "click",      "x": 500, "y": 10}
        ]
    }"#,
    );
    let hero = report.carousel("hero").unwrap();
    assert_eq!(hero.offset, 0.0);
    assert!(navigations(&report, "hero").is_empty());
    assert!(
        notices(&report, "hero")
            .iter()
            .any(|n| **n == Notice::Click { verdict: ClickVerdict::Suppress })
    );
}

#[test]
fn wheel_momentum_settles_then_aligns() {
    let report = replay(
        r#"{
        "carousels": [{"name": "strip", "slide_width": 300, "slide_count": 6}],
        "events": [
            {"at": 0,  "target": "strip", "type": "wheel", "dx": 130},
            {"at": 16, "target": "strip", "type": "wheel", "dx": 130},
            {"at": 32, "target": "strip", "type": "wheel", "dx": 130}
        ]
    }"#,
    );
    assert_eq!(navigations(&report, "strip"), vec![(1, NavReason::Snap)]);
    let strip = report.carousel("strip").unwrap();
    assert_eq!(strip.offset, 300.0);
    assert!(strip.flags.mouse_scrolling);
    assert!(notices(&report, "strip").iter().any(|n| matches!(
        n,
        Notice::ScrollSettled { .. }
    )));
}

#[test]
fn wheel_during_snap_animation_snaps_again() {
    // the snap back to slide 0 animates from 544ms to 844ms
    let report = replay(
        r#"{
        "carousels": [{"name": "strip", "slide_width": 300, "slide_count": 6}],
        "events": [
            {"at": 0,   "target": "strip", "type": "wheel", "dx": 130},
            {"at": 700, "target": "strip", "type": "wheel", "dx": 200}
        ]
    }"#,
    );
    assert_eq!(
        navigations(&report, "strip"),
        vec![(0, NavReason::Snap), (1, NavReason::Snap)]
    );
    let finished: Vec<usize> = notices(&report, "strip")
        .into_iter()
        .filter_map(|n| match n {
            Notice::SnapFinished { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(finished, vec![0, 1]);

    let strip = report.carousel("strip").unwrap();
    assert_eq!(strip.offset, 300.0);
    assert_eq!(strip.snap_state, SnapState::Idle);
    assert_eq!(report.pending_tasks, 0);
}

#[test]
fn touch_scrolling_is_left_to_native_snapping() {
    let report = replay(
        r#"{
        "carousels": [{"name": "strip", "slide_width": 300, "slide_count": 6}],
        "events": [
            {"at": 0,  "target": "strip", "type": "touch_start"},
            {"at": 10, "target": "strip", "type": "touch_move", "dx": 130},
            {"at": 40, "target": "strip", "type": "touch_move", "dx": 20},
            {"at": 60, "target": "strip", "type": "touch_end"}
        ]
    }"#,
    );
    assert!(navigations(&report, "strip").is_empty());
    let strip = report.carousel("strip").unwrap();
    assert_eq!(strip.offset, 150.0);
    assert_eq!(strip.snap_state, SnapState::Idle);
    assert!(!strip.flags.mouse_scrolling);
}

#[test]
fn slide_swipe_and_snap_back() {
    let report = replay(
        r#"{
        "carousels": [{"name": "deck", "variant": "slide_snap",
                       "slide_width": 100, "slide_count": 10, "initial_slide": 2}],
        "events": [
            {"at": 0,    "target": "deck", "type": "mouse_down", "x": 100},
            {"at": 20,   "target": "deck", "type": "mouse_move", "x": 30},
            {"at": 40,   "target": "deck", "type": "mouse_up",   "x": 30},
            {"at": 1000, "target": "deck", "type": "mouse_down", "x": 100},
            {"at": 1020, "target": "deck", "type": "mouse_move", "x": 80},
            {"at": 1040, "target": "deck", "type": "mouse_up",   "x": 80}
        ]
    }"#,
    );
    assert_eq!(
        navigations(&report, "deck"),
        vec![(3, NavReason::Swipe), (3, NavReason::Swipe)]
    );
    let deck = report.carousel("deck").unwrap();
    assert_eq!(deck.offset, 300.0);
    assert_eq!(deck.current_slide, 3);
    assert_eq!(deck.swipe_target, Some(3));
    assert_eq!(deck.snap_state, SnapState::Idle);
}

#[test]
fn swipe_past_the_last_reachable_slide_snaps_back() {
    let report = replay(
        r#"{
        "carousels": [{"name": "deck", "variant": "slide_snap", "slide_width": 100,
                       "slide_count": 5, "visible": 2, "initial_slide": 3}],
        "events": [
            {"at": 0,  "target": "deck", "type": "mouse_down", "x": 200},
            {"at": 40, "target": "deck", "type": "mouse_up",   "x": 50}
        ]
    }"#,
    );
    assert_eq!(navigations(&report, "deck"), vec![(3, NavReason::Swipe)]);
    assert_eq!(report.carousel("deck").unwrap().offset, 300.0);
}

#[test]
fn focus_follows_activity_and_drops_on_outside_press() {
    let report = replay(
        r#"{
        "carousels": [
            {"name": "a", "slide_width": 100, "slide_count": 3},
            {"name": "b", "slide_width": 100, "slide_count": 3},
            {"name": "plain", "slide_width": 100, "slide_count": 3, "focus_managed": false}
        ],
        "events": [
            {"at": 0,   "target": "a", "type": "touch_start"},
            {"at": 10,  "target": "a", "type": "touch_end"},
            {"at": 100, "type": "page_press", "path": [["button"], ["body"]]},
            {"at": 200, "target": "b", "type": "touch_start"},
            {"at": 210, "target": "b", "type": "touch_end"},
            {"at": 300, "type": "page_press",
             "path": [["slide"], ["carousel", "focus-manager"], ["body"]]},
            {"at": 400, "type": "ambient_wheel", "dx": 80}
        ]
    }"#,
    );

    let dropped: Vec<u64> = report
        .entries_for("page")
        .filter(|e| e.event == LogEvent::Page(PageEvent::FocusDropped))
        .map(|e| e.at_ms)
        .collect();
    assert_eq!(dropped, vec![100]);

    let b = report.carousel("b").unwrap();
    assert!(b.has_focus);
    assert_eq!(report.focused, Some(b.id));
    // ambient wheel went to the focused carousel only, then snapped to slide 1
    assert_eq!(b.offset, 100.0);
    assert_eq!(report.carousel("a").unwrap().offset, 0.0);
    assert!(!report.carousel("plain").unwrap().has_focus);
}

#[test]
fn pressing_an_unmanaged_carousel_drops_focus_before_it_claims() {
    let report = replay(
        r#"{
        "carousels": [
            {"name": "a", "slide_width": 100, "slide_count": 3},
            {"name": "plain", "slide_width": 100, "slide_count": 3, "focus_managed": false}
        ],
        "events": [
            {"at": 0,  "target": "a", "type": "touch_start"},
            {"at": 50, "target": "plain", "type": "touch_start"}
        ]
    }"#,
    );
    let page: Vec<&LogEvent> = report.entries_for("page").map(|e| &e.event).collect();
    assert!(page.contains(&&LogEvent::Page(PageEvent::FocusDropped)));
    assert!(report.carousel("plain").unwrap().has_focus);
}

#[test]
fn unmount_cancels_pending_work_and_releases_focus() {
    let report = replay(
        r#"{
        "carousels": [
            {"name": "a", "slide_width": 100, "slide_count": 3},
            {"name": "b", "slide_width": 100, "slide_count": 3}
        ],
        "events": [
            {"at": 0,  "target": "a", "type": "wheel", "dx": 40},
            {"at": 20, "target": "a", "type": "mouse_down", "x": 10},
            {"at": 30, "target": "a", "type": "unmount"},
            {"at": 40, "target": "a", "type": "mouse_up", "x": 10}
        ]
    }"#,
    );
    assert_eq!(report.pending_tasks, 0);
    assert_eq!(report.focused, None);
    assert!(report.carousel("a").is_none());
    assert!(report.entries_for("page").any(|e| matches!(
        e.event,
        LogEvent::Page(PageEvent::Unmounted { .. })
    )));
    assert!(navigations(&report, "a").is_empty());
}

#[test]
fn report_serializes_to_json() {
    let report = replay(
        r#"{
        "carousels": [{"name": "hero", "slide_width": 300, "slide_count": 5}],
        "events": [{"at": 0, "target": "hero", "type": "wheel", "dx": 200}],
        "until_ms": 2000
    }"#,
    );
    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["ended_at_ms"], 2000);
    assert_eq!(v["profile"], "unnamed");
    let kinds: Vec<&str> = v["log"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["kind"].as_str())
        .collect();
    assert_eq!(kinds.first(), Some(&"mounted"));
    assert!(kinds.contains(&"snap_started"));
    assert!(kinds.contains(&"snap_finished"));
}
