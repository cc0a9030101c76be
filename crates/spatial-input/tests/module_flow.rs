//! End-to-end frames through the `SpatialInputModule` command surface.
//!
//! Run:
//!   cargo test -p spatial-input --test module_flow

use std::time::Duration;

use spatial_core::testing::{HostCall, RecordingHost};
use spatial_input::glam::Vec3;
use spatial_input::prelude::*;
use spatial_input::{GestureTransition, RayVisibility, SpatialHintState};
use tracing_test::traced_test;

const MENU: CallerId = CallerId::new(10);
const TOOL: CallerId = CallerId::new(20);
const FRAME_DT: Duration = Duration::from_millis(16);

// ============================================================================
// Test Infrastructure
// ============================================================================

struct Session {
    module: SpatialInputModule,
    host: RecordingHost,
}

impl Session {
    fn new() -> Self {
        Self {
            module: SpatialInputModule::default(),
            host: RecordingHost::new()
                .with_node(Node::LeftHand, Pose::default())
                .with_node(Node::RightHand, Pose::default()),
        }
    }

    fn next_frame(&mut self) {
        let frame = self.module.frame().next(FRAME_DT);
        self.module.begin_frame(frame);
    }

    fn close(&mut self) -> FrameReport {
        self.module.update(&mut self.host)
    }

    fn scroll(&mut self, current: Vec3) -> f32 {
        let request = ScrollRequest::new(Node::LeftHand, Vec3::ZERO, current, 1.0, 10)
            .with_max_item_count(10);
        self.module
            .perform_scroll(MENU, request, &mut self.host)
            .unwrap()
            .normalized_progress()
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scroll_and_gesture_run_side_by_side() {
    let mut session = Session::new();

    session.module.track_node(TOOL, Node::RightHand, &session.host).unwrap();
    session.scroll(Vec3::new(0.03125, 0.0, 0.0));
    assert!(session.close().is_quiet());

    session.next_frame();
    session
        .host
        .set_rotation_degrees(Node::RightHand, Vec3::new(0.0, 0.0, 0.5));
    let kind = session
        .module
        .gesture_for(TOOL, Node::RightHand, &session.host)
        .unwrap();
    assert_eq!(kind, GestureKind::Idle);
    let progress = session.scroll(Vec3::new(0.5, 0.0, 0.0));
    let report = session.close();

    assert!((progress - 0.5).abs() < 1e-6);
    assert_eq!(
        report.transitions,
        vec![GestureTransition {
            node: Node::RightHand,
            from: GestureKind::Idle,
            to: GestureKind::SingleAxisRotating,
            pruned: false,
        }]
    );
    assert_eq!(
        session
            .module
            .scrolls()
            .record(MENU)
            .unwrap()
            .highlighted_index(),
        5
    );
}

#[test]
fn abandoned_sessions_are_released_after_two_frames() {
    let mut session = Session::new();
    session.module.track_node(TOOL, Node::RightHand, &session.host).unwrap();
    session.scroll(Vec3::ZERO);
    session.close();

    session.next_frame();
    assert!(session.close().is_quiet());

    session.host.clear_calls();
    session.next_frame();
    let report = session.close();

    assert_eq!(report.released_scrolls, vec![MENU]);
    assert_eq!(report.transitions.len(), 1);
    assert!(report.transitions[0].pruned);
    assert_eq!(
        session.host.calls(),
        &[
            HostCall::RemoveHint { owner: MENU },
            HostCall::HintState(SpatialHintState::Hidden),
        ]
    );
    assert_eq!(session.module.gestures().tracked_count(), 0);
}

#[test]
fn ending_an_unknown_scroll_touches_nothing() {
    let mut session = Session::new();
    assert!(!session.module.end_scroll(MENU, &mut session.host));
    assert!(session.host.calls().is_empty());
}

#[test]
fn ending_a_scroll_releases_its_hint() {
    let mut session = Session::new();
    session.scroll(Vec3::ZERO);
    assert_eq!(
        session.host.calls(),
        &[HostCall::AddHint {
            owner: MENU,
            visible: RayVisibility::empty(),
            priority: 1,
        }]
    );

    assert!(session.module.end_scroll(MENU, &mut session.host));
    assert!(session.module.scrolls().record(MENU).is_none());
    assert!(session
        .host
        .calls()
        .contains(&HostCall::RemoveHint { owner: MENU }));
}

#[test]
fn cardinal_scroll_without_axis_is_rejected() {
    let mut session = Session::new();
    let request = ScrollRequest::new(Node::LeftHand, Vec3::ZERO, Vec3::Y, 1.0, 4);
    let err = session
        .module
        .perform_cardinal_scroll(MENU, CardinalAxis::None, request, &mut session.host)
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(session.module.scrolls().record(MENU).is_none());
    assert!(session.host.calls().is_empty());
}

#[test]
fn untracked_node_without_source_fails_only_that_call() {
    let mut session = Session {
        module: SpatialInputModule::default(),
        host: RecordingHost::new().with_node(Node::RightHand, Pose::default()),
    };
    assert!(session
        .module
        .track_node(TOOL, Node::LeftHand, &session.host)
        .is_err());
    assert!(session
        .module
        .track_node(TOOL, Node::RightHand, &session.host)
        .is_ok());
    assert_eq!(session.module.gestures().tracked_count(), 1);
}

#[test]
fn translation_plays_haptic_pulse() {
    let mut session = Session::new();
    session.module.track_node(TOOL, Node::RightHand, &session.host).unwrap();
    session.host.set_position(Node::RightHand, Vec3::new(0.0, 0.0, 0.2));
    session.close();

    assert_eq!(
        session.module.gestures().gesture(Node::RightHand),
        GestureKind::Translating
    );
    assert_eq!(session.host.pulses(), vec![(Node::RightHand, 0.35)]);
}

#[test]
#[traced_test]
fn release_is_logged() {
    let mut session = Session::new();
    session.scroll(Vec3::ZERO);
    session.close();
    session.next_frame();
    session.close();
    session.next_frame();
    session.close();
    assert!(logs_contain("pruning unpolled scroll"));
}
