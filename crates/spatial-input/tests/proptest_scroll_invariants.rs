//! Property-based invariants for spatial scrolling through the module.
//!
//! ## Invariants
//!
//! 1. Progress range: `normalized_progress` stays in `[0, 1)` and the
//!    highlighted index stays below the item count
//! 2. Direction lock: once set, the scroll direction never changes
//! 3. Continuity: crossing back over the start point moves progress by at
//!    most one item (on the wrapped circle)
//! 4. Wrap law: one repeating length further along the direction returns
//!    the same progress

use proptest::prelude::*;
use spatial_core::testing::RecordingHost;
use spatial_input::glam::Vec3;
use spatial_input::prelude::*;
use std::time::Duration;

const CALLER: CallerId = CallerId::new(3);
const NODE: Node = Node::LeftHand;

// ── Strategies ────────────────────────────────────────────────────────────

fn arb_position() -> impl Strategy<Value = Vec3> {
    let axis = (-300i32..=300).prop_map(|x| x as f32 / 100.0);
    (axis.clone(), axis.clone(), axis).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_direction() -> impl Strategy<Value = Vec3> {
    prop_oneof![Just(Vec3::X), Just(Vec3::Y), Just(Vec3::Z), Just(Vec3::NEG_X)]
}

fn arb_item_count() -> impl Strategy<Value = usize> {
    1usize..40
}

struct Driver {
    module: SpatialInputModule,
    host: RecordingHost,
}

impl Driver {
    fn new() -> Self {
        Self {
            module: SpatialInputModule::default(),
            host: RecordingHost::new().with_node(NODE, Pose::default()),
        }
    }

    /// One polled frame; returns (progress, index, direction).
    fn frame(&mut self, request: ScrollRequest) -> (f32, usize, Option<Vec3>) {
        let record = self
            .module
            .perform_scroll(CALLER, request, &mut self.host)
            .unwrap();
        let sample = (
            record.normalized_progress(),
            record.highlighted_index(),
            record.direction(),
        );
        self.module.update(&mut self.host);
        let next = self.module.frame().next(Duration::from_millis(16));
        self.module.begin_frame(next);
        sample
    }
}

fn circular_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs();
    d.min(1.0 - d)
}

// ── 1-2. Range and direction lock ─────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn progress_in_range_and_direction_locked(
        path in prop::collection::vec(arb_position(), 1..40),
        items in arb_item_count(),
        length in (10u32..=300).prop_map(|x| x as f32 / 100.0),
    ) {
        let mut driver = Driver::new();
        let mut locked: Option<Vec3> = None;
        for current in path {
            let request = ScrollRequest::new(NODE, Vec3::ZERO, current, length, items);
            let (progress, index, direction) = driver.frame(request);

            prop_assert!((0.0..1.0).contains(&progress), "progress={progress}");
            prop_assert!(index < items, "index={index} items={items}");
            match locked {
                Some(dir) => prop_assert_eq!(direction, Some(dir)),
                None => locked = direction,
            }
        }
    }
}

// ── 3-4. Continuity and wrap ──────────────────────────────────────────────

proptest! {
    #[test]
    fn crossing_the_origin_moves_at_most_one_item(
        dir in arb_direction(),
        items in arb_item_count(),
        epsilon in (1u32..=10).prop_map(|x| x as f32 / 1000.0),
    ) {
        prop_assume!(epsilon < 0.5 / items as f32);
        let mut driver = Driver::new();
        let request = |at: Vec3| ScrollRequest::new(NODE, Vec3::ZERO, at, 1.0, items);

        driver.frame(request(dir * 0.5));
        let (ahead, _, _) = driver.frame(request(dir * epsilon));
        let (behind, _, direction) = driver.frame(request(-dir * epsilon));

        prop_assert_eq!(direction, Some(dir * 0.5));
        prop_assert!(
            circular_distance(ahead, behind) <= 1.0 / items as f32 + 1e-4,
            "ahead={ahead} behind={behind}"
        );
    }

    #[test]
    fn one_length_further_wraps_to_same_progress(
        dir in arb_direction(),
        steps in 1u32..=8,
        length in prop_oneof![Just(0.25f32), Just(0.5), Just(1.0), Just(2.0)],
    ) {
        let mut driver = Driver::new();
        let along = steps as f32 / 16.0;
        let request = |d: f32| ScrollRequest::new(NODE, Vec3::ZERO, dir * d, length, 8);

        driver.frame(request(0.5));
        let (first, _, _) = driver.frame(request(along));
        let (second, _, _) = driver.frame(request(along + length));

        prop_assert!(circular_distance(first, second) < 1e-4, "{first} vs {second}");
    }
}
