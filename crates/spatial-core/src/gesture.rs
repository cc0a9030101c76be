#![forbid(unsafe_code)]

//! Per-node gesture classification.
//!
//! Each tracked node owns one [`NodeGestureRecord`]. Once per frame the
//! classifier drops records their owner stopped polling, then compares every
//! live record's pose against the baseline captured when its gesture last
//! changed.
//!
//! # Invariants
//!
//! 1. A record holds exactly one [`GestureKind`] at all times.
//! 2. The baseline pose is re-captured iff the gesture changes to a non-idle
//!    kind; it is never touched while a gesture stays active.
//! 3. A record that changed gesture this tick is not evaluated again until
//!    the next tick, so repeated [`GestureClassifier::classify`] calls are
//!    idempotent.
//! 4. Pruning runs before classification within a tick.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Node has no pose source at track time | `PreconditionViolation`, nothing recorded |
//! | Pose source detached mid-session | Record skipped for the tick, warning logged |
//! | Zero frame delta | Rotation strength keeps its previous value |

use ahash::AHashMap;
use glam::{Quat, Vec3};
use web_time::Instant;

use crate::config::GestureConfig;
use crate::error::{Result, SpatialError};
use crate::frame::{Frame, PollStamp};
use crate::host::{CallerId, HapticPlayer, Node, NodeResolver, Pose, PoseHandle, resolve_source};
use crate::math::{delta_angle, euler_degrees};
use crate::velocity::RotationVelocityTracker;

const TARGET: &str = "spatial.gesture";

// ---------------------------------------------------------------------------
// Gesture kinds
// ---------------------------------------------------------------------------

/// The gesture a node is currently performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GestureKind {
    #[default]
    Idle,
    /// Dragging away from the baseline position.
    Translating,
    /// Rotating about exactly one Euler axis.
    SingleAxisRotating,
    /// Rotating about two or more Euler axes.
    FreeRotating,
}

impl GestureKind {
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Translating => "translating",
            Self::SingleAxisRotating => "single_axis_rotating",
            Self::FreeRotating => "free_rotating",
        }
    }
}

/// Snapshot returned to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureState {
    pub kind: GestureKind,
    /// The kind was set during the latest tick.
    pub changed_this_tick: bool,
}

/// A gesture change observed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTransition {
    pub node: Node,
    pub from: GestureKind,
    pub to: GestureKind,
    /// The record was dropped for lack of polling.
    pub pruned: bool,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct NodeGestureRecord {
    caller: CallerId,
    source: PoseHandle,
    baseline_position: Vec3,
    baseline_rotation: Quat,
    gesture: GestureKind,
    changed_this_tick: bool,
    poll: PollStamp,
    velocity: RotationVelocityTracker,
}

impl NodeGestureRecord {
    fn new(caller: CallerId, source: PoseHandle, pose: Pose, frame: u64, config: &GestureConfig) -> Self {
        Self {
            caller,
            source,
            baseline_position: pose.position,
            baseline_rotation: pose.rotation,
            gesture: GestureKind::Idle,
            changed_this_tick: false,
            poll: PollStamp::new(frame),
            velocity: RotationVelocityTracker::primed(config.velocity, pose.rotation),
        }
    }

    #[must_use]
    pub fn caller(&self) -> CallerId {
        self.caller
    }

    #[must_use]
    pub fn gesture(&self) -> GestureKind {
        self.gesture
    }

    #[must_use]
    pub fn changed_this_tick(&self) -> bool {
        self.changed_this_tick
    }

    #[must_use]
    pub fn baseline(&self) -> Pose {
        Pose::new(self.baseline_position, self.baseline_rotation)
    }

    #[must_use]
    pub fn last_polled_frame(&self) -> u64 {
        self.poll.last_polled()
    }

    #[must_use]
    pub fn rotation_strength(&self) -> f32 {
        self.velocity.rotation_strength()
    }

    fn state(&self) -> GestureState {
        GestureState {
            kind: self.gesture,
            changed_this_tick: self.changed_this_tick,
        }
    }

    /// Store `to`, re-capturing the baseline for active kinds.
    fn apply(&mut self, to: GestureKind, pose: Pose) -> bool {
        if self.gesture == to {
            return false;
        }
        self.gesture = to;
        self.changed_this_tick = true;
        if to.is_active() {
            self.baseline_position = pose.position;
            self.baseline_rotation = pose.rotation;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Threshold tests
// ---------------------------------------------------------------------------

/// Number of Euler axes whose shortest-arc delta exceeds `threshold`.
///
/// Z is tested first, then X; Y is only tested while fewer than two axes
/// have crossed.
#[must_use]
pub fn crossed_rotation_axes(baseline: Quat, current: Quat, threshold_degrees: f32) -> u8 {
    let from = euler_degrees(baseline);
    let to = euler_degrees(current);
    let crosses = |a: f32, b: f32| delta_angle(a, b).abs() > threshold_degrees;

    let mut count = u8::from(crosses(from.z, to.z)) + u8::from(crosses(from.x, to.x));
    if count < 2 {
        count += u8::from(crosses(from.y, to.y));
    }
    count
}

fn rotation_kind(crossed: u8) -> Option<GestureKind> {
    match crossed {
        0 => None,
        1 => Some(GestureKind::SingleAxisRotating),
        _ => Some(GestureKind::FreeRotating),
    }
}

/// The kind a record should hold next, given its current kind.
fn next_kind(current: GestureKind, crossed: u8, translated: bool) -> GestureKind {
    match current {
        GestureKind::Translating => rotation_kind(crossed).unwrap_or(current),
        GestureKind::SingleAxisRotating => {
            if translated {
                GestureKind::Translating
            } else {
                current
            }
        }
        // only a single-axis match skips the translation test
        GestureKind::Idle | GestureKind::FreeRotating => match rotation_kind(crossed) {
            Some(GestureKind::SingleAxisRotating) => GestureKind::SingleAxisRotating,
            _ if translated => GestureKind::Translating,
            rotating => rotating.unwrap_or(current),
        },
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classifies the gesture of every tracked node.
#[derive(Debug)]
pub struct GestureClassifier {
    config: GestureConfig,
    records: AHashMap<Node, NodeGestureRecord>,
    frame: Frame,
}

impl GestureClassifier {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            records: AHashMap::new(),
            frame: Frame::first(Instant::now()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// The frame polls are currently stamped with.
    #[must_use]
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Open `frame`; polls made from now on are stamped with it.
    pub fn begin_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    /// Begin tracking `node` for `caller`, or keep an existing record alive.
    ///
    /// The node is resolved only when the record is created.
    pub fn track<R: NodeResolver + ?Sized>(
        &mut self,
        caller: CallerId,
        node: Node,
        resolver: &R,
    ) -> Result<GestureState> {
        let frame = self.frame.index;
        if let Some(record) = self.records.get_mut(&node) {
            if record.caller != caller {
                tracing::debug!(
                    target: TARGET,
                    ?node,
                    previous = %record.caller,
                    caller = %caller,
                    "node tracking taken over by new caller"
                );
                record.caller = caller;
            }
            record.poll.mark(frame);
            return Ok(record.state());
        }

        let (source, pose) = resolve_source(resolver, node).inspect_err(|err| {
            tracing::warn!(target: TARGET, ?node, caller = %caller, error = %err, "cannot track node");
        })?;
        let record = NodeGestureRecord::new(caller, source, pose, frame, &self.config);
        let state = record.state();
        self.records.insert(node, record);
        tracing::debug!(target: TARGET, ?node, caller = %caller, frame, "tracking node");
        Ok(state)
    }

    /// Poll `node` and return its current gesture, tracking it if needed.
    pub fn gesture_for<R: NodeResolver + ?Sized>(
        &mut self,
        caller: CallerId,
        node: Node,
        resolver: &R,
    ) -> Result<GestureState> {
        self.track(caller, node, resolver)
    }

    /// Current gesture of `node`; idle when untracked.
    #[must_use]
    pub fn gesture(&self, node: Node) -> GestureKind {
        self.records
            .get(&node)
            .map_or(GestureKind::Idle, NodeGestureRecord::gesture)
    }

    #[must_use]
    pub fn state(&self, node: Node) -> Option<GestureState> {
        self.records.get(&node).map(NodeGestureRecord::state)
    }

    #[must_use]
    pub fn changed_this_tick(&self, node: Node) -> bool {
        self.records
            .get(&node)
            .is_some_and(NodeGestureRecord::changed_this_tick)
    }

    #[must_use]
    pub fn record(&self, node: Node) -> Option<&NodeGestureRecord> {
        self.records.get(&node)
    }

    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }

    /// Evaluate `node` against its baseline once.
    ///
    /// A record that already changed this tick is left alone.
    pub fn classify<H: HapticPlayer + ?Sized>(
        &mut self,
        node: Node,
        haptics: &mut H,
    ) -> Result<GestureKind> {
        let record = self
            .records
            .get_mut(&node)
            .ok_or_else(|| SpatialError::precondition(format!("{node:?} is not tracked")))?;
        let pose = record
            .source
            .pose()
            .ok_or_else(|| SpatialError::precondition(format!("pose source for {node:?} is detached")))?;
        if let Some(transition) = evaluate(node, record, pose, &self.config) {
            play_feedback(&self.config, record, &transition, haptics);
        }
        Ok(record.gesture)
    }

    /// Close `frame`: prune unpolled records, then classify the rest.
    ///
    /// Returns every transition, pruned records included, ordered by node.
    pub fn tick<H: HapticPlayer + ?Sized>(
        &mut self,
        frame: Frame,
        haptics: &mut H,
    ) -> Vec<GestureTransition> {
        self.frame = frame;
        let _span = tracing::debug_span!(
            "spatial.gesture.tick",
            frame = frame.index,
            tracked = self.records.len(),
        )
        .entered();

        let mut transitions = self.prune();

        for (&node, record) in &mut self.records {
            record.changed_this_tick = false;
            let Some(pose) = record.source.pose() else {
                tracing::warn!(target: TARGET, ?node, "pose source detached, skipping record");
                continue;
            };
            record.velocity.update(pose.rotation, frame.delta);
            if let Some(transition) = evaluate(node, record, pose, &self.config) {
                play_feedback(&self.config, record, &transition, haptics);
                transitions.push(transition);
            }
        }

        transitions.sort_by_key(|transition| transition.node);
        transitions
    }

    /// Drop records whose owner missed the grace window.
    fn prune(&mut self) -> Vec<GestureTransition> {
        let frame = self.frame.index;
        let grace = self.config.grace_ticks;
        let mut pruned = Vec::new();
        self.records.retain(|&node, record| {
            if record.poll.is_live(frame, grace) {
                return true;
            }
            tracing::debug!(
                target: TARGET,
                ?node,
                caller = %record.caller,
                last_polled = record.poll.last_polled(),
                "pruning unpolled node"
            );
            pruned.push(GestureTransition {
                node,
                from: record.gesture,
                to: GestureKind::Idle,
                pruned: true,
            });
            false
        });
        pruned
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

fn evaluate(
    node: Node,
    record: &mut NodeGestureRecord,
    pose: Pose,
    config: &GestureConfig,
) -> Option<GestureTransition> {
    if record.changed_this_tick {
        return None;
    }
    let crossed = crossed_rotation_axes(
        record.baseline_rotation,
        pose.rotation,
        config.rotation_threshold_degrees,
    );
    let translated =
        record.baseline_position.distance(pose.position) > config.translation_threshold;
    let from = record.gesture;
    let to = next_kind(from, crossed, translated);
    if !record.apply(to, pose) {
        return None;
    }
    tracing::debug!(
        target: TARGET,
        ?node,
        from = from.as_str(),
        to = to.as_str(),
        crossed,
        "gesture changed"
    );
    Some(GestureTransition {
        node,
        from,
        to,
        pruned: false,
    })
}

fn play_feedback<H: HapticPlayer + ?Sized>(
    config: &GestureConfig,
    record: &NodeGestureRecord,
    transition: &GestureTransition,
    haptics: &mut H,
) {
    let (pulse, intensity) = match transition.to {
        GestureKind::Idle => return,
        GestureKind::Translating => (&config.translation_pulse, config.translation_pulse.intensity),
        GestureKind::SingleAxisRotating => (
            &config.single_axis_rotation_pulse,
            config.single_axis_rotation_pulse.intensity * record.rotation_strength(),
        ),
        GestureKind::FreeRotating => (
            &config.free_rotation_pulse,
            config.free_rotation_pulse.intensity * record.rotation_strength(),
        ),
    };
    if intensity > 0.0 {
        haptics.play_pulse(transition.node, pulse, intensity, pulse.duration());
    }
}
