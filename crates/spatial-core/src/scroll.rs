#![forbid(unsafe_code)]

//! Spatial scroll projection.
//!
//! A caller drives a scroll by calling [`ScrollProjector::perform_scroll`]
//! (or the cardinally constrained variant) once per frame with the position
//! where the drag started and where the node is now. The projector turns
//! that displacement into a repeating progress value in `[0, 1)` and a
//! highlighted item index.
//!
//! # Lifecycle
//!
//! ```text
//!   perform_* ──▶ activating ──(drag > threshold)──▶ scrolling
//!       │              │                                 │
//!       └──────────────┴──── end_scroll / 2 unpolled ────┴──▶ released
//! ```
//!
//! Creating a record registers a ray visibility hint for the caller;
//! releasing it removes the hint and hides the spatial hint display.
//!
//! # Invariants
//!
//! 1. The scroll direction is frozen at most once per record.
//! 2. `normalized_progress()` is always in `[0, 1)`.
//! 3. A second call in the same frame only records the latest sample.
//! 4. Reversals along the constrained axis only re-anchor the step
//!    reference; previously accumulated steps are never rewritten.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Cardinal scroll with [`CardinalAxis::None`] | `InvalidArgument`, no state change |
//! | `item_count == 0` or degenerate `repeating_length` | `InvalidArgument`, no state change |
//! | Non-finite sample position | `InvalidArgument`, no state change |
//! | Degenerate viewer scale | `PreconditionViolation`, no state change |
//! | Node without a pose source on first call | `PreconditionViolation`, no record |

use ahash::AHashMap;
use glam::Vec3;
use web_time::Instant;

use crate::config::ScrollConfig;
use crate::error::{Result, SpatialError};
use crate::frame::{Frame, PollStamp};
use crate::host::{
    CallerId, Node, NodeResolver, PoseHandle, RayVisibility, SpatialHintDisplay, SpatialHintState,
    ViewerPose, ViewerScale, VisibilityHints, checked_viewer_scale, resolve_source,
};
use crate::math::{project, project_on_plane, wrap_progress};

const TARGET: &str = "spatial.scroll";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Local axis a cardinal scroll is constrained to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CardinalAxis {
    #[default]
    None,
    LocalX,
    LocalY,
    LocalZ,
}

impl CardinalAxis {
    /// Component of `v` along this axis; zero for [`CardinalAxis::None`].
    #[must_use]
    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Self::None => 0.0,
            Self::LocalX => v.x,
            Self::LocalY => v.y,
            Self::LocalZ => v.z,
        }
    }
}

/// One frame's worth of scroll input from a caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub node: Node,
    /// Where the drag started.
    pub starting_position: Vec3,
    /// Where the node is now.
    pub current_position: Vec3,
    /// Projected distance after which progress wraps back to zero.
    pub repeating_length: f32,
    /// Number of items being scrolled through.
    pub item_count: usize,
    /// Upper bound on scrollable items; `None` scrolls at one item per item.
    ///
    /// The ratio `max_item_count / item_count` is a float division, so a
    /// maximum that is not a multiple of the item count scales progress by a
    /// fractional ratio rather than truncating it.
    pub max_item_count: Option<usize>,
    /// Expand scroll visuals from the start position.
    pub center_visuals: bool,
}

impl ScrollRequest {
    #[must_use]
    pub fn new(
        node: Node,
        starting_position: Vec3,
        current_position: Vec3,
        repeating_length: f32,
        item_count: usize,
    ) -> Self {
        Self {
            node,
            starting_position,
            current_position,
            repeating_length,
            item_count,
            max_item_count: None,
            center_visuals: true,
        }
    }

    #[must_use]
    pub fn with_max_item_count(mut self, max_item_count: usize) -> Self {
        self.max_item_count = Some(max_item_count);
        self
    }

    #[must_use]
    pub fn with_center_visuals(mut self, center_visuals: bool) -> Self {
        self.center_visuals = center_visuals;
        self
    }

    /// Displacement from the start of the drag.
    #[must_use]
    pub fn displacement(&self) -> Vec3 {
        self.current_position - self.starting_position
    }

    fn item_ratio(&self) -> f32 {
        let max = self.max_item_count.unwrap_or(self.item_count);
        max as f32 / self.item_count as f32
    }

    fn validate(&self) -> Result<()> {
        if self.item_count == 0 {
            return Err(SpatialError::invalid("item count must be > 0"));
        }
        if !(self.repeating_length > 0.0 && self.repeating_length.is_finite()) {
            return Err(SpatialError::invalid(format!(
                "repeating length must be positive and finite, got {}",
                self.repeating_length
            )));
        }
        if !self.starting_position.is_finite() || !self.current_position.is_finite() {
            return Err(SpatialError::invalid("scroll positions must be finite"));
        }
        Ok(())
    }

    /// Wrapped progress for a projected amount.
    fn progress(&self, amount: f32) -> f32 {
        wrap_progress(amount * self.item_ratio(), self.repeating_length)
    }
}

// ---------------------------------------------------------------------------
// Cardinal constraint
// ---------------------------------------------------------------------------

/// Reversal tracking for a scroll constrained to one local axis.
#[derive(Debug, Clone, PartialEq)]
pub struct CardinalState {
    axis: CardinalAxis,
    previous_projected: Vec3,
    current_projected: Vec3,
    next_update_at: Option<Instant>,
    moving_positive: bool,
    reversal_reference: Vec3,
    cycled_steps: i64,
    constrained_progress: f32,
}

impl CardinalState {
    #[must_use]
    pub fn new(axis: CardinalAxis, reference: Vec3) -> Self {
        Self {
            axis,
            previous_projected: Vec3::ZERO,
            current_projected: Vec3::ZERO,
            next_update_at: None,
            moving_positive: false,
            reversal_reference: reference,
            cycled_steps: 0,
            constrained_progress: 0.0,
        }
    }

    /// Offer a new projected vector. Returns whether it was accepted.
    ///
    /// Updates closer than the configured epsilon to the current vector, or
    /// arriving before the rate limit elapsed, are dropped.
    pub fn offer(&mut self, candidate: Vec3, now: Instant, scale: f32, config: &ScrollConfig) -> bool {
        if (self.current_projected - candidate).length() * scale < config.projected_update_epsilon {
            return false;
        }
        if let Some(next) = self.next_update_at
            && now < next
        {
            return false;
        }

        self.previous_projected = self.current_projected;
        self.current_projected = candidate;
        self.next_update_at = Some(now + config.projected_update_interval());

        let moving_positive = self.axis_motion() > 0.0;
        if moving_positive != self.moving_positive {
            self.reversal_reference = self.current_projected;
            tracing::debug!(
                target: TARGET,
                axis = ?self.axis,
                moving_positive,
                "constrained scroll reversed"
            );
        }
        self.moving_positive = moving_positive;

        let advanced = (self.current_projected - self.reversal_reference).length()
            * scale
            * config.cardinal_step_scale;
        // truncation toward zero counts only whole steps
        let steps = advanced as i64;
        self.cycled_steps = if moving_positive {
            self.cycled_steps.saturating_add(steps)
        } else {
            self.cycled_steps.saturating_sub(steps)
        };
        true
    }

    fn axis_motion(&self) -> f32 {
        self.axis.component(self.current_projected - self.previous_projected)
    }

    #[must_use]
    pub fn axis(&self) -> CardinalAxis {
        self.axis
    }

    #[must_use]
    pub fn previous_projected(&self) -> Vec3 {
        self.previous_projected
    }

    #[must_use]
    pub fn current_projected(&self) -> Vec3 {
        self.current_projected
    }

    #[must_use]
    pub fn moving_positive(&self) -> bool {
        self.moving_positive
    }

    #[must_use]
    pub fn reversal_reference(&self) -> Vec3 {
        self.reversal_reference
    }

    #[must_use]
    pub fn cycled_steps(&self) -> i64 {
        self.cycled_steps
    }

    #[must_use]
    pub fn constrained_progress(&self) -> f32 {
        self.constrained_progress
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Scroll state owned by one caller.
#[derive(Debug)]
pub struct ScrollRecord {
    caller: CallerId,
    source: PoseHandle,
    request: ScrollRequest,
    latest_position: Vec3,
    direction: Option<Vec3>,
    normalized_progress: f32,
    drag_activation_progress: f32,
    poll: PollStamp,
    last_advanced_frame: Option<u64>,
    cardinal: Option<CardinalState>,
}

impl ScrollRecord {
    #[must_use]
    pub fn caller(&self) -> CallerId {
        self.caller
    }

    #[must_use]
    pub fn node(&self) -> Node {
        self.request.node
    }

    #[must_use]
    pub fn request(&self) -> &ScrollRequest {
        &self.request
    }

    #[must_use]
    pub fn latest_position(&self) -> Vec3 {
        self.latest_position
    }

    /// Frozen scroll direction, once the drag crossed the activation distance.
    #[must_use]
    pub fn direction(&self) -> Option<Vec3> {
        self.direction
    }

    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.direction.is_some()
    }

    #[must_use]
    pub fn normalized_progress(&self) -> f32 {
        self.normalized_progress
    }

    /// Item under the current progress.
    #[must_use]
    pub fn highlighted_index(&self) -> usize {
        index_for(self.request.item_count, self.normalized_progress)
    }

    /// Pre-activation drag as a fraction of the activation distance; exceeds
    /// 1 on the tick the direction locks.
    #[must_use]
    pub fn drag_activation_progress(&self) -> f32 {
        self.drag_activation_progress
    }

    #[must_use]
    pub fn center_visuals(&self) -> bool {
        self.request.center_visuals
    }

    #[must_use]
    pub fn cardinal(&self) -> Option<&CardinalState> {
        self.cardinal.as_ref()
    }

    /// Progress along the constrained axis; `None` for unconstrained scrolls.
    #[must_use]
    pub fn constrained_progress(&self) -> Option<f32> {
        self.cardinal.as_ref().map(CardinalState::constrained_progress)
    }

    /// Item selected by the reversal-aware step counter.
    #[must_use]
    pub fn constrained_index(&self) -> Option<usize> {
        let item_count = i64::try_from(self.request.item_count).ok()?;
        let cardinal = self.cardinal.as_ref()?;
        usize::try_from(cardinal.cycled_steps.rem_euclid(item_count)).ok()
    }

    #[must_use]
    pub fn last_polled_frame(&self) -> u64 {
        self.poll.last_polled()
    }
}

fn index_for(item_count: usize, progress: f32) -> usize {
    let index = (item_count as f32 * progress).floor() as usize;
    index.min(item_count.saturating_sub(1))
}

// ---------------------------------------------------------------------------
// Projector
// ---------------------------------------------------------------------------

/// Converts spatial drags into repeating scroll progress, one record per caller.
#[derive(Debug)]
pub struct ScrollProjector {
    config: ScrollConfig,
    records: AHashMap<CallerId, ScrollRecord>,
    frame: Frame,
}

impl ScrollProjector {
    #[must_use]
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            records: AHashMap::new(),
            frame: Frame::first(Instant::now()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Open `frame`; scroll calls from now on are stamped with it.
    pub fn begin_frame(&mut self, frame: Frame) {
        self.frame = frame;
    }

    #[must_use]
    pub fn record(&self, caller: CallerId) -> Option<&ScrollRecord> {
        self.records.get(&caller)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.records.len()
    }

    /// Advance the unconstrained scroll owned by `caller`.
    pub fn perform_scroll<H>(
        &mut self,
        caller: CallerId,
        request: ScrollRequest,
        host: &mut H,
    ) -> Result<&ScrollRecord>
    where
        H: NodeResolver + ViewerScale + VisibilityHints + ?Sized,
    {
        let scale = self.admit(caller, &request, &*host)?;
        let frame = self.frame.index;
        let activation = self.config.activation_distance * scale;

        let record = self.fetch_or_create(caller, request, host)?;
        if record.poll_again(frame, request.current_position) {
            return Ok(&*record);
        }
        record.request = request;
        record.advance(request.displacement(), activation, scale, None);
        Ok(&*record)
    }

    /// Advance a scroll constrained to `axis`, cancelling head motion.
    pub fn perform_cardinal_scroll<H>(
        &mut self,
        caller: CallerId,
        axis: CardinalAxis,
        request: ScrollRequest,
        host: &mut H,
    ) -> Result<&ScrollRecord>
    where
        H: NodeResolver + ViewerScale + ViewerPose + VisibilityHints + ?Sized,
    {
        if axis == CardinalAxis::None {
            tracing::warn!(target: TARGET, caller = %caller, "cardinal scroll requested without an axis");
            return Err(SpatialError::invalid(
                "a cardinal axis is required for a constrained scroll",
            ));
        }
        let scale = self.admit(caller, &request, &*host)?;
        let frame = self.frame;
        let activation = self.config.activation_distance * scale;
        let head = host.head_position();
        let config = self.config.clone();

        let record = self.fetch_or_create(caller, request, host)?;
        if record.poll_again(frame.index, request.current_position) {
            return Ok(&*record);
        }
        record.request = request;

        let cardinal = record
            .cardinal
            .get_or_insert_with(|| CardinalState::new(axis, request.starting_position));
        if cardinal.axis != axis {
            tracing::debug!(
                target: TARGET,
                caller = %caller,
                kept = ?cardinal.axis,
                requested = ?axis,
                "cardinal axis change ignored"
            );
        }
        let head_to_start = request.starting_position - head;
        let head_to_current = request.current_position - head;
        cardinal.offer(
            project_on_plane(head_to_current, head_to_start),
            frame.now,
            scale,
            &config,
        );
        let sign = if cardinal.moving_positive { 1.0 } else { -1.0 };

        record.advance(request.displacement(), activation, scale, Some(sign));
        Ok(&*record)
    }

    /// Stop the scroll owned by `caller`. Returns whether one existed.
    pub fn end_scroll<H>(&mut self, caller: CallerId, host: &mut H) -> bool
    where
        H: VisibilityHints + SpatialHintDisplay + ?Sized,
    {
        let Some(record) = self.records.remove(&caller) else {
            return false;
        };
        tracing::debug!(target: TARGET, caller = %caller, "scroll ended");
        release(&record, host);
        true
    }

    /// Close `frame`, dropping scrolls whose caller stopped polling.
    ///
    /// Returns the released callers in ascending order.
    pub fn tick<H>(&mut self, frame: Frame, host: &mut H) -> Vec<CallerId>
    where
        H: VisibilityHints + SpatialHintDisplay + ?Sized,
    {
        self.frame = frame;
        let _span = tracing::debug_span!(
            "spatial.scroll.tick",
            frame = frame.index,
            active = self.records.len(),
        )
        .entered();

        let grace = self.config.grace_ticks;
        let mut stale: Vec<CallerId> = self
            .records
            .iter()
            .filter(|(_, record)| !record.poll.is_live(frame.index, grace))
            .map(|(&caller, _)| caller)
            .collect();
        stale.sort_unstable();

        for caller in &stale {
            if let Some(record) = self.records.remove(caller) {
                tracing::debug!(
                    target: TARGET,
                    caller = %caller,
                    last_polled = record.poll.last_polled(),
                    "pruning unpolled scroll"
                );
                release(&record, host);
            }
        }
        stale
    }

    /// Validate everything before any state is touched.
    fn admit<H>(&self, caller: CallerId, request: &ScrollRequest, host: &H) -> Result<f32>
    where
        H: ViewerScale + ?Sized,
    {
        request
            .validate()
            .and_then(|()| checked_viewer_scale(host))
            .inspect_err(|err| {
                tracing::warn!(target: TARGET, caller = %caller, error = %err, "scroll request rejected");
            })
    }

    fn fetch_or_create<H>(
        &mut self,
        caller: CallerId,
        request: ScrollRequest,
        host: &mut H,
    ) -> Result<&mut ScrollRecord>
    where
        H: NodeResolver + VisibilityHints + ?Sized,
    {
        if !self.records.contains_key(&caller) {
            let (source, _) = resolve_source(&*host, request.node).inspect_err(|err| {
                tracing::warn!(target: TARGET, caller = %caller, error = %err, "cannot start scroll");
            })?;
            host.add_visibility_hint(
                &source,
                caller,
                RayVisibility::empty(),
                self.config.hint_priority,
            );
            tracing::debug!(target: TARGET, caller = %caller, node = ?request.node, "scroll started");
            self.records.insert(
                caller,
                ScrollRecord {
                    caller,
                    source,
                    request,
                    latest_position: request.current_position,
                    direction: None,
                    normalized_progress: 0.0,
                    drag_activation_progress: 0.0,
                    poll: PollStamp::new(self.frame.index),
                    last_advanced_frame: None,
                    cardinal: None,
                },
            );
        }
        self.records
            .get_mut(&caller)
            .ok_or_else(|| SpatialError::precondition(format!("no scroll record for {caller}")))
    }
}

impl Default for ScrollProjector {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

impl ScrollRecord {
    /// Mark polled; true when this frame was already processed.
    fn poll_again(&mut self, frame: u64, position: Vec3) -> bool {
        self.poll.mark(frame);
        self.latest_position = position;
        if self.last_advanced_frame == Some(frame) {
            return true;
        }
        self.last_advanced_frame = Some(frame);
        false
    }

    /// Activation or projection step. `axis_sign` is set for cardinal scrolls.
    fn advance(&mut self, displacement: Vec3, activation: f32, scale: f32, axis_sign: Option<f32>) {
        let Some(direction) = self.direction else {
            let magnitude = displacement.length();
            self.drag_activation_progress = if magnitude > 0.0 {
                magnitude / activation
            } else {
                0.0
            };
            if magnitude > activation {
                self.direction = Some(displacement);
                tracing::debug!(
                    target: TARGET,
                    caller = %self.caller,
                    direction = ?displacement,
                    "scroll direction locked"
                );
            }
            return;
        };

        let forward = displacement.dot(direction) >= 0.0;
        let axis = if forward { direction } else { direction + direction };
        let mut amount = project(displacement, axis).length() / scale;
        if let Some(sign) = axis_sign {
            amount *= sign;
        }
        if !forward {
            amount = 1.0 - amount;
        }

        self.normalized_progress = self.request.progress(amount);
        if let Some(cardinal) = self.cardinal.as_mut() {
            cardinal.constrained_progress = self.normalized_progress;
        }
    }
}

fn release<H>(record: &ScrollRecord, host: &mut H)
where
    H: VisibilityHints + SpatialHintDisplay + ?Sized,
{
    host.remove_visibility_hint(&record.source, record.caller);
    host.set_spatial_hint_state(SpatialHintState::Hidden);
}
