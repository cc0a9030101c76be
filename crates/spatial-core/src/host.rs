#![forbid(unsafe_code)]

//! Collaborator contracts consumed by the engine.
//!
//! The classifier and the projector never own device registries, haptic
//! playback, or UI hint rendering. They reach those services through the
//! narrow traits below, each call site asking only for the traits it needs.
//! [`SpatialHost`] bundles all of them for hosts that implement everything
//! on one type.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use glam::{Quat, Vec3};
use web_time::Duration;

use crate::error::{Result, SpatialError};
use crate::math::from_euler_degrees;

/// Logical identifier of one tracked input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    LeftHand,
    RightHand,
}

/// Identity of the object that owns a tracking or scroll session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerId(u64);

impl CallerId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "caller#{}", self.0)
    }
}

/// Position and local rotation sampled from a node's transform.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Pose with the rotation given as Euler angles in degrees.
    #[must_use]
    pub fn with_euler_degrees(position: Vec3, degrees: Vec3) -> Self {
        Self::new(position, from_euler_degrees(degrees))
    }
}

/// Live position/rotation source for a node.
///
/// Records hold the source itself and read it every tick; `None` means the
/// underlying transform is gone.
pub trait PoseSource: fmt::Debug {
    fn pose(&self) -> Option<Pose>;
}

/// Shared handle to a node's pose source.
pub type PoseHandle = Rc<dyn PoseSource>;

/// A pose cell the host writes each frame and the engine reads.
#[derive(Debug, Clone, Default)]
pub struct SharedPose(Rc<Cell<Pose>>);

impl SharedPose {
    #[must_use]
    pub fn new(pose: Pose) -> Self {
        Self(Rc::new(Cell::new(pose)))
    }

    pub fn set(&self, pose: Pose) {
        self.0.set(pose);
    }

    pub fn set_position(&self, position: Vec3) {
        let mut pose = self.0.get();
        pose.position = position;
        self.0.set(pose);
    }

    pub fn set_rotation(&self, rotation: Quat) {
        let mut pose = self.0.get();
        pose.rotation = rotation;
        self.0.set(pose);
    }

    #[must_use]
    pub fn get(&self) -> Pose {
        self.0.get()
    }

    /// A handle sharing this cell.
    #[must_use]
    pub fn handle(&self) -> PoseHandle {
        Rc::new(self.clone())
    }
}

impl PoseSource for SharedPose {
    fn pose(&self) -> Option<Pose> {
        Some(self.0.get())
    }
}

bitflags! {
    /// Parts of a node's ray that stay visible while a hint is registered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RayVisibility: u8 {
        const RAY = 1 << 0;
        const CONE = 1 << 1;
    }
}

/// Display state of the spatial scroll hint UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpatialHintState {
    #[default]
    Hidden,
    PreDragVisuals,
    Scrolling,
    CenteredScrolling,
}

/// Haptic pulse descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
pub struct HapticPulse {
    pub duration_ms: u32,
    pub intensity: f32,
}

impl HapticPulse {
    #[must_use]
    pub const fn new(duration_ms: u32, intensity: f32) -> Self {
        Self {
            duration_ms,
            intensity,
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_ms))
    }
}

/// Maps a logical node to its live transform. Called once per record, at creation.
pub trait NodeResolver {
    fn resolve(&self, node: Node) -> Option<PoseHandle>;
}

/// Scalar normalizing physical distances to the current scene scale.
pub trait ViewerScale {
    fn viewer_scale(&self) -> f32;
}

/// Position of the viewer's head, used to cancel head motion from scroll input.
pub trait ViewerPose {
    fn head_position(&self) -> Vec3;
}

/// Registry of per-owner ray visibility overrides.
pub trait VisibilityHints {
    fn add_visibility_hint(
        &mut self,
        source: &PoseHandle,
        owner: CallerId,
        visible: RayVisibility,
        priority: i32,
    );

    fn remove_visibility_hint(&mut self, source: &PoseHandle, owner: CallerId);
}

/// The spatial scroll hint display.
pub trait SpatialHintDisplay {
    fn set_spatial_hint_state(&mut self, state: SpatialHintState);
}

/// Fire-and-forget haptic playback.
pub trait HapticPlayer {
    fn play_pulse(&mut self, node: Node, pulse: &HapticPulse, intensity: f32, duration: Duration);
}

/// Every collaborator the engine consumes.
pub trait SpatialHost:
    NodeResolver + ViewerScale + ViewerPose + VisibilityHints + SpatialHintDisplay + HapticPlayer
{
}

impl<T> SpatialHost for T where
    T: NodeResolver
        + ViewerScale
        + ViewerPose
        + VisibilityHints
        + SpatialHintDisplay
        + HapticPlayer
        + ?Sized
{
}

/// Resolve `node`, failing with a precondition violation when the host has no source.
pub(crate) fn resolve_source<R: NodeResolver + ?Sized>(
    resolver: &R,
    node: Node,
) -> Result<(PoseHandle, Pose)> {
    let source = resolver
        .resolve(node)
        .ok_or_else(|| SpatialError::precondition(format!("no pose source for {node:?}")))?;
    let pose = source
        .pose()
        .ok_or_else(|| SpatialError::precondition(format!("pose source for {node:?} is detached")))?;
    Ok((source, pose))
}

/// The current viewer scale, rejected when it would poison distance math.
pub(crate) fn checked_viewer_scale<V: ViewerScale + ?Sized>(viewer: &V) -> Result<f32> {
    let scale = viewer.viewer_scale();
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(SpatialError::precondition(format!(
            "viewer scale must be positive and finite, got {scale}"
        )))
    }
}
