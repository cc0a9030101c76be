#![forbid(unsafe_code)]

//! Controller affordance animation.
//!
//! A tracked controller model has affordances (buttons, triggers, sticks),
//! each bound to an input control and to a transform on the model. Every
//! frame the animator maps each control's raw value in `[-1, 1]` onto a
//! translation and rotation offset and sums the offsets per transform.
//!
//! Offsets are rebuilt from zero each frame, so a released control snaps
//! its transform back to the pose captured at construction.

use std::fmt::Debug;
use std::hash::Hash;

use ahash::AHashMap;
use bitflags::bitflags;
use glam::Vec3;

use crate::host::Pose;
use crate::math::{euler_degrees, from_euler_degrees};

const TARGET: &str = "spatial.affordance";

bitflags! {
    /// Local axes an animation moves along.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AxisFlags: u8 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const Z = 1 << 2;
    }
}

impl AxisFlags {
    /// Sum of the unit vectors of every set axis.
    #[must_use]
    pub fn axis_vector(self) -> Vec3 {
        let mut axis = Vec3::ZERO;
        if self.contains(Self::X) {
            axis += Vec3::X;
        }
        if self.contains(Self::Y) {
            axis += Vec3::Y;
        }
        if self.contains(Self::Z) {
            axis += Vec3::Z;
        }
        axis
    }
}

/// Identifier of one input control on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(pub u32);

/// How a control value drives its affordance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationDefinition {
    pub translate_axes: AxisFlags,
    pub rotate_axes: AxisFlags,
    /// Offset at control value -1 (units, or degrees for rotation).
    pub min: f32,
    /// Offset at control value 1.
    pub max: f32,
}

impl AnimationDefinition {
    /// Offset for a raw control value; values outside `[-1, 1]` are clamped.
    #[must_use]
    pub fn offset(&self, value: f32) -> f32 {
        let value = value.clamp(-1.0, 1.0);
        self.min + (value + 1.0) * (self.max - self.min) * 0.5
    }
}

/// Binds a control to its animation. Controls without one stay still.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffordanceDefinition {
    pub control: ControlId,
    pub animation: Option<AnimationDefinition>,
}

/// One animated part of a device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordance<T> {
    pub control: ControlId,
    pub target: T,
}

/// Rest pose of a transform and the offsets accumulated this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformInfo {
    pub initial_position: Vec3,
    /// Euler angles in degrees.
    pub initial_rotation: Vec3,
    pub position_offset: Vec3,
    /// Euler angles in degrees.
    pub rotation_offset: Vec3,
}

impl TransformInfo {
    #[must_use]
    pub fn new(rest: Pose) -> Self {
        Self {
            initial_position: rest.position,
            initial_rotation: euler_degrees(rest.rotation),
            ..Self::default()
        }
    }

    /// Rest pose with this frame's offsets applied.
    #[must_use]
    pub fn pose(&self) -> Pose {
        Pose::new(
            self.initial_position + self.position_offset,
            from_euler_degrees(self.initial_rotation + self.rotation_offset),
        )
    }

    fn reset(&mut self) {
        self.position_offset = Vec3::ZERO;
        self.rotation_offset = Vec3::ZERO;
    }
}

/// Drives every affordance of one device model.
#[derive(Debug)]
pub struct AffordanceAnimator<T> {
    affordances: Vec<Affordance<T>>,
    /// First definition per control; `None` keeps the control still.
    animations: AHashMap<ControlId, Option<AnimationDefinition>>,
    transforms: AHashMap<T, TransformInfo>,
}

impl<T> AffordanceAnimator<T>
where
    T: Copy + Eq + Hash + Debug,
{
    /// Capture the rest pose of every affordance target.
    ///
    /// When several definitions name the same control, the first wins,
    /// even when it carries no animation.
    pub fn new(
        affordances: Vec<Affordance<T>>,
        definitions: &[AffordanceDefinition],
        mut rest_pose: impl FnMut(T) -> Pose,
    ) -> Self {
        let mut animations = AHashMap::new();
        for definition in definitions {
            animations
                .entry(definition.control)
                .or_insert(definition.animation);
        }
        let mut transforms = AHashMap::new();
        for affordance in &affordances {
            transforms
                .entry(affordance.target)
                .or_insert_with(|| TransformInfo::new(rest_pose(affordance.target)));
        }
        Self {
            affordances,
            animations,
            transforms,
        }
    }

    /// Rebuild every offset from the current control values.
    ///
    /// `value` returns the raw value of a control, or `None` when the
    /// control is not bound this frame.
    pub fn animate(&mut self, mut value: impl FnMut(ControlId) -> Option<f32>) {
        for info in self.transforms.values_mut() {
            info.reset();
        }

        for affordance in &self.affordances {
            let Some(Some(animation)) = self.animations.get(&affordance.control) else {
                continue;
            };
            let Some(raw) = value(affordance.control) else {
                continue;
            };
            if !raw.is_finite() {
                tracing::trace!(target: TARGET, control = ?affordance.control, raw, "ignoring non-finite control value");
                continue;
            }
            let Some(info) = self.transforms.get_mut(&affordance.target) else {
                continue;
            };
            let offset = animation.offset(raw);
            info.position_offset += animation.translate_axes.axis_vector() * offset;
            info.rotation_offset += animation.rotate_axes.axis_vector() * offset;
        }
    }

    #[must_use]
    pub fn transform(&self, target: T) -> Option<&TransformInfo> {
        self.transforms.get(&target)
    }

    /// Animated pose of every target.
    pub fn poses(&self) -> impl Iterator<Item = (T, Pose)> + '_ {
        self.transforms.iter().map(|(&target, info)| (target, info.pose()))
    }
}
