#![forbid(unsafe_code)]

//! Recording collaborator host for tests.
//!
//! [`RecordingHost`] implements every collaborator trait, owns one
//! [`DetachablePose`] per registered node, and records every outbound call
//! so tests can assert on side effects.

use std::cell::Cell;
use std::rc::Rc;

use ahash::AHashMap;
use glam::Vec3;
use web_time::Duration;

use crate::host::{
    CallerId, HapticPlayer, HapticPulse, Node, NodeResolver, Pose, PoseHandle, PoseSource,
    RayVisibility, SpatialHintDisplay, SpatialHintState, ViewerPose, ViewerScale, VisibilityHints,
};
use crate::math::from_euler_degrees;

/// Pose cell whose transform can disappear mid-session.
#[derive(Debug, Clone)]
pub struct DetachablePose(Rc<Cell<Option<Pose>>>);

impl DetachablePose {
    #[must_use]
    pub fn new(pose: Pose) -> Self {
        Self(Rc::new(Cell::new(Some(pose))))
    }

    /// Edit the pose in place; no-op once detached.
    pub fn update(&self, edit: impl FnOnce(&mut Pose)) {
        if let Some(mut pose) = self.0.get() {
            edit(&mut pose);
            self.0.set(Some(pose));
        }
    }

    pub fn detach(&self) {
        self.0.set(None);
    }
}

impl PoseSource for DetachablePose {
    fn pose(&self) -> Option<Pose> {
        self.0.get()
    }
}

/// One outbound collaborator call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostCall {
    AddHint {
        owner: CallerId,
        visible: RayVisibility,
        priority: i32,
    },
    RemoveHint {
        owner: CallerId,
    },
    HintState(SpatialHintState),
    Pulse {
        node: Node,
        intensity: f32,
        duration: Duration,
    },
}

#[derive(Debug)]
pub struct RecordingHost {
    poses: AHashMap<Node, DetachablePose>,
    pub scale: f32,
    pub head: Vec3,
    calls: Vec<HostCall>,
}

impl RecordingHost {
    /// Host with viewer scale 1 and the head at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poses: AHashMap::new(),
            scale: 1.0,
            head: Vec3::ZERO,
            calls: Vec::new(),
        }
    }

    /// Register `node` with an initial pose.
    pub fn with_node(mut self, node: Node, pose: Pose) -> Self {
        self.poses.insert(node, DetachablePose::new(pose));
        self
    }

    pub fn set_position(&self, node: Node, position: Vec3) {
        if let Some(pose) = self.poses.get(&node) {
            pose.update(|pose| pose.position = position);
        }
    }

    pub fn set_rotation_degrees(&self, node: Node, degrees: Vec3) {
        if let Some(pose) = self.poses.get(&node) {
            pose.update(|pose| pose.rotation = from_euler_degrees(degrees));
        }
    }

    /// Make `node`'s pose source report no pose, as if its transform was destroyed.
    pub fn detach(&self, node: Node) {
        if let Some(pose) = self.poses.get(&node) {
            pose.detach();
        }
    }

    #[must_use]
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Pulses played so far, in order.
    #[must_use]
    pub fn pulses(&self) -> Vec<(Node, f32)> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                HostCall::Pulse {
                    node, intensity, ..
                } => Some((node, intensity)),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeResolver for RecordingHost {
    fn resolve(&self, node: Node) -> Option<PoseHandle> {
        self.poses
            .get(&node)
            .map(|pose| Rc::new(pose.clone()) as PoseHandle)
    }
}

impl ViewerScale for RecordingHost {
    fn viewer_scale(&self) -> f32 {
        self.scale
    }
}

impl ViewerPose for RecordingHost {
    fn head_position(&self) -> Vec3 {
        self.head
    }
}

impl VisibilityHints for RecordingHost {
    fn add_visibility_hint(
        &mut self,
        _source: &PoseHandle,
        owner: CallerId,
        visible: RayVisibility,
        priority: i32,
    ) {
        self.calls.push(HostCall::AddHint {
            owner,
            visible,
            priority,
        });
    }

    fn remove_visibility_hint(&mut self, _source: &PoseHandle, owner: CallerId) {
        self.calls.push(HostCall::RemoveHint { owner });
    }
}

impl SpatialHintDisplay for RecordingHost {
    fn set_spatial_hint_state(&mut self, state: SpatialHintState) {
        self.calls.push(HostCall::HintState(state));
    }
}

impl HapticPlayer for RecordingHost {
    fn play_pulse(&mut self, node: Node, _pulse: &HapticPulse, intensity: f32, duration: Duration) {
        self.calls.push(HostCall::Pulse {
            node,
            intensity,
            duration,
        });
    }
}
