#![forbid(unsafe_code)]

//! Spatial Core
//!
//! Per-frame spatial gesture classification and scroll projection for
//! tracked input nodes (hands, controllers).
//!
//! # Key Components
//!
//! - [`GestureClassifier`] - Per-node hysteresis classifier (translation,
//!   single-axis rotation, free rotation)
//! - [`ScrollProjector`] - Turns drags into repeating scroll progress, with
//!   a cardinally constrained, reversal-aware variant
//! - [`RotationVelocityTracker`] - Angular speed estimate driving haptic intensity
//! - [`AffordanceAnimator`] - Maps raw control values onto device model offsets
//! - [`host`] - Collaborator traits the engine consumes
//! - [`SpatialConfig`] - Tunable thresholds, loadable from TOML/JSON with
//!   the `config` feature
//!
//! # Driving the engine
//!
//! The engine is single-threaded and tick-driven. Per frame the host opens
//! the frame on each subsystem, lets callers poll (`track`, `perform_scroll`,
//! ...), and finally closes the frame with `tick`, which prunes records
//! nobody polled for two frames before classifying the rest.
//!
//! # Logging
//!
//! Events are emitted through `tracing` under the `spatial.gesture`,
//! `spatial.scroll` and `spatial.affordance` targets. The crate never
//! installs a subscriber.

pub mod affordance;
pub mod config;
pub mod error;
pub mod frame;
pub mod gesture;
pub mod host;
pub mod math;
pub mod scroll;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod velocity;

pub use affordance::{
    Affordance, AffordanceAnimator, AffordanceDefinition, AnimationDefinition, AxisFlags,
    ControlId, TransformInfo,
};
pub use config::{ConfigError, GestureConfig, ScrollConfig, SpatialConfig, VelocityConfig};
pub use error::{Result, SpatialError};
pub use frame::{Frame, PollStamp};
pub use gesture::{
    GestureClassifier, GestureKind, GestureState, GestureTransition, NodeGestureRecord,
};
pub use host::{
    CallerId, HapticPlayer, HapticPulse, Node, NodeResolver, Pose, PoseHandle, PoseSource,
    RayVisibility, SharedPose, SpatialHintDisplay, SpatialHintState, SpatialHost, ViewerPose,
    ViewerScale, VisibilityHints,
};
pub use scroll::{CardinalAxis, CardinalState, ScrollProjector, ScrollRecord, ScrollRequest};
pub use velocity::RotationVelocityTracker;

pub use glam;
