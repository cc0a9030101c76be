#![forbid(unsafe_code)]

//! Spatial input public facade crate.
//!
//! This crate provides the surface a host application uses: the
//! [`SpatialInputModule`] command surface plus re-exports of the engine
//! types it speaks in, and a prelude for day-to-day usage.

mod module;

pub use module::{FrameReport, SpatialInputModule};

// --- Engine re-exports -----------------------------------------------------

pub use spatial_core::{
    CardinalAxis, CardinalState, GestureKind, GestureState, GestureTransition, ScrollRecord,
    ScrollRequest,
};

// --- Collaborator re-exports -----------------------------------------------

pub use spatial_core::host::{
    CallerId, HapticPlayer, HapticPulse, Node, NodeResolver, Pose, PoseHandle, PoseSource,
    RayVisibility, SharedPose, SpatialHintDisplay, SpatialHintState, SpatialHost, ViewerPose,
    ViewerScale, VisibilityHints,
};

// --- Config, errors, time --------------------------------------------------

pub use spatial_core::{
    ConfigError, Frame, GestureConfig, Result, ScrollConfig, SpatialConfig, SpatialError,
    VelocityConfig,
};

pub use spatial_core::glam;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        CallerId, CardinalAxis, Frame, FrameReport, GestureKind, Node, Pose, Result,
        ScrollRequest, SpatialConfig, SpatialError, SpatialHost, SpatialInputModule,
    };

    pub use spatial_core as engine;
}
