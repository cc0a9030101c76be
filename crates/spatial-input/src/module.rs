#![forbid(unsafe_code)]

//! The host-facing spatial input module.
//!
//! [`SpatialInputModule`] owns one gesture classifier and one scroll
//! projector and is the only surface a host application talks to.
//!
//! # Frame protocol
//!
//! ```text
//! begin_frame(frame) ─▶ callers poll (track_node / gesture_for / perform_*)
//!                    ─▶ update(host) ─▶ FrameReport
//! ```
//!
//! `update` releases abandoned scrolls first, then prunes and classifies
//! gesture records, so nothing pruned in a frame is also processed in it.

#[cfg(feature = "config")]
use std::path::Path;

use spatial_core::{
    CallerId, CardinalAxis, Frame, GestureClassifier, GestureKind, GestureState,
    GestureTransition, HapticPlayer, Node, NodeResolver, Result, ScrollProjector, ScrollRecord,
    ScrollRequest, SpatialConfig, SpatialHintDisplay, SpatialHost, ViewerPose, ViewerScale,
    VisibilityHints,
};
#[cfg(feature = "config")]
use spatial_core::ConfigError;
use web_time::Instant;

/// What happened while closing a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: Frame,
    /// Gesture changes, pruned nodes included, ordered by node.
    pub transitions: Vec<GestureTransition>,
    /// Callers whose scroll was released for lack of polling.
    pub released_scrolls: Vec<CallerId>,
}

impl FrameReport {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.transitions.is_empty() && self.released_scrolls.is_empty()
    }
}

/// Gesture tracking and spatial scrolling behind one command surface.
#[derive(Debug)]
pub struct SpatialInputModule {
    gestures: GestureClassifier,
    scrolls: ScrollProjector,
    frame: Frame,
}

impl SpatialInputModule {
    #[must_use]
    pub fn new(config: SpatialConfig) -> Self {
        let frame = Frame::first(Instant::now());
        let mut module = Self {
            gestures: GestureClassifier::new(config.gesture),
            scrolls: ScrollProjector::new(config.scroll),
            frame,
        };
        module.begin_frame(frame);
        module
    }

    /// Build a module from a TOML configuration file.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        SpatialConfig::from_toml_file(path).map(Self::new)
    }

    /// The frame currently open.
    #[must_use]
    pub fn frame(&self) -> Frame {
        self.frame
    }

    #[must_use]
    pub fn gestures(&self) -> &GestureClassifier {
        &self.gestures
    }

    #[must_use]
    pub fn scrolls(&self) -> &ScrollProjector {
        &self.scrolls
    }

    /// Open `frame` on both subsystems.
    pub fn begin_frame(&mut self, frame: Frame) {
        self.frame = frame;
        self.gestures.begin_frame(frame);
        self.scrolls.begin_frame(frame);
    }

    /// Close the open frame.
    pub fn update<H: SpatialHost + ?Sized>(&mut self, host: &mut H) -> FrameReport {
        let frame = self.frame;
        let _span = tracing::debug_span!("spatial.frame", frame = frame.index).entered();

        let released_scrolls = self.scrolls.tick(frame, host);
        let transitions = self.gestures.tick(frame, host);

        tracing::trace!(
            target: "spatial.module",
            frame = frame.index,
            transitions = transitions.len(),
            released = released_scrolls.len(),
            "frame closed"
        );
        FrameReport {
            frame,
            transitions,
            released_scrolls,
        }
    }

    /// Begin gesture tracking for `node`, or keep it alive this frame.
    pub fn track_node<H: NodeResolver + ?Sized>(
        &mut self,
        caller: CallerId,
        node: Node,
        host: &H,
    ) -> Result<GestureState> {
        self.gestures.track(caller, node, host)
    }

    /// Poll the current gesture of `node`, tracking it if needed.
    pub fn gesture_for<H: NodeResolver + ?Sized>(
        &mut self,
        caller: CallerId,
        node: Node,
        host: &H,
    ) -> Result<GestureKind> {
        self.gestures
            .gesture_for(caller, node, host)
            .map(|state| state.kind)
    }

    /// Re-evaluate `node` immediately instead of waiting for `update`.
    pub fn classify_now<H: HapticPlayer + ?Sized>(
        &mut self,
        node: Node,
        host: &mut H,
    ) -> Result<GestureKind> {
        self.gestures.classify(node, host)
    }

    pub fn perform_scroll<H>(
        &mut self,
        caller: CallerId,
        request: ScrollRequest,
        host: &mut H,
    ) -> Result<&ScrollRecord>
    where
        H: NodeResolver + ViewerScale + VisibilityHints + ?Sized,
    {
        self.scrolls.perform_scroll(caller, request, host)
    }

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
        self.scrolls
            .perform_cardinal_scroll(caller, axis, request, host)
    }

    /// Stop `caller`'s scroll; false when it had none.
    pub fn end_scroll<H>(&mut self, caller: CallerId, host: &mut H) -> bool
    where
        H: VisibilityHints + SpatialHintDisplay + ?Sized,
    {
        self.scrolls.end_scroll(caller, host)
    }
}

impl Default for SpatialInputModule {
    fn default() -> Self {
        Self::new(SpatialConfig::default())
    }
}
