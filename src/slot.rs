//! Two-slot crossfade buffer.
//!
//! The engine only toggles a visibility marker on two overlapping render
//! targets; the actual fade is presentation styling outside this crate.

use tracing::{debug, info};

/// Identifies one of the two render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    First,
    Second,
}

impl SlotId {
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }
}

/// A display element the slideshow renders into.
pub trait RenderTarget {
    /// Point the target at a new image reference.
    fn set_source(&mut self, reference: &str);
    /// Update the accessible label shown alongside the image.
    fn set_label(&mut self, label: &str);
    /// Toggle the visibility marker driving the crossfade.
    fn set_visible(&mut self, visible: bool);
}

/// Owns the two render targets and the active-slot flag.
///
/// Invariant: after any `show` or `pin_first`, exactly one target carries
/// the visibility marker.
pub struct SlotPair<T: RenderTarget> {
    first: T,
    second: T,
    active: SlotId,
}

impl<T: RenderTarget> SlotPair<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            first,
            second,
            active: SlotId::First,
        }
    }

    /// Which slot currently carries the visibility marker.
    #[must_use]
    pub const fn active(&self) -> SlotId {
        self.active
    }

    fn target_mut(&mut self, id: SlotId) -> &mut T {
        match id {
            SlotId::First => &mut self.first,
            SlotId::Second => &mut self.second,
        }
    }

    /// Load `reference` into the hidden slot, then swap visibility so the
    /// two slots trade roles. Returns the slot that is now visible.
    pub fn show(&mut self, reference: &str, label: &str) -> SlotId {
        let incoming = self.active.other();
        let outgoing = self.active;
        {
            let target = self.target_mut(incoming);
            target.set_source(reference);
            target.set_label(label);
            target.set_visible(true);
        }
        self.target_mut(outgoing).set_visible(false);
        self.active = incoming;
        incoming
    }

    /// Pin `reference` into the first slot without a swap. Used for the
    /// initial frame and for the empty-catalog fallback.
    pub fn pin_first(&mut self, reference: &str, label: &str) {
        self.first.set_source(reference);
        self.first.set_label(label);
        self.first.set_visible(true);
        self.second.set_visible(false);
        self.active = SlotId::First;
    }
}

/// Render target that reports every transition through `tracing`.
///
/// Stands in for an on-screen element when the engine runs headless.
#[derive(Debug)]
pub struct LogTarget {
    name: &'static str,
    source: Option<String>,
    visible: bool,
}

impl LogTarget {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            source: None,
            visible: false,
        }
    }
}

impl RenderTarget for LogTarget {
    fn set_source(&mut self, reference: &str) {
        debug!(slot = self.name, reference, "source set");
        self.source = Some(reference.to_string());
    }

    fn set_label(&mut self, label: &str) {
        debug!(slot = self.name, label, "label set");
    }

    fn set_visible(&mut self, visible: bool) {
        if visible && !self.visible
            && let Some(source) = &self.source
        {
            info!(slot = self.name, source = %source, "displaying");
        }
        self.visible = visible;
    }
}
