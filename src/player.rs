//! Pure playback state machine.
//!
//! Owns the catalog and the rotation counter; emits effects the async
//! player task applies to the slot pair. No timers, no channels, no I/O,
//! so every transition is testable synchronously.

use rand::Rng;

use crate::catalog::Catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Empty catalog; the fallback asset stays pinned. Terminal.
    Fallback,
    Playing,
    Stopped,
}

/// Outcome of [`PlayerSm::initialize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitEffect {
    /// Pin the fallback asset into the first slot.
    Fallback,
    /// Pin the starting image and begin rotation.
    Initial { index: usize, reference: String },
}

/// A crossfade to `index` via the hidden slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub index: usize,
    pub reference: String,
}

pub struct PlayerSm {
    catalog: Catalog,
    current: usize,
    phase: Phase,
}

impl PlayerSm {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            current: 0,
            phase: Phase::Uninitialized,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Enter `Fallback` or `Playing` depending on the catalog.
    ///
    /// Picks a uniformly random starting image and aligns the rotation
    /// counter with it, so the first advance moves to the image after the
    /// one on screen.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> InitEffect {
        match self.catalog.random_start(rng) {
            None => {
                self.phase = Phase::Fallback;
                InitEffect::Fallback
            }
            Some(index) => {
                self.current = index;
                self.phase = Phase::Playing;
                InitEffect::Initial {
                    index,
                    reference: self.catalog.as_slice()[index].clone(),
                }
            }
        }
    }

    /// Advance-by-index: normalize any signed index and move there.
    ///
    /// Returns `None` before initialization and in the fallback state.
    pub fn show_index(&mut self, raw: i64) -> Option<Advance> {
        if !matches!(self.phase, Phase::Playing | Phase::Stopped) {
            return None;
        }
        let index = self.catalog.normalize(raw)?;
        self.current = index;
        Some(Advance {
            index,
            reference: self.catalog.as_slice()[index].clone(),
        })
    }

    /// One rotation step to `current + 1`, wrapping at the end.
    pub fn step(&mut self) -> Option<Advance> {
        self.show_index(self.current as i64 + 1)
    }

    pub fn stop(&mut self) {
        if self.phase == Phase::Playing {
            self.phase = Phase::Stopped;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == Phase::Stopped {
            self.phase = Phase::Playing;
        }
    }
}
