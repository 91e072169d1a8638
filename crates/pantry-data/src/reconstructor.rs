//! Door cycle reconstruction.
//!
//! Pairs `open` and `closed` door readings on the merged record timeline
//! into [`Cycle`]s and attaches the mass change across each one, borrowing
//! the nearest reading outside a boundary when the boundary record itself
//! carries no mass.

use chrono::TimeDelta;
use pantry_core::models::{Cycle, DoorState, SampleTime, TimelineEntry};
use tracing::debug;

// ── Options ───────────────────────────────────────────────────────────────────

/// Tuning knobs for [`CycleReconstructor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructOptions {
    /// Maximum distance between a boundary and a reading borrowed for it.
    /// `None` searches the whole timeline.
    pub fallback_window: Option<TimeDelta>,
}

// ── Scan state ────────────────────────────────────────────────────────────────

/// State threaded through the left-to-right scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    NoPendingOpen,
    /// A door opening waiting for its close. Repeated opens refresh the mass
    /// but keep the first timestamp.
    PendingOpen {
        timestamp: SampleTime,
        mass_kg: Option<f64>,
    },
}

impl ScanState {
    /// Advance on one door reading. Returns the next state and, when the
    /// reading closes a pending open, the `(open timestamp, open mass)` pair
    /// it completes.
    pub fn step(
        self,
        door: DoorState,
        timestamp: &SampleTime,
        mass_kg: Option<f64>,
    ) -> (ScanState, Option<(SampleTime, Option<f64>)>) {
        match (self, door) {
            (ScanState::NoPendingOpen, DoorState::Open) => (
                ScanState::PendingOpen {
                    timestamp: timestamp.clone(),
                    mass_kg,
                },
                None,
            ),
            (
                ScanState::PendingOpen {
                    timestamp: open_ts,
                    mass_kg: open_mass,
                },
                DoorState::Open,
            ) => (
                ScanState::PendingOpen {
                    timestamp: open_ts,
                    mass_kg: mass_kg.or(open_mass),
                },
                None,
            ),
            (
                ScanState::PendingOpen {
                    timestamp: open_ts,
                    mass_kg: open_mass,
                },
                DoorState::Closed,
            ) => (ScanState::NoPendingOpen, Some((open_ts, open_mass))),
            (ScanState::NoPendingOpen, DoorState::Closed) => (ScanState::NoPendingOpen, None),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ScanState::PendingOpen { .. })
    }
}

// ── Reconstruction ────────────────────────────────────────────────────────────

/// Output of one reconstruction run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    /// Completed cycles, oldest first.
    pub cycles: Vec<Cycle>,
    /// `closed` readings seen with no pending open.
    pub unmatched_closes: usize,
    /// Whether an open was still pending when the timeline ended.
    pub discarded_open: bool,
}

// ── CycleReconstructor ────────────────────────────────────────────────────────

/// Single-pass open→close pairing over a time-ordered timeline.
pub struct CycleReconstructor {
    options: ReconstructOptions,
}

impl Default for CycleReconstructor {
    fn default() -> Self {
        Self::new(ReconstructOptions::default())
    }
}

impl CycleReconstructor {
    pub fn new(options: ReconstructOptions) -> Self {
        Self { options }
    }

    /// Scan `timeline` (as produced by
    /// [`SampleNormalizer::timeline`](crate::normalizer::SampleNormalizer::timeline))
    /// and emit every completed cycle.
    ///
    /// * At most one open is pending at a time; repeated opens coalesce.
    /// * A close with nothing pending is dropped.
    /// * An open still pending at the end is dropped.
    /// * A missing open mass is taken from the nearest earlier record that has
    ///   one, searching backwards from the close record; a missing close mass
    ///   from the nearest later record.
    pub fn reconstruct(&self, timeline: &[TimelineEntry]) -> Reconstruction {
        let mut result = Reconstruction::default();
        let mut state = ScanState::NoPendingOpen;

        for (index, entry) in timeline.iter().enumerate() {
            let Some(door) = entry.door else { continue };

            let (next, completed) = state.step(door, &entry.timestamp, entry.mass_kg);
            state = next;

            match completed {
                Some((open_ts, open_mass)) => {
                    let cycle = self.close_cycle(timeline, index, open_ts, open_mass);
                    result.cycles.push(cycle);
                }
                None if door == DoorState::Closed => result.unmatched_closes += 1,
                None => {}
            }
        }

        result.discarded_open = state.is_pending();

        debug!(
            "CycleReconstructor: {} cycles from {} timeline entries ({} unmatched closes, open pending at end: {})",
            result.cycles.len(),
            timeline.len(),
            result.unmatched_closes,
            result.discarded_open
        );

        result
    }

    fn close_cycle(
        &self,
        timeline: &[TimelineEntry],
        close_index: usize,
        open_timestamp: SampleTime,
        open_mass: Option<f64>,
    ) -> Cycle {
        let close = &timeline[close_index];

        let open_mass = open_mass
            .or_else(|| self.nearest_mass_before(timeline, close_index, &open_timestamp));
        let close_mass = close
            .mass_kg
            .or_else(|| self.nearest_mass_after(timeline, close_index, &close.timestamp));

        Cycle::new(open_timestamp, open_mass, close.timestamp.clone(), close_mass)
    }

    /// Nearest mass strictly before `index`, within the window of `anchor`.
    fn nearest_mass_before(
        &self,
        timeline: &[TimelineEntry],
        index: usize,
        anchor: &SampleTime,
    ) -> Option<f64> {
        timeline[..index]
            .iter()
            .rev()
            .filter(|e| self.within_window(anchor, &e.timestamp))
            .find_map(|e| e.mass_kg)
    }

    /// Nearest mass strictly after `index`, within the window of `anchor`.
    fn nearest_mass_after(
        &self,
        timeline: &[TimelineEntry],
        index: usize,
        anchor: &SampleTime,
    ) -> Option<f64> {
        timeline[index + 1..]
            .iter()
            .filter(|e| self.within_window(anchor, &e.timestamp))
            .find_map(|e| e.mass_kg)
    }

    fn within_window(&self, anchor: &SampleTime, candidate: &SampleTime) -> bool {
        let Some(window) = self.options.fallback_window else {
            return true;
        };
        match (anchor.instant, candidate.instant) {
            (Some(a), Some(c)) => (c - a).abs() <= window,
            _ => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
