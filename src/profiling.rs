//! Step Diagnostics
//!
//! Lightweight per-step counters collected while stepping. Counts are
//! deterministic quantities (entities processed), not wall-clock timings, so
//! they are stable across runs and usable in tests.

/// Counters for the most recent `step` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Islands built and solved
    pub islands: u32,
    /// Bodies that were members of any island (static bodies may be counted
    /// once per island)
    pub island_bodies: u32,
    /// Contacts solved inside islands
    pub island_contacts: u32,
    /// Joints solved inside islands
    pub island_joints: u32,
    /// Bodies processed by the time-of-impact sweep
    pub toi_candidates: u32,
    /// Time-of-impact events that produced a position correction
    pub toi_hits: u32,
    /// Live contacts after the collide pass
    pub contacts_updated: u32,
}

impl StepStats {
    /// Reset all counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_zeroes_counters() {
        let mut stats = StepStats {
            islands: 3,
            island_bodies: 10,
            toi_hits: 2,
            ..Default::default()
        };
        stats.reset();
        assert_eq!(stats, StepStats::default());
    }
}
