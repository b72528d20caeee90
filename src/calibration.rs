use std::collections::HashMap;

use log::info;

use crate::frame::Team;

pub const UNKNOWN_COLOR: &str = "unknown";

/// Jersey-color → team assignment, built from color frequencies observed
/// during the calibration window and frozen once finalized.
#[derive(Debug, Clone, Default)]
pub struct TeamCalibration {
    counts: HashMap<String, u32>,
    assignments: HashMap<String, Team>,
    finalized: bool,
}

impl TeamCalibration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one jersey-color observation. Unknown labels are excluded;
    /// observations after finalization are ignored.
    pub fn observe(&mut self, color: &str) {
        if self.finalized || color == UNKNOWN_COLOR {
            return;
        }

        *self.counts.entry(color.to_string()).or_insert(0) += 1;
    }

    /// Assigns the most frequent color to team A and the second most
    /// frequent to team B, then freezes the mapping. Colors outside the top
    /// two stay unknown. Idempotent: only the first call assigns.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let mut ranked: Vec<(&String, &u32)> = self.counts.iter().collect();
        // Count descending, color name ascending for a deterministic order.
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        let mut ranked = ranked.into_iter();
        if let Some((color, _)) = ranked.next() {
            self.assignments.insert(color.clone(), Team::TeamA);
        }
        if let Some((color, _)) = ranked.next() {
            self.assignments.insert(color.clone(), Team::TeamB);
        }

        info!(
            "team calibration: team_a={} team_b={}",
            self.color_of(Team::TeamA).unwrap_or(UNKNOWN_COLOR),
            self.color_of(Team::TeamB).unwrap_or(UNKNOWN_COLOR),
        );
    }

    /// Team for a jersey color. `Unknown` before finalization and for any
    /// unassigned color.
    pub fn team_for(&self, color: &str) -> Team {
        self.assignments.get(color).copied().unwrap_or(Team::Unknown)
    }

    /// The color assigned to a team, if any.
    pub fn color_of(&self, team: Team) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(_, t)| **t == team)
            .map(|(c, _)| c.as_str())
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}
