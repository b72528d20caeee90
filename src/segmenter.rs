use std::collections::{BTreeSet, HashMap};

use log::debug;
use serde_derive::{Deserialize, Serialize};

use crate::classifier::{Action, ActionPrediction};
use crate::frame::{PlayerInfo, Team};

/// A committed, temporally-bounded action. Appended once to the event log
/// and never mutated afterwards. Its action is never `Other`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionEvent {
    pub action_type: Action,
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_time: f32,
    pub end_time: f32,
    pub confidence: f32,
    pub players_involved: Vec<u32>,
    pub team: Team,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Consecutive same-action frames required before a run may commit.
    pub min_stable_frames: u32,
    /// Minimum run duration in seconds.
    pub min_event_duration: f32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_stable_frames: 8,
            min_event_duration: 0.3,
        }
    }
}

const FLUSH_CONFIDENCE: f32 = 0.6;
const FLUSH_DESCRIPTION: &str = "Last event (flush)";

/// Debounces per-frame predictions into discrete events.
///
/// A run of consecutive equal actions commits when a differing prediction
/// arrives, provided the run was stable long enough, lasted long enough,
/// and is not `Other`. The committed event carries the confidence and
/// description of the incoming prediction that ended the run, not the
/// run's own.
pub struct EventSegmenter {
    config: SegmenterConfig,
    events: Vec<ActionEvent>,
    current: Action,
    start_frame: u64,
    start_time: f32,
    stable_count: u32,
    run_players: BTreeSet<u32>,
    run_team_votes: HashMap<Team, u32>,
}

impl EventSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self {
            config,
            events: Vec::new(),
            current: Action::Other,
            start_frame: 0,
            start_time: 0.,
            stable_count: 0,
            run_players: BTreeSet::new(),
            run_team_votes: HashMap::new(),
        }
    }

    /// Feeds one per-frame prediction along with the players visible on
    /// that frame.
    pub fn update(
        &mut self,
        prediction: &ActionPrediction,
        frame_number: u64,
        timestamp: f32,
        players: &[PlayerInfo],
    ) {
        if prediction.action == self.current {
            self.stable_count += 1;
        } else {
            if self.stable_count >= self.config.min_stable_frames {
                let duration = timestamp - self.start_time;
                if duration >= self.config.min_event_duration && self.current != Action::Other {
                    self.commit(
                        frame_number,
                        timestamp,
                        prediction.confidence,
                        prediction.description.clone(),
                    );
                }
            }

            self.current = prediction.action;
            self.start_frame = frame_number;
            self.start_time = timestamp;
            self.stable_count = 1;
            self.run_players.clear();
            self.run_team_votes.clear();
        }

        for p in players {
            if let Some(id) = p.track_id {
                self.run_players.insert(id);
            }
            if p.team != Team::Unknown {
                *self.run_team_votes.entry(p.team).or_insert(0) += 1;
            }
        }
    }

    /// Commits the trailing open run, if any. Called exactly once at the
    /// end of the frame stream.
    pub fn flush(&mut self, final_frame: u64, final_time: f32) {
        if self.stable_count >= self.config.min_stable_frames && self.current != Action::Other {
            self.commit(
                final_frame,
                final_time,
                FLUSH_CONFIDENCE,
                FLUSH_DESCRIPTION.to_string(),
            );
        }
    }

    fn commit(&mut self, end_frame: u64, end_time: f32, confidence: f32, description: String) {
        let team = self.majority_team();
        let event = ActionEvent {
            action_type: self.current,
            start_frame: self.start_frame,
            end_frame,
            start_time: self.start_time,
            end_time,
            confidence,
            players_involved: self.run_players.iter().copied().collect(),
            team,
            description,
        };

        debug!(
            "committed {} event: frames {}..{} ({:.2}s..{:.2}s)",
            event.action_type, event.start_frame, event.end_frame, event.start_time, event.end_time
        );

        self.events.push(event);
    }

    fn majority_team(&self) -> Team {
        let a = self.run_team_votes.get(&Team::TeamA).copied().unwrap_or(0);
        let b = self.run_team_votes.get(&Team::TeamB).copied().unwrap_or(0);

        if a > b {
            Team::TeamA
        } else if b > a {
            Team::TeamB
        } else {
            Team::Unknown
        }
    }

    #[inline]
    pub fn events(&self) -> &[ActionEvent] {
        &self.events
    }

    #[inline]
    pub fn into_events(self) -> Vec<ActionEvent> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Detection, ObjectClass};
    use approx::assert_relative_eq;

    const FPS: f32 = 30.;

    fn pred(action: Action, confidence: f32) -> ActionPrediction {
        ActionPrediction {
            action,
            confidence,
            description: format!("{action} prediction"),
        }
    }

    fn player(id: u32, team: Team) -> PlayerInfo {
        let det = Detection::new(0., 0., 40., 80., 0.9, ObjectClass::Player);
        let mut p = PlayerInfo::new(det, "red");
        p.track_id = Some(id);
        p.team = team;
        p
    }

    fn feed(seg: &mut EventSegmenter, action: Action, conf: f32, frames: std::ops::Range<u64>) {
        for n in frames {
            seg.update(&pred(action, conf), n, n as f32 / FPS, &[]);
        }
    }

    #[test]
    fn stable_run_commits_on_transition() {
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        feed(&mut seg, Action::Serve, 0.82, 0..12);
        assert!(seg.events().is_empty());

        seg.update(&pred(Action::Other, 0.5), 12, 12. / FPS, &[]);

        let events = seg.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action_type, Action::Serve);
        assert_eq!(events[0].start_frame, 0);
        assert_eq!(events[0].end_frame, 12);
        assert_relative_eq!(events[0].end_time, 0.4);
    }

    #[test]
    fn committed_event_uses_incoming_confidence() {
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        feed(&mut seg, Action::Attack, 0.85, 0..15);
        seg.update(&pred(Action::Dig, 0.76), 15, 0.5, &[]);

        assert_relative_eq!(seg.events()[0].confidence, 0.76);
    }

    #[test]
    fn short_run_does_not_commit() {
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        feed(&mut seg, Action::Serve, 0.82, 0..5);
        seg.update(&pred(Action::Other, 0.5), 5, 5. / FPS, &[]);

        assert!(seg.events().is_empty());
    }

    #[test]
    fn short_duration_does_not_commit() {
        // 9 stable frames but at 60 fps the run lasts only 0.15s.
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        for n in 0..9u64 {
            seg.update(&pred(Action::Serve, 0.82), n, n as f32 / 60., &[]);
        }
        seg.update(&pred(Action::Other, 0.5), 9, 9. / 60., &[]);

        assert!(seg.events().is_empty());
    }

    #[test]
    fn other_runs_never_commit() {
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        feed(&mut seg, Action::Other, 0.5, 0..60);
        seg.update(&pred(Action::Serve, 0.82), 60, 2., &[]);
        seg.flush(61, 61. / FPS);

        // The long OTHER run is dropped; the 1-frame serve run is too short.
        assert!(seg.events().is_empty());
    }

    #[test]
    fn flush_commits_trailing_run_with_fixed_confidence() {
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        feed(&mut seg, Action::Set, 0.74, 0..20);
        seg.flush(20, 20. / FPS);

        let events = seg.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action_type, Action::Set);
        assert_relative_eq!(events[0].confidence, 0.6);
        assert_eq!(events[0].description, "Last event (flush)");
    }

    #[test]
    fn flush_commits_at_most_one_event() {
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        feed(&mut seg, Action::Serve, 0.82, 0..12);
        seg.update(&pred(Action::Pass, 0.65), 12, 0.4, &[]);
        feed(&mut seg, Action::Pass, 0.65, 13..24);
        seg.flush(24, 0.8);

        assert_eq!(seg.events().len(), 2);
    }

    #[test]
    fn run_accumulates_players_and_majority_team() {
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        let players = vec![
            player(3, Team::TeamA),
            player(7, Team::TeamA),
            player(9, Team::TeamB),
        ];

        for n in 0..12u64 {
            seg.update(&pred(Action::Attack, 0.85), n, n as f32 / FPS, &players);
        }
        seg.update(&pred(Action::Other, 0.5), 12, 0.4, &[]);

        let event = &seg.events()[0];
        assert_eq!(event.players_involved, vec![3, 7, 9]);
        assert_eq!(event.team, Team::TeamA);
    }

    #[test]
    fn player_context_resets_between_runs() {
        let mut seg = EventSegmenter::new(SegmenterConfig::default());

        let first = vec![player(1, Team::TeamA)];
        for n in 0..12u64 {
            seg.update(&pred(Action::Serve, 0.82), n, n as f32 / FPS, &first);
        }

        let second = vec![player(2, Team::TeamB)];
        for n in 12..24u64 {
            seg.update(&pred(Action::Dig, 0.76), n, n as f32 / FPS, &second);
        }
        seg.flush(24, 0.8);

        let events = seg.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].players_involved, vec![1]);
        assert_eq!(events[1].players_involved, vec![2]);
        assert_eq!(events[1].team, Team::TeamB);
    }
}
