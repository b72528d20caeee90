use std::collections::BTreeMap;

use crate::detection::Detection;
use crate::frame::{FrameDetections, PlayerInfo};
use crate::trajectory::{BallTrajectory, DEFAULT_WINDOW};

/// One matched (track, detection) pair with its match score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub track_id: u32,
    pub detection: usize,
    pub score: f32,
}

/// Track-to-detection assignment strategy.
///
/// `tracks` arrive in creation order and each track and each detection may
/// appear in at most one returned assignment. The default implementation is
/// greedy and locally optimal; a globally-optimal (bipartite) matcher can be
/// dropped in without touching the tracker's contract.
pub trait Association {
    fn assign(&self, tracks: &[(u32, Detection)], detections: &[Detection]) -> Vec<Assignment>;
}

/// Greedy per-track max-IoU matching.
///
/// Tracks are visited in creation order and each takes the best remaining
/// detection above the threshold. Two crossing players can swap identities
/// under this scheme; that is an accepted latency/simplicity trade-off.
#[derive(Debug, Clone)]
pub struct GreedyIou {
    pub iou_threshold: f32,
}

impl GreedyIou {
    pub fn new(iou_threshold: f32) -> Self {
        Self { iou_threshold }
    }
}

impl Association for GreedyIou {
    fn assign(&self, tracks: &[(u32, Detection)], detections: &[Detection]) -> Vec<Assignment> {
        let mut unmatched: Vec<usize> = (0..detections.len()).collect();
        let mut assignments = Vec::new();

        for &(track_id, ref t_det) in tracks {
            if unmatched.is_empty() {
                break;
            }

            let mut best_iou = 0.;
            let mut best_slot = None;

            for (slot, &det_idx) in unmatched.iter().enumerate() {
                let iou = t_det.iou(&detections[det_idx]);
                if iou > best_iou {
                    best_iou = iou;
                    best_slot = Some(slot);
                }
            }

            if best_iou >= self.iou_threshold {
                if let Some(slot) = best_slot {
                    assignments.push(Assignment {
                        track_id,
                        detection: unmatched.remove(slot),
                        score: best_iou,
                    });
                }
            }
        }

        assignments
    }
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub iou_threshold: f32,
    /// A track missing for more than this many consecutive frames is evicted.
    pub max_lost: u32,
    pub trajectory_window: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            max_lost: 15,
            trajectory_window: DEFAULT_WINDOW,
        }
    }
}

/// A persistent player identity with its latest detection.
#[derive(Debug, Clone)]
pub struct TrackedPlayer {
    pub id: u32,
    pub player: PlayerInfo,
    pub lost_frames: u32,
}

/// IoU-based tracker for ball and players across frames.
///
/// Players get persistent track ids; the ball is assumed to be a single
/// object and only contributes to the trajectory window.
pub struct PlayerTracker {
    config: TrackerConfig,
    matcher: Box<dyn Association>,
    next_id: u32,
    // Keyed by id; ids are issued monotonically, so ascending iteration
    // is creation order.
    tracks: BTreeMap<u32, TrackedPlayer>,
    trajectory: BallTrajectory,
}

impl PlayerTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let matcher = GreedyIou::new(config.iou_threshold);
        Self::with_matcher(config, Box::new(matcher))
    }

    pub fn with_matcher(config: TrackerConfig, matcher: Box<dyn Association>) -> Self {
        let trajectory = BallTrajectory::with_capacity(config.trajectory_window);

        Self {
            config,
            matcher,
            next_id: 0,
            tracks: BTreeMap::new(),
            trajectory,
        }
    }

    /// Matches this frame's detections to existing tracks and returns the
    /// frame with track ids assigned. The returned player list contains only
    /// tracks matched in the current frame; a track missing for up to
    /// `max_lost` frames keeps its identity internally and reappears under
    /// the same id when rematched.
    pub fn update(&mut self, mut frame: FrameDetections) -> FrameDetections {
        if let Some(ball) = &frame.ball {
            self.trajectory
                .push(ball.cx(), ball.cy(), frame.frame_number, frame.timestamp);
        }

        let track_boxes: Vec<(u32, Detection)> = self
            .tracks
            .values()
            .map(|t| (t.id, t.player.detection))
            .collect();
        let det_boxes: Vec<Detection> = frame.players.iter().map(|p| p.detection).collect();

        let assignments = self.matcher.assign(&track_boxes, &det_boxes);

        let mut det_matched = vec![false; frame.players.len()];
        let mut hit = vec![false; track_boxes.len()];

        for a in &assignments {
            let Some(track) = self.tracks.get_mut(&a.track_id) else {
                continue;
            };

            let mut player = frame.players[a.detection].clone();
            player.track_id = Some(a.track_id);
            track.player = player;
            track.lost_frames = 0;
            det_matched[a.detection] = true;

            if let Some(pos) = track_boxes.iter().position(|&(id, _)| id == a.track_id) {
                hit[pos] = true;
            }
        }

        for (pos, &(id, _)) in track_boxes.iter().enumerate() {
            if hit[pos] {
                continue;
            }
            if let Some(track) = self.tracks.get_mut(&id) {
                track.lost_frames += 1;
            }
        }

        let max_lost = self.config.max_lost;
        self.tracks.retain(|_, t| t.lost_frames <= max_lost);

        for (det_idx, matched) in det_matched.iter().enumerate() {
            if *matched {
                continue;
            }

            let id = self.next_id;
            self.next_id += 1;

            let mut player = frame.players[det_idx].clone();
            player.track_id = Some(id);
            self.tracks.insert(
                id,
                TrackedPlayer {
                    id,
                    player,
                    lost_frames: 0,
                },
            );
        }

        frame.players = self
            .tracks
            .values()
            .filter(|t| t.lost_frames == 0)
            .map(|t| t.player.clone())
            .collect();

        frame
    }

    #[inline]
    pub fn trajectory(&self) -> &BallTrajectory {
        &self.trajectory
    }

    #[inline]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
