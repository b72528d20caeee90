use serde_derive::{Deserialize, Serialize};

use crate::detection::Detection;

/// Side of the court a player belongs to, resolved from jersey color once
/// team calibration has finalized. `Unknown` before that, and for any
/// color outside the two calibrated ones.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    TeamA,
    TeamB,
    Unknown,
}

/// A player box as delivered by the detection collaborator, enriched with
/// a persistent identity by the tracker.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub detection: Detection,
    pub team: Team,
    pub jersey_color: String,
    pub jersey_number: Option<String>,
    pub track_id: Option<u32>,
}

impl PlayerInfo {
    pub fn new(detection: Detection, jersey_color: impl Into<String>) -> Self {
        Self {
            detection,
            team: Team::Unknown,
            jersey_color: jersey_color.into(),
            jersey_number: None,
            track_id: None,
        }
    }
}

/// Everything the external detector produced for one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameDetections {
    pub frame_number: u64,
    pub timestamp: f32, // in seconds
    pub ball: Option<Detection>,
    pub players: Vec<PlayerInfo>,
}

impl FrameDetections {
    pub fn new(frame_number: u64, timestamp: f32) -> Self {
        Self {
            frame_number,
            timestamp,
            ball: None,
            players: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.players.iter()
    }
}
