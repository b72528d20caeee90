use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::frame::PlayerInfo;
use crate::trajectory::BallTrajectory;

/// Volleyball action categories. Closed set so the classifier cascade and
/// the segmenter stay exhaustively checkable.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Serve,
    Pass,
    Set,
    Attack,
    Block,
    Dig,
    Other,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Serve => "serve",
            Action::Pass => "pass",
            Action::Set => "set",
            Action::Attack => "attack",
            Action::Block => "block",
            Action::Dig => "dig",
            Action::Other => "other",
        };
        f.write_str(s)
    }
}

/// Per-frame classification output. Produced fresh every processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPrediction {
    pub action: Action,
    pub confidence: f32,
    pub description: String,
}

impl ActionPrediction {
    fn new(action: Action, confidence: f32, description: impl Into<String>) -> Self {
        Self {
            action,
            confidence,
            description: description.into(),
        }
    }
}

/// Rule thresholds over normalized [0,1] ball coordinates and px/frame
/// speeds. Named so the cascade stays tunable without touching code.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Normalized x of the net (center of frame).
    pub net_x: f32,
    /// Band width at both court ends counting as "near the back line".
    pub back_line_x: f32,
    pub fast_speed: f32,
    pub slow_speed: f32,
    /// Minimum |horizontal direction component| for a serve.
    pub serve_direction: f32,
    /// Minimum downward direction component for an attack.
    pub attack_descent: f32,
    /// Net-distance band for an attack.
    pub attack_net_band: f32,
    /// Maximum normalized y for an attack.
    pub attack_max_y: f32,
    /// Net-distance band for a block.
    pub block_net_band: f32,
    /// Height trend below which a rebound counts as a block.
    pub block_rebound: f32,
    /// A detection whose top edge is above this frame-height fraction
    /// counts as arms raised. Fixed fraction regardless of camera framing.
    pub arms_up_y: f32,
    pub set_rise: f32,
    pub dig_low_y: f32,
    pub dig_rise: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            net_x: 0.48,
            back_line_x: 0.15,
            fast_speed: 12.0,
            slow_speed: 4.0,
            serve_direction: 0.7,
            attack_descent: 0.4,
            attack_net_band: 0.25,
            attack_max_y: 0.55,
            block_net_band: 0.2,
            block_rebound: -3.0,
            arms_up_y: 0.4,
            set_rise: -1.5,
            dig_low_y: 0.75,
            dig_rise: -2.0,
        }
    }
}

const CONF_SERVE: f32 = 0.82;
const CONF_ATTACK: f32 = 0.85;
const CONF_BLOCK: f32 = 0.78;
const CONF_SET: f32 = 0.74;
const CONF_DIG: f32 = 0.76;
const CONF_PASS: f32 = 0.65;
const CONF_OTHER: f32 = 0.5;

/// Rule-based action classifier over the ball trajectory and current
/// player positions. Stateless per call: identical inputs always yield the
/// identical prediction for a fixed frame size.
pub struct ActionClassifier {
    frame_width: f32,
    frame_height: f32,
    thresholds: Thresholds,
}

impl ActionClassifier {
    pub fn new(frame_width: u32, frame_height: u32, thresholds: Thresholds) -> Self {
        Self {
            frame_width: frame_width.max(1) as f32,
            frame_height: frame_height.max(1) as f32,
            thresholds,
        }
    }

    /// Evaluates the rule cascade in fixed priority order; the first
    /// matching rule wins.
    pub fn classify(
        &self,
        trajectory: &BallTrajectory,
        players: &[PlayerInfo],
        _frame_number: u64,
    ) -> ActionPrediction {
        let Some(ball_pos) = trajectory.last_position() else {
            return ActionPrediction::new(Action::Other, 0.0, "No ball detected");
        };

        let t = &self.thresholds;
        let bx = ball_pos.x / self.frame_width;
        let by = ball_pos.y / self.frame_height;

        let speed = trajectory.speed();
        let h_trend = trajectory.height_trend();
        let dir = trajectory.direction();

        let players_arms_up = players
            .iter()
            .filter(|p| p.detection.y1 / self.frame_height < t.arms_up_y)
            .count();

        // SERVE: ball near the back line, fast, horizontal trajectory.
        if (bx < t.back_line_x || bx > 1. - t.back_line_x)
            && speed > t.fast_speed
            && dir.x.abs() > t.serve_direction
        {
            return ActionPrediction::new(
                Action::Serve,
                CONF_SERVE,
                format!("Ball near back line ({bx:.2}), speed={speed:.1}px/f, horizontal"),
            );
        }

        // ATTACK: fast downward ball near the net.
        if speed > t.fast_speed
            && dir.y > t.attack_descent
            && (bx - t.net_x).abs() < t.attack_net_band
            && by < t.attack_max_y
        {
            return ActionPrediction::new(
                Action::Attack,
                CONF_ATTACK,
                format!(
                    "Fast downward ball near net, speed={speed:.1}, dy={:.2}",
                    dir.y
                ),
            );
        }

        // BLOCK: sharp upward rebound near the net with arms raised.
        if h_trend < t.block_rebound && (bx - t.net_x).abs() < t.block_net_band && players_arms_up >= 1
        {
            return ActionPrediction::new(
                Action::Block,
                CONF_BLOCK,
                format!("Ball rebounding upward near net, h_trend={h_trend:.2}"),
            );
        }

        // SET: slow upward ball, mid-court.
        if speed < t.slow_speed
            && h_trend < t.set_rise
            && bx > t.back_line_x
            && bx < 1. - t.back_line_x
        {
            return ActionPrediction::new(
                Action::Set,
                CONF_SET,
                format!("Slow upward arc, speed={speed:.1}, h_trend={h_trend:.2}"),
            );
        }

        // DIG: ball very low, rising from the floor area.
        if by > t.dig_low_y && h_trend < t.dig_rise {
            return ActionPrediction::new(
                Action::Dig,
                CONF_DIG,
                format!("Ball low ({by:.2}), rising from floor area"),
            );
        }

        // PASS: moderate speed, upward, no special context.
        if speed > t.slow_speed && speed < t.fast_speed && h_trend < 0. {
            return ActionPrediction::new(
                Action::Pass,
                CONF_PASS,
                format!("Moderate upward ball, speed={speed:.1}"),
            );
        }

        ActionPrediction::new(
            Action::Other,
            CONF_OTHER,
            format!("No clear pattern. speed={speed:.1}, h_trend={h_trend:.2}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Detection, ObjectClass};
    use approx::assert_relative_eq;

    const FW: u32 = 1920;
    const FH: u32 = 1080;

    fn classifier() -> ActionClassifier {
        ActionClassifier::new(FW, FH, Thresholds::default())
    }

    fn trajectory(points: &[(f32, f32)]) -> BallTrajectory {
        let mut t = BallTrajectory::default();
        for (i, &(x, y)) in points.iter().enumerate() {
            t.push(x, y, i as u64, i as f32 / 30.);
        }
        t
    }

    fn player_at(y1: f32) -> PlayerInfo {
        let det = Detection::new(900., y1, 960., y1 + 180., 0.9, ObjectClass::Player);
        PlayerInfo::new(det, "red")
    }

    #[test]
    fn empty_trajectory_is_other_with_zero_confidence() {
        let pred = classifier().classify(&BallTrajectory::default(), &[], 0);
        assert_eq!(pred.action, Action::Other);
        assert_eq!(pred.confidence, 0.0);
    }

    #[test]
    fn serve_near_back_line() {
        // Ball in the left back band (x/1920 = 0.05) moving horizontally
        // at 15 px/frame.
        let pts: Vec<_> = (0..6).map(|i| (21. + i as f32 * 15., 540.)).collect();
        let pred = classifier().classify(&trajectory(&pts), &[], 5);
        assert_eq!(pred.action, Action::Serve);
        assert_relative_eq!(pred.confidence, 0.82);
    }

    #[test]
    fn attack_is_fast_and_downward_near_net() {
        // Ball above the net dropping 15 px/frame.
        let pts: Vec<_> = (0..6).map(|i| (920., 380. + i as f32 * 15.)).collect();
        let pred = classifier().classify(&trajectory(&pts), &[], 5);
        assert_eq!(pred.action, Action::Attack);
        assert_relative_eq!(pred.confidence, 0.85);
    }

    #[test]
    fn block_requires_raised_arms() {
        // Sharp upward rebound near the net, 5 px/frame rising.
        let pts: Vec<_> = (0..6).map(|i| (920., 560. - i as f32 * 5.)).collect();
        let t = trajectory(&pts);
        let c = classifier();

        let blocker = player_at(0.3 * FH as f32);
        let pred = c.classify(&t, std::slice::from_ref(&blocker), 5);
        assert_eq!(pred.action, Action::Block);
        assert_relative_eq!(pred.confidence, 0.78);

        // Same ball without a raised player falls through to PASS
        // (moderate speed, rising).
        let low = player_at(0.6 * FH as f32);
        let pred = c.classify(&t, std::slice::from_ref(&low), 5);
        assert_eq!(pred.action, Action::Pass);
    }

    #[test]
    fn set_is_slow_and_rising_mid_court() {
        let pts: Vec<_> = (0..6).map(|i| (960., 500. - i as f32 * 2.)).collect();
        let pred = classifier().classify(&trajectory(&pts), &[], 5);
        assert_eq!(pred.action, Action::Set);
        assert_relative_eq!(pred.confidence, 0.74);
    }

    #[test]
    fn dig_is_low_and_rising() {
        // Low ball (y/1080 > 0.75) away from the net, rising 8 px/frame.
        let pts: Vec<_> = (0..6).map(|i| (700., 900. - i as f32 * 8.)).collect();
        let pred = classifier().classify(&trajectory(&pts), &[], 5);
        assert_eq!(pred.action, Action::Dig);
        assert_relative_eq!(pred.confidence, 0.76);
    }

    #[test]
    fn stationary_ball_is_other() {
        let pts: Vec<_> = (0..10).map(|_| (960., 540.)).collect();
        let pred = classifier().classify(&trajectory(&pts), &[], 9);
        assert_eq!(pred.action, Action::Other);
        assert_relative_eq!(pred.confidence, 0.5);
        assert!(pred.description.contains("speed=0.0"));
    }

    #[test]
    fn classification_is_deterministic() {
        let pts: Vec<_> = (0..6).map(|i| (21. + i as f32 * 15., 540.)).collect();
        let t = trajectory(&pts);
        let c = classifier();
        let players = vec![player_at(500.)];

        let a = c.classify(&t, &players, 7);
        let b = c.classify(&t, &players, 7);
        assert_eq!(a, b);
    }
}
