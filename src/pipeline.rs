use log::info;
use serde_derive::{Deserialize, Serialize};

use crate::calibration::{TeamCalibration, UNKNOWN_COLOR};
use crate::classifier::{Action, ActionClassifier, Thresholds};
use crate::detection::Detection;
use crate::error::Error;
use crate::frame::{FrameDetections, PlayerInfo, Team};
use crate::segmenter::{ActionEvent, EventSegmenter, SegmenterConfig};
use crate::tracker::{PlayerTracker, TrackerConfig};

/// Stream-level facts supplied by the external decoding collaborator.
#[derive(Debug, Clone, Copy)]
pub struct VideoMeta {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub total_frames: u64,
}

impl VideoMeta {
    #[inline]
    pub fn duration(&self) -> f32 {
        self.total_frames as f32 / self.fps.max(1.)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Process every `stride`-th frame; the rest reuse the last result.
    pub stride: u64,
    /// Length of the team-color calibration window in seconds.
    pub calibration_seconds: f32,
    /// Frame cadence of progress callbacks.
    pub progress_interval: u64,
    pub tracker: TrackerConfig,
    pub thresholds: Thresholds,
    pub segmenter: SegmenterConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stride: 2,
            calibration_seconds: 5.0,
            progress_interval: 30,
            tracker: TrackerConfig::default(),
            thresholds: Thresholds::default(),
            segmenter: SegmenterConfig::default(),
        }
    }
}

/// Per-frame output for the external annotation/encoding step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameAnnotation {
    pub frame_number: u64,
    pub timestamp: f32,
    pub players: Vec<PlayerInfo>,
    pub ball: Option<Detection>,
    pub action: Action,
}

impl FrameAnnotation {
    /// Annotation for frames before the first processed one.
    pub fn empty(frame_number: u64, timestamp: f32) -> Self {
        Self {
            frame_number,
            timestamp,
            players: Vec::new(),
            ball: None,
            action: Action::Other,
        }
    }
}

/// Run summary handed to the job-result layer for serialization.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub duration: f32,
    pub fps: f32,
    pub total_frames: u64,
    pub processed_frames: u64,
    pub events: Vec<ActionEvent>,
    pub team_a_color: String,
    pub team_b_color: String,
}

type ProgressFn = Box<dyn FnMut(f32)>;

/// Drives frames sequentially through tracker, classifier and segmenter,
/// owns the one-time team calibration and reports monotonic progress.
///
/// One run = one `Pipeline` instance; no state is shared across runs.
pub struct Pipeline {
    meta: VideoMeta,
    config: PipelineConfig,
    tracker: PlayerTracker,
    classifier: ActionClassifier,
    segmenter: EventSegmenter,
    calibration: TeamCalibration,
    calibration_frames: u64,
    progress: Option<ProgressFn>,
    last_progress: f32,
    /// Highest frame index fed so far, plus one.
    frames_seen: u64,
    processed: u64,
    last_annotation: Option<FrameAnnotation>,
}

impl Pipeline {
    pub fn new(meta: VideoMeta, config: PipelineConfig) -> Self {
        info!(
            "video: {}x{} @ {:.1}fps, {} frames, {:.1}s",
            meta.width,
            meta.height,
            meta.fps,
            meta.total_frames,
            meta.duration()
        );

        let calibration_frames =
            ((meta.fps.max(1.) * config.calibration_seconds) as u64).min(meta.total_frames);

        Self {
            tracker: PlayerTracker::new(config.tracker.clone()),
            classifier: ActionClassifier::new(meta.width, meta.height, config.thresholds.clone()),
            segmenter: EventSegmenter::new(config.segmenter.clone()),
            calibration: TeamCalibration::new(),
            calibration_frames,
            progress: None,
            last_progress: 0.,
            frames_seen: 0,
            processed: 0,
            last_annotation: None,
            meta,
            config,
        }
    }

    /// Registers the progress sink. Values are in [0,1], non-decreasing,
    /// below 1.0 until `finish`.
    pub fn on_progress(&mut self, callback: impl FnMut(f32) + 'static) {
        self.progress = Some(Box::new(callback));
    }

    /// Whether the external detector should run on this frame.
    #[inline]
    pub fn wants_detections(&self, frame_number: u64) -> bool {
        frame_number % self.config.stride == 0
    }

    /// Runs the full per-frame stack on a detected frame and returns the
    /// annotation for the renderer. Frames must arrive in order.
    pub fn process_frame(&mut self, frame: FrameDetections) -> Result<FrameAnnotation, Error> {
        self.check_order(frame.frame_number)?;

        let mut frame = self.tracker.update(frame);

        if !self.calibration.is_finalized() {
            if frame.frame_number < self.calibration_frames {
                for p in &frame.players {
                    self.calibration.observe(&p.jersey_color);
                }
            } else {
                self.calibration.finalize();
            }
        }

        for p in &mut frame.players {
            p.team = self.calibration.team_for(&p.jersey_color);
        }

        let prediction =
            self.classifier
                .classify(self.tracker.trajectory(), &frame.players, frame.frame_number);
        self.segmenter
            .update(&prediction, frame.frame_number, frame.timestamp, &frame.players);

        self.processed += 1;

        let annotation = FrameAnnotation {
            frame_number: frame.frame_number,
            timestamp: frame.timestamp,
            players: frame.players,
            ball: frame.ball,
            action: prediction.action,
        };
        self.last_annotation = Some(annotation.clone());

        self.advance(annotation.frame_number);
        Ok(annotation)
    }

    /// Annotation for a frame skipped by the stride: the last full result
    /// re-stamped with the current frame number and time.
    pub fn skip_frame(&mut self, frame_number: u64) -> Result<FrameAnnotation, Error> {
        self.check_order(frame_number)?;

        let timestamp = self.timestamp_for(frame_number);
        let annotation = match &self.last_annotation {
            Some(last) => FrameAnnotation {
                frame_number,
                timestamp,
                players: last.players.clone(),
                ball: last.ball,
                action: last.action,
            },
            None => FrameAnnotation::empty(frame_number, timestamp),
        };

        self.advance(frame_number);
        Ok(annotation)
    }

    /// Ends the run: flushes the trailing event, finalizes calibration if
    /// the stream ended inside the window, reports 1.0 and returns the
    /// summary.
    pub fn finish(mut self) -> AnalysisResult {
        self.calibration.finalize();
        self.segmenter
            .flush(self.frames_seen, self.timestamp_for(self.frames_seen));
        self.report(1.0);

        let team_a_color = self.resolved_color(Team::TeamA);
        let team_b_color = self.resolved_color(Team::TeamB);
        let events = self.segmenter.into_events();
        info!("analysis complete: {} events", events.len());

        AnalysisResult {
            duration: self.meta.duration(),
            fps: self.meta.fps,
            total_frames: self.meta.total_frames,
            processed_frames: self.processed,
            events,
            team_a_color,
            team_b_color,
        }
    }

    fn resolved_color(&self, team: Team) -> String {
        self.calibration
            .color_of(team)
            .unwrap_or(UNKNOWN_COLOR)
            .to_string()
    }

    #[inline]
    fn timestamp_for(&self, frame_number: u64) -> f32 {
        frame_number as f32 / self.meta.fps.max(1.)
    }

    fn check_order(&self, frame_number: u64) -> Result<(), Error> {
        if self.frames_seen > 0 && frame_number < self.frames_seen {
            return Err(Error::NonMonotonicFrame {
                frame: frame_number,
                last: self.frames_seen - 1,
            });
        }
        Ok(())
    }

    fn advance(&mut self, frame_number: u64) {
        self.frames_seen = frame_number + 1;

        if self.frames_seen % self.config.progress_interval == 0 {
            let fraction = self.frames_seen as f32 / self.meta.total_frames.max(1) as f32;
            self.report(fraction.min(0.99));
        }
    }

    fn report(&mut self, fraction: f32) {
        if fraction < self.last_progress {
            return;
        }
        self.last_progress = fraction;

        if let Some(cb) = &mut self.progress {
            cb(fraction);
        }
    }
}
