pub mod calibration;
pub mod classifier;
pub mod detection;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod segmenter;
pub mod tracker;
pub mod trajectory;

pub use calibration::TeamCalibration;
pub use classifier::{Action, ActionClassifier, ActionPrediction, Thresholds};
pub use detection::{Detection, ObjectClass};
pub use error::Error;
pub use frame::{FrameDetections, PlayerInfo, Team};
pub use pipeline::{AnalysisResult, FrameAnnotation, Pipeline, PipelineConfig, VideoMeta};
pub use segmenter::{ActionEvent, EventSegmenter, SegmenterConfig};
pub use tracker::{Assignment, Association, GreedyIou, PlayerTracker, TrackerConfig};
pub use trajectory::BallTrajectory;
