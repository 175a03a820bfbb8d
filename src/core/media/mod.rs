//! 与外部编解码器的边界：抽帧、静音检测、帧预处理、端到端流程

pub mod engine;
pub mod pipeline;
pub mod preprocess;
pub mod silence_log;
pub mod workspace;

pub use engine::{ExtractedFrames, MediaEngine};
pub use pipeline::{CorrectionPipeline, PipelineOutcome};
pub use preprocess::{crop_top, crop_top_dir, list_frames};
pub use silence_log::parse_silence_log;
pub use workspace::Workspace;
