//! 静音段画面校正
//!
//! 同一段录像的两个剪辑版本（原始 / 变换）在停顿处画面会错位。
//! 核心流程：
//! 1. 帧标注 - 按均匀步长给抽帧结果打时间戳和静音标记
//! 2. 指纹比较 - 均值哈希 + 汉明距离，超过阈值视为不相似
//! 3. 区间匹配 - 起止锚帧分别在原始静音段的头部 / 尾部窗口里搜索
//! 4. 时间重映射 - 变速重采样原始帧，保持变换静音段的时长
//! 5. 序列组装 - 折叠各段替换结果，标记帧来源

pub mod assembler;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod frame;
pub mod marker;
pub mod matcher;
pub mod remapper;

pub use assembler::{assemble, CorrectedFrame, CorrectedSequence, Correction, FrameSource};
pub use config::CorrectionConfig;
pub use engine::{CorrectionResult, IntervalCorrection, SilenceCorrector};
pub use error::{CorrectionError, Result};
pub use fingerprint::{AverageHasher, Fingerprint, FingerprintSource, ImageFingerprinter};
pub use frame::{Frame, FrameSequence, SilenceInterval};
pub use marker::{BorderMarker, FrameMarker};
pub use matcher::{IntervalMatcher, MatchCandidate, MatchOutcome, UnmatchReason};
pub use remapper::{RemapPlan, TimeRemapper};
