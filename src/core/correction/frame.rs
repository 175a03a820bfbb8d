use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{CorrectionError, Result};

/// 静音区间（秒），闭区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceInterval {
    pub start: f64,
    pub end: f64,
}

impl SilenceInterval {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(CorrectionError::InvalidInput(format!(
                "silence interval must satisfy start < end, got ({}, {})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, second: f64) -> bool {
        second >= self.start && second <= self.end
    }
}

impl From<(f64, f64)> for SilenceInterval {
    fn from((start, end): (f64, f64)) -> Self {
        Self { start, end }
    }
}

/// 帧：图像路径 + 时间戳 + 是否处于静音段
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub path: PathBuf,
    pub timestamp: f64,
    pub silence: bool,
}

impl Frame {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 按播放顺序排列的帧序列，时间步长视为均匀
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    step: f64,
    duration: f64,
}

impl FrameSequence {
    /// 为抽帧结果标注时间戳和静音标记
    ///
    /// `paths` 必须已按播放顺序排列。`timestamp[i] = i * duration / count`，
    /// 时间戳落在任一静音区间内（含边界）即标记为静音。
    pub fn annotate(
        paths: Vec<PathBuf>,
        duration: f64,
        silences: &[SilenceInterval],
    ) -> Result<Self> {
        if paths.is_empty() {
            return Err(CorrectionError::InvalidInput(
                "cannot annotate an empty frame list".into(),
            ));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(CorrectionError::InvalidInput(format!(
                "video duration must be positive, got {}",
                duration
            )));
        }

        let step = duration / paths.len() as f64;
        let frames = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| {
                let timestamp = i as f64 * step;
                let silence = silences.iter().any(|s| s.contains(timestamp));
                Frame {
                    path,
                    timestamp,
                    silence,
                }
            })
            .collect();

        Ok(Self {
            frames,
            step,
            duration,
        })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 单帧时长（秒）
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// 时间戳在 `[from, to]` 内的帧下标范围
    pub fn indices_within(&self, from: f64, to: f64) -> Range<usize> {
        let start = self.frames.partition_point(|f| f.timestamp < from);
        let end = self.frames.partition_point(|f| f.timestamp <= to);
        start..end.max(start)
    }

    pub fn silent_count(&self) -> usize {
        self.frames.iter().filter(|f| f.silence).count()
    }
}
