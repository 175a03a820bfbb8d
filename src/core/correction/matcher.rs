//! 静音区间匹配
//!
//! 对变换视频中的一个静音段，在原始视频的所有静音段中寻找画面最接近的一段：
//! 1. 起始锚帧只在每个原始静音段的开头窗口 `[start - lead, start + 0.3d]` 内搜索
//! 2. 选出得分最低的静音段（得分相同保留先出现的）
//! 3. 结束锚帧只在该段的结尾窗口 `[start + 0.6d, end + tail]` 内搜索
//! 4. 结束帧必须严格位于起始帧之后

use std::fmt;
use std::ops::Range;

use log::debug;

use super::config::CorrectionConfig;
use super::error::Result;
use super::fingerprint::{Fingerprint, FingerprintSource};
use super::frame::{Frame, FrameSequence, SilenceInterval};

/// 单次搜索的最优候选
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCandidate {
    pub score: u32,
    pub frame_index: usize,
    pub interval_index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnmatchReason {
    /// 该静音段内没有变换视频的帧
    EmptySegment,
    /// 没有任何原始静音段的起始窗口达到阈值
    NoStartMatch,
    /// 结尾窗口内没有帧达到阈值
    NoEndMatch,
    /// 结束帧不在起始帧之后
    DegenerateRange { start_index: usize, end_index: usize },
    /// 计算指纹失败等，只影响当前区间
    Failed(String),
}

impl fmt::Display for UnmatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchReason::EmptySegment => write!(f, "empty segment"),
            UnmatchReason::NoStartMatch => write!(f, "no start match"),
            UnmatchReason::NoEndMatch => write!(f, "no end match"),
            UnmatchReason::DegenerateRange {
                start_index,
                end_index,
            } => write!(f, "degenerate range {}..={}", start_index, end_index),
            UnmatchReason::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched {
        start_index: usize,
        end_index: usize,
        interval_index: usize,
        start_score: u32,
        end_score: u32,
    },
    Unmatched(UnmatchReason),
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }

    /// 匹配到的原始帧下标闭区间
    pub fn range(&self) -> Option<(usize, usize)> {
        match self {
            MatchOutcome::Matched {
                start_index,
                end_index,
                ..
            } => Some((*start_index, *end_index)),
            MatchOutcome::Unmatched(_) => None,
        }
    }
}

pub struct IntervalMatcher<'a> {
    config: &'a CorrectionConfig,
    source: &'a dyn FingerprintSource,
}

impl<'a> IntervalMatcher<'a> {
    pub fn new(config: &'a CorrectionConfig, source: &'a dyn FingerprintSource) -> Self {
        Self { config, source }
    }

    /// `segment` 为变换视频中落在 `silence` 内的帧
    pub fn match_interval(
        &self,
        silence: &SilenceInterval,
        segment: &[Frame],
        original: &FrameSequence,
        original_silences: &[SilenceInterval],
    ) -> Result<MatchOutcome> {
        let (start_frame, end_frame) = match (segment.first(), segment.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(MatchOutcome::Unmatched(UnmatchReason::EmptySegment)),
        };

        let start_fp = self.source.fingerprint(start_frame)?;
        let best_start = match self.best_start(&start_fp, original, original_silences)? {
            Some(best) => best,
            None => {
                debug!(
                    "silence [{:.2}, {:.2}]: no original silence within threshold",
                    silence.start, silence.end
                );
                return Ok(MatchOutcome::Unmatched(UnmatchReason::NoStartMatch));
            }
        };

        let winner = &original_silences[best_start.interval_index];
        let end_fp = self.source.fingerprint(end_frame)?;
        let best_end = match self.best_frame(&end_fp, original, self.end_window(original, winner))? {
            Some(best) => best,
            None => return Ok(MatchOutcome::Unmatched(UnmatchReason::NoEndMatch)),
        };

        if best_end.0 <= best_start.frame_index {
            return Ok(MatchOutcome::Unmatched(UnmatchReason::DegenerateRange {
                start_index: best_start.frame_index,
                end_index: best_end.0,
            }));
        }

        debug!(
            "silence [{:.2}, {:.2}] -> original #{} frames {}..={} (scores {}/{})",
            silence.start,
            silence.end,
            best_start.interval_index,
            best_start.frame_index,
            best_end.0,
            best_start.score,
            best_end.1
        );

        Ok(MatchOutcome::Matched {
            start_index: best_start.frame_index,
            end_index: best_end.0,
            interval_index: best_start.interval_index,
            start_score: best_start.score,
            end_score: best_end.1,
        })
    }

    /// 在所有原始静音段的起始窗口里找起始锚帧的最优匹配
    fn best_start(
        &self,
        anchor: &Fingerprint,
        original: &FrameSequence,
        original_silences: &[SilenceInterval],
    ) -> Result<Option<MatchCandidate>> {
        let mut best: Option<MatchCandidate> = None;
        for (interval_index, silence) in original_silences.iter().enumerate() {
            let window = self.start_window(original, silence);
            if let Some((frame_index, score)) = self.best_frame(anchor, original, window)? {
                // 严格更小才替换，得分相同保留先扫描到的静音段
                if best.map_or(true, |b| score < b.score) {
                    best = Some(MatchCandidate {
                        score,
                        frame_index,
                        interval_index,
                    });
                }
            }
        }
        Ok(best)
    }

    /// 窗口内距离最小且不超过阈值的帧，返回 (下标, 距离)
    fn best_frame(
        &self,
        anchor: &Fingerprint,
        original: &FrameSequence,
        window: Range<usize>,
    ) -> Result<Option<(usize, u32)>> {
        let mut best: Option<(usize, u32)> = None;
        for index in window {
            let candidate = self.source.fingerprint(&original.frames()[index])?;
            let score = anchor.distance(&candidate);
            if score > self.config.distance_threshold {
                continue;
            }
            if best.map_or(true, |(_, s)| score <= s) {
                best = Some((index, score));
            }
        }
        Ok(best)
    }

    pub fn start_window(&self, original: &FrameSequence, silence: &SilenceInterval) -> Range<usize> {
        original.indices_within(
            silence.start - self.config.start_lead_seconds,
            silence.start + silence.duration() * self.config.start_window_ratio,
        )
    }

    pub fn end_window(&self, original: &FrameSequence, silence: &SilenceInterval) -> Range<usize> {
        original.indices_within(
            silence.start + silence.duration() * self.config.end_window_ratio,
            silence.end + self.config.end_tail_seconds,
        )
    }
}
