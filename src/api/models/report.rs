use serde::{Deserialize, Serialize};

use crate::core::correction::{
    CorrectionResult, IntervalCorrection, MatchOutcome, Result, UnmatchReason,
};
use crate::core::media::PipelineOutcome;

/// 单个静音段的校正结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalReport {
    pub silence_start: f64,
    pub silence_end: f64,
    /// 变换视频帧下标，左闭右开
    pub transformed_start: usize,
    pub transformed_end: usize,
    pub matched: bool,
    /// 原始视频帧下标，闭区间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_end: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    /// 未匹配原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&IntervalCorrection> for IntervalReport {
    fn from(interval: &IntervalCorrection) -> Self {
        let mut report = Self {
            silence_start: interval.silence.start,
            silence_end: interval.silence.end,
            transformed_start: interval.range.start,
            transformed_end: interval.range.end,
            matched: false,
            original_start: None,
            original_end: None,
            start_score: None,
            end_score: None,
            rate: interval.rate,
            reason: None,
        };
        match &interval.outcome {
            MatchOutcome::Matched {
                start_index,
                end_index,
                start_score,
                end_score,
                ..
            } => {
                report.matched = true;
                report.original_start = Some(*start_index);
                report.original_end = Some(*end_index);
                report.start_score = Some(*start_score);
                report.end_score = Some(*end_score);
            }
            MatchOutcome::Unmatched(reason) => report.reason = Some(reason_code(reason)),
        }
        report
    }
}

fn reason_code(reason: &UnmatchReason) -> String {
    match reason {
        UnmatchReason::EmptySegment => "empty_segment".to_string(),
        UnmatchReason::NoStartMatch => "no_start_match".to_string(),
        UnmatchReason::NoEndMatch => "no_end_match".to_string(),
        UnmatchReason::DegenerateRange { .. } => "degenerate_range".to_string(),
        UnmatchReason::Failed(msg) => format!("failed: {}", msg),
    }
}

/// 一次校正的汇总，可序列化后交给上层展示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub output_video: String,
    pub fps: f64,
    pub total_frames: usize,
    pub substituted_frames: usize,
    /// 任一视频没有检测到静音段
    pub skipped: bool,
    pub intervals: Vec<IntervalReport>,
}

impl CorrectionReport {
    pub fn from_result(output_video: String, fps: f64, result: &CorrectionResult) -> Self {
        Self {
            output_video,
            fps,
            total_frames: result.sequence.len(),
            substituted_frames: result.sequence.substituted_count(),
            skipped: result.skipped,
            intervals: result.intervals.iter().map(IntervalReport::from).collect(),
        }
    }

    /// 跳过校正时没有帧序列，帧数由调用方给出
    pub fn skipped(output_video: String, fps: f64, total_frames: usize) -> Self {
        Self {
            output_video,
            fps,
            total_frames,
            substituted_frames: 0,
            skipped: true,
            intervals: Vec::new(),
        }
    }

    pub fn matched_count(&self) -> usize {
        self.intervals.iter().filter(|i| i.matched).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&PipelineOutcome> for CorrectionReport {
    fn from(outcome: &PipelineOutcome) -> Self {
        let output_video = outcome.output_video.to_string_lossy().into_owned();
        match &outcome.correction {
            Some(result) => Self::from_result(output_video, outcome.fps, result),
            None => Self::skipped(output_video, outcome.fps, outcome.frame_count),
        }
    }
}
