//! 静音段校正引擎
//!
//! 每个变换视频静音段独立匹配、独立重采样（只读共享输入，可并行），
//! 最后按静音段顺序折叠进变换视频的帧序列。

use std::ops::Range;

use log::{debug, info, warn};
use rayon::prelude::*;

use super::assembler::{assemble, CorrectedSequence, Correction};
use super::config::CorrectionConfig;
use super::error::{CorrectionError, Result};
use super::fingerprint::FingerprintSource;
use super::frame::{FrameSequence, SilenceInterval};
use super::matcher::{IntervalMatcher, MatchOutcome, UnmatchReason};
use super::remapper::TimeRemapper;

/// 单个变换视频静音段的处理结果
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalCorrection {
    pub silence: SilenceInterval,
    /// 变换视频中落在该静音段内的帧下标
    pub range: Range<usize>,
    pub outcome: MatchOutcome,
    /// 匹配成功时的重采样速率
    pub rate: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CorrectionResult {
    pub sequence: CorrectedSequence,
    pub intervals: Vec<IntervalCorrection>,
    /// 任一视频没有静音段时跳过校正
    pub skipped: bool,
}

impl CorrectionResult {
    pub fn matched_count(&self) -> usize {
        self.intervals
            .iter()
            .filter(|i| i.outcome.is_matched())
            .count()
    }
}

pub struct SilenceCorrector {
    config: CorrectionConfig,
    pool: rayon::ThreadPool,
}

impl SilenceCorrector {
    pub fn new(config: CorrectionConfig) -> Result<Self> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .build()
            .map_err(|e| CorrectionError::Config(format!("线程池创建失败: {}", e)))?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    /// 用原始视频静音段的画面替换变换视频静音段的画面
    pub fn correct(
        &self,
        original: &FrameSequence,
        original_silences: &[SilenceInterval],
        transformed: &FrameSequence,
        transformed_silences: &[SilenceInterval],
        source: &dyn FingerprintSource,
    ) -> Result<CorrectionResult> {
        if original_silences.is_empty() || transformed_silences.is_empty() {
            info!(
                "🔇 Silence list empty (original {}, transformed {}), passing frames through",
                original_silences.len(),
                transformed_silences.len()
            );
            return Ok(CorrectionResult {
                sequence: assemble(transformed, &[])?,
                intervals: Vec::new(),
                skipped: true,
            });
        }

        info!(
            "🎬 Correcting {} transformed silences against {} original silences",
            transformed_silences.len(),
            original_silences.len()
        );

        let results: Vec<(IntervalCorrection, Option<Correction>)> = self.pool.install(|| {
            transformed_silences
                .par_iter()
                .map(|silence| {
                    self.correct_interval(silence, original, original_silences, transformed, source)
                })
                .collect()
        });

        let (intervals, corrections): (Vec<_>, Vec<_>) = results.into_iter().unzip();
        let corrections: Vec<Correction> = corrections.into_iter().flatten().collect();
        let sequence = assemble(transformed, &corrections)?;

        info!(
            "✅ Matched {}/{} silences, {} frames substituted",
            corrections.len(),
            intervals.len(),
            sequence.substituted_count()
        );

        Ok(CorrectionResult {
            sequence,
            intervals,
            skipped: false,
        })
    }

    fn correct_interval(
        &self,
        silence: &SilenceInterval,
        original: &FrameSequence,
        original_silences: &[SilenceInterval],
        transformed: &FrameSequence,
        source: &dyn FingerprintSource,
    ) -> (IntervalCorrection, Option<Correction>) {
        let range = transformed.indices_within(silence.start, silence.end);
        let segment = &transformed.frames()[range.clone()];

        let matcher = IntervalMatcher::new(&self.config, source);
        let outcome = match matcher.match_interval(silence, segment, original, original_silences) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    "⚠️ silence [{:.2}, {:.2}] skipped: {}",
                    silence.start, silence.end, e
                );
                MatchOutcome::Unmatched(UnmatchReason::Failed(e.to_string()))
            }
        };

        let (start_index, end_index) = match outcome.range() {
            Some(r) => r,
            None => {
                if let MatchOutcome::Unmatched(reason) = &outcome {
                    debug!(
                        "silence [{:.2}, {:.2}] left untouched: {}",
                        silence.start, silence.end, reason
                    );
                }
                return (
                    IntervalCorrection {
                        silence: *silence,
                        range,
                        outcome,
                        rate: None,
                    },
                    None,
                );
            }
        };

        let remapper = TimeRemapper::new(original.step(), transformed.step())
            .with_clamp(self.config.clamp_to_range);
        match remapper.remap(original, start_index, end_index, range.len()) {
            Ok(plan) => {
                let correction = Correction {
                    range: range.clone(),
                    replacement: plan.identifiers(original),
                };
                (
                    IntervalCorrection {
                        silence: *silence,
                        range,
                        outcome,
                        rate: Some(plan.rate),
                    },
                    Some(correction),
                )
            }
            Err(e) => {
                warn!(
                    "⚠️ silence [{:.2}, {:.2}] remap failed: {}",
                    silence.start, silence.end, e
                );
                (
                    IntervalCorrection {
                        silence: *silence,
                        range,
                        outcome: MatchOutcome::Unmatched(UnmatchReason::Failed(e.to_string())),
                        rate: None,
                    },
                    None,
                )
            }
        }
    }
}
