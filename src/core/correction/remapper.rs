use std::path::PathBuf;

use super::error::{CorrectionError, Result};
use super::frame::FrameSequence;

/// 重采样计划：为变换视频的 N 个位置各指定一个原始帧下标
#[derive(Debug, Clone, PartialEq)]
pub struct RemapPlan {
    pub indices: Vec<usize>,
    pub base_block_duration: f64,
    pub corrected_block_duration: f64,
    pub rate: f64,
}

impl RemapPlan {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn identifiers(&self, original: &FrameSequence) -> Vec<PathBuf> {
        self.indices
            .iter()
            .map(|&i| original.frames()[i].path.clone())
            .collect()
    }
}

/// 保持时长的变速重采样
#[derive(Debug, Clone, Copy)]
pub struct TimeRemapper {
    original_step: f64,
    transformed_step: f64,
    clamp_to_range: bool,
}

impl TimeRemapper {
    pub fn new(original_step: f64, transformed_step: f64) -> Self {
        Self {
            original_step,
            transformed_step,
            clamp_to_range: true,
        }
    }

    /// 关闭后 base_idx 可以越过 end_index，继续读取之后的原始帧（直到序列末尾）
    pub fn with_clamp(mut self, clamp_to_range: bool) -> Self {
        self.clamp_to_range = clamp_to_range;
        self
    }

    /// 把原始帧 `start_index..=end_index` 以可变速率铺满 `count` 个变换视频位置
    ///
    /// base_idx 只前进不后退；速率过小时会跳帧，过大时末帧会重复。
    pub fn remap(
        &self,
        original: &FrameSequence,
        start_index: usize,
        end_index: usize,
        count: usize,
    ) -> Result<RemapPlan> {
        if start_index > end_index || end_index >= original.len() {
            return Err(CorrectionError::InvalidInput(format!(
                "remap range {}..={} is invalid for {} frames",
                start_index,
                end_index,
                original.len()
            )));
        }
        if !(self.original_step > 0.0 && self.transformed_step > 0.0) {
            return Err(CorrectionError::InvalidInput(format!(
                "frame steps must be positive, got {} / {}",
                self.original_step, self.transformed_step
            )));
        }

        let base_block_duration = (end_index - start_index + 1) as f64 * self.original_step;
        let corrected_block_duration = count as f64 * self.transformed_step;
        let rate = corrected_block_duration / base_block_duration;

        let limit = if self.clamp_to_range {
            end_index
        } else {
            original.len() - 1
        };

        let mut indices = Vec::with_capacity(count);
        let mut base_idx = start_index;
        for corr_idx in 1..=count {
            indices.push(base_idx);
            let elapsed = corr_idx as f64 * self.transformed_step;
            while base_idx < limit
                && elapsed > (base_idx - start_index) as f64 * self.original_step * rate
            {
                base_idx += 1;
            }
        }

        Ok(RemapPlan {
            indices,
            base_block_duration,
            corrected_block_duration,
            rate,
        })
    }
}
