use serde::{Deserialize, Serialize};

use super::error::{CorrectionError, Result};

/// 静音段校正参数
///
/// 默认值与离线工具一致：12x12 均值哈希，汉明距离阈值 50。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// 指纹网格边长 H（指纹长度 H*H 位）
    pub hash_size: u32,
    /// 可接受的最大汉明距离
    pub distance_threshold: u32,
    /// 起始搜索窗口：静音开始前的提前量（秒）
    pub start_lead_seconds: f64,
    /// 起始搜索窗口：覆盖静音时长的前多少比例
    pub start_window_ratio: f64,
    /// 结束搜索窗口：从静音时长的多少比例处开始
    pub end_window_ratio: f64,
    /// 结束搜索窗口：静音结束后的延伸量（秒）
    pub end_tail_seconds: f64,
    /// 重采样时 base_idx 不越过匹配区间的结束帧
    pub clamp_to_range: bool,
    /// 预处理时保留帧图像上部的比例 (0, 1]
    pub top_cut_ratio: f64,
    /// 原始视频静音检测电平 (dB)
    pub original_silence_db: f64,
    /// 变换后音频静音检测电平 (dB)
    pub transformed_silence_db: f64,
    /// 逐区间匹配的线程数
    pub worker_threads: usize,
    /// 输出变换帧与校正帧左右并排的对比视频
    pub make_stack: bool,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            hash_size: 12,
            distance_threshold: 50,
            start_lead_seconds: 0.1,
            start_window_ratio: 0.3,
            end_window_ratio: 0.6,
            end_tail_seconds: 0.1,
            clamp_to_range: true,
            top_cut_ratio: 0.5,
            original_silence_db: -13.0,
            transformed_silence_db: -7.0,
            worker_threads: num_cpus::get().min(4).max(1),
            make_stack: false,
        }
    }
}

impl CorrectionConfig {
    pub fn strict() -> Self {
        Self {
            distance_threshold: 30,
            ..Default::default()
        }
    }

    pub fn lenient() -> Self {
        Self {
            distance_threshold: 70,
            ..Default::default()
        }
    }

    /// 从 JSON 读取配置，缺省字段取默认值
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| CorrectionError::Config(format!("配置解析失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hash_size == 0 {
            return Err(CorrectionError::Config("hash_size must be > 0".into()));
        }
        for (name, ratio) in [
            ("start_window_ratio", self.start_window_ratio),
            ("end_window_ratio", self.end_window_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(CorrectionError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if !(self.top_cut_ratio > 0.0 && self.top_cut_ratio <= 1.0) {
            return Err(CorrectionError::Config(format!(
                "top_cut_ratio must be within (0, 1], got {}",
                self.top_cut_ratio
            )));
        }
        if self.start_lead_seconds < 0.0 || self.end_tail_seconds < 0.0 {
            return Err(CorrectionError::Config(
                "window margins must not be negative".into(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(CorrectionError::Config("worker_threads must be > 0".into()));
        }
        Ok(())
    }

    /// 指纹总位数，也是汉明距离的上界
    pub fn fingerprint_bits(&self) -> u32 {
        self.hash_size * self.hash_size
    }
}
