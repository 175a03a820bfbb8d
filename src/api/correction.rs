//! 口型校正器

use std::path::Path;
use std::sync::Arc;

use flutter_rust_bridge::frb;
use log::{error, info};

use crate::api::models::report::CorrectionReport;
use crate::core::correction::{BorderMarker, CorrectionConfig, CorrectionError, SilenceInterval};
use crate::core::media::{parse_silence_log, CorrectionPipeline, MediaEngine};

/// 口型校正器 - 用原始视频静音段的画面替换变换视频静音段的画面
///
/// 编解码能力由宿主以 [`MediaEngine`] 注入，只供 Rust 宿主使用，不经 bridge 导出。
///
/// ```ignore
/// let corrector = LipSyncCorrector::create_with_config_json(media, r#"{"make_stack": true}"#)?
///     .with_debug_border();
/// let report = corrector.correct_video(original, transformed, work_dir, output_dir, output)?;
/// ```
#[frb(ignore)]
pub struct LipSyncCorrector {
    pipeline: CorrectionPipeline,
}

impl LipSyncCorrector {
    /// 使用默认配置创建
    pub fn create(media: Arc<dyn MediaEngine>) -> Result<Self, CorrectionError> {
        Self::create_with_config(media, CorrectionConfig::default())
    }

    pub fn create_with_config(
        media: Arc<dyn MediaEngine>,
        config: CorrectionConfig,
    ) -> Result<Self, CorrectionError> {
        crate::init_logging();
        info!(
            "🎬 LipSyncCorrector: created (hash {}x{}, threshold {}, {} workers)",
            config.hash_size, config.hash_size, config.distance_threshold, config.worker_threads
        );
        Ok(Self {
            pipeline: CorrectionPipeline::new(media, config)?,
        })
    }

    /// 从 JSON 配置创建，缺省字段取默认值
    pub fn create_with_config_json(
        media: Arc<dyn MediaEngine>,
        config_json: &str,
    ) -> Result<Self, CorrectionError> {
        Self::create_with_config(media, CorrectionConfig::from_json(config_json)?)
    }

    /// 被替换的帧加蓝色边框，便于人工检查
    pub fn with_debug_border(mut self) -> Self {
        self.pipeline.set_marker(Box::new(BorderMarker::default()));
        self
    }

    /// 执行完整校正流程，输出视频写入 `output_video`
    pub fn correct_video(
        &self,
        original_video: String,
        transformed_video: String,
        work_dir: String,
        output_dir: String,
        output_video: String,
    ) -> Result<CorrectionReport, CorrectionError> {
        info!("🎥 Correcting {} against {}", transformed_video, original_video);

        let outcome = self
            .pipeline
            .run(
                Path::new(&original_video),
                Path::new(&transformed_video),
                Path::new(&work_dir),
                Path::new(&output_dir),
                Path::new(&output_video),
            )
            .map_err(|e| {
                error!("❌ Correction failed: {}", e);
                e
            })?;

        let report = CorrectionReport::from(&outcome);
        info!(
            "✅ {}/{} silences matched, {} frames substituted",
            report.matched_count(),
            report.intervals.len(),
            report.substituted_frames
        );
        Ok(report)
    }

    /// 当前配置的 JSON 表示
    pub fn config_json(&self) -> Result<String, CorrectionError> {
        Ok(serde_json::to_string(self.pipeline.config())?)
    }
}

impl Drop for LipSyncCorrector {
    fn drop(&mut self) {
        info!("🗑️ LipSyncCorrector: released");
    }
}

/// 解析 ffmpeg silencedetect 的输出
#[frb(sync)]
pub fn parse_silence_output(lines: Vec<String>) -> Result<Vec<SilenceInterval>, CorrectionError> {
    parse_silence_log(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::media::engine::tests::{MockMediaEngine, MockVideo};
    use image::{Rgb, RgbImage};

    fn checker(i: usize) -> RgbImage {
        let phase = (i / 10) % 2;
        RgbImage::from_fn(24, 24, |x, y| {
            if ((x / 6 + y / 6) as usize + phase) % 2 == 0 {
                Rgb([240, 240, 240])
            } else {
                Rgb([10, 10, 10])
            }
        })
    }

    #[test]
    fn test_correct_video_report() {
        let root = tempfile::tempdir().unwrap();
        let original = root.path().join("a.mp4");
        let transformed = root.path().join("b.mp4");

        let mut media = MockMediaEngine::new();
        for path in [&original, &transformed] {
            media.add_video(
                path,
                MockVideo {
                    frame_count: 30,
                    fps: 10.0,
                    painter: Box::new(checker),
                    silences: vec![SilenceInterval::new(0.5, 1.5).unwrap()],
                },
            );
        }

        let corrector = LipSyncCorrector::create_with_config_json(
            Arc::new(media),
            r#"{"worker_threads": 2}"#,
        )
        .unwrap()
        .with_debug_border();

        let output = root.path().join("out").join("corrected.mp4");
        let report = corrector
            .correct_video(
                original.to_string_lossy().into_owned(),
                transformed.to_string_lossy().into_owned(),
                root.path().join("work").to_string_lossy().into_owned(),
                root.path().join("out").to_string_lossy().into_owned(),
                output.to_string_lossy().into_owned(),
            )
            .unwrap();

        assert!(!report.skipped);
        assert_eq!(report.total_frames, 30);
        assert_eq!(report.intervals.len(), 1);
        assert!(report.intervals[0].matched);
        assert_eq!(report.output_video, output.to_string_lossy());
        assert!(output.is_file());
    }

    #[test]
    fn test_debug_border_sets_marker() {
        let corrector = LipSyncCorrector::create(Arc::new(MockMediaEngine::new())).unwrap();
        assert!(!corrector.pipeline.has_marker());

        let corrector = corrector.with_debug_border();
        assert!(corrector.pipeline.has_marker());
        assert_eq!(corrector.pipeline.config(), &CorrectionConfig::default());
    }

    #[test]
    fn test_create_rejects_bad_config() {
        let media = Arc::new(MockMediaEngine::new());
        let err = LipSyncCorrector::create_with_config_json(media, r#"{"hash_size": 0}"#);
        assert!(matches!(err, Err(CorrectionError::Config(_))));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let corrector = LipSyncCorrector::create(Arc::new(MockMediaEngine::new())).unwrap();
        let json = corrector.config_json().unwrap();
        let config = CorrectionConfig::from_json(&json).unwrap();
        assert_eq!(&config, corrector.pipeline.config());
    }

    #[test]
    fn test_parse_silence_output() {
        let lines = vec![
            "[silencedetect @ 0x1] silence_start: 1.25".to_string(),
            "[silencedetect @ 0x1] silence_end: 2.5 | silence_duration: 1.25".to_string(),
        ];
        assert_eq!(
            parse_silence_output(lines).unwrap(),
            vec![SilenceInterval::new(1.25, 2.5).unwrap()]
        );
    }
}
