//! 端到端校正流程：抽帧 -> 裁剪 -> 静音检测 -> 校正 -> 合成

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use super::engine::MediaEngine;
use super::preprocess::crop_top_dir;
use super::workspace::Workspace;
use crate::core::correction::{
    CorrectionConfig, CorrectionResult, FrameMarker, FrameSequence, ImageFingerprinter, Result,
    SilenceCorrector,
};

#[derive(Debug)]
pub struct PipelineOutcome {
    pub output_video: PathBuf,
    /// 参与合成的帧目录
    pub frames_dir: PathBuf,
    pub fps: f64,
    /// 变换视频的帧数
    pub frame_count: usize,
    /// 跳过校正（任一静音列表为空）时为 None
    pub correction: Option<CorrectionResult>,
}

pub struct CorrectionPipeline {
    media: Arc<dyn MediaEngine>,
    corrector: SilenceCorrector,
    marker: Option<Box<dyn FrameMarker>>,
}

impl CorrectionPipeline {
    pub fn new(media: Arc<dyn MediaEngine>, config: CorrectionConfig) -> Result<Self> {
        Ok(Self {
            media,
            corrector: SilenceCorrector::new(config)?,
            marker: None,
        })
    }

    pub fn with_marker(mut self, marker: Box<dyn FrameMarker>) -> Self {
        self.set_marker(marker);
        self
    }

    pub fn set_marker(&mut self, marker: Box<dyn FrameMarker>) {
        self.marker = Some(marker);
    }

    pub fn has_marker(&self) -> bool {
        self.marker.is_some()
    }

    pub fn config(&self) -> &CorrectionConfig {
        self.corrector.config()
    }

    pub fn run(
        &self,
        original_video: &Path,
        transformed_video: &Path,
        work_dir: &Path,
        output_dir: &Path,
        output_video: &Path,
    ) -> Result<PipelineOutcome> {
        let config = self.corrector.config();
        let ws = Workspace::prepare(work_dir, output_dir)?;
        if output_video.is_file() {
            fs::remove_file(output_video)?;
        }

        info!("🎞️ Extracting frames from {:?}", original_video);
        let original = self.media.extract_frames(original_video, &ws.base_img_dir)?;
        crop_top_dir(&ws.base_img_dir, config.top_cut_ratio)?;

        info!("🎞️ Extracting frames from {:?}", transformed_video);
        let transformed = self.media.extract_frames(transformed_video, &ws.transformed_img_dir)?;
        crop_top_dir(&ws.transformed_img_dir, config.top_cut_ratio)?;

        let frame_count = transformed.frames.len();
        let fps = transformed.fps;

        let audio = ws.audio_path();
        self.media.extract_audio(transformed_video, &audio)?;

        let original_silences = self
            .media
            .detect_silence(original_video, config.original_silence_db);
        let transformed_silences = self.media.detect_silence(&audio, config.transformed_silence_db);
        info!(
            "🔇 Silences: original {}, transformed {}",
            original_silences.len(),
            transformed_silences.len()
        );

        let (frames_dir, correction) = if original_silences.is_empty()
            || transformed_silences.is_empty()
        {
            warn!("⚠️ No silences detected, using transformed frames unchanged");
            (ws.transformed_img_dir.clone(), None)
        } else {
            let original_seq =
                FrameSequence::annotate(original.frames, original.duration, &original_silences)?;
            let transformed_seq = FrameSequence::annotate(
                transformed.frames,
                transformed.duration,
                &transformed_silences,
            )?;

            let fingerprinter = ImageFingerprinter::new(config.hash_size);
            let result = self.corrector.correct(
                &original_seq,
                &original_silences,
                &transformed_seq,
                &transformed_silences,
                &fingerprinter,
            )?;
            result
                .sequence
                .materialize(&ws.corrected_img_dir, self.marker.as_deref())?;
            (ws.corrected_img_dir.clone(), Some(result))
        };

        if config.make_stack {
            self.media.assemble_stack_video(
                &ws.transformed_img_dir,
                &frames_dir,
                &audio,
                fps,
                output_video,
            )?;
        } else {
            self.media
                .assemble_video(&frames_dir, &audio, fps, output_video)?;
        }
        info!("✅ Corrected video written to {:?}", output_video);

        Ok(PipelineOutcome {
            output_video: output_video.to_path_buf(),
            frames_dir,
            fps,
            frame_count,
            correction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::correction::{BorderMarker, CorrectionError, SilenceInterval};
    use crate::core::media::engine::tests::{MockMediaEngine, MockVideo};
    use crate::core::media::preprocess::list_frames;
    use image::{Rgb, RgbImage};

    fn left_bright(_: usize) -> RgbImage {
        RgbImage::from_fn(24, 24, |x, _| if x < 12 { Rgb([250, 250, 250]) } else { Rgb([5, 5, 5]) })
    }

    fn right_bright(_: usize) -> RgbImage {
        RgbImage::from_fn(24, 24, |x, _| if x >= 12 { Rgb([250, 250, 250]) } else { Rgb([5, 5, 5]) })
    }

    struct Fixture {
        root: tempfile::TempDir,
        original: PathBuf,
        transformed: PathBuf,
    }

    impl Fixture {
        fn run(&self, media: Arc<MockMediaEngine>, marker: bool) -> Result<PipelineOutcome> {
            let config = CorrectionConfig {
                worker_threads: 2,
                ..Default::default()
            };
            self.run_with(media, config, marker)
        }

        fn run_with(
            &self,
            media: Arc<MockMediaEngine>,
            config: CorrectionConfig,
            marker: bool,
        ) -> Result<PipelineOutcome> {
            let mut pipeline = CorrectionPipeline::new(media, config)?;
            if marker {
                pipeline = pipeline.with_marker(Box::new(BorderMarker::new(2, Rgb([0, 0, 255]))));
            }
            pipeline.run(
                &self.original,
                &self.transformed,
                &self.root.path().join("work"),
                &self.root.path().join("output"),
                &self.root.path().join("corrected.mp4"),
            )
        }
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let original = root.path().join("original.mp4");
        let transformed = root.path().join("transformed.mp4");
        Fixture {
            root,
            original,
            transformed,
        }
    }

    fn media(fx: &Fixture, transformed_painter: fn(usize) -> RgbImage, silences: bool) -> MockMediaEngine {
        let mut media = MockMediaEngine::new();
        let silence = if silences {
            vec![SilenceInterval::new(1.0, 2.0).unwrap()]
        } else {
            vec![]
        };
        media.add_video(
            &fx.original,
            MockVideo {
                frame_count: 40,
                fps: 10.0,
                painter: Box::new(left_bright),
                silences: silence,
            },
        );
        media.add_video(
            &fx.transformed,
            MockVideo {
                frame_count: 40,
                fps: 10.0,
                painter: Box::new(transformed_painter),
                silences: vec![SilenceInterval::new(1.0, 2.0).unwrap()],
            },
        );
        media
    }

    #[test]
    fn test_pipeline_substitutes_matching_silence() {
        let fx = fixture();
        let outcome = fx.run(Arc::new(media(&fx, left_bright, true)), true).unwrap();

        let result = outcome.correction.expect("correction should run");
        assert_eq!(result.matched_count(), 1);
        assert!(result.sequence.substituted_count() > 0);
        assert_eq!(outcome.fps, 10.0);
        assert!(outcome.output_video.is_file());

        let written = list_frames(&outcome.frames_dir).unwrap();
        assert_eq!(written.len(), 40);
        assert_eq!(written[0].file_name().unwrap(), "img00000.png");

        // 替换帧带边框，其他帧原样
        let range = result.intervals[0].range.clone();
        let marked = image::open(&written[range.start]).unwrap().to_rgb8();
        assert_eq!(marked.get_pixel(20, 0), &Rgb([0, 0, 255]));
        let plain = image::open(&written[0]).unwrap().to_rgb8();
        assert_eq!(plain.get_pixel(20, 0), &Rgb([5, 5, 5]));
        // 上半部分裁剪
        assert_eq!(plain.dimensions(), (24, 12));
    }

    #[test]
    fn test_pipeline_unmatched_frames_are_byte_identical() {
        let fx = fixture();
        let outcome = fx.run(Arc::new(media(&fx, right_bright, true)), true).unwrap();

        let result = outcome.correction.expect("correction should run");
        assert_eq!(result.matched_count(), 0);

        let transformed_dir = fx.root.path().join("work").join("img_transform");
        let inputs = list_frames(&transformed_dir).unwrap();
        let outputs = list_frames(&outcome.frames_dir).unwrap();
        assert_eq!(inputs.len(), outputs.len());
        for (input, output) in inputs.iter().zip(outputs.iter()) {
            assert_eq!(fs::read(input).unwrap(), fs::read(output).unwrap());
        }
    }

    #[test]
    fn test_pipeline_without_silences_uses_transformed_frames() {
        let fx = fixture();
        let media = Arc::new(media(&fx, left_bright, false));
        let outcome = fx.run(media.clone(), false).unwrap();

        assert!(outcome.correction.is_none());
        let transformed_dir = fx.root.path().join("work").join("img_transform");
        assert_eq!(outcome.frames_dir, transformed_dir);
        let assembled = media.assembled.lock().unwrap();
        assert_eq!(assembled.as_slice(), &[(transformed_dir, 10.0, 40)]);
    }

    #[test]
    fn test_pipeline_reports_extraction_failure() {
        let fx = fixture();
        let mut media = media(&fx, left_bright, true);
        media.fail_extract = true;
        assert!(matches!(
            fx.run(Arc::new(media), false),
            Err(CorrectionError::Media(_))
        ));
    }

    #[test]
    fn test_pipeline_replaces_existing_output() {
        let fx = fixture();
        let output = fx.root.path().join("corrected.mp4");
        fs::write(&output, b"stale").unwrap();
        fx.run(Arc::new(media(&fx, left_bright, true)), false).unwrap();
        assert_eq!(fs::read(&output).unwrap(), b"video");
    }

    #[test]
    fn test_pipeline_stack_video_pairs_transformed_and_corrected() {
        let fx = fixture();
        let media = Arc::new(media(&fx, left_bright, true));
        let config = CorrectionConfig {
            worker_threads: 2,
            make_stack: true,
            ..Default::default()
        };
        let outcome = fx.run_with(media.clone(), config, false).unwrap();

        let work = fx.root.path().join("work");
        assert_eq!(outcome.frames_dir, work.join("img_corrected"));
        assert_eq!(fs::read(&outcome.output_video).unwrap(), b"stack");
        assert!(media.assembled.lock().unwrap().is_empty());
        let stacked = media.stacked.lock().unwrap();
        assert_eq!(
            stacked.as_slice(),
            &[(work.join("img_transform"), work.join("img_corrected"), 10.0)]
        );
    }
}
