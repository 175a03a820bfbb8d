use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{CorrectionError, Result};
use super::frame::FrameSequence;
use super::marker::FrameMarker;

/// 输出帧的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSource {
    Original,
    Transformed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedFrame {
    pub path: PathBuf,
    pub timestamp: f64,
    pub silence: bool,
    pub source: FrameSource,
}

/// 单个静音段的替换结果：变换视频下标范围 + 等长的原始帧路径
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub range: Range<usize>,
    pub replacement: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CorrectedSequence {
    frames: Vec<CorrectedFrame>,
}

/// 以变换视频为底，按顺序折叠各静音段的替换结果
///
/// 区间重叠时后面的替换覆盖前面的。
pub fn assemble(transformed: &FrameSequence, corrections: &[Correction]) -> Result<CorrectedSequence> {
    let mut frames: Vec<CorrectedFrame> = transformed
        .frames()
        .iter()
        .map(|f| CorrectedFrame {
            path: f.path.clone(),
            timestamp: f.timestamp,
            silence: f.silence,
            source: FrameSource::Transformed,
        })
        .collect();

    for correction in corrections {
        if correction.range.end > frames.len() || correction.range.start > correction.range.end {
            return Err(CorrectionError::InvalidInput(format!(
                "correction range {:?} is outside {} frames",
                correction.range,
                frames.len()
            )));
        }
        if correction.replacement.len() != correction.range.len() {
            return Err(CorrectionError::InvalidInput(format!(
                "correction range {:?} holds {} slots but {} replacements were given",
                correction.range,
                correction.range.len(),
                correction.replacement.len()
            )));
        }

        for (slot, path) in frames[correction.range.clone()]
            .iter_mut()
            .zip(correction.replacement.iter())
        {
            slot.path = path.clone();
            slot.source = FrameSource::Original;
        }
    }

    Ok(CorrectedSequence { frames })
}

/// 输出文件名：img00000.jpg 形式的零填充计数
pub fn output_name(index: usize, extension: &str) -> String {
    format!("img{:05}.{}", index, extension)
}

impl CorrectedSequence {
    pub fn frames(&self) -> &[CorrectedFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn substituted_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.source == FrameSource::Original)
            .count()
    }

    pub fn identifiers(&self) -> Vec<PathBuf> {
        self.frames.iter().map(|f| f.path.clone()).collect()
    }

    /// 按顺序重新编号写入 `output_dir`
    ///
    /// 来自原始视频的帧在写出前交给 `marker` 处理；源文件本身不被修改。
    pub fn materialize(
        &self,
        output_dir: &Path,
        marker: Option<&dyn FrameMarker>,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)?;

        let written = self
            .frames
            .par_iter()
            .enumerate()
            .map(|(index, frame)| -> Result<PathBuf> {
                let extension = frame
                    .path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("jpg");
                let target = output_dir.join(output_name(index, extension));

                match (frame.source, marker) {
                    (FrameSource::Original, Some(marker)) => {
                        let mut image = image::open(&frame.path)?.to_rgb8();
                        marker.mark(&mut image);
                        image.save(&target)?;
                    }
                    _ => {
                        fs::copy(&frame.path, &target)?;
                    }
                }
                Ok(target)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("materialized {} frames into {:?}", written.len(), output_dir);
        info!(
            "🖼️ Wrote {} frames ({} substituted)",
            written.len(),
            self.substituted_count()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::correction::marker::BorderMarker;
    use image::{Rgb, RgbImage};

    fn sequence(prefix: &str, count: usize) -> FrameSequence {
        let paths = (0..count)
            .map(|i| PathBuf::from(format!("{}/img{:05}.png", prefix, i)))
            .collect();
        FrameSequence::annotate(paths, count as f64 * 0.1, &[]).unwrap()
    }

    #[test]
    fn test_no_corrections_is_identity() {
        let seq = sequence("t", 5);
        let corrected = assemble(&seq, &[]).unwrap();
        assert_eq!(corrected.len(), 5);
        assert_eq!(corrected.substituted_count(), 0);
        assert!(corrected
            .frames()
            .iter()
            .zip(seq.frames())
            .all(|(c, f)| c.path == f.path && c.source == FrameSource::Transformed));
    }

    #[test]
    fn test_correction_overwrites_slots() {
        let seq = sequence("t", 6);
        let correction = Correction {
            range: 2..4,
            replacement: vec![PathBuf::from("o/a.png"), PathBuf::from("o/b.png")],
        };
        let corrected = assemble(&seq, &[correction]).unwrap();

        assert_eq!(corrected.substituted_count(), 2);
        assert_eq!(corrected.frames()[2].path, PathBuf::from("o/a.png"));
        assert_eq!(corrected.frames()[3].source, FrameSource::Original);
        assert_eq!(corrected.frames()[4].path, seq.frames()[4].path);
        assert_eq!(corrected.frames()[4].source, FrameSource::Transformed);
        // 时间戳保持变换视频的
        assert_eq!(corrected.frames()[2].timestamp, seq.frames()[2].timestamp);
    }

    #[test]
    fn test_later_correction_wins_on_overlap() {
        let seq = sequence("t", 6);
        let first = Correction {
            range: 1..4,
            replacement: vec![PathBuf::from("o/1"), PathBuf::from("o/2"), PathBuf::from("o/3")],
        };
        let second = Correction {
            range: 3..5,
            replacement: vec![PathBuf::from("o/x"), PathBuf::from("o/y")],
        };
        let corrected = assemble(&seq, &[first, second]).unwrap();
        assert_eq!(
            corrected.identifiers()[1..5].to_vec(),
            vec![
                PathBuf::from("o/1"),
                PathBuf::from("o/2"),
                PathBuf::from("o/x"),
                PathBuf::from("o/y"),
            ]
        );
    }

    #[test]
    fn test_rejects_mismatched_correction() {
        let seq = sequence("t", 4);
        let short = Correction {
            range: 0..3,
            replacement: vec![PathBuf::from("o/1")],
        };
        assert!(assemble(&seq, &[short]).is_err());
        let outside = Correction {
            range: 3..5,
            replacement: vec![PathBuf::from("o/1"), PathBuf::from("o/2")],
        };
        assert!(assemble(&seq, &[outside]).is_err());
    }

    #[test]
    fn test_materialize_renumbers_and_marks() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();

        let mut paths = Vec::new();
        for i in 0..3 {
            let path = src.join(format!("frame_{}.png", i));
            RgbImage::from_pixel(32, 32, Rgb([200, 200, 200])).save(&path).unwrap();
            paths.push(path);
        }
        let seq = FrameSequence::annotate(paths.clone(), 0.3, &[]).unwrap();
        let corrected = assemble(
            &seq,
            &[Correction {
                range: 1..2,
                replacement: vec![paths[0].clone()],
            }],
        )
        .unwrap();

        let out = dir.path().join("out");
        let marker = BorderMarker::default();
        let written = corrected.materialize(&out, Some(&marker)).unwrap();

        assert_eq!(
            written,
            vec![
                out.join("img00000.png"),
                out.join("img00001.png"),
                out.join("img00002.png"),
            ]
        );
        let marked = image::open(&written[1]).unwrap().to_rgb8();
        assert_eq!(marked.get_pixel(0, 0), &Rgb([0, 0, 255]));
        assert_eq!(marked.get_pixel(16, 16), &Rgb([200, 200, 200]));

        // 源文件未被修改
        let source = image::open(&paths[0]).unwrap().to_rgb8();
        assert_eq!(source.get_pixel(0, 0), &Rgb([200, 200, 200]));
        let unmarked = image::open(&written[0]).unwrap().to_rgb8();
        assert_eq!(unmarked.get_pixel(0, 0), &Rgb([200, 200, 200]));
    }

    #[test]
    fn test_materialize_without_marker_copies_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        RgbImage::from_pixel(16, 16, Rgb([1, 2, 3])).save(&path).unwrap();
        let seq = FrameSequence::annotate(vec![path.clone()], 0.1, &[]).unwrap();
        let corrected = assemble(
            &seq,
            &[Correction {
                range: 0..1,
                replacement: vec![path.clone()],
            }],
        )
        .unwrap();

        let out = dir.path().join("out");
        let written = corrected.materialize(&out, None).unwrap();
        assert_eq!(std::fs::read(&written[0]).unwrap(), std::fs::read(&path).unwrap());
    }
}
