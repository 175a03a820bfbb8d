//! 帧预处理

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;

use crate::core::correction::{CorrectionError, Result};

const FRAME_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// 目录下的帧图像，按文件名字典序（零填充计数即播放顺序）
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    frames.sort();
    Ok(frames)
}

/// 只保留图像上部 `ratio` 的高度，原地覆盖
pub fn crop_top(path: &Path, ratio: f64) -> Result<()> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(CorrectionError::InvalidInput(format!(
            "top cut ratio must be within (0, 1], got {}",
            ratio
        )));
    }
    let image = image::open(path)?;
    let keep = ((image.height() as f64 * ratio) as u32).max(1);
    if keep < image.height() {
        image.crop_imm(0, 0, image.width(), keep).save(path)?;
    }
    Ok(())
}

/// 对目录下所有帧执行 [`crop_top`]
pub fn crop_top_dir(dir: &Path, ratio: f64) -> Result<usize> {
    let frames = list_frames(dir)?;
    frames
        .par_iter()
        .map(|path| crop_top(path, ratio))
        .collect::<Result<Vec<_>>>()?;
    debug!("cropped {} frames in {:?} to top {:.0}%", frames.len(), dir, ratio * 100.0);
    Ok(frames.len())
}
