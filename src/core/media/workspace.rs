use std::fs;
use std::path::{Path, PathBuf};

use crate::core::correction::Result;

pub const BASE_IMAGE_FOLDER: &str = "img_base";
pub const TRANSFORM_IMAGE_FOLDER: &str = "img_transform";
pub const CORRECTED_IMAGE_FOLDER: &str = "img_corrected";

/// 一次校正使用的目录
#[derive(Debug, Clone)]
pub struct Workspace {
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
    pub base_img_dir: PathBuf,
    pub transformed_img_dir: PathBuf,
    pub corrected_img_dir: PathBuf,
}

impl Workspace {
    /// 创建目录；帧目录和输出目录若已存在会被清空
    pub fn prepare(work_dir: &Path, output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(work_dir)?;

        let workspace = Self {
            work_dir: work_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            base_img_dir: work_dir.join(BASE_IMAGE_FOLDER),
            transformed_img_dir: work_dir.join(TRANSFORM_IMAGE_FOLDER),
            corrected_img_dir: work_dir.join(CORRECTED_IMAGE_FOLDER),
        };

        for dir in [
            &workspace.base_img_dir,
            &workspace.transformed_img_dir,
            &workspace.corrected_img_dir,
            &workspace.output_dir,
        ] {
            Self::reset_dir(dir)?;
        }
        Ok(workspace)
    }

    fn reset_dir(dir: &Path) -> Result<()> {
        if dir.is_dir() {
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;
        Ok(())
    }

    pub fn audio_path(&self) -> PathBuf {
        self.work_dir.join("temp_audio.mp3")
    }
}
