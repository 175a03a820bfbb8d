use std::path::{Path, PathBuf};

use crate::core::correction::{Result, SilenceInterval};

/// 抽帧结果
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFrames {
    /// 按播放顺序排列
    pub frames: Vec<PathBuf>,
    pub fps: f64,
    pub duration: f64,
}

/// 外部音视频编解码能力（抽帧、抽音轨、静音检测、合成视频）
///
/// 本库不做编解码，宿主通过实现该 trait 接入 ffmpeg 或平台解码器。
pub trait MediaEngine: Send + Sync {
    /// 把视频逐帧导出到 `out_dir`
    fn extract_frames(&self, video: &Path, out_dir: &Path) -> Result<ExtractedFrames>;

    fn extract_audio(&self, video: &Path, out_audio: &Path) -> Result<()>;

    /// 低于 `level_db` 的片段视为静音；检测失败时返回空列表
    fn detect_silence(&self, media: &Path, level_db: f64) -> Vec<SilenceInterval>;

    /// 用 `frames_dir` 下按文件名排序的图片和音轨合成视频
    fn assemble_video(&self, frames_dir: &Path, audio: &Path, fps: f64, output: &Path) -> Result<()>;

    /// 左右并排合成对比视频：左侧 `left_dir`，右侧 `right_dir`，两边帧数一致
    fn assemble_stack_video(
        &self,
        left_dir: &Path,
        right_dir: &Path,
        audio: &Path,
        fps: f64,
        output: &Path,
    ) -> Result<()>;
}
