//! ffmpeg silencedetect 输出解析

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::correction::{CorrectionError, Result, SilenceInterval};

type Pattern = Lazy<std::result::Result<Regex, regex::Error>>;

// silencedetect 以 %.6g 打印时间，可能带指数
static SILENCE_START: Pattern = Lazy::new(|| {
    Regex::new(r"silence_start:\s*(-?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)")
});
static SILENCE_END: Pattern = Lazy::new(|| {
    Regex::new(r"silence_end:\s*(-?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?)")
});

fn compiled(pattern: &'static Pattern) -> Result<&'static Regex> {
    pattern
        .as_ref()
        .map_err(|e| CorrectionError::Pattern(e.clone()))
}

fn capture_seconds(re: &Regex, line: &str) -> Option<f64> {
    re.captures(line)?.get(1)?.as_str().parse::<f64>().ok()
}

/// 解析 silencedetect 日志
///
/// `silence_start` 开启一对，紧随其后的 `silence_end` 闭合；
/// 没有起点的 `silence_end` 和未闭合的起点都丢弃。
pub fn parse_silence_log<S: AsRef<str>>(lines: &[S]) -> Result<Vec<SilenceInterval>> {
    let start_re = compiled(&SILENCE_START)?;
    let end_re = compiled(&SILENCE_END)?;

    let mut silences = Vec::new();
    let mut pending: Option<f64> = None;

    for line in lines {
        let line = line.as_ref();
        if let Some(start) = capture_seconds(start_re, line) {
            pending = Some(start);
        } else if let Some(end) = capture_seconds(end_re, line) {
            if let Some(start) = pending.take() {
                match SilenceInterval::new(start.max(0.0), end) {
                    Ok(silence) => silences.push(silence),
                    Err(e) => debug!("skip silence pair: {}", e),
                }
            }
        }
    }

    Ok(silences)
}
