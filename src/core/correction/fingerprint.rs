use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use log::debug;

use super::error::Result;
use super::frame::Frame;

/// 图像指纹：H×H 位网格按行展开
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    words: Vec<u64>,
    bits: u32,
}

impl Fingerprint {
    pub fn from_bits(bits: &[bool]) -> Self {
        let mut words = vec![0u64; bits.len().div_ceil(64)];
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                words[i / 64] |= 1u64 << (i % 64);
            }
        }
        Self {
            words,
            bits: bits.len() as u32,
        }
    }

    pub fn len(&self) -> u32 {
        self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn bit(&self, index: u32) -> bool {
        index < self.bits && self.words[(index / 64) as usize] & (1u64 << (index % 64)) != 0
    }

    /// 汉明距离；长度不一致时只比较公共前缀，长度差计入距离
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        if self.bits == other.bits {
            return self
                .words
                .iter()
                .zip(other.words.iter())
                .map(|(a, b)| (a ^ b).count_ones())
                .sum();
        }
        let common = self.bits.min(other.bits);
        let differing = (0..common).filter(|&i| self.bit(i) != other.bit(i)).count() as u32;
        differing + self.bits.abs_diff(other.bits)
    }
}

/// 均值哈希：灰度 -> 缩放到 H×H -> 与网格均值比较
#[derive(Debug, Clone, Copy)]
pub struct AverageHasher {
    hash_size: u32,
}

impl AverageHasher {
    pub fn new(hash_size: u32) -> Self {
        Self {
            hash_size: hash_size.max(1),
        }
    }

    pub fn hash_size(&self) -> u32 {
        self.hash_size
    }

    pub fn fingerprint(&self, image: &DynamicImage) -> Fingerprint {
        self.fingerprint_luma(&Self::to_luma(image))
    }

    pub fn fingerprint_luma(&self, gray: &GrayImage) -> Fingerprint {
        let grid = image::imageops::resize(gray, self.hash_size, self.hash_size, FilterType::Lanczos3);

        let samples: Vec<u32> = grid.pixels().map(|p| p.0[0] as u32).collect();
        let sum: u32 = samples.iter().sum();
        let mean = sum as f64 / samples.len().max(1) as f64;

        let bits: Vec<bool> = samples.iter().map(|&v| v as f64 > mean).collect();
        Fingerprint::from_bits(&bits)
    }

    /// RGB 转灰度，丢弃 alpha
    fn to_luma(image: &DynamicImage) -> GrayImage {
        let rgb = image.to_rgb8();
        let mut gray = GrayImage::new(rgb.width(), rgb.height());
        for (x, y, px) in rgb.enumerate_pixels() {
            let r = px.0[0] as u32;
            let g = px.0[1] as u32;
            let b = px.0[2] as u32;
            gray.put_pixel(x, y, Luma([((r * 299 + g * 587 + b * 114) / 1000) as u8]));
        }
        gray
    }
}

impl Default for AverageHasher {
    fn default() -> Self {
        Self::new(12)
    }
}

pub fn hamming_distance(a: &Fingerprint, b: &Fingerprint) -> u32 {
    a.distance(b)
}

/// 帧指纹来源，匹配器只通过它比较帧
pub trait FingerprintSource: Send + Sync {
    fn fingerprint(&self, frame: &Frame) -> Result<Fingerprint>;
}

/// 从磁盘读取帧图像计算指纹，按路径缓存
pub struct ImageFingerprinter {
    hasher: AverageHasher,
    cache: Arc<Mutex<HashMap<PathBuf, Fingerprint>>>,
}

impl ImageFingerprinter {
    pub fn new(hash_size: u32) -> Self {
        Self {
            hasher: AverageHasher::new(hash_size),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl FingerprintSource for ImageFingerprinter {
    fn fingerprint(&self, frame: &Frame) -> Result<Fingerprint> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(fp) = cache.get(&frame.path) {
                return Ok(fp.clone());
            }
        }

        let image = image::open(&frame.path)?;
        let fp = self.hasher.fingerprint(&image);
        debug!("fingerprint {:?}: {} bits", frame.path, fp.len());

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(frame.path.clone(), fp.clone());
        }
        Ok(fp)
    }
}
