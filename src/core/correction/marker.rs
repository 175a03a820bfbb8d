use image::{Rgb, RgbImage};

/// 写出替换帧前对图像做的可视化处理
pub trait FrameMarker: Send + Sync {
    fn mark(&self, image: &mut RgbImage);
}

/// 沿图像四周画一圈实心边框，用于肉眼区分来自原始视频的帧
#[derive(Debug, Clone, Copy)]
pub struct BorderMarker {
    pub thickness: u32,
    pub color: Rgb<u8>,
}

impl BorderMarker {
    pub fn new(thickness: u32, color: Rgb<u8>) -> Self {
        Self { thickness, color }
    }
}

impl Default for BorderMarker {
    fn default() -> Self {
        Self {
            thickness: 10,
            color: Rgb([0, 0, 255]),
        }
    }
}

impl FrameMarker for BorderMarker {
    fn mark(&self, image: &mut RgbImage) {
        let (w, h) = image.dimensions();
        let t = self.thickness;
        for y in 0..h {
            for x in 0..w {
                if x < t || y < t || x + t >= w || y + t >= h {
                    image.put_pixel(x, y, self.color);
                }
            }
        }
    }
}
