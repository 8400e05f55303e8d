//! 帧图像 24-bit 编码.
//!
//! 重映射后的全局 ID 图打包为 4 通道字节图像: 每个像素满足
//! `id = R + G*256 + B*65536`, alpha 恒为 255 (不作为数据通道).
//! 因此可编码的 ID 上限为 `2^24 - 1`.

use crate::consts::MAX_FRAME_ID;
use crate::{ConvertError, ConvertResult, LabelImg};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// 将全局 ID 图编码为 RGBA 字节图像.
///
/// 任何像素的 ID 超过 [`MAX_FRAME_ID`] 即返回错误: 三个数据通道
/// 无法容纳更大的 ID, 截断会让下游把像素解码成错误的对象.
pub fn encode_rgba(remapped: &LabelImg) -> ConvertResult<RgbaImage> {
    let (height, width) = remapped.dim();
    let mut buf = RgbaImage::new(width as u32, height as u32);

    for ((h, w), &id) in remapped.indexed_iter() {
        if id > MAX_FRAME_ID {
            return Err(ConvertError::IdOutOfRange {
                id,
                limit: MAX_FRAME_ID,
            });
        }
        buf.put_pixel(w as u32, h as u32, Rgba(encode_id(id)));
    }
    Ok(buf)
}

/// 单个 ID 的三字节拆分: `[R, G, B, 255]`.
#[inline]
pub fn encode_id(id: u32) -> [u8; 4] {
    [
        (id & 0x0000_00ff) as u8,
        ((id & 0x0000_ff00) >> 8) as u8,
        ((id & 0x00ff_0000) >> 16) as u8,
        255,
    ]
}

/// [`encode_id`] 的逆运算: `R + G*256 + B*65536`. alpha 被忽略.
#[inline]
pub fn decode_id([r, g, b, _]: [u8; 4]) -> u32 {
    r as u32 + g as u32 * 256 + b as u32 * 65536
}

/// 表明一个可以按 24-bit ID 编码模式持久化存储的图像对象.
///
/// 与可视化友好的灰度保存不同, `ImgWriteId` 保存的图像面向机器读取:
/// 下游按通道公式把像素还原为全局 ID.
pub trait ImgWriteId {
    /// 编码后将图像保存到 `path` 路径. 格式由扩展名决定, 标准为 PNG
    /// (无损; 有损格式会破坏 ID).
    fn save_id<P: AsRef<Path>>(&self, path: P) -> ConvertResult<()>;
}

impl ImgWriteId for LabelImg {
    fn save_id<P: AsRef<Path>>(&self, path: P) -> ConvertResult<()> {
        let buf = encode_rgba(self)?;
        buf.save(path).map_err(ConvertError::Image)
    }
}
