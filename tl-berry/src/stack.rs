//! z-stack 投影与空间缩放.
//!
//! 外部图像解码器可能给出三维标签体 (z-stack) 而非单张二维标签图.
//! 本模块提供沿 z 轴的最大/最小投影将其展平, 以及标签图的最近邻缩放
//! (标签是离散 ID, 任何插值都会制造不存在的对象).

use crate::{Idx2d, LabelImg};
use ndarray::{Array3, Axis};

/// 沿 z 轴 (第 0 维) 最大投影, 将三维标签体展平为二维标签图.
///
/// 空 stack (z = 0) 返回对应形状的全零图.
pub fn project_max(stack: &Array3<u32>) -> LabelImg {
    flatten_with(stack, |acc, v| acc.max(v))
}

/// 沿 z 轴 (第 0 维) 最小投影. 仅对非零值取最小, 背景不参与:
/// 否则任何列上只要有一层背景, 投影就会被清零.
pub fn project_min(stack: &Array3<u32>) -> LabelImg {
    flatten_with(stack, |acc, v| match (acc, v) {
        (0, v) => v,
        (acc, 0) => acc,
        (acc, v) => acc.min(v),
    })
}

fn flatten_with(stack: &Array3<u32>, combine: fn(u32, u32) -> u32) -> LabelImg {
    let (_, height, width) = stack.dim();
    let mut out = LabelImg::zeros((height, width));
    for layer in stack.axis_iter(Axis(0)) {
        out.zip_mut_with(&layer, |acc, &v| *acc = combine(*acc, v));
    }
    out
}

/// 最近邻缩放. `scale` 为两个方向共用的均匀缩放因子.
///
/// `scale == 1.0` 时按原样克隆. 输出形状为各维 `round(len * scale)`
/// (至少为 1, 除非该维本来为 0).
///
/// # Panics
///
/// `scale` 非有限正数时 panic.
pub fn rescale_nearest(seg: &LabelImg, scale: f64) -> LabelImg {
    assert!(
        scale.is_finite() && scale > 0.0,
        "缩放因子必须为有限正数, 但传入了 `{scale}`"
    );
    if scale == 1.0 {
        return seg.clone();
    }

    let (height, width) = seg.dim();
    let (out_h, out_w) = (scaled_len(height, scale), scaled_len(width, scale));

    LabelImg::from_shape_fn((out_h, out_w), |(h, w)| {
        let src = source_index((h, w), scale, (height, width));
        seg[src]
    })
}

#[inline]
fn scaled_len(len: usize, scale: f64) -> usize {
    if len == 0 {
        return 0;
    }
    ((len as f64 * scale).round() as usize).max(1)
}

/// 输出坐标对应的源坐标 (最近邻, 向下取整并夹紧到图内).
#[inline]
fn source_index((h, w): Idx2d, scale: f64, (height, width): Idx2d) -> Idx2d {
    let src_h = ((h as f64 / scale) as usize).min(height - 1);
    let src_w = ((w as f64 / scale) as usize).min(width - 1);
    (src_h, src_w)
}
