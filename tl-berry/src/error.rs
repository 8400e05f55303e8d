//! 转换流程的运行时错误.

use std::fmt;

/// 转换流程通用 `Result`.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// 数据集转换错误.
#[derive(Debug)]
pub enum ConvertError {
    /// 全局 ID 超出帧图像可编码范围 (`2^24 - 1`).
    IdOutOfRange {
        /// 越界的全局 ID.
        id: u32,
        /// 可编码上限.
        limit: u32,
    },

    /// 包围盒坐标超出 `u16` 可表示范围.
    ///
    /// 静默回绕会破坏下游渲染, 因此这里必须大声失败.
    CoordOutOfRange {
        /// 越界的像素坐标.
        coord: usize,
        /// 可表示上限.
        limit: usize,
    },

    /// 表格的全局行号不稠密: 行号必须恰好取遍 `[0, N)` 且互不重复.
    RowIndexNotDense {
        /// 首个违例行号.
        row: u32,
        /// 记录总数.
        len: usize,
    },

    /// 记录的局部标签为 0. 标签 0 预留给背景, 不允许充当对象标签,
    /// 否则整帧背景像素都会被重映射成该对象.
    ZeroLocalLabel {
        /// 违例记录的全局行号.
        row: u32,
    },

    /// 表格的帧号不稠密: 帧号必须恰好取遍 `[0, F)`.
    ///
    /// manifest 按 `frame_0 .. frame_{F-1}` 连续列出帧文件, 稀疏的帧号
    /// 会让 times 序列指向列表之外的帧.
    FrameIndexNotDense {
        /// 首个违例帧号.
        frame: u32,
        /// 不同帧号的个数 `F`.
        len: usize,
    },

    /// 特征列长度与记录数不一致.
    FeatureLenMismatch {
        /// 特征名.
        name: String,
        /// 期望长度 (即记录数).
        expect: usize,
        /// 实际长度.
        got: usize,
    },

    /// 特征列全部为 NaN, 无法计算 min/max.
    FeatureAllNan(String),

    /// 帧号不连续: 帧必须按 `0, 1, 2, ...` 的顺序逐一写出.
    NonContiguousFrame {
        /// 期望帧号.
        expect: u32,
        /// 实际帧号.
        got: u32,
    },

    /// 帧源提供的帧数与表格中的帧数不一致.
    ///
    /// manifest 格式无法表达 "缺少第 N 帧", 因此不允许静默跳帧.
    FrameCountMismatch {
        /// 表格中的帧数.
        expect: usize,
        /// 实际写出的帧数.
        got: usize,
    },

    /// 帧源加载某一帧失败.
    FrameLoad {
        /// 帧号.
        frame: u32,
        /// 帧源给出的细节.
        detail: String,
    },

    /// manifest 引用的工件在写 manifest 时尚不存在.
    MissingArtifact(String),

    /// 表格为空, 无可转换内容.
    EmptyTable,

    /// 底层 I/O 错误.
    Io(std::io::Error),

    /// JSON 序列化/反序列化错误.
    Json(serde_json::Error),

    /// 图像编码/存储错误.
    Image(image::ImageError),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdOutOfRange { id, limit } => {
                write!(f, "全局 ID {id} 超出帧图像可编码上限 {limit}")
            }
            Self::CoordOutOfRange { coord, limit } => {
                write!(f, "包围盒坐标 {coord} 超出可表示上限 {limit}")
            }
            Self::RowIndexNotDense { row, len } => {
                write!(f, "全局行号 {row} 破坏了 [0, {len}) 的稠密性")
            }
            Self::ZeroLocalLabel { row } => {
                write!(f, "第 {row} 行记录的局部标签为 0, 该值预留给背景")
            }
            Self::FrameIndexNotDense { frame, len } => {
                write!(f, "帧号 {frame} 破坏了 [0, {len}) 的稠密性")
            }
            Self::FeatureLenMismatch { name, expect, got } => {
                write!(f, "特征 `{name}` 长度为 {got}, 但记录数为 {expect}")
            }
            Self::FeatureAllNan(name) => {
                write!(f, "特征 `{name}` 全为 NaN, 无法计算 min/max")
            }
            Self::NonContiguousFrame { expect, got } => {
                write!(f, "期望写出第 {expect} 帧, 但实际收到第 {got} 帧")
            }
            Self::FrameCountMismatch { expect, got } => {
                write!(f, "表格包含 {expect} 帧, 但帧源只提供了 {got} 帧")
            }
            Self::FrameLoad { frame, detail } => {
                write!(f, "第 {frame} 帧加载失败: {detail}")
            }
            Self::MissingArtifact(name) => {
                write!(f, "manifest 引用的工件 `{name}` 尚不存在")
            }
            Self::EmptyTable => write!(f, "表格为空"),
            Self::Io(e) => write!(f, "I/O 错误: {e}"),
            Self::Json(e) => write!(f, "JSON 错误: {e}"),
            Self::Image(e) => write!(f, "图像错误: {e}"),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<image::ImageError> for ConvertError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}
