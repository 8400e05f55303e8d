#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 将时序 (timelapse) 分割数据 — 逐帧标签图与逐对象表格测量值 —
//! 转换为可视化工具可直接加载的紧凑数据集.
//!
//! 输出数据集包含: 以 24-bit 全局 ID 编码的逐帧索引图像,
//! 逐对象标量特征序列, 逐对象包围盒表, 以及描述以上全部工件的 manifest.
//! 可视化端凭借稠密整数 ID 以 O(1) 查询任意对象的轨迹、时刻、质心、
//! 包围盒和特征值.
//!
//! 该 crate 目前仅提供 `safe` 接口. 在非期望情况下, 程序会直接 panic,
//! 而不会导致内存错误. As what Rust promises.
//!
//! # 数据流
//!
//! 外部表格加载器 (按帧分组) → 标签重映射 → 包围盒累积 + 帧图像编码
//! → 特征/元数据序列写出 → manifest 写出.
//!
//! # 开发计划
//!
//! ### 全局 ID 重映射 ✅
//!
//! 把仅在单帧内唯一的局部标签, 通过逐帧 LUT 映射到全数据集唯一、
//! 稠密的全局 ID 空间. `0` 预留为背景.
//!
//! 实现位于 `tl-berry/src/remap.rs`.
//!
//! ### 包围盒增量累积 ✅
//!
//! 全数据集共享一张 `(N + 1) * 4` 的 `u16` 包围盒表, 随帧处理增量填充,
//! 且每处理完一帧即落盘一次 (断点续存).
//!
//! 实现位于 `tl-berry/src/bbox.rs`.
//!
//! ### 帧图像 24-bit 编码 ✅
//!
//! 全局 ID 以 `R + G*256 + B*65536` 编码进 RGBA 图像, alpha 恒为 255.
//!
//! 实现位于 `tl-berry/src/encode.rs`.
//!
//! ### 特征序列与 manifest 写出 ✅
//!
//! 逐特征 `{data, min, max}` (min/max 忽略 NaN), 轨迹/时刻/质心/离群标志
//! 共享序列, 以及最后写出的总索引 manifest.
//!
//! 实现位于 `tl-berry/src/writer/*`.
//!
//! ### z-stack 投影与空间缩放 ✅
//!
//! 沿 z 轴最大/最小投影展平三维标签体, 最近邻整数缩放.
//!
//! 实现位于 `tl-berry/src/stack.rs`.
//!
//! ### 逐帧顺序转换驱动 ✅
//!
//! 单线程、按帧序的完整转换流程, 带逐帧耗时日志与完成信号.
//!
//! 实现位于 `tl-berry/src/convert.rs`.
//!
//! ### 多数据集 collection 索引 ✅
//!
//! `collection.json` 的按名 upsert 语义.
//!
//! 实现位于 `tl-berry/src/writer/collection.rs`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 二维标签图. 像素值为局部标签或全局 ID (取决于是否已重映射).
pub type LabelImg = ndarray::Array2<u32>;

pub mod consts;

mod error;

pub use error::{ConvertError, ConvertResult};

/// 逐对象记录表格.
pub mod table;

pub use table::{FeatureColumn, ObjectRecord, ObjectTable};

/// 全局 ID 重映射.
pub mod remap;

pub use remap::FrameLut;

/// 包围盒累积.
pub mod bbox;

pub use bbox::BboxTable;

/// 帧图像 24-bit 编码.
pub mod encode;

pub use encode::ImgWriteId;

/// z-stack 投影与空间缩放.
pub mod stack;

/// 数据集写出会话.
pub mod writer;

pub use writer::{DatasetWriter, FeatureUnits};

/// 逐帧顺序转换驱动.
pub mod convert;

pub use convert::{convert_dataset, ConvertOptions};

pub mod prelude;
