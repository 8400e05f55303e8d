//! 通用常量与命名策略.

/// 背景 (即 "此处无对象") 的保留全局 ID.
pub const BACKGROUND_ID: u32 = 0;

/// 全局行号到全局 ID 的偏移量.
///
/// 表格的行号从 0 开始, 而输出图像中 `0` 预留给背景,
/// 因此每个全局 ID 均为 `行号 + ID_OFFSET`.
pub const ID_OFFSET: u32 = 1;

/// 帧图像可编码的最大全局 ID.
///
/// 帧图像仅使用 R/G/B 三个数据通道, 故上限为 `2^24 - 1`.
pub const MAX_FRAME_ID: u32 = (1 << 24) - 1;

/// 包围盒坐标的最大可表示值.
///
/// 包围盒表以 `u16` 存储. 分辨率超过该值的图像必须先行缩放,
/// 否则转换以错误终止, 绝不静默回绕.
pub const MAX_BBOX_COORD: usize = u16::MAX as usize;

/// 图像中存在、但当帧表格未引用的局部标签的处理策略.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum UnmappedPolicy {
    /// 丢弃: 该标签的像素全部映射为 [`BACKGROUND_ID`], 并记录一条警告日志.
    Drop,
}

/// 当前生效的未映射标签策略.
///
/// 该策略是显式命名的设计决定, 而非 LUT 零初始化的偶然结果.
pub const UNMAPPED_POLICY: UnmappedPolicy = UnmappedPolicy::Drop;

/// 数据集目录内的标准工件文件名.
pub mod filename {
    /// 总索引.
    pub const MANIFEST: &str = "manifest.json";

    /// 逐对象离群标志序列.
    pub const OUTLIERS: &str = "outliers.json";

    /// 逐对象轨迹 ID 序列.
    pub const TRACKS: &str = "tracks.json";

    /// 逐对象帧号序列.
    pub const TIMES: &str = "times.json";

    /// 逐对象质心序列 (x, y 交错).
    pub const CENTROIDS: &str = "centroids.json";

    /// 全数据集包围盒表.
    pub const BOUNDS: &str = "bounds.json";

    /// 多数据集索引 (位于数据集目录的上一级).
    pub const COLLECTION: &str = "collection.json";

    /// 第 `i` 帧图像的文件名. `i` 从 0 开始且连续.
    #[inline]
    pub fn frame(i: u32) -> String {
        format!("frame_{i}.png")
    }

    /// 第 `i` 个特征序列的文件名. `i` 从 0 开始且连续.
    #[inline]
    pub fn feature(i: usize) -> String {
        format!("feature_{i}.json")
    }
}
