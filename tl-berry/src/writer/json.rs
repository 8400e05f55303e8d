//! 数据集工件的 JSON 载荷结构.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 纯数据序列: `{ "data": [...] }`.
///
/// tracks/times/centroids/bounds 均采用该载荷.
#[derive(Debug, Serialize)]
pub(crate) struct DataJson<'a, T> {
    /// 逐对象 (或逐坐标分量) 数据.
    pub data: &'a [T],
}

/// 带声明范围的数据序列: `{ "data": [...], "min": .., "max": .. }`.
///
/// 特征序列的 min/max 为忽略 NaN 的全数据集极值; 离群序列的范围
/// 恒为 `{false, true}`, 与实际取值无关 (为将来保留).
#[derive(Debug, Serialize)]
pub(crate) struct RangedJson<'a, T> {
    /// 逐对象数据. 特征序列中允许出现 NaN, 下游必须容忍.
    pub data: &'a [T],
    /// 声明下界.
    pub min: T,
    /// 声明上界.
    pub max: T,
}

/// 单个特征的附加元数据.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureUnits {
    /// 物理单位, 如 "µm³".
    pub units: String,
}

/// 数据集总索引 `manifest.json`.
///
/// manifest 在全部其他工件落盘之后一次性写出, 此后不可变.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    /// 帧图像文件名, 按帧号升序, `frame_<i>` 从 0 开始连续.
    pub frames: Vec<String>,

    /// 特征显示名到其序列文件名的映射.
    pub features: BTreeMap<String, String>,

    /// 可选的逐特征单位元数据. 只在每个特征都具备单位时写出,
    /// 绝不部分写出.
    #[serde(
        rename = "featureMetadata",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub feature_metadata: Option<BTreeMap<String, FeatureUnits>>,

    /// 离群序列文件名.
    pub outliers: String,

    /// 轨迹序列文件名.
    pub tracks: String,

    /// 时刻序列文件名.
    pub times: String,

    /// 质心序列文件名.
    pub centroids: String,

    /// 包围盒表文件名.
    pub bounds: String,
}

/// `collection.json` 中的一个数据集条目.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionEntry {
    /// 数据集名. collection 内按名唯一.
    pub name: String,

    /// 数据集目录相对 collection 文件的路径.
    pub path: String,
}
