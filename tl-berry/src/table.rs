//! 逐对象记录表格.
//!
//! 外部表格加载器 (CSV、实验室专有清单等) 负责把数据解析成本模块的
//! 类型化结构; 核心流程内不存在任何按字符串列名的动态取值.

use crate::consts::{ID_OFFSET, MAX_FRAME_ID};
use crate::{ConvertError, ConvertResult};
use itertools::{Itertools, MinMaxResult};
use std::collections::{BTreeMap, BTreeSet};

/// 一条对象记录, 即某个对象在某一帧上的一次出现.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    /// 局部标签. 仅在所属帧的分割图内唯一, 必须为正.
    pub local_label: u32,

    /// 全局行号. 按稳定顺序枚举全表时的行下标, 全数据集唯一且稠密.
    pub row: u32,

    /// 轨迹 ID. 同一被追踪对象在多帧中重复出现时取值相同.
    pub track: i64,

    /// 帧号, 即时间步.
    pub frame: u32,

    /// 质心坐标 `(x, y)`, 以原始图像像素为单位.
    pub centroid: (f64, f64),

    /// 离群标志.
    pub outlier: bool,
}

impl ObjectRecord {
    /// 该记录的全局 ID, 即 `行号 + ID_OFFSET`. `0` 预留给背景.
    #[inline]
    pub fn global_id(&self) -> u32 {
        self.row + ID_OFFSET
    }
}

/// 一列命名标量特征, 与记录一一对应.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    /// 特征显示名.
    pub name: String,

    /// 物理单位 (如 "µm³"). 可选.
    pub unit: Option<String>,

    /// 特征值. 与记录同序、同长. 允许包含 NaN.
    pub data: Vec<f64>,
}

impl FeatureColumn {
    /// 计算全数据集范围内该特征的 `(min, max)`, 忽略 NaN.
    ///
    /// 若所有取值均为 NaN (或列为空) 则返回 `None`.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self
            .data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .minmax_by(|a, b| a.total_cmp(b))
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }
}

/// 整个数据集的平铺表格: 逐对象记录加若干命名特征列.
///
/// 构造时即校验五条不变量:
///
/// 1. 全局行号恰好取遍 `[0, N)`, 无缺失无重复 (全局 ID 稠密性的来源);
/// 2. 局部标签均为正 (0 预留给背景, 充当对象标签会劫持整帧背景像素);
/// 3. 帧号恰好取遍 `[0, F)` (manifest 按 `frame_0 .. frame_{F-1}` 连续
///    列帧, 稀疏帧号会让 times 序列指向列表之外的帧);
/// 4. 每个特征列长度等于记录数;
/// 5. 最大全局 ID 不超过帧图像可编码上限.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    records: Vec<ObjectRecord>,
    features: Vec<FeatureColumn>,
}

impl ObjectTable {
    /// 从记录与特征列构建表格. 校验失败则返回 `Err`.
    pub fn new(
        records: Vec<ObjectRecord>,
        features: Vec<FeatureColumn>,
    ) -> ConvertResult<ObjectTable> {
        if records.is_empty() {
            return Err(ConvertError::EmptyTable);
        }

        let len = records.len();
        let mut seen = vec![false; len];
        for r in &records {
            let row = r.row as usize;
            if row >= len || seen[row] {
                return Err(ConvertError::RowIndexNotDense { row: r.row, len });
            }
            seen[row] = true;

            if r.local_label == 0 {
                return Err(ConvertError::ZeroLocalLabel { row: r.row });
            }
        }

        let frames: BTreeSet<u32> = records.iter().map(|r| r.frame).collect();
        for (expect, &frame) in frames.iter().enumerate() {
            if frame != expect as u32 {
                return Err(ConvertError::FrameIndexNotDense {
                    frame,
                    len: frames.len(),
                });
            }
        }

        // N 条记录的最大全局 ID 为 N - 1 + ID_OFFSET.
        let max_id = (len - 1) as u32 + ID_OFFSET;
        if max_id > MAX_FRAME_ID {
            return Err(ConvertError::IdOutOfRange {
                id: max_id,
                limit: MAX_FRAME_ID,
            });
        }

        for col in &features {
            if col.data.len() != len {
                return Err(ConvertError::FeatureLenMismatch {
                    name: col.name.clone(),
                    expect: len,
                    got: col.data.len(),
                });
            }
        }

        Ok(ObjectTable { records, features })
    }

    /// 记录总数 `N`.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 表格是否为空. 构造校验保证该值恒为 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 全部记录, 按加载器给出的稳定顺序.
    #[inline]
    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    /// 全部特征列.
    #[inline]
    pub fn features(&self) -> &[FeatureColumn] {
        &self.features
    }

    /// 按帧号分组, 帧号升序.
    pub fn frames(&self) -> BTreeMap<u32, Vec<&ObjectRecord>> {
        let mut groups: BTreeMap<u32, Vec<&ObjectRecord>> = BTreeMap::new();
        for r in &self.records {
            groups.entry(r.frame).or_default().push(r);
        }
        groups
    }

    /// 表格涉及的不同帧数.
    pub fn frame_len(&self) -> usize {
        self.records.iter().map(|r| r.frame).unique().count()
    }
}
