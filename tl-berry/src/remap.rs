//! 全局 ID 重映射.
//!
//! 分割图中的局部标签仅在单帧内唯一. 本模块按帧构建一张
//! `局部标签 -> 全局 ID` 的查找表 (LUT), 并将整帧像素经 LUT 映射,
//! 得到全数据集唯一、稠密的全局 ID 图.

use crate::consts::{BACKGROUND_ID, UNMAPPED_POLICY, UnmappedPolicy};
use crate::table::ObjectRecord;
use crate::LabelImg;

/// 单帧查找表: `LUT[局部标签] = 全局 ID`.
///
/// 表长为 `max(图像最大标签, 表格最大标签) + 1`; 未被表格引用的下标
/// (包括下标 0, 即背景) 保持 [`BACKGROUND_ID`].
///
/// LUT 是瞬态对象: 每帧重建, 该帧的图像与包围盒更新完成后即丢弃.
#[derive(Debug, Clone)]
pub struct FrameLut {
    map: Vec<u32>,
}

impl FrameLut {
    /// 从当帧的分割图与记录子集构建 LUT.
    ///
    /// 表长同时考虑图像自身的最大标签与表格中的最大标签,
    /// 以抵御分割图与表格不一致的情况.
    pub fn build(seg: &LabelImg, records: &[&ObjectRecord]) -> FrameLut {
        let img_max = seg.iter().copied().max().unwrap_or(0);
        let tab_max = records.iter().map(|r| r.local_label).max().unwrap_or(0);
        let max_label = img_max.max(tab_max);

        let mut map = vec![BACKGROUND_ID; max_label as usize + 1];
        for r in records {
            // 表格构造已拒绝局部标签 0, 这里只防编程错误.
            debug_assert_ne!(r.local_label, 0, "局部标签 0 预留给背景");
            map[r.local_label as usize] = r.global_id();
        }
        FrameLut { map }
    }

    /// 局部标签对应的全局 ID. 未映射标签 (含背景) 返回 [`BACKGROUND_ID`].
    #[inline]
    pub fn global_of(&self, local: u32) -> u32 {
        self.map.get(local as usize).copied().unwrap_or(BACKGROUND_ID)
    }

    /// 表长, 即最大局部标签 + 1.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// 表是否为空. 构造方式保证表长至少为 1.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// 遍历该帧所有非背景全局 ID.
    pub fn iter_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.map.iter().copied().filter(|&id| id != BACKGROUND_ID)
    }

    /// 将整帧分割图经 LUT 映射为全局 ID 图.
    ///
    /// 返回重映射图与被丢弃 (图像中存在、表格未引用, 按
    /// [`UNMAPPED_POLICY`] 映射为背景) 的非零像素个数.
    pub fn apply(&self, seg: &LabelImg) -> (LabelImg, usize) {
        let mut dropped = 0usize;
        let remapped = seg.mapv(|local| {
            let id = self.global_of(local);
            if id == BACKGROUND_ID && local != 0 {
                match UNMAPPED_POLICY {
                    UnmappedPolicy::Drop => dropped += 1,
                }
            }
            id
        });
        (remapped, dropped)
    }
}

/// 对一帧执行完整重映射: 建 LUT, 映射整帧, 报告丢弃像素.
///
/// 局部标签在图像中出现而未被表格引用属于静默数据丢失路径,
/// 按策略降级为警告日志, 不视为致命错误; 反之 (表格引用了图像中
/// 不存在的标签) 只会让该 ID 保留全零包围盒, 无需在此处理.
pub fn remap_frame(seg: &LabelImg, records: &[&ObjectRecord]) -> (LabelImg, FrameLut) {
    let lut = FrameLut::build(seg, records);
    let (remapped, dropped) = lut.apply(seg);
    if dropped > 0 {
        log::warn!("有 {dropped} 个非零像素的局部标签未被当帧表格引用, 已映射为背景");
    }
    (remapped, lut)
}

#[cfg(test)]
mod tests {
    use super::{remap_frame, FrameLut};
    use crate::table::ObjectRecord;
    use crate::LabelImg;
    use ndarray::array;

    fn record(local_label: u32, row: u32) -> ObjectRecord {
        ObjectRecord {
            local_label,
            row,
            track: 0,
            frame: 0,
            centroid: (0.0, 0.0),
            outlier: false,
        }
    }

    /// 背景像素恒映射为 0, 表格引用的标签映射为 `行号 + 1`.
    #[test]
    fn test_remap_basic() {
        let seg: LabelImg = array![[0, 1, 1], [2, 2, 0]];
        let records = [record(1, 4), record(2, 7)];
        let refs: Vec<&ObjectRecord> = records.iter().collect();

        let (remapped, lut) = remap_frame(&seg, &refs);
        assert_eq!(remapped, array![[0, 5, 5], [8, 8, 0]]);
        assert_eq!(lut.global_of(0), 0);
        assert_eq!(lut.global_of(1), 5);
        assert_eq!(lut.global_of(2), 8);
        assert_eq!(lut.len(), 3);
    }

    /// 图像中存在、表格未引用的标签被整体抹除 (Drop 策略).
    #[test]
    fn test_unmapped_label_dropped() {
        let seg: LabelImg = array![[3, 3, 0], [0, 1, 0]];
        let records = [record(1, 0)];
        let refs: Vec<&ObjectRecord> = records.iter().collect();

        let lut = FrameLut::build(&seg, &refs);
        let (remapped, dropped) = lut.apply(&seg);
        assert_eq!(dropped, 2);
        assert_eq!(remapped, array![[0, 0, 0], [0, 1, 0]]);
    }

    /// 表格引用的标签可以大于图像最大标签 (分割图/表格不一致防御).
    #[test]
    fn test_table_label_beyond_image_max() {
        let seg: LabelImg = array![[0, 1]];
        let records = [record(1, 0), record(9, 1)];
        let refs: Vec<&ObjectRecord> = records.iter().collect();

        let lut = FrameLut::build(&seg, &refs);
        assert_eq!(lut.len(), 10);
        assert_eq!(lut.global_of(9), 2);

        let (remapped, dropped) = lut.apply(&seg);
        assert_eq!(dropped, 0);
        assert_eq!(remapped, array![[0, 1]]);
    }

    /// 空记录集: 整帧全部降为背景 (并触发丢弃警告日志).
    #[test]
    fn test_remap_no_records() {
        simple_logger::SimpleLogger::new().init().ok();
        let seg: LabelImg = array![[5, 0], [0, 5]];
        let (remapped, lut) = remap_frame(&seg, &[]);
        assert!(remapped.iter().all(|&p| p == 0));
        assert_eq!(lut.iter_ids().count(), 0);
    }

    /// 全零图像: LUT 仅含背景项, 不会 panic.
    #[test]
    fn test_remap_empty_image() {
        let seg: LabelImg = LabelImg::zeros((0, 0));
        let (remapped, lut) = remap_frame(&seg, &[]);
        assert_eq!(remapped.len(), 0);
        assert_eq!(lut.len(), 1);
    }

    /// 重映射后全局 ID 集合与表格记录一一对应 (稠密性在帧内的体现).
    #[test]
    fn test_remapped_ids_match_table() {
        let seg: LabelImg = array![[1, 2, 3], [3, 2, 1]];
        let records = [record(1, 0), record(2, 1), record(3, 2)];
        let refs: Vec<&ObjectRecord> = records.iter().collect();

        let (remapped, lut) = remap_frame(&seg, &refs);
        let mut ids: Vec<u32> = lut.iter_ids().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
        for (&pix, &src) in remapped.iter().zip(seg.iter()) {
            assert_eq!(pix, lut.global_of(src));
        }
    }
}
