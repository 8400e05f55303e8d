//! 包围盒增量累积.
//!
//! 全数据集共享一张包围盒表, 在转换期间由本结构独占可变地持有,
//! 随帧处理增量填充. 表项以 `(min_x, min_y, max_x, max_y)` 的 x, y
//! 顺序存储, 尽管标签图本身按行主序 `(y, x)` 组织.

use crate::consts::{filename, BACKGROUND_ID, MAX_BBOX_COORD};
use crate::writer::json::DataJson;
use crate::{ConvertError, ConvertResult, LabelImg};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// 每个全局 ID 占用的表项数.
const STRIDE: usize = 4;

/// 全数据集包围盒表.
///
/// 分配一次, 大小为 `(N + 1) * 4` (下标 0 预留给背景, 永远保持全零),
/// 零初始化后逐帧填充. 从未在任何帧中出现的 ID 保持 `(0, 0, 0, 0)`.
///
/// 每条记录只属于一帧, 因此每个全局 ID 的包围盒恰好由其所属帧写出一次;
/// "累积" 发生在不同 ID 之间, 而非对同一 ID 的反复合并. 若同一 ID
/// 意外地出现在多帧, 后处理的帧直接覆盖前者.
#[derive(Debug, Clone)]
pub struct BboxTable {
    data: Vec<u16>,
}

impl BboxTable {
    /// 为 `record_count` 条记录分配全零包围盒表.
    pub fn new(record_count: usize) -> BboxTable {
        BboxTable {
            data: vec![0; (record_count + 1) * STRIDE],
        }
    }

    /// 表覆盖的 ID 个数 (含背景位).
    #[inline]
    pub fn id_len(&self) -> usize {
        self.data.len() / STRIDE
    }

    /// 平铺表项: `(min_x, min_y, max_x, max_y)` 交错.
    #[inline]
    pub fn as_slice(&self) -> &[u16] {
        &self.data
    }

    /// 全局 ID 对应的 `(min_x, min_y, max_x, max_y)`. ID 越界返回 `None`.
    pub fn get(&self, id: u32) -> Option<[u16; 4]> {
        let at = id as usize * STRIDE;
        let slot = self.data.get(at..at + STRIDE)?;
        Some([slot[0], slot[1], slot[2], slot[3]])
    }

    /// 用一帧重映射图更新包围盒表.
    ///
    /// 对帧中出现的每个非背景全局 ID, 求其全部像素的行列极值并按
    /// `(x, y)` 顺序写入对应表项. 坐标超出 `u16` 上限或 ID 超出表范围
    /// 均为致命错误, 绝不静默回绕.
    pub fn update_frame(&mut self, remapped: &LabelImg) -> ConvertResult<()> {
        // (min_h, min_w, max_h, max_w), 行主序极值.
        let mut extents: HashMap<u32, [usize; 4]> = HashMap::new();

        for ((h, w), &id) in remapped.indexed_iter() {
            if id == BACKGROUND_ID {
                continue;
            }
            extents
                .entry(id)
                .and_modify(|e| {
                    e[0] = e[0].min(h);
                    e[1] = e[1].min(w);
                    e[2] = e[2].max(h);
                    e[3] = e[3].max(w);
                })
                .or_insert([h, w, h, w]);
        }

        for (id, [min_h, min_w, max_h, max_w]) in extents {
            let at = id as usize * STRIDE;
            if at + STRIDE > self.data.len() {
                return Err(ConvertError::IdOutOfRange {
                    id,
                    limit: self.id_len() as u32 - 1,
                });
            }
            for coord in [max_h, max_w] {
                if coord > MAX_BBOX_COORD {
                    return Err(ConvertError::CoordOutOfRange {
                        coord,
                        limit: MAX_BBOX_COORD,
                    });
                }
            }
            // 行列极值转为 (x, y) 顺序.
            self.data[at] = min_w as u16;
            self.data[at + 1] = min_h as u16;
            self.data[at + 2] = max_w as u16;
            self.data[at + 3] = max_h as u16;
        }
        Ok(())
    }

    /// 将整张表落盘为 `bounds.json`.
    ///
    /// 转换驱动在每帧处理完后都会调用一次, 以便中断的运行也能留下
    /// 可独立加载的包围盒文件. 这是有意的断点续存行为.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> ConvertResult<()> {
        let path = dir.as_ref().join(filename::BOUNDS);
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer(file, &DataJson { data: &self.data })?;
        Ok(())
    }
}
