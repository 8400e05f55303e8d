//! 数据集写出会话.
//!
//! [`DatasetWriter`] 在一次转换期间独占持有输出目录与包围盒表,
//! 依次写出帧图像 (附带包围盒断点续存)、特征/元数据序列, 最后写出
//! manifest. manifest 只在全部被引用工件落盘之后才允许写出.

use crate::bbox::BboxTable;
use crate::consts::filename;
use crate::encode::ImgWriteId;
use crate::table::ObjectTable;
use crate::{ConvertError, ConvertResult, LabelImg};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub(crate) mod json;

mod collection;

pub use collection::{load_collection, update_collection};
pub use json::{CollectionEntry, FeatureUnits, Manifest};

use json::{DataJson, RangedJson};

/// 单个数据集的写出会话.
#[derive(Debug)]
pub struct DatasetWriter {
    dir: PathBuf,
    scale: f64,
    bbox: BboxTable,
    next_frame: u32,
}

impl DatasetWriter {
    /// 在 `parent` 下为数据集 `dataset` 创建输出目录并初始化会话.
    ///
    /// `record_count` 决定包围盒表的尺寸 (`(N + 1) * 4`);
    /// `scale` 为质心坐标共用的空间缩放因子.
    ///
    /// # Panics
    ///
    /// `scale` 非有限正数时 panic.
    pub fn create<P: AsRef<Path>>(
        parent: P,
        dataset: &str,
        record_count: usize,
        scale: f64,
    ) -> ConvertResult<DatasetWriter> {
        assert!(
            scale.is_finite() && scale > 0.0,
            "缩放因子必须为有限正数, 但传入了 `{scale}`"
        );
        let dir = parent.as_ref().join(dataset);
        fs::create_dir_all(&dir)?;

        Ok(DatasetWriter {
            dir,
            scale,
            bbox: BboxTable::new(record_count),
            next_frame: 0,
        })
    }

    /// 数据集输出目录.
    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 当前包围盒表 (只读).
    #[inline]
    pub fn bbox(&self) -> &BboxTable {
        &self.bbox
    }

    /// 已写出的帧数.
    #[inline]
    pub fn frames_written(&self) -> u32 {
        self.next_frame
    }

    /// 写出一帧: 更新包围盒表并落盘一次, 再编码保存帧图像.
    ///
    /// 帧必须严格按 `0, 1, 2, ...` 的顺序写出, 乱序或跳帧返回
    /// [`ConvertError::NonContiguousFrame`] — manifest 格式无法表达
    /// 缺帧, 这里不允许产生空洞.
    pub fn write_frame(&mut self, frame_index: u32, remapped: &LabelImg) -> ConvertResult<()> {
        if frame_index != self.next_frame {
            return Err(ConvertError::NonContiguousFrame {
                expect: self.next_frame,
                got: frame_index,
            });
        }

        self.bbox.update_frame(remapped)?;
        // 每帧落盘一次, 中断的运行也能留下合法的 bounds.json.
        self.bbox.save(&self.dir)?;
        remapped.save_id(self.dir.join(filename::frame(frame_index)))?;

        self.next_frame += 1;
        Ok(())
    }

    /// 写出全部逐对象序列: 离群标志、轨迹、时刻、质心与各特征.
    ///
    /// 所有序列与表格记录同序、同长. 质心按 `x0, y0, x1, y1, ...`
    /// 交错, 每个坐标乘以缩放因子后向零截断为整数. 特征序列的
    /// min/max 忽略 NaN; 全 NaN 的特征是错误.
    pub fn write_tables(&mut self, table: &ObjectTable) -> ConvertResult<()> {
        let records = table.records();

        log::info!("写出 {}...", filename::OUTLIERS);
        let outliers: Vec<bool> = records.iter().map(|r| r.outlier).collect();
        // 声明范围恒为 {false, true}, 与实际取值无关.
        self.save_json(
            filename::OUTLIERS,
            &RangedJson {
                data: &outliers,
                min: false,
                max: true,
            },
        )?;

        log::info!("写出 {}...", filename::TRACKS);
        let tracks: Vec<i64> = records.iter().map(|r| r.track).collect();
        self.save_json(filename::TRACKS, &DataJson { data: &tracks })?;

        log::info!("写出 {}...", filename::TIMES);
        let times: Vec<u32> = records.iter().map(|r| r.frame).collect();
        self.save_json(filename::TIMES, &DataJson { data: &times })?;

        log::info!("写出 {}...", filename::CENTROIDS);
        let centroids: Vec<i64> = records
            .iter()
            .flat_map(|r| {
                let (x, y) = r.centroid;
                [(x * self.scale).trunc() as i64, (y * self.scale).trunc() as i64]
            })
            .collect();
        self.save_json(filename::CENTROIDS, &DataJson { data: &centroids })?;

        log::info!("写出特征序列...");
        for (i, col) in table.features().iter().enumerate() {
            let (min, max) = col
                .range()
                .ok_or_else(|| ConvertError::FeatureAllNan(col.name.clone()))?;
            self.save_json(
                &filename::feature(i),
                &RangedJson {
                    data: &col.data,
                    min,
                    max,
                },
            )?;
        }
        log::info!("特征序列写出完毕.");
        Ok(())
    }

    /// 写出 manifest. 必须放在最后调用.
    ///
    /// 写出前逐一确认被引用工件已存在于磁盘, 任何缺失都是错误 —
    /// 绝不发布指向缺失文件的 manifest. 帧数取自表格分组
    /// (而非本会话写出的帧数), 以支持仅重写特征的增量运行.
    ///
    /// 单位元数据只在 **每个** 特征都具备单位时写出; 只有部分特征
    /// 具备单位时整体丢弃并告警, 绝不部分写出.
    pub fn write_manifest(&mut self, table: &ObjectTable) -> ConvertResult<()> {
        let frames: Vec<String> = (0..table.frame_len() as u32)
            .map(filename::frame)
            .collect();

        let mut features = BTreeMap::new();
        for (i, col) in table.features().iter().enumerate() {
            features.insert(col.name.clone(), filename::feature(i));
        }

        let with_units = table
            .features()
            .iter()
            .filter(|c| c.unit.is_some())
            .count();
        let feature_metadata = if with_units == table.features().len() && with_units > 0 {
            Some(
                table
                    .features()
                    .iter()
                    .filter_map(|c| {
                        let units = c.unit.clone()?;
                        Some((c.name.clone(), FeatureUnits { units }))
                    })
                    .collect(),
            )
        } else {
            if with_units > 0 {
                log::warn!(
                    "只有 {with_units}/{} 个特征具备单位元数据, 整体丢弃",
                    table.features().len()
                );
            }
            None
        };

        let manifest = Manifest {
            frames,
            features,
            feature_metadata,
            outliers: filename::OUTLIERS.into(),
            tracks: filename::TRACKS.into(),
            times: filename::TIMES.into(),
            centroids: filename::CENTROIDS.into(),
            bounds: filename::BOUNDS.into(),
        };

        self.check_artifacts(&manifest)?;
        self.save_json(filename::MANIFEST, &manifest)?;
        Ok(())
    }

    /// 确认 manifest 引用的每个文件都已存在.
    fn check_artifacts(&self, manifest: &Manifest) -> ConvertResult<()> {
        let referenced = manifest
            .frames
            .iter()
            .chain(manifest.features.values())
            .chain([
                &manifest.outliers,
                &manifest.tracks,
                &manifest.times,
                &manifest.centroids,
                &manifest.bounds,
            ]);
        for name in referenced {
            if !self.dir.join(name).is_file() {
                return Err(ConvertError::MissingArtifact(name.clone()));
            }
        }
        Ok(())
    }

    fn save_json<T: Serialize>(&self, name: &str, payload: &T) -> ConvertResult<()> {
        let file = BufWriter::new(File::create(self.dir.join(name))?);
        serde_json::to_writer(file, payload)?;
        Ok(())
    }
}
