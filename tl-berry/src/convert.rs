//! 逐帧顺序转换驱动.
//!
//! 单线程、按帧号升序的完整转换流程. 包围盒表是无同步的共享可变状态,
//! 因此帧处理严格串行; 任何一帧失败都会中止整个转换, 而不是产出
//! 缺帧的数据集 (manifest 无法表达缺帧).

use crate::remap::remap_frame;
use crate::stack::rescale_nearest;
use crate::table::ObjectTable;
use crate::writer::DatasetWriter;
use crate::{ConvertError, ConvertResult, LabelImg};
use std::path::Path;
use std::time::Instant;

/// 转换选项.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// 空间缩放因子, 同时作用于标签图与质心坐标. 1.0 为原始尺寸.
    pub scale: f64,

    /// 是否写出帧图像与包围盒.
    ///
    /// 置 `false` 时仅重写特征序列与 manifest, 用于在既有数据集上
    /// 增量更新表格数据; 此时 manifest 的工件存在性检查会要求帧图像
    /// 与 bounds.json 已由先前的运行写出.
    pub write_frames: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            scale: 1.0,
            write_frames: true,
        }
    }
}

/// 执行一次完整的数据集转换.
///
/// `frames` 为外部帧源: 按帧号 `0, 1, 2, ...` 升序给出每帧的二维
/// 局部标签图 (三维 z-stack 应预先经 [`crate::stack`] 投影展平).
/// 表格的帧号必须与帧源一致.
///
/// 流程: 逐帧 (缩放 → 重映射 → 包围盒更新 + 断点续存 → 图像编码写出)
/// → 特征/元数据序列 → manifest. 每帧记录耗时日志, manifest 写出后
/// 发出完成信号日志.
pub fn convert_dataset<P, I>(
    parent: P,
    dataset: &str,
    table: &ObjectTable,
    frames: I,
    opts: ConvertOptions,
) -> ConvertResult<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = ConvertResult<(u32, LabelImg)>>,
{
    let mut writer = DatasetWriter::create(parent, dataset, table.len(), opts.scale)?;
    let groups = table.frames();

    if opts.write_frames {
        log::info!("开始处理 {} 帧...", table.frame_len());
        let mut written = 0usize;

        for item in frames {
            let (frame_index, seg) = item?;
            let begin = Instant::now();

            let seg = rescale_nearest(&seg, opts.scale);

            let empty = Vec::new();
            let records = groups.get(&frame_index).unwrap_or(&empty);
            if records.is_empty() {
                log::warn!("第 {frame_index} 帧在表格中没有任何记录");
            }

            let (remapped, _lut) = remap_frame(&seg, records);
            writer.write_frame(frame_index, &remapped)?;
            written += 1;

            log::info!(
                "第 {frame_index} 帧处理完成, 耗时 {:5.2} 秒.",
                begin.elapsed().as_secs_f64()
            );
        }

        if written != table.frame_len() {
            return Err(ConvertError::FrameCountMismatch {
                expect: table.frame_len(),
                got: written,
            });
        }
    }

    writer.write_tables(table)?;
    writer.write_manifest(table)?;
    log::info!("数据集 `{dataset}` 写出完成.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{convert_dataset, ConvertOptions};
    use crate::consts::filename;
    use crate::encode::decode_id;
    use crate::table::{FeatureColumn, ObjectRecord, ObjectTable};
    use crate::{ConvertError, ConvertResult, LabelImg};
    use ndarray::array;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::{Path, PathBuf};

    fn temp_parent(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tl-berry-{tag}-{}", std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// 2 帧 × 2 对象. 局部标签在两帧间重复, 这正是重映射要解决的情况.
    fn table() -> ObjectTable {
        let mut records = Vec::new();
        for frame in 0..2u32 {
            for local in 1..=2u32 {
                records.push(ObjectRecord {
                    local_label: local,
                    row: frame * 2 + local - 1,
                    track: local as i64,
                    frame,
                    centroid: (local as f64, frame as f64),
                    outlier: false,
                });
            }
        }
        let volume = FeatureColumn {
            name: "体积".into(),
            unit: None,
            data: vec![1.0, 2.0, 3.0, 4.0],
        };
        ObjectTable::new(records, vec![volume]).unwrap()
    }

    fn frame_source() -> Vec<ConvertResult<(u32, LabelImg)>> {
        vec![
            Ok((0, array![[1, 1, 0], [0, 2, 2]])),
            Ok((1, array![[2, 0, 0], [1, 1, 0]])),
        ]
    }

    fn json_at(path: &Path) -> serde_json::Value {
        serde_json::from_reader(fs::File::open(path).unwrap()).unwrap()
    }

    /// 端到端: 全数据集各工件中出现的全局 ID 恰好为 {1, ..., N}.
    #[test]
    fn test_end_to_end_id_density() {
        simple_logger::SimpleLogger::new().init().ok();
        let parent = temp_parent("e2e");
        let table = table();
        convert_dataset(&parent, "demo", &table, frame_source(), ConvertOptions::default())
            .unwrap();

        let dir = parent.join("demo");
        let n = table.len() as u32;

        // 帧图像中的非零 ID 集合.
        let mut seen: BTreeSet<u32> = BTreeSet::new();
        for i in 0..2u32 {
            let img = image::open(dir.join(filename::frame(i))).unwrap().to_rgba8();
            for px in img.pixels() {
                let id = decode_id(px.0);
                assert!(id <= n);
                if id != 0 {
                    seen.insert(id);
                }
            }
        }
        let expect: BTreeSet<u32> = (1..=n).collect();
        assert_eq!(seen, expect);

        // 序列长度与记录数一致.
        for name in [filename::TRACKS, filename::TIMES, filename::OUTLIERS] {
            let v = json_at(&dir.join(name));
            assert_eq!(v["data"].as_array().unwrap().len(), n as usize);
        }
        let centroids = json_at(&dir.join(filename::CENTROIDS));
        assert_eq!(centroids["data"].as_array().unwrap().len(), 2 * n as usize);
        let bounds = json_at(&dir.join(filename::BOUNDS));
        assert_eq!(
            bounds["data"].as_array().unwrap().len(),
            4 * (n as usize + 1)
        );
        let feature = json_at(&dir.join(filename::feature(0)));
        assert_eq!(feature["data"].as_array().unwrap().len(), n as usize);
        assert_eq!(feature["min"], 1.0);
        assert_eq!(feature["max"], 4.0);

        // manifest 最后写出且完整.
        let m = json_at(&dir.join(filename::MANIFEST));
        assert_eq!(m["frames"].as_array().unwrap().len(), 2);
        fs::remove_dir_all(&parent).unwrap();
    }

    /// 包围盒包含性: 每个 ID 的全部像素都在其盒内, 四边均有触及.
    #[test]
    fn test_end_to_end_bbox_containment() {
        let parent = temp_parent("e2e-bbox");
        let table = table();
        convert_dataset(&parent, "demo", &table, frame_source(), ConvertOptions::default())
            .unwrap();

        let dir = parent.join("demo");
        let bounds = json_at(&dir.join(filename::BOUNDS));
        let data: Vec<u64> = bounds["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect();

        for i in 0..2u32 {
            let img = image::open(dir.join(filename::frame(i))).unwrap().to_rgba8();
            let mut ids = BTreeSet::new();
            for (x, y, px) in img.enumerate_pixels() {
                let id = decode_id(px.0) as usize;
                if id == 0 {
                    continue;
                }
                ids.insert(id);
                let (x, y) = (x as u64, y as u64);
                assert!((data[4 * id]..=data[4 * id + 2]).contains(&x));
                assert!((data[4 * id + 1]..=data[4 * id + 3]).contains(&y));
            }
            for id in ids {
                let on_edge = |pred: &dyn Fn(u64, u64) -> bool| {
                    img.enumerate_pixels()
                        .any(|(x, y, px)| decode_id(px.0) as usize == id && pred(x as u64, y as u64))
                };
                assert!(on_edge(&|x, _| x == data[4 * id]));
                assert!(on_edge(&|_, y| y == data[4 * id + 1]));
                assert!(on_edge(&|x, _| x == data[4 * id + 2]));
                assert!(on_edge(&|_, y| y == data[4 * id + 3]));
            }
        }

        // 保留位 0 恒为全零.
        assert_eq!(&data[..4], &[0, 0, 0, 0]);
        fs::remove_dir_all(&parent).unwrap();
    }

    /// 帧源少于表格帧数: 转换必须失败, 不得产出缺帧数据集.
    #[test]
    fn test_missing_frame_aborts() {
        let parent = temp_parent("missing-frame");
        let table = table();
        let short: Vec<ConvertResult<(u32, LabelImg)>> =
            vec![Ok((0, array![[1, 2]]))];

        let err =
            convert_dataset(&parent, "demo", &table, short, ConvertOptions::default())
                .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::FrameCountMismatch { expect: 2, got: 1 }
        ));
        // manifest 不存在, 下游视为数据集不完整.
        assert!(!parent.join("demo").join(filename::MANIFEST).exists());
        // 但已处理帧的断点工件保持合法.
        assert!(parent.join("demo").join(filename::BOUNDS).is_file());
        assert!(parent.join("demo").join(filename::frame(0)).is_file());
        fs::remove_dir_all(&parent).unwrap();
    }

    /// 帧源报错会原样中止转换.
    #[test]
    fn test_frame_load_error_aborts() {
        let parent = temp_parent("frame-load");
        let table = table();
        let failing: Vec<ConvertResult<(u32, LabelImg)>> = vec![
            Ok((0, array![[1, 2]])),
            Err(ConvertError::FrameLoad {
                frame: 1,
                detail: "文件不存在".into(),
            }),
        ];

        assert!(matches!(
            convert_dataset(&parent, "demo", &table, failing, ConvertOptions::default())
                .unwrap_err(),
            ConvertError::FrameLoad { frame: 1, .. }
        ));
        fs::remove_dir_all(&parent).unwrap();
    }

    /// noframes 模式: 在已有帧工件的数据集上仅重写序列与 manifest.
    #[test]
    fn test_tables_only_rerun() {
        let parent = temp_parent("noframes");
        let table = table();
        convert_dataset(&parent, "demo", &table, frame_source(), ConvertOptions::default())
            .unwrap();

        // 第二次运行不再写帧.
        let no_frames: Vec<ConvertResult<(u32, LabelImg)>> = vec![];
        let opts = ConvertOptions {
            write_frames: false,
            ..Default::default()
        };
        convert_dataset(&parent, "demo", &table, no_frames, opts).unwrap();
        assert!(parent.join("demo").join(filename::MANIFEST).is_file());
        fs::remove_dir_all(&parent).unwrap();
    }

    /// noframes 模式在空目录上必须失败: manifest 不得引用缺失工件.
    #[test]
    fn test_tables_only_fresh_dir_fails() {
        let parent = temp_parent("noframes-fresh");
        let table = table();
        let no_frames: Vec<ConvertResult<(u32, LabelImg)>> = vec![];
        let opts = ConvertOptions {
            write_frames: false,
            ..Default::default()
        };

        assert!(matches!(
            convert_dataset(&parent, "demo", &table, no_frames, opts).unwrap_err(),
            ConvertError::MissingArtifact(_)
        ));
        fs::remove_dir_all(&parent).unwrap();
    }

    /// 缩放因子作用于帧图像尺寸.
    #[test]
    fn test_scale_applies_to_frames() {
        let parent = temp_parent("scaled");
        let mut records = Vec::new();
        for local in 1..=2u32 {
            records.push(ObjectRecord {
                local_label: local,
                row: local - 1,
                track: local as i64,
                frame: 0,
                centroid: (0.0, 0.0),
                outlier: false,
            });
        }
        let table = ObjectTable::new(records, vec![]).unwrap();

        let source: Vec<ConvertResult<(u32, LabelImg)>> = vec![Ok((
            0,
            array![
                [1, 1, 2, 2],
                [1, 1, 2, 2],
                [1, 1, 2, 2],
                [1, 1, 2, 2],
            ],
        ))];
        let opts = ConvertOptions {
            scale: 0.5,
            ..Default::default()
        };
        convert_dataset(&parent, "demo", &table, source, opts).unwrap();

        let img = image::open(parent.join("demo").join(filename::frame(0))).unwrap();
        assert_eq!(img.to_rgba8().dimensions(), (2, 2));
        fs::remove_dir_all(&parent).unwrap();
    }
}
