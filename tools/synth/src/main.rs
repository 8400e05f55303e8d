//! 合成时序数据集生成器.
//!
//! 生成一组 "下落方块" 的分割帧与配套表格, 走一遍真实转换流程,
//! 产出一个可直接被可视化端加载的小数据集, 便于端到端验证.
//!
//! 输出根目录取自环境变量 `SYNTH_OUT_DIR`, 默认为 `./data`.

use tl_berry::prelude::*;

/// 帧数.
const FRAMES: u32 = 5;

/// 每帧的方块 (轨迹) 个数.
const TRACKS: u32 = 4;

/// 帧宽.
const WIDTH: usize = 360;

/// 帧高.
const HEIGHT: usize = 240;

/// 方块格宽.
const CELL: usize = WIDTH / TRACKS as usize;

fn main() -> Result<(), ConvertError> {
    simple_logger::SimpleLogger::new().init().unwrap();

    let out_dir = std::env::var("SYNTH_OUT_DIR").unwrap_or_else(|_| "./data".into());
    log::info!("输出到 `{out_dir}`...");

    let table = build_table()?;
    let frames = (0..FRAMES).map(|i| Ok((i, make_frame(i))));

    convert_dataset(&out_dir, "synthetic", &table, frames, ConvertOptions::default())?;
    update_collection(
        &out_dir,
        CollectionEntry {
            name: "synthetic".into(),
            path: "synthetic".into(),
        },
    )?;
    Ok(())
}

/// 第 `frame` 帧上第 `track` 个方块的质心 `(x, y)`.
///
/// 方块横向按轨迹均匀排列, 纵向随帧线性下落.
fn centroid(track: u32, frame: u32) -> (usize, usize) {
    let t = frame as f64 / (FRAMES - 1) as f64;
    let x = CELL / 2 + track as usize * CELL;
    let y = CELL / 2 + (t * (HEIGHT - CELL) as f64) as usize;
    (x, y)
}

/// 生成第 `frame` 帧的局部标签图. 局部标签为 `track + 1`, 仅帧内唯一.
fn make_frame(frame: u32) -> LabelImg {
    let mut seg = LabelImg::zeros((HEIGHT, WIDTH));
    for track in 0..TRACKS {
        let (cx, cy) = centroid(track, frame);
        let half = CELL / 2;
        for y in (cy - half + 2)..(cy + half - 2) {
            for x in (cx - half + 2)..(cx + half - 2) {
                seg[(y, x)] = track + 1;
            }
        }
    }
    seg
}

/// 生成与帧内容一致的逐对象表格, 行按 (帧, 轨迹) 顺序枚举.
fn build_table() -> ConvertResult<ObjectTable> {
    let mut records = Vec::new();
    let mut area = Vec::new();
    let mut descent = Vec::new();

    for frame in 0..FRAMES {
        for track in 0..TRACKS {
            let (cx, cy) = centroid(track, frame);
            records.push(ObjectRecord {
                local_label: track + 1,
                row: frame * TRACKS + track,
                track: track as i64,
                frame,
                centroid: (cx as f64, cy as f64),
                outlier: false,
            });
            let side = (CELL - 4) as f64;
            area.push(side * side);
            descent.push(cy as f64 - (CELL / 2) as f64);
        }
    }

    let features = vec![
        FeatureColumn {
            name: "面积".into(),
            unit: Some("px²".into()),
            data: area,
        },
        FeatureColumn {
            name: "下落距离".into(),
            unit: Some("px".into()),
            data: descent,
        },
    ];
    ObjectTable::new(records, features)
}
