//! 多数据集 `collection.json` 索引维护.

use super::json::CollectionEntry;
use crate::consts::filename;
use crate::ConvertResult;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// 以按名 upsert 语义更新 `root` 目录下的 `collection.json`.
///
/// 文件不存在则新建; 已存在同名条目则整体替换, 否则追加到末尾.
/// 其余条目保持原有顺序不变.
pub fn update_collection<P: AsRef<Path>>(root: P, entry: CollectionEntry) -> ConvertResult<()> {
    let path = root.as_ref().join(filename::COLLECTION);

    let mut entries: Vec<CollectionEntry> = if path.is_file() {
        serde_json::from_reader(File::open(&path)?)?
    } else {
        Vec::new()
    };

    match entries.iter_mut().find(|e| e.name == entry.name) {
        Some(slot) => *slot = entry,
        None => entries.push(entry),
    }

    let file = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(file, &entries)?;
    Ok(())
}

/// 读取 `root` 目录下的 `collection.json`. 文件不存在视为空 collection.
pub fn load_collection<P: AsRef<Path>>(root: P) -> ConvertResult<Vec<CollectionEntry>> {
    let path = root.as_ref().join(filename::COLLECTION);
    if !path.is_file() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_reader(File::open(&path)?)?)
}
