//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, LabelImg};

pub use crate::consts::{
    BACKGROUND_ID, ID_OFFSET, MAX_BBOX_COORD, MAX_FRAME_ID, UNMAPPED_POLICY,
};

pub use crate::consts::filename;

pub use crate::error::{ConvertError, ConvertResult};

pub use crate::table::{FeatureColumn, ObjectRecord, ObjectTable};

pub use crate::bbox::BboxTable;
pub use crate::remap::{remap_frame, FrameLut};

pub use crate::encode::{decode_id, encode_id, encode_rgba, ImgWriteId};

pub use crate::stack::{project_max, project_min, rescale_nearest};

pub use crate::convert::{convert_dataset, ConvertOptions};
pub use crate::writer::{
    load_collection, update_collection, CollectionEntry, DatasetWriter, FeatureUnits, Manifest,
};
