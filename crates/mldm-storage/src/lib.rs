//! # 存储模块
//!
//! 负责数据目录中的文件枚举、复制以及快照归档。

pub mod snapshot;
pub mod storage;

pub use snapshot::*;
pub use storage::*;
