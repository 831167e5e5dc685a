/// 缓存操作
/// 两级缓存（L1 完整结果 / L2 格子设施列表）

pub mod tiered;

// 重新导出常用操作
pub use tiered::{CellLookup, TieredCache};
