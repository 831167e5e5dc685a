// 缓存模块
// 包含缓存后端、缓存键、缓存数据结构和两级缓存操作

pub mod backend;
pub mod keys;
pub mod models;
pub mod operations;

// 重新导出常用类型，方便其他模块使用
pub use backend::{CacheBackend, CacheError, MemoryCache, RedisCache};
pub use operations::tiered::{CellLookup, TieredCache};
