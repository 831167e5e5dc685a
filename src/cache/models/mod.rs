/// 缓存数据模型
/// 定义缓存数据的结构体

// 设施缓存模型
pub mod facility;

// 重新导出常用类型
pub use facility::CachedFacility;
