/// 缓存键模块
/// 键格式统一为 "{用途}:{格子ID}[:{类别}]"

// 位置分析缓存键模块
pub mod analysis_keys;

// 重新导出常用的键生成函数
pub use analysis_keys::{arrest_rate_key, facility_key, response_key};
