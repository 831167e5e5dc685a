use crate::database::FacilityCategory;
use crate::geo::GridCellId;

/// L1: 完整分析结果缓存键前缀
const RESPONSE_PREFIX: &str = "analysis:";

/// L2: 单个格子单个类别的设施列表缓存键前缀
const FACILITY_PREFIX: &str = "facility:";

/// 区检举率缓存键前缀
const ARREST_RATE_PREFIX: &str = "arrest_rate:";

/// 生成 L1 缓存键（中心格 + 半径）
pub fn response_key(center: &GridCellId, radius: u32) -> String {
    format!("{}{}:{}", RESPONSE_PREFIX, center, radius)
}

/// 生成 L2 缓存键
pub fn facility_key(cell: &GridCellId, category: FacilityCategory) -> String {
    format!("{}{}:{}", FACILITY_PREFIX, cell, category)
}

/// 生成区检举率缓存键
pub fn arrest_rate_key(district: &str) -> String {
    format!("{}{}", ARREST_RATE_PREFIX, district)
}
