use serde::Serialize;

/// 地点搜索 API 的分类组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AmenityCategory {
    pub code: &'static str,
    pub name: &'static str,
}

impl AmenityCategory {
    pub const fn new(code: &'static str, name: &'static str) -> Self {
        Self { code, name }
    }

    pub fn by_code(code: &str) -> Option<&'static AmenityCategory> {
        AMENITY_CATEGORIES.iter().find(|c| c.code == code)
    }
}

/// 固定的 15 个便利设施分类
pub const AMENITY_CATEGORIES: [AmenityCategory; 15] = [
    AmenityCategory::new("SW8", "지하철역"),
    AmenityCategory::new("CS2", "편의점"),
    AmenityCategory::new("FD6", "음식점"),
    AmenityCategory::new("CE7", "카페"),
    AmenityCategory::new("MT1", "대형마트"),
    AmenityCategory::new("BK9", "은행"),
    AmenityCategory::new("PO3", "공공기관"),
    AmenityCategory::new("CT1", "문화시설"),
    AmenityCategory::new("HP8", "병원"),
    AmenityCategory::new("PM9", "약국"),
    AmenityCategory::new("PK6", "주차장"),
    AmenityCategory::new("OL7", "주유소"),
    AmenityCategory::new("SC4", "학교"),
    AmenityCategory::new("AC5", "학원"),
    AmenityCategory::new("AT4", "관광명소"),
];
