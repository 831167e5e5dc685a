use serde::{Deserialize, Serialize};

use crate::database::{FacilityCategory, FacilityRecord};
use crate::geo::{Coordinate, GridCellId};

/// L2 中缓存的设施数据模型，与存储中的记录逐字段对应
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedFacility {
    pub address: String,
    pub category: FacilityCategory,
    pub latitude: f64,
    pub longitude: f64,
    pub cell_id: GridCellId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_count: Option<u32>,
}

impl From<&FacilityRecord> for CachedFacility {
    fn from(record: &FacilityRecord) -> Self {
        Self {
            address: record.address.clone(),
            category: record.category,
            latitude: record.coordinate.latitude,
            longitude: record.coordinate.longitude,
            cell_id: record.cell_id.clone(),
            camera_count: record.camera_count,
        }
    }
}

impl From<CachedFacility> for FacilityRecord {
    fn from(cached: CachedFacility) -> Self {
        Self {
            address: cached.address,
            category: cached.category,
            coordinate: Coordinate::new(cached.latitude, cached.longitude),
            cell_id: cached.cell_id,
            camera_count: cached.camera_count,
        }
    }
}
