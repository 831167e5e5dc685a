// 设施实体
// 派出所、CCTV 等设施点，由外部批处理写入，本服务只读

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::geo::{Coordinate, GridCellId, SpatialGrid, grid::GridError};

/// 设施类别，对应 facilities.category 列和 L2 缓存键的最后一段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityCategory {
    Police,
    Cctv,
}

impl FacilityCategory {
    pub const ALL: [FacilityCategory; 2] = [FacilityCategory::Police, FacilityCategory::Cctv];

    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityCategory::Police => "police",
            FacilityCategory::Cctv => "cctv",
        }
    }
}

impl fmt::Display for FacilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacilityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "police" => Ok(FacilityCategory::Police),
            "cctv" => Ok(FacilityCategory::Cctv),
            other => Err(format!("unknown facility category: {}", other)),
        }
    }
}

/// 设施表实体，对应数据库中的 facilities 表
#[derive(Debug, Clone, FromRow)]
pub struct FacilityEntity {
    /// 地址（自然键）
    pub address: String,
    /// 类别
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    /// 写入时预先计算的格子 ID
    pub cell_id: String,
    /// CCTV 点位的摄像头数量
    pub camera_count: Option<i32>,
    /// 批处理刷新时间
    pub refreshed_at: DateTime<Utc>,
}

/// 设施记录（领域模型）
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRecord {
    pub address: String,
    pub category: FacilityCategory,
    pub coordinate: Coordinate,
    pub cell_id: GridCellId,
    pub camera_count: Option<u32>,
}

impl FacilityRecord {
    /// 按共享网格精度给设施打格子标签，写入方必须通过这里生成记录
    pub fn tagged(
        address: impl Into<String>,
        category: FacilityCategory,
        coordinate: Coordinate,
        camera_count: Option<u32>,
        grid: &SpatialGrid,
    ) -> Result<Self, GridError> {
        Ok(Self {
            address: address.into(),
            category,
            coordinate,
            cell_id: grid.encode(coordinate)?,
            camera_count,
        })
    }

    /// 摄像头数量，非 CCTV 设施或缺失时按 1 计
    pub fn cameras(&self) -> u32 {
        self.camera_count.unwrap_or(1)
    }
}

impl TryFrom<FacilityEntity> for FacilityRecord {
    type Error = String;

    fn try_from(entity: FacilityEntity) -> Result<Self, Self::Error> {
        let category = entity.category.parse()?;
        let camera_count = entity
            .camera_count
            .map(|count| u32::try_from(count).map_err(|_| format!("negative camera count for {}", entity.address)))
            .transpose()?;

        Ok(Self {
            address: entity.address,
            category,
            coordinate: Coordinate::new(entity.latitude, entity.longitude),
            cell_id: GridCellId::from(entity.cell_id),
            camera_count,
        })
    }
}
