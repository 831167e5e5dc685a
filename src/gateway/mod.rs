// 外部协作方接口
// 逆地理编码、分类地点搜索、区检举率表

pub mod arrest_rate;
pub mod category;
pub mod kakao;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

pub use arrest_rate::StaticArrestRateTable;
pub use category::{AMENITY_CATEGORIES, AmenityCategory};
pub use kakao::KakaoClient;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("unexpected upstream payload: {0}")]
    Payload(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// 逆地理编码结果: 道路名地址和地番地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub road_address: Option<String>,
    pub lot_address: Option<String>,
}

impl AddressInfo {
    /// 优先用道路名地址，没有时退回地番地址
    pub fn best(&self) -> Option<&str> {
        self.road_address
            .as_deref()
            .or(self.lot_address.as_deref())
    }
}

/// 分类搜索返回的地点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub coordinate: Coordinate,
}

#[async_trait]
pub trait GeocodeGateway: Send + Sync {
    async fn reverse_geocode(&self, coord: Coordinate) -> Result<AddressInfo, GatewayError>;
}

#[async_trait]
pub trait AmenityGateway: Send + Sync {
    async fn search_category(
        &self,
        coord: Coordinate,
        category: &AmenityCategory,
        radius: u32,
    ) -> Result<Vec<Place>, GatewayError>;
}

#[async_trait]
pub trait ArrestRateGateway: Send + Sync {
    /// 没有该区的数据时返回 `Ok(None)`
    async fn arrest_rate(&self, district: &str) -> Result<Option<f64>, GatewayError>;
}
