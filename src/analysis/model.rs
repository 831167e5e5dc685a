// 位置分析请求与响应
// 响应中每个部分都带有可用性标记

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::gateway::AddressInfo;
use crate::geo::{Coordinate, GridCellId};

pub const MIN_RADIUS: u32 = 100;
pub const MAX_RADIUS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// 分析半径（米）
    pub radius: u32,
}

impl AnalysisRequest {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AppError::Validation(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AppError::Validation(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            )));
        }
        if !(MIN_RADIUS..=MAX_RADIUS).contains(&self.radius) {
            return Err(AppError::Validation(format!(
                "radius must be between {} and {} meters, got {}",
                MIN_RADIUS, MAX_RADIUS, self.radius
            )));
        }
        Ok(())
    }
}

/// 一个响应部分的可用性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Present(T),
    Partial(T),
    Unavailable,
}

impl<T> Section<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Present(data) | Section::Partial(data) => Some(data),
            Section::Unavailable => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Section::Present(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Section::Unavailable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// 所有部分都完整
    Success,
    /// 至少一个上游缺失或不完整
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis_status: AnalysisStatus,
    pub coordinate: Coordinate,
    pub radius: u32,
    pub center_cell: GridCellId,
    pub analyzed_at: DateTime<Utc>,
    pub address: Section<AddressInfo>,
    pub safety: SafetyReport,
    pub convenience: ConvenienceReport,
    pub overall_score: u32,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub score: u32,
    /// 没有任何派出所时为 None
    pub nearest_police: Option<NearestFacility>,
    pub cctv: CctvSummary,
    pub district: Section<DistrictSafety>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestFacility {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// 真实距离（米，四舍五入），即使超出请求半径
    pub distance: u32,
    pub within_radius: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CctvSummary {
    pub site_count: usize,
    pub camera_count: u32,
    pub sites: Vec<CctvSite>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CctvSite {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub camera_count: u32,
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictSafety {
    pub district: String,
    pub arrest_rate: ArrestRateFigure,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "rate", rename_all = "snake_case")]
pub enum ArrestRateFigure {
    Known(f64),
    Unknown,
}

impl ArrestRateFigure {
    pub fn known(&self) -> Option<f64> {
        match self {
            ArrestRateFigure::Known(rate) => Some(*rate),
            ArrestRateFigure::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvenienceReport {
    pub score: u32,
    pub amenities: Section<Vec<AmenitySummary>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmenitySummary {
    pub code: String,
    pub name: String,
    pub outcome: AmenityOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AmenityOutcome {
    Available {
        count: usize,
        closest_distance: Option<u32>,
        places: Vec<PlaceSummary>,
    },
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance: u32,
}

/// 地图初始视图使用的派出所信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliceOffice {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}
