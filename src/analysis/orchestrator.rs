// 位置分析编排
// 四个阶段: 逆地理编码、周边设施、派出所/CCTV 邻近查询、区安全信息
// 只有邻近查询（空间存储）失败会让整个请求失败，其余上游缺失时降级为 unavailable

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::cache::TieredCache;
use crate::database::{FacilityCategory, FacilityStore};
use crate::error::AppError;
use crate::gateway::{
    AMENITY_CATEGORIES, AddressInfo, AmenityCategory, AmenityGateway, ArrestRateGateway,
    GatewayError, GeocodeGateway, Place,
};
use crate::geo::{Coordinate, GridCellId, SpatialGrid, distance_meters};

use super::AnalysisStrategy;
use super::district::{extract_district, population_of};
use super::model::{
    AmenityOutcome, AmenitySummary, AnalysisRequest, AnalysisResponse, AnalysisStatus,
    ArrestRateFigure, ConvenienceReport, DistrictSafety, PlaceSummary, PoliceOffice,
    SafetyReport, Section,
};
use super::proximity::{ProximityReport, ProximitySearch};
use super::scoring::{self, WarningInputs};

/// 每个分类最多返回的地点数
const MAX_PLACES_PER_CATEGORY: usize = 15;

/// 外部协作方
#[derive(Clone)]
pub struct Gateways {
    pub geocoder: Arc<dyn GeocodeGateway>,
    pub amenities: Arc<dyn AmenityGateway>,
    pub arrest_rates: Arc<dyn ArrestRateGateway>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub cache_reachable: bool,
    pub grid_precision: usize,
    pub strategy: String,
}

/// 各阶段的产出
struct StageResults {
    address: Section<AddressInfo>,
    amenities: Section<Vec<AmenitySummary>>,
    proximity: Result<ProximityReport, AppError>,
    district: Section<DistrictSafety>,
}

pub struct LocationAnalysisOrchestrator {
    grid: SpatialGrid,
    cache: TieredCache,
    store: Arc<dyn FacilityStore>,
    proximity: ProximitySearch,
    gateways: Gateways,
    strategy: AnalysisStrategy,
    gateway_timeout: Duration,
}

impl LocationAnalysisOrchestrator {
    pub fn new(
        grid: SpatialGrid,
        cache: TieredCache,
        store: Arc<dyn FacilityStore>,
        gateways: Gateways,
        strategy: AnalysisStrategy,
        gateway_timeout: Duration,
    ) -> Self {
        let proximity = ProximitySearch::new(cache.clone(), store.clone());
        Self {
            grid,
            cache,
            store,
            proximity,
            gateways,
            strategy,
            gateway_timeout,
        }
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn strategy(&self) -> AnalysisStrategy {
        self.strategy
    }

    /// 完整的位置分析
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AppError> {
        request.validate()?;

        let origin = request.coordinate();
        let radius = request.radius;
        let window = self.grid.neighbors9(origin)?;

        if let Some(cached) = self
            .cache
            .get_response::<AnalysisResponse>(window.center(), radius)
            .await
        {
            tracing::info!("Serving analysis for {} from L1 cache", window.center());
            return Ok(cached);
        }

        let stages = match self.strategy {
            AnalysisStrategy::Sequential => {
                let address = self.resolve_address(origin).await;
                let amenities = self.collect_amenities(origin, radius).await;
                let proximity = self
                    .proximity
                    .nearby(&window, origin, radius)
                    .await
                    .map_err(AppError::from);
                let district = self.district_safety(&address).await;
                StageResults {
                    address,
                    amenities,
                    proximity,
                    district,
                }
            }
            AnalysisStrategy::Concurrent => {
                let address_then_district = async {
                    let address = self.resolve_address(origin).await;
                    let district = self.district_safety(&address).await;
                    (address, district)
                };
                let ((address, district), amenities, proximity) = tokio::join!(
                    address_then_district,
                    self.collect_amenities(origin, radius),
                    self.proximity.nearby(&window, origin, radius),
                );
                StageResults {
                    address,
                    amenities,
                    proximity: proximity.map_err(AppError::from),
                    district,
                }
            }
        };

        let proximity = stages.proximity.inspect_err(|e| {
            tracing::error!("Proximity lookup failed for {}: {}", window.center(), e);
        })?;

        let response = assemble(
            request,
            window.center().clone(),
            stages.address,
            stages.amenities,
            proximity,
            stages.district,
        );

        tracing::info!(
            "Analysis for {} (radius {}m): status {:?}, safety {}, convenience {}",
            window.center(),
            radius,
            response.analysis_status,
            response.safety.score,
            response.convenience.score
        );

        // 只缓存完整结果，部分结果下次重新尝试上游
        if response.analysis_status == AnalysisStatus::Success {
            self.cache
                .put_response(window.center(), radius, &response)
                .await;
        }

        Ok(response)
    }

    /// 全部派出所，存储中一个都没有时返回 NotFound
    pub async fn police_offices(&self) -> Result<Vec<PoliceOffice>, AppError> {
        let records = self.store.find_all(FacilityCategory::Police).await?;
        if records.is_empty() {
            return Err(AppError::NotFound("no police offices registered".into()));
        }
        Ok(records
            .into_iter()
            .map(|record| PoliceOffice {
                address: record.address,
                latitude: record.coordinate.latitude,
                longitude: record.coordinate.longitude,
            })
            .collect())
    }

    /// 抽样检查存储中的 cell_id 是否与当前精度一致，返回检查的记录数
    pub async fn verify_grid_consistency(&self, sample_size: i64) -> Result<usize, AppError> {
        let sample = self.store.sample(sample_size).await?;

        let drifted: Vec<String> = sample
            .iter()
            .filter(|record| !self.grid.is_consistent(record.coordinate, &record.cell_id))
            .map(|record| format!("{} ({})", record.address, record.cell_id))
            .collect();

        if !drifted.is_empty() {
            return Err(AppError::Internal(format!(
                "{} of {} sampled facilities have cell ids that do not match precision {}: {}",
                drifted.len(),
                sample.len(),
                self.grid.precision(),
                drifted.join(", ")
            )));
        }

        Ok(sample.len())
    }

    pub async fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok".into(),
            cache_reachable: self.cache.is_reachable().await,
            grid_precision: self.grid.precision(),
            strategy: self.strategy.to_string(),
        }
    }

    /// 给上游调用加超时，超时按错误处理
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        tokio::time::timeout(self.gateway_timeout, call)
            .await
            .unwrap_or(Err(GatewayError::Timeout(self.gateway_timeout)))
    }

    async fn resolve_address(&self, origin: Coordinate) -> Section<AddressInfo> {
        match self
            .bounded(self.gateways.geocoder.reverse_geocode(origin))
            .await
        {
            Ok(address) if address.best().is_some() => Section::Present(address),
            Ok(_) => {
                tracing::warn!("Reverse geocoding returned no address");
                Section::Unavailable
            }
            Err(e) => {
                tracing::warn!("Reverse geocoding unavailable: {}", e);
                Section::Unavailable
            }
        }
    }

    async fn collect_amenities(&self, origin: Coordinate, radius: u32) -> Section<Vec<AmenitySummary>> {
        let summaries = match self.strategy {
            AnalysisStrategy::Sequential => {
                let mut summaries = Vec::with_capacity(AMENITY_CATEGORIES.len());
                for category in AMENITY_CATEGORIES.iter() {
                    summaries.push(self.amenity_summary(origin, category, radius).await);
                }
                summaries
            }
            AnalysisStrategy::Concurrent => {
                join_all(
                    AMENITY_CATEGORIES
                        .iter()
                        .map(|category| self.amenity_summary(origin, category, radius)),
                )
                .await
            }
        };

        let unavailable = summaries
            .iter()
            .filter(|summary| summary.outcome == AmenityOutcome::Unavailable)
            .count();

        if unavailable == 0 {
            Section::Present(summaries)
        } else if unavailable == summaries.len() {
            Section::Unavailable
        } else {
            Section::Partial(summaries)
        }
    }

    async fn amenity_summary(
        &self,
        origin: Coordinate,
        category: &AmenityCategory,
        radius: u32,
    ) -> AmenitySummary {
        let outcome = match self
            .bounded(self.gateways.amenities.search_category(origin, category, radius))
            .await
        {
            Ok(places) => summarize_places(origin, places, radius),
            Err(e) => {
                tracing::warn!("Amenity search for {} unavailable: {}", category.code, e);
                AmenityOutcome::Unavailable
            }
        };

        AmenitySummary {
            code: category.code.to_string(),
            name: category.name.to_string(),
            outcome,
        }
    }

    /// 从地址中提取区名并查询检举率，先查缓存
    async fn district_safety(&self, address: &Section<AddressInfo>) -> Section<DistrictSafety> {
        let Some(district) = address
            .data()
            .and_then(|info| info.best())
            .and_then(extract_district)
        else {
            return Section::Unavailable;
        };

        if let Some(rate) = self.cache.get_arrest_rate(district).await {
            return Section::Present(DistrictSafety {
                district: district.to_string(),
                arrest_rate: ArrestRateFigure::Known(rate),
            });
        }

        match self
            .bounded(self.gateways.arrest_rates.arrest_rate(district))
            .await
        {
            Ok(Some(rate)) => {
                self.cache.put_arrest_rate(district, rate).await;
                Section::Present(DistrictSafety {
                    district: district.to_string(),
                    arrest_rate: ArrestRateFigure::Known(rate),
                })
            }
            Ok(None) => Section::Present(DistrictSafety {
                district: district.to_string(),
                arrest_rate: ArrestRateFigure::Unknown,
            }),
            Err(e) => {
                tracing::warn!("Arrest rate for {} unavailable: {}", district, e);
                Section::Partial(DistrictSafety {
                    district: district.to_string(),
                    arrest_rate: ArrestRateFigure::Unknown,
                })
            }
        }
    }
}

/// 按真实距离过滤并排序一个分类的地点
fn summarize_places(origin: Coordinate, places: Vec<Place>, radius: u32) -> AmenityOutcome {
    let mut within: Vec<PlaceSummary> = places
        .into_iter()
        .map(|place| (distance_meters(origin, place.coordinate), place))
        .filter(|(distance, _)| *distance <= f64::from(radius))
        .map(|(distance, place)| PlaceSummary {
            name: place.name,
            latitude: place.coordinate.latitude,
            longitude: place.coordinate.longitude,
            distance: distance.round() as u32,
        })
        .collect();
    within.sort_by_key(|place| place.distance);

    let count = within.len();
    let closest_distance = within.first().map(|place| place.distance);
    within.truncate(MAX_PLACES_PER_CATEGORY);

    AmenityOutcome::Available {
        count,
        closest_distance,
        places: within,
    }
}

fn assemble(
    request: AnalysisRequest,
    center_cell: GridCellId,
    address: Section<AddressInfo>,
    amenities: Section<Vec<AmenitySummary>>,
    proximity: ProximityReport,
    district: Section<DistrictSafety>,
) -> AnalysisResponse {
    let arrest_rate = district.data().and_then(|d| d.arrest_rate.known());
    let population = population_of(district.data().map(|d| d.district.as_str()));
    let amenity_list: &[AmenitySummary] = amenities.data().map(Vec::as_slice).unwrap_or(&[]);

    let safety = scoring::safety_score(proximity.nearest_police.as_ref(), &proximity.cctv, arrest_rate);
    let convenience = scoring::convenience_score(amenity_list, population);
    let scores = scoring::combine(safety, convenience);

    let mut unavailable_sections: Vec<&str> = Vec::new();
    if address.is_unavailable() {
        unavailable_sections.push("주소");
    }
    if amenities.is_unavailable() {
        unavailable_sections.push("편의시설");
    }
    unavailable_sections.extend(
        amenity_list
            .iter()
            .filter(|summary| summary.outcome == AmenityOutcome::Unavailable)
            .map(|summary| summary.name.as_str()),
    );
    if !district.is_present() {
        unavailable_sections.push("지역 치안");
    }

    let recommendations = scoring::recommendations(&scores, amenity_list);
    let warnings = scoring::warnings(&WarningInputs {
        scores: &scores,
        nearest_police: proximity.nearest_police.as_ref(),
        cctv: &proximity.cctv,
        arrest_rate,
        unavailable_sections: &unavailable_sections,
    });

    let analysis_status = if address.is_present() && amenities.is_present() && district.is_present() {
        AnalysisStatus::Success
    } else {
        AnalysisStatus::Partial
    };

    AnalysisResponse {
        analysis_status,
        coordinate: request.coordinate(),
        radius: request.radius,
        center_cell,
        analyzed_at: Utc::now(),
        address,
        safety: SafetyReport {
            score: scoring::rounded(scores.safety),
            nearest_police: proximity.nearest_police,
            cctv: proximity.cctv,
            district,
        },
        convenience: ConvenienceReport {
            score: scoring::rounded(scores.convenience),
            amenities,
        },
        overall_score: scoring::rounded(scores.overall),
        recommendations,
        warnings,
    }
}
