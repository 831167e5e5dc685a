use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::backend::CacheBackend;
use crate::cache::keys::{arrest_rate_key, facility_key, response_key};
use crate::cache::models::CachedFacility;
use crate::database::{FacilityCategory, FacilityRecord};
use crate::geo::GridCellId;

/// L1 默认过期时间（秒）
pub const L1_CACHE_EXPIRE: u64 = 300;

/// L2 默认过期时间（秒）
pub const L2_CACHE_EXPIRE: u64 = 86_400;

/// 一个类别在九宫格上的 L2 查找结果，命中和未命中都保持窗口顺序
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CellLookup {
    pub hits: Vec<(GridCellId, Vec<FacilityRecord>)>,
    pub misses: Vec<GridCellId>,
}

/// 两级缓存。
///
/// 读失败一律当作未命中，写失败只记日志。
#[derive(Clone)]
pub struct TieredCache {
    backend: Arc<dyn CacheBackend>,
    l1_ttl: Duration,
    l2_ttl: Duration,
}

impl TieredCache {
    pub fn new(backend: Arc<dyn CacheBackend>, l1_ttl: Duration, l2_ttl: Duration) -> Self {
        Self {
            backend,
            l1_ttl,
            l2_ttl,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.get(key).await {
            Ok(Some(json_str)) => match serde_json::from_str::<T>(&json_str) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let json_str = match serde_json::to_string(value) {
            Ok(json_str) => json_str,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry {}: {}", key, e);
                return false;
            }
        };

        match self.backend.set_ex(key, json_str, ttl).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Cache write failed for {}: {}", key, e);
                false
            }
        }
    }

    /// L1: 读取完整分析结果
    pub async fn get_response<T: DeserializeOwned>(
        &self,
        center: &GridCellId,
        radius: u32,
    ) -> Option<T> {
        let key = response_key(center, radius);
        let response = self.get_json(&key).await;
        if response.is_some() {
            tracing::debug!("L1 cache hit: {}", key);
        } else {
            tracing::debug!("L1 cache miss: {}", key);
        }
        response
    }

    /// L1: 尽力写入完整分析结果
    pub async fn put_response<T: Serialize>(
        &self,
        center: &GridCellId,
        radius: u32,
        response: &T,
    ) -> bool {
        let key = response_key(center, radius);
        let written = self.set_json(&key, response, self.l1_ttl).await;
        if written {
            tracing::debug!("Set analysis to L1 cache: {}", key);
        }
        written
    }

    /// L2: 并发探测九宫格中每个格子的缓存
    pub async fn lookup_cells(&self, cells: &[GridCellId], category: FacilityCategory) -> CellLookup {
        let lookups = cells.iter().map(|cell| async move {
            let cached: Option<Vec<CachedFacility>> =
                self.get_json(&facility_key(cell, category)).await;
            (cell.clone(), cached)
        });

        let mut lookup = CellLookup::default();
        for (cell, cached) in join_all(lookups).await {
            match cached {
                Some(facilities) => lookup.hits.push((
                    cell,
                    facilities.into_iter().map(FacilityRecord::from).collect(),
                )),
                None => lookup.misses.push(cell),
            }
        }

        tracing::debug!(
            "L2 lookup {}: {} hits, {} misses",
            category,
            lookup.hits.len(),
            lookup.misses.len()
        );
        lookup
    }

    /// L2: 逐格写回，每个格子独立成功或失败，返回成功写入的格子数
    pub async fn write_back(
        &self,
        category: FacilityCategory,
        fetched: &[(GridCellId, Vec<FacilityRecord>)],
    ) -> usize {
        let writes = fetched.iter().map(|(cell, records)| async move {
            let cached: Vec<CachedFacility> = records.iter().map(CachedFacility::from).collect();
            self.set_json(&facility_key(cell, category), &cached, self.l2_ttl)
                .await
        });

        let written = join_all(writes).await.into_iter().filter(|ok| *ok).count();
        if written < fetched.len() {
            tracing::warn!(
                "L2 write-back for {} stored {}/{} cells",
                category,
                written,
                fetched.len()
            );
        }
        written
    }

    pub async fn get_arrest_rate(&self, district: &str) -> Option<f64> {
        self.get_json(&arrest_rate_key(district)).await
    }

    pub async fn put_arrest_rate(&self, district: &str, rate: f64) -> bool {
        self.set_json(&arrest_rate_key(district), &rate, self.l2_ttl)
            .await
    }

    /// 键是否存在，后端出错时视为不存在
    pub async fn contains(&self, key: &str) -> bool {
        self.backend.exists(key).await.unwrap_or_else(|e| {
            tracing::warn!("Cache EXISTS failed for {}: {}", key, e);
            false
        })
    }

    /// 后端是否可达，健康检查使用
    pub async fn is_reachable(&self) -> bool {
        self.backend.exists("health:ping").await.is_ok()
    }
}
