// 九宫格邻近查询
// L2 探测 -> 只查询未命中的格子 -> 逐格写回 -> 按真实距离过滤

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::try_join;

use crate::cache::TieredCache;
use crate::database::{FacilityCategory, FacilityRecord, FacilityStore, StoreError};
use crate::geo::{Coordinate, GridCellId, NineBlock, distance_meters};

use super::model::{CctvSite, CctvSummary, NearestFacility};

/// 一次邻近查询的结果
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityReport {
    pub nearest_police: Option<NearestFacility>,
    pub cctv: CctvSummary,
}

#[derive(Clone)]
pub struct ProximitySearch {
    cache: TieredCache,
    store: Arc<dyn FacilityStore>,
}

impl ProximitySearch {
    pub fn new(cache: TieredCache, store: Arc<dyn FacilityStore>) -> Self {
        Self { cache, store }
    }

    /// 取回九宫格内某一类别的全部候选，按窗口顺序合并。
    ///
    /// 每个类别最多一次存储查询；没有未命中的格子时不访问存储。
    pub async fn load_window(
        &self,
        window: &NineBlock,
        category: FacilityCategory,
    ) -> Result<Vec<FacilityRecord>, StoreError> {
        let lookup = self.cache.lookup_cells(window.cells(), category).await;

        let mut by_cell: HashMap<GridCellId, Vec<FacilityRecord>> =
            lookup.hits.into_iter().collect();

        if !lookup.misses.is_empty() {
            let fetched = self.store.find_by_cells(&lookup.misses, category).await?;
            tracing::debug!(
                "Store returned {} {} records for {} missing cells",
                fetched.len(),
                category,
                lookup.misses.len()
            );

            let grouped = group_by_cell(&lookup.misses, fetched);
            self.cache.write_back(category, &grouped).await;
            by_cell.extend(grouped);
        }

        Ok(window
            .cells()
            .iter()
            .filter_map(|cell| by_cell.remove(cell))
            .flatten()
            .collect())
    }

    /// 派出所和 CCTV 的邻近信息
    pub async fn nearby(
        &self,
        window: &NineBlock,
        origin: Coordinate,
        radius: u32,
    ) -> Result<ProximityReport, StoreError> {
        let (police, cctv) = try_join(
            self.load_window(window, FacilityCategory::Police),
            self.load_window(window, FacilityCategory::Cctv),
        )
        .await?;

        let nearest_police = match nearest_facility(origin, &police, radius) {
            Some(nearest) => Some(nearest),
            None => {
                // 九宫格内没有派出所，退回到不受格子限制的最近查询
                let fallback = self
                    .store
                    .find_nearest(origin, FacilityCategory::Police, 1)
                    .await?;
                tracing::debug!(
                    "No police post in window {}, fallback found {}",
                    window.center(),
                    fallback.len()
                );
                nearest_facility(origin, &fallback, radius)
            }
        };

        Ok(ProximityReport {
            nearest_police,
            cctv: cctv_summary(origin, &cctv, radius),
        })
    }
}

/// 把一次 IN 查询的结果按格子分组，没有数据的格子得到空列表
fn group_by_cell(
    misses: &[GridCellId],
    fetched: Vec<FacilityRecord>,
) -> Vec<(GridCellId, Vec<FacilityRecord>)> {
    let mut grouped: Vec<(GridCellId, Vec<FacilityRecord>)> =
        misses.iter().map(|cell| (cell.clone(), Vec::new())).collect();

    for record in fetched {
        match grouped.iter_mut().find(|(cell, _)| *cell == record.cell_id) {
            Some((_, records)) => records.push(record),
            None => tracing::warn!(
                "Store returned {} outside requested cells ({})",
                record.address,
                record.cell_id
            ),
        }
    }
    grouped
}

fn rounded_meters(distance: f64) -> u32 {
    distance.round() as u32
}

/// 候选中的最近设施，报告真实距离并标记是否在半径内
pub fn nearest_facility(
    origin: Coordinate,
    candidates: &[FacilityRecord],
    radius: u32,
) -> Option<NearestFacility> {
    candidates
        .iter()
        .map(|record| (record, distance_meters(origin, record.coordinate)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(record, distance)| NearestFacility {
            address: record.address.clone(),
            latitude: record.coordinate.latitude,
            longitude: record.coordinate.longitude,
            distance: rounded_meters(distance),
            within_radius: distance <= f64::from(radius),
        })
}

/// 半径内的 CCTV 点位，按距离排序
pub fn cctv_summary(origin: Coordinate, candidates: &[FacilityRecord], radius: u32) -> CctvSummary {
    let mut sites: Vec<(f64, &FacilityRecord)> = candidates
        .iter()
        .map(|record| (distance_meters(origin, record.coordinate), record))
        .filter(|(distance, _)| *distance <= f64::from(radius))
        .collect();
    sites.sort_by(|(a, _), (b, _)| a.total_cmp(b));

    let sites: Vec<CctvSite> = sites
        .into_iter()
        .map(|(distance, record)| CctvSite {
            address: record.address.clone(),
            latitude: record.coordinate.latitude,
            longitude: record.coordinate.longitude,
            camera_count: record.cameras(),
            distance: rounded_meters(distance),
        })
        .collect();

    CctvSummary {
        site_count: sites.len(),
        camera_count: sites.iter().map(|site| site.camera_count).sum(),
        sites,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::geo::SpatialGrid;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// 记录查询次数的内存存储
    #[derive(Default)]
    struct CountingStore {
        records: Vec<FacilityRecord>,
        cell_queries: AtomicUsize,
        nearest_queries: AtomicUsize,
    }

    impl CountingStore {
        fn with(records: Vec<FacilityRecord>) -> Self {
            Self {
                records,
                ..Default::default()
            }
        }

        fn cell_queries(&self) -> usize {
            self.cell_queries.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FacilityStore for CountingStore {
        async fn find_by_cells(
            &self,
            cells: &[GridCellId],
            category: FacilityCategory,
        ) -> Result<Vec<FacilityRecord>, StoreError> {
            self.cell_queries.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .records
                .iter()
                .filter(|r| r.category == category && cells.contains(&r.cell_id))
                .cloned()
                .collect())
        }

        async fn find_nearest(
            &self,
            coord: Coordinate,
            category: FacilityCategory,
            limit: i64,
        ) -> Result<Vec<FacilityRecord>, StoreError> {
            self.nearest_queries.fetch_add(1, Ordering::SeqCst);
            let mut matching: Vec<FacilityRecord> = self
                .records
                .iter()
                .filter(|r| r.category == category)
                .cloned()
                .collect();
            matching.sort_by(|a, b| {
                distance_meters(coord, a.coordinate).total_cmp(&distance_meters(coord, b.coordinate))
            });
            matching.truncate(limit as usize);
            Ok(matching)
        }

        async fn find_all(&self, category: FacilityCategory) -> Result<Vec<FacilityRecord>, StoreError> {
            Ok(self.records.iter().filter(|r| r.category == category).cloned().collect())
        }

        async fn sample(&self, limit: i64) -> Result<Vec<FacilityRecord>, StoreError> {
            Ok(self.records.iter().take(limit as usize).cloned().collect())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl FacilityStore for FailingStore {
        async fn find_by_cells(
            &self,
            _cells: &[GridCellId],
            _category: FacilityCategory,
        ) -> Result<Vec<FacilityRecord>, StoreError> {
            Err(StoreError::Decode("connection reset".into()))
        }

        async fn find_nearest(
            &self,
            _coord: Coordinate,
            _category: FacilityCategory,
            _limit: i64,
        ) -> Result<Vec<FacilityRecord>, StoreError> {
            Err(StoreError::Decode("connection reset".into()))
        }

        async fn find_all(&self, _category: FacilityCategory) -> Result<Vec<FacilityRecord>, StoreError> {
            Err(StoreError::Decode("connection reset".into()))
        }

        async fn sample(&self, _limit: i64) -> Result<Vec<FacilityRecord>, StoreError> {
            Err(StoreError::Decode("connection reset".into()))
        }
    }

    const SEOUL: Coordinate = Coordinate {
        latitude: 37.5665,
        longitude: 126.9780,
    };

    fn grid() -> SpatialGrid {
        SpatialGrid::default()
    }

    fn record(address: &str, category: FacilityCategory, lat: f64, lon: f64, cameras: Option<u32>) -> FacilityRecord {
        FacilityRecord::tagged(address, category, Coordinate::new(lat, lon), cameras, &grid()).unwrap()
    }

    fn search(store: Arc<dyn FacilityStore>, l2_ttl: Duration) -> ProximitySearch {
        let cache = TieredCache::new(Arc::new(MemoryCache::new()), Duration::from_secs(300), l2_ttl);
        ProximitySearch::new(cache, store)
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_l2() {
        let police = record("세종대로 파출소", FacilityCategory::Police, 37.5670, 126.9785, None);
        let store = Arc::new(CountingStore::with(vec![police.clone()]));
        let search = search(store.clone(), Duration::from_secs(600));
        let window = grid().neighbors9(SEOUL).unwrap();

        let first = search.load_window(&window, FacilityCategory::Police).await.unwrap();
        assert_eq!(first, vec![police.clone()]);
        assert_eq!(store.cell_queries(), 1);

        let second = search.load_window(&window, FacilityCategory::Police).await.unwrap();
        assert_eq!(second, vec![police]);
        assert_eq!(store.cell_queries(), 1);
    }

    #[tokio::test]
    async fn empty_cells_are_cached_too() {
        let store = Arc::new(CountingStore::default());
        let search = search(store.clone(), Duration::from_secs(600));
        let window = grid().neighbors9(SEOUL).unwrap();

        assert!(search.load_window(&window, FacilityCategory::Cctv).await.unwrap().is_empty());
        assert!(search.load_window(&window, FacilityCategory::Cctv).await.unwrap().is_empty());
        assert_eq!(store.cell_queries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_l2_entry_queries_store_again() {
        let police = record("세종대로 파출소", FacilityCategory::Police, 37.5670, 126.9785, None);
        let store = Arc::new(CountingStore::with(vec![police]));
        let search = search(store.clone(), Duration::from_secs(1));
        let window = grid().neighbors9(SEOUL).unwrap();

        search.load_window(&window, FacilityCategory::Police).await.unwrap();
        search.load_window(&window, FacilityCategory::Police).await.unwrap();
        assert_eq!(store.cell_queries(), 1);

        tokio::time::advance(Duration::from_millis(1001)).await;

        search.load_window(&window, FacilityCategory::Police).await.unwrap();
        assert_eq!(store.cell_queries(), 2);
    }

    #[tokio::test]
    async fn nearest_police_outside_window_uses_fallback() {
        // 约 600m 以北，超出 7 位精度的九宫格
        let far = record("먼 파출소", FacilityCategory::Police, 37.5719, 126.9780, None);
        let store = Arc::new(CountingStore::with(vec![far]));
        let search = search(store.clone(), Duration::from_secs(600));
        let window = grid().neighbors9(SEOUL).unwrap();

        let report = search.nearby(&window, SEOUL, 100).await.unwrap();
        let nearest = report.nearest_police.unwrap();
        assert!((595..=606).contains(&nearest.distance), "{}", nearest.distance);
        assert!(!nearest.within_radius);
        assert_eq!(store.nearest_queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_failure_is_propagated() {
        let search = search(Arc::new(FailingStore), Duration::from_secs(600));
        let window = grid().neighbors9(SEOUL).unwrap();
        assert!(search.nearby(&window, SEOUL, 500).await.is_err());
    }

    #[test]
    fn cctv_summary_filters_by_radius_and_sums_cameras() {
        let sites = vec![
            record("A", FacilityCategory::Cctv, 37.5670, 126.9785, Some(4)),
            record("B", FacilityCategory::Cctv, 37.5666, 126.9781, Some(2)),
            record("C", FacilityCategory::Cctv, 37.5719, 126.9780, Some(9)),
        ];
        let summary = cctv_summary(SEOUL, &sites, 500);
        assert_eq!(summary.site_count, 2);
        assert_eq!(summary.camera_count, 6);
        assert_eq!(summary.sites[0].address, "B");
        assert_eq!(summary.sites[1].distance, 71);
    }

    #[test]
    fn nearest_facility_reports_true_distance() {
        let candidates = vec![
            record("near", FacilityCategory::Police, 37.5670, 126.9785, None),
            record("far", FacilityCategory::Police, 37.5719, 126.9780, None),
        ];
        let nearest = nearest_facility(SEOUL, &candidates, 500).unwrap();
        assert_eq!(nearest.address, "near");
        assert_eq!(nearest.distance, 71);
        assert!(nearest.within_radius);
        assert!(nearest_facility(SEOUL, &[], 500).is_none());
    }

    #[test]
    fn grouping_keeps_empty_cells() {
        let cells = vec![GridCellId::from("wydm9qy"), GridCellId::from("wydm9rn")];
        let in_center = record("A", FacilityCategory::Police, 37.5670, 126.9785, None);
        let grouped = group_by_cell(&cells, vec![in_center.clone()]);
        assert_eq!(grouped[0], (cells[0].clone(), vec![in_center]));
        assert_eq!(grouped[1], (cells[1].clone(), Vec::new()));
    }
}
