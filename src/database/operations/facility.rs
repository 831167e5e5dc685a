// 设施存储库
// 所有九宫格查询都走 cell_id 索引，不做全表扫描

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::facility::{FacilityCategory, FacilityEntity, FacilityRecord};
use crate::geo::{Coordinate, GridCellId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid facility row: {0}")]
    Decode(String),
}

/// 设施存储，空间查询的权威数据源
#[async_trait]
pub trait FacilityStore: Send + Sync {
    /// 一次 IN 查询取回给定格子内某一类别的全部设施；没有匹配时返回空列表
    async fn find_by_cells(
        &self,
        cells: &[GridCellId],
        category: FacilityCategory,
    ) -> Result<Vec<FacilityRecord>, StoreError>;

    /// 不受格子限制的最近设施，九宫格内没有候选时使用
    async fn find_nearest(
        &self,
        coord: Coordinate,
        category: FacilityCategory,
        limit: i64,
    ) -> Result<Vec<FacilityRecord>, StoreError>;

    async fn find_all(&self, category: FacilityCategory) -> Result<Vec<FacilityRecord>, StoreError>;

    /// 抽样若干条记录，用于启动时的精度一致性检查
    async fn sample(&self, limit: i64) -> Result<Vec<FacilityRecord>, StoreError>;
}

/// 基于 PostgreSQL 的设施存储
#[derive(Clone)]
pub struct PgFacilityStore {
    pool: PgPool,
}

impl PgFacilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_records(entities: Vec<FacilityEntity>) -> Result<Vec<FacilityRecord>, StoreError> {
    entities
        .into_iter()
        .map(|entity| FacilityRecord::try_from(entity).map_err(StoreError::Decode))
        .collect()
}

#[async_trait]
impl FacilityStore for PgFacilityStore {
    async fn find_by_cells(
        &self,
        cells: &[GridCellId],
        category: FacilityCategory,
    ) -> Result<Vec<FacilityRecord>, StoreError> {
        if cells.is_empty() {
            return Ok(Vec::new());
        }

        let cell_ids: Vec<String> = cells.iter().map(|c| c.as_str().to_string()).collect();

        let entities = sqlx::query_as::<_, FacilityEntity>(
            r#"
            SELECT address, category, latitude, longitude, cell_id, camera_count, refreshed_at
            FROM facilities
            WHERE cell_id = ANY($1) AND category = $2
            "#,
        )
        .bind(&cell_ids)
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            "Fetched {} {} rows for {} cells",
            entities.len(),
            category,
            cell_ids.len()
        );

        into_records(entities)
    }

    async fn find_nearest(
        &self,
        coord: Coordinate,
        category: FacilityCategory,
        limit: i64,
    ) -> Result<Vec<FacilityRecord>, StoreError> {
        // 经度差按纬度余弦缩放后的平面近似排序，精确距离由调用方计算
        let lon_scale = coord.latitude.to_radians().cos();

        let entities = sqlx::query_as::<_, FacilityEntity>(
            r#"
            SELECT address, category, latitude, longitude, cell_id, camera_count, refreshed_at
            FROM facilities
            WHERE category = $1
            ORDER BY
                (latitude - $2) * (latitude - $2)
                + ((longitude - $3) * $4) * ((longitude - $3) * $4)
            LIMIT $5
            "#,
        )
        .bind(category.as_str())
        .bind(coord.latitude)
        .bind(coord.longitude)
        .bind(lon_scale)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_records(entities)
    }

    async fn find_all(&self, category: FacilityCategory) -> Result<Vec<FacilityRecord>, StoreError> {
        let entities = sqlx::query_as::<_, FacilityEntity>(
            r#"
            SELECT address, category, latitude, longitude, cell_id, camera_count, refreshed_at
            FROM facilities
            WHERE category = $1
            ORDER BY address
            "#,
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_records(entities)
    }

    async fn sample(&self, limit: i64) -> Result<Vec<FacilityRecord>, StoreError> {
        let entities = sqlx::query_as::<_, FacilityEntity>(
            r#"
            SELECT address, category, latitude, longitude, cell_id, camera_count, refreshed_at
            FROM facilities
            ORDER BY refreshed_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_records(entities)
    }
}
