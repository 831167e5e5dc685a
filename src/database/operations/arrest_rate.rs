use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::arrest_rate::ArrestRateEntity;
use crate::gateway::{ArrestRateGateway, GatewayError};

/// 基于 arrest_rates 表的区检举率查询
#[derive(Clone)]
pub struct PgArrestRateTable {
    pool: PgPool,
}

impl PgArrestRateTable {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArrestRateGateway for PgArrestRateTable {
    async fn arrest_rate(&self, district: &str) -> Result<Option<f64>, GatewayError> {
        let entity = sqlx::query_as::<_, ArrestRateEntity>(
            r#"
            SELECT district, rate
            FROM arrest_rates
            WHERE district = $1
            "#,
        )
        .bind(district)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entity.map(|e| e.rate))
    }
}
