use sqlx::FromRow;

/// 区检举率实体，对应数据库中的 arrest_rates 表
#[derive(Debug, Clone, FromRow)]
pub struct ArrestRateEntity {
    /// 区名（例如 "중구"）
    pub district: String,
    /// 检举率 0.0 ~ 1.0
    pub rate: f64,
}
