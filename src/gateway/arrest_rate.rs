use std::collections::HashMap;

use async_trait::async_trait;

use super::{ArrestRateGateway, GatewayError};

/// 内存中的区检举率表，数据库不可用或本地运行时使用
#[derive(Debug, Clone, Default)]
pub struct StaticArrestRateTable {
    rates: HashMap<String, f64>,
}

impl StaticArrestRateTable {
    pub fn new(rates: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ArrestRateGateway for StaticArrestRateTable {
    async fn arrest_rate(&self, district: &str) -> Result<Option<f64>, GatewayError> {
        Ok(self.rates.get(district).copied())
    }
}
