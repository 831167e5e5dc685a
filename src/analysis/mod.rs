// 位置分析
// 九宫格邻近查询 + 多源编排 + 评分

pub mod district;
pub mod model;
pub mod orchestrator;
pub mod proximity;
pub mod scoring;

use std::fmt;
use std::str::FromStr;

pub use model::{AnalysisRequest, AnalysisResponse, AnalysisStatus, PoliceOffice, Section};
pub use orchestrator::{Gateways, HealthReport, LocationAnalysisOrchestrator};
pub use proximity::{ProximityReport, ProximitySearch};

/// 各阶段的执行方式，阶段逻辑本身与策略无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStrategy {
    /// 阶段依次执行
    #[default]
    Sequential,
    /// 地址、设施、邻近查询并发执行，区安全信息在地址之后
    Concurrent,
}

impl FromStr for AnalysisStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(AnalysisStrategy::Sequential),
            "concurrent" => Ok(AnalysisStrategy::Concurrent),
            other => Err(format!("unknown analysis strategy: {}", other)),
        }
    }
}

impl fmt::Display for AnalysisStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisStrategy::Sequential => f.write_str("sequential"),
            AnalysisStrategy::Concurrent => f.write_str("concurrent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strategy_names() {
        assert_eq!("sequential".parse(), Ok(AnalysisStrategy::Sequential));
        assert_eq!("Concurrent".parse(), Ok(AnalysisStrategy::Concurrent));
        assert!("parallel".parse::<AnalysisStrategy>().is_err());
    }
}
