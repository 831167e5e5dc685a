use serde::Deserialize;

use crate::analysis::AnalysisRequest;
use crate::error::AppError;

// 位置分析请求体，字段缺失时给出明确的校验错误
#[derive(Debug, Deserialize)]
pub struct LocationAnalysisBody {
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius: Option<u32>,
}

impl TryFrom<LocationAnalysisBody> for AnalysisRequest {
    type Error = AppError;

    fn try_from(body: LocationAnalysisBody) -> Result<Self, Self::Error> {
        let missing = |field: &str| AppError::Validation(format!("missing {} parameter", field));

        let request = AnalysisRequest {
            latitude: body.latitude.ok_or_else(|| missing("latitude"))?,
            longitude: body.longitude.ok_or_else(|| missing("longitude"))?,
            radius: body.radius.ok_or_else(|| missing("radius"))?,
        };
        request.validate()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_named() {
        let body: LocationAnalysisBody =
            serde_json::from_str(r#"{"latitude": 37.5665, "radius": 500}"#).unwrap();
        let err = AnalysisRequest::try_from(body).unwrap_err();
        assert_eq!(err.to_string(), "missing longitude parameter");
    }

    #[test]
    fn complete_body_converts() {
        let body: LocationAnalysisBody =
            serde_json::from_str(r#"{"latitude": 37.5665, "longitude": 126.978, "radius": 500}"#)
                .unwrap();
        let request = AnalysisRequest::try_from(body).unwrap();
        assert_eq!(request.radius, 500);
    }
}
