// 安全 / 便利 / 综合评分
// 所有分数范围 0~100

use super::model::{AmenityOutcome, AmenitySummary, CctvSummary, NearestFacility};

/// 派出所距离评分的基准距离（米）
const POLICE_DISTANCE_BASE: f64 = 800.0;

/// CCTV 点位数评分的满分点位数
const CCTV_FULL_SCORE_SITES: f64 = 30.0;

const POLICE_WEIGHT: f64 = 0.3;
const CCTV_WEIGHT: f64 = 0.4;
const ARREST_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub safety: f64,
    pub convenience: f64,
    pub overall: f64,
}

pub fn police_distance_score(nearest: Option<&NearestFacility>) -> f64 {
    match nearest {
        Some(police) => {
            let distance = f64::from(police.distance);
            if distance <= POLICE_DISTANCE_BASE {
                (POLICE_DISTANCE_BASE - distance) / POLICE_DISTANCE_BASE * 100.0
            } else {
                0.0
            }
        }
        None => 0.0,
    }
}

pub fn cctv_score(cctv: &CctvSummary) -> f64 {
    (cctv.site_count as f64 / CCTV_FULL_SCORE_SITES * 100.0).min(100.0)
}

/// 检举率未知时按 0 计
pub fn arrest_rate_score(rate: Option<f64>) -> f64 {
    rate.map(|r| (r * 100.0).clamp(0.0, 100.0)).unwrap_or(0.0)
}

pub fn safety_score(
    nearest: Option<&NearestFacility>,
    cctv: &CctvSummary,
    arrest_rate: Option<f64>,
) -> f64 {
    police_distance_score(nearest) * POLICE_WEIGHT
        + cctv_score(cctv) * CCTV_WEIGHT
        + arrest_rate_score(arrest_rate) * ARREST_WEIGHT
}

/// 单个分类的便利评分
pub fn category_score(code: &str, count: usize, closest: Option<u32>, population: u32) -> f64 {
    let count = count as f64;
    let capped = |per_place: f64| (count * per_place).min(100.0);

    match code {
        // 便利店按每万人密度
        "CS2" => (count / (f64::from(population) / 10_000.0) * 10.0).min(100.0),
        "CE7" => capped(2.0),
        "FD6" => capped(1.0),
        "SW8" => match closest.map(f64::from) {
            Some(d) if d <= 500.0 => 100.0,
            Some(d) if d <= 1000.0 => 100.0 - (d - 500.0) / 500.0 * 50.0,
            Some(d) => (50.0 - (d - 1000.0) / 1000.0 * 50.0).max(0.0),
            None => 0.0,
        },
        "MT1" => capped(10.0),
        "BK9" => capped(5.0),
        "PM9" => capped(8.0),
        "HP8" => {
            let distance_part = match closest {
                Some(d) if d <= 1000 => 50.0,
                Some(_) => 25.0,
                None => 0.0,
            };
            distance_part + (count * 10.0).min(50.0)
        }
        "PO3" | "PK6" | "AT4" => capped(3.0),
        "CT1" => capped(4.0),
        "OL7" => capped(5.0),
        "SC4" => capped(2.0),
        "AC5" => capped(1.0),
        _ => capped(2.0),
    }
}

/// 所有可用分类取平均，没有地点的分类按 0 分计入；不可用的分类不参与
pub fn convenience_score(amenities: &[AmenitySummary], population: u32) -> f64 {
    let scores: Vec<f64> = amenities
        .iter()
        .filter_map(|amenity| match &amenity.outcome {
            AmenityOutcome::Available {
                count,
                closest_distance,
                ..
            } => Some(category_score(
                &amenity.code,
                *count,
                *closest_distance,
                population,
            )),
            _ => None,
        })
        .collect();

    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

pub fn combine(safety: f64, convenience: f64) -> Scores {
    Scores {
        safety,
        convenience,
        overall: (safety + convenience) / 2.0,
    }
}

pub fn rounded(score: f64) -> u32 {
    score.round().clamp(0.0, 100.0) as u32
}

/// 根据分数和数据生成建议
pub fn recommendations(scores: &Scores, amenities: &[AmenitySummary]) -> Vec<String> {
    let mut recommendations = Vec::new();

    if scores.safety >= 80.0 {
        recommendations.push("이 지역은 안전 인프라가 잘 갖춰져 있습니다.".to_string());
    }
    if scores.convenience >= 80.0 {
        recommendations.push("주변에 다양한 편의시설이 있어 생활이 편리합니다.".to_string());
    }

    let closest = amenities
        .iter()
        .filter_map(|amenity| match &amenity.outcome {
            AmenityOutcome::Available {
                closest_distance: Some(distance),
                ..
            } => Some((amenity, *distance)),
            _ => None,
        })
        .min_by_key(|(_, distance)| *distance);

    if let Some((amenity, distance)) = closest {
        if distance < 200 {
            recommendations.push(format!("{}이(가) {}m 내에 있습니다.", amenity.name, distance));
        }
    }

    recommendations
}

pub struct WarningInputs<'a> {
    pub scores: &'a Scores,
    pub nearest_police: Option<&'a NearestFacility>,
    pub cctv: &'a CctvSummary,
    pub arrest_rate: Option<f64>,
    /// 不可用的上游部分名称
    pub unavailable_sections: &'a [&'a str],
}

pub fn warnings(inputs: &WarningInputs<'_>) -> Vec<String> {
    let mut warnings = Vec::new();

    if inputs.scores.safety < 40.0 {
        warnings.push("안전 인프라가 부족한 지역입니다. 주의가 필요합니다.".to_string());
    }
    if let Some(police) = inputs.nearest_police {
        if police.distance > 1000 {
            warnings.push("가장 가까운 파출소가 1km 이상 떨어져 있습니다.".to_string());
        }
    }
    if inputs.cctv.camera_count < 10 {
        warnings.push("CCTV 설치 대수가 적은 편입니다.".to_string());
    }
    if let Some(rate) = inputs.arrest_rate {
        if rate < 0.5 {
            warnings.push("해당 지역의 검거율이 낮은 편입니다.".to_string());
        }
    }
    for section in inputs.unavailable_sections {
        warnings.push(format!("{} 정보를 현재 확인할 수 없습니다.", section));
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AMENITY_CATEGORIES;

    fn police(distance: u32) -> NearestFacility {
        NearestFacility {
            address: "세종대로 파출소".into(),
            latitude: 37.5670,
            longitude: 126.9785,
            distance,
            within_radius: true,
        }
    }

    fn cctv(site_count: usize, camera_count: u32) -> CctvSummary {
        CctvSummary {
            site_count,
            camera_count,
            sites: Vec::new(),
        }
    }

    fn available(code: &str, count: usize, closest: Option<u32>) -> AmenitySummary {
        AmenitySummary {
            code: code.into(),
            name: code.into(),
            outcome: AmenityOutcome::Available {
                count,
                closest_distance: closest,
                places: Vec::new(),
            },
        }
    }

    #[test]
    fn police_distance_score_is_linear_up_to_800m() {
        assert_eq!(police_distance_score(Some(&police(0))), 100.0);
        assert_eq!(police_distance_score(Some(&police(400))), 50.0);
        assert_eq!(police_distance_score(Some(&police(800))), 0.0);
        assert_eq!(police_distance_score(Some(&police(1200))), 0.0);
        assert_eq!(police_distance_score(None), 0.0);
    }

    #[test]
    fn safety_score_weights_components() {
        // 400m -> 50, 15 个点位 -> 50, 检举率 0.5 -> 50
        let score = safety_score(Some(&police(400)), &cctv(15, 20), Some(0.5));
        assert!((score - 50.0).abs() < 1e-9);

        let capped = safety_score(Some(&police(0)), &cctv(90, 200), Some(1.0));
        assert!((capped - 100.0).abs() < 1e-9);

        assert_eq!(safety_score(None, &cctv(0, 0), None), 0.0);
    }

    #[test]
    fn subway_score_decays_with_distance() {
        assert_eq!(category_score("SW8", 1, Some(300), 400_000), 100.0);
        assert_eq!(category_score("SW8", 1, Some(750), 400_000), 75.0);
        assert_eq!(category_score("SW8", 1, Some(1500), 400_000), 25.0);
        assert_eq!(category_score("SW8", 0, None, 400_000), 0.0);
    }

    #[test]
    fn convenience_store_score_uses_population_density() {
        // 400,000 人 -> 每万人 40，20 家 -> 20/40*10 = 5
        assert_eq!(category_score("CS2", 20, Some(50), 400_000), 5.0);
        assert_eq!(category_score("CS2", 1000, Some(50), 131_214), 100.0);
    }

    #[test]
    fn hospital_combines_distance_and_count() {
        assert_eq!(category_score("HP8", 2, Some(300), 400_000), 70.0);
        assert_eq!(category_score("HP8", 9, Some(1500), 400_000), 75.0);
    }

    #[test]
    fn convenience_averages_every_available_category() {
        let amenities = vec![
            available("CE7", 10, Some(40)),  // 20
            available("MT1", 5, Some(300)),  // 50
            available("BK9", 0, None),       // 0
            AmenitySummary {
                code: "PM9".into(),
                name: "약국".into(),
                outcome: AmenityOutcome::Unavailable,
            },
        ];
        assert!((convenience_score(&amenities, 400_000) - 70.0 / 3.0).abs() < 1e-9);
        assert_eq!(convenience_score(&[], 400_000), 0.0);
    }

    #[test]
    fn empty_categories_pull_the_average_down() {
        // 15 个分类只有饭店有 60 家: 60 / 15 = 4
        let amenities: Vec<AmenitySummary> = AMENITY_CATEGORIES
            .iter()
            .map(|category| match category.code {
                "FD6" => available("FD6", 60, Some(30)),
                code => available(code, 0, None),
            })
            .collect();
        assert_eq!(amenities.len(), 15);
        assert!((convenience_score(&amenities, 400_000) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn recommendations_mention_close_amenity() {
        let scores = combine(85.0, 20.0);
        let amenities = vec![available("CE7", 3, Some(150)), available("FD6", 2, Some(90))];
        let recs = recommendations(&scores, &amenities);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0], "이 지역은 안전 인프라가 잘 갖춰져 있습니다.");
        assert_eq!(recs[1], "FD6이(가) 90m 내에 있습니다.");
    }

    #[test]
    fn warnings_cover_every_rule() {
        let scores = combine(10.0, 10.0);
        let far_police = police(1500);
        let few_cameras = cctv(1, 3);
        let list = warnings(&WarningInputs {
            scores: &scores,
            nearest_police: Some(&far_police),
            cctv: &few_cameras,
            arrest_rate: Some(0.3),
            unavailable_sections: &["주소"],
        });
        assert_eq!(list.len(), 5);
        assert_eq!(list[1], "가장 가까운 파출소가 1km 이상 떨어져 있습니다.");
        assert_eq!(list[4], "주소 정보를 현재 확인할 수 없습니다.");
    }

    #[test]
    fn rounded_clamps_to_score_range() {
        assert_eq!(rounded(49.5), 50);
        assert_eq!(rounded(-3.0), 0);
        assert_eq!(rounded(130.0), 100);
    }
}
