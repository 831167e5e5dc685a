// Kakao Local API 客户端
// 逆地理编码 coord2address 与分类搜索 search/category

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{AddressInfo, AmenityCategory, AmenityGateway, GatewayError, GeocodeGateway, Place};
use crate::geo::Coordinate;

const COORD_TO_ADDRESS_PATH: &str = "/v2/local/geo/coord2address.json";
const CATEGORY_SEARCH_PATH: &str = "/v2/local/search/category.json";

#[derive(Debug, Deserialize)]
struct Documents<T> {
    documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AddressName {
    address_name: String,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    road_address: Option<AddressName>,
    address: Option<AddressName>,
}

#[derive(Debug, Deserialize)]
struct PlaceDocument {
    place_name: String,
    /// 经度（字符串）
    x: String,
    /// 纬度（字符串）
    y: String,
}

impl TryFrom<PlaceDocument> for Place {
    type Error = GatewayError;

    fn try_from(doc: PlaceDocument) -> Result<Self, Self::Error> {
        let longitude = doc
            .x
            .parse::<f64>()
            .map_err(|_| GatewayError::Payload(format!("bad longitude '{}'", doc.x)))?;
        let latitude = doc
            .y
            .parse::<f64>()
            .map_err(|_| GatewayError::Payload(format!("bad latitude '{}'", doc.y)))?;

        Ok(Place {
            name: doc.place_name,
            coordinate: Coordinate::new(latitude, longitude),
        })
    }
}

#[derive(Clone)]
pub struct KakaoClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl KakaoClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn get_documents<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, GatewayError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("KakaoAK {}", self.api_key))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status(status.as_u16()));
        }

        let body: Documents<T> = response.json().await?;
        Ok(body.documents)
    }
}

#[async_trait]
impl GeocodeGateway for KakaoClient {
    async fn reverse_geocode(&self, coord: Coordinate) -> Result<AddressInfo, GatewayError> {
        let documents: Vec<AddressDocument> = self
            .get_documents(
                COORD_TO_ADDRESS_PATH,
                &[
                    ("x", coord.longitude.to_string()),
                    ("y", coord.latitude.to_string()),
                ],
            )
            .await?;

        let first = documents
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Payload("no address document".into()))?;

        Ok(AddressInfo {
            road_address: first.road_address.map(|a| a.address_name),
            lot_address: first.address.map(|a| a.address_name),
        })
    }
}

#[async_trait]
impl AmenityGateway for KakaoClient {
    async fn search_category(
        &self,
        coord: Coordinate,
        category: &AmenityCategory,
        radius: u32,
    ) -> Result<Vec<Place>, GatewayError> {
        let documents: Vec<PlaceDocument> = self
            .get_documents(
                CATEGORY_SEARCH_PATH,
                &[
                    ("category_group_code", category.code.to_string()),
                    ("x", coord.longitude.to_string()),
                    ("y", coord.latitude.to_string()),
                    ("radius", radius.to_string()),
                ],
            )
            .await?;

        documents.into_iter().map(Place::try_from).collect()
    }
}
