//! Box API payload structures.
//!
//! The service answers a box query with `{"folder": [record, ...]}`. Records are
//! kept as raw JSON until the cache converts them, so one malformed record
//! never spoils the rest of its batch.

use crate::error::OverlayError;
use crate::geo::{BoundingBox, Feature, FeatureId, Polygon};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One untouched record from the `folder` array.
pub type RawRecord = serde_json::Value;

/// Top-level box response.
#[derive(Debug, Clone, Deserialize)]
pub struct BoxResponse {
    pub folder: Option<Vec<RawRecord>>,

    /// Present instead of `folder` when the service rejects the query
    pub debug: Option<ApiDebug>,
}

/// Error object returned by the service (bad key, quota, unknown function, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDebug {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A feature record as the service describes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFeature {
    #[serde(deserialize_with = "number_or_string")]
    pub id: FeatureId,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    pub location: RawLocation,

    /// Vertices as `x = lng`, `y = lat`
    pub polygon: Vec<RawPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(deserialize_with = "number_or_string")]
    pub south: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub west: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub north: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub east: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(deserialize_with = "number_or_string")]
    pub x: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub y: f64,
}

impl RawFeature {
    /// Decodes a single folder entry into a cache-ready `Feature`.
    pub fn from_record(record: &RawRecord) -> Result<Feature, OverlayError> {
        let raw = RawFeature::deserialize(record).map_err(|e| {
            OverlayError::MalformedResponse(format!("unreadable feature record: {}", e))
        })?;
        raw.into_feature()
    }

    pub fn into_feature(self) -> Result<Feature, OverlayError> {
        let bounds = BoundingBox::new(
            self.location.south,
            self.location.west,
            self.location.north,
            self.location.east,
        )?;
        let polygon = Polygon::from_xy(self.polygon.iter().map(|p| (p.x, p.y)))
            .map_err(|e| match e {
                OverlayError::DegenerateGeometry(msg) => {
                    OverlayError::DegenerateGeometry(format!("feature {}: {}", self.id, msg))
                }
                other => other,
            })?;

        Ok(Feature {
            id: self.id,
            name: self.name.unwrap_or_default(),
            url: self.url.unwrap_or_default(),
            bounds,
            polygon,
        })
    }
}

/// Splits a box response body into raw records.
pub fn parse_box_response(body: &str) -> Result<Vec<RawRecord>, OverlayError> {
    let response: BoxResponse = serde_json::from_str(body)?;

    if let Some(debug) = response.debug {
        return Err(OverlayError::FetchFailure(format!(
            "service error {}: {}",
            debug
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string()),
            debug.message.unwrap_or_default()
        )));
    }

    response.folder.ok_or_else(|| {
        OverlayError::MalformedResponse("box response has no 'folder' array".to_string())
    })
}

/// Accepts `12.5` as well as `"12.5"`; the service is not consistent about quoting numbers.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString<T> {
        Number(T),
        Text(String),
    }

    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text.trim().parse::<T>().map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record() -> RawRecord {
        json!({
            "id": 55,
            "name": "Gorky Park",
            "url": "http://wikimapia.org/55/",
            "location": {"south": 55.72, "west": 37.59, "north": 55.74, "east": 37.61},
            "polygon": [
                {"x": 37.59, "y": 55.72},
                {"x": 37.61, "y": 55.72},
                {"x": 37.61, "y": 55.74},
                {"x": 37.59, "y": 55.74}
            ]
        })
    }

    #[test]
    fn test_record_converts_with_lat_from_y() {
        let feature = RawFeature::from_record(&record()).unwrap();
        assert_eq!(feature.id, 55);
        assert_eq!(feature.name, "Gorky Park");
        assert_eq!(feature.polygon.points()[0], Point::new(55.72, 37.59));
        assert_eq!(feature.bounds.north_east(), Point::new(55.74, 37.61));
    }

    #[test]
    fn test_quoted_numbers_are_accepted() {
        let mut value = record();
        value["id"] = json!("55");
        value["location"]["south"] = json!("55.72");
        value["polygon"][0]["x"] = json!(" 37.59 ");
        let feature = RawFeature::from_record(&value).unwrap();
        assert_eq!(feature.id, 55);
        assert_eq!(feature.bounds.south(), 55.72);
    }

    #[test]
    fn test_missing_name_and_url_default_to_empty() {
        let mut value = record();
        value.as_object_mut().unwrap().remove("name");
        value["url"] = serde_json::Value::Null;
        let feature = RawFeature::from_record(&value).unwrap();
        assert_eq!(feature.name, "");
        assert_eq!(feature.url, "");
    }

    #[test]
    fn test_missing_location_is_malformed() {
        let mut value = record();
        value.as_object_mut().unwrap().remove("location");
        assert!(matches!(
            RawFeature::from_record(&value),
            Err(OverlayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_two_vertex_polygon_is_degenerate() {
        let mut value = record();
        value["polygon"] = json!([{"x": 1, "y": 1}, {"x": 2, "y": 2}]);
        assert!(matches!(
            RawFeature::from_record(&value),
            Err(OverlayError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_inverted_location_is_rejected() {
        let mut value = record();
        value["location"]["south"] = json!(60.0);
        assert!(matches!(
            RawFeature::from_record(&value),
            Err(OverlayError::InvalidBounds(_))
        ));
    }

    #[test]
    fn test_parse_box_response_returns_folder() {
        let body = json!({"folder": [record(), {"id": "broken"}], "found": 2}).to_string();
        let records = parse_box_response(&body).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_box_response_surfaces_service_error() {
        let body = r#"{"debug": {"code": 1004, "message": "Invalid key"}}"#;
        match parse_box_response(body) {
            Err(OverlayError::FetchFailure(msg)) => assert!(msg.contains("Invalid key")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_box_response_without_folder_is_malformed() {
        assert!(matches!(
            parse_box_response(r#"{"found": 0}"#),
            Err(OverlayError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_box_response("<html>"),
            Err(OverlayError::MalformedResponse(_))
        ));
    }
}
