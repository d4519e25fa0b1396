// src/models/place.rs
// DOCUMENTATION: Core data structures for places
// PURPOSE: One Place value built from every place shape the clients receive

use serde::{Deserialize, Serialize};

use super::{opt_lenient_f64, opt_string_id, Review};
use crate::errors::ClientError;

/// Mean Earth radius in meters
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude", alias = "lon")]
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters (haversine)
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * a.sqrt().asin() * EARTH_RADIUS_M
    }

    fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Normalized point of interest
/// DOCUMENTATION: Built only through the from_* factories below,
/// never deserialized straight off the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub coordinates: Coordinates,

    /// Category / type label (restaurant, 음식점, ...)
    pub category: Option<String>,

    /// Average rating (0 when unrated)
    pub rating: f64,

    /// Number of ratings behind `rating`
    pub rating_count: u32,

    pub reviews: Vec<Review>,

    pub description: Option<String>,
    pub phone: Option<String>,

    /// External detail page (Kakao place_url)
    pub url: Option<String>,

    /// Distance from the search origin in meters
    pub distance: Option<f64>,
}

/// Location record returned by the backend (/locations, /locations/search, /locations/{id})
/// DOCUMENTATION: Backend builds disagree on the shape: `id` vs `location_id`,
/// nested `coordinates` vs flat `latitude`/`longitude`; all are accepted here
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationRecord {
    #[serde(default, alias = "location_id", deserialize_with = "opt_string_id")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default, alias = "type", alias = "category")]
    pub location_type: Option<String>,

    #[serde(default)]
    pub coordinates: Option<Coordinates>,

    #[serde(default, alias = "lat", deserialize_with = "opt_lenient_f64")]
    pub latitude: Option<f64>,

    #[serde(default, alias = "lng", deserialize_with = "opt_lenient_f64")]
    pub longitude: Option<f64>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, alias = "rating")]
    pub avg_rating: Option<f64>,

    #[serde(default, alias = "rating_count")]
    pub review_count: Option<u32>,

    #[serde(default)]
    pub distance: Option<f64>,
}

/// Kakao local keyword-search document
/// DOCUMENTATION: `x` is longitude and `y` latitude, both sent as strings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KakaoPlace {
    #[serde(default, deserialize_with = "opt_string_id")]
    pub id: Option<String>,

    pub place_name: String,

    #[serde(default, deserialize_with = "opt_lenient_f64")]
    pub x: Option<f64>,

    #[serde(default, deserialize_with = "opt_lenient_f64")]
    pub y: Option<f64>,

    #[serde(default)]
    pub address_name: Option<String>,

    #[serde(default)]
    pub road_address_name: Option<String>,

    /// Short group label, e.g. "음식점"
    #[serde(default)]
    pub category_group_name: Option<String>,

    /// Full path, e.g. "음식점 > 한식 > 국밥"
    #[serde(default)]
    pub category_name: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub place_url: Option<String>,

    /// Distance from the query point in meters, as a string
    #[serde(default, deserialize_with = "opt_lenient_f64")]
    pub distance: Option<f64>,
}

/// Category bucket returned by /locations when per_category is requested
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationSection {
    pub category: String,
    #[serde(default)]
    pub items: Vec<LocationRecord>,
}

/// Normalized recommendation bucket
#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub category: String,
    pub places: Vec<Place>,
}

impl Place {
    /// Build a Place from a backend location record
    /// DOCUMENTATION: Nested coordinates win over flat ones;
    /// missing rating and count become 0
    pub fn from_location(record: LocationRecord) -> Result<Place, ClientError> {
        let coordinates = match (record.coordinates, record.latitude, record.longitude) {
            (Some(c), _, _) => c,
            (None, Some(lat), Some(lng)) => Coordinates::new(lat, lng),
            _ => {
                return Err(ClientError::Parse(format!(
                    "location '{}' has no coordinates",
                    record.name
                )))
            }
        };

        let id = record
            .id
            .unwrap_or_else(|| derived_id(&record.name, &coordinates));

        Self::build(PlaceParts {
            id,
            name: record.name,
            address: record.address,
            coordinates,
            category: record.location_type,
            rating: record.avg_rating.unwrap_or(0.0),
            rating_count: record.review_count.unwrap_or(0),
            description: record.description,
            phone: None,
            url: None,
            distance: record.distance,
        })
    }

    /// Build a Place from a Kakao keyword-search document
    /// DOCUMENTATION: Road address preferred over lot address;
    /// category falls back to the last segment of category_name
    pub fn from_kakao(doc: KakaoPlace) -> Result<Place, ClientError> {
        let coordinates = match (doc.y, doc.x) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
            _ => {
                return Err(ClientError::Parse(format!(
                    "kakao place '{}' has no coordinates",
                    doc.place_name
                )))
            }
        };

        let category = non_empty(doc.category_group_name).or_else(|| {
            doc.category_name
                .as_deref()
                .and_then(|path| path.rsplit('>').next())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        });

        let id = match doc.id {
            Some(id) => format!("kakao:{}", id),
            None => derived_id(&doc.place_name, &coordinates),
        };

        Self::build(PlaceParts {
            id,
            name: doc.place_name,
            address: non_empty(doc.road_address_name).or_else(|| non_empty(doc.address_name)),
            coordinates,
            category,
            rating: 0.0,
            rating_count: 0,
            description: None,
            phone: non_empty(doc.phone),
            url: non_empty(doc.place_url),
            distance: doc.distance,
        })
    }

    /// Normalize a batch, dropping (and logging) records that cannot be placed on a map
    pub fn from_locations(records: Vec<LocationRecord>) -> Vec<Place> {
        records
            .into_iter()
            .filter_map(|record| match Place::from_location(record) {
                Ok(place) => Some(place),
                Err(e) => {
                    log::warn!("Skipping location: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Same place with reviews attached
    pub fn with_reviews(self, reviews: Vec<Review>) -> Place {
        Place { reviews, ..self }
    }

    /// Same place with distance filled in from `origin` when the backend did not send one
    pub fn with_distance_from(self, origin: &Coordinates) -> Place {
        let distance = self
            .distance
            .or_else(|| Some(origin.distance_to(&self.coordinates)));
        Place { distance, ..self }
    }

    fn build(parts: PlaceParts) -> Result<Place, ClientError> {
        if parts.name.trim().is_empty() {
            return Err(ClientError::Parse("place without a name".to_string()));
        }
        if !parts.coordinates.is_valid() {
            return Err(ClientError::Parse(format!(
                "place '{}' has invalid coordinates ({}, {})",
                parts.name, parts.coordinates.lat, parts.coordinates.lng
            )));
        }

        Ok(Place {
            id: parts.id,
            name: parts.name,
            address: non_empty(parts.address),
            coordinates: parts.coordinates,
            category: non_empty(parts.category),
            rating: parts.rating,
            rating_count: parts.rating_count,
            reviews: Vec::new(),
            description: non_empty(parts.description),
            phone: parts.phone,
            url: parts.url,
            distance: parts.distance,
        })
    }
}

impl Recommendations {
    pub fn from_section(section: RecommendationSection) -> Recommendations {
        Recommendations {
            category: section.category,
            places: Place::from_locations(section.items),
        }
    }
}

struct PlaceParts {
    id: String,
    name: String,
    address: Option<String>,
    coordinates: Coordinates,
    category: Option<String>,
    rating: f64,
    rating_count: u32,
    description: Option<String>,
    phone: Option<String>,
    url: Option<String>,
    distance: Option<f64>,
}

/// Stable id for records that arrive without one
fn derived_id(name: &str, coordinates: &Coordinates) -> String {
    format!("{}@{:.6},{:.6}", name.trim(), coordinates.lat, coordinates.lng)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_location_nested_coordinates() {
        let record: LocationRecord = serde_json::from_value(json!({
            "id": "loc-1",
            "name": "Gwangjang Market",
            "location_type": "restaurant",
            "coordinates": {"lat": 37.5700, "lng": 126.9996},
            "avg_rating": 4.25,
            "review_count": 8
        }))
        .unwrap();

        let place = Place::from_location(record).unwrap();
        assert_eq!(place.id, "loc-1");
        assert_eq!(place.category.as_deref(), Some("restaurant"));
        assert_eq!(place.coordinates, Coordinates::new(37.5700, 126.9996));
        assert_eq!(place.rating, 4.25);
        assert_eq!(place.rating_count, 8);
        assert!(place.reviews.is_empty());
    }

    #[test]
    fn test_from_location_flat_and_recommendation_shape() {
        let record: LocationRecord = serde_json::from_value(json!({
            "location_id": 42,
            "name": "Tosokchon",
            "latitude": "37.5779",
            "longitude": 126.9707,
            "avg_rating": null
        }))
        .unwrap();

        let place = Place::from_location(record).unwrap();
        assert_eq!(place.id, "42");
        assert_eq!(place.coordinates, Coordinates::new(37.5779, 126.9707));
        assert_eq!(place.rating, 0.0);
        assert_eq!(place.rating_count, 0);
    }

    #[test]
    fn test_from_location_without_coordinates_fails() {
        let record = LocationRecord {
            id: Some("x".to_string()),
            name: "Nowhere".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Place::from_location(record),
            Err(ClientError::Parse(_))
        ));
    }

    #[test]
    fn test_from_kakao() {
        let doc: KakaoPlace = serde_json::from_value(json!({
            "id": "26338954",
            "place_name": "진주집",
            "x": "126.98561429978552",
            "y": "37.56255453417444",
            "address_name": "서울 중구 명동2가 33-4",
            "road_address_name": "",
            "category_group_name": "",
            "category_name": "음식점 > 한식 > 국수",
            "phone": "02-776-5348",
            "place_url": "http://place.map.kakao.com/26338954",
            "distance": "418"
        }))
        .unwrap();

        let place = Place::from_kakao(doc).unwrap();
        assert_eq!(place.id, "kakao:26338954");
        assert_eq!(place.name, "진주집");
        assert!((place.coordinates.lat - 37.56255453417444).abs() < 1e-12);
        assert!((place.coordinates.lng - 126.98561429978552).abs() < 1e-12);
        assert_eq!(place.address.as_deref(), Some("서울 중구 명동2가 33-4"));
        assert_eq!(place.category.as_deref(), Some("국수"));
        assert_eq!(place.rating, 0.0);
        assert_eq!(place.distance, Some(418.0));
    }

    #[test]
    fn test_from_kakao_rejects_garbage_coordinates() {
        let doc: KakaoPlace = serde_json::from_value(json!({
            "place_name": "Broken",
            "x": "not-a-number",
            "y": "37.5"
        }))
        .unwrap();
        assert!(Place::from_kakao(doc).is_err());
    }

    #[test]
    fn test_from_locations_skips_invalid() {
        let records: Vec<LocationRecord> = serde_json::from_value(json!([
            {"id": "1", "name": "Ok", "coordinates": {"lat": 37.5, "lng": 127.0}},
            {"id": "2", "name": "Bad", "coordinates": {"lat": 137.5, "lng": 127.0}},
        ]))
        .unwrap();
        let places = Place::from_locations(records);
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, "1");
    }

    #[test]
    fn test_distance() {
        let seoul_station = Coordinates::new(37.5547, 126.9707);
        let city_hall = Coordinates::new(37.5663, 126.9779);
        let d = seoul_station.distance_to(&city_hall);
        assert!(d > 1_300.0 && d < 1_500.0, "distance was {}", d);
        assert_eq!(seoul_station.distance_to(&seoul_station), 0.0);
    }

    #[test]
    fn test_with_distance_from_keeps_backend_value() {
        let record: LocationRecord = serde_json::from_value(json!({
            "id": "1", "name": "Ok", "coordinates": {"lat": 37.5, "lng": 127.0}, "distance": 12.5
        }))
        .unwrap();
        let origin = Coordinates::new(37.6, 127.1);

        let place = Place::from_location(record).unwrap().with_distance_from(&origin);
        assert_eq!(place.distance, Some(12.5));

        let fresh = Place { distance: None, ..place }.with_distance_from(&origin);
        assert!(fresh.distance.unwrap() > 10_000.0);
    }
}
