//! GeoJSON points and the spherical math behind the geo queries.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean earth radius used for distances reported in meters.
const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeoKind {
    #[default]
    Point,
}

/// A GeoJSON point: `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default)]
    pub kind: GeoKind,
    #[serde(default)]
    pub coordinates: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            kind: GeoKind::Point,
            coordinates: vec![lng, lat],
            address: None,
            description: None,
        }
    }

    /// `Some` only for a well-formed `[lng, lat]` pair within range.
    pub fn lat_lng(&self) -> Option<LatLng> {
        match self.coordinates.as_slice() {
            [lng, lat] if (-180.0..=180.0).contains(lng) && (-90.0..=90.0).contains(lat) => Some(LatLng {
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        }
    }
}

/// One stop of a tour itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(flatten)]
    pub point: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoError {
    #[error("Please provide latitude and longitude in the format lat,lng.")]
    MalformedLatLng,

    #[error("Unit must be either mi or km.")]
    UnknownUnit,
}

/// A `lat,lng` pair as it appears in geo query paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl FromStr for LatLng {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s.split_once(',').ok_or(GeoError::MalformedLatLng)?;
        let lat: f64 = lat.trim().parse().map_err(|_| GeoError::MalformedLatLng)?;
        let lng: f64 = lng.trim().parse().map_err(|_| GeoError::MalformedLatLng)?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::MalformedLatLng);
        }
        Ok(Self { lat, lng })
    }
}

impl LatLng {
    /// Central angle between two points in radians (haversine).
    pub fn angular_distance(&self, other: &LatLng) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * a.sqrt().min(1.0).asin()
    }

    pub fn distance_meters(&self, other: &LatLng) -> f64 {
        self.angular_distance(other) * EARTH_RADIUS_METERS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl FromStr for DistanceUnit {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mi" => Ok(Self::Miles),
            "km" => Ok(Self::Kilometers),
            _ => Err(GeoError::UnknownUnit),
        }
    }
}

impl DistanceUnit {
    /// Earth radius expressed in this unit.
    pub fn earth_radius(self) -> f64 {
        match self {
            Self::Miles => 3963.2,
            Self::Kilometers => 6378.1,
        }
    }

    /// Factor converting meters into this unit.
    pub fn from_meters(self) -> f64 {
        match self {
            Self::Miles => 0.000621371,
            Self::Kilometers => 0.001,
        }
    }

    /// Radius in radians for a distance given in this unit.
    pub fn radians(self, distance: f64) -> f64 {
        distance / self.earth_radius()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lat_lng() {
        let p: LatLng = "34.111745,-118.113491".parse().unwrap();
        assert_eq!(p.lat, 34.111745);
        assert_eq!(p.lng, -118.113491);
    }

    #[test]
    fn rejects_malformed_lat_lng() {
        assert_eq!("34.1".parse::<LatLng>(), Err(GeoError::MalformedLatLng));
        assert_eq!("north,west".parse::<LatLng>(), Err(GeoError::MalformedLatLng));
        assert_eq!("95,10".parse::<LatLng>(), Err(GeoError::MalformedLatLng));
    }

    #[test]
    fn los_angeles_to_san_francisco_is_about_559_km() {
        let la = LatLng { lat: 34.0522, lng: -118.2437 };
        let sf = LatLng { lat: 37.7749, lng: -122.4194 };
        let km = la.distance_meters(&sf) * DistanceUnit::Kilometers.from_meters();
        assert!((km - 559.0).abs() < 5.0, "got {km}");
    }

    #[test]
    fn geo_point_exposes_lat_lng_only_when_well_formed() {
        let p = GeoPoint::new(-80.185942, 25.774772);
        assert_eq!(p.lat_lng(), Some(LatLng { lat: 25.774772, lng: -80.185942 }));

        let mut bad = p.clone();
        bad.coordinates = vec![1.0];
        assert_eq!(bad.lat_lng(), None);
    }

    #[test]
    fn location_round_trips_flattened_point() {
        let json = r#"{"type":"Point","coordinates":[-80.1,25.7],"description":"Miami","day":2}"#;
        let loc: Location = serde_json::from_str(json).unwrap();
        assert_eq!(loc.day, Some(2));
        assert_eq!(loc.point.description.as_deref(), Some("Miami"));
    }
}
