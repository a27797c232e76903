use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Mean Earth radius, in km
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A WGS84 position in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    longitude: f64,
    latitude: f64,
}

impl LonLat {
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
            bail!("({longitude}, {latitude}) isn't a valid longitude/latitude");
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn x(self) -> f64 {
        self.longitude
    }

    pub fn y(self) -> f64 {
        self.latitude
    }

    /// Great-circle distance along the surface, using the haversine formula.
    pub fn gps_dist_km(self, other: LonLat) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lat = lat2 - lat1;
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.longitude, self.latitude)
    }
}
