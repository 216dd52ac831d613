//! Optional validation of fetched stations.

use tracing::debug;

use crate::domain::Station;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two `(latitude, longitude)`
/// points given in degrees.
///
/// # Examples
///
/// ```
/// use rail_scraper::filter::haversine_km;
///
/// let krakow = (50.0677, 19.9476);
/// let warsaw = (52.2289, 21.0034);
/// let d = haversine_km(krakow, warsaw);
/// assert!((d - 252.0).abs() < 5.0);
/// ```
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Why a station was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ShortName,
    MissingCoordinates,
    TooFar,
}

/// Counts from one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub kept: usize,
    pub short_name: usize,
    pub missing_coordinates: usize,
    pub too_far: usize,
}

impl FilterStats {
    pub fn rejected(&self) -> usize {
        self.short_name + self.missing_coordinates + self.too_far
    }
}

/// Station validation rules.
///
/// When a reference point is set, stations without coordinates are rejected
/// even if `require_coordinates` is off, since their distance is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct StationFilter {
    /// Minimum trimmed name length, in characters.
    pub min_name_length: usize,
    pub require_coordinates: bool,
    /// Reference point as `(latitude, longitude)`.
    pub near: Option<(f64, f64)>,
    pub max_distance_km: f64,
}

impl Default for StationFilter {
    fn default() -> Self {
        Self {
            min_name_length: 2,
            require_coordinates: true,
            near: None,
            max_distance_km: 800.0,
        }
    }
}

impl StationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep stations within `max_distance_km` of this point.
    pub fn with_near(mut self, latitude: f64, longitude: f64) -> Self {
        self.near = Some((latitude, longitude));
        self
    }

    pub fn with_max_distance_km(mut self, km: f64) -> Self {
        self.max_distance_km = km;
        self
    }

    pub fn check(&self, station: &Station) -> Result<(), Rejection> {
        if station.name.trim().chars().count() < self.min_name_length {
            return Err(Rejection::ShortName);
        }

        let coordinates = station.coordinates();
        if coordinates.is_none() && (self.require_coordinates || self.near.is_some()) {
            return Err(Rejection::MissingCoordinates);
        }

        if let (Some(origin), Some(point)) = (self.near, coordinates)
            && haversine_km(origin, point) > self.max_distance_km
        {
            return Err(Rejection::TooFar);
        }

        Ok(())
    }

    /// Keep the stations that pass every rule.
    pub fn apply(&self, stations: Vec<Station>) -> (Vec<Station>, FilterStats) {
        let mut stats = FilterStats::default();
        let kept: Vec<Station> = stations
            .into_iter()
            .filter(|station| match self.check(station) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(station = %station.id, ?reason, "Station rejected by filter");
                    match reason {
                        Rejection::ShortName => stats.short_name += 1,
                        Rejection::MissingCoordinates => stats.missing_coordinates += 1,
                        Rejection::TooFar => stats.too_far += 1,
                    }
                    false
                }
            })
            .collect();

        stats.kept = kept.len();
        (kept, stats)
    }
}
