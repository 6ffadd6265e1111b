//! Per-city geographic centroids.
//!
//! Plain arithmetic mean of latitude and longitude, no geodesic
//! correction. Used only to anchor correlation links on the map.

use std::collections::BTreeMap;

use crime_corr_analytics_models::CityCentroid;
use crime_corr_crime_models::Event;

/// Computes one centroid per city, sorted by city name.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn compute(events: &[Event]) -> Vec<CityCentroid> {
    let mut sums: BTreeMap<&str, (f64, f64, u64)> = BTreeMap::new();
    for event in events {
        let entry = sums.entry(event.city.as_str()).or_insert((0.0, 0.0, 0));
        entry.0 += event.latitude;
        entry.1 += event.longitude;
        entry.2 += 1;
    }

    sums.into_iter()
        .map(|(city, (lat_sum, lon_sum, n))| CityCentroid {
            city: city.to_owned(),
            latitude: lat_sum / n as f64,
            longitude: lon_sum / n as f64,
            event_count: n,
        })
        .collect()
}

/// Finds a city's centroid in a list sorted by city name.
#[must_use]
pub fn lookup<'a>(centroids: &'a [CityCentroid], city: &str) -> Option<&'a CityCentroid> {
    centroids
        .binary_search_by(|c| c.city.as_str().cmp(city))
        .ok()
        .map(|i| &centroids[i])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{repeat, three_events};

    #[test]
    fn single_location_cities_keep_their_coordinates() {
        let centroids = compute(&three_events());
        let a = lookup(&centroids, "CityA").unwrap();
        let b = lookup(&centroids, "CityB").unwrap();
        assert_eq!((a.latitude, a.longitude), (10.0, 20.0));
        assert_eq!((b.latitude, b.longitude), (30.0, 40.0));
        assert_eq!(a.event_count, 2);
        assert!(lookup(&centroids, "CityZ").is_none());
    }

    #[test]
    fn averages_latitude_and_longitude_independently() {
        let mut events = repeat("Denver", "theft", 1, 39.0, -105.0);
        events.extend(repeat("Denver", "theft", 1, 40.0, -104.0));
        events.extend(repeat("Denver", "assault", 2, 39.5, -104.5));
        let centroids = compute(&events);
        assert_eq!(centroids.len(), 1);
        assert!((centroids[0].latitude - 39.5).abs() < 1e-12);
        assert!((centroids[0].longitude + 104.5).abs() < 1e-12);
    }
}
