//! City-pair correlation links for map display.

use crime_corr_analytics_models::{CorrelationLink, GeoPoint, LinkMap};

use crate::AnalyticsError;
use crate::snapshot::Snapshot;

/// Builds one link per unordered city pair, anchored at the two centroids.
///
/// With `focus` set, only links touching that city are returned. The map
/// center is always the mean of every centroid.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnknownCity`] if `focus` is not in the City
/// Set.
#[allow(clippy::cast_precision_loss)]
pub fn correlation_links(snapshot: &Snapshot, focus: Option<&str>) -> Result<LinkMap, AnalyticsError> {
    if let Some(city) = focus
        && snapshot.centroid(city).is_none()
    {
        return Err(AnalyticsError::UnknownCity {
            city: city.to_owned(),
        });
    }

    let centroids = snapshot.centroids();
    let correlation = snapshot.correlation();
    let mut links = Vec::new();

    for (i, a) in centroids.iter().enumerate() {
        for b in &centroids[i + 1..] {
            if let Some(city) = focus
                && a.city != city
                && b.city != city
            {
                continue;
            }
            let value = correlation.between(&a.city, &b.city).flatten();
            links.push(CorrelationLink {
                city_a: a.city.clone(),
                city_b: b.city.clone(),
                from: a.point(),
                to: b.point(),
                correlation: value,
            });
        }
    }

    let n = centroids.len().max(1) as f64;
    let center = GeoPoint {
        latitude: centroids.iter().map(|c| c.latitude).sum::<f64>() / n,
        longitude: centroids.iter().map(|c| c.longitude).sum::<f64>() / n,
    };

    Ok(LinkMap { links, center })
}
