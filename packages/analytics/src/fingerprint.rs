//! Per-city offense-count fingerprints.
//!
//! A fingerprint is a city's row of the contingency table: one count per
//! offense type, in Offense Set order, with 0 where the city never
//! recorded that offense. Because the table is dense the vectors are
//! element-wise comparable across cities.

use crime_corr_analytics_models::{ContingencyTable, FingerprintMatrix};

use crate::AnalyticsError;

/// Reshapes the contingency table into one vector per city.
///
/// # Errors
///
/// Returns [`AnalyticsError::Conversion`] if a row does not span the whole
/// Offense Set.
pub fn build(table: &ContingencyTable) -> Result<FingerprintMatrix, AnalyticsError> {
    let vectors: Vec<Vec<u64>> = table
        .cities()
        .iter()
        .zip(table.rows())
        .map(|(city, row)| {
            log::trace!("Fingerprint for {city}: {row:?}");
            row.clone()
        })
        .collect();

    FingerprintMatrix::new(
        table.cities().to_vec(),
        table.offense_types().to_vec(),
        vectors,
    )
    .ok_or_else(|| AnalyticsError::Conversion {
        message: "fingerprint length differs from offense set size".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contingency;
    use crate::test_support::{repeat, three_events};

    #[test]
    fn vectors_align_with_contingency_cells() {
        let mut events = three_events();
        events.extend(repeat("CityC", "Burglary", 3, 0.0, 0.0));
        let table = contingency::from_events(&events).unwrap();
        let fingerprints = build(&table).unwrap();

        for city in table.cities() {
            let vector = fingerprints.vector(city).unwrap();
            assert_eq!(vector.len(), table.offense_types().len());
            for (k, offense) in table.offense_types().iter().enumerate() {
                assert_eq!(Some(vector[k]), table.count(city, offense));
            }
        }
    }

    #[test]
    fn cities_without_an_offense_get_zero() {
        let table = contingency::from_events(&three_events()).unwrap();
        let fingerprints = build(&table).unwrap();
        // Offense order: Assault, Theft.
        assert_eq!(fingerprints.vector("CityB"), Some([0, 1].as_slice()));
        assert_eq!(fingerprints.vector("CityA"), Some([1, 1].as_slice()));
    }
}
