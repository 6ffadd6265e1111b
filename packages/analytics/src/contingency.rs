//! Contingency table construction.
//!
//! Groups events by (city, offense type) and materializes a dense table
//! over the sorted City Set × Offense Set. Pairs with no events get an
//! explicit 0 when the table is allocated, never as a lookup fallback.

use std::collections::{BTreeMap, BTreeSet};

use crime_corr_analytics_models::ContingencyTable;
use crime_corr_crime_models::{Event, OffenseCount};

use crate::AnalyticsError;

/// Builds the table from raw events.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptyDataset`] if `events` is empty.
pub fn from_events(events: &[Event]) -> Result<ContingencyTable, AnalyticsError> {
    if events.is_empty() {
        return Err(AnalyticsError::EmptyDataset {
            message: "no events to build a contingency table from".to_string(),
        });
    }

    let mut grouped: BTreeMap<(&str, &str), u64> = BTreeMap::new();
    for event in events {
        *grouped
            .entry((event.city.as_str(), event.offense_type.as_str()))
            .or_insert(0) += 1;
    }

    let counts: Vec<OffenseCount> = grouped
        .into_iter()
        .map(|((city, offense_type), count)| OffenseCount {
            city: city.to_owned(),
            offense_type: offense_type.to_owned(),
            count,
        })
        .collect();

    from_counts(&counts)
}

/// Builds the table from a pre-aggregated (city, offense type, count)
/// projection. Repeated pairs are summed. Zero-count rows are ignored, so
/// a city or offense type only appears if it has at least one event.
///
/// # Errors
///
/// Returns [`AnalyticsError::EmptyDataset`] if the projection has no
/// non-zero rows.
pub fn from_counts(counts: &[OffenseCount]) -> Result<ContingencyTable, AnalyticsError> {
    let counts: Vec<&OffenseCount> = counts.iter().filter(|c| c.count > 0).collect();

    let cities: Vec<String> = counts
        .iter()
        .map(|c| c.city.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect();
    let offense_types: Vec<String> = counts
        .iter()
        .map(|c| c.offense_type.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect();

    if counts.is_empty() {
        return Err(AnalyticsError::EmptyDataset {
            message: "no city/offense counts above zero".to_string(),
        });
    }

    let mut rows = vec![vec![0u64; offense_types.len()]; cities.len()];
    for count in &counts {
        let (Ok(i), Ok(j)) = (
            cities.binary_search(&count.city),
            offense_types.binary_search(&count.offense_type),
        ) else {
            continue;
        };
        rows[i][j] += count.count;
    }

    log::debug!(
        "Built {}x{} contingency table",
        cities.len(),
        offense_types.len()
    );

    ContingencyTable::new(cities, offense_types, rows).ok_or_else(|| AnalyticsError::Conversion {
        message: "contingency rows do not match labels".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crime_corr_crime_models::Event;

    use super::*;
    use crate::test_support::{at, repeat, three_events};

    #[test]
    fn zero_fills_missing_pairs() {
        let table = from_events(&three_events()).unwrap();
        assert_eq!(table.cities(), ["CityA", "CityB"]);
        assert_eq!(table.offense_types(), ["Assault", "Theft"]);
        assert_eq!(table.count("CityA", "Theft"), Some(1));
        assert_eq!(table.count("CityA", "Assault"), Some(1));
        assert_eq!(table.count("CityB", "Theft"), Some(1));
        assert_eq!(table.count("CityB", "Assault"), Some(0));
    }

    #[test]
    fn sums_match_event_counts() {
        let mut events = repeat("Austin", "theft", 7, 30.0, -97.0);
        events.extend(repeat("Austin", "assault", 2, 30.0, -97.0));
        events.extend(repeat("Boston", "theft", 4, 42.0, -71.0));
        events.extend(repeat("Chicago", "burglary", 5, 41.0, -87.0));

        let table = from_events(&events).unwrap();
        assert_eq!(table.total(), events.len() as u64);

        for (city, total) in table.cities().iter().zip(table.row_totals()) {
            let expected = events.iter().filter(|e| &e.city == city).count() as u64;
            assert_eq!(total, expected, "row sum for {city}");
        }
        for (offense, total) in table.offense_types().iter().zip(table.column_totals()) {
            let expected = events.iter().filter(|e| &e.offense_type == offense).count() as u64;
            assert_eq!(total, expected, "column sum for {offense}");
        }
    }

    #[test]
    fn counts_projection_matches_event_path() {
        let events = vec![
            Event::new("B", "x", at(2020, 1, 1), 0.0, 0.0),
            Event::new("A", "y", at(2020, 1, 1), 0.0, 0.0),
            Event::new("A", "y", at(2020, 1, 2), 0.0, 0.0),
        ];
        let counts = vec![
            OffenseCount {
                city: "A".to_string(),
                offense_type: "y".to_string(),
                count: 1,
            },
            OffenseCount {
                city: "B".to_string(),
                offense_type: "x".to_string(),
                count: 1,
            },
            OffenseCount {
                city: "A".to_string(),
                offense_type: "y".to_string(),
                count: 1,
            },
        ];
        assert_eq!(from_counts(&counts).unwrap(), from_events(&events).unwrap());
    }

    #[test]
    fn empty_input_is_a_data_error() {
        assert!(matches!(
            from_events(&[]),
            Err(AnalyticsError::EmptyDataset { .. })
        ));
        assert!(matches!(
            from_counts(&[]),
            Err(AnalyticsError::EmptyDataset { .. })
        ));
    }

    #[test]
    fn all_zero_projection_is_a_data_error() {
        let counts = vec![OffenseCount {
            city: "A".to_string(),
            offense_type: "x".to_string(),
            count: 0,
        }];
        assert!(matches!(
            from_counts(&counts),
            Err(AnalyticsError::EmptyDataset { .. })
        ));
    }

    #[test]
    fn zero_count_rows_add_no_labels() {
        let row = |city: &str, offense_type: &str, count| OffenseCount {
            city: city.to_string(),
            offense_type: offense_type.to_string(),
            count,
        };
        let counts = vec![
            row("CityA", "Assault", 1),
            row("CityA", "Theft", 1),
            row("CityB", "Theft", 1),
            row("CityC", "Theft", 0),
            row("CityB", "Vandalism", 0),
        ];

        let table = from_counts(&counts).unwrap();
        assert_eq!(table.cities(), ["CityA", "CityB"]);
        assert_eq!(table.offense_types(), ["Assault", "Theft"]);
        assert_eq!(table, from_events(&three_events()).unwrap());
    }
}
