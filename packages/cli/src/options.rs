//! Lists the filter choices the event source offers.

use std::fmt::Write as _;

use crime_corr_source::EventSource;

/// Renders the distinct cities, offense types, and covered date range.
///
/// # Errors
///
/// Returns an error if the source cannot be read.
pub fn render_options(source: &dyn EventSource) -> Result<String, Box<dyn std::error::Error>> {
    let cities = source.cities()?;
    let offense_types = source.offense_types()?;
    let range = source.date_range()?;

    let mut out = String::new();
    writeln!(out, "Source: {}", source.describe())?;
    match range {
        Some(range) => writeln!(out, "Date range: {} .. {}", range.min, range.max)?,
        None => writeln!(out, "Date range: (no events)")?,
    }

    writeln!(out, "\nCities ({}):", cities.len())?;
    for city in &cities {
        writeln!(out, "  {city}")?;
    }

    writeln!(out, "\nOffense types ({}):", offense_types.len())?;
    for offense in &offense_types {
        writeln!(out, "  {offense}")?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crime_corr_crime_models::Event;
    use crime_corr_source::memory::MemoryEventSource;

    use super::*;

    #[test]
    fn lists_sorted_choices() {
        let at = NaiveDate::from_ymd_opt(2018, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let source = MemoryEventSource::new(vec![
            Event::new("Tucson", "theft", at, 32.2, -110.9),
            Event::new("Austin", "arson", at, 30.2, -97.7),
        ]);

        let text = render_options(&source).unwrap();
        assert!(text.contains("Date range: 2018-01-02 03:04:05 .. 2018-01-02 03:04:05"));
        assert!(text.contains("Cities (2):\n  Austin\n  Tucson\n"));
        assert!(text.contains("Offense types (2):\n  arson\n  theft\n"));
    }

    #[test]
    fn empty_source_has_no_range() {
        let text = render_options(&MemoryEventSource::default()).unwrap();
        assert!(text.contains("(no events)"));
        assert!(text.contains("Cities (0):"));
    }
}
