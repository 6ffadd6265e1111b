//! Pearson chi-square test of independence between city and offense type.

use crime_corr_analytics_models::{AssociationResult, ContingencyTable, Diagnostic};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Runs the chi-square test over a dense contingency table.
///
/// Cells whose expected frequency is zero (a zero row or column total) are
/// left out of the statistic and reported as
/// [`Diagnostic::ZeroExpectedCell`]. No continuity correction is applied.
/// With zero degrees of freedom the statistic is 0 and the p-value is 1.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn chi_square_test(table: &ContingencyTable) -> (AssociationResult, Vec<Diagnostic>) {
    let row_totals = table.row_totals();
    let col_totals = table.column_totals();
    let grand_total = table.total() as f64;

    let mut diagnostics = Vec::new();
    let mut chi2 = 0.0;
    let mut expected = Vec::with_capacity(row_totals.len());

    for (i, row) in table.rows().iter().enumerate() {
        let mut expected_row = Vec::with_capacity(row.len());
        for (j, &observed) in row.iter().enumerate() {
            let e = if grand_total > 0.0 {
                row_totals[i] as f64 * col_totals[j] as f64 / grand_total
            } else {
                0.0
            };

            if e > 0.0 {
                let diff = observed as f64 - e;
                chi2 += diff * diff / e;
            } else {
                let diagnostic = Diagnostic::ZeroExpectedCell {
                    city: table.cities()[i].clone(),
                    offense_type: table.offense_types()[j].clone(),
                };
                log::warn!("{diagnostic}");
                diagnostics.push(diagnostic);
            }

            expected_row.push(e);
        }
        expected.push(expected_row);
    }

    let rows = table.cities().len() as u64;
    let cols = table.offense_types().len() as u64;
    let degrees_of_freedom = rows.saturating_sub(1) * cols.saturating_sub(1);

    let p_value = right_tail(chi2, degrees_of_freedom);

    log::info!("Chi-square = {chi2:.4}, dof = {degrees_of_freedom}, p = {p_value:.6}");

    (
        AssociationResult {
            chi2,
            p_value,
            degrees_of_freedom,
            expected,
        },
        diagnostics,
    )
}

/// Survival function of the chi-square distribution, clamped to `[0, 1]`.
#[allow(clippy::cast_precision_loss)]
fn right_tail(chi2: f64, degrees_of_freedom: u64) -> f64 {
    if degrees_of_freedom == 0 {
        return 1.0;
    }
    ChiSquared::new(degrees_of_freedom as f64)
        .map_or(1.0, |dist| dist.sf(chi2))
        .clamp(0.0, 1.0)
}

/// One-line interpretation of the test at significance level `alpha`.
#[must_use]
pub fn interpret(result: &AssociationResult, alpha: f64) -> String {
    let verdict = if result.is_significant(alpha) {
        "indicates an association between city and offense type"
    } else {
        "does not indicate an association between city and offense type"
    };
    format!(
        "Chi-square of {:.4} with p-value {:.6} ({} degrees of freedom) {verdict} at alpha = {alpha}.",
        result.chi2, result.p_value, result.degrees_of_freedom
    )
}
