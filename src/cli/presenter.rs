use tabled::Table;

use crate::types::Recommendation;

pub const NO_RECOMMENDATIONS: &str = "No recommendations found for this track.";

/// Renders recommendations as a table, one row each, in the given order.
///
/// Columns are fixed: name, artist, album, popularity, preview_url,
/// spotify_url. An empty slice renders as [`NO_RECOMMENDATIONS`] rather than
/// a header-only table.
pub fn render(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return NO_RECOMMENDATIONS.to_string();
    }

    Table::new(recommendations.to_vec()).to_string()
}
