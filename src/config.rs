// Runtime settings for a dashboard session.
//
// Everything here has a fixed default; the binary builds one config at
// startup and hands it to the session.
use std::path::PathBuf;

pub const BRAZIL_STATES_GEOJSON_URL: &str = "https://raw.githubusercontent.com/codeforamerica/click_that_hood/master/public/data/brazil-states.geojson";

/// Sheet looked up first when reading a workbook.
pub const DEFAULT_SHEET_NAME: &str = "DROP OFF";

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub geojson_url: String,
    pub sheet_name: String,
    /// Where exports, the annotated map and the JSON summary are written.
    pub output_dir: PathBuf,
    /// Rows shown in the terminal detail table (the export always has all rows).
    pub preview_rows: usize,
    /// Width in characters of the longest bar in the status chart.
    pub bar_width: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            geojson_url: BRAZIL_STATES_GEOJSON_URL.to_string(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            output_dir: PathBuf::from("."),
            preview_rows: 20,
            bar_width: 40,
        }
    }
}
