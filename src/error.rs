use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook read error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not parse file as a table: {0}")]
    Parse(String),

    #[error("Invalid geometry document: {0}")]
    Geometry(String),
}

impl DashboardError {
    /// True for every failure that means "the uploaded file is not a table".
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            DashboardError::Csv(_) | DashboardError::Workbook(_) | DashboardError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
