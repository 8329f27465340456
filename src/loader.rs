use crate::error::{DashboardError, Result};
use crate::normalize::normalize_dataset;
use crate::types::Dataset;
use crate::util::format_float_cell;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::Timelike;
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Workbook { sheet: String },
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub source: SourceKind,
    pub total_rows: usize,
    pub blank_rows: usize,
    pub ragged_rows: usize,
    pub columns_renamed: usize,
    pub regions_changed: usize,
    pub cities_changed: usize,
}

/// What makes two uploads "the same file" for caching purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileIdentity {
    pub fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            path,
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Read a CSV or workbook file and return it with canonical columns and
/// normalized values.
pub fn load_dataset(path: &Path, sheet_name: &str) -> Result<(Dataset, LoadReport)> {
    let raw = if is_csv(path) {
        read_csv(path)?
    } else {
        read_workbook(path, sheet_name)?
    };
    let RawTable {
        source,
        mut dataset,
        blank_rows,
        ragged_rows,
    } = raw;

    if dataset.columns.is_empty() {
        return Err(DashboardError::Parse(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let stats = normalize_dataset(&mut dataset);
    let report = LoadReport {
        source,
        total_rows: dataset.len(),
        blank_rows,
        ragged_rows,
        columns_renamed: stats.columns_renamed,
        regions_changed: stats.regions_changed,
        cities_changed: stats.cities_changed,
    };
    info!(
        path = %path.display(),
        rows = report.total_rows,
        columns = dataset.columns.len(),
        "loaded dataset"
    );
    Ok((dataset, report))
}

struct RawTable {
    source: SourceKind,
    dataset: Dataset,
    blank_rows: usize,
    ragged_rows: usize,
}

/// Accumulates rows under a fixed header, padding or truncating ragged
/// rows. Rows with no content are kept and counted.
struct TableBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    blank_rows: usize,
    ragged_rows: usize,
}

impl TableBuilder {
    fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            blank_rows: 0,
            ragged_rows: 0,
        }
    }

    fn push(&mut self, mut row: Vec<String>) {
        if row.iter().all(|c| c.trim().is_empty()) {
            self.blank_rows += 1;
        }
        let width = self.columns.len();
        if row.len() != width {
            if row[width.min(row.len())..].iter().any(|c| !c.trim().is_empty()) {
                warn!(expected = width, found = row.len(), "row has extra cells; truncating");
            }
            self.ragged_rows += 1;
            row.resize(width, String::new());
        }
        self.rows.push(row);
    }

    fn finish(self, source: SourceKind) -> RawTable {
        RawTable {
            source,
            dataset: Dataset::new(self.columns, self.rows),
            blank_rows: self.blank_rows,
            ragged_rows: self.ragged_rows,
        }
    }
}

fn read_csv(path: &Path) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut table = TableBuilder::new(headers);
    for result in rdr.records() {
        let record = result?;
        table.push(record.iter().map(str::to_string).collect());
    }
    Ok(table.finish(SourceKind::Csv))
}

fn read_workbook(path: &Path, sheet_name: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();
    let sheet = if sheet_names.iter().any(|s| s == sheet_name) {
        sheet_name.to_string()
    } else {
        let first = sheet_names.first().cloned().ok_or_else(|| {
            DashboardError::Parse(format!("{} contains no sheets", path.display()))
        })?;
        info!(wanted = sheet_name, using = %first, "sheet not found; using first sheet");
        first
    };

    let range = workbook.worksheet_range(&sheet)?;
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(cell_to_string).collect(),
        None => Vec::new(),
    };
    let mut table = TableBuilder::new(headers);
    for row in rows {
        table.push(row.iter().map(cell_to_string).collect());
    }
    Ok(table.finish(SourceKind::Workbook { sheet }))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_float_cell(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => "#ERROR".to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.num_seconds_from_midnight() == 0 => ndt.format("%Y-%m-%d").to_string(),
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_float_cell(dt.as_f64()),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::columns;
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn csv_is_loaded_and_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bases.csv");
        fs::write(
            &path,
            " Estado ,Cidade,Status 状态,CNPJ\n\
             sao paulo, s. paulo ,  Ativo ,123\n\
             ,,,\n\
             rj,rio de janiero,Parado\n",
        )
        .unwrap();

        let (ds, report) = load_dataset(&path, "DROP OFF").unwrap();
        assert_eq!(report.source, SourceKind::Csv);
        assert_eq!(ds.columns, vec![columns::REGION, columns::CITY, columns::STATUS, "CNPJ"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.blank_rows, 1);
        assert_eq!(report.ragged_rows, 1);
        assert_eq!(report.columns_renamed, 2);
        assert_eq!(ds.rows[0], vec!["SP", "São Paulo", "Ativo", "123"]);
        assert_eq!(ds.rows[1], vec!["", "", "", ""]);
        assert_eq!(ds.rows[2], vec!["RJ", "Rio De Janeiro", "Parado", ""]);
    }

    #[test]
    fn blank_rows_count_toward_totals() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bases.csv");
        fs::write(&path, "UF,Status 状态\nSP,Ativo\n,\nRJ,Ativo\n").unwrap();

        let (ds, report) = load_dataset(&path, "DROP OFF").unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(report.blank_rows, 1);
        assert_eq!(ds.rows[1], vec!["", ""]);

        let dash = crate::reports::build_dashboard(&ds, &crate::filter::FilterCriteria::default());
        assert_eq!(dash.metrics.total, 3);
        assert_eq!(dash.map_counts.other.get(""), Some(&1));
    }

    #[test]
    fn blank_workbook_rows_between_data_are_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gaps.xlsx");
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.write_string(0, 0, "UF").unwrap();
        ws.write_string(0, 1, "Cidade").unwrap();
        ws.write_string(1, 0, "sp").unwrap();
        ws.write_string(3, 0, "rj").unwrap();
        ws.write_string(3, 1, "niterói").unwrap();
        wb.save(&path).unwrap();

        let (ds, report) = load_dataset(&path, "DROP OFF").unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(report.blank_rows, 1);
        assert_eq!(ds.rows[1], vec!["", ""]);
        assert_eq!(ds.rows[2], vec!["RJ", "Niterói"]);
    }

    #[test]
    fn csv_with_invalid_utf8_is_a_parse_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, b"UF,Cidade\n\xff\xfe,x\n").unwrap();
        let err = load_dataset(&path, "DROP OFF").unwrap_err();
        assert!(err.is_parse_failure(), "{err}");
    }

    #[test]
    fn garbage_workbook_is_a_parse_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not_really.xlsx");
        fs::write(&path, "this is not a zip archive").unwrap();
        let err = load_dataset(&path, "DROP OFF").unwrap_err();
        assert!(err.is_parse_failure(), "{err}");
    }

    fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<&str>>)]) {
        let mut wb = Workbook::new();
        for (name, rows) in sheets {
            let ws = wb.add_worksheet();
            ws.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    ws.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
        wb.save(path).unwrap();
    }

    #[test]
    fn workbook_prefers_drop_off_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bases.xlsx");
        write_workbook(
            &path,
            &[
                ("Resumo", vec![vec!["x"], vec!["1"]]),
                ("DROP OFF", vec![vec!["UF", "Municipio"], vec!["minas gerais", "bhz"]]),
            ],
        );

        let (ds, report) = load_dataset(&path, "DROP OFF").unwrap();
        assert_eq!(
            report.source,
            SourceKind::Workbook {
                sheet: "DROP OFF".to_string()
            }
        );
        assert_eq!(ds.columns, vec![columns::REGION, columns::CITY]);
        assert_eq!(ds.rows, vec![vec!["MG".to_string(), "Belo Horizonte".to_string()]]);
    }

    #[test]
    fn workbook_falls_back_to_first_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bases.xlsx");
        write_workbook(
            &path,
            &[
                ("Planilha1", vec![vec!["UF", "Status 状态"], vec!["sp", "Ativo"]]),
                ("Outra", vec![vec!["nada"]]),
            ],
        );

        let (ds, report) = load_dataset(&path, "DROP OFF").unwrap();
        assert_eq!(
            report.source,
            SourceKind::Workbook {
                sheet: "Planilha1".to_string()
            }
        );
        assert_eq!(ds.rows[0], vec!["SP", "Ativo"]);
    }

    #[test]
    fn numeric_workbook_cells_are_rendered_as_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("numbers.xlsx");
        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.write_string(0, 0, "UF").unwrap();
        ws.write_string(0, 1, "CNPJ").unwrap();
        ws.write_string(1, 0, "SP").unwrap();
        ws.write_number(1, 1, 12345678.0).unwrap();
        wb.save(&path).unwrap();

        let (ds, _) = load_dataset(&path, "DROP OFF").unwrap();
        assert_eq!(ds.rows[0], vec!["SP", "12345678"]);
    }

    #[test]
    fn identity_changes_when_file_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.csv");
        fs::write(&path, "UF\nSP\n").unwrap();
        let first = FileIdentity::of(&path).unwrap();
        assert_eq!(first, FileIdentity::of(&path).unwrap());
        fs::write(&path, "UF\nSP\nRJ\n").unwrap();
        assert_ne!(first, FileIdentity::of(&path).unwrap());
    }
}
