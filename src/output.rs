use crate::error::Result;
use crate::types::{columns, DatasetView, StatusCount};
use crate::util::{bar, file_name_fragment, numeric_cell};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::info;

pub const EXPORT_SHEET_NAME: &str = "DROP OFF";

pub fn export_file_name(selected: Option<&str>, all_marker: &str) -> String {
    format!("dados_{}.xlsx", file_name_fragment(selected.unwrap_or(all_marker)))
}

pub fn map_file_name(selected: Option<&str>, all_marker: &str) -> String {
    format!("mapa_{}.geojson", file_name_fragment(selected.unwrap_or(all_marker)))
}

/// Write every column of the view to a single-sheet workbook. Cells whose
/// text is a plain number are written as numbers.
pub fn write_xlsx(path: &Path, view: &DatasetView<'_>) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET_NAME)?;

    for (col, name) in view.dataset().columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header)?;
    }
    for (r, row) in view.rows().enumerate() {
        for (col, value) in row.iter().enumerate() {
            let (cell_row, cell_col) = (r as u32 + 1, col as u16);
            if let Some(number) = numeric_cell(value) {
                worksheet.write_number(cell_row, cell_col, number)?;
            } else if !value.is_empty() {
                worksheet.write_string(cell_row, cell_col, value)?;
            }
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();

    workbook.save(path)?;
    info!(path = %path.display(), rows = view.len(), "exported filtered rows");
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Horizontal bar chart of status counts, one line per status.
pub fn render_status_chart(counts: &[StatusCount], width: usize) -> String {
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);
    let label_width = counts
        .iter()
        .map(|c| c.status.chars().count())
        .max()
        .unwrap_or(0);
    counts
        .iter()
        .map(|c| {
            let pad = label_width - c.status.chars().count();
            format!(
                "{}{} | {} {}",
                c.status,
                " ".repeat(pad),
                bar(c.count, max, width),
                c.count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The detail columns present in the view, in display order.
pub fn detail_columns(view: &DatasetView<'_>) -> Vec<(usize, &'static str)> {
    let dataset = view.dataset();
    columns::DETAIL_ORDER
        .iter()
        .filter_map(|&name| dataset.column_index(name).map(|idx| (idx, name)))
        .collect()
}

/// Markdown table of the first `max_rows` rows restricted to the detail columns.
/// Returns `None` when the file has none of those columns.
pub fn render_detail_table(view: &DatasetView<'_>, max_rows: usize) -> Option<String> {
    let cols = detail_columns(view);
    if cols.is_empty() {
        return None;
    }
    let mut builder = Builder::default();
    builder.push_record(cols.iter().map(|(_, name)| name.to_string()).collect::<Vec<_>>());
    for row in view.rows().take(max_rows) {
        builder.push_record(
            cols.iter()
                .map(|(idx, _)| row.get(*idx).cloned().unwrap_or_default())
                .collect::<Vec<_>>(),
        );
    }
    Some(builder.build().with(Style::markdown()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_dataset;
    use crate::types::Dataset;
    use tempfile::tempdir;

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                "Observação".to_string(),
                columns::CITY.to_string(),
                columns::REGION.to_string(),
            ],
            vec![
                vec!["x".to_string(), "São Paulo".to_string(), "SP".to_string()],
                vec!["".to_string(), "Niterói".to_string(), "RJ".to_string()],
            ],
        )
    }

    #[test]
    fn file_names_use_selection_or_marker() {
        assert_eq!(export_file_name(Some("SP"), "Todos"), "dados_SP.xlsx");
        assert_eq!(export_file_name(None, "Todos"), "dados_Todos.xlsx");
        assert_eq!(map_file_name(Some("RJ"), "Todos"), "mapa_RJ.geojson");
    }

    #[test]
    fn detail_columns_follow_display_order() {
        let ds = dataset();
        let cols = detail_columns(&ds.view());
        assert_eq!(cols, vec![(2, columns::REGION), (1, columns::CITY)]);
        let table = render_detail_table(&ds.view(), 1).unwrap();
        assert!(table.contains("São Paulo"));
        assert!(!table.contains("Niterói"));
        assert!(!table.contains("Observação"));
    }

    #[test]
    fn detail_table_needs_known_columns() {
        let ds = Dataset::new(vec!["A".to_string()], vec![vec!["1".to_string()]]);
        assert!(render_detail_table(&ds.view(), 5).is_none());
    }

    #[test]
    fn status_chart_scales_bars() {
        let counts = vec![
            StatusCount {
                status: "Ativo".to_string(),
                count: 4,
            },
            StatusCount {
                status: "Parado".to_string(),
                count: 2,
            },
        ];
        let chart = render_status_chart(&counts, 8);
        let lines: Vec<&str> = chart.lines().collect();
        assert_eq!(lines[0], "Ativo  | ████████ 4");
        assert_eq!(lines[1], "Parado | ████ 2");
    }

    #[test]
    fn export_round_trips_through_loader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(export_file_name(Some("SP"), "Todos"));
        let ds = dataset();
        let mut view = ds.view();
        view.retain_by(columns::REGION, |v| v == "SP").unwrap();
        write_xlsx(&path, &view).unwrap();

        let (loaded, _) = load_dataset(&path, EXPORT_SHEET_NAME).unwrap();
        assert_eq!(loaded.columns, ds.columns);
        assert_eq!(loaded.rows, vec![ds.rows[0].clone()]);
    }

    #[test]
    fn json_is_written_pretty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");
        write_json(&path, &serde_json::json!({"total": 3})).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "{\n  \"total\": 3\n}");
    }

    #[test]
    fn numeric_text_is_exported_as_numbers() {
        use calamine::{open_workbook_auto, Data, Reader};

        let dir = tempdir().unwrap();
        let path = dir.path().join("typed.xlsx");
        let ds = Dataset::new(
            vec!["CNPJ".to_string(), "Código".to_string()],
            vec![vec!["12345678000190".to_string(), "0042".to_string()]],
        );
        write_xlsx(&path, &ds.view()).unwrap();

        let mut wb = open_workbook_auto(&path).unwrap();
        let range = wb.worksheet_range(EXPORT_SHEET_NAME).unwrap();
        assert_eq!(range.get_value((1, 0)), Some(&Data::Float(12345678000190.0)));
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("0042".to_string())));

        let (loaded, _) = load_dataset(&path, EXPORT_SHEET_NAME).unwrap();
        assert_eq!(loaded.rows, ds.rows);
    }
}
