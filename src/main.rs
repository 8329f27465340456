// Entry point and interactive menu.
//
// Each menu option is one request against the session: load a file, pick
// filters (applied only when confirmed), clear them, render the dashboard,
// or export the filtered rows. Rendering stages are independent, so a
// failed map download still leaves the counters, chart and table.
mod config;
mod error;
mod filter;
mod geo;
mod loader;
mod normalize;
mod output;
mod regions;
mod reports;
mod session;
mod types;
mod util;

use config::DashboardConfig;
use reqwest::blocking::Client;
use session::Session;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use types::{columns, ALL_REGIONS};

const NO_FILE_MESSAGE: &str =
    "No file loaded. Load an Excel or CSV file first (option 1).\n";

/// One trimmed line, or `None` once the input is closed or unreadable.
fn read_trimmed_line<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) => None,
        Ok(_) => Some(buf.trim().to_string()),
        Err(e) => {
            warn!(error = %e, "stdin read failed");
            None
        }
    }
}

/// Print `label` and read one trimmed line from stdin.
fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    match read_trimmed_line(&mut io::stdin().lock()) {
        Some(line) => line,
        None => {
            println!("\nExiting the program.");
            std::process::exit(0);
        }
    }
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

fn prompt_yes_no(label: &str) -> bool {
    loop {
        match prompt(label).to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Parse a comma-separated list of 1-based option numbers. Blank input
/// selects nothing (no constraint).
fn parse_selection(input: &str, options: &[String]) -> Result<BTreeSet<String>, String> {
    let mut selected = BTreeSet::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let n: usize = part
            .parse()
            .map_err(|_| format!("'{}' is not a number", part))?;
        let value = n
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .ok_or_else(|| format!("{} is out of range (1-{})", n, options.len()))?;
        selected.insert(value.clone());
    }
    Ok(selected)
}

/// Parse the region choice: 0 or blank means all regions.
fn parse_region(input: &str, options: &[String]) -> Result<Option<String>, String> {
    let input = input.trim();
    if input.is_empty() || input == "0" {
        return Ok(None);
    }
    let picked = parse_selection(input, options)?;
    if picked.len() > 1 {
        return Err("choose a single region".to_string());
    }
    Ok(picked.into_iter().next())
}

fn print_options(options: &[String]) {
    if options.is_empty() {
        println!("  (no options in this file)");
    }
    for (i, option) in options.iter().enumerate() {
        println!("  [{}] {}", i + 1, option);
    }
}

fn ask_until_valid<T>(label: &str, options: &[String], parse: fn(&str, &[String]) -> Result<T, String>) -> T {
    loop {
        match parse(&prompt(label), options) {
            Ok(value) => return value,
            Err(e) => println!("Invalid selection: {}", e),
        }
    }
}

/// Handle option [1]: load (or reuse) a file and print what the loader did.
fn handle_load(session: &mut Session) {
    let path = prompt("File path (.xlsx or .csv): ");
    if path.is_empty() {
        println!("{}", NO_FILE_MESSAGE);
        return;
    }
    match session.load(Path::new(&path)) {
        Ok(cached) => {
            let report = &cached.report;
            match &report.source {
                loader::SourceKind::Csv => println!("Read CSV file."),
                loader::SourceKind::Workbook { sheet } => println!("Read sheet '{}'.", sheet),
            }
            println!(
                "Processing dataset... ({} rows loaded, {} of them blank)",
                util::format_int(report.total_rows),
                util::format_int(report.blank_rows)
            );
            if cached.dataset.is_empty() {
                println!("Warning: the file has a header but no data rows.");
            }
            if report.ragged_rows > 0 {
                println!(
                    "Note: {} rows had a different number of cells than the header.",
                    util::format_int(report.ragged_rows)
                );
            }
            println!(
                "Info: {} columns renamed, {} UF values and {} city values corrected.\n",
                report.columns_renamed, report.regions_changed, report.cities_changed
            );
        }
        Err(e) if e.is_parse_failure() => eprintln!("Could not read the file as a table: {}\n", e),
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

/// Handle option [2]: collect a draft selection from every widget and
/// apply it only if the user confirms.
fn handle_filters(session: &mut Session) {
    let Some(cached) = session.dataset() else {
        println!("{}", NO_FILE_MESSAGE);
        return;
    };
    let dataset = &cached.dataset;
    let regions = filter::column_options(dataset, columns::REGION);
    let multi = [
        ("Status", columns::STATUS),
        ("Responsável que prospectou", columns::RESPONSIBLE),
        ("Cidade", columns::CITY),
        ("Base Consolidadora", columns::CONSOLIDATOR_BASE),
    ]
    .map(|(label, column)| (label, filter::column_options(dataset, column)));

    println!("Estado (UF):");
    println!("  [0] {}", ALL_REGIONS);
    print_options(&regions);
    let region = ask_until_valid("Choose one (blank = all): ", &regions, parse_region);

    let mut sets: Vec<BTreeSet<String>> = Vec::new();
    for (label, options) in &multi {
        println!("{}:", label);
        print_options(options);
        let picked = if options.is_empty() {
            BTreeSet::new()
        } else {
            ask_until_valid("Choose any (e.g. 1,3; blank = all): ", options, parse_selection)
        };
        sets.push(picked);
    }

    let mut sets = sets.into_iter();
    let draft = &mut session.draft;
    draft.region = region;
    draft.status = sets.next().unwrap_or_default();
    draft.responsible = sets.next().unwrap_or_default();
    draft.city = sets.next().unwrap_or_default();
    draft.consolidator_base = sets.next().unwrap_or_default();

    if prompt_yes_no("Apply filters (Y/N): ") {
        session.apply();
        println!("Filters applied.\n");
    } else {
        println!("Filters not applied; the dashboard still uses the previous selection.\n");
    }
}

fn render_map(session: &Session, client: &Client, dash: &reports::Dashboard<'_>) -> error::Result<()> {
    let geojson = geo::fetch_geojson(client, &session.config.geojson_url)?;
    let selected = dash.selected_region.as_deref();
    let map = geo::build_choropleth(&geojson, &dash.map_counts, selected)?;
    let file = output::map_file_name(selected, ALL_REGIONS);
    let path = session.config.output_dir.join(&file);
    output::write_json(&path, &map.geojson)?;

    println!("Distribuição de DROP OFF por Estado");
    output::preview_table_rows(&map.entries, map.entries.len());
    if !dash.map_counts.other.is_empty() {
        println!("Rows with an unrecognized UF (not on the map):");
        for (value, count) in &dash.map_counts.other {
            let shown = if value.is_empty() { "(blank)" } else { value.as_str() };
            println!("  {}: {}", shown, count);
        }
        println!();
    }
    if !map.unmatched_features.is_empty() {
        println!(
            "Note: {} map features did not match any UF.",
            map.unmatched_features.len()
        );
    }
    println!("(Map with highlight saved to {})\n", path.display());
    Ok(())
}

/// Handle option [4]: render every dashboard section for the applied filters.
fn handle_dashboard(session: &Session, client: &Client) {
    let Some(dash) = session.dashboard() else {
        println!("{}", NO_FILE_MESSAGE);
        return;
    };

    let applied = session.applied();
    if applied.is_empty() {
        println!("Filters: none (showing all rows)");
    } else {
        for constraint in applied.constraints() {
            let shown = match &constraint.condition {
                filter::Condition::Equals(v) => v.clone(),
                filter::Condition::OneOf(set) => set.iter().cloned().collect::<Vec<_>>().join(", "),
            };
            println!("Filter {}: {}", constraint.column, shown);
        }
    }
    println!();

    for column in &dash.ignored {
        println!("Warning: filter on '{}' ignored; the file has no such column.", column);
    }
    if !dash.ignored.is_empty() {
        println!();
    }

    if let Err(e) = render_map(session, client, &dash) {
        warn!(error = %e, "map rendering failed");
        println!("Map unavailable: {}\n", e);
    }

    println!("Indicadores");
    output::preview_table_rows(&[dash.metrics.clone()], 1);

    println!("Distribuição por Status");
    if dash.missing_status_column {
        println!("(the file has no Status column)\n");
    } else if dash.status_counts.is_empty() {
        println!("(no rows)\n");
    } else {
        println!(
            "{}\n",
            output::render_status_chart(&dash.status_counts, session.config.bar_width)
        );
    }

    println!("Detalhamento das Bases");
    match output::render_detail_table(&dash.view, session.config.preview_rows) {
        Some(table) => {
            println!("{}", table);
            println!(
                "(showing {} of {} rows)\n",
                util::format_int(dash.view.len().min(session.config.preview_rows)),
                util::format_int(dash.view.len())
            );
        }
        None => println!("(none of the detail columns are present)\n"),
    }

    let summary = reports::generate_summary(&dash, ALL_REGIONS);
    let path = session.config.output_dir.join("dashboard_summary.json");
    if let Err(e) = output::write_json(&path, &summary) {
        eprintln!("Write error: {}", e);
    }
}

/// Handle option [5]: export the filtered rows to a workbook.
fn handle_export(session: &Session) {
    let Some(dash) = session.dashboard() else {
        println!("{}", NO_FILE_MESSAGE);
        return;
    };
    let file = output::export_file_name(dash.selected_region.as_deref(), ALL_REGIONS);
    let path = session.config.output_dir.join(file);
    match output::write_xlsx(&path, &dash.view) {
        Ok(()) => println!(
            "Exported {} rows to {}\n",
            util::format_int(dash.view.len()),
            path.display()
        ),
        Err(e) => eprintln!("Write error: {}\n", e),
    }
}

fn main() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();
    info!("startup");

    let mut session = Session::new(DashboardConfig::default());
    let client = Client::new();

    println!("Dashboard DROP OFF\n");
    loop {
        println!("[1] Load a file");
        println!("[2] Choose filters");
        println!("[3] Clear filters");
        println!("[4] Show dashboard");
        println!("[5] Export filtered data (Excel)");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&mut session),
            "2" => handle_filters(&mut session),
            "3" => {
                session.clear();
                println!("Filters cleared.\n");
            }
            "4" => {
                println!();
                handle_dashboard(&session, &client);
            }
            "5" => handle_export(&session),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter a number from 0 to 5.\n"),
        }
    }
}
