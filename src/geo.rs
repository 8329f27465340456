// State-boundary geometry for the choropleth map.
//
// The GeoJSON is fetched once per render with a blocking GET and joined to
// region counts by display name (`properties.name`).
use crate::error::{DashboardError, Result};
use crate::regions::region_code;
use crate::reports::RegionCounts;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tabled::Tabled;
use tracing::{info, warn};

pub const HIGHLIGHT_SELECTED: &str = "Selecionado";
pub const HIGHLIGHT_OTHER: &str = "Outros";

pub fn fetch_geojson(client: &Client, url: &str) -> Result<Value> {
    info!(url = %url, "fetching state geometry");
    let doc: Value = client.get(url).send()?.error_for_status()?.json()?;
    Ok(doc)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct MapEntry {
    #[tabled(rename = "UF")]
    pub code: String,
    #[tabled(rename = "Estado")]
    pub name: String,
    #[tabled(rename = "Quantidade")]
    pub count: usize,
    #[tabled(rename = "Destaque")]
    pub highlight: &'static str,
}

#[derive(Debug, Clone)]
pub struct Choropleth {
    /// The input collection with `sigla`, `count` and `highlight` added to
    /// each matched feature's properties.
    pub geojson: Value,
    /// One entry per matched feature, in code order.
    pub entries: Vec<MapEntry>,
    /// Feature names that are not one of the 27 regions.
    pub unmatched_features: Vec<String>,
}

/// Join counts onto the features of a FeatureCollection.
pub fn build_choropleth(
    geojson: &Value,
    counts: &RegionCounts,
    selected: Option<&str>,
) -> Result<Choropleth> {
    let mut geojson = geojson.clone();
    let features = geojson
        .get_mut("features")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| DashboardError::Geometry("missing `features` array".to_string()))?;

    let mut entries = Vec::new();
    let mut unmatched_features = Vec::new();
    for feature in features.iter_mut() {
        let name = feature
            .pointer("/properties/name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string());
        let Some(name) = name else {
            unmatched_features.push(String::new());
            continue;
        };
        let Some(code) = region_code(&name) else {
            unmatched_features.push(name);
            continue;
        };
        let count = counts.count(code);
        let highlight = if selected == Some(code) {
            HIGHLIGHT_SELECTED
        } else {
            HIGHLIGHT_OTHER
        };
        if let Some(props) = feature.get_mut("properties").and_then(Value::as_object_mut) {
            props.insert("sigla".to_string(), json!(code));
            props.insert("count".to_string(), json!(count));
            props.insert("highlight".to_string(), json!(highlight));
        }
        entries.push(MapEntry {
            code: code.to_string(),
            name,
            count,
            highlight,
        });
    }

    if !unmatched_features.is_empty() {
        warn!(?unmatched_features, "features without a matching region");
    }
    entries.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(Choropleth {
        geojson,
        entries,
        unmatched_features,
    })
}
