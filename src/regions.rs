// The 27 Brazilian federative units (26 states plus the Federal District).
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Code → display name, sorted by code. The display names match the
/// `name` property of the state-boundary GeoJSON.
pub const REGIONS: [(&str, &str); 27] = [
    ("AC", "Acre"),
    ("AL", "Alagoas"),
    ("AM", "Amazonas"),
    ("AP", "Amapá"),
    ("BA", "Bahia"),
    ("CE", "Ceará"),
    ("DF", "Distrito Federal"),
    ("ES", "Espírito Santo"),
    ("GO", "Goiás"),
    ("MA", "Maranhão"),
    ("MG", "Minas Gerais"),
    ("MS", "Mato Grosso do Sul"),
    ("MT", "Mato Grosso"),
    ("PA", "Pará"),
    ("PB", "Paraíba"),
    ("PE", "Pernambuco"),
    ("PI", "Piauí"),
    ("PR", "Paraná"),
    ("RJ", "Rio de Janeiro"),
    ("RN", "Rio Grande do Norte"),
    ("RO", "Rondônia"),
    ("RR", "Roraima"),
    ("RS", "Rio Grande do Sul"),
    ("SC", "Santa Catarina"),
    ("SE", "Sergipe"),
    ("SP", "São Paulo"),
    ("TO", "Tocantins"),
];

static BY_CODE: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| REGIONS.iter().copied().collect());

static BY_NAME: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| REGIONS.iter().map(|&(code, name)| (name, code)).collect());

pub fn region_code(name: &str) -> Option<&'static str> {
    BY_NAME.get(name).copied()
}

pub fn is_known_region(code: &str) -> bool {
    BY_CODE.contains_key(code)
}
