// Small string and formatting helpers shared by the loader and the
// renderers.
use num_format::{Locale, ToFormattedString};

/// Title-case a string the way spreadsheet users expect city names to look.
///
/// A word is a run of alphabetic characters: its first letter is upper-cased
/// and the rest lower-cased. Any other character (space, dot, digit,
/// apostrophe) ends the word. Applying it twice gives the same result.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Render a workbook float as text; integral values lose the `.0`.
pub fn format_float_cell(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// The number a cell's text stands for, when writing it back as that number
/// reproduces the same text. Leading zeros and exponents stay text.
pub fn numeric_cell(s: &str) -> Option<f64> {
    let f: f64 = s.parse().ok()?;
    (f.is_finite() && format_float_cell(f) == s).then_some(f)
}

/// Make a value safe to use inside a file name.
pub fn file_name_fragment(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// A horizontal bar scaled so that `max` fills `width` characters.
/// Non-zero values always get at least one block.
pub fn bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let len = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(len.max(1))
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `1,234 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
