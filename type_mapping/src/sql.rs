//! Rust type to column kind mapping
//!
//! The derive macro sees field types as token strings. These helpers map
//! those strings onto `FieldKind`s.

use crate::types::FieldKind;

/// Remove one `Option<...>` layer, if any
pub fn strip_option(rust_type: &str) -> &str {
    let trimmed = rust_type.trim();
    trimmed
        .strip_prefix("Option")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('<'))
        .and_then(|rest| rest.strip_suffix('>'))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Check if a Rust type is Optional (nullable in SQL)
pub fn is_optional_type(rust_type: &str) -> bool {
    strip_option(rust_type).len() != rust_type.trim().len()
}

/// Map a Rust type name to the column kind it is stored as.
///
/// Returns `None` for types that need an explicit `#[field(enumeration)]`
/// or `#[field(json)]` annotation.
pub fn rust_type_to_field_kind(rust_type: &str) -> Option<FieldKind> {
    // Normalize type string by removing all whitespace for consistent matching
    let normalized = strip_option(rust_type).replace(' ', "");
    let unqualified = unqualify(&normalized);

    let kind = match unqualified.as_str() {
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" => FieldKind::Integer,
        "f32" | "f64" => FieldKind::Float,
        "String" => FieldKind::Text,
        "bool" => FieldKind::Bool,
        "NaiveDate" => FieldKind::Date,
        "DateTime<Utc>" => FieldKind::DateTime,
        "Uuid" => FieldKind::Uuid,
        "Value" => FieldKind::Json,
        _ => return None,
    };
    Some(kind)
}

/// Keep only the last segment of every path in a type, generics included
///
/// `store_object::chrono::DateTime<::chrono::Utc>` becomes `DateTime<Utc>`.
fn unqualify(normalized: &str) -> String {
    let mut out = String::with_capacity(normalized.len());
    let mut segment = String::new();
    for c in normalized.chars() {
        match c {
            '<' | '>' | ',' => {
                out.push_str(last_segment(&segment));
                out.push(c);
                segment.clear();
            }
            _ => segment.push(c),
        }
    }
    out.push_str(last_segment(&segment));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
