use std::fmt::Write as _;

use dsp_core::layout::SectionId;
use dsp_core::{GameSave, Record, Value};
use serde_json::{Map as JsonMap, Value as JsonValue};

const INDENT: &str = "  ";
const SECTION_COL_WIDTH: usize = 10;
const VEIN_NAME_COL_WIDTH: usize = 30;
const LIST_INLINE_LIMIT: usize = 16;

/// Header fields and the full record tree. Each record carries its source
/// span under `"$span"`.
pub fn render_json(save: &GameSave) -> JsonValue {
    let header = &save.header;
    let mut out = JsonMap::new();
    out.insert(
        "format_version".to_string(),
        JsonValue::from(header.format_version),
    );
    out.insert(
        "game_version".to_string(),
        JsonValue::String(header.game_version.to_string()),
    );
    out.insert("file_length".to_string(), JsonValue::from(header.file_length));
    out.insert(
        "peace_mode".to_string(),
        header.peace_mode.map_or(JsonValue::Null, JsonValue::Bool),
    );
    out.insert(
        "sandbox_mode".to_string(),
        header.sandbox_mode.map_or(JsonValue::Null, JsonValue::Bool),
    );
    out.insert("game_tick".to_string(), JsonValue::from(header.game_tick));
    out.insert("now_ticks".to_string(), JsonValue::from(header.now_ticks));
    out.insert("image_bytes".to_string(), JsonValue::from(header.image.len()));
    out.insert("account".to_string(), record_to_json(&save.account));
    out.insert("game_data".to_string(), record_to_json(&save.game_data));
    out.insert(
        "trailing_bytes".to_string(),
        JsonValue::from(save.trailing.len()),
    );
    JsonValue::Object(out)
}

pub fn record_to_json(record: &Record) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "$type".to_string(),
        JsonValue::String(record.kind().name().to_string()),
    );
    let span = record.span();
    let mut span_json = JsonMap::new();
    span_json.insert("start".to_string(), JsonValue::from(span.start));
    span_json.insert("end".to_string(), JsonValue::from(span.end));
    out.insert("$span".to_string(), JsonValue::Object(span_json));
    for (name, value) in record.fields() {
        out.insert(name.to_string(), value_to_json(value));
    }
    JsonValue::Object(out)
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Bool(v) => JsonValue::Bool(*v),
        Value::U8(v) => JsonValue::from(*v),
        Value::I8(v) => JsonValue::from(*v),
        Value::U16(v) => JsonValue::from(*v),
        Value::I16(v) => JsonValue::from(*v),
        Value::U32(v) => JsonValue::from(*v),
        Value::I32(v) => JsonValue::from(*v),
        Value::U64(v) => JsonValue::from(*v),
        Value::I64(v) => JsonValue::from(*v),
        Value::F32(v) => JsonValue::from(f64::from(*v)),
        Value::F64(v) => JsonValue::from(*v),
        Value::Str(s) => JsonValue::String(s.clone()),
        Value::Bytes(bytes) => {
            let mut blob = JsonMap::new();
            blob.insert("$bytes".to_string(), JsonValue::from(bytes.len()));
            JsonValue::Object(blob)
        }
        Value::List(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
        Value::Record(record) => record_to_json(record),
        Value::Absent => JsonValue::Null,
    }
}

/// Indented record tree, one field per line.
pub fn render_text(save: &GameSave) -> String {
    let header = &save.header;
    let mut out = String::new();
    writeln!(
        out,
        "Dyson Sphere Program save (format {}, game {})",
        header.format_version, header.game_version
    )
    .expect("writing to String cannot fail");
    writeln!(out, "file_length: {}", header.file_length).expect("writing to String cannot fail");
    if let Some(peace) = header.peace_mode {
        writeln!(out, "peace_mode: {peace}").expect("writing to String cannot fail");
    }
    if let Some(sandbox) = header.sandbox_mode {
        writeln!(out, "sandbox_mode: {sandbox}").expect("writing to String cannot fail");
    }
    writeln!(out, "game_tick: {}", header.game_tick).expect("writing to String cannot fail");
    writeln!(out, "image: <bytes {}>", header.image.len()).expect("writing to String cannot fail");

    write_record(&mut out, &save.account, 0);
    write_record(&mut out, &save.game_data, 0);
    if !save.trailing.is_empty() {
        writeln!(out, "trailing: <bytes {}>", save.trailing.len())
            .expect("writing to String cannot fail");
    }
    out
}

fn write_record(out: &mut String, record: &Record, depth: usize) {
    writeln!(out, "{}{}", INDENT.repeat(depth), record_tag(record))
        .expect("writing to String cannot fail");
    write_fields(out, record, depth + 1);
}

fn write_fields(out: &mut String, record: &Record, depth: usize) {
    let pad = INDENT.repeat(depth);
    for (name, value) in record.fields() {
        match value {
            Value::Record(nested) => {
                writeln!(out, "{pad}{name}: {}", record_tag(nested))
                    .expect("writing to String cannot fail");
                write_fields(out, nested, depth + 1);
            }
            Value::List(items) if items.iter().any(|item| item.as_record().is_some()) => {
                writeln!(out, "{pad}{name}: {} items", items.len())
                    .expect("writing to String cannot fail");
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::Record(nested) => {
                            writeln!(out, "{pad}{INDENT}[{index}] {}", record_tag(nested))
                                .expect("writing to String cannot fail");
                            write_fields(out, nested, depth + 2);
                        }
                        other => {
                            writeln!(out, "{pad}{INDENT}[{index}] {}", scalar_text(other))
                                .expect("writing to String cannot fail");
                        }
                    }
                }
            }
            other => {
                writeln!(out, "{pad}{name}: {}", scalar_text(other))
                    .expect("writing to String cannot fail");
            }
        }
    }
}

fn record_tag(record: &Record) -> String {
    format!("<{} [{}]>", record.kind().name(), record.span())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Bool(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Str(s) => format!("{s:?}"),
        Value::Bytes(bytes) => format!("<bytes {}>", bytes.len()),
        Value::List(items) if items.len() > LIST_INLINE_LIMIT => {
            format!("<{} items>", items.len())
        }
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(scalar_text).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Record(record) => record_tag(record),
        Value::Absent => "-".to_string(),
    }
}

/// One line per file section with its byte range.
pub fn render_layout(save: &GameSave) -> String {
    let layout = save.layout();
    let mut out = String::new();
    writeln!(out, "file length: {} bytes", layout.file_len).expect("writing to String cannot fail");
    for section in &layout.sections {
        let name = match section.id {
            SectionId::Header => "Header",
            SectionId::Account => "Account",
            SectionId::GameData => "GameData",
            SectionId::Tail => "Tail",
        };
        writeln!(
            out,
            "{:<width$}{:>16} ({} bytes)",
            name,
            section.range.to_string(),
            section.range.len(),
            width = SECTION_COL_WIDTH
        )
        .expect("writing to String cannot fail");
    }
    out
}

/// Vein totals for every planet with a factory, largest first.
pub fn vein_summary(save: &GameSave) -> dsp_core::Result<String> {
    let mut out = String::new();
    for (index, factory) in save.factories().enumerate() {
        let planet_id = factory.int("planet_id").unwrap_or(-1);
        writeln!(out, "Planet {planet_id}").expect("writing to String cannot fail");
        let mut totals: Vec<_> = save.vein_totals(index)?.into_iter().collect();
        totals.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        if totals.is_empty() {
            writeln!(out, "{INDENT}(no veins)").expect("writing to String cannot fail");
        }
        for (kind, amount) in totals {
            let line = format!(
                "{INDENT}{:<width$}{:>14}",
                fit_column(&kind.to_string(), VEIN_NAME_COL_WIDTH),
                format_number_with_commas(amount),
                width = VEIN_NAME_COL_WIDTH
            );
            writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
        }
    }
    Ok(out)
}

/// Vein totals per planet keyed by vein type display name.
pub fn vein_summary_json(save: &GameSave) -> dsp_core::Result<JsonValue> {
    let mut planets = Vec::new();
    for (index, factory) in save.factories().enumerate() {
        let mut totals = JsonMap::new();
        for (kind, amount) in save.vein_totals(index)? {
            totals.insert(kind.to_string(), JsonValue::from(amount));
        }
        let mut planet = JsonMap::new();
        planet.insert(
            "planet_id".to_string(),
            JsonValue::from(factory.int("planet_id").unwrap_or(-1)),
        );
        planet.insert("veins".to_string(), JsonValue::Object(totals));
        planets.push(JsonValue::Object(planet));
    }
    Ok(JsonValue::Array(planets))
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}

fn format_number_with_commas(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    if n < 0 {
        result.insert(0, '-');
    }
    result
}
