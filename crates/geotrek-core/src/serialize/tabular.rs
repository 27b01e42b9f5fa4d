//! Flat tabular rows, shared by CSV and shapefile attribute tables

use super::Record;
use crate::Result;
use serde_json::Value;
use std::io::Write;

/// Separator for flattened collections
const LIST_SEPARATOR: &str = ", ";

/// Columns of a set of records in first-seen order, geometry excluded
pub fn columns_of(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for (name, _) in &record.fields {
            if name != "geometry" && !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

fn flatten(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        // Objects carry a label when they are related records
        Value::Object(map) => match map.get("label").or_else(|| map.get("name")) {
            Some(label) => flatten(label),
            None => value.to_string(),
        },
    }
}

/// Scalar-only row for `columns`; missing fields give empty cells
pub fn to_tabular(record: &Record, columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| record.get(column).map(flatten).unwrap_or_default())
        .collect()
}

/// Write a header line then every row
pub fn write_csv<W: Write>(writer: W, columns: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns)?;
    for row in rows {
        csv.write_record(row)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureKind;
    use serde_json::json;

    fn create_test_record() -> Record {
        Record {
            id: 7,
            kind: FeatureKind::Trek,
            geometry: None,
            bbox: None,
            fields: vec![
                ("id".to_string(), json!(7)),
                ("geometry".to_string(), Value::Null),
                ("name".to_string(), json!("Col de la Croix")),
                ("themes".to_string(), json!(["Faune", "Flore", "Patrimoine"])),
                ("cities".to_string(), json!([12, 15])),
                ("difficulty".to_string(), json!({"id": 2, "label": "Moyen"})),
                ("published".to_string(), json!(true)),
                ("duration".to_string(), Value::Null),
            ],
        }
    }

    #[test]
    fn test_row_flattening() {
        let record = create_test_record();
        let columns = columns_of(std::slice::from_ref(&record));
        assert!(!columns.contains(&"geometry".to_string()));

        let row = to_tabular(&record, &columns);
        assert_eq!(
            row,
            vec!["7", "Col de la Croix", "Faune, Flore, Patrimoine", "12, 15", "Moyen", "true", ""]
        );
    }

    #[test]
    fn test_missing_column_is_empty() {
        let record = create_test_record();
        let row = to_tabular(&record, &["id".to_string(), "ascent".to_string()]);
        assert_eq!(row, vec!["7", ""]);
    }

    #[test]
    fn test_write_csv_header_and_quoting() {
        let record = create_test_record();
        let columns = vec!["id".to_string(), "themes".to_string()];
        let rows = vec![to_tabular(&record, &columns)];
        let mut buffer = Vec::new();
        write_csv(&mut buffer, &columns, &rows).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "id,themes\n7,\"Faune, Flore, Patrimoine\"\n"
        );
    }
}
