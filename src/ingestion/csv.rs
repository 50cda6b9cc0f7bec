//! CSV loading with extra-comma repair.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::observability::Recovery;
use super::unified::Loaded;

/// Load a CSV file into a [`DataSet`], repairing over-wide rows if needed.
///
/// The file is first parsed as headerless, comma-separated data with whole-column type
/// inference. If a row has more fields than the first row, the same bytes are decoded as UTF-8,
/// passed through [`repair_extra_commas`] and parsed again; the result then carries
/// [`Recovery::ExtraComma`]. A failed repaired parse is returned as-is.
///
/// An empty file is [`LoadError::EmptyInput`]; invalid UTF-8 in a file needing repair is
/// [`LoadError::Utf8`].
pub fn load_csv_from_path(path: impl AsRef<Path>) -> LoadResult<Loaded<DataSet>> {
    let bytes = fs::read(path.as_ref())?;
    match read_table(bytes.as_slice()) {
        Ok(ds) => Ok(Loaded::clean(ds)),
        Err(LoadError::RaggedRow { .. }) => {
            let repaired = repair_extra_commas(std::str::from_utf8(&bytes)?);
            let ds = read_table(repaired.as_bytes())?;
            Ok(Loaded::recovered(ds, Recovery::ExtraComma))
        }
        Err(e) => Err(e),
    }
}

/// Parse headerless comma-separated data into a [`DataSet`].
///
/// Rules:
///
/// - The first row fixes the column count; columns are named `"0"`, `"1"`, ...
/// - Shorter rows are padded with [`Value::Null`]; longer rows are [`LoadError::RaggedRow`].
/// - Each column's type is inferred from all of its non-empty cells: `Int64`, then `Float64`,
///   then `Bool` (`true`/`false`), otherwise `Utf8`.
/// - Empty cells are [`Value::Null`].
pub fn read_table<R: Read>(reader: R) -> LoadResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .flexible(true)
        .from_reader(reader);

    let mut records: Vec<csv::StringRecord> = Vec::new();
    let mut width: Option<usize> = None;
    for result in rdr.records() {
        let record = result?;
        let expected = *width.get_or_insert(record.len());
        if record.len() > expected {
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(records.len() as u64 + 1);
            return Err(LoadError::RaggedRow {
                line,
                expected,
                found: record.len(),
            });
        }
        records.push(record);
    }

    let Some(width) = width else {
        return Err(LoadError::EmptyInput);
    };

    let types: Vec<DataType> = (0..width).map(|col| infer_column_type(&records, col)).collect();
    let schema = Schema::new(
        types
            .iter()
            .enumerate()
            .map(|(i, dt)| Field::new(i.to_string(), *dt))
            .collect(),
    );

    let rows = records
        .iter()
        .map(|record| {
            types
                .iter()
                .enumerate()
                .map(|(col, dt)| typed_value(*dt, record.get(col).unwrap_or("")))
                .collect()
        })
        .collect();

    Ok(DataSet::new(schema, rows))
}

/// Strip one excess comma from every over-wide line, and all double quotes.
///
/// The expected field count is taken from the first line. Every line whose comma count is
/// greater than or equal to that field count loses its rightmost comma. Line terminators are
/// preserved.
pub fn repair_extra_commas(text: &str) -> String {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return String::new();
    };
    let expected_fields = first.matches(',').count() + 1;

    let mut out = String::with_capacity(text.len());
    push_unquoted(&mut out, first);
    for line in lines {
        let commas = line.matches(',').count();
        match line.rfind(',').filter(|_| commas >= expected_fields) {
            Some(idx) => {
                push_unquoted(&mut out, &line[..idx]);
                push_unquoted(&mut out, &line[idx + 1..]);
            }
            None => push_unquoted(&mut out, line),
        }
    }
    out
}

fn push_unquoted(out: &mut String, s: &str) {
    out.extend(s.chars().filter(|&c| c != '"'));
}

fn infer_column_type(records: &[csv::StringRecord], col: usize) -> DataType {
    let cells: Vec<&str> = records
        .iter()
        .filter_map(|r| r.get(col))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if cells.is_empty() {
        DataType::Utf8
    } else if cells.iter().all(|s| s.parse::<i64>().is_ok()) {
        DataType::Int64
    } else if cells.iter().all(|s| s.parse::<f64>().is_ok()) {
        DataType::Float64
    } else if cells.iter().all(|s| parse_bool(s).is_some()) {
        DataType::Bool
    } else {
        DataType::Utf8
    }
}

fn typed_value(data_type: DataType, raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    let utf8 = || Value::Utf8(trimmed.to_owned());
    match data_type {
        DataType::Utf8 => utf8(),
        DataType::Int64 => trimmed.parse::<i64>().map(Value::Int64).unwrap_or_else(|_| utf8()),
        DataType::Float64 => trimmed.parse::<f64>().map(Value::Float64).unwrap_or_else(|_| utf8()),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool).unwrap_or_else(utf8),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{read_table, repair_extra_commas};
    use crate::error::LoadError;
    use crate::types::{DataType, Value};

    #[test]
    fn infers_types_over_whole_column() {
        let ds = read_table("1,a,1.5,true\n2,b,2,FALSE\n3,,x,\n".as_bytes()).unwrap();
        let types: Vec<DataType> = ds.schema.fields.iter().map(|f| f.data_type).collect();
        assert_eq!(
            types,
            vec![DataType::Int64, DataType::Utf8, DataType::Utf8, DataType::Bool]
        );
        assert_eq!(ds.rows[1][2], Value::Utf8("2".to_string()));
        assert_eq!(ds.rows[2][1], Value::Null);
        assert_eq!(ds.rows[2][3], Value::Null);
    }

    #[test]
    fn short_rows_are_padded() {
        let ds = read_table("1,2,3\n4\n".as_bytes()).unwrap();
        assert_eq!(ds.rows[1], vec![Value::Int64(4), Value::Null, Value::Null]);
    }

    #[test]
    fn long_rows_are_ragged() {
        let err = read_table("1,2\n3,4,5\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::RaggedRow {
                line: 2,
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn empty_input_has_no_columns() {
        assert!(matches!(read_table("".as_bytes()), Err(LoadError::EmptyInput)));
    }

    #[test]
    fn repair_strips_only_the_rightmost_comma() {
        let text = "a,b,c\n1,2,3,\n4,5,6\n7,\"8\",9,,\n";
        assert_eq!(repair_extra_commas(text), "a,b,c\n1,2,3\n4,5,6\n7,8,9,\n");
    }

    #[test]
    fn repair_of_empty_text_is_empty() {
        assert_eq!(repair_extra_commas(""), "");
    }
}
