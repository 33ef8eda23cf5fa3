//! XLSX first-sheet extraction into JSON row objects.
//!
//! Only the first sheet in declared order is read. The first row of the
//! sheet's used range supplies the keys; every following row becomes one
//! object mapping header → cell value, with empty cells left out and
//! all-empty rows skipped.

use crate::error::ConvertError;
use calamine::{open_workbook, CellErrorType, Data, Range, Reader, Xlsx};
use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

const EMPTY_HEADER: &str = "__EMPTY";

/// Largest integer an f64 represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Read the first sheet of the workbook at `path` as row objects.
///
/// Blocking; call from `spawn_blocking`.
pub fn first_sheet_rows(path: &Path) -> Result<Vec<Value>, ConvertError> {
    let corrupt = |detail: String| ConvertError::CorruptXlsx {
        path: path.to_path_buf(),
        detail,
    };

    let mut workbook = open_workbook::<Xlsx<_>, _>(path).map_err(|e| corrupt(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    let first = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ConvertError::EmptyWorkbook {
            path: path.to_path_buf(),
        })?;
    if sheet_names.len() > 1 {
        debug!(
            "Workbook has {} sheets; reading only '{}'",
            sheet_names.len(),
            first
        );
    }

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| corrupt(format!("sheet '{first}': {e}")))?;

    let rows = rows_to_objects(&range);
    info!("Sheet '{}': {} data rows", first, rows.len());
    Ok(rows)
}

/// Turn a cell range into header-keyed objects.
fn rows_to_objects(range: &Range<Data>) -> Vec<Value> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers = unique_headers(header_row);

    rows.filter_map(|row| {
        let object: Map<String, Value> = headers
            .iter()
            .zip(row)
            .filter_map(|(key, cell)| cell_value(cell).map(|v| (key.clone(), v)))
            .collect();
        (!object.is_empty()).then_some(Value::Object(object))
    })
    .collect()
}

/// Header names with blanks filled in and duplicates suffixed `_1`, `_2`, ….
fn unique_headers(row: &[Data]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();

    row.iter()
        .map(|cell| {
            let base = match header_text(cell) {
                text if text.is_empty() => EMPTY_HEADER.to_string(),
                text => text,
            };
            let mut name = base.clone();
            while seen.contains(&name) {
                let n = counters.entry(base.clone()).or_insert(0);
                *n += 1;
                name = format!("{base}_{n}");
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => format_float(dt.as_f64()),
        Data::Error(e) => e.to_string(),
    }
}

/// JSON value for a data cell; `None` for empty and error cells.
///
/// `#NULL!` is kept as JSON `null`.
fn cell_value(cell: &Data) -> Option<Value> {
    let value = match cell {
        Data::Empty => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => float_value(dt.as_f64()),
        Data::Error(CellErrorType::Null) => Value::Null,
        Data::Error(_) => return None,
    };
    Some(value)
}

/// Integral floats become JSON integers; non-finite values become `null`.
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/common/workbook.rs"]
mod workbook_fixture;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    pub(crate) use super::workbook_fixture::{sample_xlsx, Cell};

    fn read(bytes: &[u8]) -> Result<Vec<Value>, ConvertError> {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(bytes).unwrap();
        first_sheet_rows(tmp.path())
    }

    #[test]
    fn header_row_keys_and_first_sheet_only() {
        let bytes = sample_xlsx(&[
            (
                "People",
                vec![
                    vec![Cell::Str("Name"), Cell::Str("Age")],
                    vec![Cell::Str("Ana"), Cell::Str("30")],
                ],
            ),
            (
                "Hidden",
                vec![vec![Cell::Str("Other")], vec![Cell::Str("ignored")]],
            ),
        ]);
        assert_eq!(read(&bytes).unwrap(), vec![json!({ "Name": "Ana", "Age": "30" })]);
    }

    #[test]
    fn numbers_and_booleans_keep_their_types() {
        let bytes = sample_xlsx(&[(
            "S",
            vec![
                vec![Cell::Str("Name"), Cell::Str("Age"), Cell::Str("Score"), Cell::Str("Active")],
                vec![Cell::Str("Ana"), Cell::Num(30.0), Cell::Num(9.5), Cell::Bool(true)],
            ],
        )]);
        let rows = read(&bytes).unwrap();
        assert_eq!(
            rows,
            vec![json!({ "Name": "Ana", "Age": 30, "Score": 9.5, "Active": true })]
        );
        assert_eq!(
            serde_json::to_string(&rows[0]).unwrap(),
            r#"{"Name":"Ana","Age":30,"Score":9.5,"Active":true}"#
        );
    }

    #[test]
    fn empty_cells_omitted_and_blank_rows_skipped() {
        let bytes = sample_xlsx(&[(
            "S",
            vec![
                vec![Cell::Str("A"), Cell::Str("B")],
                vec![Cell::Str("x"), Cell::Blank],
                vec![Cell::Blank, Cell::Blank],
                vec![Cell::Blank, Cell::Str("y")],
            ],
        )]);
        assert_eq!(read(&bytes).unwrap(), vec![json!({ "A": "x" }), json!({ "B": "y" })]);
    }

    #[test]
    fn header_only_sheet_is_empty_array() {
        let bytes = sample_xlsx(&[("S", vec![vec![Cell::Str("Only")]])]);
        assert!(read(&bytes).unwrap().is_empty());
    }

    #[test]
    fn duplicate_and_blank_headers() {
        let header = [
            Data::String("Name".into()),
            Data::String("Name".into()),
            Data::Empty,
            Data::Empty,
            Data::Float(2024.0),
        ];
        assert_eq!(
            unique_headers(&header),
            vec!["Name", "Name_1", "__EMPTY", "__EMPTY_1", "2024"]
        );
    }

    #[test]
    fn header_whitespace_is_kept() {
        let header = [Data::String(" Name ".into()), Data::String("Name".into())];
        assert_eq!(unique_headers(&header), vec![" Name ", "Name"]);

        let bytes = sample_xlsx(&[(
            "S",
            vec![
                vec![Cell::Str(" Name "), Cell::Str("Name")],
                vec![Cell::Str("padded"), Cell::Str("plain")],
            ],
        )]);
        assert_eq!(
            read(&bytes).unwrap(),
            vec![json!({ " Name ": "padded", "Name": "plain" })]
        );
    }

    #[test]
    fn error_cells_left_out_except_null() {
        let bytes = sample_xlsx(&[(
            "S",
            vec![
                vec![Cell::Str("Ratio"), Cell::Str("Ref"), Cell::Str("Gap"), Cell::Str("Id")],
                vec![
                    Cell::Error("#DIV/0!"),
                    Cell::Error("#REF!"),
                    Cell::Error("#NULL!"),
                    Cell::Num(7.0),
                ],
            ],
        )]);
        assert_eq!(
            read(&bytes).unwrap(),
            vec![json!({ "Gap": null, "Id": 7 })]
        );
    }

    #[test]
    fn float_values() {
        assert_eq!(float_value(3.0), json!(3));
        assert_eq!(float_value(-0.25), json!(-0.25));
        assert_eq!(float_value(f64::NAN), Value::Null);
    }

    #[test]
    fn garbage_is_corrupt_xlsx() {
        let err = read(b"not a workbook").unwrap_err();
        assert!(matches!(err, ConvertError::CorruptXlsx { .. }), "got {err:?}");
    }
}
