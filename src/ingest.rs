use crate::config::{ReportConfig, Variant};
use crate::error::ReportError;
use crate::record::{self, AlertRecord, IncidentFields};
use crate::timestamp::parse_timestamp;
use calamine::{open_workbook_auto, Data, Reader};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    JsonLines,
    Excel,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(InputFormat::Csv),
            "jsonl" | "ndjson" | "json" => Ok(InputFormat::JsonLines),
            "xlsx" | "xlsm" | "xls" => Ok(InputFormat::Excel),
            other => Err(ReportError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{other}")
            })),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub line: usize,
    pub cells: Vec<String>,
}

/// An input table with text cells, rows in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn load_table(path: &Path, format: Option<InputFormat>) -> Result<Table, ReportError> {
    let format = match format {
        Some(f) => f,
        None => InputFormat::from_path(path)?,
    };
    match format {
        InputFormat::Csv => read_csv(File::open(path)?),
        InputFormat::JsonLines => read_json_lines(BufReader::new(File::open(path)?)),
        InputFormat::Excel => read_excel(path),
    }
}

pub fn read_csv<R: Read>(reader: R) -> Result<Table, ReportError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let rec = result?;
        let line = rec.position().map(|p| p.line() as usize).unwrap_or(idx + 2);
        let mut cells: Vec<String> = rec.iter().map(|c| c.to_string()).collect();
        cells.resize(headers.len(), String::new());
        rows.push(TableRow { line, cells });
    }
    Ok(Table { headers, rows })
}

/// Read the first worksheet of a workbook. The first row of the used range is
/// the header; rows with no text in any cell are skipped.
pub fn read_excel(path: &Path) -> Result<Table, ReportError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Table::default()),
    };
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(cells) => cells.iter().map(excel_cell_text).collect(),
        None => return Ok(Table::default()),
    };
    let mut rows = Vec::new();
    for (idx, cells) in sheet_rows.enumerate() {
        let mut cells: Vec<String> = cells.iter().map(excel_cell_text).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        cells.resize(headers.len(), String::new());
        rows.push(TableRow { line: first_line + idx + 1, cells });
    }
    Ok(Table { headers, rows })
}

/// Whole numbers lose the `.0` Excel stores them with; date cells use the
/// `YYYY-MM-DD HH:MM:SS` form the timestamp parser reads.
fn excel_cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        other => other.to_string(),
    }
}

/// Read one JSON object per line; nested objects flatten to dotted keys.
/// Headers are the union of keys in first-seen order.
pub fn read_json_lines<R: BufRead>(reader: R) -> Result<Table, ReportError> {
    let mut headers: IndexSet<String> = IndexSet::new();
    let mut parsed: Vec<(usize, IndexMap<String, String>)> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let v: Value = serde_json::from_str(&line).map_err(|source| ReportError::Json { line: line_no, source })?;
        if !v.is_object() {
            return Err(ReportError::NotJsonObject(line_no));
        }
        let mut flat = IndexMap::new();
        flatten_json("", &v, &mut flat);
        for k in flat.keys() {
            headers.insert(k.clone());
        }
        parsed.push((line_no, flat));
    }
    let headers: Vec<String> = headers.into_iter().collect();
    let rows = parsed
        .into_iter()
        .map(|(line, mut flat)| TableRow {
            line,
            cells: headers.iter().map(|h| flat.swap_remove(h).unwrap_or_default()).collect(),
        })
        .collect();
    Ok(Table { headers, rows })
}

fn flatten_json(prefix: &str, v: &Value, out: &mut IndexMap<String, String>) {
    match v {
        Value::Object(map) => {
            for (k, v) in map.iter() {
                let key = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
                flatten_json(&key, v, out);
            }
        }
        Value::Array(arr) => {
            for (idx, item) in arr.iter().enumerate() {
                let key = if prefix.is_empty() { idx.to_string() } else { format!("{prefix}.{idx}") };
                flatten_json(&key, item, out);
            }
        }
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
    }
}

/// Every required column absent from the header, in required order.
pub fn missing_columns(table: &Table, cfg: &ReportConfig) -> Vec<String> {
    record::required_columns(cfg)
        .into_iter()
        .filter(|c| table.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect()
}

pub fn check_schema(table: &Table, cfg: &ReportConfig) -> Result<(), ReportError> {
    let missing = missing_columns(table, cfg);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReportError::MissingColumns(missing))
    }
}

struct ColumnMap {
    source: usize,
    descriptor: usize,
    category: usize,
    application: usize,
    incident: Option<[usize; 4]>,
}

impl ColumnMap {
    fn resolve(table: &Table, cfg: &ReportConfig) -> Result<Self, ReportError> {
        check_schema(table, cfg)?;
        let idx = |name: &str| table.column_index(name).ok_or_else(|| ReportError::MissingColumns(vec![name.to_string()]));
        let incident = match cfg.variant {
            Variant::Basic => None,
            Variant::Extended => Some([
                idx(record::COL_ACK_STATUS)?,
                idx(record::COL_CREATED_ON)?,
                idx(record::COL_ENVIRONMENT)?,
                idx(record::COL_UPDATE_CATEGORY)?,
            ]),
        };
        Ok(Self {
            source: idx(record::COL_SOURCE)?,
            descriptor: idx(cfg.descriptor.column())?,
            category: idx(record::COL_CATEGORY)?,
            application: idx(record::COL_APPLICATION)?,
            incident,
        })
    }
}

/// Blank cells and the `NaN`/`NaT` markers spreadsheet exports write for a
/// missing date.
fn is_blank_timestamp(raw: &str) -> bool {
    let t = raw.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan") || t.eq_ignore_ascii_case("nat")
}

/// Validate the schema and build typed records. A blank `createdOn` is kept
/// as `None`; the first non-blank unparsable one fails the whole table.
pub fn to_records(table: &Table, cfg: &ReportConfig) -> Result<Vec<AlertRecord>, ReportError> {
    let cols = ColumnMap::resolve(table, cfg)?;
    let mut out = Vec::with_capacity(table.len());
    for row in &table.rows {
        let cell = |i: usize| row.cells.get(i).cloned().unwrap_or_default();
        let incident = match cols.incident {
            None => None,
            Some([ack, created, env, upd]) => {
                let raw = cell(created);
                let created_on = if is_blank_timestamp(&raw) {
                    None
                } else {
                    Some(parse_timestamp(&raw).ok_or(ReportError::InvalidTimestamp { row: row.line, value: raw })?)
                };
                Some(IncidentFields {
                    ack_status: cell(ack),
                    created_on,
                    environment: cell(env),
                    update_category: cell(upd),
                })
            }
        };
        out.push(AlertRecord {
            line: row.line,
            source: cell(cols.source),
            descriptor: cell(cols.descriptor),
            category: cell(cols.category),
            application: cell(cols.application),
            incident,
        });
    }
    Ok(out)
}
