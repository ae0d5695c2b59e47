use crate::config::files_handling;
use crate::error::{CategoryError, Result};

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::Path;
use std::sync::Arc;
use log::{info, warn};


/// Weights are persisted as integer counts scaled by this factor.
pub const WEIGHT_SCALE: f64 = 100.0;

/// A sparse row, counterpart key to non-negative weight.
pub type Row = HashMap<String, f64>;

/// A table as persisted: key to its encoded row string.
pub type RawTable = HashMap<String, String>;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    /// item -> syntactic and (some) contextual features
    ItemToFeature,
    /// feature -> items
    FeatureToItem,
    /// item -> contextual features, derived from `FeatureToItem`
    ItemToFeatureContextual,
}

impl Table {

    pub const ALL: [Table; 3] = [Table::ItemToFeature, Table::FeatureToItem, Table::ItemToFeatureContextual];

    pub fn file_name(&self) -> &'static str {
        match self {
            Table::ItemToFeature => "i-to-f.bin.gz",
            Table::FeatureToItem => "f-to-i.bin.gz",
            Table::ItemToFeatureContextual => "i-to-f-cooc.bin.gz"
        }
    }

    /// The contextual table only supplements `ItemToFeature`, a store can be opened without it.
    pub fn is_required(&self) -> bool {
        !matches!(self, Table::ItemToFeatureContextual)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::ItemToFeature => "item-to-feature",
            Table::FeatureToItem => "feature-to-item",
            Table::ItemToFeatureContextual => "item-to-feature (contextual)"
        };
        write!(f, "{}", name)
    }
}


/// Exact-match point lookup of rows.
///
/// A key absent from a table yields the empty row, never an error. Failing
/// to decode a stored row is an error.
pub trait RowStore {
    fn get_row(&self, table: Table, key: &str) -> Result<Row>;
}

impl<T: RowStore + ?Sized> RowStore for &T {
    fn get_row(&self, table: Table, key: &str) -> Result<Row> {
        (**self).get_row(table, key)
    }
}

impl<T: RowStore + ?Sized> RowStore for Arc<T> {
    fn get_row(&self, table: Table, key: &str) -> Result<Row> {
        (**self).get_row(table, key)
    }
}


/// Row store backed by the compressed table files written by ingestion.
///
/// Tables are held encoded and each row is decoded on lookup. The store is
/// read-only once opened, so a single instance can be shared behind an `Arc`.
pub struct TableStore {
    tables: HashMap<Table, RawTable>,
}

impl TableStore {

    pub fn open(data_dir: &Path) -> Result<TableStore> {

        let mut tables: HashMap<Table, RawTable> = HashMap::new();
        for table in Table::ALL {

            let path = data_dir.join(table.file_name());
            if !path.exists() {
                if table.is_required() {
                    return Err(CategoryError::StoreMissing(path));
                }
                warn!("no {} table at {}, contextual lookups fall back to the item-to-feature table", table, path.display());
                continue;
            }

            let raw = files_handling::read_input::<RawTable>(&path).map_err(|e| {
                CategoryError::CorruptedTable { path: path.clone(), reason: e.to_string() }
            })?;
            info!("opened {} table with {} rows from {}", table, raw.len(), path.display());
            tables.insert(table, raw);
        }

        Ok(Self { tables })
    }

    /// Builds a store over tables already in memory.
    pub fn from_tables(tables: HashMap<Table, RawTable>) -> TableStore {
        Self { tables }
    }

    pub fn has_table(&self, table: Table) -> bool {
        self.tables.contains_key(&table)
    }
}

impl RowStore for TableStore {
    fn get_row(&self, table: Table, key: &str) -> Result<Row> {
        match self.tables.get(&table).and_then(|rows| rows.get(key)) {
            Some(raw) => decode_row(key, raw),
            None => Ok(Row::new())
        }
    }
}


/// Decodes one stored row: a CSV record of alternating key and weight fields.
pub fn decode_row(key: &str, raw: &str) -> Result<Row> {
    let row = decode_pairs(key, raw)?
        .into_iter()
        .map(|(counterpart, weight)| (counterpart, weight / WEIGHT_SCALE))
        .collect();
    Ok(row)
}

/// Decodes a stored row into its pairs, in stored order and unscaled.
pub fn decode_pairs(key: &str, raw: &str) -> Result<Vec<(String, f64)>> {

    let malformed = |reason: String| CategoryError::MalformedRow { key: key.to_string(), reason };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let record = match reader.records().next() {
        Some(record) => record.map_err(|e| malformed(e.to_string()))?,
        None => return Ok(Vec::new())
    };
    if reader.records().next().is_some() {
        return Err(malformed("expected a single record, found more".to_string()));
    }

    if record.len() % 2 != 0 {
        return Err(malformed(format!("expected key/weight pairs, found {} fields", record.len())));
    }

    let fields: Vec<&str> = record.iter().collect();
    let mut pairs: Vec<(String, f64)> = Vec::with_capacity(fields.len() / 2);
    for pair in fields.chunks(2) {
        let weight = parse_weight(pair[1]).map_err(malformed)?;
        pairs.push((pair[0].to_string(), weight));
    }

    Ok(pairs)
}

/// Parses a stored (unscaled) weight.
pub fn parse_weight(field: &str) -> std::result::Result<f64, String> {
    let weight: f64 = field.trim().parse().map_err(|_| format!("weight '{}' is not a number", field))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(format!("weight '{}' is not a finite non-negative number", field));
    }
    Ok(weight)
}

/// Encodes key/weight pairs into the stored row form.
pub fn encode_row<I, K, W>(pairs: I) -> Result<String>
where
    I: IntoIterator<Item = (K, W)>,
    K: AsRef<str>,
    W: Display,
{
    let mut fields: Vec<String> = Vec::new();
    for (key, weight) in pairs {
        fields.push(key.as_ref().to_string());
        fields.push(weight.to_string());
    }
    if fields.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(&fields)?;
    let bytes = writer.into_inner().map_err(|e| CategoryError::Csv(e.to_string()))?;
    let encoded = String::from_utf8(bytes).map_err(|e| CategoryError::Csv(e.to_string()))?;
    Ok(encoded.trim_end_matches(['\r', '\n']).to_string())
}
