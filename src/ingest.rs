// imports
use crate::config::{files_handling, Config, IngestParams};
use crate::error::{CategoryError, Result};
use crate::feature::FeatureFilter;
use crate::store::{decode_pairs, encode_row, parse_weight, RawTable, Table};

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use csv::StringRecord;
use flate2::read::GzDecoder;
use log::{info, warn};
use rayon::prelude::*;


enum TableStatus {
    Good,
    TooSmall(u64),
    Missing,
}


/// One-time conversion of the released matrices into table files.
pub struct Ingest {}

impl Ingest {

    fn table_status(path: &Path, min_bytes: u64) -> Result<TableStatus> {
        if !path.exists() {
            return Ok(TableStatus::Missing);
        }
        let size = fs::metadata(path)?.len();
        if size < min_bytes {
            return Ok(TableStatus::TooSmall(size));
        }
        Ok(TableStatus::Good)
    }

    fn open_input(path: &Path) -> Result<Box<dyn Read>> {
        let f = BufReader::new(File::open(path)?);
        if path.extension().map_or(false, |ext| ext == "gz") {
            Ok(Box::new(GzDecoder::new(f)))
        } else {
            Ok(Box::new(f))
        }
    }

    /// A record is a key followed by alternating (counterpart, weight) fields.
    fn parse_record(record: &StringRecord) -> std::result::Result<Option<(String, String)>, String> {

        let fields: Vec<&str> = record.iter().collect();
        if fields.iter().all(|f| f.trim().is_empty()) {
            return Ok(None);
        }
        let (key, rest) = match fields.split_first() {
            Some((key, rest)) => (*key, rest),
            None => return Ok(None)
        };

        if rest.len() % 2 != 0 {
            return Err(format!("key '{}' has {} fields after it, expected key/weight pairs", key, rest.len()));
        }

        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(rest.len() / 2);
        for pair in rest.chunks(2) {
            parse_weight(pair[1]).map_err(|e| format!("key '{}': {}", key, e))?;
            pairs.push((pair[0], pair[1].trim()));
        }

        let row = encode_row(pairs).map_err(|e| e.to_string())?;
        Ok(Some((key.to_string(), row)))
    }

    fn read_rows(input: &Path, params: &IngestParams) -> Result<RawTable> {

        let malformed = |reason: String| CategoryError::MalformedInput { path: input.to_path_buf(), reason };

        let size = match fs::metadata(input) {
            Ok(metadata) => metadata.len(),
            Err(e) => return Err(malformed(format!("cannot read input: {}", e)))
        };
        if size < params.min_input_bytes {
            return Err(malformed(format!(
                "only {} bytes, expected at least {}; was the full file fetched rather than a pointer to it?",
                size, params.min_input_bytes)));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(Self::open_input(input)?);

        let mut rows = RawTable::new();
        let mut duplicates = 0;
        for (i, record) in reader.records().enumerate() {

            let record = record?;
            let parsed = Self::parse_record(&record).map_err(|e| malformed(format!("record {}: {}", i + 1, e)))?;
            if let Some((key, row)) = parsed {
                if rows.insert(key, row).is_some() {
                    duplicates += 1;
                }
            }

            if (i + 1) % params.progress_every == 0 {
                info!("processed {} records of {}", i + 1, input.display());
            }
        }

        if duplicates > 0 {
            warn!("{} duplicated keys in {}, the last row of each was kept", duplicates, input.display());
        }
        Ok(rows)
    }

    /// Inverts the contextual part of the feature-to-item table.
    ///
    /// Each item row lists its contextual features by descending weight,
    /// equal weights ordered by feature key.
    fn build_contextual(f_to_i: &RawTable) -> Result<RawTable> {

        let mut item_rows: HashMap<String, Vec<(String, f64)>> = HashMap::new();
        for (feature, raw) in f_to_i {
            if !FeatureFilter::Contextual.keeps(feature) {
                continue;
            }
            for (item, weight) in decode_pairs(feature, raw)? {
                item_rows.entry(item).or_default().push((feature.to_owned(), weight));
            }
        }

        item_rows.into_par_iter().map(|(item, mut row)| {
            row.sort_by(|(key_a, a), (key_b, b)| b.total_cmp(a).then_with(|| key_a.cmp(key_b)));
            encode_row(row).map(|encoded| (item, encoded))
        }).collect()
    }

    fn ensure_table(config: &Config, table: Table, input: &Path) -> Result<Option<RawTable>> {

        let params = &config.ingest;
        let path = config.data_dir.join(table.file_name());

        match Self::table_status(&path, params.min_table_bytes)? {
            TableStatus::Good => {
                info!("{} table at {} looks good", table, path.display());
                Ok(None)
            },
            TableStatus::TooSmall(size) => Err(CategoryError::CorruptedTable {
                path,
                reason: format!("only {} bytes, expected at least {}; likely corrupted, delete it and rerun ingest", size, params.min_table_bytes)
            }),
            TableStatus::Missing => {
                let input = config.resolve(input);
                info!("building {} table from {}, this may take a couple of minutes", table, input.display());
                let rows = Self::read_rows(&input, params)?;
                files_handling::save_output(&config.data_dir, table.file_name(), &rows)?;
                info!("saved {} rows to {}", rows.len(), path.display());
                Ok(Some(rows))
            }
        }
    }

    pub fn run(config: &Config) -> Result<()> {

        // build the two released matrices, then derive the contextual table
        info!("{}", config.ingest);
        Self::ensure_table(config, Table::ItemToFeature, &config.ingest.item_to_feature_input)?;
        let built_f_to_i = Self::ensure_table(config, Table::FeatureToItem, &config.ingest.feature_to_item_input)?;

        // a rebuilt feature-to-item table always invalidates the derived one
        let table = Table::ItemToFeatureContextual;
        let path = config.data_dir.join(table.file_name());
        let f_to_i = match built_f_to_i {
            Some(f_to_i) => {
                if path.exists() {
                    info!("{} table was rebuilt, rebuilding {} table", Table::FeatureToItem, table);
                }
                f_to_i
            },
            None if path.exists() => {
                info!("{} table at {} looks good", table, path.display());
                return Ok(());
            },
            None => files_handling::read_input::<RawTable>(&config.data_dir.join(Table::FeatureToItem.file_name()))?
        };
        let contextual = Self::build_contextual(&f_to_i)?;
        files_handling::save_output(&config.data_dir, table.file_name(), &contextual)?;
        info!("saved {} rows to {}", contextual.len(), path.display());

        Ok(())
    }
}
