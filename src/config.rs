use crate::error::{CategoryError, Result};

use serde::Deserialize;
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};


#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QueryParams {
    pub rho: f64,
    pub n: usize,
    pub squash: f64,
    pub semantic_n: usize,
    pub expansion_size: usize,
    pub analogy_size: usize,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            rho: 3.0,
            n: 100,
            squash: 100.0,
            semantic_n: 100,
            expansion_size: 50,
            analogy_size: 10,
        }
    }
}

impl Display for QueryParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "query parameters:
        rho: {},
        n: {},
        squash: {},
        semantic_n: {},
        expansion_size: {},
        analogy_size: {}",
        self.rho, self.n, self.squash, self.semantic_n, self.expansion_size, self.analogy_size
        )
    }
}


#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct IngestParams {
    pub item_to_feature_input: PathBuf,
    pub feature_to_item_input: PathBuf,
    /// inputs smaller than this are rejected, e.g. a large-file pointer instead of the data
    pub min_input_bytes: u64,
    /// existing tables smaller than this are reported as corrupted
    pub min_table_bytes: u64,
    pub progress_every: usize,
}

impl Default for IngestParams {
    fn default() -> Self {
        Self {
            item_to_feature_input: PathBuf::from("candidate_release-i-to-f.csv.gz"),
            feature_to_item_input: PathBuf::from("candidate_release-f-to-i.csv.gz"),
            min_input_bytes: 0,
            min_table_bytes: 0,
            progress_every: 10000,
        }
    }
}

impl Display for IngestParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ingest parameters:
        item_to_feature_input: {},
        feature_to_item_input: {},
        min_input_bytes: {},
        min_table_bytes: {},
        progress_every: {}",
        self.item_to_feature_input.display(), self.feature_to_item_input.display(),
        self.min_input_bytes, self.min_table_bytes, self.progress_every
        )
    }
}


#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub query: QueryParams,
    pub ingest: IngestParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            query: QueryParams::default(),
            ingest: IngestParams::default(),
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using parameters:
        data_dir: {}
        {}
        {}",
        self.data_dir.display(), self.query, self.ingest)
    }
}

impl Config {

    /// Reads a JSON parameter file; missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Config> {
        let f = File::open(path).map_err(|e| {
            CategoryError::Config(format!("cannot open config file {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            CategoryError::Config(format!("cannot parse config file {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.query.rho >= 0.0) {
            return Err(CategoryError::Config(format!("rho must be non-negative, got {}", self.query.rho)));
        }
        if self.query.n == 0 || self.query.semantic_n == 0 {
            return Err(CategoryError::Config("n and semantic_n must be positive".to_string()));
        }
        if !(self.query.squash > 1.0) || !self.query.squash.is_finite() {
            return Err(CategoryError::Config(format!("squash must be a finite number above 1, got {}", self.query.squash)));
        }
        if self.ingest.progress_every == 0 {
            return Err(CategoryError::Config("progress_every must be positive".to_string()));
        }
        Ok(())
    }

    /// Resolves an input path against the data directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}


pub mod files_handling {

    use crate::error::{CategoryError, Result};
    use crate::store::RawTable;

    use flate2::read::GzDecoder;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::Path;

    pub fn read_input<R: ReadFile>(file_path: &Path) -> std::result::Result<<R as ReadFile>::Item, <R as ReadFile>::Error> {
        let input = <R as ReadFile>::read_file(file_path)?;
        Ok(input)
    }

    pub fn save_output<S: SaveFile>(output_dir: &Path, file_name: &str, item: &S) -> std::result::Result<(), <S as SaveFile>::Error> {
        item.save_file(output_dir, file_name)?;
        Ok(())
    }

    pub trait ReadFile {
        type Error;
        type Item;
        fn read_file(file_path: &Path) -> std::result::Result<Self::Item, Self::Error>;
    }

    pub trait SaveFile {
        type Error;
        fn save_file(&self, output_dir: &Path, file_name: &str) -> std::result::Result<(), Self::Error>;
    }

    impl ReadFile for RawTable {
        type Error = CategoryError;
        type Item = Self;
        fn read_file(file_path: &Path) -> Result<Self::Item> {
            let f = BufReader::new(File::open(file_path)?);
            let reader = GzDecoder::new(f);
            let item: RawTable = bincode::deserialize_from(reader)?;
            Ok(item)
        }
    }

    impl SaveFile for RawTable {
        type Error = CategoryError;
        fn save_file(&self, output_dir: &Path, file_name: &str) -> Result<()> {

            fs::create_dir_all(output_dir)?;

            // write aside and rename, a half written table must never look complete
            let out = output_dir.join(file_name);
            let partial = output_dir.join(format!("{}.partial", file_name));
            {
                let f = BufWriter::new(File::create(&partial)?);
                let mut writer = GzEncoder::new(f, Compression::default());
                bincode::serialize_into(&mut writer, self)?;
                let mut f = writer.finish()?;
                f.flush()?;
            }
            fs::rename(&partial, &out)?;
            Ok(())
        }
    }
}


#[cfg(test)]
mod tests {

    use super::files_handling::{read_input, save_output};
    use super::Config;
    use crate::store::RawTable;
    use std::io::Write;
    use std::path::Path;

    #[test]
    fn config_defaults_test() {

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, r#"{{"data_dir": "/data/cb", "query": {{"rho": 2.5, "semantic_n": 200}}}}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.data_dir, Path::new("/data/cb"));
        assert_eq!(config.query.rho, 2.5);
        assert_eq!(config.query.semantic_n, 200);
        // untouched fields keep their defaults
        assert_eq!(config.query.n, 100);
        assert_eq!(config.query.squash, 100.0);
        assert_eq!(config.ingest.progress_every, 10000);
        assert_eq!(
            config.resolve(&config.ingest.feature_to_item_input),
            Path::new("/data/cb/candidate_release-f-to-i.csv.gz")
        );
        assert_eq!(config.resolve(Path::new("/abs/x.csv")), Path::new("/abs/x.csv"));
    }

    #[test]
    fn config_rejects_bad_values() {

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{"query": {"squash": 0.5}}"#).unwrap();
        assert!(Config::from_file(&path).is_err());

        std::fs::write(&path, r#"{"query": {"rho": -1.0}}"#).unwrap();
        assert!(Config::from_file(&path).is_err());

        std::fs::write(&path, "not json").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn table_file_test() {

        let dir = tempfile::tempdir().unwrap();
        let mut table = RawTable::new();
        table.insert("dog".to_string(), "S_bark,100".to_string());
        table.insert("new york".to_string(), "\"Sin,x\",25".to_string());

        save_output(dir.path(), "t.bin.gz", &table).unwrap();
        assert!(!dir.path().join("t.bin.gz.partial").exists());

        let loaded = read_input::<RawTable>(&dir.path().join("t.bin.gz")).unwrap();
        assert_eq!(loaded, table);
    }
}
