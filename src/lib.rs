mod error;
mod config;
mod feature;
mod store;
mod aggregate;
mod expand;
mod cooccur;
mod merge;
mod analogy;
mod inspect;
mod ingest;
mod run;
pub mod eval;

pub use run::Run;
pub use error::{CategoryError, Result};
pub use config::{files_handling, Config, IngestParams, QueryParams};
pub use feature::{Feature, FeatureFilter};
pub use store::{RawTable, Row, RowStore, Table, TableStore};
pub use aggregate::{rank, RankedList, WeightedAggregator};
pub use expand::CategoryExpander;
pub use cooccur::CooccurrenceLookup;
pub use merge::{merge, squash};
pub use analogy::AnalogyEngine;
pub use inspect::RowInspector;
pub use ingest::Ingest;
