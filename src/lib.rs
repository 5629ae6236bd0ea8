// Geodata Import - Core Library
// Batch loaders for reference datasets (time zones, cities, GeoIP, FedWire)

pub mod error;
pub mod pattern;
pub mod loader;
pub mod reader;
pub mod importer;
pub mod shapefile_import;
pub mod entities;
pub mod db;
pub mod datasets;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use error::{ImportError, Result};
pub use pattern::{select_one, MemberPattern};
pub use loader::{
    DataSource, Payload, OpenMode, Encoding, FileOptions, WorkDir,
    HttpLoader, FileLoader, Downloader, ZipLoader, ArchiveSource,
};
pub use reader::{RecordReader, RawRecord, Records, LineReader, FileReader, CsvReader, Dialect};
pub use importer::{
    RecordParser, BatchImporter, ImportSettings, ImportSummary, ProgressLog, bulk_create,
};
pub use shapefile_import::{ShapefileImporter, LayerMapping, MappedFeature, FromFeature};
pub use entities::{
    Model, Geometry, Point, TimeZone, CityCenter, Location, NetBlock, FedWireInfo,
};
pub use db::{
    open_database, setup_database, verify_count, fetch_all,
    EntityStore, SqliteStore,
    ImportRun, RunStatus, insert_run, complete_run, fail_run, get_runs,
    DatasetLock, force_unlock,
};
pub use datasets::{Dataset, LoadOptions, run_dataset, list_rows, count_rows, Listing};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
