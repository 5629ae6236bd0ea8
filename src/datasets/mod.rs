// 📦 Dataset Commands
// Each dataset = one loader + one reader + one parser (or a shapefile mapping)
//
// | Command      | Source                 | Records                   |
// |--------------|------------------------|---------------------------|
// | load-tz      | zipped shapefile       | TimeZone                  |
// | load-cities  | zipped shapefile       | CityCenter                |
// | load-geoip   | zipped CSV (Latin-1)   | Location                  |
// | load-ips     | zipped CSV             | NetBlock                  |
// | load-fedwire | fixed-width text       | FedWireInfo               |
//
// Every run is recorded in import_runs and holds the dataset's advisory
// lock while it works.

pub mod fedwire;
pub mod geoip;
pub mod shapes;

pub use fedwire::FedWireParser;
pub use geoip::{LocationParser, NetBlockParser};

use crate::db::{
    complete_run, fail_run, fetch_all, insert_run, verify_count, DatasetLock, ImportRun, SqliteStore,
};
use crate::entities::{CityCenter, FedWireInfo, Location, Model, NetBlock, TimeZone};
use crate::error::Result;
use crate::importer::{BatchImporter, ImportSettings, ImportSummary};
use crate::loader::{Encoding, FileLoader, FileOptions, HttpLoader, OpenMode, ZipLoader};
use crate::pattern::MemberPattern;
use crate::reader::{CsvReader, FileReader, LineReader};
use crate::shapefile_import::{LayerMapping, ShapefileImporter};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// DATASETS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// IANA time zone boundaries
    Tz,
    /// Natural Earth populated places
    Cities,
    /// GeoLite City locations
    Geoip,
    /// GeoLite City IPv4 blocks
    Ips,
    /// FedWire routing directory
    Fedwire,
}

impl Dataset {
    /// Command name, also the advisory lock key.
    pub fn command(&self) -> &'static str {
        match self {
            Dataset::Tz => "load-tz",
            Dataset::Cities => "load-cities",
            Dataset::Geoip => "load-geoip",
            Dataset::Ips => "load-ips",
            Dataset::Fedwire => "load-fedwire",
        }
    }

    /// Datasets whose locks a run of this one holds. Wiping locations
    /// cascades into net_blocks, so load-geoip also holds load-ips.
    pub fn locks(&self) -> &'static [Dataset] {
        match self {
            Dataset::Tz => &[Dataset::Tz],
            Dataset::Cities => &[Dataset::Cities],
            Dataset::Geoip => &[Dataset::Geoip, Dataset::Ips],
            Dataset::Ips => &[Dataset::Ips],
            Dataset::Fedwire => &[Dataset::Fedwire],
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Dataset::Tz => "http://efele.net/maps/tz/world/tz_world_mp.zip",
            Dataset::Cities => {
                "https://www.naturalearthdata.com/http//www.naturalearthdata.com/download/10m/cultural/ne_10m_populated_places.zip"
            }
            Dataset::Geoip | Dataset::Ips => {
                "http://geolite.maxmind.com/download/geoip/database/GeoLiteCity_CSV/GeoLiteCity-latest.zip"
            }
            // The frbservices.org original is gone; this is an archived copy
            Dataset::Fedwire => "https://raw.githubusercontent.com/chrisortman/AchLookup/master/fpddir.txt",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Dataset::Tz => TimeZone::TABLE,
            Dataset::Cities => CityCenter::TABLE,
            Dataset::Geoip => Location::TABLE,
            Dataset::Ips => NetBlock::TABLE,
            Dataset::Fedwire => FedWireInfo::TABLE,
        }
    }

    /// Per-dataset tuning before command line overrides.
    pub fn settings(&self) -> ImportSettings {
        match self {
            Dataset::Geoip => ImportSettings {
                batch_size: Some(100),
                log_interval: Some(5000),
                ..ImportSettings::default()
            },
            Dataset::Ips => ImportSettings {
                batch_size: Some(500),
                log_interval: Some(10000),
                ..ImportSettings::default()
            },
            _ => ImportSettings::default(),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

/// Command line overrides for one load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Replace the default source URL
    pub url: Option<String>,

    /// Local archive instead of a download (ZIP datasets)
    pub archive: Option<PathBuf>,

    /// Local text file instead of HTTP (load-fedwire)
    pub file: Option<PathBuf>,

    /// Parent of the temporary work directory
    pub workdir: Option<PathBuf>,

    pub no_wipe: bool,

    /// 0 means one unbounded batch
    pub batch_size: Option<usize>,

    /// 0 disables progress lines
    pub log_interval: Option<usize>,

    /// Skip features that cannot be mapped instead of aborting
    pub lax: bool,

    /// Do not log every saved feature
    pub quiet: bool,
}

impl LoadOptions {
    pub fn settings(&self, defaults: ImportSettings) -> ImportSettings {
        let or_default = |given: Option<usize>, default: Option<usize>| match given {
            Some(0) => None,
            Some(n) => Some(n),
            None => default,
        };

        ImportSettings {
            wipe: defaults.wipe && !self.no_wipe,
            batch_size: or_default(self.batch_size, defaults.batch_size),
            log_interval: or_default(self.log_interval, defaults.log_interval),
        }
    }

    /// Human readable source for the run log.
    pub fn source(&self, dataset: Dataset) -> String {
        if let Some(archive) = &self.archive {
            return archive.display().to_string();
        }
        if let Some(file) = &self.file {
            return file.display().to_string();
        }
        self.url(dataset)
    }

    fn url(&self, dataset: Dataset) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| dataset.default_url().to_string())
    }

    fn shapefile_importer(&self, mapping: LayerMapping) -> ShapefileImporter {
        ShapefileImporter {
            strict: !self.lax,
            verbose: !self.quiet,
            ..ShapefileImporter::new(mapping)
        }
    }

    fn zip_loader(
        &self,
        dataset: Dataset,
        pattern: &str,
        extract: Option<&str>,
        file_options: FileOptions,
    ) -> Result<ZipLoader> {
        let pattern = MemberPattern::new(pattern)?;
        let mut loader = match &self.archive {
            Some(path) => ZipLoader::local(path, pattern),
            None => ZipLoader::download(self.url(dataset), pattern),
        };

        if let Some(extract) = extract {
            loader = loader.with_extract(MemberPattern::new(extract)?);
        }

        Ok(loader
            .with_options(file_options)
            .with_basedir(self.workdir.clone()))
    }
}

// ============================================================================
// RUNNING
// ============================================================================

/// Load `dataset` into `conn`, under its advisory lock, recording the run.
pub fn run_dataset(conn: &Connection, dataset: Dataset, options: &LoadOptions) -> Result<ImportSummary> {
    let details = json!({
        "source": options.source(dataset),
        "settings": options.settings(dataset.settings()),
        "options": options,
    });
    let mut run = ImportRun::new(dataset.command(), details);
    insert_run(conn, &run)?;
    info!("Starting {} (run {})", dataset, run.run_id);

    let result = dataset
        .locks()
        .iter()
        .map(|held| DatasetLock::acquire(conn, held.command(), &run.run_id))
        .collect::<Result<Vec<_>>>()
        .and_then(|locks| {
            let summary = execute(conn, dataset, options);
            drop(locks);
            summary
        });

    match result {
        Ok(summary) => {
            complete_run(conn, &mut run, summary.imported, summary.wiped)?;
            info!(
                "Finished {}: {} imported, {} wiped",
                dataset, summary.imported, summary.wiped
            );
            Ok(summary)
        }
        Err(e) => {
            error!("{} failed: {}", dataset, e);
            if let Err(log_error) = fail_run(conn, &mut run, &e) {
                warn!("Could not record failed run {}: {}", run.run_id, log_error);
            }
            Err(e)
        }
    }
}

fn execute(conn: &Connection, dataset: Dataset, options: &LoadOptions) -> Result<ImportSummary> {
    let settings = options.settings(dataset.settings());

    match dataset {
        Dataset::Tz => {
            let mut source = options.zip_loader(dataset, "*/*.shp", None, FileOptions::default())?;
            options
                .shapefile_importer(shapes::timezone_mapping())
                .run::<TimeZone, _, _>(&mut source, &mut SqliteStore::<TimeZone>::new(conn), settings.wipe)
        }
        Dataset::Cities => {
            let mut source = options.zip_loader(dataset, "*.shp", None, FileOptions::default())?;
            options
                .shapefile_importer(shapes::city_mapping())
                .run::<CityCenter, _, _>(&mut source, &mut SqliteStore::<CityCenter>::new(conn), settings.wipe)
        }
        Dataset::Geoip => {
            let source = options.zip_loader(
                dataset,
                "*/GeoLiteCity-Location.csv",
                Some("*.csv"),
                FileOptions {
                    open_mode: OpenMode::Text,
                    encoding: Encoding::Latin1,
                    skip_lines: 2,
                },
            )?;
            BatchImporter::new(source, CsvReader::default(), LocationParser)
                .with_settings(settings)
                .run(&mut SqliteStore::<Location>::new(conn))
        }
        Dataset::Ips => {
            let source = options.zip_loader(
                dataset,
                "*/GeoLiteCity-Blocks.csv",
                Some("*.csv"),
                FileOptions {
                    open_mode: OpenMode::Text,
                    encoding: Encoding::Utf8,
                    skip_lines: 2,
                },
            )?;
            BatchImporter::new(source, CsvReader::default(), NetBlockParser)
                .with_settings(settings)
                .run(&mut SqliteStore::<NetBlock>::new(conn))
        }
        Dataset::Fedwire => {
            let mut store = SqliteStore::<FedWireInfo>::new(conn);
            match &options.file {
                Some(path) => {
                    let source = FileLoader::new(path).with_options(FileOptions {
                        open_mode: OpenMode::Text,
                        ..FileOptions::default()
                    });
                    BatchImporter::new(source, FileReader, FedWireParser)
                        .with_settings(settings)
                        .run(&mut store)
                }
                None => BatchImporter::new(HttpLoader::new(options.url(dataset)), LineReader, FedWireParser)
                    .with_settings(settings)
                    .run(&mut store),
            }
        }
    }
}

// ============================================================================
// LISTING
// ============================================================================

/// One persisted row, as a display line and as JSON.
#[derive(Debug, Clone)]
pub struct Listing {
    pub line: String,
    pub json: serde_json::Value,
}

pub fn count_rows(conn: &Connection, dataset: Dataset) -> Result<i64> {
    verify_count(conn, dataset.table())
}

/// Stored rows of `dataset` with their derived fields.
pub fn list_rows(conn: &Connection, dataset: Dataset, limit: Option<usize>) -> Result<Vec<Listing>> {
    let rows = match dataset {
        Dataset::Tz => fetch_all::<TimeZone>(conn, limit)?
            .into_iter()
            .map(|zone| Listing {
                line: format!(
                    "{:<32} {:<12} {:>6} {}",
                    zone.tzid,
                    zone.area(),
                    zone.utc_offset(),
                    zone.name()
                ),
                json: json!({
                    "tzid": zone.tzid,
                    "area": zone.area(),
                    "utc_offset": zone.utc_offset(),
                    "name": zone.name(),
                }),
            })
            .collect(),
        Dataset::Cities => fetch_all::<CityCenter>(conn, limit)?
            .into_iter()
            .map(|city| Listing {
                line: format!(
                    "{:<28} {:<24} {:<28} {}",
                    city.name,
                    city.adm0,
                    city.timezone.as_deref().unwrap_or("-"),
                    city.geometry
                ),
                json: json!({
                    "name": city.name,
                    "sov0": city.sov0,
                    "adm0": city.adm0,
                    "adm1": city.adm1,
                    "timezone": city.timezone,
                    "worldcity": city.worldcity,
                    "megacity": city.megacity,
                    "meganame": city.meganame,
                    "geometry": city.geometry.to_wkt(),
                }),
            })
            .collect(),
        Dataset::Geoip => fetch_all::<Location>(conn, limit)?
            .into_iter()
            .map(|location| Listing {
                line: format!("{:>8} {:<36} {}", location.id, location.to_string(), location.geometry),
                json: json!({
                    "id": location.id,
                    "country": location.country,
                    "region": location.region,
                    "city": location.city,
                    "post_code": location.post_code,
                    "metro_code": location.metro_code,
                    "area_code": location.area_code,
                    "geometry": location.geometry.to_wkt(),
                }),
            })
            .collect(),
        Dataset::Ips => fetch_all::<NetBlock>(conn, limit)?
            .into_iter()
            .map(|block| Listing {
                line: format!("{:<33} → {}", block.to_string(), block.location_id),
                json: json!({
                    "start": block.start.to_string(),
                    "end": block.end.to_string(),
                    "location_id": block.location_id,
                }),
            })
            .collect(),
        Dataset::Fedwire => fetch_all::<FedWireInfo>(conn, limit)?
            .into_iter()
            .map(|info| Listing {
                line: format!(
                    "{} {:<36} {:<24} {}",
                    info.routing_code(),
                    info.bank_name,
                    info.city,
                    info.state.as_deref().unwrap_or("--")
                ),
                json: json!({
                    "routing_code": info.routing_code(),
                    "telex_name": info.telex_name,
                    "bank_name": info.bank_name,
                    "state": info.state,
                    "city": info.city,
                    "funds_transfer_elegible": info.funds_transfer_elegible,
                    "funds_settlement_only": info.funds_settlement_only,
                    "bes_transfer_elegible": info.bes_transfer_elegible,
                    "modified": info.modified,
                }),
            })
            .collect(),
    };

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_runs, setup_database, RunStatus};
    use crate::error::ImportError;
    use crate::test_support::{write_timezones, write_zip, zip_shapefile};
    use std::fs;
    use tempfile::TempDir;

    const LOCATIONS: &str = "Copyright (c) 2012 MaxMind LLC.  All Rights Reserved.\n\
locId,country,region,city,postalCode,latitude,longitude,metroCode,areaCode\n\
1,\"O1\",\"\",\"\",\"\",0.0000,0.0000,,\n\
2,\"AP\",\"\",\"\",\"\",35.0000,105.0000,,\n\
2703,\"US\",\"TX\",\"Austin\",\"78701\",30.2672,-97.7431,635,512\n";

    const BLOCKS: &str = "Copyright (c) 2011 MaxMind Inc.  All Rights Reserved.\n\
startIpNum,endIpNum,locId\n\
\"16777216\",\"16777471\",\"2\"\n\
\"16777472\",\"16778239\",\"2703\"\n";

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn geolite_archive(dir: &TempDir) -> PathBuf {
        let archive = dir.path().join("GeoLiteCity-latest.zip");
        write_zip(
            &archive,
            &[
                ("GeoLiteCity_20130101/GeoLiteCity-Location.csv", LOCATIONS),
                ("GeoLiteCity_20130101/GeoLiteCity-Blocks.csv", BLOCKS),
                ("GeoLiteCity_20130101/README.txt", "read me"),
            ],
        );
        archive
    }

    fn local(archive: &PathBuf, workdir: &TempDir) -> LoadOptions {
        LoadOptions {
            archive: Some(archive.clone()),
            workdir: Some(workdir.path().to_path_buf()),
            ..LoadOptions::default()
        }
    }

    #[test]
    fn test_settings_overrides() {
        let defaults = Dataset::Ips.settings();
        assert_eq!(defaults.batch_size, Some(500));
        assert_eq!(defaults.log_interval, Some(10000));

        let options = LoadOptions {
            no_wipe: true,
            batch_size: Some(0),
            log_interval: Some(250),
            ..LoadOptions::default()
        };
        let settings = options.settings(defaults);

        assert!(!settings.wipe);
        assert_eq!(settings.batch_size, None);
        assert_eq!(settings.log_interval, Some(250));
    }

    #[test]
    fn test_geoip_then_ips_from_local_archive() {
        let fixtures = TempDir::new().unwrap();
        let workdir = TempDir::new().unwrap();
        let archive = geolite_archive(&fixtures);
        let conn = memory_db();

        let summary = run_dataset(&conn, Dataset::Geoip, &local(&archive, &workdir)).unwrap();
        assert_eq!(summary.imported, 3);
        assert_eq!(summary.batches, 1);
        assert_eq!(count_rows(&conn, Dataset::Geoip).unwrap(), 3);

        let summary = run_dataset(&conn, Dataset::Ips, &local(&archive, &workdir)).unwrap();
        assert_eq!(summary.imported, 2);

        let blocks = list_rows(&conn, Dataset::Ips, None).unwrap();
        assert_eq!(blocks[0].json["start"], "1.0.0.0");
        assert_eq!(blocks[1].json["end"], "1.0.3.255");

        let austin = list_rows(&conn, Dataset::Geoip, None)
            .unwrap()
            .into_iter()
            .find(|row| row.json["id"] == 2703)
            .unwrap();
        assert_eq!(austin.json["metro_code"], 635);
        assert!(austin.line.contains("Austin, US"));

        // Work directories are gone after each run
        assert_eq!(fs::read_dir(workdir.path()).unwrap().count(), 0);

        let runs = get_runs(&conn, 10).unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|run| run.status == RunStatus::Succeeded));
        assert_eq!(runs[0].dataset, "load-ips");
        assert_eq!(runs[0].imported, 2);
    }

    #[test]
    fn test_reload_replaces_and_cascades() {
        let fixtures = TempDir::new().unwrap();
        let workdir = TempDir::new().unwrap();
        let archive = geolite_archive(&fixtures);
        let conn = memory_db();

        run_dataset(&conn, Dataset::Geoip, &local(&archive, &workdir)).unwrap();
        run_dataset(&conn, Dataset::Ips, &local(&archive, &workdir)).unwrap();

        let summary = run_dataset(&conn, Dataset::Geoip, &local(&archive, &workdir)).unwrap();
        assert_eq!(summary.wiped, 3);
        assert_eq!(count_rows(&conn, Dataset::Geoip).unwrap(), 3);
        assert_eq!(count_rows(&conn, Dataset::Ips).unwrap(), 0, "blocks go with their locations");
    }

    #[test]
    fn test_missing_member_keeps_existing_rows() {
        let fixtures = TempDir::new().unwrap();
        let workdir = TempDir::new().unwrap();
        let conn = memory_db();

        run_dataset(&conn, Dataset::Geoip, &local(&geolite_archive(&fixtures), &workdir)).unwrap();

        let empty = fixtures.path().join("empty.zip");
        write_zip(&empty, &[("README.txt", "nothing")]);
        let err = run_dataset(&conn, Dataset::Geoip, &local(&empty, &workdir)).unwrap_err();

        assert!(matches!(err, ImportError::NoMatchingMember { .. }));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(count_rows(&conn, Dataset::Geoip).unwrap(), 3);
        assert_eq!(fs::read_dir(workdir.path()).unwrap().count(), 0);

        let runs = get_runs(&conn, 1).unwrap();
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert!(runs[0].error.as_deref().unwrap().starts_with("[archive]"));
    }

    #[test]
    fn test_locked_dataset_is_rejected() {
        let fixtures = TempDir::new().unwrap();
        let workdir = TempDir::new().unwrap();
        let archive = geolite_archive(&fixtures);
        let conn = memory_db();

        let lock = DatasetLock::acquire(&conn, "load-ips", "other-run").unwrap();
        let err = run_dataset(&conn, Dataset::Ips, &local(&archive, &workdir)).unwrap_err();
        assert_eq!(err.exit_code(), 7);

        // load-geoip would wipe net_blocks through the cascade
        let err = run_dataset(&conn, Dataset::Geoip, &local(&archive, &workdir)).unwrap_err();
        assert_eq!(err.exit_code(), 7);
        assert_eq!(count_rows(&conn, Dataset::Geoip).unwrap(), 0);
        drop(lock);

        // Its own geoip lock was released with the failure
        let unrelated = DatasetLock::acquire(&conn, "load-fedwire", "other-run").unwrap();
        run_dataset(&conn, Dataset::Geoip, &local(&archive, &workdir)).unwrap();
        run_dataset(&conn, Dataset::Ips, &local(&archive, &workdir)).unwrap();
        assert_eq!(count_rows(&conn, Dataset::Ips).unwrap(), 2);
        drop(unrelated);

        let runs = get_runs(&conn, 10).unwrap();
        assert_eq!(runs.len(), 4);
        assert!(runs[..2].iter().all(|run| run.status == RunStatus::Succeeded));
        for failed in &runs[2..] {
            assert_eq!(failed.status, RunStatus::Failed);
            assert!(failed.error.as_deref().unwrap().starts_with("[locked]"));
        }
    }

    #[test]
    fn test_tz_from_local_archive() {
        let fixtures = TempDir::new().unwrap();
        let workdir = TempDir::new().unwrap();
        let shp = fixtures.path().join("tz_world_mp.shp");
        write_timezones(&shp, &["Europe/Paris", "", "Asia/Tokyo"]);
        let archive = fixtures.path().join("tz_world_mp.zip");
        zip_shapefile(&archive, &shp, "world");
        let conn = memory_db();

        let err = run_dataset(&conn, Dataset::Tz, &local(&archive, &workdir)).unwrap_err();
        assert!(matches!(err, ImportError::Feature { index: 1, .. }));
        assert_eq!(err.exit_code(), 8);
        assert_eq!(count_rows(&conn, Dataset::Tz).unwrap(), 0);

        let lax = LoadOptions {
            lax: true,
            quiet: true,
            ..local(&archive, &workdir)
        };
        let summary = run_dataset(&conn, Dataset::Tz, &lax).unwrap();
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.batches, 1);
        assert_eq!(fs::read_dir(workdir.path()).unwrap().count(), 0);

        let rows = list_rows(&conn, Dataset::Tz, None).unwrap();
        let paris = rows.iter().find(|row| row.json["tzid"] == "Europe/Paris").unwrap();
        assert_eq!(paris.json["area"], "Europe");
        assert_eq!(rows.len(), 2);

        let runs = get_runs(&conn, 10).unwrap();
        assert_eq!(runs[0].status, RunStatus::Succeeded);
        assert_eq!(runs[1].status, RunStatus::Failed);
        assert!(runs[1].error.as_deref().unwrap().starts_with("[shapefile]"));
    }

    #[test]
    fn test_fedwire_from_local_file() {
        let fixtures = TempDir::new().unwrap();
        let path = fixtures.path().join("fpddir.txt");
        let line = format!(
            "{:<9}{:<18}{:<36}{:<2}{:<25}{:<3}{}",
            "011000015", "FRB BOS", "FEDERAL RESERVE BANK OF BOSTON", "MA", "BOSTON", "YNY", "20040910"
        );
        fs::write(&path, format!("{}\n\n", line)).unwrap();

        let conn = memory_db();
        let options = LoadOptions {
            file: Some(path),
            ..LoadOptions::default()
        };
        let summary = run_dataset(&conn, Dataset::Fedwire, &options).unwrap();
        assert_eq!(summary.imported, 1);

        let rows = list_rows(&conn, Dataset::Fedwire, Some(10)).unwrap();
        assert_eq!(rows[0].json["routing_code"], "011000015");
        assert_eq!(rows[0].json["city"], "Boston");
        assert_eq!(rows[0].json["modified"], "2004-09-10");
    }

    #[test]
    fn test_fedwire_over_http() {
        let mut server = mockito::Server::new();
        let line = format!(
            "{:<9}{:<18}{:<36}{:<2}{:<25}{:<3}{}",
            "026009593", "BK AMER NYC", "BANK OF AMERICA, N.A.", "NY", "NEW YORK", "YNY", ""
        );
        let _mock = server
            .mock("GET", "/fpddir.txt")
            .with_status(200)
            .with_body(format!("{}\n", line))
            .create();

        let conn = memory_db();
        let options = LoadOptions {
            url: Some(format!("{}/fpddir.txt", server.url())),
            ..LoadOptions::default()
        };
        run_dataset(&conn, Dataset::Fedwire, &options).unwrap();

        let rows: Vec<FedWireInfo> = fetch_all(&conn, None).unwrap();
        assert_eq!(rows[0].city, "New York");
        assert_eq!(rows[0].modified, None);
    }
}
