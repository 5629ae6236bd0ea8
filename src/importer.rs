// 🚚 Batch Importer
// loader → reader → parser → chunked bulk insert
//
// Pipeline:
//   1. Acquire the payload (nothing is touched if this fails)
//   2. Wipe the target table (optional)
//   3. Read raw records, skip blanks, parse, insert in chunks
//   4. Clean up the loader's temporary files, whatever happened above

use crate::db::EntityStore;
use crate::error::{ImportError, Result};
use crate::loader::DataSource;
use crate::reader::{RawRecord, RecordReader};
use log::{info, warn};
use serde::{Deserialize, Serialize};

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// RecordParser - one raw record in, one entity out
///
/// Parsers are pure. The message of a failed parse is attached to the
/// record number by the importer.
pub trait RecordParser {
    type Record;
    type Entity;

    fn parse(&self, raw: &Self::Record) -> std::result::Result<Self::Entity, String>;
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Delete existing rows before loading
    pub wipe: bool,

    /// Rows per insert; None writes everything in one batch
    pub batch_size: Option<usize>,

    /// Log every N records; None disables progress lines
    pub log_interval: Option<usize>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            wipe: true,
            batch_size: None,
            log_interval: Some(5000),
        }
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub wiped: usize,
    pub batches: usize,
}

// ============================================================================
// PROGRESS
// ============================================================================

/// Counts records and logs at exact multiples of the interval.
#[derive(Debug)]
pub struct ProgressLog {
    interval: Option<usize>,
    count: usize,
    last_logged: Option<usize>,
}

impl ProgressLog {
    pub fn new(interval: Option<usize>) -> Self {
        ProgressLog {
            interval: interval.filter(|n| *n > 0),
            count: 0,
            last_logged: None,
        }
    }

    /// Count one record. Returns its 1-based number.
    pub fn tick(&mut self) -> usize {
        self.count += 1;
        if let Some(interval) = self.interval {
            if self.count % interval == 0 {
                info!("Processed {} records", self.count);
                self.last_logged = Some(self.count);
            }
        }
        self.count
    }

    /// Log the total unless the last progress line already did.
    /// Returns whether a line was written.
    pub fn finish(&mut self) -> bool {
        if self.last_logged == Some(self.count) {
            return false;
        }
        info!("Processed {} records", self.count);
        self.last_logged = Some(self.count);
        true
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn last_logged(&self) -> Option<usize> {
        self.last_logged
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Acquire, optionally wipe, load, then always clean up.
///
/// `acquire` runs before the wipe so a failed fetch leaves existing rows
/// alone. Cleanup runs on every path; a cleanup failure is reported only when
/// the load itself succeeded.
pub(crate) fn pipeline<S, St, E, T>(
    source: &mut S,
    store: &mut St,
    wipe: bool,
    acquire: impl FnOnce(&mut S) -> Result<T>,
    load: impl FnOnce(T, &mut St) -> Result<(usize, usize)>,
) -> Result<ImportSummary>
where
    S: DataSource + ?Sized,
    St: EntityStore<E> + ?Sized,
{
    let result = (|| -> Result<ImportSummary> {
        let data = acquire(source)?;

        let wiped = if wipe {
            let existing = store.count()?;
            info!("Wiping {} existing rows", existing);
            store.wipe()?
        } else {
            0
        };

        let (imported, batches) = load(data, store)?;
        Ok(ImportSummary {
            imported,
            wiped,
            batches,
        })
    })();

    let cleaned = source.cleanup();

    match (result, cleaned) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_error)) => {
            warn!("Cleanup after failed import also failed: {}", cleanup_error);
            Err(e)
        }
    }
}

/// Upper bound on the rows reserved up front for one batch
const PREALLOCATE: usize = 1024;

/// Insert `entities` in chunks of `batch_size`, keeping their order.
///
/// Returns (rows inserted, batches written). A batch size of None or 0
/// means a single batch.
pub fn bulk_create<E, St, I>(store: &mut St, entities: I, batch_size: Option<usize>) -> Result<(usize, usize)>
where
    St: EntityStore<E> + ?Sized,
    I: IntoIterator<Item = Result<E>>,
{
    let chunk = batch_size.filter(|n| *n > 0);
    // Batch sizes are unbounded; the reservation is not
    let mut pending: Vec<E> = Vec::with_capacity(chunk.map_or(0, |n| n.min(PREALLOCATE)));
    let mut inserted = 0;
    let mut batches = 0;

    for entity in entities {
        pending.push(entity?);

        if chunk == Some(pending.len()) {
            inserted += store.insert_batch(&pending)?;
            batches += 1;
            pending.clear();
        }
    }

    if !pending.is_empty() {
        inserted += store.insert_batch(&pending)?;
        batches += 1;
    }

    Ok((inserted, batches))
}

// ============================================================================
// BATCH IMPORTER
// ============================================================================

/// BatchImporter - one loader, one reader, one parser
#[derive(Debug)]
pub struct BatchImporter<S, R, P> {
    pub source: S,
    pub reader: R,
    pub parser: P,
    pub settings: ImportSettings,
}

impl<S, R, P> BatchImporter<S, R, P>
where
    S: DataSource,
    R: RecordReader,
    P: RecordParser<Record = R::Record>,
{
    pub fn new(source: S, reader: R, parser: P) -> Self {
        BatchImporter {
            source,
            reader,
            parser,
            settings: ImportSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn run<St>(&mut self, store: &mut St) -> Result<ImportSummary>
    where
        St: EntityStore<P::Entity> + ?Sized,
    {
        let BatchImporter {
            source,
            reader,
            parser,
            settings,
        } = self;

        pipeline(
            source,
            store,
            settings.wipe,
            |source| source.get_data(),
            |payload, store| {
                let records = reader.get_reader(payload)?;
                let mut progress = ProgressLog::new(settings.log_interval);

                let entities = records
                    .filter(|record| !matches!(record, Ok(raw) if raw.is_blank()))
                    .map(|record| {
                        let raw = record?;
                        let number = progress.tick();
                        parser
                            .parse(&raw)
                            .map_err(|message| ImportError::parse(number, message))
                    });

                let (imported, batches) = bulk_create(store, entities, settings.batch_size)?;
                progress.finish();
                Ok((imported, batches))
            },
        )
    }
}
