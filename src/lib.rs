//! # Energy Ledger
//!
//! A library for turning unstructured utility bills (electric, solar, gas)
//! into a reconciled monthly energy and cost ledger.
//!
//! ## Core Concepts
//!
//! - **Field extraction**: each vendor format is an ordered list of patterns
//!   with fallbacks; a bill becomes a typed [`BillRecord`] or nothing at all
//! - **Monthly buckets**: records are assigned to `YYYY-MM` ledger months
//!   using a billing-lag heuristic (early-month bills report the prior month)
//! - **Reconciliation**: grid meter, solar inverter and gas meter disagree;
//!   derived metrics (self-use, true consumption, effective rate) merge them
//!   under explicit priority rules
//!
//! ## Example
//!
//! ```rust,ignore
//! use energy_ledger::*;
//!
//! let source = FolderSource::new("bills/");
//! let mut cache = JsonFileCache::load("bills/records.json")?;
//!
//! let report = build_energy_ledger(&source, &mut cache)?;
//! cache.save()?;
//!
//! for month in &report.summaries {
//!     println!("{}: {:.0} kWh consumed at ${:.3}/kWh",
//!         month.month, month.true_consumption, month.effective_rate);
//! }
//! ```

pub mod cache;
pub mod decode;
pub mod engine;
pub mod error;
pub mod extract;
pub mod schema;
pub mod source;
pub mod utils;

#[cfg(feature = "remote")]
pub mod remote;

pub use cache::{JsonFileCache, MemoryCache, RecordCache};
pub use engine::{
    DailyProduction, MonthlyBucket, MonthlySummary, ReconciliationEngine, KWH_PER_THERM,
};
pub use error::{LedgerError, Result};
pub use extract::{extract_document, extract_fields};
pub use schema::*;
pub use source::{DocumentHandle, DocumentSource, FolderSource};
pub use utils::*;

use log::{debug, info, warn};

/// Outcome of one ledger build: the ordered monthly summaries plus how many
/// documents made it in. Failed documents are counted, never silently
/// dropped.
#[derive(Debug, Clone)]
pub struct LedgerReport {
    pub summaries: Vec<MonthlySummary>,
    pub documents_processed: usize,
    pub documents_failed: usize,
}

pub struct BillLedgerProcessor;

impl BillLedgerProcessor {
    /// Walks every document the source lists, extracts (or reuses the cached
    /// record for) each one, and reconciles the results into monthly
    /// summaries. A document that fails to extract is logged and skipped;
    /// it never aborts the batch.
    pub fn process(
        source: &dyn DocumentSource,
        cache: &mut dyn RecordCache,
    ) -> Result<LedgerReport> {
        Self::process_with_production(source, cache, None)
    }

    /// Same as [`process`](Self::process), with an externally metered daily
    /// production series installed before metrics run.
    pub fn process_with_production(
        source: &dyn DocumentSource,
        cache: &mut dyn RecordCache,
        daily_production: Option<DailyProduction>,
    ) -> Result<LedgerReport> {
        let handles = source.list()?;
        info!("Reconciling {} bill documents", handles.len());

        let mut engine = ReconciliationEngine::new();
        let mut processed = 0;
        let mut failed = 0;

        for handle in &handles {
            let record = match cache.get(&handle.id) {
                Some(record) => {
                    debug!("Cache hit for {}", handle.id);
                    Some(record)
                }
                None => {
                    let bytes = match source.fetch(handle) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!("Could not fetch {}: {}", handle.id, e);
                            failed += 1;
                            continue;
                        }
                    };
                    let record = extract_document(handle.source_type, &bytes);
                    if let Some(record) = &record {
                        cache.set(&handle.id, record);
                    }
                    record
                }
            };

            match record {
                Some(record) => {
                    engine.add_record(&record);
                    processed += 1;
                }
                None => failed += 1,
            }
        }

        if let Some(series) = daily_production {
            debug!("Installing daily production series ({} days)", series.len());
            engine.set_daily_production(series);
        }

        if failed > 0 {
            warn!("{} of {} documents were skipped", failed, handles.len());
        }

        Ok(LedgerReport {
            summaries: engine.monthly_summaries(),
            documents_processed: processed,
            documents_failed: failed,
        })
    }
}

pub fn build_energy_ledger(
    source: &dyn DocumentSource,
    cache: &mut dyn RecordCache,
) -> Result<LedgerReport> {
    BillLedgerProcessor::process(source, cache)
}

pub fn build_energy_ledger_with_production(
    source: &dyn DocumentSource,
    cache: &mut dyn RecordCache,
    daily_production: DailyProduction,
) -> Result<LedgerReport> {
    BillLedgerProcessor::process_with_production(source, cache, Some(daily_production))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// In-memory document source for pipeline tests.
    struct StaticSource {
        documents: Vec<(DocumentHandle, Vec<u8>)>,
    }

    impl StaticSource {
        fn new(documents: Vec<(&str, SourceType, &str)>) -> Self {
            Self {
                documents: documents
                    .into_iter()
                    .map(|(id, source_type, text)| {
                        (
                            DocumentHandle {
                                id: id.to_string(),
                                name: id.to_string(),
                                source_type,
                            },
                            text.as_bytes().to_vec(),
                        )
                    })
                    .collect(),
            }
        }
    }

    impl DocumentSource for StaticSource {
        fn list(&self) -> Result<Vec<DocumentHandle>> {
            Ok(self.documents.iter().map(|(h, _)| h.clone()).collect())
        }

        fn fetch(&self, handle: &DocumentHandle) -> Result<Vec<u8>> {
            self.documents
                .iter()
                .find(|(h, _)| h.id == handle.id)
                .map(|(_, bytes)| bytes.clone())
                .ok_or_else(|| LedgerError::Decode(format!("unknown handle {}", handle.id)))
        }
    }

    #[test]
    fn test_end_to_end_three_sources() {
        let source = StaticSource::new(vec![
            (
                "electric/nov.txt",
                SourceType::Electric,
                "Service Period: October 25, 2023 to November 25, 2023\n\
                 Current Charges $100.00\n\
                 Delivery Services\n  Total Usage: 300 kWh\n",
            ),
            (
                "solar/nov.txt",
                SourceType::Solar,
                "Billing Period: Oct 25 - Nov 24\nDue Date: 12/10/2023\nTotal Due: $101.00\n\
                 Electricity Produced: 400 kWh\n",
            ),
            (
                "gas/nov.txt",
                SourceType::Gas,
                "Statement Date: 11/25/23\nTotal Amount Due: $41.00\n11 Therms Billed Usage\n",
            ),
        ]);

        let mut cache = MemoryCache::new();
        let report = build_energy_ledger(&source, &mut cache).unwrap();

        assert_eq!(report.documents_processed, 3);
        assert_eq!(report.documents_failed, 0);
        assert_eq!(report.summaries.len(), 1);

        let nov = &report.summaries[0];
        assert_eq!(nov.month, "2023-11");
        assert_eq!(nov.bucket.imported_energy, 300.0);
        assert_eq!(nov.total_production, 400.0); // inverter, no meter figure
        assert_eq!(nov.true_consumption, 400.0 + 300.0);
        assert_eq!(nov.total_cost, 201.0);
        assert_eq!(nov.gas_energy_equivalent, 11.0 * KWH_PER_THERM);

        // Every successful extraction landed in the cache.
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_failed_documents_are_counted_not_fatal() {
        let source = StaticSource::new(vec![
            ("gas/ok.txt", SourceType::Gas, "Statement Date: 11/25/23\n5 Therms Billed Usage"),
            ("gas/bad.txt", SourceType::Gas, "nothing useful in here"),
        ]);

        let mut cache = MemoryCache::new();
        let report = build_energy_ledger(&source, &mut cache).unwrap();

        assert_eq!(report.documents_processed, 1);
        assert_eq!(report.documents_failed, 1);
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_hit_skips_extraction() {
        // The cached record disagrees with the document bytes on purpose; if
        // extraction ran again the therms would be 5, not 99.
        let source = StaticSource::new(vec![(
            "gas/nov.txt",
            SourceType::Gas,
            "Statement Date: 11/25/23\n5 Therms Billed Usage",
        )]);

        let mut cache = MemoryCache::new();
        cache.set(
            "gas/nov.txt",
            &BillRecord {
                date: NaiveDate::from_ymd_opt(2023, 11, 25).unwrap(),
                cost: 0.0,
                facts: BillFacts::Gas(GasFacts { therms_used: 99.0 }),
            },
        );

        let report = build_energy_ledger(&source, &mut cache).unwrap();
        assert_eq!(report.summaries[0].bucket.therms_used, 99.0);
    }

    #[test]
    fn test_daily_production_series_flows_through() {
        let source = StaticSource::new(vec![(
            "solar/nov.txt",
            SourceType::Solar,
            "Bill Date: 11/25/2023\nTotal Due: $101.00\nElectricity Produced: 400 kWh\n",
        )]);

        let mut series = DailyProduction::new();
        series.insert(NaiveDate::from_ymd_opt(2023, 11, 10).unwrap(), 20.0);
        series.insert(NaiveDate::from_ymd_opt(2023, 11, 11).unwrap(), 22.0);

        let mut cache = MemoryCache::new();
        let report =
            build_energy_ledger_with_production(&source, &mut cache, series).unwrap();

        // Daily series beats the inverter figure.
        assert_eq!(report.summaries[0].total_production, 42.0);
    }
}
