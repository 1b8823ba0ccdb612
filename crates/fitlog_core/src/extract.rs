//! Streaming extraction of the health XML export.
//!
//! The export can be hundreds of megabytes; whole-document parsing is the
//! failure mode this module exists to avoid. [`ExportScan`] pulls events
//! from the document one at a time through a reusable buffer that is
//! cleared after every event, so memory stays bounded regardless of input
//! size. The scan is a lazy, finite, non-restartable iterator.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use tracing::{debug, info};

use crate::timestamp::{self, Stamp};
use crate::types::{HealthMetric, QuantityRecord, WorkoutRecord};
use crate::{FitlogError, Result, tables};

/// Extraction options: retention window, record-type allow-list, workout
/// toggle. `now` is injectable so cutoff behavior is testable; production
/// callers use [`Default`].
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Keep only records newer than this many days.
    pub since_days: u32,
    /// Friendly keys or raw HK identifiers. Empty means the default set.
    pub record_types: Vec<String>,
    pub keep_workouts: bool,
    /// Reference instant for the cutoff computation.
    pub now: DateTime<Utc>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            since_days: 365,
            record_types: Vec::new(),
            keep_workouts: true,
            now: Utc::now(),
        }
    }
}

impl ExtractOptions {
    /// Resolve the allow-list to HK identifiers.
    pub fn wanted_hk(&self) -> HashSet<String> {
        if self.record_types.is_empty() {
            HealthMetric::DEFAULT_EXTRACT
                .iter()
                .map(|m| m.hk_identifier().to_string())
                .collect()
        } else {
            self.record_types
                .iter()
                .map(|k| HealthMetric::resolve(k))
                .collect()
        }
    }

    /// Records with an instant at or after this are kept (inclusive).
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.now - Duration::days(i64::from(self.since_days))
    }
}

/// One item produced by the scan.
#[derive(Clone, Debug)]
pub enum ScanItem {
    Record(QuantityRecord),
    Workout(WorkoutRecord),
}

/// Counters reported after a scan completes.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ScanStats {
    pub kept_records: u64,
    pub kept_workouts: u64,
    /// Rows discarded by the retention cutoff.
    pub skipped_old: u64,
    /// Recovered per-row problems (bad attribute, bad number, bad stamp).
    pub warnings: u64,
}

/// Lazy, finite, non-restartable stream of normalized rows out of the
/// export. Yields `Err` only for fatal conditions (IO, malformed XML
/// structure); per-element problems are skipped and counted.
///
/// An unparseable start timestamp keeps the row: a malformed stamp cannot
/// prove the record is stale, and dropping data on parser weakness would
/// violate the fault-containment policy. It still counts as a warning.
pub struct ExportScan {
    reader: Reader<BufReader<File>>,
    buf: Vec<u8>,
    wanted: HashSet<String>,
    cutoff: DateTime<Utc>,
    keep_workouts: bool,
    stats: ScanStats,
    done: bool,
}

impl ExportScan {
    /// Open the export for streaming.
    pub fn open(path: &Path, opts: &ExtractOptions) -> Result<Self> {
        if opts.since_days == 0 {
            return Err(FitlogError::invalid_param("since_days must be at least 1"));
        }
        let reader = Reader::from_file(path)?;
        Ok(Self {
            reader,
            buf: Vec::new(),
            wanted: opts.wanted_hk(),
            cutoff: opts.cutoff(),
            keep_workouts: opts.keep_workouts,
            stats: ScanStats::default(),
            done: false,
        })
    }

    /// Counters so far; final once the iterator returns `None`.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    fn attrs(&mut self, e: &BytesStart<'_>) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for attr in e.attributes() {
            match attr {
                Ok(a) => {
                    let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
                    match a.unescape_value() {
                        Ok(v) => {
                            map.insert(key, v.into_owned());
                        }
                        Err(err) => {
                            self.stats.warnings += 1;
                            debug!("skipping unescapable attribute {key}: {err}");
                        }
                    }
                }
                Err(err) => {
                    self.stats.warnings += 1;
                    debug!("skipping malformed attribute: {err}");
                }
            }
        }
        map
    }

    /// Start stamp from the usual attribute chain. `None` means the
    /// element carries no timestamp at all.
    fn start_stamp(attrs: &HashMap<String, String>) -> Option<Stamp> {
        ["startDate", "creationDate", "endDate"]
            .iter()
            .find_map(|k| attrs.get(*k))
            .map(|raw| timestamp::normalize(raw))
    }

    /// Cutoff check shared by records and workouts. Returns false when
    /// the row is stale and should be dropped.
    fn within_window(&mut self, start: &Stamp) -> bool {
        match start.utc() {
            Some(t) if t < self.cutoff => {
                self.stats.skipped_old += 1;
                false
            }
            Some(_) => true,
            None => {
                self.stats.warnings += 1;
                true
            }
        }
    }

    fn end_stamp(attrs: &HashMap<String, String>, start: &Stamp) -> Stamp {
        attrs
            .get("endDate")
            .map(|raw| timestamp::normalize(raw))
            .unwrap_or_else(|| start.clone())
    }

    fn take_record(&mut self, e: &BytesStart<'_>) -> Option<QuantityRecord> {
        let mut attrs = self.attrs(e);
        let kind = attrs.remove("type")?;
        if !self.wanted.contains(&kind) {
            return None;
        }
        let Some(start) = Self::start_stamp(&attrs) else {
            self.stats.warnings += 1;
            debug!("record {kind} has no timestamp, skipped");
            return None;
        };
        if !self.within_window(&start) {
            return None;
        }
        let value = match attrs.get("value").map(|v| v.trim().parse::<f64>()) {
            Some(Ok(v)) => v,
            _ => {
                self.stats.warnings += 1;
                debug!("record {kind} has no numeric value, skipped");
                return None;
            }
        };
        let end = Self::end_stamp(&attrs, &start);
        self.stats.kept_records += 1;
        Some(QuantityRecord {
            kind,
            value,
            unit: attrs.remove("unit"),
            start,
            end,
            source_name: attrs.remove("sourceName"),
            source_version: attrs.remove("sourceVersion"),
            device: attrs.remove("device"),
        })
    }

    fn take_workout(&mut self, e: &BytesStart<'_>) -> Option<WorkoutRecord> {
        let mut attrs = self.attrs(e);
        let activity_type = attrs.remove("workoutActivityType")?;
        let Some(start) = Self::start_stamp(&attrs) else {
            self.stats.warnings += 1;
            debug!("workout {activity_type} has no timestamp, skipped");
            return None;
        };
        if !self.within_window(&start) {
            return None;
        }
        let end = Self::end_stamp(&attrs, &start);
        let mut numeric = |key: &str| -> Option<f64> {
            let raw = attrs.get(key)?;
            match raw.trim().parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    self.stats.warnings += 1;
                    None
                }
            }
        };
        let duration = numeric("duration");
        let distance = numeric("totalDistance");
        let energy = numeric("totalEnergyBurned");
        self.stats.kept_workouts += 1;
        Some(WorkoutRecord {
            activity_type,
            duration,
            duration_unit: attrs.remove("durationUnit"),
            distance,
            distance_unit: attrs.remove("totalDistanceUnit"),
            energy,
            energy_unit: attrs.remove("totalEnergyBurnedUnit"),
            start,
            end,
            source_name: attrs.remove("sourceName"),
            source_version: attrs.remove("sourceVersion"),
            device: attrs.remove("device"),
        })
    }
}

impl Iterator for ExportScan {
    type Item = Result<ScanItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // The event borrows the buffer, so hold it as a local while the
        // element handlers need `&mut self`.
        let mut buf = std::mem::take(&mut self.buf);
        let out = loop {
            // Subtree memory is released here on every pass.
            buf.clear();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(ev) => ev,
                Err(err) => {
                    self.done = true;
                    break Some(Err(err.into()));
                }
            };
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let name = e.local_name();
                    if name.as_ref() == b"Record" {
                        if let Some(rec) = self.take_record(e) {
                            break Some(Ok(ScanItem::Record(rec)));
                        }
                    } else if name.as_ref() == b"Workout" && self.keep_workouts {
                        if let Some(wk) = self.take_workout(e) {
                            break Some(Ok(ScanItem::Workout(wk)));
                        }
                    }
                }
                Event::Eof => {
                    self.done = true;
                    break None;
                }
                _ => {}
            }
        };
        self.buf = buf;
        out
    }
}

/// Result of a trim run: the tables actually produced (absent when zero
/// rows of that kind existed) plus the scan counters.
#[derive(Clone, Debug, Serialize)]
pub struct TrimOutput {
    pub records: Option<PathBuf>,
    pub workouts: Option<PathBuf>,
    #[serde(flatten)]
    pub stats: ScanStats,
}

/// Stream, filter, and save the export into compact `records.csv` /
/// `workouts.csv` tables under `out_dir`. Each file is created lazily on
/// its first row; a failed run removes whatever it had started writing so
/// a retry starts clean.
pub fn trim_export(xml: &Path, out_dir: &Path, opts: &ExtractOptions) -> Result<TrimOutput> {
    std::fs::create_dir_all(out_dir)?;
    let rec_path = out_dir.join(tables::RECORDS_FILE);
    let wk_path = out_dir.join(tables::WORKOUTS_FILE);

    let mut scan = ExportScan::open(xml, opts)?;
    match stream_tables(&mut scan, &rec_path, &wk_path) {
        Ok((wrote_records, wrote_workouts)) => {
            let stats = scan.stats();
            info!(
                kept_records = stats.kept_records,
                kept_workouts = stats.kept_workouts,
                skipped_old = stats.skipped_old,
                warnings = stats.warnings,
                "trim complete"
            );
            Ok(TrimOutput {
                records: wrote_records.then_some(rec_path),
                workouts: wrote_workouts.then_some(wk_path),
                stats,
            })
        }
        Err(err) => {
            let _ = std::fs::remove_file(&rec_path);
            let _ = std::fs::remove_file(&wk_path);
            Err(err)
        }
    }
}

fn stream_tables(
    scan: &mut ExportScan,
    rec_path: &Path,
    wk_path: &Path,
) -> Result<(bool, bool)> {
    let mut rec_writer: Option<csv::Writer<File>> = None;
    let mut wk_writer: Option<csv::Writer<File>> = None;

    for item in scan.by_ref() {
        match item? {
            ScanItem::Record(rec) => {
                if rec_writer.is_none() {
                    rec_writer = Some(tables::open_writer(rec_path)?);
                }
                if let Some(writer) = rec_writer.as_mut() {
                    writer.serialize(tables::RecordCsvRow::from(&rec))?;
                }
            }
            ScanItem::Workout(wk) => {
                if wk_writer.is_none() {
                    wk_writer = Some(tables::open_writer(wk_path)?);
                }
                if let Some(writer) = wk_writer.as_mut() {
                    writer.serialize(tables::WorkoutCsvRow::from(&wk))?;
                }
            }
        }
    }
    if let Some(w) = rec_writer.as_mut() {
        w.flush()?;
    }
    if let Some(w) = wk_writer.as_mut() {
        w.flush()?;
    }
    Ok((rec_writer.is_some(), wk_writer.is_some()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_options_keep_a_year() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.since_days, 365);
        assert!(opts.keep_workouts);
        assert_eq!(opts.wanted_hk().len(), 5);
    }

    #[test]
    fn explicit_types_resolve_to_hk_identifiers() {
        let opts = ExtractOptions {
            record_types: vec!["body_mass".into(), "HKQuantityTypeIdentifierVO2Max".into()],
            ..Default::default()
        };
        let wanted = opts.wanted_hk();
        assert!(wanted.contains("HKQuantityTypeIdentifierBodyMass"));
        assert!(wanted.contains("HKQuantityTypeIdentifierVO2Max"));
        assert_eq!(wanted.len(), 2);
    }

    #[test]
    fn cutoff_is_now_minus_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let opts = ExtractOptions {
            since_days: 30,
            now,
            ..Default::default()
        };
        assert_eq!(opts.cutoff(), now - Duration::days(30));
    }
}
