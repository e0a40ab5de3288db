use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::zsun::riders::error::{Result, RiderError, ValidationCode};
use crate::zsun::riders::io::payload::RawPayload;
use crate::zsun::riders::model::{RiderEntity, RiderId, is_rider_id};
use crate::zsun::riders::normalize::{self, json_kind};

/// Outcome of a load: how many entries were stored and how many were
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// In-memory store of normalized riders keyed by identifier.
///
/// Loads replace the whole mapping in one swap, so a failed load never
/// leaves a partially updated store behind.
#[derive(Debug, Clone, Default)]
pub struct RiderRepository {
    riders: HashMap<RiderId, RiderEntity>,
}

impl RiderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads whichever shape the payload has.
    pub fn load(&mut self, payload: &RawPayload) -> Result<LoadReport> {
        match payload {
            RawPayload::Dictionary(dictionary) => self.load_dictionary(dictionary),
            RawPayload::Records(records) => self.load_from_raw_records(records),
        }
    }

    /// Replaces the repository with the riders of a dictionary payload
    /// mapping identifier → raw record.
    ///
    /// Rejects arrays, non-objects and empty dictionaries without touching
    /// the current contents. Entries whose key is not a digits-only
    /// identifier, whose value is not a record, or that fail the identity
    /// gate are skipped and counted.
    pub fn load_from_raw_dictionary(&mut self, dictionary: &Value) -> Result<LoadReport> {
        match dictionary {
            Value::Object(entries) => self.load_dictionary(entries),
            other => Err(RiderError::validation(
                ValidationCode::NotAnObject,
                format!(
                    "rider dictionary must be a JSON object, found {}",
                    json_kind(other)
                ),
            )),
        }
    }

    fn load_dictionary(&mut self, entries: &Map<String, Value>) -> Result<LoadReport> {
        if entries.is_empty() {
            return Err(RiderError::validation(
                ValidationCode::EmptyDictionary,
                "rider dictionary holds no entries",
            ));
        }

        let mut riders = HashMap::with_capacity(entries.len());
        let mut skipped = 0;

        for (key, value) in entries {
            if !is_rider_id(key) {
                debug!(%key, "skipping entry with invalid identifier key");
                skipped += 1;
                continue;
            }
            match record_object(value).and_then(|record| normalize::normalize_record(&record)) {
                Some(rider) if is_rider_id(rider.id()) => {
                    if rider.id() != key {
                        debug!(%key, rider_id = rider.id(), "dictionary key differs from record id");
                    }
                    if riders.insert(rider.id().to_string(), rider).is_some() {
                        debug!(%key, "entry replaced an earlier rider with the same id");
                        skipped += 1;
                    }
                }
                _ => {
                    debug!(%key, "skipping entry that failed normalization");
                    skipped += 1;
                }
            }
        }

        Ok(self.replace(riders, skipped))
    }

    /// Replaces the repository with the riders of an array payload. Each
    /// rider is keyed by its own identifier; later duplicates win and the
    /// replaced record counts as skipped.
    pub fn load_from_raw_records(&mut self, records: &[Value]) -> Result<LoadReport> {
        let mut riders = HashMap::with_capacity(records.len());
        let mut skipped = 0;

        for (index, value) in records.iter().enumerate() {
            match record_object(value).and_then(|record| normalize::normalize_record(&record)) {
                Some(rider) if is_rider_id(rider.id()) => {
                    if riders.insert(rider.id().to_string(), rider).is_some() {
                        debug!(index, "record replaced an earlier rider with the same id");
                        skipped += 1;
                    }
                }
                _ => {
                    debug!(index, "skipping record that failed normalization");
                    skipped += 1;
                }
            }
        }

        Ok(self.replace(riders, skipped))
    }

    fn replace(&mut self, riders: HashMap<RiderId, RiderEntity>, skipped: usize) -> LoadReport {
        let report = LoadReport {
            loaded: riders.len(),
            skipped,
        };
        self.riders = riders;
        info!(loaded = report.loaded, skipped = report.skipped, "rider repository replaced");
        report
    }

    /// Keeps only the riders whose identifiers appear in `retain` and
    /// returns how many were dropped.
    pub fn compact_to_subset<I, T>(&mut self, retain: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let retain: HashSet<String> = retain.into_iter().map(|id| id.to_string()).collect();
        let before = self.riders.len();
        let kept: HashMap<RiderId, RiderEntity> = std::mem::take(&mut self.riders)
            .into_iter()
            .filter(|(id, _)| retain.contains(id))
            .collect();
        self.riders = kept;
        let removed = before - self.riders.len();
        debug!(removed, remaining = self.riders.len(), "rider repository compacted");
        removed
    }

    /// Like [`compact_to_subset`](Self::compact_to_subset) for a raw JSON
    /// array of string or numeric identifiers. Anything other than an array
    /// is a no-op returning zero.
    pub fn compact_to_subset_value(&mut self, retain: &Value) -> usize {
        let Value::Array(items) = retain else {
            return 0;
        };
        let ids = items.iter().filter_map(|item| match item {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Number(number) => normalize::number_to_identifier(number),
            _ => None,
        });
        self.compact_to_subset(ids)
    }

    pub fn clear(&mut self) {
        self.riders.clear();
    }

    pub fn get_by_id(&self, id: &str) -> Option<&RiderEntity> {
        self.riders.get(id)
    }

    pub fn count(&self) -> usize {
        self.riders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }

    /// Riders ordered by display name, ignoring case and accents; ties fall
    /// back to the identifier so the order is stable.
    pub fn all_sorted_by_display_name(&self) -> Vec<&RiderEntity> {
        let mut riders: Vec<&RiderEntity> = self.riders.values().collect();
        riders.sort_by(|lhs, rhs| compare_display_names(lhs, rhs));
        riders
    }

    pub fn iter(&self) -> impl Iterator<Item = &RiderEntity> {
        self.riders.values()
    }
}

fn compare_display_names(lhs: &RiderEntity, rhs: &RiderEntity) -> Ordering {
    let left = collation_key(lhs.display_name());
    let right = collation_key(rhs.display_name());
    left.cmp(&right)
        .then_with(|| lhs.id().len().cmp(&rhs.id().len()))
        .then_with(|| lhs.id().cmp(rhs.id()))
}

/// Base-letter comparison key: case and accents are ignored, so `"Émile"`
/// sorts with `"emile"`.
fn collation_key(name: &str) -> String {
    name.trim()
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase()
}

/// Dictionary values may be record objects or strings holding a JSON
/// record object.
fn record_object(value: &Value) -> Option<Cow<'_, Map<String, Value>>> {
    match value {
        Value::Object(record) => Some(Cow::Borrowed(record)),
        Value::String(text) => match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(record)) => Some(Cow::Owned(record)),
            _ => None,
        },
        _ => None,
    }
}
