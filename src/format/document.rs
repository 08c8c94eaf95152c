//! Export document model and the whole-collection export/import operations.

use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::format::error::FormatError;
use crate::model::Point;
use crate::store::AnnotationStore;

/// Annotations of one sequence as written to the export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceEntry {
    /// Sequence identifier, repeated inside the entry
    pub sequence: String,
    /// Stored points in placement order
    pub points: Vec<Point>,
}

impl SequenceEntry {
    pub fn new(sequence: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            sequence: sequence.into(),
            points,
        }
    }
}

/// The combined export document.
///
/// Serializes as a JSON object keyed by sequence identifier, keeping the
/// order in which entries were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationDocument {
    pub entries: Vec<SequenceEntry>,
}

impl AnnotationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of points across all entries.
    pub fn total_points(&self) -> usize {
        self.entries.iter().map(|e| e.points.len()).sum()
    }

    /// Pretty-printed JSON text.
    pub fn to_json_pretty(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up an entry by sequence identifier.
    pub fn get(&self, sequence: &str) -> Option<&SequenceEntry> {
        self.entries.iter().find(|e| e.sequence == sequence)
    }
}

impl Serialize for AnnotationDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.sequence, entry)?;
        }
        map.end()
    }
}

/// Counts reported after an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub sequences: usize,
    pub points: usize,
}

/// Build the export document from the stored points of every sequence.
///
/// Sequences without stored points are exported with an empty list.
pub fn export_all(sequence_ids: &[String], store: &dyn AnnotationStore) -> AnnotationDocument {
    let entries = sequence_ids
        .iter()
        .map(|id| SequenceEntry::new(id.clone(), store.load(id)))
        .collect();
    AnnotationDocument { entries }
}

/// Write an export document to a file.
pub fn write_export(
    document: &AnnotationDocument,
    path: &Path,
) -> Result<ExportSummary, FormatError> {
    log::info!("Exporting annotations to {:?}", path);
    let json = document.to_json_pretty()?;
    std::fs::write(path, json).map_err(|e| FormatError::io(path, e))?;

    let summary = ExportSummary {
        sequences: document.entries.len(),
        points: document.total_points(),
    };
    log::info!(
        "Exported {} sequences with {} points",
        summary.sequences,
        summary.points
    );
    Ok(summary)
}

/// A fully parsed import, ready to be applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportPlan {
    /// Entries that will overwrite stored points
    pub entries: Vec<SequenceEntry>,
    /// Keys that had no usable `points` array
    pub skipped: Vec<String>,
}

impl ImportPlan {
    /// Parse an import document without touching any store.
    ///
    /// Keys whose value lacks a `points` array, or whose array is empty,
    /// are skipped. Any malformed point rejects the whole document.
    pub fn parse(json: &str) -> Result<Self, FormatError> {
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(root) = root else {
            return Err(FormatError::invalid_format(
                "top level must be an object keyed by sequence",
            ));
        };

        let mut plan = ImportPlan::default();
        for (sequence, value) in root {
            log::debug!("Found sequence '{}' in import", sequence);
            let points = match value.get("points") {
                None | Some(Value::Null) => {
                    log::warn!("No points found for sequence '{}'", sequence);
                    plan.skipped.push(sequence);
                    continue;
                }
                Some(points) => points.clone(),
            };

            let points: Vec<Point> = match serde_json::from_value(points) {
                Ok(points) => points,
                Err(source) => return Err(FormatError::InvalidPoints { sequence, source }),
            };

            if points.is_empty() {
                log::warn!("Empty points list for sequence '{}'", sequence);
                plan.skipped.push(sequence);
                continue;
            }
            plan.entries.push(SequenceEntry::new(sequence, points));
        }
        Ok(plan)
    }

    /// Overwrite the stored points of every planned sequence.
    ///
    /// Every key is checked before the first write. If a write still fails,
    /// the sequences already written get their previous lists back.
    pub fn apply(self, store: &mut dyn AnnotationStore) -> Result<ImportSummary, FormatError> {
        for entry in &self.entries {
            store.check_key(&entry.sequence)?;
        }

        let mut summary = ImportSummary {
            skipped: self.skipped,
            ..ImportSummary::default()
        };
        let mut previous: Vec<(String, Vec<Point>)> = Vec::new();
        for entry in self.entries {
            let before = store.load(&entry.sequence);
            if let Err(e) = store.save(&entry.sequence, &entry.points) {
                log::error!("Import failed at sequence '{}': {}", entry.sequence, e);
                restore(store, previous);
                return Err(e.into());
            }
            previous.push((entry.sequence.clone(), before));
            summary.points += entry.points.len();
            summary.imported.push(entry.sequence);
        }
        Ok(summary)
    }
}

/// Put back the lists a failed import had already overwritten.
fn restore(store: &mut dyn AnnotationStore, previous: Vec<(String, Vec<Point>)>) {
    for (sequence, points) in previous.into_iter().rev() {
        let result = if points.is_empty() {
            store.clear(&sequence)
        } else {
            store.save(&sequence, &points)
        };
        if let Err(e) = result {
            log::error!("Failed to restore points for '{}': {}", sequence, e);
        }
    }
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Sequences whose stored points were replaced
    pub imported: Vec<String>,
    /// Keys without a usable `points` array
    pub skipped: Vec<String>,
    /// Total number of imported points
    pub points: usize,
}

impl ImportSummary {
    /// Whether a sequence was among those overwritten.
    pub fn contains(&self, sequence: &str) -> bool {
        self.imported.iter().any(|s| s == sequence)
    }
}

/// Parse an import document and write its points to the store.
///
/// The whole document is parsed and every key checked before anything is
/// written, so a rejected document leaves the store untouched.
pub fn import_all(
    json: &str,
    store: &mut dyn AnnotationStore,
) -> Result<ImportSummary, FormatError> {
    let summary = ImportPlan::parse(json)?.apply(store)?;
    log::info!(
        "Imported {} points for {} sequences ({} skipped)",
        summary.points,
        summary.imported.len(),
        summary.skipped.len()
    );
    Ok(summary)
}

/// Read an import document from a file.
pub fn read_import(path: &Path) -> Result<String, FormatError> {
    log::info!("Reading annotations from {:?}", path);
    std::fs::read_to_string(path).map_err(|e| FormatError::io(path, e))
}
