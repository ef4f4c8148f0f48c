//! Editable timestamp record for one file.
//!
//! A `StampRecord` is seeded from disk when the editor dialog opens and
//! tracks edits per field. Nothing touches the file until `save`, which
//! attempts each present field independently and reports per-field outcomes
//! for the UI to render.

use crate::stamp_backend::{FileStamps, StampBackend, StampError, TimestampKind};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Outcome of one field's write attempt. The error side is a display
/// string, ready to be shown to the user as-is.
#[derive(Debug)]
pub struct FieldOutcome {
    pub kind: TimestampKind,
    pub result: Result<(), String>,
}

/// Per-field results of one save. Absent fields are not attempted and do
/// not appear here.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub outcomes: Vec<FieldOutcome>,
}

impl SaveReport {
    pub fn all_ok(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (TimestampKind, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|msg| (o.kind, msg.as_str())))
    }
}

pub struct StampRecord {
    path: PathBuf,
    on_disk: FileStamps,
    edited: FileStamps,
}

impl StampRecord {
    /// Read all four timestamps for `path`. Kinds the OS/filesystem does
    /// not populate come back absent, not as errors.
    pub fn load<B: StampBackend>(path: &Path, backend: &B) -> Result<Self, StampError> {
        let stamps = backend.read_stamps(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            on_disk: stamps,
            edited: stamps,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, kind: TimestampKind) -> Option<DateTime<Local>> {
        self.edited.get(kind)
    }

    pub fn set(&mut self, kind: TimestampKind, when: DateTime<Local>) {
        self.edited.set(kind, Some(when));
    }

    pub fn field_dirty(&self, kind: TimestampKind) -> bool {
        self.edited.get(kind) != self.on_disk.get(kind)
    }

    pub fn is_dirty(&self) -> bool {
        TimestampKind::ALL.iter().any(|kind| self.field_dirty(*kind))
    }

    /// Set every present field to the oldest present value. Absent fields
    /// stay absent: the OS cannot write a kind it does not expose, so
    /// materializing a value there would only manufacture save failures.
    /// Idempotent.
    pub fn set_all_to_oldest(&mut self) {
        let Some(oldest) = self.edited.oldest() else {
            return;
        };
        for kind in TimestampKind::ALL {
            if self.edited.get(kind).is_some() {
                self.edited.set(kind, Some(oldest));
            }
        }
    }

    /// Throw away edits and re-seed from disk.
    pub fn discard<B: StampBackend>(&mut self, backend: &B) -> Result<(), StampError> {
        let stamps = backend.read_stamps(&self.path)?;
        self.on_disk = stamps;
        self.edited = stamps;
        Ok(())
    }

    /// Write every present field through the backend. Each write is
    /// isolated: one failure never aborts the siblings. Fields that land
    /// on disk become clean; failed fields stay dirty.
    pub fn save<B: StampBackend>(&mut self, backend: &B) -> SaveReport {
        let mut report = SaveReport::default();
        for kind in TimestampKind::ALL {
            let Some(when) = self.edited.get(kind) else {
                continue;
            };
            let result = match backend.write_stamp(&self.path, kind, when) {
                Ok(()) => {
                    self.on_disk.set(kind, Some(when));
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            };
            report.outcomes.push(FieldOutcome { kind, result });
        }
        report
    }
}

// ============================================================================
// Tests
// ============================================================================
