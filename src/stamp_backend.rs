//! OS timestamp capability.
//!
//! Reading goes through `std::fs::Metadata` (plus the unix `ctime` fields for
//! the metadata-change time); writing goes through the `filetime` crate.
//! Support varies per kind and per platform, so a kind the OS cannot read
//! comes back as `None` and a kind it cannot write fails only that field.

use chrono::{DateTime, Local, TimeZone};
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use thiserror::Error;

/// One of the four filesystem timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampKind {
    Created,
    Accessed,
    MetadataChanged,
    Modified,
}

impl TimestampKind {
    pub const ALL: [TimestampKind; 4] = [
        TimestampKind::Created,
        TimestampKind::Accessed,
        TimestampKind::MetadataChanged,
        TimestampKind::Modified,
    ];

    /// User-facing name, matching the tree view column headers.
    pub fn label(&self) -> &'static str {
        match self {
            TimestampKind::Created => "Created",
            TimestampKind::Accessed => "Accessed",
            TimestampKind::MetadataChanged => "Metadata Changed",
            TimestampKind::Modified => "Modified",
        }
    }
}

#[derive(Error, Debug)]
pub enum StampError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("setting the {} time is not supported on this operating system", .0.label().to_lowercase())]
    Unsupported(TimestampKind),
}

/// The four timestamps of one file. A `None` field means the OS or the
/// filesystem does not populate that kind.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FileStamps {
    pub created: Option<DateTime<Local>>,
    pub accessed: Option<DateTime<Local>>,
    pub meta_changed: Option<DateTime<Local>>,
    pub modified: Option<DateTime<Local>>,
}

impl FileStamps {
    pub fn get(&self, kind: TimestampKind) -> Option<DateTime<Local>> {
        match kind {
            TimestampKind::Created => self.created,
            TimestampKind::Accessed => self.accessed,
            TimestampKind::MetadataChanged => self.meta_changed,
            TimestampKind::Modified => self.modified,
        }
    }

    pub fn set(&mut self, kind: TimestampKind, value: Option<DateTime<Local>>) {
        match kind {
            TimestampKind::Created => self.created = value,
            TimestampKind::Accessed => self.accessed = value,
            TimestampKind::MetadataChanged => self.meta_changed = value,
            TimestampKind::Modified => self.modified = value,
        }
    }

    /// Minimum of the present fields, `None` if all four are absent.
    pub fn oldest(&self) -> Option<DateTime<Local>> {
        TimestampKind::ALL
            .iter()
            .filter_map(|kind| self.get(*kind))
            .min()
    }
}

/// Seam over the OS timestamp primitives so the record layer can be
/// exercised against a stub in tests.
pub trait StampBackend {
    fn read_stamps(&self, path: &Path) -> Result<FileStamps, StampError>;

    fn write_stamp(
        &self,
        path: &Path,
        kind: TimestampKind,
        when: DateTime<Local>,
    ) -> Result<(), StampError>;
}

/// The real capability, backed by `std::fs` and `filetime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsStampBackend;

impl StampBackend for OsStampBackend {
    fn read_stamps(&self, path: &Path) -> Result<FileStamps, StampError> {
        let metadata = fs::metadata(path)?;

        Ok(FileStamps {
            created: metadata.created().ok().map(DateTime::<Local>::from),
            accessed: metadata.accessed().ok().map(DateTime::<Local>::from),
            meta_changed: read_meta_changed(&metadata),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
        })
    }

    fn write_stamp(
        &self,
        path: &Path,
        kind: TimestampKind,
        when: DateTime<Local>,
    ) -> Result<(), StampError> {
        let file_time = filetime::FileTime::from_system_time(SystemTime::from(when));
        match kind {
            TimestampKind::Accessed => filetime::set_file_atime(path, file_time)?,
            TimestampKind::Modified => filetime::set_file_mtime(path, file_time)?,
            // No portable API sets either of these; the record layer turns
            // this into a per-field failure instead of aborting the save.
            TimestampKind::Created | TimestampKind::MetadataChanged => {
                return Err(StampError::Unsupported(kind));
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn read_meta_changed(metadata: &fs::Metadata) -> Option<DateTime<Local>> {
    use std::os::unix::fs::MetadataExt;
    Local
        .timestamp_opt(metadata.ctime(), metadata.ctime_nsec() as u32)
        .single()
}

#[cfg(not(unix))]
fn read_meta_changed(_metadata: &fs::Metadata) -> Option<DateTime<Local>> {
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn setup_test_file() -> (PathBuf, PathBuf) {
        let test_dir = std::env::temp_dir().join(format!("test_stamps_{}", Uuid::new_v4()));
        fs::create_dir_all(&test_dir).unwrap();
        let file = test_dir.join("sample.txt");
        fs::write(&file, "sample").unwrap();
        (test_dir, file)
    }

    fn cleanup_test_dir(test_dir: &Path) {
        let _ = fs::remove_dir_all(test_dir);
    }

    #[test]
    fn test_read_stamps_populates_common_kinds() {
        let (test_dir, file) = setup_test_file();

        let stamps = OsStampBackend.read_stamps(&file).unwrap();
        assert!(stamps.accessed.is_some(), "access time should be readable");
        assert!(
            stamps.modified.is_some(),
            "modification time should be readable"
        );

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_read_stamps_missing_file_is_io_error() {
        let missing = std::env::temp_dir().join(format!("no_such_{}", Uuid::new_v4()));
        let result = OsStampBackend.read_stamps(&missing);
        assert!(matches!(result, Err(StampError::Io(_))));
    }

    #[test]
    fn test_write_mtime_round_trip() {
        let (test_dir, file) = setup_test_file();

        let target = Local::now() - Duration::days(400);
        OsStampBackend
            .write_stamp(&file, TimestampKind::Modified, target)
            .unwrap();

        let stamps = OsStampBackend.read_stamps(&file).unwrap();
        let written = stamps.modified.expect("mtime should read back");
        // Filesystems vary in sub-second precision; compare at whole seconds.
        assert_eq!(written.timestamp(), target.timestamp());

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_unwritable_kinds_fail_per_field() {
        let (test_dir, file) = setup_test_file();

        let now = Local::now();
        for kind in [TimestampKind::Created, TimestampKind::MetadataChanged] {
            match OsStampBackend.write_stamp(&file, kind, now) {
                Err(StampError::Unsupported(reported)) => assert_eq!(reported, kind),
                other => panic!("expected Unsupported for {:?}, got {:?}", kind, other),
            }
        }

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_oldest_ignores_absent_fields() {
        let earlier = Local::now() - Duration::days(10);
        let later = Local::now();
        let stamps = FileStamps {
            created: None,
            accessed: Some(later),
            meta_changed: None,
            modified: Some(earlier),
        };
        assert_eq!(stamps.oldest(), Some(earlier));
        assert_eq!(FileStamps::default().oldest(), None);
    }
}
