//! Shared-memory publisher.
//!
//! The snapshot record lives in a file-backed mapping so external processes
//! can `mmap` the same bytes. On Linux the file sits in `/dev/shm` (the same
//! convention the huginn-style feeds use); elsewhere it falls back to the
//! temp directory. The region name is part of the public ABI, as is the
//! sidecar descriptor that tells consumers where every variable lives.

pub mod sidecar;

pub use sidecar::{write_sidecar, OffsetsDocument, SIDECAR_NAME};

use crate::snapshot::{snapshot_size, TelemetrySnapshot};
use anyhow::{Context, Result};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Public name of the shared region.
pub const REGION_NAME: &str = "AeroflyBridgeData";

/// Default directory for the region file.
pub fn default_region_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/dev/shm")
    }
    #[cfg(not(target_os = "linux"))]
    {
        std::env::temp_dir()
    }
}

/// Owns the mapped snapshot region. Single writer: the host thread mutates
/// the snapshot through [`Self::snapshot_mut`]; external readers map the
/// same file read-only and follow the validity gate.
pub struct SharedMemoryPublisher {
    map: MmapMut,
    path: PathBuf,
    _file: File,
}

impl SharedMemoryPublisher {
    /// Create (or recreate) the region under the default directory.
    pub fn create() -> Result<Self> {
        Self::create_in(&default_region_dir())
    }

    /// Create the region file inside `dir`. The file is truncated to exactly
    /// the snapshot size and starts zeroed, which is a valid initial record.
    pub fn create_in(dir: &Path) -> Result<Self> {
        let path = dir.join(REGION_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("failed to create shared region at {}", path.display()))?;

        let size = snapshot_size();
        file.set_len(size as u64)
            .context("failed to size shared region")?;

        let map = unsafe { MmapMut::map_mut(&file) }.context("failed to map shared region")?;
        assert!(map.len() >= size);
        assert_eq!(
            map.as_ptr() as usize % std::mem::align_of::<TelemetrySnapshot>(),
            0,
            "mapping is not aligned for the snapshot record"
        );

        let mut publisher = Self {
            map,
            path,
            _file: file,
        };
        publisher.snapshot_mut().init_in_place();

        info!(
            path = %publisher.path.display(),
            bytes = size,
            "shared memory region created"
        );
        Ok(publisher)
    }

    #[inline]
    pub fn snapshot(&self) -> &TelemetrySnapshot {
        // SAFETY: the mapping is at least snapshot_size() bytes, aligned
        // (asserted at creation), and every bit pattern is a valid record.
        unsafe { &*(self.map.as_ptr() as *const TelemetrySnapshot) }
    }

    #[inline]
    pub fn snapshot_mut(&mut self) -> &mut TelemetrySnapshot {
        // SAFETY: as above; &mut self guarantees writer exclusivity in-process.
        unsafe { &mut *(self.map.as_mut_ptr() as *mut TelemetrySnapshot) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unmap and remove the region file. Called on shutdown; dropping the
    /// publisher without closing leaves the file behind for late readers.
    pub fn close(self) {
        let path = self.path.clone();
        drop(self.map);
        if let Err(e) = std::fs::remove_file(&path) {
            debug!(path = %path.display(), error = %e, "could not remove region file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::LAYOUT_VERSION;

    #[test]
    fn test_region_created_and_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = SharedMemoryPublisher::create_in(dir.path()).unwrap();

        assert!(publisher.path().exists());
        assert_eq!(
            std::fs::metadata(publisher.path()).unwrap().len(),
            snapshot_size() as u64
        );
        let snapshot = publisher.snapshot();
        assert!(!snapshot.is_valid());
        assert_eq!(snapshot.header.layout_version, LAYOUT_VERSION);
    }

    #[test]
    fn test_writes_reach_the_backing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut publisher = SharedMemoryPublisher::create_in(dir.path()).unwrap();

        let index = crate::registry::registry()
            .index_of_name("Aircraft.Altitude")
            .unwrap();
        let snapshot = publisher.snapshot_mut();
        snapshot.begin_update();
        snapshot.set_scalar(index, 1066.8);
        snapshot.commit_update(1);

        let offset = crate::snapshot::scalar_array_offset() + 8 * index;
        let raw = &publisher.map[offset..offset + 8];
        assert_eq!(f64::from_le_bytes(raw.try_into().unwrap()), 1066.8);
    }

    #[test]
    fn test_close_removes_region_file() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = SharedMemoryPublisher::create_in(dir.path()).unwrap();
        let path = publisher.path().to_path_buf();
        publisher.close();
        assert!(!path.exists());
    }

    #[test]
    fn test_recreate_over_existing_region() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut publisher = SharedMemoryPublisher::create_in(dir.path()).unwrap();
            let snapshot = publisher.snapshot_mut();
            snapshot.begin_update();
            snapshot.set_scalar(0, 5.0);
            snapshot.commit_update(1);
        }
        // A second bridge instance truncates and starts clean.
        let publisher = SharedMemoryPublisher::create_in(dir.path()).unwrap();
        assert_eq!(publisher.snapshot().scalar(0), 0.0);
        assert!(!publisher.snapshot().is_valid());
    }
}
