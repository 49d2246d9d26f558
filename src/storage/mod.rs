use std::fmt::Debug;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::page::PageId;

pub mod disk;
pub mod memory;
pub mod page;

/// A disk manager persists fixed-size pages addressed by page id. The buffer
/// pool is its only caller and always passes PAGE_SIZE buffers.
///
/// The trait is designed as `trait object` compatible so the buffer pool can
/// hold whichever backend the deployment picked behind a `Box<dyn DiskManager>`.
pub trait DiskManager: Debug + Send {
    /// Fill `buf` with the stored contents of the given page. A page that was
    /// never written reads back as zeroes.
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()>;

    /// Persist `buf` as the contents of the given page, overwriting any
    /// previous image.
    fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> Result<()>;

    /// Release the stored image of a page the caller no longer tracks.
    fn deallocate_page(&mut self, page_id: PageId) -> Result<()>;
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StorageType {
    Memory,
    Disk,
}

/// Build a disk manager of the given kind. `path` names the database file
/// and is ignored by the in-memory backend.
pub fn new_disk_manager(typ: StorageType, path: &Path) -> Result<Box<dyn DiskManager>> {
    match typ {
        StorageType::Memory => Ok(Box::new(memory::Memory::new())),
        StorageType::Disk => Ok(Box::new(disk::Disk::open(path)?)),
    }
}
