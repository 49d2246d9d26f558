use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Logical page identifier, allocated by a monotonic counter.
pub type PageId = i64;

/// Size of a data page in bytes.
pub const PAGE_SIZE: usize = 4096;

/// Reserved id for a frame that holds no page.
pub const INVALID_PAGE_ID: PageId = -1;

/// Shared handle to one frame's data buffer. The buffer pool hands clones of
/// this out to callers; the contained reader/writer latch protects the page
/// contents once the frame has left the pool's critical section. Which page
/// the buffer currently holds is bookkeeping that lives in the pool, not here.
#[derive(Clone)]
pub struct Page {
    data: Arc<RwLock<Box<[u8]>>>,
}

impl Page {
    pub(crate) fn new() -> Self {
        Page { data: Arc::new(RwLock::new(vec![0u8; PAGE_SIZE].into_boxed_slice())) }
    }

    /// Latch the page contents for shared reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.data.read()
    }

    /// Latch the page contents for exclusive writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.data.write()
    }

    /// Shared latch that owns its lock, for guards that outlive any borrow
    /// of this handle.
    pub(crate) fn read_owned(&self) -> ArcRwLockReadGuard<RawRwLock, Box<[u8]>> {
        self.data.read_arc()
    }

    /// Exclusive latch that owns its lock.
    pub(crate) fn write_owned(&self) -> ArcRwLockWriteGuard<RawRwLock, Box<[u8]>> {
        self.data.write_arc()
    }
}
