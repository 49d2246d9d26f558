use std::ops::{Deref, DerefMut};

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::buffer::pool::BufferPoolManager;
use crate::storage::page::{Page, PageId};

/// A scoped pin on a buffer pool page. Dropping the guard unpins the page and
/// reports whether it was dirtied through this guard, so a pin can never leak
/// on an early return or panic.
pub struct PageGuard {
    manager: BufferPoolManager,
    page_id: PageId,
    page: Page,
    is_dirty: bool,
    active: bool,
}

impl PageGuard {
    pub(crate) fn new(manager: BufferPoolManager, page_id: PageId, page: Page) -> PageGuard {
        PageGuard { manager, page_id, page, is_dirty: false, active: true }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Latch the page contents for shared reading for the duration of the
    /// returned borrow.
    pub fn read(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.page.read()
    }

    /// Latch the page contents for writing. The guard is marked dirty so the
    /// modification reaches disk on eviction.
    pub fn write(&mut self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.is_dirty = true;
        self.page.write()
    }

    /// Mark the page as modified without taking the write latch, e.g. after
    /// writing through a separately obtained handle.
    pub fn set_dirty(&mut self) {
        self.is_dirty = true;
    }

    /// Unpin immediately; the eventual drop becomes a no-op.
    pub fn release(&mut self) {
        if self.active {
            self.active = false;
            self.manager.unpin_page(self.page_id, self.is_dirty);
        }
    }

    /// Trade the plain pin for a pin plus shared latch on the page contents.
    pub fn upgrade_read(self) -> ReadPageGuard {
        let latch = self.page.read_owned();
        ReadPageGuard { latch: Some(latch), guard: self }
    }

    /// Trade the plain pin for a pin plus exclusive latch. Pages held for
    /// writing count as dirty unless the holder says otherwise.
    pub fn upgrade_write(mut self) -> WritePageGuard {
        self.is_dirty = true;
        let latch = self.page.write_owned();
        WritePageGuard { latch: Some(latch), guard: self }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// A pin plus shared latch on the page contents. Readers of the same page may
/// coexist; a writer is excluded until every read guard is gone.
///
/// The latch field precedes the pin so destruction releases the latch first
/// and only then unpins.
pub struct ReadPageGuard {
    latch: Option<ArcRwLockReadGuard<RawRwLock, Box<[u8]>>>,
    guard: PageGuard,
}

impl ReadPageGuard {
    pub fn page_id(&self) -> PageId {
        self.guard.page_id
    }

    /// Release the latch and the pin immediately; the eventual drop becomes a
    /// no-op.
    pub fn release(&mut self) {
        self.latch.take();
        self.guard.release();
    }
}

impl Deref for ReadPageGuard {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.latch.as_ref().expect("page guard used after release")
    }
}

/// A pin plus exclusive latch on the page contents. The page counts as dirty
/// on release unless [`WritePageGuard::mark_clean`] was called.
pub struct WritePageGuard {
    latch: Option<ArcRwLockWriteGuard<RawRwLock, Box<[u8]>>>,
    guard: PageGuard,
}

impl WritePageGuard {
    pub fn page_id(&self) -> PageId {
        self.guard.page_id
    }

    /// Report the page as unmodified on release, overriding the default for
    /// write guards.
    pub fn mark_clean(&mut self) {
        self.guard.is_dirty = false;
    }

    /// Release the latch and the pin immediately; the eventual drop becomes a
    /// no-op.
    pub fn release(&mut self) {
        self.latch.take();
        self.guard.release();
    }
}

impl Deref for WritePageGuard {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.latch.as_ref().expect("page guard used after release")
    }
}

impl DerefMut for WritePageGuard {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.latch.as_mut().expect("page guard used after release")
    }
}
