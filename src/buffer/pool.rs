use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use log::debug;

use crate::buffer::guard::{PageGuard, ReadPageGuard, WritePageGuard};
use crate::buffer::replacer::SyncLRUKReplacer;
use crate::buffer::{FrameId, Replacer};
use crate::error::{Error, Result};
use crate::storage::page::{Page, PageId, INVALID_PAGE_ID};
use crate::storage::DiskManager;

/// One slot of the pool's frame array. The metadata here is only touched
/// while the buffer pool latch is held; the contents behind `page` carry
/// their own reader/writer latch and stay accessible after the pool moves on.
struct Frame {
    /// id of the resident page, INVALID_PAGE_ID while the frame is free.
    id: PageId,
    pin_count: u32,
    is_dirty: bool,
    page: Page,
}

impl Frame {
    fn new() -> Frame {
        Frame { id: INVALID_PAGE_ID, pin_count: 0, is_dirty: false, page: Page::new() }
    }

    fn reset(&mut self) {
        self.id = INVALID_PAGE_ID;
        self.pin_count = 0;
        self.is_dirty = false;
        self.page.write().fill(0);
    }
}

/// The buffer pool moves physical pages back and forth between main memory
/// and the disk manager, letting the layers above work against a database
/// larger than memory. Callers address pages purely by page id and cannot
/// tell whether a page was already resident or had to be read from disk.
///
/// All methods take `&mut self`; concurrent access goes through
/// [`BufferPoolManager`], which serializes entry points behind one latch.
struct BufferPool {
    pool_size: usize,
    disk: Box<dyn DiskManager>,
    /// frame array; the vector index is the FrameId.
    frames: Vec<Frame>,
    /// resident pages only: page id -> frame holding it.
    page_table: HashMap<PageId, FrameId>,
    /// frames holding no page, consumed from the front.
    free_list: VecDeque<FrameId>,
    /// picks the victim frame once the free list runs dry.
    replacer: Arc<dyn Replacer>,
    /// The next page id to be allocated.
    /// TODO: persist this through the disk manager so ids survive a restart.
    next_page_id: PageId,
}

impl BufferPool {
    fn new(disk: Box<dyn DiskManager>, pool_size: usize, replacer_k: usize) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);
        let replacer: Arc<dyn Replacer> = Arc::new(SyncLRUKReplacer::new(replacer_k, pool_size));
        for i in 0..pool_size {
            frames.push(Frame::new());
            // initially, every frame is free
            free_list.push_back(i);
        }
        BufferPool {
            pool_size,
            disk,
            frames,
            page_table: HashMap::new(),
            free_list,
            replacer,
            next_page_id: 0,
        }
    }

    /// Create a new page in the buffer pool: acquire a frame, assign a fresh
    /// page id, zero the contents and hand the page back pinned once.
    fn new_page(&mut self) -> Result<(PageId, Page)> {
        let frame_id = match self.acquire_frame()? {
            Some(frame_id) => frame_id,
            None => return Err(Error::BufferPoolNoAvailableFrame),
        };
        let page_id = self.allocate_page();

        let frame = &mut self.frames[frame_id];
        frame.id = page_id;
        frame.pin_count = 0;
        frame.is_dirty = false;
        frame.page.write().fill(0);

        self.page_table.insert(page_id, frame_id);
        self.pin_frame(frame_id);
        Ok((page_id, self.frames[frame_id].page.clone()))
    }

    /// Fetch the page with the given page id, reading it from disk when it is
    /// not resident. The returned page is pinned either way.
    fn fetch_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id == INVALID_PAGE_ID {
            return Err(Error::value(format!("cannot fetch invalid page id {}", page_id)));
        }
        if let Some(&frame_id) = self.page_table.get(&page_id) {
            self.pin_frame(frame_id);
            return Ok(self.frames[frame_id].page.clone());
        }

        let frame_id = match self.acquire_frame()? {
            Some(frame_id) => frame_id,
            None => return Err(Error::BufferPoolNoAvailableFrame),
        };
        let BufferPool { frames, disk, free_list, .. } = self;
        let frame = &mut frames[frame_id];
        {
            let mut data = frame.page.write();
            if let Err(err) = disk.read_page(page_id, &mut data) {
                // hand the frame back instead of leaking it
                drop(data);
                free_list.push_front(frame_id);
                return Err(err);
            }
        }
        frame.id = page_id;
        frame.pin_count = 0;
        frame.is_dirty = false;

        self.page_table.insert(page_id, frame_id);
        self.pin_frame(frame_id);
        Ok(self.frames[frame_id].page.clone())
    }

    /// Unpin a page. Returns false when the page is not resident or its pin
    /// count is already zero. The dirty flag only ever accumulates here; it
    /// is cleared by write-back, not by an unpin with `is_dirty = false`.
    fn unpin_page(&mut self, page_id: PageId, is_dirty: bool) -> bool {
        let frame_id = match self.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return false,
        };
        let frame = &mut self.frames[frame_id];
        if frame.pin_count == 0 {
            return false;
        }
        frame.is_dirty |= is_dirty;
        frame.pin_count -= 1;
        if frame.pin_count == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Write a resident page back to disk regardless of its dirty flag and
    /// clear the flag. The page stays resident and keeps its pin state.
    fn flush_page(&mut self, page_id: PageId) -> Result<bool> {
        if page_id == INVALID_PAGE_ID {
            return Ok(false);
        }
        let frame_id = match self.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return Ok(false),
        };
        let BufferPool { frames, disk, .. } = self;
        let frame = &mut frames[frame_id];
        let data = frame.page.read();
        disk.write_page(page_id, &data)?;
        drop(data);
        frame.is_dirty = false;
        Ok(true)
    }

    /// Write every resident page back to disk, clearing all dirty flags.
    fn flush_all_pages(&mut self) -> Result<()> {
        let BufferPool { frames, disk, page_table, .. } = self;
        for (&page_id, &frame_id) in page_table.iter() {
            let frame = &mut frames[frame_id];
            let data = frame.page.read();
            disk.write_page(page_id, &data)?;
            drop(data);
            frame.is_dirty = false;
        }
        Ok(())
    }

    /// Drop a page from the buffer pool. A page that is not resident has
    /// nothing to drop, so that is vacuously true; a pinned page cannot be
    /// dropped and returns false. Otherwise the frame goes back on the free
    /// list and the disk manager releases the stored image.
    fn delete_page(&mut self, page_id: PageId) -> Result<bool> {
        let frame_id = match self.page_table.get(&page_id) {
            Some(&frame_id) => frame_id,
            None => return Ok(true),
        };
        if self.frames[frame_id].pin_count > 0 {
            debug_assert!(!self.replacer.is_evictable(frame_id));
            return Ok(false);
        }
        self.page_table.remove(&page_id);
        self.replacer.remove(frame_id);
        self.frames[frame_id].reset();
        self.free_list.push_back(frame_id);
        self.disk.deallocate_page(page_id)?;
        Ok(true)
    }

    /// Pick a frame for a new resident page: the free list first, then the
    /// replacer. A dirty victim is written back before its frame is handed
    /// out, and its old page-table entry goes away.
    fn acquire_frame(&mut self) -> Result<Option<FrameId>> {
        if let Some(frame_id) = self.free_list.pop_front() {
            return Ok(Some(frame_id));
        }
        let frame_id = match self.replacer.evict() {
            Some(frame_id) => frame_id,
            None => return Ok(None),
        };
        let BufferPool { frames, disk, page_table, .. } = self;
        let frame = &mut frames[frame_id];
        if frame.is_dirty {
            debug!("evicting dirty page {} from frame {}", frame.id, frame_id);
            let data = frame.page.read();
            disk.write_page(frame.id, &data)?;
            drop(data);
            frame.is_dirty = false;
        }
        page_table.remove(&frame.id);
        Ok(Some(frame_id))
    }

    /// Pin a resident frame: bump its pin count, log the access with the
    /// replacer and shield the frame from eviction.
    fn pin_frame(&mut self, frame_id: FrameId) {
        self.frames[frame_id].pin_count += 1;
        self.replacer.record_access(frame_id);
        self.replacer.set_evictable(frame_id, false);
    }

    fn allocate_page(&mut self) -> PageId {
        let page_id = self.next_page_id;
        self.next_page_id += 1;
        page_id
    }

    fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let &frame_id = self.page_table.get(&page_id)?;
        Some(self.frames[frame_id].pin_count)
    }

    fn free_frames(&self) -> usize {
        self.free_list.len()
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }
}

/// Buffer pool manager wraps the buffer pool behind a mutex for concurrent
/// access; all the heavy lifting happens in the buffer pool itself. Disk I/O
/// runs inside the critical section, which keeps every operation on a page id
/// linearizable at the cost of serializing the I/O.
///
/// The manager is cheap to clone; clones share the same pool.
#[derive(Clone)]
pub struct BufferPoolManager {
    /// the actual buffer pool, protected by one coarse latch.
    /// TODO: finer-grained latching so reads of distinct pages can overlap.
    inner: Arc<Mutex<BufferPool>>,
}

impl BufferPoolManager {
    pub fn new(disk: Box<dyn DiskManager>, pool_size: usize, replacer_k: usize) -> Self {
        let inner = BufferPool::new(disk, pool_size, replacer_k);
        BufferPoolManager { inner: Arc::new(Mutex::new(inner)) }
    }

    /// Create a new page, returning its id and the pinned page.
    pub fn new_page(&self) -> Result<(PageId, Page)> {
        let mut inner = self.inner.lock()?;
        inner.new_page()
    }

    /// Create a new page and wrap it in a guard that unpins it on drop.
    pub fn new_page_guarded(&self) -> Result<PageGuard> {
        let (page_id, page) = self.new_page()?;
        Ok(PageGuard::new(self.clone(), page_id, page))
    }

    /// Fetch the page with the given page id, pinned.
    pub fn fetch_page(&self, page_id: PageId) -> Result<Page> {
        let mut inner = self.inner.lock()?;
        inner.fetch_page(page_id)
    }

    /// Fetch a page wrapped in a guard that unpins it on drop.
    pub fn fetch_page_basic(&self, page_id: PageId) -> Result<PageGuard> {
        let page = self.fetch_page(page_id)?;
        Ok(PageGuard::new(self.clone(), page_id, page))
    }

    /// Fetch a page and latch its contents for shared reading. The latch is
    /// taken after the pool latch has been released.
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<ReadPageGuard> {
        Ok(self.fetch_page_basic(page_id)?.upgrade_read())
    }

    /// Fetch a page and latch its contents for exclusive writing.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<WritePageGuard> {
        Ok(self.fetch_page_basic(page_id)?.upgrade_write())
    }

    /// Unpin a page, recording whether the caller modified it. Returns false
    /// when the page is not resident or was not pinned.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner.unpin_page(page_id, is_dirty)
    }

    /// Write a resident page back to disk and clear its dirty flag.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let mut inner = self.inner.lock()?;
        inner.flush_page(page_id)
    }

    /// Write every resident page back to disk.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.flush_all_pages()
    }

    /// Drop a page from the buffer pool unless it is pinned.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut inner = self.inner.lock()?;
        inner.delete_page(page_id)
    }

    /// Pin count of a resident page, None when the page is not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let inner = self.inner.lock().unwrap();
        inner.pin_count(page_id)
    }

    /// Number of frames currently holding no page.
    pub fn free_frames(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.free_frames()
    }

    /// Total number of frames in the pool.
    pub fn pool_size(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.pool_size()
    }
}
