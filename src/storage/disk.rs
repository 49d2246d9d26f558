use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::storage::page::{PageId, PAGE_SIZE};
use crate::storage::DiskManager;

/// A file-backed disk manager. Page `n` lives at byte offset `n * PAGE_SIZE`
/// of a single database file; reads past the current end of the file are
/// zero-filled so freshly allocated pages can be fetched before their first
/// write-back.
#[derive(Debug)]
pub struct Disk {
    file: File,
}

impl Disk {
    /// Open the database file, creating it if it does not exist yet.
    pub fn open(path: &Path) -> Result<Disk> {
        let file = OpenOptions::new().read(true).write(true).create(true).open(path)?;
        debug!("opened database file {}", path.display());
        Ok(Disk { file })
    }

    fn offset(page_id: PageId) -> Result<u64> {
        if page_id < 0 {
            return Err(Error::value(format!("invalid page id {}", page_id)));
        }
        let page_id: u64 = page_id.try_into()?;
        Ok(page_id * PAGE_SIZE as u64)
    }
}

impl DiskManager for Disk {
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(Disk::offset(page_id)?))?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf[filled..].fill(0);
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(Disk::offset(page_id)?))?;
        self.file.write_all(buf)?;
        self.file.flush()?;
        Ok(())
    }

    fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        // the extent stays in the file and is overwritten when the id is reused
        debug!("deallocated page {}", page_id);
        Ok(())
    }
}
