use std::collections::BTreeMap;

use crate::error::Result;
use crate::storage::page::PageId;
use crate::storage::DiskManager;

/// An in-memory disk manager keeping page images in an ordered map. Used for
/// tests and as the default backend when no database file is configured.
#[derive(Debug)]
pub struct Memory {
    pages: BTreeMap<PageId, Vec<u8>>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory { pages: BTreeMap::new() }
    }
}

impl DiskManager for Memory {
    fn read_page(&mut self, page_id: PageId, buf: &mut [u8]) -> Result<()> {
        match self.pages.get(&page_id) {
            Some(data) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                buf[n..].fill(0);
            }
            None => buf.fill(0),
        }
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, buf: &[u8]) -> Result<()> {
        self.pages.insert(page_id, buf.to_vec());
        Ok(())
    }

    fn deallocate_page(&mut self, page_id: PageId) -> Result<()> {
        self.pages.remove(&page_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_round_trip() -> Result<()> {
        let mut m = Memory::new();

        // a page that was never written reads back as zeroes
        let mut buf = [0xffu8; 16];
        m.read_page(3, &mut buf)?;
        assert_eq!([0u8; 16], buf);

        // write & read back
        m.write_page(3, b"hello page three")?;
        m.read_page(3, &mut buf)?;
        assert_eq!(b"hello page three", &buf);

        // neighbouring pages are unaffected
        m.read_page(2, &mut buf)?;
        assert_eq!([0u8; 16], buf);

        Ok(())
    }

    #[test]
    fn test_deallocate() -> Result<()> {
        let mut m = Memory::new();

        m.write_page(7, b"gone soon")?;
        m.deallocate_page(7)?;

        let mut buf = [0xffu8; 9];
        m.read_page(7, &mut buf)?;
        assert_eq!([0u8; 9], buf);

        Ok(())
    }
}
