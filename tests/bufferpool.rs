use std::thread;

use pagebox::buffer::pool::BufferPoolManager;
use pagebox::error::Result;
use pagebox::storage::disk::Disk;
use pagebox::storage::page::{PageId, PAGE_SIZE};
use rand::Rng;

#[test]
fn test_file_backed_round_trip() -> Result<()> {
    let _ = env_logger::builder().try_init();
    let dir = tempfile::tempdir()?;
    let disk = Disk::open(&dir.path().join("pagebox.db"))?;
    let bpm = BufferPoolManager::new(Box::new(disk), 3, 2);

    // Create more pages than the pool holds, each with a random image, so
    // most of them have to travel through the disk file and back.
    let mut rng = rand::thread_rng();
    let mut images: Vec<(PageId, Vec<u8>)> = Vec::new();
    for _ in 0..8 {
        let mut guard = bpm.new_page_guarded()?;
        let mut image = vec![0u8; PAGE_SIZE];
        rng.fill(&mut image[..]);
        guard.write().copy_from_slice(&image);
        images.push((guard.page_id(), image));
    }

    for (page_id, image) in &images {
        let guard = bpm.fetch_page_read(*page_id)?;
        assert_eq!(&image[..], &guard[..]);
    }

    Ok(())
}

#[test]
fn test_pages_survive_reopen() -> Result<()> {
    let _ = env_logger::builder().try_init();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("pagebox.db");

    let mut written = Vec::new();
    {
        let bpm = BufferPoolManager::new(Box::new(Disk::open(&path)?), 4, 2);
        for i in 0u8..4 {
            let mut guard = bpm.new_page_guarded()?;
            guard.write()[..8].copy_from_slice(&[i; 8]);
            written.push(guard.page_id());
        }
        bpm.flush_all_pages()?;
    }

    // a fresh pool over the same file sees the flushed images
    let bpm = BufferPoolManager::new(Box::new(Disk::open(&path)?), 4, 2);
    for (i, page_id) in written.iter().enumerate() {
        let guard = bpm.fetch_page_read(*page_id)?;
        assert_eq!(&[i as u8; 8][..], &guard[..8]);
    }

    Ok(())
}

#[test]
fn test_concurrent_readers_and_writers() -> Result<()> {
    let _ = env_logger::builder().try_init();
    let dir = tempfile::tempdir()?;
    let disk = Disk::open(&dir.path().join("pagebox.db"))?;
    let bpm = BufferPoolManager::new(Box::new(disk), 4, 2);

    // Seed a working set larger than the pool. Byte 0 tags the page, byte 1
    // counts writer visits.
    let mut page_ids = Vec::new();
    for tag in 0u8..5 {
        let mut guard = bpm.new_page_guarded()?;
        guard.write()[0] = tag;
        page_ids.push(guard.page_id());
    }

    let mut handles = Vec::new();
    for t in 0..2usize {
        let bpm = bpm.clone();
        let page_ids = page_ids.clone();
        handles.push(thread::spawn(move || -> Result<()> {
            for i in 0..25 {
                let idx = (t + i) % page_ids.len();
                let mut guard = bpm.fetch_page_write(page_ids[idx])?;
                assert_eq!(idx as u8, guard[0]);
                guard[1] += 1;
            }
            Ok(())
        }));
    }
    for t in 0..2usize {
        let bpm = bpm.clone();
        let page_ids = page_ids.clone();
        handles.push(thread::spawn(move || -> Result<()> {
            for i in 0..25 {
                let idx = (t * 3 + i) % page_ids.len();
                let guard = bpm.fetch_page_read(page_ids[idx])?;
                assert_eq!(idx as u8, guard[0]);
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked")?;
    }

    // every page saw ten exclusive increments, none lost
    for (idx, page_id) in page_ids.iter().enumerate() {
        let guard = bpm.fetch_page_read(*page_id)?;
        assert_eq!(idx as u8, guard[0]);
        assert_eq!(10, guard[1]);
    }

    Ok(())
}
