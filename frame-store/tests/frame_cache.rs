use frame_store::{
    BlockDevice, FrameCache, Page, PageRegion, RamDisk, BLOCKS_PER_PAGE, BLOCK_SZ, NFRAMES,
    PAGE_SIZE,
};
use std::alloc::Layout;
use std::sync::Arc;

fn leak_region(npages: usize) -> PageRegion {
    let layout = Layout::from_size_align(npages * PAGE_SIZE, PAGE_SIZE).unwrap();
    let base = unsafe { std::alloc::alloc_zeroed(layout) };
    assert!(!base.is_null());
    unsafe { PageRegion::from_raw(base, npages) }
}

fn cache_with(nslots: usize) -> (Arc<RamDisk>, FrameCache) {
    let disk = Arc::new(RamDisk::new(NFRAMES * BLOCKS_PER_PAGE));
    let cache = FrameCache::new(Arc::clone(&disk) as Arc<dyn BlockDevice>, leak_region(nslots));
    (disk, cache)
}

fn page_of(byte: u8) -> Page {
    [byte; PAGE_SIZE]
}

#[test]
fn write_then_read_roundtrips() {
    let (_, mut cache) = cache_with(28);
    let page = page_of(0xab);
    cache.write(7, &page);
    assert_eq!(cache.read(7, false), &page);
}

#[test]
fn read_fills_from_disk_blocks() {
    let (disk, mut cache) = cache_with(28);
    // Frame 3 lives at blocks [24, 32); give each block a distinct byte.
    for b in 0..BLOCKS_PER_PAGE {
        disk.write_block(3 * BLOCKS_PER_PAGE + b, &[b as u8; BLOCK_SZ]);
    }
    let page = cache.read(3, false);
    for b in 0..BLOCKS_PER_PAGE {
        assert!(page[b * BLOCK_SZ..(b + 1) * BLOCK_SZ]
            .iter()
            .all(|&x| x == b as u8));
    }
}

#[test]
fn alloc_only_read_skips_the_disk() {
    let (disk, mut cache) = cache_with(28);
    cache.read(5, true);
    assert_eq!(disk.reads(), 0);
    assert!(cache.slot_of(5).is_some());
}

#[test]
fn invalidate_is_idempotent_and_discards_uncommitted_writes() {
    let (disk, mut cache) = cache_with(28);
    for b in 0..BLOCKS_PER_PAGE {
        disk.write_block(9 * BLOCKS_PER_PAGE + b, &[0x5a; BLOCK_SZ]);
    }
    let writes_before = disk.writes();
    cache.write(9, &page_of(0xff));
    cache.invalidate(9);
    cache.invalidate(9);
    assert!(cache.slot_of(9).is_none());
    // The dirty page was dropped, not flushed.
    assert_eq!(disk.writes(), writes_before);
    // A fresh read sees the disk image again.
    assert_eq!(cache.read(9, false), &page_of(0x5a));
}

#[test]
fn clean_eviction_never_writes_back() {
    let (disk, mut cache) = cache_with(4);
    for f in 0..4 {
        cache.read(f, false);
    }
    let writes_before = disk.writes();
    // All slots full and clean; installing a fifth frame evicts silently.
    cache.read(4, false);
    assert_eq!(disk.writes(), writes_before);
}

#[test]
fn eviction_with_all_slots_dirty_writes_back_exactly_one_frame() {
    let (disk, mut cache) = cache_with(28);
    for f in 0..28 {
        cache.write(f, &page_of(f as u8));
    }
    assert_eq!(disk.writes(), 0);
    cache.write(28, &page_of(0xee));
    // One victim, eight blocks.
    assert_eq!(disk.writes(), BLOCKS_PER_PAGE);
    assert!(cache.slot_of(28).is_some());
    // The victim's bytes survived on disk.
    let victim = (0..28).find(|&f| cache.slot_of(f).is_none()).unwrap();
    let mut block = [0u8; BLOCK_SZ];
    disk.read_block(victim * BLOCKS_PER_PAGE, &mut block);
    assert!(block.iter().all(|&x| x == victim as u8));
}

#[test]
fn a_frame_occupies_at_most_one_slot() {
    let (_, mut cache) = cache_with(8);
    cache.write(1, &page_of(1));
    cache.write(1, &page_of(2));
    cache.read(1, false);
    let resident = (0..cache.nslots())
        .filter(|&s| cache.frame_at(s) == Some(1))
        .count();
    assert_eq!(resident, 1);
}

#[test]
fn equal_bytes_skip_the_copy_and_stay_clean() {
    let (disk, mut cache) = cache_with(1);
    for b in 0..BLOCKS_PER_PAGE {
        disk.write_block(2 * BLOCKS_PER_PAGE + b, &[0x11; BLOCK_SZ]);
    }
    cache.read(2, false);
    // Rewriting identical bytes leaves the slot clean, so the eviction
    // below has nothing to flush.
    cache.write(2, &page_of(0x11));
    let writes_before = disk.writes();
    cache.read(0, false);
    assert!(cache.slot_of(2).is_none());
    assert_eq!(disk.writes(), writes_before);
}
