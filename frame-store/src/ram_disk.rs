use crate::block_dev::BlockDevice;
use crate::BLOCK_SZ;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};
use spin::Mutex;

/// A memory-backed [`BlockDevice`].
///
/// Stands in for the microSD in host tests and keeps transfer counters so
/// tests can assert how many blocks an operation actually moved.
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl RamDisk {
    pub fn new(nblocks: usize) -> Self {
        Self {
            data: Mutex::new(vec![0; nblocks * BLOCK_SZ]),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// Total `read_block` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Total `write_block` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert_eq!(buf.len(), BLOCK_SZ);
        let data = self.data.lock();
        let start = block_id * BLOCK_SZ;
        assert!(start + BLOCK_SZ <= data.len(), "read past end of disk");
        buf.copy_from_slice(&data[start..start + BLOCK_SZ]);
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert_eq!(buf.len(), BLOCK_SZ);
        let mut data = self.data.lock();
        let start = block_id * BLOCK_SZ;
        assert!(start + BLOCK_SZ <= data.len(), "write past end of disk");
        data[start..start + BLOCK_SZ].copy_from_slice(buf);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }
}
