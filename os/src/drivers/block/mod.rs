//! The block device backing the frame store.
//!
//! On the emulator the disk image is memory-mapped, so block I/O is a
//! bounded copy against that region. I/O out of range is fatal, as is any
//! failure of the medium.

use crate::config::{BLOCK_SZ, DISK_IMAGE_START, DISK_NBLOCKS};
use alloc::sync::Arc;
use frame_store::BlockDevice;
use lazy_static::*;

pub struct MemDisk;

impl MemDisk {
    pub fn new() -> Self {
        Self
    }

    fn block_ptr(block_id: usize) -> *mut u8 {
        assert!(block_id < DISK_NBLOCKS, "block {} past end of disk", block_id);
        (DISK_IMAGE_START + block_id * BLOCK_SZ) as *mut u8
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        assert_eq!(buf.len(), BLOCK_SZ);
        unsafe {
            core::ptr::copy_nonoverlapping(Self::block_ptr(block_id), buf.as_mut_ptr(), BLOCK_SZ);
        }
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        assert_eq!(buf.len(), BLOCK_SZ);
        unsafe {
            core::ptr::copy_nonoverlapping(buf.as_ptr(), Self::block_ptr(block_id), BLOCK_SZ);
        }
    }
}

type BlockDeviceImpl = MemDisk;

lazy_static! {
    /// The backing medium of the frame store and the program images.
    pub static ref BLOCK_DEVICE: Arc<dyn BlockDevice> = Arc::new(BlockDeviceImpl::new());
}
