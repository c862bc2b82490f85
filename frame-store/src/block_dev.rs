use core::any::Any;

/// Synchronous block I/O in 512-byte units.
///
/// Implementations panic on I/O failure: the kernel has no recovery path for
/// a broken backing store, so a failed transfer halts with a diagnostic.
pub trait BlockDevice: Send + Sync + Any {
    /// Reads the block numbered `block_id` from the device into `buf`.
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    /// Writes the data in `buf` to the block numbered `block_id`.
    fn write_block(&self, block_id: usize, buf: &[u8]);
}
