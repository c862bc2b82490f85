//! Ownership records for the physical frames.

use crate::config::{Pid, NFRAMES};
use crate::mm::MmuError;
use bitflags::*;

bitflags! {
    /// Attributes of a frame's mapping record.
    pub struct FrameFlags: u8 {
        /// The frame is allocated.
        const INUSE = 1 << 0;
        const READ  = 1 << 1;
        const WRITE = 1 << 2;
        const EXEC  = 1 << 3;
        /// Accessible from user mode.
        const USER  = 1 << 4;
        /// Holds a page-table node rather than a process page.
        const TABLE = 1 << 5;
    }
}

/// One frame's mapping record: who owns it and which virtual page it backs.
#[derive(Clone, Copy)]
pub struct FrameRecord {
    pub flags: FrameFlags,
    pub pid: Pid,
    pub page_no: usize,
}

impl FrameRecord {
    const fn cleared() -> Self {
        Self {
            flags: FrameFlags::empty(),
            pid: 0,
            page_no: 0,
        }
    }
}

/// The fixed table of all `NFRAMES` mapping records.
pub struct FrameTable {
    records: [FrameRecord; NFRAMES],
}

impl FrameTable {
    pub fn new() -> Self {
        Self {
            records: [FrameRecord::cleared(); NFRAMES],
        }
    }

    pub fn record(&self, frame: usize) -> &FrameRecord {
        &self.records[frame]
    }

    /// First-fit allocation: the lowest-indexed free frame, for
    /// reproducible layouts.
    pub fn alloc(&mut self) -> Option<usize> {
        let frame = self
            .records
            .iter()
            .position(|r| !r.flags.contains(FrameFlags::INUSE))?;
        self.records[frame] = FrameRecord {
            flags: FrameFlags::INUSE,
            pid: 0,
            page_no: 0,
        };
        Some(frame)
    }

    /// Stamps an allocated frame with its owner, virtual page and
    /// permissions.
    pub fn map(
        &mut self,
        pid: Pid,
        page_no: usize,
        frame: usize,
        flags: FrameFlags,
    ) -> Result<(), MmuError> {
        let record = &mut self.records[frame];
        if !record.flags.contains(FrameFlags::INUSE) {
            log::error!("frame {} has not been allocated", frame);
            return Err(MmuError::FrameNotAllocated);
        }
        record.pid = pid;
        record.page_no = page_no;
        record.flags = flags | FrameFlags::INUSE;
        Ok(())
    }

    pub fn clear(&mut self, frame: usize) {
        self.records[frame] = FrameRecord::cleared();
    }

    /// The frame backing `page_no` of `pid`, ignoring page-table nodes.
    pub fn find(&self, pid: Pid, page_no: usize) -> Option<usize> {
        self.records.iter().position(|r| {
            r.flags.contains(FrameFlags::INUSE)
                && !r.flags.contains(FrameFlags::TABLE)
                && r.pid == pid
                && r.page_no == page_no
        })
    }

    /// All frames owned by `pid`.
    pub fn owned_by(&self, pid: Pid) -> impl Iterator<Item = (usize, &FrameRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.flags.contains(FrameFlags::INUSE) && r.pid == pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_returns_lowest_free_frame() {
        let mut table = FrameTable::new();
        assert_eq!(table.alloc(), Some(0));
        assert_eq!(table.alloc(), Some(1));
        table.clear(0);
        assert_eq!(table.alloc(), Some(0));
    }

    #[test]
    fn alloc_after_free_yields_a_cleared_record() {
        let mut table = FrameTable::new();
        let frame = table.alloc().unwrap();
        table
            .map(7, 0x8005, frame, FrameFlags::READ | FrameFlags::USER)
            .unwrap();
        table.clear(frame);
        let frame = table.alloc().unwrap();
        let record = table.record(frame);
        assert_eq!(record.flags, FrameFlags::INUSE);
        assert_eq!(record.pid, 0);
        assert_eq!(record.page_no, 0);
    }

    #[test]
    fn mapping_an_unallocated_frame_is_rejected() {
        let mut table = FrameTable::new();
        assert_eq!(
            table.map(1, 0x8000, 9, FrameFlags::READ),
            Err(MmuError::FrameNotAllocated)
        );
    }
}
