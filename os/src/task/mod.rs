//! The process table and the round-robin scheduler.

mod process;

pub use process::{Process, Status};

use crate::arch;
use crate::config::*;
use crate::mm::{Mmu, MMU};
use crate::sync::UPSafeCell;
use lazy_static::*;

/// Fixed-size table of process control blocks plus the current index and
/// the monotonic pid counter.
pub struct ProcTable {
    procs: [Process; MAX_NPROCESS],
    curr: usize,
    next_pid: Pid,
}

impl ProcTable {
    pub fn new() -> Self {
        Self {
            procs: [Process::unused(); MAX_NPROCESS],
            curr: 0,
            next_pid: 0,
        }
    }

    /// Claims a free slot and assigns the next pid (the first allocation
    /// yields `GPID_PROCESS`). Running out of slots is fatal.
    pub fn alloc(&mut self) -> Pid {
        for i in 0..MAX_NPROCESS {
            if self.procs[i].status == Status::Unused {
                self.next_pid += 1;
                self.procs[i] = Process {
                    pid: self.next_pid,
                    status: Status::Loading,
                    ..Process::unused()
                };
                return self.next_pid;
            }
        }
        panic!("proc_alloc: reached the limit of {} processes", MAX_NPROCESS);
    }

    /// Returns `pid`'s slot to the pool.
    pub fn free(&mut self, pid: Pid) {
        self.set_status(pid, Status::Unused);
    }

    pub fn set_status(&mut self, pid: Pid, status: Status) {
        for p in self.procs.iter_mut() {
            if p.pid == pid {
                p.status = status;
            }
        }
    }

    pub fn set_ready(&mut self, pid: Pid) {
        self.set_status(pid, Status::Ready);
    }

    pub fn set_running(&mut self, pid: Pid) {
        self.set_status(pid, Status::Running);
    }

    pub fn set_runnable(&mut self, pid: Pid) {
        self.set_status(pid, Status::Runnable);
    }

    pub fn find(&self, pid: Pid) -> Option<&Process> {
        self.procs
            .iter()
            .find(|p| p.status != Status::Unused && p.pid == pid)
    }

    pub fn find_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.procs
            .iter_mut()
            .find(|p| p.status != Status::Unused && p.pid == pid)
    }

    /// Live entries, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.procs.iter().filter(|p| p.status != Status::Unused)
    }

    pub fn curr(&self) -> &Process {
        &self.procs[self.curr]
    }

    pub fn curr_mut(&mut self) -> &mut Process {
        &mut self.procs[self.curr]
    }

    pub fn curr_pid(&self) -> Pid {
        self.curr().pid
    }

    pub fn curr_index(&self) -> usize {
        self.curr
    }

    /// Makes `pid` the current process without scheduling (boot only).
    pub fn set_current(&mut self, pid: Pid) {
        self.curr = self
            .procs
            .iter()
            .position(|p| p.status != Status::Unused && p.pid == pid)
            .expect("set_current: no such process");
    }

    pub(crate) fn entry(&self, idx: usize) -> &Process {
        &self.procs[idx]
    }

    pub(crate) fn entry_mut(&mut self, idx: usize) -> &mut Process {
        &mut self.procs[idx]
    }

    /// Rotates from the current index to the first dispatchable entry.
    fn pick_next(&self) -> Option<usize> {
        for i in 1..=MAX_NPROCESS {
            let idx = (self.curr + i) % MAX_NPROCESS;
            if matches!(
                self.procs[idx].status,
                Status::Ready | Status::Running | Status::Runnable
            ) {
                return Some(idx);
            }
        }
        None
    }
}

/// What the trap glue must do after a scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Return to the (possibly different) current process mid-flight.
    Resume,
    /// First dispatch of a `Ready` process: enter it at the application
    /// entry point with the argument registers loaded.
    FirstEntry { pid: Pid },
}

/// Rotates to the next runnable process and brings its address space into
/// view. Fatal when nothing is dispatchable.
pub fn schedule(procs: &mut ProcTable, mmu: &mut Mmu) -> Dispatch {
    let next = match procs.pick_next() {
        Some(idx) => idx,
        None => panic!("schedule: no runnable process"),
    };
    if procs.curr().status == Status::Running {
        let pid = procs.curr_pid();
        procs.set_runnable(pid);
    }
    procs.curr = next;
    let pid = procs.curr_pid();
    mmu.switch(pid);
    arch::timer_reset();
    arch::set_prev_privilege(pid >= GPID_USER_START);
    let first_dispatch = procs.curr().status == Status::Ready;
    procs.set_running(pid);
    if first_dispatch {
        Dispatch::FirstEntry { pid }
    } else {
        Dispatch::Resume
    }
}

lazy_static! {
    /// The kernel process table.
    pub static ref PROC_TABLE: UPSafeCell<ProcTable> =
        unsafe { UPSafeCell::new(ProcTable::new()) };
}

/// Allocates a process slot and pid.
pub fn proc_alloc() -> Pid {
    PROC_TABLE.exclusive_access().alloc()
}

/// Releases `pid`: its frames through the MMU, then its table slot.
pub fn proc_free(pid: Pid) {
    if let Some(mmu) = MMU.exclusive_access().as_mut() {
        mmu.free(pid);
    }
    PROC_TABLE.exclusive_access().free(pid);
}

/// Marks a freshly loaded process dispatchable for the first time.
pub fn proc_set_ready(pid: Pid) {
    PROC_TABLE.exclusive_access().set_ready(pid);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pids_are_monotonic_and_start_at_gpid_process() {
        let mut procs = ProcTable::new();
        assert_eq!(procs.alloc(), GPID_PROCESS);
        assert_eq!(procs.alloc(), 2);
        procs.free(GPID_PROCESS);
        // slots are reused, pids are not
        assert_eq!(procs.alloc(), 3);
    }

    #[test]
    #[should_panic(expected = "reached the limit")]
    fn alloc_past_the_table_bound_is_fatal() {
        let mut procs = ProcTable::new();
        for _ in 0..=MAX_NPROCESS {
            procs.alloc();
        }
    }

    #[test]
    fn pick_next_rotates_round_robin() {
        let mut procs = ProcTable::new();
        let a = procs.alloc();
        let b = procs.alloc();
        let c = procs.alloc();
        procs.set_running(a);
        procs.set_runnable(b);
        procs.set_runnable(c);
        procs.set_current(a);
        assert_eq!(procs.pick_next(), Some(1));
        procs.curr = 1;
        assert_eq!(procs.pick_next(), Some(2));
        procs.curr = 2;
        // wraps past the unused tail back to a
        assert_eq!(procs.pick_next(), Some(0));
    }

    #[test]
    fn pick_next_skips_waiters() {
        let mut procs = ProcTable::new();
        let a = procs.alloc();
        let b = procs.alloc();
        let c = procs.alloc();
        procs.set_running(a);
        procs.set_status(b, Status::WaitToRecv);
        procs.set_runnable(c);
        procs.set_current(a);
        assert_eq!(procs.pick_next(), Some(2));
    }
}
