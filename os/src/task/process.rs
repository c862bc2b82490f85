use crate::config::Pid;

/// Scheduling states of a process-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Free table slot.
    Unused,
    /// Allocated, executable not yet in place.
    Loading,
    /// Loaded, never dispatched.
    Ready,
    /// The one process on the CPU.
    Running,
    /// Dispatchable.
    Runnable,
    /// Blocked in `send` until the receiver arrives.
    WaitToSend,
    /// Blocked in `recv` until a sender arrives.
    WaitToRecv,
}

/// One process control block.
#[derive(Clone, Copy)]
pub struct Process {
    pub pid: Pid,
    pub status: Status,
    /// Target of the in-flight send; meaningful only in `WaitToSend`.
    pub receiver: Pid,
    /// Saved kernel stack pointer while suspended mid-trap.
    pub kernel_sp: usize,
    /// Program counter to resume at on trap return.
    pub trap_pc: usize,
}

impl Process {
    pub(crate) const fn unused() -> Self {
        Self {
            pid: 0,
            status: Status::Unused,
            receiver: 0,
            kernel_sp: 0,
            trap_pc: 0,
        }
    }
}
