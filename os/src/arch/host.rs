//! Inert stand-ins for the machine operations, used when the kernel core is
//! compiled for a host (its tests). Only the operations reachable from the
//! architecture-neutral core exist here; the trap and boot glue is riscv32
//! only.

pub fn console_putchar(_c: u8) {}

/// Arms the next timer preemption. Nothing to arm on a host.
pub fn timer_reset() {}

/// Clears the pending software interrupt.
pub fn clear_soft_intr() {}

/// Selects the privilege level assumed on trap return.
pub fn set_prev_privilege(_user: bool) {}

/// Installs a translation root in the paging control register.
pub fn write_satp(_token: u32) {}
