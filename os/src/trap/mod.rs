//! Machine-mode trap entry and dispatch.
//!
//! A single vector receives every interrupt and exception. The dispatch
//! rules live in [`intr_entry`]/[`excp_entry`], which are ordinary
//! functions over the process table and the MMU; the riscv32 glue below
//! them reads the cause register, saves and restores the trap pc through
//! the PCB, and performs the kernel-stack handoff.
//!
//! Killing a process never tears it down from inside the trap handler:
//! the handler only redirects the saved trap pc to the exit trampoline,
//! and the process releases its own resources through the ordinary exit
//! path next time it runs.

use crate::arch;
use crate::config::*;
use crate::mm::Mmu;
use crate::syscall;
use crate::task::{self, Dispatch, ProcTable};

/// Environment call from user mode.
pub const EXCP_ECALL_FROM_U: usize = 8;
/// Environment call from machine mode.
pub const EXCP_ECALL_FROM_M: usize = 11;
/// Machine software interrupt, the memory-mapped syscall trigger.
pub const INTR_SOFT: usize = 3;
/// Machine timer interrupt.
pub const INTR_TIMER: usize = 7;

/// Exception dispatch.
///
/// A user-mode environment call runs the syscall dispatcher. Every other
/// exception kills the offending user process; from a privileged server it
/// is fatal.
pub fn excp_entry(procs: &mut ProcTable, mmu: &mut Mmu, id: usize) -> Dispatch {
    if id == EXCP_ECALL_FROM_U {
        // resume past the ecall instruction
        procs.curr_mut().trap_pc += 4;
        return syscall::dispatch(procs, mmu);
    }
    if procs.curr_pid() >= GPID_USER_START {
        log::info!("process {} killed due to exception {}", procs.curr_pid(), id);
        kill_current(procs);
        return Dispatch::Resume;
    }
    panic!("excp_entry: kernel got exception {}", id);
}

/// Interrupt dispatch.
///
/// Privileged servers are never preempted by the timer, since they may
/// be mid-IO with stateful devices; a timer tick inside one only rearms
/// the timer. A TTY kill request terminates the current user process. The
/// software interrupt runs the syscall dispatcher and the timer runs the
/// scheduler.
pub fn intr_entry(procs: &mut ProcTable, mmu: &mut Mmu, id: usize, tty_intr: bool) -> Dispatch {
    if id == INTR_TIMER && procs.curr_pid() < GPID_SHELL {
        arch::timer_reset();
        return Dispatch::Resume;
    }
    if tty_intr && procs.curr_pid() >= GPID_USER_START {
        log::info!("process {} killed by interrupt", procs.curr_pid());
        kill_current(procs);
        return Dispatch::Resume;
    }
    match id {
        INTR_SOFT => syscall::dispatch(procs, mmu),
        INTR_TIMER => task::schedule(procs, mmu),
        _ => panic!("intr_entry: got unknown interrupt {}", id),
    }
}

/// Redirects the current process to the exit trampoline. On trap return it
/// runs the exit path and releases its resources via `proc_free`.
pub fn kill_current(procs: &mut ProcTable) {
    procs.curr_mut().trap_pc = APPS_EXIT;
}

/// Installs the trap vector and enables timer and software interrupts.
#[cfg(target_arch = "riscv32")]
pub fn init() {
    arch::install_trap_vector();
    arch::enable_interrupts();
}

#[cfg(target_arch = "riscv32")]
static mut KERNEL_STACKS: [[u8; KERNEL_STACK_SIZE]; MAX_NPROCESS] =
    [[0; KERNEL_STACK_SIZE]; MAX_NPROCESS];

/// Top of the kernel stack belonging to process-table slot `idx`.
#[cfg(target_arch = "riscv32")]
pub fn kernel_stack_top(idx: usize) -> usize {
    unsafe { core::ptr::addr_of!(KERNEL_STACKS[idx]) as usize + KERNEL_STACK_SIZE }
}

/// The Rust half of the trap vector; runs on the current process's kernel
/// stack with interrupts disabled by the hardware.
#[cfg(target_arch = "riscv32")]
#[no_mangle]
extern "C" fn trap_handler() {
    let cause = arch::read_mcause();
    let id = cause & 0x3ff;
    let is_intr = cause & (1 << 31) != 0;

    let old_idx = {
        let mut procs = task::PROC_TABLE.exclusive_access();
        procs.curr_mut().trap_pc = arch::read_mepc();
        procs.curr_index()
    };

    let dispatch = {
        let mut procs = task::PROC_TABLE.exclusive_access();
        let mut mmu = crate::mm::MMU.exclusive_access();
        let mmu = mmu.as_mut().expect("trap before mmu init");
        if is_intr {
            intr_entry(&mut procs, mmu, id, arch::tty_recv_intr())
        } else {
            excp_entry(&mut procs, mmu, id)
        }
    };

    let new_idx = task::PROC_TABLE.exclusive_access().curr_index();
    match dispatch {
        Dispatch::FirstEntry { .. } => {
            // Save this context, then enter the new process from a fresh
            // kernel stack; we resume here when rescheduled.
            let old_sp = {
                let mut procs = task::PROC_TABLE.exclusive_access();
                &mut procs.entry_mut(old_idx).kernel_sp as *mut usize
            };
            arch::set_trap_stack(kernel_stack_top(new_idx));
            unsafe { arch::ctx_start(old_sp, kernel_stack_top(new_idx)) };
        }
        Dispatch::Resume if new_idx != old_idx => {
            let new_sp = task::PROC_TABLE.exclusive_access().entry(new_idx).kernel_sp;
            let old_sp = {
                let mut procs = task::PROC_TABLE.exclusive_access();
                &mut procs.entry_mut(old_idx).kernel_sp as *mut usize
            };
            arch::set_trap_stack(kernel_stack_top(new_idx));
            unsafe { arch::ctx_switch(old_sp, new_sp) };
        }
        Dispatch::Resume => {}
    }

    // Back on this process's context (or we never left): restore the trap
    // pc the dispatch rules may have rewritten.
    let trap_pc = task::PROC_TABLE.exclusive_access().curr().trap_pc;
    arch::write_mepc(trap_pc);
}

/// First dispatch of a `Ready` process, entered by `ctx_start` on the new
/// kernel stack: hand over argc/argv and drop to the app entry point.
#[cfg(target_arch = "riscv32")]
#[no_mangle]
extern "C" fn ctx_entry() -> ! {
    arch::enter_app(APPS_ENTRY, APPS_ARG, APPS_ARG + 4);
    unreachable!()
}
