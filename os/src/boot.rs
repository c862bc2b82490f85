//! Kernel boot: bring the ambient machinery up, load the process manager
//! and drop into it.

#[cfg(target_arch = "riscv32")]
use crate::arch;
#[cfg(target_arch = "riscv32")]
use crate::config::*;
#[cfg(target_arch = "riscv32")]
use crate::mm::TranslationKind;
#[cfg(target_arch = "riscv32")]
use crate::{loader, logging, mm, task, trap};

#[cfg(target_arch = "riscv32")]
#[no_mangle]
pub extern "C" fn rust_main() -> ! {
    clear_bss();
    mm::heap_allocator::init_heap();
    logging::init();
    log::info!("moss is booting");
    trap::init();
    mm::init(choose_translation());

    // The process manager is pid 1 and the only process after boot.
    let pid = task::proc_alloc();
    {
        let mut mmu = mm::MMU.exclusive_access();
        let mmu = mmu.as_mut().expect("mmu init");
        loader::load(mmu, pid, SYS_PROC_EXEC_NBLOCKS, |block, buf| {
            crate::drivers::block::BLOCK_DEVICE.read_block(SYS_PROC_EXEC_START + block, buf)
        })
        .expect("load the process manager");
        loader::setup_args(mmu, pid, &[]).expect("stage process manager arguments");
        mmu.switch(pid);
    }
    log::info!("process manager loaded as pid {}", pid);
    {
        let mut procs = task::PROC_TABLE.exclusive_access();
        procs.set_current(pid);
        procs.set_running(pid);
    }

    arch::set_trap_stack(trap::kernel_stack_top(0));
    arch::timer_reset();
    arch::set_prev_privilege(false);
    arch::enter_app(APPS_ENTRY, APPS_ARG, APPS_ARG + 4);
    unreachable!()
}

/// The board only has the software TLB; the emulator asks on the TTY.
#[cfg(target_arch = "riscv32")]
fn choose_translation() -> TranslationKind {
    #[cfg(feature = "board_arty")]
    {
        TranslationKind::SoftTlb
    }
    #[cfg(not(feature = "board_arty"))]
    {
        print!("Enter 0 for page tables, 1 for software TLB: ");
        loop {
            match arch::tty_getchar() {
                b'0' => {
                    println!("0");
                    return TranslationKind::PageTable;
                }
                b'1' => {
                    println!("1");
                    return TranslationKind::SoftTlb;
                }
                _ => {}
            }
        }
    }
}

#[cfg(target_arch = "riscv32")]
fn clear_bss() {
    extern "C" {
        fn sbss();
        fn ebss();
    }
    (sbss as usize..ebss as usize).for_each(|a| unsafe { (a as *mut u8).write_volatile(0) });
}
