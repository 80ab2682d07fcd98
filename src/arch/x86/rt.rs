//! Bare-metal entry and panic path.

use core::arch::asm;
use core::panic::PanicInfo;

use crate::arch::x86::bios::BiosServices;
use crate::config::BootConfig;
use crate::{boot, gdt, println, transition};

fn code_segment() -> u16 {
    let cs: u16;
    unsafe {
        asm!("mov {0:x}, cs", out(reg) cs, options(nomem, nostack));
    }
    cs
}

#[unsafe(no_mangle)]
pub extern "C" fn _start() -> ! {
    unsafe {
        crate::console::init();
    }

    let cfg = BootConfig::DEFAULT;
    let mut fw = BiosServices::new();
    let prepared = boot::prepare(&mut fw, &cfg);

    // In the flat image, a static's address is its offset within it.
    let gdt_offset = (&raw const gdt::TABLE) as usize as u16;
    unsafe { transition::launch(&mut fw, code_segment(), gdt_offset, &prepared.handoff) }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    println!("\n*** BOOT STAGE PANIC ***\n{}", info);
    unsafe {
        loop {
            asm!("hlt");
        }
    }
}
