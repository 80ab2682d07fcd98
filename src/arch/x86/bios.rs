//! Real firmware backend: the `int` calls and port I/O behind the
//! [`Firmware`] trait. Register conventions here are the contract with
//! the firmware and must not drift.

use core::arch::asm;

use crate::firmware::{ApmInfo, DiskError, DiskRead, E801Frame, E820Frame, Firmware};
use crate::memmap::E820Entry;

const KBC_DATA_PORT: u16 = 0x60;
const KBC_STATUS_PORT: u16 = 0x64;
const PORT_A: u16 = 0x92;
const RTC_INDEX_PORT: u16 = 0x70;

pub struct BiosServices;

impl BiosServices {
    pub const fn new() -> Self {
        BiosServices
    }
}

unsafe fn inb(port: u16) -> u8 {
    let value: u8;
    asm!("in al, dx", out("al") value, in("dx") port, options(nomem, nostack));
    value
}

unsafe fn outb(port: u16, value: u8) {
    asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack));
}

impl Firmware for BiosServices {
    fn disk_read(&mut self, req: &DiskRead) -> Result<(), DiskError> {
        // INT 13h AH=02h: AL=count, CH/CL=track+sector, DH/DL=head+drive,
        // ES:BX=destination.
        let ax: u16 = 0x0200 | req.count as u16;
        let cx: u16 = (req.track << 8) | ((req.track >> 2) & 0x00C0) | req.sector as u16;
        let dx: u16 = (req.head as u16) << 8 | req.drive as u16;
        let status: u16;
        let failed: u8;
        unsafe {
            asm!(
                "push es",
                "mov es, {seg:x}",
                "int 0x13",
                "pop es",
                "setc {failed}",
                seg = in(reg) req.segment,
                failed = out(reg_byte) failed,
                inout("ax") ax => status,
                in("cx") cx,
                in("dx") dx,
                in("bx") req.offset,
            );
        }
        if failed != 0 {
            Err(DiskError {
                status: (status >> 8) as u8,
            })
        } else {
            Ok(())
        }
    }

    fn disk_reset(&mut self, drive: u8) {
        unsafe {
            asm!(
                "int 0x13",
                inout("ax") 0x0000u16 => _,
                in("dx") drive as u16,
            );
        }
    }

    fn e820_next(&mut self, cont: u32) -> Option<E820Frame> {
        let mut entry = E820Entry::EMPTY;
        let signature: u32;
        let next: u32;
        let failed: u8;
        unsafe {
            asm!(
                "int 0x15",
                "setc {failed}",
                failed = out(reg_byte) failed,
                inout("eax") 0x0000_E820u32 => signature,
                inout("ebx") cont => next,
                inout("ecx") 20u32 => _,
                in("edx") crate::memmap::SMAP,
                in("edi") &mut entry as *mut E820Entry,
            );
        }
        if failed != 0 {
            return None;
        }
        Some(E820Frame {
            signature,
            next,
            entry,
        })
    }

    fn e801(&mut self) -> E801Frame {
        let (ax, bx, cx, dx): (u16, u16, u16, u16);
        let failed: u8;
        unsafe {
            asm!(
                // Preload registers so leftover garbage cannot pass for
                // an answer on firmware that ignores this function.
                "xor cx, cx",
                "xor dx, dx",
                "stc",
                "int 0x15",
                "setc {failed}",
                failed = out(reg_byte) failed,
                inout("ax") 0xE801u16 => ax,
                out("bx") bx,
                out("cx") cx,
                out("dx") dx,
            );
        }
        E801Frame {
            carry: failed != 0,
            ax,
            bx,
            cx,
            dx,
        }
    }

    fn ext_mem_88(&mut self) -> Option<u16> {
        let kb: u16;
        let failed: u8;
        unsafe {
            asm!(
                "int 0x15",
                "setc {failed}",
                failed = out(reg_byte) failed,
                inout("ax") 0x8800u16 => kb,
            );
        }
        if failed != 0 { None } else { Some(kb) }
    }

    fn apm_check(&mut self) -> Option<ApmInfo> {
        let (version, signature, flags): (u16, u16, u16);
        let failed: u8;
        unsafe {
            asm!(
                "int 0x15",
                "setc {failed}",
                failed = out(reg_byte) failed,
                inout("ax") 0x5300u16 => version,
                inout("bx") 0u16 => signature,
                inout("cx") 0u16 => flags,
            );
        }
        if failed != 0 {
            return None;
        }
        Some(ApmInfo {
            signature,
            version,
            flags,
        })
    }

    fn apm_disconnect(&mut self) -> Result<(), ()> {
        apm_call(0x5304)
    }

    fn apm_connect(&mut self) -> Result<(), ()> {
        apm_call(0x5301)
    }

    fn apm_disable(&mut self) -> Result<(), ()> {
        // AX=5308h, BX=0001h (all devices), CX=0000h (disable).
        let failed: u8;
        unsafe {
            asm!(
                "int 0x15",
                "setc {failed}",
                failed = out(reg_byte) failed,
                inout("ax") 0x5308u16 => _,
                in("bx") 0x0001u16,
                in("cx") 0x0000u16,
            );
        }
        if failed != 0 { Err(()) } else { Ok(()) }
    }

    fn kbc_status(&mut self) -> u8 {
        unsafe { inb(KBC_STATUS_PORT) }
    }

    fn kbc_command(&mut self, cmd: u8) {
        unsafe { outb(KBC_STATUS_PORT, cmd) }
    }

    fn kbc_data(&mut self, data: u8) {
        unsafe { outb(KBC_DATA_PORT, data) }
    }

    fn port_a_read(&mut self) -> u8 {
        unsafe { inb(PORT_A) }
    }

    fn port_a_write(&mut self, value: u8) {
        unsafe { outb(PORT_A, value) }
    }

    fn set_nmi_mask(&mut self, masked: bool) {
        let index = if masked { 0x80 } else { 0x00 };
        unsafe { outb(RTC_INDEX_PORT, index) }
    }
}

fn apm_call(function: u16) -> Result<(), ()> {
    let failed: u8;
    unsafe {
        asm!(
            "int 0x15",
            "setc {failed}",
            failed = out(reg_byte) failed,
            inout("ax") function => _,
            in("bx") 0u16,
        );
    }
    if failed != 0 { Err(()) } else { Ok(()) }
}
