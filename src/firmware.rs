//! The firmware call gateway.
//!
//! Every service this stage asks of the machine goes through [`Firmware`]:
//! disk reads and resets, the three memory-sizing interfaces, the APM
//! handshake, and the handful of I/O ports the enable/quiesce steps poke.
//! The trait exists so the unbounded loops above it (disk retry, keyboard
//! controller polls) stay literal while tests drive them with a script.
//!
//! All calls are synchronous and blocking; there is no timeout anywhere in
//! this layer.

use crate::memmap::E820Entry;

/// Parameters of one firmware disk read: `count` sectors starting at
/// (track, head, sector) into segment:offset. `sector` is 1-based, CHS
/// style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskRead {
    pub drive: u8,
    pub track: u16,
    pub head: u8,
    pub sector: u8,
    pub count: u8,
    pub segment: u16,
    pub offset: u16,
}

/// A failed disk read, carrying the firmware status byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiskError {
    pub status: u8,
}

/// One frame of the range-typed enumeration: the signature and continuation
/// token come back raw so the collector owns the validation policy.
#[derive(Clone, Copy, Debug)]
pub struct E820Frame {
    pub signature: u32,
    pub next: u32,
    pub entry: E820Entry,
}

/// Raw register state after the dual-range query. Returned unfiltered:
/// some firmware leaves carry in a lie and some answers in the wrong
/// register pair, and sorting that out is the collector's job.
#[derive(Clone, Copy, Debug, Default)]
pub struct E801Frame {
    pub carry: bool,
    pub ax: u16,
    pub bx: u16,
    pub cx: u16,
    pub dx: u16,
}

/// Result of the power-management installation check.
#[derive(Clone, Copy, Debug)]
pub struct ApmInfo {
    pub signature: u16,
    pub version: u16,
    pub flags: u16,
}

pub trait Firmware {
    /// Read `req.count` sectors; blocks until the controller answers.
    fn disk_read(&mut self, req: &DiskRead) -> Result<(), DiskError>;

    /// Reset the disk controller after a failed read.
    fn disk_reset(&mut self, drive: u8);

    /// One step of the range-typed enumeration. `None` means the call
    /// failed (the method is unsupported on this firmware).
    fn e820_next(&mut self, cont: u32) -> Option<E820Frame>;

    /// Dual-range query: memory 1..16 MiB in KiB, memory above 16 MiB in
    /// 64 KiB blocks.
    fn e801(&mut self) -> E801Frame;

    /// Legacy single-value query: KiB of memory above 1 MiB, `None` on
    /// failure.
    fn ext_mem_88(&mut self) -> Option<u16>;

    /// Power-management installation check; `None` if the call fails.
    fn apm_check(&mut self) -> Option<ApmInfo>;

    /// Drop any existing power-management interface connection.
    fn apm_disconnect(&mut self) -> Result<(), ()>;

    /// Connect the real-mode power-management interface.
    fn apm_connect(&mut self) -> Result<(), ()>;

    /// Disable power management for all devices.
    fn apm_disable(&mut self) -> Result<(), ()>;

    /// Keyboard controller status register.
    fn kbc_status(&mut self) -> u8;

    /// Write to the keyboard controller command register.
    fn kbc_command(&mut self, cmd: u8);

    /// Write to the keyboard controller data register.
    fn kbc_data(&mut self, data: u8);

    /// System control port A (the fast address-gate toggle lives here).
    fn port_a_read(&mut self) -> u8;

    fn port_a_write(&mut self, value: u8);

    /// Mask or unmask the non-maskable interrupt line.
    fn set_nmi_mask(&mut self, masked: bool);
}
