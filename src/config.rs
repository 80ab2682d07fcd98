//! Boot configuration.
//!
//! There is no command line and no environment at this stage; everything is
//! a compile-time constant, except the fields an intermediate loader is
//! allowed to patch into the image (drive number, payload size).

/// Where the payload lands and where it comes from. All segment values are
/// real-mode paragraph addresses (linear = segment * 16).
#[derive(Clone, Copy, Debug)]
pub struct BootConfig {
    /// Firmware drive number the stage was booted from.
    pub drive: u8,
    /// First payload sector on track 0 (sectors before it hold this stage).
    pub start_sector: u8,
    /// Destination window start segment.
    pub dest_segment: u16,
    /// Payload size in 16-byte paragraphs.
    pub payload_paras: u16,
    /// Payload entry point, linear.
    pub entry: u32,
    /// Command line passed through to the payload.
    pub cmdline_ptr: u32,
    pub cmdline_len: u32,
}

/// Fixed increment the destination segment advances by when the offset
/// wraps past the 64 KiB window.
pub const SEGMENT_STEP: u16 = 0x1000;

/// The media this stage boots from always reports two heads.
pub const HEADS: u8 = 2;

pub const SECTOR_SIZE: u32 = 512;

impl BootConfig {
    /// Image layout the stage is linked against: four setup sectors behind
    /// the boot sector, payload at linear 0x10000, entered at its base.
    pub const DEFAULT: BootConfig = BootConfig {
        drive: 0x00,
        start_sector: 5,
        dest_segment: 0x1000,
        payload_paras: 0x2000,
        entry: 0x0001_0000,
        cmdline_ptr: 0,
        cmdline_len: 0,
    };
}
