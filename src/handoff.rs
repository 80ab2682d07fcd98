//! The handoff block: the single structure this stage passes to the
//! payload.
//!
//! The payload reads it at fixed offsets, so the layout is pinned by
//! compile-time assertions rather than comments. The block occupies a
//! pre-zeroed window computed from the stage's own load segment; zeroing
//! first guarantees no stale loader state leaks through the unused tail.

use core::mem::{offset_of, size_of};

use crate::config::BootConfig;
use crate::memmap::{E820Entry, E820_MAX, MemoryMap};

/// Displacement of the handoff window from the stage's linear base, just
/// past the stage image.
pub const WINDOW_DISP: u32 = 0x4000;

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct HandoffParameters {
    /// Payload entry point, linear.
    pub entry: u32,
    pub cmdline_ptr: u32,
    pub cmdline_len: u32,
    pub e820_count: u32,
    pub e820_map: [E820Entry; E820_MAX],
}

// The payload-side contract, byte for byte.
const _: () = assert!(offset_of!(HandoffParameters, entry) == 0x00);
const _: () = assert!(offset_of!(HandoffParameters, cmdline_ptr) == 0x04);
const _: () = assert!(offset_of!(HandoffParameters, cmdline_len) == 0x08);
const _: () = assert!(offset_of!(HandoffParameters, e820_count) == 0x0C);
const _: () = assert!(offset_of!(HandoffParameters, e820_map) == 0x10);
const _: () = assert!(size_of::<E820Entry>() == 24);

impl HandoffParameters {
    pub const ZEROED: HandoffParameters = HandoffParameters {
        entry: 0,
        cmdline_ptr: 0,
        cmdline_len: 0,
        e820_count: 0,
        e820_map: [E820Entry::EMPTY; E820_MAX],
    };

    /// Build the block from the configuration and the collected map.
    /// Starts from all-zero state so every unpopulated byte is zero.
    pub fn compose(cfg: &BootConfig, map: &MemoryMap) -> Self {
        let mut p = Self::ZEROED;
        p.entry = cfg.entry;
        p.cmdline_ptr = cfg.cmdline_ptr;
        p.cmdline_len = cfg.cmdline_len;
        p.e820_count = map.len() as u32;
        for (dst, src) in p.e820_map.iter_mut().zip(map.iter()) {
            *dst = *src;
        }
        p
    }

    /// Linear address of the window, derived from the segment the stage
    /// actually runs at.
    pub fn window_linear(code_segment: u16) -> u32 {
        ((code_segment as u32) << 4) + WINDOW_DISP
    }
}

/// Zero the window, then place the block in it.
///
/// # Safety
/// `linear` must point at `size_of::<HandoffParameters>()` bytes of memory
/// nothing else owns; only meaningful once this stage runs from its real
/// load address.
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub unsafe fn install_at(linear: u32, params: &HandoffParameters) {
    let dst = linear as usize as *mut HandoffParameters;
    core::ptr::write_bytes(dst.cast::<u8>(), 0, size_of::<HandoffParameters>());
    core::ptr::write_volatile(dst, *params);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_fills_count_and_entries() {
        let mut map = MemoryMap::new();
        map.push(E820Entry::usable(0, 0xA_0000)).unwrap();
        map.push(E820Entry::usable(0x10_0000, 0x100_0000)).unwrap();
        let cfg = BootConfig {
            entry: 0x1_0000,
            cmdline_ptr: 0x9_8000,
            cmdline_len: 12,
            ..BootConfig::DEFAULT
        };
        let p = HandoffParameters::compose(&cfg, &map);
        assert_eq!(p.entry, 0x1_0000);
        assert_eq!(p.cmdline_ptr, 0x9_8000);
        assert_eq!(p.cmdline_len, 12);
        assert_eq!(p.e820_count, 2);
        assert_eq!(p.e820_map[1], E820Entry::usable(0x10_0000, 0x100_0000));
    }

    #[test]
    fn unpopulated_tail_stays_zero() {
        let mut map = MemoryMap::new();
        map.push(E820Entry::usable(0, 0xA_0000)).unwrap();
        let p = HandoffParameters::compose(&BootConfig::DEFAULT, &map);
        for e in &p.e820_map[1..] {
            assert_eq!(*e, E820Entry::EMPTY);
        }
    }

    #[test]
    fn window_tracks_the_load_segment() {
        assert_eq!(
            HandoffParameters::window_linear(0x9000),
            0x9_0000 + WINDOW_DISP
        );
        assert_eq!(HandoffParameters::window_linear(0), WINDOW_DISP);
    }

    #[test]
    fn window_leaves_switch_stack_room_below() {
        // The mode switch parks its stack at the window base; the two
        // far-return words it pushes land directly below the block and
        // must stay inside the stage-owned region above the load address.
        assert!(WINDOW_DISP >= 8);
        let base = 0x9000u32 << 4;
        assert!(HandoffParameters::window_linear(0x9000) - 8 >= base);
    }
}
