//! Installed-memory discovery.
//!
//! No single firmware interface covers every machine generation this stage
//! runs on, so three are tried in order of decreasing fidelity: the
//! range-typed enumeration, the dual-range query, and the legacy
//! single-value query. Each tier is strictly a fallback, never a
//! refinement; the first one that produces any data wins outright. Entries
//! keep discovery order and overlapping ranges are not merged.

use heapless::Vec as HVec;
use log::info;

use crate::firmware::{E801Frame, Firmware};

/// Signature the range-typed enumeration answers with ("SMAP").
pub const SMAP: u32 = 0x534D_4150;

/// Fixed capacity of the map; discovery stops early once it fills, even if
/// the firmware has more ranges to offer.
pub const E820_MAX: usize = 32;

/// Range types as the firmware reports them.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionKind {
    Usable = 1,
    Reserved = 2,
    AcpiReclaimable = 3,
    AcpiNvs = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct E820Entry {
    pub base: u64,
    pub length: u64,
    /// Raw firmware type value; known values match [`RegionKind`].
    pub kind: u32,
}

impl E820Entry {
    pub const EMPTY: E820Entry = E820Entry {
        base: 0,
        length: 0,
        kind: 0,
    };

    pub const fn usable(base: u64, length: u64) -> Self {
        E820Entry {
            base,
            length,
            kind: RegionKind::Usable as u32,
        }
    }
}

/// Discovery-ordered entry list; the count travels with it into the
/// handoff block.
pub type MemoryMap = HVec<E820Entry, E820_MAX>;

/// End of usable conventional memory (the video window starts here).
const LOW_MEMORY: u64 = 0xA_0000;
const ONE_MB: u64 = 0x10_0000;
const SIXTEEN_MB: u64 = 0x100_0000;

/// Run the tiers until one yields data.
pub fn collect<F: Firmware>(fw: &mut F) -> MemoryMap {
    let mut map = MemoryMap::new();

    if collect_e820(fw, &mut map) {
        info!("memory map: {} ranges (e820)", map.len());
        return map;
    }

    if let Some((lowext_kb, highext_blocks)) = query_e801(fw) {
        synthesize(&mut map, lowext_kb as u32, highext_blocks as u32);
        info!("memory map: {} ranges (e801)", map.len());
        return map;
    }

    // Legacy query: extended memory above 1 MiB only; the 16 MiB+
    // component does not exist on firmware this old.
    let kb = fw.ext_mem_88().unwrap_or(0);
    synthesize(&mut map, kb as u32, 0);
    info!("memory map: {} ranges (88h)", map.len());
    map
}

/// Tier 1: walk the continuation token, one range per call. A failed call,
/// a bad signature or a full table ends the walk; whatever was appended by
/// then stands.
fn collect_e820<F: Firmware>(fw: &mut F, map: &mut MemoryMap) -> bool {
    let mut cont = 0u32;
    loop {
        let Some(frame) = fw.e820_next(cont) else {
            break;
        };
        if frame.signature != SMAP {
            break;
        }
        if map.push(frame.entry).is_err() {
            break;
        }
        cont = frame.next;
        if cont == 0 {
            break;
        }
    }
    !map.is_empty()
}

/// Tier 2: dual-range query, with two known firmware quirks papered over.
/// The carry flag is not trusted on its own (some firmware forgets to
/// clear it), and if the primary CX/DX pair reads zero the answer is
/// re-read from the alternate AX/BX pair instead.
fn query_e801<F: Firmware>(fw: &mut F) -> Option<(u16, u16)> {
    let E801Frame {
        carry,
        ax,
        bx,
        cx,
        dx,
    } = fw.e801();
    if carry && ax == 0 && bx == 0 && cx == 0 && dx == 0 {
        return None;
    }
    if cx == 0 && dx == 0 {
        Some((ax, bx))
    } else {
        Some((cx, dx))
    }
}

/// Normalization shared by tiers 2 and 3: up to three usable ranges, each
/// appended through the same capacity-bounded push as tier 1.
fn synthesize(map: &mut MemoryMap, lowext_kb: u32, highext_blocks: u32) {
    let _ = map.push(E820Entry::usable(0, LOW_MEMORY));
    if lowext_kb != 0 {
        let _ = map.push(E820Entry::usable(ONE_MB, lowext_kb as u64 * 1024));
    }
    if highext_blocks != 0 {
        let _ = map.push(E820Entry::usable(SIXTEEN_MB, highext_blocks as u64 * 65536));
    }
}

/// Log the final map, one line per range.
pub fn log_map(map: &MemoryMap) {
    for e in map.iter() {
        info!(
            "  range {:#012x}..{:#012x} type {}",
            e.base,
            e.base + e.length,
            e.kind
        );
    }
}
