//! Descriptor tables for the mode switch.
//!
//! Exactly four 8-byte descriptors: null, an unused placeholder, a flat
//! 32-bit code segment and a flat 32-bit data segment. The table content
//! is fixed at compile time; only the descriptor-pointer base depends on
//! where the image was actually placed, so that one field is patched once
//! at run time. The IDT pointer is limit-zero: no interrupt is
//! serviceable after the switch, and any that fires is fatal by
//! construction.

use core::mem::size_of;

use spin::Once;

#[repr(C, packed)]
#[derive(Clone, Copy)]
pub struct Descriptor {
    limit_low: u16,
    base_low: u16,
    base_middle: u8,
    access: u8,
    granularity: u8,
    base_high: u8,
}

impl Descriptor {
    pub const fn null() -> Self {
        Descriptor {
            limit_low: 0,
            base_low: 0,
            base_middle: 0,
            access: 0,
            granularity: 0,
            base_high: 0,
        }
    }

    /// Flat 32-bit code over the full 4 GiB window.
    pub const fn flat_code32() -> Self {
        Descriptor {
            limit_low: 0xFFFF,
            base_low: 0,
            base_middle: 0,
            access: 0x9A,      // present, ring 0, code, readable
            granularity: 0xCF, // 32-bit, 4 KiB granularity, limit 0xFFFFF
            base_high: 0,
        }
    }

    /// Flat 32-bit data over the same window.
    pub const fn flat_data32() -> Self {
        Descriptor {
            limit_low: 0xFFFF,
            base_low: 0,
            base_middle: 0,
            access: 0x92,      // present, ring 0, data, writable
            granularity: 0xCF,
            base_high: 0,
        }
    }

}

/// The table itself, in static storage. Slot 1 is kept for layout
/// compatibility with the old handwritten image and is never loaded.
pub static TABLE: [Descriptor; 4] = [
    Descriptor::null(),
    Descriptor::null(),
    Descriptor::flat_code32(),
    Descriptor::flat_data32(),
];

pub const CODE_SELECTOR: u16 = 0x10;
pub const DATA_SELECTOR: u16 = 0x18;

/// What `lgdt`/`lidt` consume: 16-bit limit, 32-bit linear base.
#[repr(C, packed)]
#[derive(Clone, Copy, Debug)]
pub struct TablePointer {
    pub limit: u16,
    pub base: u32,
}

/// Empty interrupt table.
pub const IDT_POINTER: TablePointer = TablePointer { limit: 0, base: 0 };

static GDT_POINTER: Once<TablePointer> = Once::new();

/// Patch the descriptor-pointer base with the table's run-time linear
/// address: the stage's code segment shifted to linear, plus the table's
/// offset within the image. One-time initialization; later calls return
/// the already-patched pointer.
pub fn materialize(code_segment: u16, table_offset: u16) -> &'static TablePointer {
    GDT_POINTER.call_once(|| TablePointer {
        limit: (size_of::<[Descriptor; 4]>() - 1) as u16,
        base: ((code_segment as u32) << 4) + table_offset as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_patch_matches_real_mode_linear_math() {
        let p = materialize(0x9000, 0x0200);
        let base = p.base;
        let limit = p.limit;
        assert_eq!(base, (0x9000 << 4) + 0x0200);
        assert_eq!(limit, 31);
        // The patch is one-shot: a second call cannot move the table.
        let again = materialize(0x1234, 0);
        let base = again.base;
        assert_eq!(base, (0x9000 << 4) + 0x0200);
    }

    #[test]
    fn table_shape() {
        // Checked as raw bytes: the processor sees exactly this encoding.
        fn bytes(d: Descriptor) -> [u8; 8] {
            unsafe { core::mem::transmute(d) }
        }
        assert_eq!(size_of::<Descriptor>(), 8);
        assert_eq!(bytes(TABLE[0]), [0; 8]);
        assert_eq!(bytes(TABLE[1]), [0; 8]);
        assert_eq!(bytes(TABLE[2]), [0xFF, 0xFF, 0, 0, 0, 0x9A, 0xCF, 0]);
        assert_eq!(bytes(TABLE[3]), [0xFF, 0xFF, 0, 0, 0, 0x92, 0xCF, 0]);
    }

    #[test]
    fn idt_is_empty() {
        let limit = IDT_POINTER.limit;
        let base = IDT_POINTER.base;
        assert_eq!(limit, 0);
        assert_eq!(base, 0);
    }
}
