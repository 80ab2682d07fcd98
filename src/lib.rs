//! Earliest-stage bootstrap for the diagnostic payload.
//!
//! Takes control at power-on (or at hand-off from an intermediate loader),
//! pulls the payload off the boot medium, discovers installed memory through
//! whichever firmware interface the machine actually supports, and performs
//! the one-way switch into 32-bit flat mode before jumping to the payload
//! entry point with the handoff block in ESI.
//!
//! Everything that touches real firmware goes through the [`Firmware`]
//! trait, so the whole stage short of the final mode switch runs (and is
//! tested) on a hosted target.

#![cfg_attr(not(test), no_std)]
#![allow(unsafe_op_in_unsafe_fn)]

pub mod a20;
pub mod apm;
pub mod boot;
pub mod config;
pub mod console;
pub mod disk;
pub mod firmware;
pub mod gdt;
pub mod geometry;
pub mod handoff;
pub mod memmap;
pub mod transition;

#[cfg(all(target_arch = "x86", target_os = "none"))]
mod arch {
    pub mod x86 {
        pub mod bios;
        pub mod rt;
    }
}

pub use config::BootConfig;
pub use firmware::Firmware;
pub use handoff::HandoffParameters;
pub use memmap::{E820Entry, MemoryMap, RegionKind};
