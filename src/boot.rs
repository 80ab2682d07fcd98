//! The bootstrap sequence.
//!
//! Fixed linear ordering, one logical thread, every call synchronous:
//! probe the media, pull the payload in, quiesce power management, size
//! memory, compose the handoff block. The mode switch itself lives in
//! [`crate::transition`] and only runs on the metal.

use log::info;

use crate::config::BootConfig;
use crate::firmware::Firmware;
use crate::geometry::MediaGeometry;
use crate::handoff::HandoffParameters;
use crate::memmap::{self, MemoryMap};
use crate::{apm, disk, geometry};

/// Everything the transition step needs, produced while firmware services
/// are still available.
pub struct Prepared {
    pub geometry: MediaGeometry,
    pub memory_map: MemoryMap,
    pub handoff: HandoffParameters,
}

pub fn prepare<F: Firmware>(fw: &mut F, cfg: &BootConfig) -> Prepared {
    info!("stage start: drive {:#04x}", cfg.drive);

    let geometry = geometry::probe(fw, cfg);
    disk::load(fw, &geometry, cfg);

    apm::disable(fw);
    let memory_map = memmap::collect(fw);
    memmap::log_map(&memory_map);

    let handoff = HandoffParameters::compose(cfg, &memory_map);
    Prepared {
        geometry,
        memory_map,
        handoff,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::E801Frame;
    use crate::firmware::mock::MockFirmware;

    #[test]
    fn full_sequence_on_a_coarse_machine() {
        // 15-sector media, no e820, dual-range answers: the oldest box
        // this stage still fully supports.
        let mut fw = MockFirmware::with_spt(15);
        fw.e801_frame = Some(E801Frame {
            carry: false,
            ax: 0x3C00,
            bx: 0x0100,
            cx: 0x3C00,
            dx: 0x0100,
        });
        let cfg = BootConfig {
            payload_paras: 0x1000,
            ..BootConfig::DEFAULT
        };
        let prepared = prepare(&mut fw, &cfg);

        assert_eq!(prepared.geometry.sectors_per_track, 15);
        // Probe read at 18 failed, probe at 15 succeeded, then the load.
        assert!(fw.reads.len() > 2);
        assert_eq!(prepared.memory_map.len(), 3);
        assert_eq!(prepared.handoff.e820_count, 3);
        assert_eq!(prepared.handoff.entry, cfg.entry);
        // Power management was probed before memory sizing.
        assert_eq!(fw.apm_log.first(), Some(&"check"));
    }
}
