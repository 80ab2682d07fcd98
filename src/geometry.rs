//! Media geometry probing.
//!
//! The pre-UEFI call surface has no "how many sectors per track" query, so
//! the count is inferred by trying to read the highest sector of each known
//! format, densest first. Unlike payload loading these probes are one-shot:
//! a failed probe is an answer, not an error.

use log::info;

use crate::config::BootConfig;
use crate::firmware::{DiskRead, Firmware};

/// Sector counts of the supported formats, densest first.
const PROBE_SECTORS: [u8; 2] = [18, 15];

/// Lowest common denominator of the oldest supported media; adopted when
/// every probe fails.
pub const DEFAULT_SPT: u8 = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MediaGeometry {
    pub sectors_per_track: u8,
}

/// Determine sectors-per-track by probe reads at track 0. The probe lands
/// in the destination window, which the loader overwrites right after.
pub fn probe<F: Firmware>(fw: &mut F, cfg: &BootConfig) -> MediaGeometry {
    for &sector in &PROBE_SECTORS {
        let req = DiskRead {
            drive: cfg.drive,
            track: 0,
            head: 0,
            sector,
            count: 1,
            segment: cfg.dest_segment,
            offset: 0,
        };
        if fw.disk_read(&req).is_ok() {
            info!("media: {} sectors/track", sector);
            return MediaGeometry {
                sectors_per_track: sector,
            };
        }
    }
    info!("media: probes failed, assuming {} sectors/track", DEFAULT_SPT);
    MediaGeometry {
        sectors_per_track: DEFAULT_SPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::mock::MockFirmware;

    #[test]
    fn adopts_18_when_first_probe_succeeds() {
        let mut fw = MockFirmware::with_spt(18);
        let g = probe(&mut fw, &BootConfig::DEFAULT);
        assert_eq!(g.sectors_per_track, 18);
        assert_eq!(fw.reads.len(), 1);
    }

    #[test]
    fn falls_back_to_15() {
        let mut fw = MockFirmware::with_spt(15);
        let g = probe(&mut fw, &BootConfig::DEFAULT);
        assert_eq!(g.sectors_per_track, 15);
        assert_eq!(fw.reads.len(), 2);
    }

    #[test]
    fn defaults_to_9_when_all_probes_fail() {
        let mut fw = MockFirmware::with_spt(9);
        let g = probe(&mut fw, &BootConfig::DEFAULT);
        assert_eq!(g.sectors_per_track, 9);
        // Each probe is tried exactly once, never retried.
        assert_eq!(fw.reads.len(), 2);
        assert_eq!(fw.resets, 0);
    }
}
