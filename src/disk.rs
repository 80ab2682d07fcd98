//! Payload loading off the boot medium.
//!
//! The payload is read burst-by-burst: each burst takes as many sectors as
//! remain on the current track, clamped so the destination never crosses a
//! 64 KiB boundary (a single firmware read must stay inside one real-mode
//! window). A failed read dumps the burst parameters, resets the
//! controller and retries the same burst forever; transient media errors
//! are assumed recoverable, and a dead drive shows up as a visible retry
//! loop rather than a silent hang.

use log::{info, warn};

use crate::config::{BootConfig, HEADS, SECTOR_SIZE, SEGMENT_STEP};
use crate::firmware::{DiskError, DiskRead, Firmware};
use crate::geometry::MediaGeometry;

const WINDOW: u32 = 0x1_0000;

/// Next raw-media position and next destination address. Owned by the
/// loader alone; reset to the origin at load start.
#[derive(Clone, Copy, Debug)]
pub struct ReadCursor {
    pub segment: u16,
    pub offset: u16,
    pub track: u16,
    pub head: u8,
    /// Next sector on the current track, 1-based.
    pub sector: u8,
    pub read_on_track: u8,
}

impl ReadCursor {
    fn origin(cfg: &BootConfig) -> Self {
        ReadCursor {
            segment: cfg.dest_segment,
            offset: 0,
            track: 0,
            head: 0,
            sector: cfg.start_sector,
            read_on_track: cfg.start_sector - 1,
        }
    }

    /// Sectors this burst may take: the rest of the track, or what fits
    /// below the 64 KiB boundary, whichever is smaller.
    fn burst_len(&self, spt: u8) -> u8 {
        let on_track = (spt - self.read_on_track) as u32;
        let in_window = (WINDOW - self.offset as u32) / SECTOR_SIZE;
        on_track.min(in_window) as u8
    }

    fn advance(&mut self, count: u8, spt: u8) {
        self.read_on_track += count;
        self.sector += count;
        if self.read_on_track == spt {
            self.read_on_track = 0;
            self.sector = 1;
            self.head += 1;
            if self.head == HEADS {
                self.head = 0;
                self.track += 1;
            }
        }
        let next = self.offset as u32 + count as u32 * SECTOR_SIZE;
        if next == WINDOW {
            self.segment += SEGMENT_STEP;
            self.offset = 0;
        } else {
            self.offset = next as u16;
        }
    }
}

/// Copy the payload into the destination window. Returns only once the
/// whole payload is in memory; a persistently failing medium keeps this
/// loop (and its diagnostics) running until an operator fixes it.
pub fn load<F: Firmware>(fw: &mut F, geometry: &MediaGeometry, cfg: &BootConfig) {
    let spt = geometry.sectors_per_track;
    let mut cur = ReadCursor::origin(cfg);
    while cur.segment - cfg.dest_segment < cfg.payload_paras {
        let req = DiskRead {
            drive: cfg.drive,
            track: cur.track,
            head: cur.head,
            sector: cur.sector,
            count: cur.burst_len(spt),
            segment: cur.segment,
            offset: cur.offset,
        };
        while let Err(e) = fw.disk_read(&req) {
            dump_failure(&req, e);
            fw.disk_reset(cfg.drive);
        }
        cur.advance(req.count, spt);
    }
    info!(
        "payload loaded: {} paragraphs at {:04x}:0000",
        cfg.payload_paras, cfg.dest_segment
    );
}

/// Five diagnostic words: status, track, head:sector, count, offset.
fn dump_failure(req: &DiskRead, err: DiskError) {
    warn!(
        "disk read failed: {:04x} {:04x} {:04x} {:04x} {:04x}",
        err.status as u16,
        req.track,
        (req.head as u16) << 8 | req.sector as u16,
        req.count as u16,
        req.offset,
    );
}
