//! Legacy power-management quiesce.
//!
//! If the firmware carries an APM BIOS, its timer-driven interrupts can
//! fire into the mode-sensitive code that follows, so it is switched off
//! here. Strictly best-effort: a machine without APM is a no-op, and a
//! disable call that fails is ignored rather than escalated.

use bitflags::bitflags;
use log::info;

use crate::firmware::Firmware;

/// Installation-check signature, "PM".
pub const APM_SIGNATURE: u16 = 0x504D;

bitflags! {
    /// Capability flags from the installation check.
    #[derive(Clone, Copy, Debug)]
    pub struct ApmFlags: u16 {
        const PROT16_SUPPORTED = 1 << 0;
        const PROT32_SUPPORTED = 1 << 1;
        const IDLE_SLOWS_CLOCK = 1 << 2;
        const DISABLED         = 1 << 3;
        const DISENGAGED       = 1 << 4;
    }
}

/// Probe for APM and, if present, run the connect/disconnect handshake and
/// disable the service. No step past the signature check can fail the
/// boot.
pub fn disable<F: Firmware>(fw: &mut F) {
    let Some(apm) = fw.apm_check() else {
        return;
    };
    if apm.signature != APM_SIGNATURE {
        return;
    }
    info!(
        "apm {}.{} present ({:?}), disabling",
        apm.version >> 8,
        apm.version & 0xFF,
        ApmFlags::from_bits_truncate(apm.flags)
    );

    // A previous loader may have left an interface connected.
    let _ = fw.apm_disconnect();
    let _ = fw.apm_connect();
    let _ = fw.apm_disable();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::ApmInfo;
    use crate::firmware::mock::MockFirmware;

    #[test]
    fn absent_apm_is_a_noop() {
        let mut fw = MockFirmware::default();
        disable(&mut fw);
        assert_eq!(fw.apm_log, ["check"]);
    }

    #[test]
    fn wrong_signature_is_a_noop() {
        let mut fw = MockFirmware::default();
        fw.apm_info = Some(ApmInfo {
            signature: 0x4142,
            version: 0x0102,
            flags: 0,
        });
        disable(&mut fw);
        assert_eq!(fw.apm_log, ["check"]);
    }

    #[test]
    fn present_apm_gets_handshake_then_disable() {
        let mut fw = MockFirmware::default();
        fw.apm_info = Some(ApmInfo {
            signature: APM_SIGNATURE,
            version: 0x0102,
            flags: ApmFlags::PROT32_SUPPORTED.bits(),
        });
        disable(&mut fw);
        assert_eq!(fw.apm_log, ["check", "disconnect", "connect", "disable"]);
    }

    #[test]
    fn failed_disable_is_ignored() {
        let mut fw = MockFirmware::default();
        fw.apm_info = Some(ApmInfo {
            signature: APM_SIGNATURE,
            version: 0x0101,
            flags: 0,
        });
        fw.apm_disable_ok = false;
        disable(&mut fw);
        // Reaching the disable call at all is the whole contract.
        assert_eq!(fw.apm_log.last(), Some(&"disable"));
    }
}
