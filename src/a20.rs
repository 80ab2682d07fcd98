//! Extended-addressing (A20) enable.
//!
//! Two independent mechanisms, both applied unconditionally: neither the
//! presence nor the effect of either can be detected reliably across the
//! hardware span this stage supports, so success of the first never skips
//! the second. The keyboard-controller path polls the status register
//! with no timeout; a truly stuck controller hangs the boot here, because
//! there is no safe way to proceed past it.

use bitflags::bitflags;

use crate::firmware::Firmware;

bitflags! {
    /// Keyboard controller status register. Only the input-buffer bit
    /// matters here; the enable sequence never reads data back.
    #[derive(Clone, Copy, Debug)]
    pub struct KbcStatus: u8 {
        const INPUT_FULL = 1 << 1;
    }
}

/// Fast-gate bit in system control port A.
const FAST_GATE: u8 = 1 << 1;
/// Writing bit 0 of port A resets the machine; always masked off.
const FAST_RESET: u8 = 1 << 0;

/// Controller command: write the output port.
const KBC_WRITE_OUTPUT: u8 = 0xD1;
/// Output-port value with the address gate open.
const KBC_GATE_ON: u8 = 0xDF;

pub fn enable<F: Firmware>(fw: &mut F) {
    // Fast path via port A, unless the port reads as unimplemented.
    let port_a = fw.port_a_read();
    if port_a != 0xFF {
        fw.port_a_write((port_a | FAST_GATE) & !FAST_RESET);
    }

    // Keyboard-controller path, applied regardless of the above.
    wait_input_clear(fw);
    fw.kbc_command(KBC_WRITE_OUTPUT);
    wait_input_clear(fw);
    fw.kbc_data(KBC_GATE_ON);
    wait_input_clear(fw);
}

/// Spin until the controller input buffer drains. Unbounded on purpose;
/// only the firmware side can end it.
fn wait_input_clear<F: Firmware>(fw: &mut F) {
    while KbcStatus::from_bits_truncate(fw.kbc_status()).contains(KbcStatus::INPUT_FULL) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::mock::MockFirmware;

    #[test]
    fn fast_gate_sets_gate_bit_and_masks_reset() {
        let mut fw = MockFirmware::default();
        fw.port_a = 0x01;
        enable(&mut fw);
        assert_eq!(fw.port_a_written, Some(0x02));
    }

    #[test]
    fn fast_gate_skipped_on_unimplemented_port() {
        let mut fw = MockFirmware::default();
        fw.port_a = 0xFF;
        enable(&mut fw);
        assert_eq!(fw.port_a_written, None);
        // The controller sequence still runs.
        assert_eq!(fw.kbc_writes, [("cmd", 0xD1), ("data", 0xDF)]);
    }

    #[test]
    fn controller_sequence_waits_out_a_busy_input_buffer() {
        let mut fw = MockFirmware::default();
        // Busy for a few polls before the first byte, then clear.
        fw.kbc_status_script.extend([0x02, 0x02, 0x00, 0x02, 0x00]);
        enable(&mut fw);
        assert_eq!(fw.kbc_writes, [("cmd", 0xD1), ("data", 0xDF)]);
    }

    #[test]
    fn both_mechanisms_always_applied() {
        let mut fw = MockFirmware::default();
        fw.port_a = 0x00;
        enable(&mut fw);
        // Fast gate succeeded, yet the controller path ran anyway.
        assert_eq!(fw.port_a_written, Some(0x02));
        assert!(!fw.kbc_writes.is_empty());
    }
}
