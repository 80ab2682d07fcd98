//! The one-way switch out of real mode.
//!
//! Linear sequence, no retries past this point: quiesce (interrupts off,
//! NMI masked), widen addressing, patch and load the descriptor tables,
//! plant the handoff block, set CR0.PE, force the change to land with a
//! serializing jump, reload segmentation and jump to the payload with the
//! handoff address in ESI. Nothing here ever returns; the real-mode
//! context is permanently abandoned.

/// Run the whole transition and enter the payload.
///
/// # Safety
/// Point of no return. The caller must be the real-mode stage itself,
/// with the payload loaded and the handoff block composed; any fault past
/// the CR0 write halts the machine because no handler exists to catch it.
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub unsafe fn launch<F: crate::firmware::Firmware>(
    fw: &mut F,
    code_segment: u16,
    gdt_offset: u16,
    handoff: &crate::handoff::HandoffParameters,
) -> ! {
    use crate::gdt;
    use crate::handoff::HandoffParameters;

    // Quiesce: nothing may interrupt the switch.
    core::arch::asm!("cli");
    fw.set_nmi_mask(true);

    // Widen addressing while firmware services still answer.
    crate::a20::enable(fw);

    // Patch the table base with where we actually run from, then plant
    // the handoff block in its window.
    let gdtr = gdt::materialize(code_segment, gdt_offset);
    let window = HandoffParameters::window_linear(code_segment);
    crate::handoff::install_at(window, handoff);

    enter_payload(gdtr, window, handoff.entry)
}

#[cfg(all(target_arch = "x86", target_os = "none"))]
unsafe fn enter_payload(gdtr: &'static crate::gdt::TablePointer, handoff_lin: u32, entry: u32) -> ! {
    use crate::gdt::{CODE_SELECTOR, DATA_SELECTOR, IDT_POINTER};

    core::arch::asm!(
        "lgdt [{gdtr:e}]",
        "lidt [{idtr:e}]",
        // Protection enable takes effect at the next control transfer,
        // so jump immediately to keep prefetch honest.
        "mov eax, cr0",
        "or eax, 1",
        "mov cr0, eax",
        "jmp 2f",
        "2:",
        // Flat data everywhere; CS reloads on the final far jump.
        "mov ds, {data:x}",
        "mov es, {data:x}",
        "mov fs, {data:x}",
        "mov gs, {data:x}",
        "mov ss, {data:x}",
        // The old real-mode SS:SP is meaningless under the flat selector.
        // Park the stack on the stage-owned scratch directly below the
        // handoff block before the far return pushes anything.
        "mov esp, esi",
        "push {code:e}",
        "push {entry:e}",
        "retf",
        gdtr = in(reg) core::ptr::from_ref(gdtr),
        idtr = in(reg) core::ptr::from_ref(&IDT_POINTER),
        data = in(reg) DATA_SELECTOR as u32,
        code = in(reg) CODE_SELECTOR as u32,
        entry = in(reg) entry,
        in("esi") handoff_lin,
        options(noreturn),
    )
}
