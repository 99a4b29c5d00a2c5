use log::debug;

use crate::layout::{narrator, rb, translator, NT_MESSAGE};
use crate::mem::EmulatedRam;

// 68000 opcode words the boot programs are assembled from.
const OP_JSR_ABS_L: u16 = 0x4EB9;
const OP_MOVEQ_0_D0: u16 = 0x7000;
const OP_MOVEA_L_IMM_A6: u16 = 0x2C7C;
const OP_MOVEA_L_IMM_A1: u16 = 0x227C;
const OP_MOVE_L_IMM_ABS_L: u16 = 0x23FC;
const OP_STOP_2700: u32 = 0x4E72_2700;

/// The assembled boot program, with the two call slots the dispatcher
/// patches once the guest reveals the addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trampoline {
    pub base: u32,
    /// Operand of the second jsr; MakeLibrary fills in the library's
    /// Open entry point here.
    pub make_library_slot: u32,
    /// Operand of the third jsr; AddTask fills in the task's initial PC.
    pub add_task_slot: u32,
}

/// Assemble the narrator boot program at the trampoline base:
///
/// ```text
/// jsr     rt_init.l
/// moveq   #0,d0
/// movea.l #library_base,a6
/// movea.l #request_block,a1
/// jsr     <MakeLibrary patches>.l
/// move.l  #library_base,stack_pointer.l
/// jsr     <AddTask patches>.l
/// stop    #$2700
/// ```
///
/// The no-ROMTag fallback passes `rt_init == 0`, producing a boot program
/// whose first call goes nowhere useful; it is kept for parity with
/// images that install themselves without a resident descriptor.
pub fn build_narrator_trampoline(ram: &mut EmulatedRam, rt_init: u32) -> Trampoline {
    let base = narrator::TRAMPOLINE;

    ram.write_u16(base, OP_JSR_ABS_L);
    ram.write_u32(base + 2, rt_init);

    ram.write_u16(base + 6, OP_MOVEQ_0_D0);
    ram.write_u16(base + 8, OP_MOVEA_L_IMM_A6);
    ram.write_u32(base + 10, narrator::LIBRARY_BASE);
    ram.write_u16(base + 14, OP_MOVEA_L_IMM_A1);
    ram.write_u32(base + 16, narrator::REQUEST_BLOCK);

    ram.write_u16(base + 20, OP_JSR_ABS_L);
    let make_library_slot = base + 22;
    ram.write_u32(make_library_slot, 0);

    ram.write_u16(base + 26, OP_MOVE_L_IMM_ABS_L);
    ram.write_u32(base + 28, narrator::LIBRARY_BASE);
    ram.write_u32(base + 32, narrator::STACK_POINTER);

    ram.write_u16(base + 36, OP_JSR_ABS_L);
    let add_task_slot = base + 38;
    ram.write_u32(add_task_slot, 0);

    ram.write_u32(base + 42, OP_STOP_2700);

    debug!("narrator trampoline at {base:#x}, rt_Init {rt_init:#x}");
    Trampoline {
        base,
        make_library_slot,
        add_task_slot,
    }
}

/// Seed the fabricated narrator request block header the guest's Open
/// and task code expect to find: a message node addressed at the main
/// message port, sized for the old 70-byte block, owned by the library.
pub fn seed_request_block(ram: &mut EmulatedRam) {
    let block = narrator::REQUEST_BLOCK;
    ram.write_u8(block + rb::LN_TYPE, NT_MESSAGE);
    ram.write_u32(block + rb::MN_REPLY_PORT, narrator::MSG_PORT);
    ram.write_u16(block + rb::MN_LENGTH, rb::SIZE);
    ram.write_u32(block + rb::IO_DEVICE, narrator::LIBRARY_BASE);
}

/// Assemble the translator boot program: call Translate, then stop.
pub fn build_translator_trampoline(ram: &mut EmulatedRam, translate: u32) {
    let base = translator::TRAMPOLINE;
    ram.write_u16(base, OP_JSR_ABS_L);
    ram.write_u32(base + 2, translate);
    ram.write_u32(base + 6, OP_STOP_2700);
    debug!("translator trampoline at {base:#x}, Translate {translate:#x}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::narrator::{LIBRARY_BASE, MSG_PORT, REQUEST_BLOCK, STACK_POINTER, TRAMPOLINE};

    #[test]
    fn narrator_trampoline_encodes_boot_sequence() {
        let mut ram = EmulatedRam::new(0x30000);
        let tramp = build_narrator_trampoline(&mut ram, 0x1234);

        assert_eq!(ram.read_u16(TRAMPOLINE), 0x4EB9);
        assert_eq!(ram.read_u32(TRAMPOLINE + 2), 0x1234);
        assert_eq!(ram.read_u16(TRAMPOLINE + 6), 0x7000);
        assert_eq!(ram.read_u16(TRAMPOLINE + 8), 0x2C7C);
        assert_eq!(ram.read_u32(TRAMPOLINE + 10), LIBRARY_BASE);
        assert_eq!(ram.read_u16(TRAMPOLINE + 14), 0x227C);
        assert_eq!(ram.read_u32(TRAMPOLINE + 16), REQUEST_BLOCK);
        assert_eq!(ram.read_u16(TRAMPOLINE + 20), 0x4EB9);
        assert_eq!(ram.read_u16(TRAMPOLINE + 26), 0x23FC);
        assert_eq!(ram.read_u32(TRAMPOLINE + 28), LIBRARY_BASE);
        assert_eq!(ram.read_u32(TRAMPOLINE + 32), STACK_POINTER);
        assert_eq!(ram.read_u16(TRAMPOLINE + 36), 0x4EB9);
        assert_eq!(ram.read_u32(TRAMPOLINE + 42), 0x4E72_2700);

        // Patch slots are the jsr operands, initially zero.
        assert_eq!(tramp.make_library_slot, TRAMPOLINE + 22);
        assert_eq!(tramp.add_task_slot, TRAMPOLINE + 38);
        assert_eq!(ram.read_u32(tramp.make_library_slot), 0);
        assert_eq!(ram.read_u32(tramp.add_task_slot), 0);
    }

    #[test]
    fn request_block_header_is_seeded() {
        let mut ram = EmulatedRam::new(0x30000);
        seed_request_block(&mut ram);
        assert_eq!(ram.read_u8(REQUEST_BLOCK + rb::LN_TYPE), NT_MESSAGE);
        assert_eq!(ram.read_u32(REQUEST_BLOCK + rb::MN_REPLY_PORT), MSG_PORT);
        assert_eq!(ram.read_u16(REQUEST_BLOCK + rb::MN_LENGTH), 70);
        assert_eq!(ram.read_u32(REQUEST_BLOCK + rb::IO_DEVICE), LIBRARY_BASE);
    }

    #[test]
    fn translator_trampoline_calls_translate_then_stops() {
        let mut ram = EmulatedRam::new(0x10000);
        build_translator_trampoline(&mut ram, 0x134);
        assert_eq!(ram.read_u16(translator::TRAMPOLINE), 0x4EB9);
        assert_eq!(ram.read_u32(translator::TRAMPOLINE + 2), 0x134);
        assert_eq!(ram.read_u32(translator::TRAMPOLINE + 6), 0x4E72_2700);
    }
}
