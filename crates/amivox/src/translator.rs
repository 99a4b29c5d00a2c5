use log::{info, warn};

use crate::boot::build_translator_trampoline;
use crate::error::Error;
use crate::hunk::load_image;
use crate::layout::translator;
use crate::machine::{reg, Machine, StopWatcher};
use crate::mem::EmulatedRam;
use crate::resident::{
    vector_entry, AutoInitTable, ResidentError, ResidentFlags, RomTag, TRANSLATE_VECTOR_INDEX,
};

/// Run a translator.library image over `text` and return the phonetic
/// string the guest wrote to its output window.
pub fn run_translator(library_image: &[u8], text: &str) -> Result<Vec<u8>, Error> {
    let mut ram = EmulatedRam::new(translator::RAM_SIZE);
    let loaded = load_image(library_image, &mut ram)?;
    info!("library image loaded, hunk bases {:x?}", loaded.hunk_bases);

    let translate = match RomTag::find(&ram, translator::ROMTAG_BASE) {
        Some(tag) => {
            info!("ROMTag found at {:#x}", tag.base);
            if !tag.flags.contains(ResidentFlags::AUTOINIT) {
                return Err(ResidentError::AutoInitRequired { base: tag.base }.into());
            }
            let table = AutoInitTable::read(&ram, tag.init);
            vector_entry(&ram, table.vectors, TRANSLATE_VECTOR_INDEX).ok_or(
                ResidentError::MissingVector {
                    table: table.vectors,
                    index: TRANSLATE_VECTOR_INDEX,
                },
            )?
        }
        None => {
            warn!(
                "no ROMTag in library image, using known Translate entry {:#x}",
                translator::FALLBACK_TRANSLATE
            );
            translator::FALLBACK_TRANSLATE
        }
    };
    info!("Translate function {translate:#x}");

    let mut input = text.as_bytes().to_vec();
    input.truncate(translator::INPUT_WINDOW);
    ram.write_bytes(translator::INPUT_BASE, &input);
    build_translator_trampoline(&mut ram, translate);

    let mut machine = Machine::new(ram);
    machine.set_pc(translator::TRAMPOLINE);
    machine.set_reg(reg::SP, translator::STACK_POINTER);
    machine.set_reg(reg::A0, translator::INPUT_BASE);
    machine.set_reg(reg::D0, input.len() as u32);
    machine.set_reg(reg::A1, translator::OUTPUT_BASE);
    machine.set_reg(reg::D1, translator::OUTPUT_WINDOW);
    machine.set_reg(reg::A6, translator::LIBRARY_BASE);

    machine.run(&mut StopWatcher)?;
    Ok(read_output(machine.ram()))
}

/// The guest leaves a NUL-terminated phonetic string in its output
/// window.
fn read_output(ram: &EmulatedRam) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0..translator::OUTPUT_WINDOW {
        let b = ram.read_u8(translator::OUTPUT_BASE + i);
        if b == 0 {
            break;
        }
        out.push(b);
    }
    out
}
