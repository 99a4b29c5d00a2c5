use std::io::Write;

use log::{info, warn};

use crate::abi::NarratorAbi;
use crate::boot::{build_narrator_trampoline, seed_request_block};
use crate::error::Error;
use crate::hunk::load_image;
use crate::layout::narrator;
use crate::machine::{reg, Halt, Machine};
use crate::mem::EmulatedRam;
use crate::resident::RomTag;

/// Boot a narrator.device image and speak `phonetic`, streaming the
/// synthesized signed 8-bit samples to `pcm`.
///
/// Returns how the guest ended: known device builds reply their request
/// block back rather than running to the trampoline's `stop`, so
/// `Halt::GuestReply` is the expected outcome and carries the device's
/// io_Error.
pub fn run_narrator<W: Write>(
    device_image: &[u8],
    phonetic: &str,
    pcm: W,
) -> Result<Halt, Error> {
    let mut ram = EmulatedRam::new(narrator::RAM_SIZE);
    let loaded = load_image(device_image, &mut ram)?;
    info!("device image loaded, hunk bases {:x?}", loaded.hunk_bases);

    let (trampoline, library_name) = match RomTag::find(&ram, narrator::ROMTAG_BASE) {
        Some(tag) => {
            info!("ROMTag found at {:#x}", tag.base);
            (build_narrator_trampoline(&mut ram, tag.init), tag.name)
        }
        None => {
            // Images without a resident descriptor get the same boot
            // program with a null init routine and a host-planted name.
            warn!("no ROMTag in device image");
            ram.write_bytes(narrator::LIBRARY_NAME, narrator::DEVICE_NAME.as_bytes());
            (
                build_narrator_trampoline(&mut ram, 0),
                narrator::LIBRARY_NAME,
            )
        }
    };
    seed_request_block(&mut ram);

    let mut machine = Machine::new(ram);
    machine.set_pc(trampoline.base);
    machine.set_reg(reg::SP, narrator::STACK_POINTER);
    machine.set_reg(reg::D0, 0);
    machine.set_reg(reg::A1, library_name);
    machine.set_reg(reg::A2, narrator::LIBRARY_BASE);
    machine.set_reg(reg::A6, narrator::EXEC_BASE);

    let mut abi = NarratorAbi::new(phonetic, pcm, trampoline);
    machine.run(&mut abi)
}
