use std::io::Write;

use log::debug;

use super::vector::ExecVector;
use super::AbiError;
use crate::boot::Trampoline;
use crate::error::Error;
use crate::layout::{cmd, ioa, narrator, rb, voice};
use crate::machine::{reg, EmuCore, Flow, Halt, StepObserver, OP_JSR_D16_A6, OP_RTS, OP_STOP};

/// Library jump-table slots live at `0x10000 + offset`; with the exec
/// base at 0x20000 that is exactly `exec_base + d16` for every negative
/// displacement, so patching the slot turns the intercepted call into a
/// plain subroutine return.
const JUMP_TABLE_BASE: u32 = 0x10000;

/// The narrator's step observer: intercepts every `jsr d16(A6)`,
/// performs the observable effect of the named system function, and
/// turns the jump-table slot into an `rts` so the call returns to the
/// guest.
pub struct NarratorAbi<W> {
    /// Pending phonetic input, delivered to the guest task by GetMsg.
    input: Vec<u8>,
    /// Where BeginIO CMD_WRITE streams the synthesized samples.
    pcm: W,
    next_alloc: u32,
    next_signal: i32,
    make_library_slot: u32,
    add_task_slot: u32,
    input_served: bool,
}

impl<W: Write> NarratorAbi<W> {
    pub fn new(phonetic: &str, pcm: W, trampoline: Trampoline) -> Self {
        let mut input = phonetic.as_bytes().to_vec();
        input.truncate(narrator::INPUT_WINDOW);
        NarratorAbi {
            input,
            pcm,
            next_alloc: narrator::ALLOC_START,
            next_signal: narrator::FIRST_SIGNAL,
            make_library_slot: trampoline.make_library_slot,
            add_task_slot: trampoline.add_task_slot,
            input_served: false,
        }
    }

    pub fn into_pcm(self) -> W {
        self.pcm
    }

    fn dispatch(&mut self, core: &mut EmuCore, offset: u16) -> Result<Flow, Error> {
        // Make the call slot return, and put the exec base back in A6
        // (guest code is free to have loaded another library base there).
        core.mem
            .write_u16(JUMP_TABLE_BASE + u32::from(offset), OP_RTS);
        core.dar[reg::A6] = narrator::EXEC_BASE;

        let vector = ExecVector::from_offset(offset).ok_or(AbiError::UnknownVector {
            offset,
            pc: core.pc,
        })?;

        match vector {
            ExecVector::MakeLibrary => self.make_library(core),
            ExecVector::AllocMem => self.alloc_mem(core),
            ExecVector::FreeMem => {
                debug!(
                    "{vector} memoryBlock {:x} byteSize {:x}",
                    core.dar[reg::A1],
                    core.dar[reg::D0]
                );
            }
            ExecVector::AllocSignal => self.alloc_signal(core),
            ExecVector::FreeSignal => {
                debug!("{vector} signalNum {:x}", core.dar[reg::D0]);
            }
            ExecVector::FindTask => {
                let a1 = core.dar[reg::A1];
                let name = if a1 != 0 {
                    core.mem.read_cstr(a1, 256)
                } else {
                    String::from("(a1 is 0)")
                };
                debug!("{vector} {a1:x} '{name}'");
                core.dar[reg::D0] = narrator::TASK_BASE;
            }
            ExecVector::AddTask => self.add_task(core),
            ExecVector::SetTaskPri => {
                debug!(
                    "{vector} task {:x} priority {:x}",
                    core.dar[reg::A1],
                    core.dar[reg::D0]
                );
            }
            ExecVector::AddDevice => {
                debug!("{vector} device {:x}", core.dar[reg::A1]);
            }
            ExecVector::OpenDevice => self.open_device(core),
            ExecVector::PutMsg => {
                debug!(
                    "{vector} port {:x} message {:x}",
                    core.dar[reg::A0],
                    core.dar[reg::A1]
                );
            }
            ExecVector::ReplyMsg => return self.reply_msg(core),
            ExecVector::GetMsg => self.get_msg(core),
            ExecVector::Wait => self.wait(core),
            ExecVector::Signal => {
                debug!(
                    "{vector} task {:x} signalSet {:x}",
                    core.dar[reg::A1],
                    core.dar[reg::D0]
                );
            }
            ExecVector::DoIo => self.do_io(core),
            ExecVector::WaitIo => {
                debug!("{vector} ioRequest {:x}", core.dar[reg::A1]);
                core.dar[reg::D0] = 0;
            }
            ExecVector::DeviceBeginIo => self.begin_io(core)?,
        }
        Ok(Flow::Continue)
    }

    fn make_library(&mut self, core: &mut EmuCore) {
        let vectors = core.dar[reg::A0];
        debug!(
            "MakeLibrary (-$54) vectors {vectors:x} structure {:x} init {:x} dSize {:x} segList {:x}",
            core.dar[reg::A1],
            core.dar[reg::A2],
            core.dar[reg::D0],
            core.dar[reg::D1]
        );
        core.dar[reg::D0] = narrator::LIBRARY_BASE;

        // The first vector is the library's Open entry point; the boot
        // program calls it through the patched slot.
        for i in 0..8u32 {
            let vector = core.mem.read_u32(vectors + 4 * i);
            if vector == 0xFFFF_FFFF {
                debug!("end of vectors");
                break;
            }
            debug!("vector[{i}] = {vector:x}");
            if i == 0 {
                debug!("open function {vector:x}");
                core.mem.write_u32(self.make_library_slot, vector);
            }
        }
    }

    fn alloc_mem(&mut self, core: &mut EmuCore) {
        let byte_size = core.dar[reg::D0];
        debug!(
            "AllocMem (-$c6) byteSize {byte_size:x} attributes {:x} alloc_mem {:x}",
            core.dar[reg::D1],
            self.next_alloc
        );
        core.dar[reg::D0] = self.next_alloc;
        // Requests round up to a longword multiple, keeping every
        // returned pointer 4-byte aligned.
        let rounded = byte_size.div_ceil(4) * 4;
        self.next_alloc = self.next_alloc.wrapping_add(rounded);
    }

    fn alloc_signal(&mut self, core: &mut EmuCore) {
        debug!(
            "AllocSignal (-$14a) signalNum {:x} alloc_signal {:x}",
            core.dar[reg::D0],
            self.next_signal
        );
        core.dar[reg::D0] = self.next_signal as u32;
        self.next_signal -= 1;
    }

    fn add_task(&mut self, core: &mut EmuCore) {
        let initial_pc = core.dar[reg::A2];
        debug!(
            "AddTask (-$11a) task {:x} initialPC {initial_pc:x} finalPC {:x}",
            core.dar[reg::A1],
            core.dar[reg::A3]
        );
        core.dar[reg::D0] = narrator::TASK_BASE;
        core.mem.write_u32(self.add_task_slot, initial_pc);
    }

    fn open_device(&mut self, core: &mut EmuCore) {
        let name = core.dar[reg::A0];
        let request = core.dar[reg::A1];
        debug!(
            "OpenDevice (-$1bc) devName {name:x} '{}' unit {:x} ioRequest {request:x} flags {:x}",
            core.mem.read_cstr(name, 256),
            core.dar[reg::D0],
            core.dar[reg::D1]
        );
        core.dar[reg::D0] = 0;
        core.mem
            .write_u32(request + ioa::MN_REPLY_PORT, narrator::AUDIO_MSG_PORT);
    }

    fn get_msg(&mut self, core: &mut EmuCore) {
        debug!("GetMsg (-$174) port {:x}", core.dar[reg::A0]);
        let block = narrator::REQUEST_BLOCK;

        core.mem.write_bytes(narrator::INPUT_BASE, &self.input);
        core.mem.write_u16(block + rb::IO_COMMAND, cmd::WRITE);
        core.mem.write_u32(block + rb::IO_OFFSET, 0);
        core.mem.write_u32(block + rb::IO_DATA, narrator::INPUT_BASE);
        core.mem
            .write_u32(block + rb::IO_LENGTH, self.input.len() as u32);
        core.mem.write_u16(block + rb::RATE, voice::RATE);
        core.mem.write_u16(block + rb::PITCH, voice::PITCH);
        core.mem.write_u16(block + rb::MODE, voice::MODE);
        core.mem.write_u16(block + rb::SEX, voice::SEX);
        core.mem.write_u16(block + rb::VOLUME, voice::VOLUME);
        core.mem
            .write_u16(block + rb::SAMP_FREQ, voice::SAMPLE_FREQUENCY);

        for (i, &mask) in voice::CHANNEL_MASKS.iter().enumerate() {
            core.mem
                .write_u8(narrator::AUDIO_CHAN_MASKS + i as u32, mask);
        }
        core.mem
            .write_u32(block + rb::CH_MASKS, narrator::AUDIO_CHAN_MASKS);
        core.mem
            .write_u16(block + rb::NM_MASKS, voice::CHANNEL_MASKS.len() as u16);
        core.mem.write_u8(block + rb::IO_ERROR, 0);

        self.input_served = true;
        core.dar[reg::D0] = block;
    }

    fn wait(&mut self, core: &mut EmuCore) {
        let a2 = core.dar[reg::A2];
        debug!(
            "Wait (-$13e) signalSet {:x} A2 {a2:x} (A2+0x22) {:x}",
            core.dar[reg::D0],
            core.mem.read_u32(a2 + 0x22)
        );
        // The waiting task polls its message queue relative to A2; point
        // it back at the library base it expects.
        core.dar[reg::A2] = narrator::LIBRARY_BASE;
    }

    fn do_io(&mut self, core: &mut EmuCore) {
        let request = core.dar[reg::A1];
        let command = self.trace_io_request("DoIO (-$1c8)", core, request);
        match command {
            cmd::STOP => debug!("DoIO CMD_STOP"),
            cmd::START => debug!("DoIO CMD_START"),
            cmd::FREE => {
                debug!(
                    "DoIO ADCMD_FREE mn_ReplyPort {:x} io_Device {:x}",
                    core.mem.read_u32(request + ioa::MN_REPLY_PORT),
                    core.mem.read_u32(request + ioa::IO_DEVICE)
                );
                core.mem.write_u8(request + ioa::IO_ERROR, 0);
            }
            _ => {}
        }
        core.dar[reg::D0] = 0;
    }

    fn begin_io(&mut self, core: &mut EmuCore) -> Result<(), Error> {
        let request = core.dar[reg::A1];
        let command = self.trace_io_request("BeginIO (-$1e)", core, request);
        if command == cmd::ALLOCATE {
            debug!("BeginIO ADCMD_ALLOCATE");
            core.mem.write_u8(request + ioa::IO_ERROR, 0);
            core.mem.write_u32(request + ioa::IO_UNIT, 0x8);
            core.mem.write_u16(request + ioa::ALLOC_KEY, 0xAAAA);
        } else {
            // Anything else is a sample write. Known device builds only
            // ever pass CMD_WRITE here.
            debug!("BeginIO CMD_WRITE");
            let data = core.mem.read_u32(request + ioa::DATA);
            let length = core.mem.read_u32(request + ioa::LENGTH);
            let mut samples = Vec::with_capacity(length as usize);
            for i in 0..length {
                samples.push(core.mem.read_u8(data + i));
            }
            self.pcm.write_all(&samples)?;
        }
        Ok(())
    }

    fn reply_msg(&mut self, core: &mut EmuCore) -> Result<Flow, Error> {
        debug!("ReplyMsg (-$17a) message {:x}", core.dar[reg::A1]);
        if !self.input_served {
            return Err(AbiError::ReplyBeforeGetMsg { pc: core.pc }.into());
        }
        let io_error = core
            .mem
            .read_u8(narrator::REQUEST_BLOCK + rb::IO_ERROR);
        debug!("ReplyMsg io_Error {io_error:x}");
        Ok(Flow::Halt(Halt::GuestReply { io_error }))
    }

    fn trace_io_request(&self, what: &str, core: &EmuCore, request: u32) -> u16 {
        let command = core.mem.read_u16(request + ioa::IO_COMMAND);
        debug!(
            "{what} ioRequest {request:x} io_Unit {:x} io_Command {command:x} io_Flags {:x} io_Error {:x} \
             ioa_Data {:x} ioa_Length {:x} ioa_Period {:x} ioa_Volume {:x} ioa_Cycles {:x}",
            core.mem.read_u32(request + ioa::IO_UNIT),
            core.mem.read_u8(request + ioa::IO_FLAGS),
            core.mem.read_u8(request + ioa::IO_ERROR),
            core.mem.read_u32(request + ioa::DATA),
            core.mem.read_u32(request + ioa::LENGTH),
            core.mem.read_u16(request + ioa::PERIOD),
            core.mem.read_u16(request + ioa::VOLUME),
            core.mem.read_u16(request + ioa::CYCLES),
        );
        command
    }
}

impl<W: Write> StepObserver for NarratorAbi<W> {
    fn before_step(&mut self, core: &mut EmuCore) -> Result<Flow, Error> {
        let opcode = core.mem.read_u16(core.pc);
        if opcode == OP_JSR_D16_A6 {
            let offset = core.mem.read_u16(core.pc + 2);
            debug!(
                "jsr {offset:x}(a6) at pc {:x}, A6 {:x}",
                core.pc,
                core.dar[reg::A6]
            );
            self.dispatch(core, offset)
        } else if opcode == OP_STOP {
            debug!("stop at pc {:#x}", core.pc);
            Ok(Flow::Halt(Halt::Stopped))
        } else {
            Ok(Flow::Continue)
        }
    }
}
