use log::{debug, trace};
use r68k::cpu::ConfiguredCore;
use r68k::interrupts::AutoInterruptController;

use crate::error::Error;
use crate::mem::EmulatedRam;

/// jsr d16(A6) — the library-call instruction pattern.
pub const OP_JSR_D16_A6: u16 = 0x4EAE;
/// stop — the trampoline's halt instruction.
pub const OP_STOP: u16 = 0x4E72;
/// rts — patched into a library jump-table slot once its call is serviced.
pub const OP_RTS: u16 = 0x4E75;

/// Register-file indices into the core's combined data/address array.
pub mod reg {
    pub const D0: usize = 0;
    pub const D1: usize = 1;
    pub const A0: usize = 8;
    pub const A1: usize = 9;
    pub const A2: usize = 10;
    pub const A3: usize = 11;
    pub const A6: usize = 14;
    pub const SP: usize = 15;
}

/// The configured 68000 core: interpreter plus our RAM on its bus.
pub type EmuCore = ConfiguredCore<AutoInterruptController, EmulatedRam>;

/// Why the run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The guest reached the trampoline's `stop` instruction.
    Stopped,
    /// The guest replied its request block back to the host.
    GuestReply { io_error: u8 },
}

/// What the observer decided for the instruction about to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt(Halt),
}

/// Host-side interception point, invoked before every instruction.
///
/// The observer may read and write RAM and registers freely, but must not
/// advance the program counter; returning `Flow::Continue` lets the core
/// execute the instruction at PC as it stands.
pub trait StepObserver {
    fn before_step(&mut self, core: &mut EmuCore) -> Result<Flow, Error>;
}

/// Observer for guests that make no library calls: it only watches for
/// the trampoline's `stop`.
pub struct StopWatcher;

impl StepObserver for StopWatcher {
    fn before_step(&mut self, core: &mut EmuCore) -> Result<Flow, Error> {
        if core.mem.read_u16(core.pc) == OP_STOP {
            debug!("stop at pc {:#x}", core.pc);
            return Ok(Flow::Halt(Halt::Stopped));
        }
        Ok(Flow::Continue)
    }
}

/// A 68000 machine: the interpreter core and the fetch/execute loop.
pub struct Machine {
    pub core: EmuCore,
}

impl Machine {
    /// Build a machine around an already-populated RAM. The caller seeds
    /// PC and registers before running.
    pub fn new(ram: EmulatedRam) -> Self {
        Machine {
            core: ConfiguredCore::new_with(0, AutoInterruptController::new(), ram),
        }
    }

    pub fn ram(&self) -> &EmulatedRam {
        &self.core.mem
    }

    pub fn ram_mut(&mut self) -> &mut EmulatedRam {
        &mut self.core.mem
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.core.pc = pc;
    }

    pub fn set_reg(&mut self, index: usize, value: u32) {
        self.core.dar[index] = value;
    }

    /// Run until the observer halts the machine or reports an error.
    /// Each iteration logs a register snapshot, gives the observer its
    /// look at the instruction at PC, then executes exactly one
    /// instruction.
    pub fn run(&mut self, observer: &mut impl StepObserver) -> Result<Halt, Error> {
        loop {
            self.trace_step();
            match observer.before_step(&mut self.core)? {
                Flow::Halt(halt) => return Ok(halt),
                Flow::Continue => {}
            }
            self.core.execute1();
        }
    }

    fn trace_step(&self) {
        if log::log_enabled!(log::Level::Trace) {
            let c = &self.core;
            trace!(
                "execute {:06x}: {:04x} (SP={:x} D0={:x} D1={:x} A0={:x} A1={:x} A2={:x} A3={:x} A4={:x} A5={:x} A6={:x})",
                c.pc,
                c.mem.read_u16(c.pc),
                c.dar[reg::SP],
                c.dar[reg::D0],
                c.dar[reg::D1],
                c.dar[8],
                c.dar[9],
                c.dar[10],
                c.dar[11],
                c.dar[12],
                c.dar[13],
                c.dar[14],
            );
        }
    }
}
