//! Fixed addresses of everything the host fabricates in emulated RAM,
//! plus the field offsets of the request-block records exchanged with the
//! guest. All values lie outside the region the bump allocator hands out.

/// ln_Type value for a message node.
pub const NT_MESSAGE: u8 = 5;

/// Memory map of the narrator host.
pub mod narrator {
    pub const RAM_SIZE: usize = 16 * 1024 * 1024;

    /// Where the resident descriptor of a narrator device lands.
    pub const ROMTAG_BASE: u32 = 4;

    pub const STACK_POINTER: u32 = 0x1F000;
    pub const EXEC_BASE: u32 = 0x20000;
    pub const REQUEST_BLOCK: u32 = 0x22000;
    pub const MSG_PORT: u32 = 0x22800;
    pub const AUDIO_MSG_PORT: u32 = 0x22C00;
    pub const LIBRARY_BASE: u32 = 0x23000;
    pub const AUDIO_CHAN_MASKS: u32 = 0x24000;
    pub const TASK_BASE: u32 = 0x25000;
    pub const TRAMPOLINE: u32 = 0x26000;
    pub const LIBRARY_NAME: u32 = 0x27000;
    pub const INPUT_BASE: u32 = 0x28000;

    /// First address the bump allocator hands out.
    pub const ALLOC_START: u32 = 0x100000;
    /// Highest signal number; AllocSignal counts down from here.
    pub const FIRST_SIGNAL: i32 = 31;

    pub const INPUT_WINDOW: usize = 0x1000;
    pub const DEVICE_NAME: &str = "narrator.device";
}

/// Memory map of the translator host.
pub mod translator {
    pub const RAM_SIZE: usize = 1024 * 1024;

    pub const ROMTAG_BASE: u32 = 0;
    pub const LIBRARY_BASE: u32 = 0x4000;
    pub const INPUT_BASE: u32 = 0x5000;
    pub const OUTPUT_BASE: u32 = 0x6000;
    pub const TRAMPOLINE: u32 = 0x7000;
    pub const STACK_POINTER: u32 = 0xF000;

    pub const INPUT_WINDOW: usize = 0x1000;
    pub const OUTPUT_WINDOW: u32 = 0x1000;

    /// Translate entry of known library builds, used when no resident
    /// descriptor is present to walk.
    pub const FALLBACK_TRANSLATE: u32 = 0x134;

    pub const LIBRARY_NAME: &str = "translator.library";
}

/// Field offsets within the 70-byte narrator request block.
pub mod rb {
    pub const LN_TYPE: u32 = 8;
    pub const MN_REPLY_PORT: u32 = 14;
    pub const MN_LENGTH: u32 = 18;
    pub const IO_DEVICE: u32 = 20;
    pub const IO_COMMAND: u32 = 28;
    pub const IO_ERROR: u32 = 31;
    pub const IO_LENGTH: u32 = 36;
    pub const IO_DATA: u32 = 40;
    pub const IO_OFFSET: u32 = 44;
    pub const RATE: u32 = 48;
    pub const PITCH: u32 = 50;
    pub const MODE: u32 = 52;
    pub const SEX: u32 = 54;
    pub const CH_MASKS: u32 = 56;
    pub const NM_MASKS: u32 = 60;
    pub const VOLUME: u32 = 62;
    pub const SAMP_FREQ: u32 = 64;

    /// mn_Length of the old (version 1.x) narrator request block.
    pub const SIZE: u16 = 70;
}

/// Field offsets of the IOAudio request view used by DoIO and BeginIO.
pub mod ioa {
    pub const MN_REPLY_PORT: u32 = 14;
    pub const IO_DEVICE: u32 = 20;
    pub const IO_UNIT: u32 = 24;
    pub const IO_COMMAND: u32 = 28;
    pub const IO_FLAGS: u32 = 30;
    pub const IO_ERROR: u32 = 31;
    pub const ALLOC_KEY: u32 = 32;
    pub const DATA: u32 = 34;
    pub const LENGTH: u32 = 38;
    pub const PERIOD: u32 = 42;
    pub const VOLUME: u32 = 44;
    pub const CYCLES: u32 = 46;
}

/// Device command words seen in io_Command.
pub mod cmd {
    pub const WRITE: u16 = 3;
    pub const STOP: u16 = 6;
    pub const START: u16 = 7;
    pub const FREE: u16 = 9;
    pub const ALLOCATE: u16 = 32;
}

/// Voice parameters GetMsg seeds into the request block.
pub mod voice {
    pub const RATE: u16 = 150;
    pub const PITCH: u16 = 110;
    /// 0 natural, 1 robotic, 2 manual.
    pub const MODE: u16 = 0;
    /// 0 male, 1 female.
    pub const SEX: u16 = 0;
    /// 0..=64.
    pub const VOLUME: u16 = 64;
    pub const SAMPLE_FREQUENCY: u16 = 22200;
    /// Audio allocation candidates: stereo pairs in either order.
    pub const CHANNEL_MASKS: [u8; 4] = [3, 5, 10, 12];
}
