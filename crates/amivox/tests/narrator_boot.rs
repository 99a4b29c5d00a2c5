//! Boots a hand-assembled narrator device image through the full host:
//! hunk load, ROMTag decode, trampoline, and the complete library-call
//! sequence rt_Init → MakeLibrary → AddTask → task → Wait → GetMsg →
//! BeginIO(CMD_WRITE) → ReplyMsg.

use amivox::machine::Halt;
use amivox::run_narrator;

const HUNK_CODE: u32 = 0x3E9;
const HUNK_RELOC32: u32 = 0x3EC;
const HUNK_END: u32 = 0x3F2;
const HUNK_HEADER: u32 = 0x3F3;

const PCM_PAYLOAD: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0xFC, 0xFE, 0x80, 0x7F];

struct Asm(Vec<u8>);

impl Asm {
    fn new(size: usize) -> Self {
        Asm(vec![0; size])
    }

    fn w16(&mut self, at: usize, v: u16) {
        self.0[at..at + 2].copy_from_slice(&v.to_be_bytes());
    }

    fn w32(&mut self, at: usize, v: u32) {
        self.0[at..at + 4].copy_from_slice(&v.to_be_bytes());
    }

    fn bytes(&mut self, at: usize, v: &[u8]) {
        self.0[at..at + v.len()].copy_from_slice(v);
    }
}

/// A minimal but real narrator device: resident descriptor at offset 4,
/// an init routine that registers the library, an Open entry that spawns
/// the speech task, and a task that asks for work and "synthesizes" a
/// fixed sample block.
fn device_code() -> Vec<u8> {
    let mut asm = Asm::new(0x108);

    // Resident descriptor (the host looks for it at RAM address 4).
    asm.w16(0x04, 0x4AFC); // rt_MatchWord
    asm.w32(0x06, 0x0000_0004); // rt_MatchTag
    asm.w32(0x0A, 0x0000_0108); // rt_EndSkip
    asm.w16(0x0E, 0x8225); // rt_Flags AUTOINIT|SINGLETASK, rt_Version 37
    asm.w16(0x10, 0x0300); // rt_Type NT_DEVICE, rt_Pri 0
    asm.w32(0x12, 0x0000_0040); // rt_Name
    asm.w32(0x16, 0x0000_0040); // rt_IdString
    asm.w32(0x1A, 0x0000_0060); // rt_Init

    asm.bytes(0x40, b"narrator.device\0");

    // rt_Init: register the device's vector table.
    asm.w16(0x60, 0x207C); // movea.l #$100,a0
    asm.w32(0x62, 0x0000_0100);
    asm.w16(0x66, 0x4EAE); // jsr -$54(a6)     ; MakeLibrary
    asm.w16(0x68, 0xFFAC);
    asm.w16(0x6A, 0x4E75); // rts

    // Open (vector 0): hand the speech task to the scheduler.
    asm.w16(0x70, 0x247C); // movea.l #$80,a2
    asm.w32(0x72, 0x0000_0080);
    asm.w16(0x76, 0x4EAE); // jsr -$11a(a6)    ; AddTask
    asm.w16(0x78, 0xFEE6);
    asm.w16(0x7A, 0x4E75); // rts

    // Speech task: wait for a request, fetch it, point it at the
    // "synthesized" samples, write them, reply.
    asm.w16(0x80, 0x4EAE); // jsr -$13e(a6)    ; Wait
    asm.w16(0x82, 0xFEC2);
    asm.w16(0x84, 0x4EAE); // jsr -$174(a6)    ; GetMsg
    asm.w16(0x86, 0xFE8C);
    asm.w16(0x88, 0x2240); // movea.l d0,a1
    asm.w16(0x8A, 0x237C); // move.l #$c0,$22(a1)  ; ioa_Data
    asm.w32(0x8C, 0x0000_00C0);
    asm.w16(0x90, 0x0022);
    asm.w16(0x92, 0x237C); // move.l #8,$26(a1)    ; ioa_Length
    asm.w32(0x94, 0x0000_0008);
    asm.w16(0x98, 0x0026);
    asm.w16(0x9A, 0x4EAE); // jsr -$1e(a6)     ; BeginIO
    asm.w16(0x9C, 0xFFE2);
    asm.w16(0x9E, 0x4EAE); // jsr -$17a(a6)    ; ReplyMsg
    asm.w16(0xA0, 0xFE86);
    asm.w16(0xA2, 0x4E75); // rts

    asm.bytes(0xC0, &PCM_PAYLOAD);

    // Device vector table: Open, then the terminator.
    asm.w32(0x100, 0x0000_0070);
    asm.w32(0x104, 0xFFFF_FFFF);

    asm.0
}

/// Wrap the code in a single-hunk load file. The relocation table lists
/// the absolute-operand longwords; hunk 0 loads at base 0, so replaying
/// it must not change the image.
fn device_image(code: &[u8], relocs: &[u32]) -> Vec<u8> {
    let mut image = Vec::new();
    for v in [
        HUNK_HEADER,
        0,
        1, // one hunk
        0,
        0,
        code.len() as u32 / 4,
        HUNK_CODE,
        code.len() as u32 / 4,
    ] {
        image.extend_from_slice(&v.to_be_bytes());
    }
    image.extend_from_slice(code);
    image.extend_from_slice(&HUNK_RELOC32.to_be_bytes());
    if !relocs.is_empty() {
        image.extend_from_slice(&(relocs.len() as u32).to_be_bytes());
        image.extend_from_slice(&0u32.to_be_bytes()); // against hunk 0
        for &r in relocs {
            image.extend_from_slice(&r.to_be_bytes());
        }
    }
    image.extend_from_slice(&0u32.to_be_bytes());
    image.extend_from_slice(&HUNK_END.to_be_bytes());
    image
}

#[test]
fn narrator_boot_sequence_streams_pcm_and_replies() {
    let image = device_image(&device_code(), &[0x62, 0x72]);
    let mut pcm = Vec::new();

    let halt = run_narrator(&image, "/HEH4LOW WER4LD.", &mut pcm).unwrap();

    assert_eq!(halt, Halt::GuestReply { io_error: 0 });
    assert_eq!(pcm, PCM_PAYLOAD);
}

#[test]
fn narrator_rejects_an_image_with_a_bad_hunk_tag() {
    let mut image = Vec::new();
    for v in [HUNK_HEADER, 0, 1, 0, 0, 1, 0xDEAD_BEEF] {
        image.extend_from_slice(&v.to_be_bytes());
    }
    let err = run_narrator(&image, "/OW.", &mut Vec::new()).unwrap_err();
    assert!(err.to_string().contains("unhandled hunk type"));
}
