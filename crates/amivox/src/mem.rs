use log::warn;
use r68k::ram::{AddressBus, AddressSpace};

/// Flat emulated RAM for the 68000 guest.
///
/// All multi-byte accesses are big-endian (68k native byte order). Every
/// access is bounds-checked: out-of-range reads return zero and
/// out-of-range writes are dropped, each with a stderr diagnostic, so a
/// misbehaving guest cannot take the host down.
pub struct EmulatedRam {
    bytes: Vec<u8>,
}

impl EmulatedRam {
    pub fn new(size: usize) -> Self {
        EmulatedRam {
            bytes: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn read_u8(&self, addr: u32) -> u8 {
        match self.bytes.get(addr as usize) {
            Some(&b) => b,
            None => {
                warn!("read8 {addr:#x} out of bounds");
                0
            }
        }
    }

    pub fn read_u16(&self, addr: u32) -> u16 {
        let addr = addr as usize;
        match self.bytes.get(addr..addr + 2) {
            Some(b) => u16::from_be_bytes([b[0], b[1]]),
            None => {
                warn!("read16 {addr:#x} out of bounds");
                0
            }
        }
    }

    pub fn read_u32(&self, addr: u32) -> u32 {
        let addr = addr as usize;
        match self.bytes.get(addr..addr + 4) {
            Some(b) => u32::from_be_bytes([b[0], b[1], b[2], b[3]]),
            None => {
                warn!("read32 {addr:#x} out of bounds");
                0
            }
        }
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) {
        match self.bytes.get_mut(addr as usize) {
            Some(b) => *b = value,
            None => warn!("write8 {addr:#x} out of bounds (dropped)"),
        }
    }

    pub fn write_u16(&mut self, addr: u32, value: u16) {
        let addr = addr as usize;
        match self.bytes.get_mut(addr..addr + 2) {
            Some(b) => b.copy_from_slice(&value.to_be_bytes()),
            None => warn!("write16 {addr:#x} out of bounds (dropped)"),
        }
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) {
        let addr = addr as usize;
        match self.bytes.get_mut(addr..addr + 4) {
            Some(b) => b.copy_from_slice(&value.to_be_bytes()),
            None => warn!("write32 {addr:#x} out of bounds (dropped)"),
        }
    }

    /// Copy a byte run into RAM. Bytes past the end of RAM are dropped
    /// with a diagnostic, matching the scalar write policy.
    pub fn write_bytes(&mut self, addr: u32, src: &[u8]) {
        let addr = addr as usize;
        match self.bytes.get_mut(addr..addr + src.len()) {
            Some(dst) => dst.copy_from_slice(src),
            None => {
                let avail = self.bytes.len().saturating_sub(addr);
                if avail > 0 {
                    self.bytes[addr..].copy_from_slice(&src[..avail]);
                }
                warn!(
                    "write of {} bytes at {addr:#x} truncated to {avail}",
                    src.len()
                );
            }
        }
    }

    /// Read the NUL-terminated string at `addr`, up to `max` bytes.
    /// Used for guest-supplied names in the trace; lossy on non-ASCII.
    pub fn read_cstr(&self, addr: u32, max: usize) -> String {
        let addr = addr as usize;
        let tail = self.bytes.get(addr..).unwrap_or(&[]);
        let tail = &tail[..tail.len().min(max)];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        String::from_utf8_lossy(&tail[..end]).into_owned()
    }
}

impl AddressBus for EmulatedRam {
    fn copy_from(&mut self, other: &Self) {
        self.bytes.copy_from_slice(&other.bytes);
    }

    fn read_byte(&self, _space: AddressSpace, address: u32) -> u32 {
        u32::from(self.read_u8(address))
    }

    fn read_word(&self, _space: AddressSpace, address: u32) -> u32 {
        u32::from(self.read_u16(address))
    }

    fn read_long(&self, _space: AddressSpace, address: u32) -> u32 {
        self.read_u32(address)
    }

    fn write_byte(&mut self, _space: AddressSpace, address: u32, value: u32) {
        self.write_u8(address, value as u8);
    }

    fn write_word(&mut self, _space: AddressSpace, address: u32, value: u32) {
        self.write_u16(address, value as u16);
    }

    fn write_long(&mut self, _space: AddressSpace, address: u32, value: u32) {
        self.write_u32(address, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_byte_accesses_are_big_endian() {
        let mut ram = EmulatedRam::new(16);
        ram.write_u32(0, 0x0102_0304);
        assert_eq!(ram.read_u8(0), 0x01);
        assert_eq!(ram.read_u8(3), 0x04);
        assert_eq!(ram.read_u16(0), 0x0102);
        assert_eq!(ram.read_u16(2), 0x0304);
        assert_eq!(ram.read_u32(0), 0x0102_0304);

        ram.write_u16(4, 0xBEEF);
        assert_eq!(ram.read_u8(4), 0xBE);
        assert_eq!(ram.read_u8(5), 0xEF);
    }

    #[test]
    fn out_of_bounds_reads_return_zero() {
        let mut ram = EmulatedRam::new(8);
        ram.write_bytes(0, &[0xFF; 8]);
        assert_eq!(ram.read_u8(8), 0);
        assert_eq!(ram.read_u16(7), 0);
        assert_eq!(ram.read_u32(5), 0);
        assert_eq!(ram.read_u32(0xFFFF_FFFF), 0);
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut ram = EmulatedRam::new(8);
        ram.write_u32(6, 0xAABB_CCDD);
        ram.write_u8(8, 0x11);
        // Nothing landed, nothing panicked.
        assert_eq!(ram.read_u16(6), 0);
    }

    #[test]
    fn straddling_write_is_truncated() {
        let mut ram = EmulatedRam::new(4);
        ram.write_bytes(2, &[1, 2, 3, 4]);
        assert_eq!(ram.read_u8(2), 1);
        assert_eq!(ram.read_u8(3), 2);
    }

    #[test]
    fn cstr_reads_stop_at_nul() {
        let mut ram = EmulatedRam::new(32);
        ram.write_bytes(4, b"narrator.device\0garbage");
        assert_eq!(ram.read_cstr(4, 32), "narrator.device");
        // No terminator in range: clamped to max.
        assert_eq!(ram.read_cstr(20, 3), "gar");
    }
}
