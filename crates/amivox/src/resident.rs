use bitflags::bitflags;
use log::debug;
use thiserror::Error;

use crate::mem::EmulatedRam;

/// rt_MatchWord: marks a resident (ROMTag) descriptor.
pub const RT_MATCHWORD: u16 = 0x4AFC;

/// Vector-table index of a translator library's Translate entry point.
pub const TRANSLATE_VECTOR_INDEX: usize = 4;

const NAME_TRACE_LIMIT: usize = 256;

bitflags! {
    /// rt_Flags bits of a resident descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResidentFlags: u8 {
        /// Library construction goes through a four-field auto-init table.
        const AUTOINIT = 0x80;
        const AFTERDOS = 0x04;
        const SINGLETASK = 0x02;
        const COLDSTART = 0x01;
    }
}

/// Errors from resident descriptor decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResidentError {
    /// The descriptor lacks RTF_AUTOINIT, so there is no vector table to walk.
    #[error("resident tag at {base:#x} has no RTF_AUTOINIT flag, cannot locate its vector table")]
    AutoInitRequired { base: u32 },

    /// The vector table ended before the requested entry.
    #[error("vector table at {table:#x} has no entry {index}")]
    MissingVector { table: u32, index: usize },
}

/// A decoded resident (ROMTag) descriptor.
///
/// Field layout within the tag: match word at +0, match tag at +2,
/// end skip at +6, flags/version/type/priority at +10..+14, then the
/// name, id-string, and init pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomTag {
    pub base: u32,
    pub match_tag: u32,
    pub end_skip: u32,
    pub flags: ResidentFlags,
    pub version: u8,
    pub node_type: u8,
    pub priority: i8,
    pub name: u32,
    pub id_string: u32,
    pub init: u32,
}

impl RomTag {
    /// Decode the resident descriptor at `base`, if its match word is there.
    pub fn find(ram: &EmulatedRam, base: u32) -> Option<RomTag> {
        if ram.read_u16(base) != RT_MATCHWORD {
            return None;
        }
        let tag = RomTag {
            base,
            match_tag: ram.read_u32(base + 2),
            end_skip: ram.read_u32(base + 6),
            flags: ResidentFlags::from_bits_retain(ram.read_u8(base + 10)),
            version: ram.read_u8(base + 11),
            node_type: ram.read_u8(base + 12),
            priority: ram.read_u8(base + 13) as i8,
            name: ram.read_u32(base + 14),
            id_string: ram.read_u32(base + 18),
            init: ram.read_u32(base + 22),
        };
        tag.trace(ram);
        Some(tag)
    }

    fn trace(&self, ram: &EmulatedRam) {
        debug!("rt_MatchWord {RT_MATCHWORD:#x} at {:#x}", self.base);
        debug!("rt_MatchTag {:#x}", self.match_tag);
        debug!("rt_EndSkip {:#x}", self.end_skip);
        debug!("rt_Flags {:#x} ({:?})", self.flags.bits(), self.flags);
        debug!("rt_Version {:#x}", self.version);
        debug!("rt_Type {:#x}", self.node_type);
        debug!("rt_Pri {}", self.priority);
        debug!(
            "rt_Name {:#x} '{}'",
            self.name,
            ram.read_cstr(self.name, NAME_TRACE_LIMIT)
        );
        debug!(
            "rt_IdString {:#x} '{}'",
            self.id_string,
            ram.read_cstr(self.id_string, NAME_TRACE_LIMIT)
        );
        debug!("rt_Init {:#x}", self.init);
    }
}

/// The four-field table rt_Init points at when RTF_AUTOINIT is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoInitTable {
    pub data_size: u32,
    pub vectors: u32,
    pub structure: u32,
    pub init_function: u32,
}

impl AutoInitTable {
    pub fn read(ram: &EmulatedRam, init: u32) -> Self {
        let table = AutoInitTable {
            data_size: ram.read_u32(init),
            vectors: ram.read_u32(init + 4),
            structure: ram.read_u32(init + 8),
            init_function: ram.read_u32(init + 12),
        };
        debug!("autoinit dataSize {:#x}", table.data_size);
        debug!("autoinit vectors {:#x}", table.vectors);
        debug!("autoinit structure {:#x}", table.structure);
        debug!("autoinit initFunction {:#x}", table.init_function);
        table
    }
}

/// Resolve entry `index` of the vector table at `table` to an absolute
/// address.
///
/// Two encodings exist: a packed array of 32-bit absolute addresses
/// terminated by 0xFFFFFFFF, and — when the first 16-bit word is 0xFFFF —
/// 16-bit offsets relative to the table itself, terminated by 0xFFFF.
pub fn vector_entry(ram: &EmulatedRam, table: u32, index: usize) -> Option<u32> {
    if ram.read_u16(table) == 0xFFFF {
        for i in 0.. {
            let offset = ram.read_u16(table + 2 + 2 * i as u32);
            if offset == 0xFFFF {
                return None;
            }
            let vector = table.wrapping_add(u32::from(offset));
            debug!("vector[{i}] {offset:#x} -> {vector:#x}");
            if i == index {
                return Some(vector);
            }
        }
        unreachable!()
    } else {
        for i in 0.. {
            let vector = ram.read_u32(table + 4 * i as u32);
            if vector == 0xFFFF_FFFF {
                return None;
            }
            debug!("vector[{i}] {vector:#x}");
            if i == index {
                return Some(vector);
            }
        }
        unreachable!()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ram_with_tag(flags: u8) -> EmulatedRam {
        let mut ram = EmulatedRam::new(0x1000);
        let base = 4;
        ram.write_u16(base, RT_MATCHWORD);
        ram.write_u32(base + 2, base);
        ram.write_u32(base + 6, 0x200);
        ram.write_u8(base + 10, flags);
        ram.write_u8(base + 11, 37);
        ram.write_u8(base + 12, 3);
        ram.write_u8(base + 13, 0xFB); // priority -5
        ram.write_u32(base + 14, 0x100);
        ram.write_u32(base + 18, 0x120);
        ram.write_u32(base + 22, 0x140);
        ram.write_bytes(0x100, b"narrator.device\0");
        ram
    }

    #[test]
    fn decodes_descriptor_fields() {
        let ram = ram_with_tag(0x82);
        let tag = RomTag::find(&ram, 4).unwrap();
        assert_eq!(tag.match_tag, 4);
        assert_eq!(tag.end_skip, 0x200);
        assert!(tag.flags.contains(ResidentFlags::AUTOINIT));
        assert!(tag.flags.contains(ResidentFlags::SINGLETASK));
        assert!(!tag.flags.contains(ResidentFlags::COLDSTART));
        assert_eq!(tag.version, 37);
        assert_eq!(tag.priority, -5);
        assert_eq!(tag.name, 0x100);
        assert_eq!(tag.init, 0x140);
    }

    #[test]
    fn absent_match_word_finds_nothing() {
        let ram = EmulatedRam::new(0x100);
        assert!(RomTag::find(&ram, 4).is_none());
        // Tag at a different base is not seen at 4.
        let ram = ram_with_tag(0x80);
        assert!(RomTag::find(&ram, 0).is_none());
    }

    #[test]
    fn absolute_vector_table_lookup() {
        let mut ram = EmulatedRam::new(0x1000);
        let table = 0x200;
        for (i, v) in [0x300u32, 0x310, 0x320, 0x330, 0x340].iter().enumerate() {
            ram.write_u32(table + 4 * i as u32, *v);
        }
        ram.write_u32(table + 20, 0xFFFF_FFFF);

        assert_eq!(vector_entry(&ram, table, 0), Some(0x300));
        assert_eq!(vector_entry(&ram, table, 4), Some(0x340));
        assert_eq!(vector_entry(&ram, table, 5), None);
    }

    #[test]
    fn relative_vector_table_lookup() {
        let mut ram = EmulatedRam::new(0x1000);
        let table = 0x200;
        ram.write_u16(table, 0xFFFF);
        for (i, off) in [0x10u16, 0x14, 0x18, 0x1C, 0x20].iter().enumerate() {
            ram.write_u16(table + 2 + 2 * i as u32, *off);
        }
        ram.write_u16(table + 12, 0xFFFF);

        // Entries resolve relative to the table base.
        assert_eq!(vector_entry(&ram, table, 0), Some(0x210));
        assert_eq!(vector_entry(&ram, table, TRANSLATE_VECTOR_INDEX), Some(0x220));
        assert_eq!(vector_entry(&ram, table, 5), None);
    }

    #[test]
    fn autoinit_table_reads_four_longwords() {
        let mut ram = EmulatedRam::new(0x1000);
        ram.write_u32(0x140, 0x1C);
        ram.write_u32(0x144, 0x400);
        ram.write_u32(0x148, 0);
        ram.write_u32(0x14C, 0x500);
        let table = AutoInitTable::read(&ram, 0x140);
        assert_eq!(table.data_size, 0x1C);
        assert_eq!(table.vectors, 0x400);
        assert_eq!(table.structure, 0);
        assert_eq!(table.init_function, 0x500);
    }
}
