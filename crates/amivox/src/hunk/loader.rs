use log::{debug, info};

use super::error::LoadError;
use super::types::{hunk_ids, HunkType};
use crate::mem::EmulatedRam;

/// A cursor over the raw hunk file for big-endian binary parsing.
///
/// All hunk data is big-endian and longword-aligned. The cursor tracks a
/// read position and provides checked reads that return `LoadError` on
/// out-of-bounds access.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Cursor { data, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_u32_be(&mut self) -> Result<u32, LoadError> {
        if self.pos + 4 > self.data.len() {
            return Err(LoadError::TooShort {
                offset: self.pos,
                needed: 4,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + 4];
        self.pos += 4;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Where a hunk image landed in emulated RAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Base address of each content hunk, in load order.
    pub hunk_bases: Vec<u32>,
    /// First address past the loaded image.
    pub end: u32,
}

/// Load a hunk image into emulated RAM starting at address 0.
///
/// Content hunks (CODE, DATA, BSS) are laid out back to back in file
/// order; RELOC32 tables are skimmed on the first pass and replayed once
/// every hunk has its base address. Relocation offsets address the loaded
/// image directly: the longword at each offset is incremented by the base
/// of the referenced hunk.
pub fn load_image(data: &[u8], ram: &mut EmulatedRam) -> Result<LoadedImage, LoadError> {
    let mut cursor = Cursor::new(data);

    // --- HUNK_HEADER must come first ---
    let magic = cursor.read_u32_be()?;
    if magic & 0x3FFF_FFFF != hunk_ids::HUNK_HEADER {
        return Err(LoadError::MissingHeader { found: magic });
    }
    debug!("found HUNK_HEADER 0x3f3");

    // Load files carry no resident library names; the list must be empty.
    let names_offset = cursor.position();
    let names = cursor.read_u32_be()?;
    if names != 0 {
        return Err(LoadError::ResidentNames {
            value: names,
            offset: names_offset,
        });
    }

    let number_of_hunks = cursor.read_u32_be()?;
    let first_hunk = cursor.read_u32_be()?;
    let last_hunk = cursor.read_u32_be()?;
    debug!("number_of_hunks {number_of_hunks} (first {first_hunk}, last {last_hunk})");
    for i in first_hunk..=last_hunk {
        let size = cursor.read_u32_be()?;
        debug!("hunk {i} size {size:#x} longwords");
    }

    if number_of_hunks == 0 {
        info!("header declares no hunks, nothing to load");
        return Ok(LoadedImage {
            hunk_bases: Vec::new(),
            end: 0,
        });
    }

    // --- First pass: place content hunks, remember RELOC32 tables ---
    let mut hunk_bases: Vec<u32> = Vec::new();
    let mut reloc_tables: Vec<usize> = Vec::new();
    let mut memory_pos: u32 = 0;
    let mut ends_seen: u32 = 0;

    while ends_seen < number_of_hunks {
        let tag_offset = cursor.position();
        let tag = cursor.read_u32_be()?;
        let hunk_type = HunkType::from_raw(tag).ok_or(LoadError::UnknownHunkType {
            tag,
            offset: tag_offset,
        })?;
        debug!("found {hunk_type} {:#x}", tag & 0x3FFF_FFFF);

        match hunk_type {
            HunkType::Code | HunkType::Data => {
                let longwords = cursor.read_u32_be()?;
                debug!("number_of_longwords {longwords:#x}");
                if hunk_bases.len() >= number_of_hunks as usize {
                    return Err(LoadError::UnexpectedHunk {
                        index: hunk_bases.len(),
                        declared: number_of_hunks,
                    });
                }
                check_fit(memory_pos, longwords, ram.len())?;
                hunk_bases.push(memory_pos);
                for _ in 0..longwords {
                    let value = cursor.read_u32_be()?;
                    ram.write_u32(memory_pos, value);
                    memory_pos += 4;
                }
            }

            HunkType::Bss => {
                let longwords = cursor.read_u32_be()?;
                debug!("number_of_longwords {longwords:#x}");
                if hunk_bases.len() >= number_of_hunks as usize {
                    return Err(LoadError::UnexpectedHunk {
                        index: hunk_bases.len(),
                        declared: number_of_hunks,
                    });
                }
                check_fit(memory_pos, longwords, ram.len())?;
                hunk_bases.push(memory_pos);
                // RAM starts zeroed; reserving the range is enough.
                memory_pos += 4 * longwords;
            }

            HunkType::Reloc32 => {
                reloc_tables.push(cursor.position());
                skim_reloc32(&mut cursor)?;
            }

            HunkType::End => {
                ends_seen += 1;
            }

            HunkType::Header => {
                return Err(LoadError::UnknownHunkType {
                    tag,
                    offset: tag_offset,
                });
            }
        }
    }
    info!(
        "loaded {} hunks, image end {memory_pos:#x}",
        hunk_bases.len()
    );

    // --- Second pass: replay every RELOC32 table ---
    for &table in &reloc_tables {
        cursor.seek(table);
        apply_reloc32(&mut cursor, &hunk_bases, ram)?;
    }

    Ok(LoadedImage {
        hunk_bases,
        end: memory_pos,
    })
}

fn check_fit(memory_pos: u32, longwords: u32, ram_len: usize) -> Result<(), LoadError> {
    let required = u64::from(memory_pos) + 4 * u64::from(longwords);
    if required > ram_len as u64 {
        return Err(LoadError::ImageOverflow {
            required,
            available: ram_len,
        });
    }
    Ok(())
}

/// Walk a RELOC32 table without applying it: groups of
/// `(count, hunk_number, offsets...)` until a zero count.
fn skim_reloc32(cursor: &mut Cursor<'_>) -> Result<(), LoadError> {
    loop {
        let count = cursor.read_u32_be()?;
        if count == 0 {
            return Ok(());
        }
        let hunk_number = cursor.read_u32_be()?;
        debug!("reloc group: {count} offsets against hunk {hunk_number}");
        for _ in 0..count {
            cursor.read_u32_be()?;
        }
    }
}

/// Replay one RELOC32 table against the loaded image.
fn apply_reloc32(
    cursor: &mut Cursor<'_>,
    hunk_bases: &[u32],
    ram: &mut EmulatedRam,
) -> Result<(), LoadError> {
    loop {
        let count = cursor.read_u32_be()?;
        if count == 0 {
            return Ok(());
        }
        let hunk_number = cursor.read_u32_be()?;
        if hunk_number as usize >= hunk_bases.len() {
            return Err(LoadError::RelocHunkOutOfRange {
                hunk: hunk_number,
                loaded: hunk_bases.len(),
            });
        }
        let base = hunk_bases[hunk_number as usize];
        for _ in 0..count {
            let offset = cursor.read_u32_be()?;
            let value = ram.read_u32(offset).wrapping_add(base);
            ram.write_u32(offset, value);
        }
    }
}
