//! CRC-32 as used by section syntax PSI tables, per _ISO/IEC 13818-1, Annex B_.
//!
//! Polynomial `0x04C11DB7`, register preset to `0xFFFFFFFF`, no reflection and no final XOR.
//! This is not the zlib CRC-32.

use crc::{Crc, CRC_32_MPEG_2};

const MPEG2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// The CRC of the given bytes, as it would be written into the last 4 bytes of a section.
pub fn crc32(data: &[u8]) -> u32 {
    MPEG2.checksum(data)
}

/// The CRC of a whole section *including* its trailing CRC field, which is `0` for any section
/// whose CRC field is correct.
pub fn sum32(data: &[u8]) -> u32 {
    crc32(data)
}
