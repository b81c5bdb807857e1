//! Helpers for building synthetic sections in unit tests.

use crate::mpegts_crc;
use bitstream_io::{BigEndian, BitWrite, BitWriter, BE};
use std::io;

pub type Writer = BitWriter<Vec<u8>, BE>;

pub fn make_test_data<F>(builder: F) -> Vec<u8>
where
    F: FnOnce(&mut Writer) -> Result<(), io::Error>,
{
    let data: Vec<u8> = Vec::new();
    let mut w = BitWriter::endian(data, BigEndian);
    builder(&mut w).unwrap();
    w.into_writer()
}

/// Writes the 3 byte common header, followed by the 5 byte table syntax header.
pub fn write_syntax_header(
    w: &mut Writer,
    table_id: u8,
    section_length: u16,
    id: u16,
    version: u8,
) -> Result<(), io::Error> {
    w.write(8, table_id)?;
    w.write_bit(true)?; // section_syntax_indicator
    w.write_bit(false)?; // private_indicator
    w.write(2, 3)?; // reserved
    w.write(12, section_length)?;
    w.write(16, id)?;
    w.write(2, 3)?; // reserved
    w.write(5, version)?;
    w.write(1, 1)?; // current_next_indicator
    w.write(8, 0)?; // section_number
    w.write(8, 0) // last_section_number
}

/// Appends the correct CRC for everything already in `section`.
pub fn append_crc(mut section: Vec<u8>) -> Vec<u8> {
    let crc = mpegts_crc::crc32(&section[..]);
    section.extend_from_slice(&crc.to_be_bytes());
    section
}

/// A syntax-indicator section whose `section_length` is derived from `payload.len()` and whose
/// CRC is correct.
pub fn syntax_section(table_id: u8, id: u16, payload: &[u8]) -> Vec<u8> {
    let section_length = (5 + payload.len() + 4) as u16;
    let mut data = make_test_data(|w| write_syntax_header(w, table_id, section_length, id, 0));
    data.extend_from_slice(payload);
    append_crc(data)
}

/// Routes `log` output through the test harness, so that warnings about malformed input show
/// up alongside a failing test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
