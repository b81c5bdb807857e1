//! Types related to the _Program Association Table_

use crate::pid::Pid;
use crate::psi::{PrivateSection, SectionError};
use std::fmt;
use std::iter::FusedIterator;
use std::slice;

/// One entry of the Program Association Table.
///
/// A `program_number` of `0` conventionally gives the PID of the _Network Information Table_
/// rather than a Program Map Table, but the value is reported here just as it appears.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramDescriptor {
    /// identifies the program within the transport stream
    pub program_number: u16,
    /// the PID of the packets carrying this program's Program Map Table
    pub pid: Pid,
}

impl ProgramDescriptor {
    const SIZE: usize = 4;

    fn from_bytes(data: &[u8]) -> ProgramDescriptor {
        ProgramDescriptor {
            program_number: u16::from(data[0]) << 8 | u16::from(data[1]),
            pid: Pid::from_masked(data[2], data[3]),
        }
    }
}

/// Sections of the _Program Association Table_ give details of the programs within a transport
/// stream.  There may be only one program, or in the case of a broadcast multiplex, there may
/// be many.
#[derive(Clone, Copy)]
pub struct PatSection<'buf> {
    section: PrivateSection<'buf>,
}
impl<'buf> PatSection<'buf> {
    /// The `table_id` of Program Association Table sections.
    pub const TABLE_ID: u8 = 0x00;

    /// Wrap the given buffer, which should hold exactly one section.  No checks are made until
    /// `validate()` or one of the field accessors is called.
    pub fn new(data: &'buf [u8]) -> PatSection<'buf> {
        PatSection {
            section: PrivateSection::new(data),
        }
    }

    /// The generic view of this section.
    pub fn section(&self) -> &PrivateSection<'buf> {
        &self.section
    }

    /// Checks the `table_id`, the presence of section syntax, that the buffer holds exactly
    /// `section_length` bytes, and the size limit for PSI sections.  The CRC is not checked;
    /// use `section().check_crc()` for that.
    pub fn validate(&self) -> Result<(), SectionError> {
        self.section.validate_psi(Self::TABLE_ID)
    }
    /// `validate()` as a boolean.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// The value identifying this Transport Stream within a network.
    pub fn transport_stream_id(&self) -> Result<u16, SectionError> {
        self.section.table_id_extension()
    }

    /// The number of 4-byte program entries that the `section_length` makes room for.
    pub fn program_count(&self) -> Result<usize, SectionError> {
        self.section.syntax_header()?;
        Ok(self.section.private_data_length()? / ProgramDescriptor::SIZE)
    }

    /// Returns an iterator over exactly `program_count()` entries.
    pub fn programs(&self) -> Result<ProgramIter<'buf>, SectionError> {
        let count = self.program_count()?;
        let offset = self.section.private_data_offset()?;
        let buf = self.section.slice(
            "program list",
            offset,
            offset + count * ProgramDescriptor::SIZE,
        )?;
        Ok(ProgramIter {
            entries: buf.chunks_exact(ProgramDescriptor::SIZE),
        })
    }
}

struct ProgramsDebug<'buf>(ProgramIter<'buf>);
impl fmt::Debug for ProgramsDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.clone()).finish()
    }
}
impl fmt::Debug for PatSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("PatSection");
        d.field("transport_stream_id", &self.transport_stream_id());
        d.field("version_number", &self.section.version_number());
        match self.programs() {
            Ok(programs) => {
                d.field("programs", &ProgramsDebug(programs));
            }
            Err(e) => {
                d.field("programs", &e);
            }
        }
        d.finish()
    }
}

/// Iterate over the list of programs in a `PatSection`.
#[derive(Clone, Debug)]
pub struct ProgramIter<'buf> {
    entries: slice::ChunksExact<'buf, u8>,
}
impl<'buf> Iterator for ProgramIter<'buf> {
    type Item = ProgramDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(ProgramDescriptor::from_bytes)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
impl<'buf> ExactSizeIterator for ProgramIter<'buf> {}
impl<'buf> FusedIterator for ProgramIter<'buf> {}
