//! Types for decoding sections of *Program Specific Information* tables.
//!
//! # Concepts
//!
//! * There are multiple standard types of Program Specific Information, like the *Program
//!   Association Table* and *Program Map Table*.  Standards derived from mpegts (DVB, ATSC,
//!   conditional access systems) define their own table types using the same *private section*
//!   framing.
//! * A PSI *Table* can be split into *Sections*.  This crate always works on one complete
//!   section at a time; reassembling sections from Transport Stream packets is the job of the
//!   demultiplexer that calls into this crate.
//! * A Section may use the common 'section syntax' (signalled by `section_syntax_indicator`),
//!   in which case a 5 byte [`TableSyntaxHeader`] follows the [`SectionCommonHeader`] and a
//!   CRC-32 ends the section.  Otherwise the section is an opaque bag of bytes after its 3 byte
//!   header.
//!
//! # Core types
//!
//! * [`PrivateSection`] decodes the framing shared by all sections, and checks length and CRC.
//! * [`Section`] picks the right table-specific type for a section, based on its `table_id`.
//! * [`pat::PatSection`], [`pmt::PmtSection`], [`cat::CatSection`] and [`ecm::EcmSection`]
//!   decode the table-specific payloads.

pub mod cat;
pub mod ecm;
pub mod pat;
pub mod pmt;

use crate::mpegts_crc;
use log::debug;
use std::fmt;

/// Problems found in the bytes of a section.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionError {
    /// Reading `field` requires the buffer to hold at least `expected` bytes, but it only has
    /// `actual`.
    #[error("{field} requires {expected} bytes, but only {actual} are available")]
    BufferTooShort {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The `section_length` field disagrees with the size of the buffer holding the section.
    #[error("section_length {section_length} implies {} bytes, but the buffer holds {actual}", .section_length + SectionCommonHeader::SIZE)]
    LengthMismatch { section_length: usize, actual: usize },
    /// The section belongs to a different table than the decoder used.
    #[error("expected table_id {expected:#04x}, found {actual:#04x}")]
    UnexpectedTableId { expected: u8, actual: u8 },
    /// The `section_length` field is beyond the maximum allowed for this kind of section.
    #[error("section_length {section_length} exceeds the limit of {limit}")]
    SectionTooLarge { section_length: usize, limit: usize },
    /// The CRC stored in the section does not match the CRC of the section's data.
    #[error("CRC mismatch: computed {computed:#010x}, section carries {extracted:#010x}")]
    CrcMismatch { computed: u32, extracted: u32 },
    /// A list within the section declares a size that does not fit the space its enclosing
    /// structure allows.
    #[error("{field} declares {declared} bytes, but only {available} remain")]
    FramingError {
        field: &'static str,
        declared: usize,
        available: usize,
    },
    /// A field or check that only exists when `section_syntax_indicator` is set was requested
    /// of a section without it.
    #[error("table_id {table_id:#04x} section does not use section syntax")]
    SectionSyntaxRequired { table_id: u8 },
}

/// Is the table carried by a section applicable now, or at some future time.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CurrentNext {
    /// The table is currently applicable
    Current,
    /// The table will become applicable at some future time
    Next,
}

impl CurrentNext {
    fn from_bit(v: u8) -> CurrentNext {
        if v & 1 == 1 {
            CurrentNext::Current
        } else {
            CurrentNext::Next
        }
    }
}

/// The 3 bytes at the start of every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionCommonHeader {
    /// Identifies the table to which the section belongs.
    pub table_id: u8,
    /// Set when the section uses the common 'section syntax'.
    pub section_syntax_indicator: bool,
    /// User-defined bit, meaningful only for private sections.
    pub private_indicator: bool,
    /// The number of bytes in the section that follow this header.
    pub section_length: usize,
}

impl SectionCommonHeader {
    /// The size of the common header in bytes.
    pub const SIZE: usize = 3;

    /// Decodes the header from the start of the given slice, which may extend beyond the
    /// header.
    pub fn from_bytes(buf: &[u8]) -> Result<SectionCommonHeader, SectionError> {
        if buf.len() < Self::SIZE {
            return Err(SectionError::BufferTooShort {
                field: "section header",
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }
        Ok(SectionCommonHeader {
            table_id: buf[0],
            section_syntax_indicator: buf[1] & 0b1000_0000 != 0,
            private_indicator: buf[1] & 0b0100_0000 != 0,
            section_length: usize::from(buf[1] & 0b0000_1111) << 8 | usize::from(buf[2]),
        })
    }
}

/// Represents the fields that appear within table sections that use the common 'section
/// syntax', immediately after the `section_length` field.
#[derive(Clone, Copy)]
pub struct TableSyntaxHeader<'buf> {
    buf: &'buf [u8],
}

impl<'buf> TableSyntaxHeader<'buf> {
    /// The size of the table syntax header in bytes.
    pub const SIZE: usize = 5;

    /// Wraps the given slice, which must start with the 5 bytes of the header.
    pub fn from_bytes(buf: &'buf [u8]) -> Result<TableSyntaxHeader<'buf>, SectionError> {
        if buf.len() < Self::SIZE {
            Err(SectionError::BufferTooShort {
                field: "table syntax header",
                expected: Self::SIZE,
                actual: buf.len(),
            })
        } else {
            Ok(TableSyntaxHeader { buf })
        }
    }
    /// The initial 16-bit field of the header, which _13818-1_ calls,
    ///  - `transport_stream_id` within a Program Association Section
    ///  - part of the `reserved` field within a Conditional Access Section
    ///  - `program_number` within a Program Map Section
    ///  - `table_id_extension` within a Private Section
    pub fn id(&self) -> u16 {
        u16::from(self.buf[0]) << 8 | u16::from(self.buf[1])
    }
    /// A 5-bit value which changes whenever the content of the table changes.
    pub fn version(&self) -> u8 {
        (self.buf[2] >> 1) & 0b0001_1111
    }
    /// Is this table applicable now, or will it become applicable at some future time.
    pub fn current_next_indicator(&self) -> CurrentNext {
        CurrentNext::from_bit(self.buf[2])
    }
    /// The number of this section, within a potentially multi-section table.
    pub fn section_number(&self) -> u8 {
        self.buf[3]
    }
    /// The `section_number` of the last section of the table.
    pub fn last_section_number(&self) -> u8 {
        self.buf[4]
    }
}
impl fmt::Debug for TableSyntaxHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableSyntaxHeader")
            .field("id", &self.id())
            .field("version", &self.version())
            .field("current_next_indicator", &self.current_next_indicator())
            .field("section_number", &self.section_number())
            .field("last_section_number", &self.last_section_number())
            .finish()
    }
}

/// The framing shared by every kind of section: the common header, the optional table syntax
/// header, the private data and the optional CRC.
///
/// Creating a `PrivateSection` never fails and performs no checks.  Use
/// [`check_well_formed()`](#method.check_well_formed) and [`check_crc()`](#method.check_crc)
/// (or the table-specific `validate()` methods) before trusting the values of any fields.
#[derive(Clone, Copy)]
pub struct PrivateSection<'buf> {
    data: &'buf [u8],
}

impl<'buf> PrivateSection<'buf> {
    /// Maximum `section_length` of a private section.
    pub const PRIVATE_SECTION_LIMIT: usize = 4096;
    /// Maximum `section_length` of a PSI section (PAT, CAT, PMT).
    pub const PSI_SECTION_LIMIT: usize = 1021;
    /// The size of the CRC which ends each section that uses section syntax.
    pub const CRC_SIZE: usize = 4;

    /// Wrap the given buffer, which should hold exactly one section.
    pub fn new(data: &'buf [u8]) -> PrivateSection<'buf> {
        PrivateSection { data }
    }

    /// The whole buffer given to `new()`.
    pub fn data(&self) -> &'buf [u8] {
        self.data
    }

    /// The 3 byte header common to all sections.
    pub fn header(&self) -> Result<SectionCommonHeader, SectionError> {
        SectionCommonHeader::from_bytes(self.data)
    }
    /// Shortcut for `header()?.table_id`.
    pub fn table_id(&self) -> Result<u8, SectionError> {
        self.header().map(|h| h.table_id)
    }
    /// Shortcut for `header()?.section_syntax_indicator`.
    pub fn section_syntax_indicator(&self) -> Result<bool, SectionError> {
        self.header().map(|h| h.section_syntax_indicator)
    }
    /// Shortcut for `header()?.section_length`.
    pub fn section_length(&self) -> Result<usize, SectionError> {
        self.header().map(|h| h.section_length)
    }

    /// The extended header, or `None` if this section does not use section syntax.
    pub fn table_syntax_header(&self) -> Result<Option<TableSyntaxHeader<'buf>>, SectionError> {
        if self.header()?.section_syntax_indicator {
            TableSyntaxHeader::from_bytes(&self.data[SectionCommonHeader::SIZE..]).map(Some)
        } else {
            Ok(None)
        }
    }
    fn syntax_header(&self) -> Result<TableSyntaxHeader<'buf>, SectionError> {
        self.table_syntax_header()?
            .ok_or(SectionError::SectionSyntaxRequired {
                table_id: self.data[0],
            })
    }
    /// The `table_id_extension` field.  See [`TableSyntaxHeader::id()`].
    pub fn table_id_extension(&self) -> Result<u16, SectionError> {
        self.syntax_header().map(|h| h.id())
    }
    /// The `version_number` field.
    pub fn version_number(&self) -> Result<u8, SectionError> {
        self.syntax_header().map(|h| h.version())
    }
    /// The `current_next_indicator` field.
    pub fn current_next_indicator(&self) -> Result<CurrentNext, SectionError> {
        self.syntax_header().map(|h| h.current_next_indicator())
    }
    /// The `section_number` field.
    pub fn section_number(&self) -> Result<u8, SectionError> {
        self.syntax_header().map(|h| h.section_number())
    }
    /// The `last_section_number` field.
    pub fn last_section_number(&self) -> Result<u8, SectionError> {
        self.syntax_header().map(|h| h.last_section_number())
    }

    /// Offset within the buffer of the first byte after the header(s).
    pub fn private_data_offset(&self) -> Result<usize, SectionError> {
        Ok(if self.header()?.section_syntax_indicator {
            SectionCommonHeader::SIZE + TableSyntaxHeader::SIZE
        } else {
            SectionCommonHeader::SIZE
        })
    }
    /// The number of bytes between the header(s) and the end of the section (or the CRC, when
    /// section syntax is in use).
    pub fn private_data_length(&self) -> Result<usize, SectionError> {
        let header = self.header()?;
        if header.section_syntax_indicator {
            let overhead = TableSyntaxHeader::SIZE + Self::CRC_SIZE;
            header
                .section_length
                .checked_sub(overhead)
                .ok_or(SectionError::BufferTooShort {
                    field: "section_length",
                    expected: overhead,
                    actual: header.section_length,
                })
        } else {
            Ok(header.section_length)
        }
    }
    /// Borrows the bytes between the header(s) and the end of the section (or the CRC).
    pub fn private_data(&self) -> Result<&'buf [u8], SectionError> {
        let offset = self.private_data_offset()?;
        let len = self.private_data_length()?;
        self.slice("private_data", offset, offset + len)
    }

    pub(crate) fn slice(
        &self,
        field: &'static str,
        from: usize,
        to: usize,
    ) -> Result<&'buf [u8], SectionError> {
        if to > self.data.len() {
            Err(SectionError::BufferTooShort {
                field,
                expected: to,
                actual: self.data.len(),
            })
        } else {
            Ok(&self.data[from..to])
        }
    }

    fn crc_offset(&self) -> Result<usize, SectionError> {
        let header = self.header()?;
        if !header.section_syntax_indicator {
            return Err(SectionError::SectionSyntaxRequired {
                table_id: header.table_id,
            });
        }
        if header.section_length < Self::CRC_SIZE {
            return Err(SectionError::BufferTooShort {
                field: "section_length",
                expected: Self::CRC_SIZE,
                actual: header.section_length,
            });
        }
        let offset = SectionCommonHeader::SIZE + header.section_length - Self::CRC_SIZE;
        self.slice("CRC_32", offset, offset + Self::CRC_SIZE)?;
        Ok(offset)
    }
    /// The CRC value carried in the last 4 bytes of the section.
    pub fn extracted_crc(&self) -> Result<u32, SectionError> {
        let offset = self.crc_offset()?;
        let b = &self.data[offset..offset + Self::CRC_SIZE];
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
    /// The CRC calculated over all the bytes of the section that precede the CRC field.
    pub fn computed_crc(&self) -> Result<u32, SectionError> {
        let offset = self.crc_offset()?;
        Ok(mpegts_crc::crc32(&self.data[..offset]))
    }
    /// Compares the computed and extracted CRC values.
    pub fn check_crc(&self) -> Result<(), SectionError> {
        let computed = self.computed_crc()?;
        let extracted = self.extracted_crc()?;
        if computed == extracted {
            Ok(())
        } else {
            Err(SectionError::CrcMismatch {
                computed,
                extracted,
            })
        }
    }
    /// `true` if the section uses section syntax and its CRC is correct.
    pub fn is_crc_valid(&self) -> bool {
        self.check_crc().is_ok()
    }

    /// Checks that the section exactly fills the buffer, and that its `section_length` is not
    /// above `limit`.
    pub fn check_well_formed(&self, limit: usize) -> Result<(), SectionError> {
        let section_length = self.section_length()?;
        if section_length + SectionCommonHeader::SIZE != self.data.len() {
            return Err(SectionError::LengthMismatch {
                section_length,
                actual: self.data.len(),
            });
        }
        if section_length > limit {
            return Err(SectionError::SectionTooLarge {
                section_length,
                limit,
            });
        }
        Ok(())
    }
    /// `check_well_formed()` against the limit for private sections, as a boolean.
    pub fn is_well_formed(&self) -> bool {
        self.check_well_formed(Self::PRIVATE_SECTION_LIMIT).is_ok()
    }
    /// Validity of a section of a table this crate has no specific support for.
    pub fn validate(&self) -> Result<(), SectionError> {
        self.check_well_formed(Self::PRIVATE_SECTION_LIMIT)
    }

    /// The validity predicate shared by the PSI tables: the expected `table_id`, section
    /// syntax, well-formed, and within the PSI size limit.
    pub(crate) fn validate_psi(&self, table_id: u8) -> Result<(), SectionError> {
        let header = self.header()?;
        if header.table_id != table_id {
            return Err(SectionError::UnexpectedTableId {
                expected: table_id,
                actual: header.table_id,
            });
        }
        if !header.section_syntax_indicator {
            return Err(SectionError::SectionSyntaxRequired {
                table_id: header.table_id,
            });
        }
        self.check_well_formed(Self::PRIVATE_SECTION_LIMIT)?;
        if header.section_length > Self::PSI_SECTION_LIMIT {
            return Err(SectionError::SectionTooLarge {
                section_length: header.section_length,
                limit: Self::PSI_SECTION_LIMIT,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for PrivateSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("PrivateSection");
        match self.header() {
            Ok(header) => {
                d.field("table_id", &header.table_id);
                d.field("section_length", &header.section_length);
                match self.table_syntax_header() {
                    Ok(Some(syntax)) => {
                        d.field("table_syntax_header", &syntax);
                        d.field("crc", &self.check_crc());
                    }
                    Ok(None) => {}
                    Err(e) => {
                        d.field("table_syntax_header", &e);
                    }
                }
                d.field("private_data_length", &self.private_data_length());
            }
            Err(e) => {
                d.field("header", &e);
            }
        }
        d.finish()
    }
}

/// The kinds of table identified by the `table_id` field at the start of every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableId {
    /// `0x00`
    ProgramAssociation,
    /// `0x01`
    ConditionalAccess,
    /// `0x02`
    ProgramMap,
    /// `0x80` or `0x81`, the values conditional access systems use for the two phases of
    /// Entitlement Control Messages.
    Ecm(u8),
    /// Any value this crate has no table-specific support for.
    Other(u8),
}
impl From<u8> for TableId {
    fn from(id: u8) -> Self {
        match id {
            pat::PatSection::TABLE_ID => TableId::ProgramAssociation,
            cat::CatSection::TABLE_ID => TableId::ConditionalAccess,
            pmt::PmtSection::TABLE_ID => TableId::ProgramMap,
            ecm::EcmSection::EVEN_TABLE_ID | ecm::EcmSection::ODD_TABLE_ID => TableId::Ecm(id),
            _ => TableId::Other(id),
        }
    }
}
impl From<TableId> for u8 {
    fn from(id: TableId) -> Self {
        match id {
            TableId::ProgramAssociation => pat::PatSection::TABLE_ID,
            TableId::ConditionalAccess => cat::CatSection::TABLE_ID,
            TableId::ProgramMap => pmt::PmtSection::TABLE_ID,
            TableId::Ecm(id) | TableId::Other(id) => id,
        }
    }
}

/// One section, wrapped in the type appropriate to its `table_id`.
#[derive(Debug, Clone, Copy)]
pub enum Section<'buf> {
    /// A Program Association Table section
    Pat(pat::PatSection<'buf>),
    /// A Conditional Access Table section
    Cat(cat::CatSection<'buf>),
    /// A Program Map Table section
    Pmt(pmt::PmtSection<'buf>),
    /// An Entitlement Control Message
    Ecm(ecm::EcmSection<'buf>),
    /// A section of some table without specific support
    Private(PrivateSection<'buf>),
}

impl<'buf> Section<'buf> {
    /// Wraps the given buffer according to its `table_id`, without validating it.
    pub fn new(data: &'buf [u8]) -> Result<Section<'buf>, SectionError> {
        let header = SectionCommonHeader::from_bytes(data)?;
        Ok(match TableId::from(header.table_id) {
            TableId::ProgramAssociation => Section::Pat(pat::PatSection::new(data)),
            TableId::ConditionalAccess => Section::Cat(cat::CatSection::new(data)),
            TableId::ProgramMap => Section::Pmt(pmt::PmtSection::new(data)),
            TableId::Ecm(_) => Section::Ecm(ecm::EcmSection::new(data)),
            TableId::Other(_) => Section::Private(PrivateSection::new(data)),
        })
    }

    /// Wraps the given buffer according to its `table_id`, and applies the validity predicate
    /// for that kind of table.
    pub fn from_bytes(data: &'buf [u8]) -> Result<Section<'buf>, SectionError> {
        let section = Self::new(data)?;
        if let Err(e) = section.validate() {
            debug!(
                "rejecting section with table_id {:?}: {}",
                section.table_id(),
                e
            );
            return Err(e);
        }
        Ok(section)
    }

    /// Applies the validity predicate of the wrapped table type.
    pub fn validate(&self) -> Result<(), SectionError> {
        match self {
            Section::Pat(s) => s.validate(),
            Section::Cat(s) => s.validate(),
            Section::Pmt(s) => s.validate(),
            Section::Ecm(s) => s.validate(),
            Section::Private(s) => s.validate(),
        }
    }

    /// The `table_id` of the wrapped section.
    pub fn table_id(&self) -> Result<TableId, SectionError> {
        self.private_section().table_id().map(TableId::from)
    }

    /// The generic view of the wrapped section.
    pub fn private_section(&self) -> &PrivateSection<'buf> {
        match self {
            Section::Pat(s) => s.section(),
            Section::Cat(s) => s.section(),
            Section::Pmt(s) => s.section(),
            Section::Ecm(s) => s.section(),
            Section::Private(s) => s,
        }
    }
}
