//! Types related to the _Program Map Table_

use crate::descriptor::ca::{self, CaDescriptor};
use crate::descriptor::{Descriptor, DescriptorIter, DescriptorListDebug};
use crate::pid::Pid;
use crate::psi::{PrivateSection, SectionError};
use crate::StreamType;
use log::warn;
use std::fmt;
use std::iter::FusedIterator;

/// Sections of the _Program Map Table_ give details of the streams within a particular program
#[derive(Clone, Copy)]
pub struct PmtSection<'buf> {
    section: PrivateSection<'buf>,
}

impl<'buf> PmtSection<'buf> {
    /// The `table_id` of Program Map Table sections.
    pub const TABLE_ID: u8 = 0x02;

    // PCR_PID and program_info_length follow the table syntax header
    const FIXED_FIELDS_OFFSET: usize = 8;
    const PROGRAM_INFO_OFFSET: usize = 12;
    // table syntax header, PCR_PID, program_info_length and CRC_32
    const OVERHEAD: usize = 13;

    /// Wrap the given buffer, which should hold exactly one section.  No checks are made until
    /// `validate()` or one of the field accessors is called.
    pub fn new(data: &'buf [u8]) -> PmtSection<'buf> {
        PmtSection {
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

    /// The program described by this section, matching a `program_number` in the Program
    /// Association Table.
    pub fn program_number(&self) -> Result<u16, SectionError> {
        self.section.table_id_extension()
    }

    fn fixed_fields(&self) -> Result<&'buf [u8], SectionError> {
        self.section.syntax_header()?;
        self.section.slice(
            "program_map_section",
            Self::FIXED_FIELDS_OFFSET,
            Self::PROGRAM_INFO_OFFSET,
        )
    }

    /// Returns the Pid of packets that will contain the Program Clock Reference for this program
    pub fn pcr_pid(&self) -> Result<Pid, SectionError> {
        let buf = self.fixed_fields()?;
        Ok(Pid::from_masked(buf[0], buf[1]))
    }
    /// The size of the descriptor list describing the program as a whole.
    pub fn program_info_length(&self) -> Result<usize, SectionError> {
        let buf = self.fixed_fields()?;
        Ok(usize::from(buf[2] & 0b0000_1111) << 8 | usize::from(buf[3]))
    }

    /// The number of bytes of elementary stream entries, following the program info and
    /// preceding the CRC.
    pub fn stream_info_length(&self) -> Result<usize, SectionError> {
        let program_info_length = self.program_info_length()?;
        let section_length = self.section.section_length()?;
        section_length
            .checked_sub(Self::OVERHEAD + program_info_length)
            .ok_or_else(|| {
                let err = SectionError::FramingError {
                    field: "program_info_length",
                    declared: program_info_length,
                    available: section_length.saturating_sub(Self::OVERHEAD),
                };
                warn!("{}", err);
                err
            })
    }

    fn program_info_data(&self) -> Result<&'buf [u8], SectionError> {
        self.stream_info_length()?;
        let end = Self::PROGRAM_INFO_OFFSET + self.program_info_length()?;
        self.section
            .slice("program_info", Self::PROGRAM_INFO_OFFSET, end)
    }

    /// Returns an iterator over the descriptors describing the program as a whole.
    pub fn program_info<Desc: Descriptor<'buf>>(
        &self,
    ) -> Result<DescriptorIter<'buf, Desc>, SectionError> {
        self.program_info_data().map(DescriptorIter::new)
    }

    /// The conditional access descriptors applying to the whole program, giving the ECM PID for
    /// each CA system.  Malformed descriptors are skipped.
    pub fn ca_descriptors(
        &self,
    ) -> Result<impl Iterator<Item = CaDescriptor<'buf>> + 'buf, SectionError> {
        self.program_info_data().map(ca::find_all)
    }

    /// Returns an iterator over the streams of which this program is composed
    pub fn streams(&self) -> Result<StreamInfoIter<'buf>, SectionError> {
        let len = self.stream_info_length()?;
        let start = Self::PROGRAM_INFO_OFFSET + self.program_info_length()?;
        let buf = self.section.slice("stream_info", start, start + len)?;
        Ok(StreamInfoIter::new(buf))
    }
}

struct StreamsDebug<'buf>(StreamInfoIter<'buf>);
impl fmt::Debug for StreamsDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.clone()).finish()
    }
}
impl fmt::Debug for PmtSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("PmtSection");
        d.field("program_number", &self.program_number());
        d.field("version_number", &self.section.version_number());
        d.field("pcr_pid", &self.pcr_pid());
        match self.program_info_data() {
            Ok(buf) => {
                d.field("program_info", &DescriptorListDebug(buf));
            }
            Err(e) => {
                d.field("program_info", &e);
            }
        }
        match self.streams() {
            Ok(streams) => {
                d.field("streams", &StreamsDebug(streams));
            }
            Err(e) => {
                d.field("streams", &e);
            }
        }
        d.finish()
    }
}

/// Iterator over the `StreamInfo` entries in a `PmtSection`.
///
/// An entry which does not fit in the space remaining produces a single
/// `SectionError::FramingError`, after which the iterator ends.
#[derive(Clone, Debug)]
pub struct StreamInfoIter<'buf> {
    buf: &'buf [u8],
}
impl<'buf> StreamInfoIter<'buf> {
    fn new(buf: &'buf [u8]) -> StreamInfoIter<'buf> {
        StreamInfoIter { buf }
    }
}
impl<'buf> Iterator for StreamInfoIter<'buf> {
    type Item = Result<StreamInfo<'buf>, SectionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        match StreamInfo::from_bytes(self.buf) {
            Ok(info) => {
                self.buf = &self.buf[info.total_length()..];
                Some(Ok(info))
            }
            Err(e) => {
                warn!("{}", e);
                self.buf = &self.buf[0..0];
                Some(Err(e))
            }
        }
    }
}
impl<'buf> FusedIterator for StreamInfoIter<'buf> {}

/// Details of a particular elementary stream within a program.
///
///  - `stream_type` gives an indication of the kind of content carried within the stream
///  - The `elementary_pid` property allows us to find Transport Stream packets that belong to the
///    elementary stream
///  - `descriptors` _may_ provide extra metadata describing some of the
///     stream's properties (for example, the streams 'language' might be given in a descriptor; or
///     it might not)
#[derive(Clone, Copy)]
pub struct StreamInfo<'buf> {
    data: &'buf [u8],
}

impl<'buf> StreamInfo<'buf> {
    const HEADER_SIZE: usize = 5;

    fn from_bytes(data: &'buf [u8]) -> Result<StreamInfo<'buf>, SectionError> {
        if data.len() < Self::HEADER_SIZE {
            return Err(SectionError::FramingError {
                field: "stream_info",
                declared: Self::HEADER_SIZE,
                available: data.len(),
            });
        }
        let es_info_length = usize::from(data[3] & 0b0000_1111) << 8 | usize::from(data[4]);
        let total = Self::HEADER_SIZE + es_info_length;
        if total > data.len() {
            return Err(SectionError::FramingError {
                field: "es_info_length",
                declared: total,
                available: data.len(),
            });
        }
        Ok(StreamInfo {
            data: &data[..total],
        })
    }

    /// The type of this stream
    pub fn stream_type(&self) -> StreamType {
        self.data[0].into()
    }
    /// The Pid that will be used for TS packets containing the data of this stream
    pub fn elementary_pid(&self) -> Pid {
        Pid::from_masked(self.data[1], self.data[2])
    }
    /// The size of this stream's descriptor list.
    pub fn es_info_length(&self) -> usize {
        self.data.len() - Self::HEADER_SIZE
    }
    /// The size of this entry within the section, including its descriptors.
    pub fn total_length(&self) -> usize {
        self.data.len()
    }

    /// Returns an iterator over the descriptors attached to this stream
    pub fn descriptors<Desc: Descriptor<'buf>>(&self) -> DescriptorIter<'buf, Desc> {
        DescriptorIter::new(&self.data[Self::HEADER_SIZE..])
    }

    /// The conditional access descriptors giving the ECM PID for this stream alone.  Malformed
    /// descriptors are skipped.
    pub fn ca_descriptors(&self) -> impl Iterator<Item = CaDescriptor<'buf>> + 'buf {
        ca::find_all(&self.data[Self::HEADER_SIZE..])
    }
}
impl fmt::Debug for StreamInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamInfo")
            .field("stream_type", &self.stream_type())
            .field("elementary_pid", &self.elementary_pid())
            .field(
                "descriptors",
                &DescriptorListDebug(&self.data[Self::HEADER_SIZE..]),
            )
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{CoreDescriptors, DescriptorError, RawDescriptor};
    use crate::test_support::{init_logging, make_test_data, syntax_section};
    use assert_matches::assert_matches;
    use bitstream_io::BitWrite;
    use hex_literal::hex;

    fn pmt_with(pcr_pid: u16, program_info: &[u8], streams: &[(u8, u16, &[u8])]) -> Vec<u8> {
        let payload = make_test_data(|w| {
            w.write(3, 7)?; // reserved
            w.write(13, pcr_pid)?;
            w.write(4, 15)?; // reserved
            w.write(12, program_info.len() as u16)?;
            w.write_bytes(program_info)?;
            for (stream_type, pid, es_info) in streams {
                w.write(8, *stream_type)?;
                w.write(3, 7)?; // reserved
                w.write(13, *pid)?;
                w.write(4, 15)?; // reserved
                w.write(12, es_info.len() as u16)?;
                w.write_bytes(es_info)?;
            }
            Ok(())
        });
        syntax_section(PmtSection::TABLE_ID, 1, &payload)
    }

    #[test]
    fn fields() {
        let data = pmt_with(0x1ffe, &[], &[]);
        let pmt = PmtSection::new(&data);
        assert_eq!(pmt.validate(), Ok(()));
        assert_eq!(pmt.section().check_crc(), Ok(()));
        assert_eq!(pmt.program_number(), Ok(1));
        assert_eq!(pmt.pcr_pid(), Ok(Pid::new(0x1ffe)));
        assert_eq!(pmt.program_info_length(), Ok(0));
        assert_eq!(pmt.stream_info_length(), Ok(0));
        assert_eq!(pmt.program_info::<RawDescriptor<'_>>().unwrap().count(), 0);
        assert_eq!(pmt.streams().unwrap().count(), 0);
    }

    #[test]
    fn k_streams() {
        let es_infos: [&[u8]; 4] = [&[], &hex!("0a04656e6700"), &hex!("8000 8101ff"), &[]];
        for k in 0..=es_infos.len() {
            let streams: Vec<(u8, u16, &[u8])> = es_infos[..k]
                .iter()
                .enumerate()
                .map(|(i, es_info)| (0x1b, 0x100 + i as u16, *es_info))
                .collect();
            let data = pmt_with(0x100, &hex!("050443554549"), &streams);
            let pmt = PmtSection::new(&data);
            assert!(pmt.is_valid());
            let infos: Vec<_> = pmt.streams().unwrap().map(|s| s.unwrap()).collect();
            assert_eq!(infos.len(), k);
            let sum: usize = infos.iter().map(|s| 5 + s.es_info_length()).sum();
            assert_eq!(pmt.stream_info_length(), Ok(sum));
            for (i, info) in infos.iter().enumerate() {
                assert_eq!(info.stream_type(), StreamType::H264);
                assert_eq!(info.elementary_pid(), Pid::new(0x100 + i as u16));
                assert_eq!(info.es_info_length(), es_infos[i].len());
                assert_eq!(info.total_length(), 5 + es_infos[i].len());
            }
        }
    }

    #[test]
    fn descriptors() {
        let video_descs: &[u8] = &[];
        let audio_descs: &[u8] = &hex!("0a04656e6700 0906 0100e066aabb");
        let data = pmt_with(
            0x101,
            &hex!("0904 0b00e065"),
            &[(0x1b, 0x101, video_descs), (0x0f, 0x102, audio_descs)],
        );
        let pmt = PmtSection::new(&data);
        let program_ca: Vec<_> = pmt.ca_descriptors().unwrap().collect();
        assert_eq!(program_ca.len(), 1);
        assert_eq!(program_ca[0].ca_system_id(), 0x0b00);
        assert_eq!(program_ca[0].ca_pid(), Pid::new(0x65));

        let mut streams = pmt.streams().unwrap();
        let video = streams.next().unwrap().unwrap();
        assert_eq!(video.descriptors::<RawDescriptor<'_>>().count(), 0);
        assert_eq!(video.ca_descriptors().count(), 0);
        let audio = streams.next().unwrap().unwrap();
        assert_eq!(audio.stream_type(), StreamType::Adts);
        let mut descs = audio.descriptors::<CoreDescriptors<'_>>();
        assert_matches!(descs.next(), Some(Ok(CoreDescriptors::ISO639Language(_))));
        assert_matches!(descs.next(), Some(Ok(CoreDescriptors::CA(ca))) => {
            assert_eq!(ca.ca_pid(), Pid::new(0x66));
            assert_eq!(ca.private_data(), &[0xaa, 0xbb]);
        });
        assert!(descs.next().is_none());
        assert_eq!(audio.ca_descriptors().count(), 1);
        assert!(streams.next().is_none());
    }

    #[test]
    fn es_info_overruns_stream_list() {
        init_logging();
        let data = syntax_section(PmtSection::TABLE_ID, 1, &hex!("e100f000 1be101f00a 0a00"));
        let pmt = PmtSection::new(&data);
        assert!(pmt.is_valid());
        assert_eq!(pmt.stream_info_length(), Ok(7));
        let mut streams = pmt.streams().unwrap();
        assert_matches!(
            streams.next(),
            Some(Err(SectionError::FramingError {
                field: "es_info_length",
                declared: 15,
                available: 7
            }))
        );
        assert!(streams.next().is_none());
    }

    #[test]
    fn truncated_stream_header() {
        init_logging();
        let data = syntax_section(PmtSection::TABLE_ID, 1, &hex!("e100f000 1be101f000 0300"));
        let pmt = PmtSection::new(&data);
        let mut streams = pmt.streams().unwrap();
        assert_matches!(streams.next(), Some(Ok(_)));
        assert_matches!(
            streams.next(),
            Some(Err(SectionError::FramingError {
                field: "stream_info",
                declared: 5,
                available: 2
            }))
        );
        assert!(streams.next().is_none());
    }

    #[test]
    fn program_info_overruns_section() {
        init_logging();
        let data = syntax_section(PmtSection::TABLE_ID, 1, &hex!("e100f0ff 1be101f000"));
        let pmt = PmtSection::new(&data);
        assert!(pmt.is_valid());
        assert_eq!(pmt.program_info_length(), Ok(0xff));
        assert_matches!(
            pmt.stream_info_length(),
            Err(SectionError::FramingError {
                field: "program_info_length",
                declared: 0xff,
                available: 5
            })
        );
        assert_matches!(
            pmt.program_info::<RawDescriptor<'_>>(),
            Err(SectionError::FramingError { .. })
        );
        assert_matches!(pmt.streams(), Err(SectionError::FramingError { .. }));
        assert_matches!(
            pmt.ca_descriptors().err(),
            Some(SectionError::FramingError { .. })
        );
    }

    #[test]
    fn program_info_beyond_buffer() {
        let data = pmt_with(0x100, &hex!("0904 0b00e065"), &[]);
        let pmt = PmtSection::new(&data[..14]);
        assert_matches!(pmt.validate(), Err(SectionError::LengthMismatch { .. }));
        assert_matches!(
            pmt.program_info::<RawDescriptor<'_>>(),
            Err(SectionError::BufferTooShort {
                field: "program_info",
                expected: 18,
                actual: 14
            })
        );
    }

    #[test]
    fn descriptor_overrun_within_program_info() {
        init_logging();
        let data = pmt_with(0x100, &hex!("0904 0b00e065 0a09656e67"), &[]);
        let pmt = PmtSection::new(&data);
        let mut descs = pmt.program_info::<CoreDescriptors<'_>>().unwrap();
        assert_matches!(descs.next(), Some(Ok(CoreDescriptors::CA(_))));
        assert_matches!(
            descs.next(),
            Some(Err(DescriptorError::FramingError { tag: 0x0a, .. }))
        );
        assert!(descs.next().is_none());
        // the malformed descriptor is skipped
        assert_eq!(pmt.ca_descriptors().unwrap().count(), 1);
    }

    #[test]
    fn too_short_for_fixed_fields() {
        let data = syntax_section(PmtSection::TABLE_ID, 1, &hex!("e100"));
        let pmt = PmtSection::new(&data);
        assert!(pmt.is_valid());
        assert_matches!(pmt.pcr_pid(), Ok(_));
        assert_matches!(pmt.stream_info_length(), Err(SectionError::FramingError { .. }));
        let pmt = PmtSection::new(&data[..10]);
        assert_matches!(
            pmt.pcr_pid(),
            Err(SectionError::BufferTooShort {
                field: "program_map_section",
                ..
            })
        );
    }

    #[test]
    fn wrong_table_id() {
        let data = syntax_section(0, 1, &hex!("e100f000"));
        assert_eq!(
            PmtSection::new(&data).validate(),
            Err(SectionError::UnexpectedTableId {
                expected: 2,
                actual: 0
            })
        );
    }

    #[test]
    fn debug() {
        let no_descs: &[u8] = &[];
        let data = pmt_with(0x101, &hex!("0904 0b00e065"), &[(0x1b, 0x101, no_descs)]);
        let dump = format!("{:?}", PmtSection::new(&data));
        assert!(dump.contains("CaDescriptor"));
        assert!(dump.contains("H264"));
        let data = syntax_section(PmtSection::TABLE_ID, 1, &hex!("e100f0ff 1be101f00a"));
        assert!(format!("{:?}", PmtSection::new(&data)).contains("FramingError"));
    }
}
