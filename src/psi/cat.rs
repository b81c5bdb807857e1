//! Types related to the _Conditional Access Table_, which lists the conditional access systems
//! in use within the transport stream and the PIDs of their _Entitlement Management Message_
//! streams.

use crate::descriptor::ca::{self, CaDescriptor};
use crate::descriptor::{Descriptor, DescriptorIter, DescriptorListDebug};
use crate::psi::{PrivateSection, SectionError};
use std::fmt;

/// A section of the Conditional Access Table, whose payload is a single descriptor list.
#[derive(Clone, Copy)]
pub struct CatSection<'buf> {
    section: PrivateSection<'buf>,
}

impl<'buf> CatSection<'buf> {
    /// The `table_id` of Conditional Access Table sections.
    pub const TABLE_ID: u8 = 0x01;

    /// Wrap the given buffer, which should hold exactly one section.
    pub fn new(data: &'buf [u8]) -> CatSection<'buf> {
        CatSection {
            section: PrivateSection::new(data),
        }
    }

    /// The generic view of this section.
    pub fn section(&self) -> &PrivateSection<'buf> {
        &self.section
    }

    /// Checks the `table_id`, the presence of section syntax, that the buffer holds exactly
    /// `section_length` bytes, and the size limit for PSI sections.  The CRC is not checked.
    pub fn validate(&self) -> Result<(), SectionError> {
        self.section.validate_psi(Self::TABLE_ID)
    }
    /// `validate()` as a boolean.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Returns an iterator over the descriptors making up the section's payload.
    pub fn descriptors<Desc: Descriptor<'buf>>(
        &self,
    ) -> Result<DescriptorIter<'buf, Desc>, SectionError> {
        self.section.private_data().map(DescriptorIter::new)
    }

    /// The conditional access descriptors giving the EMM PID of each CA system.  Malformed
    /// descriptors are skipped.
    pub fn ca_descriptors(
        &self,
    ) -> Result<impl Iterator<Item = CaDescriptor<'buf>> + 'buf, SectionError> {
        self.section.private_data().map(ca::find_all)
    }
}

impl fmt::Debug for CatSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("CatSection");
        d.field("version_number", &self.section.version_number());
        match self.section.private_data() {
            Ok(buf) => d.field("descriptors", &DescriptorListDebug(buf)),
            Err(e) => d.field("descriptors", &e),
        };
        d.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::descriptor::{CoreDescriptors, DescriptorError, RawDescriptor};
    use crate::pid::Pid;
    use crate::test_support::syntax_section;
    use assert_matches::assert_matches;
    use hex_literal::hex;

    #[test]
    fn empty() {
        let data = syntax_section(CatSection::TABLE_ID, 0xffff, &[]);
        let cat = CatSection::new(&data);
        assert_eq!(cat.validate(), Ok(()));
        let mut descs = cat.descriptors::<RawDescriptor<'_>>().unwrap();
        assert!(descs.next().is_none());
        assert_eq!(cat.ca_descriptors().unwrap().count(), 0);
    }

    #[test]
    fn emm_pids() {
        let data = syntax_section(
            CatSection::TABLE_ID,
            0xffff,
            &hex!("0904 0b00e0c8 0906 0100e0c9 0102 c0ff 0000"),
        );
        let cat = CatSection::new(&data);
        assert!(cat.is_valid());
        assert_eq!(cat.section().check_crc(), Ok(()));
        let descs: Vec<_> = cat.descriptors::<CoreDescriptors<'_>>().unwrap().collect();
        assert_eq!(descs.len(), 4);
        assert_matches!(descs[3], Ok(CoreDescriptors::Reserved(_)));
        let emm: Vec<(u16, Pid)> = cat
            .ca_descriptors()
            .unwrap()
            .map(|ca| (ca.ca_system_id(), ca.ca_pid()))
            .collect();
        assert_eq!(
            emm,
            vec![(0x0b00, Pid::new(0xc8)), (0x0100, Pid::new(0xc9))]
        );
    }

    #[test]
    fn descriptor_overrun() {
        let data = syntax_section(CatSection::TABLE_ID, 0xffff, &hex!("0904 0b00e0c8 0905 0100"));
        let cat = CatSection::new(&data);
        let mut descs = cat.descriptors::<RawDescriptor<'_>>().unwrap();
        assert_matches!(descs.next(), Some(Ok(_)));
        assert_matches!(
            descs.next(),
            Some(Err(DescriptorError::FramingError {
                tag: 9,
                declared: 7,
                available: 4
            }))
        );
        assert!(descs.next().is_none());
    }

    #[test]
    fn wrong_table_id() {
        let data = syntax_section(0x02, 0xffff, &[]);
        assert_matches!(
            CatSection::new(&data).validate(),
            Err(SectionError::UnexpectedTableId {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn debug() {
        let data = syntax_section(CatSection::TABLE_ID, 0xffff, &hex!("0904 0b00e0c8"));
        assert!(format!("{:?}", CatSection::new(&data)).contains("CaDescriptor"));
        assert!(!format!("{:?}", CatSection::new(&data[..5])).is_empty());
    }
}
