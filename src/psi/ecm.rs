//! _Entitlement Control Messages_ carry the keys that a conditional access system needs to
//! descramble a program.  Their content is defined by each CA system, so only the section
//! framing is decoded here and the payload is exposed as opaque bytes.

use crate::psi::{PrivateSection, SectionError};
use std::fmt;

/// A section carrying an Entitlement Control Message.
///
/// The two `table_id` values are conventionally used to alternate between the messages for the
/// 'even' and 'odd' control words, letting receivers ignore repetitions of a message they have
/// already processed.
#[derive(Clone, Copy)]
pub struct EcmSection<'buf> {
    section: PrivateSection<'buf>,
}

impl<'buf> EcmSection<'buf> {
    /// `table_id` of ECM sections for the even control word.
    pub const EVEN_TABLE_ID: u8 = 0x80;
    /// `table_id` of ECM sections for the odd control word.
    pub const ODD_TABLE_ID: u8 = 0x81;

    /// Wrap the given buffer, which should hold exactly one section.
    pub fn new(data: &'buf [u8]) -> EcmSection<'buf> {
        EcmSection {
            section: PrivateSection::new(data),
        }
    }

    /// The generic view of this section.
    pub fn section(&self) -> &PrivateSection<'buf> {
        &self.section
    }

    /// Checks that the buffer holds exactly `section_length` bytes.  When the section uses
    /// section syntax the CRC must also be correct; otherwise the section carries no CRC and its
    /// last bytes are never examined.
    ///
    /// The `table_id` is not checked, since CA systems are free to pick their own values.
    pub fn validate(&self) -> Result<(), SectionError> {
        let header = self.section.header()?;
        self.section
            .check_well_formed(PrivateSection::PRIVATE_SECTION_LIMIT)?;
        // fuzzed input almost never carries a correct CRC
        if header.section_syntax_indicator && !cfg!(fuzz) {
            self.section.check_crc()?;
        }
        Ok(())
    }
    /// `validate()` as a boolean.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// `true` for the odd phase `table_id`, `false` for the even one.
    pub fn is_odd(&self) -> Result<bool, SectionError> {
        Ok(self.section.table_id()? == Self::ODD_TABLE_ID)
    }

    /// The CA system specific payload of the message.
    pub fn data(&self) -> Result<&'buf [u8], SectionError> {
        self.section.private_data()
    }
    /// The size of the payload returned by `data()`.
    pub fn data_len(&self) -> Result<usize, SectionError> {
        self.section.private_data_length()
    }
}

impl fmt::Debug for EcmSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("EcmSection");
        d.field("table_id", &self.section.table_id());
        match self.data() {
            Ok(data) => d.field("data", &format_args!("{:02x?}", data)),
            Err(e) => d.field("data", &e),
        };
        d.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::psi::{Section, TableId};
    use crate::test_support::syntax_section;
    use assert_matches::assert_matches;
    use hex_literal::hex;

    #[test]
    fn without_section_syntax() {
        // the last 4 bytes are payload, not a CRC
        let data = hex!("807008 0011223344556677");
        let ecm = EcmSection::new(&data);
        assert_eq!(ecm.validate(), Ok(()));
        assert_eq!(ecm.is_odd(), Ok(false));
        assert_eq!(ecm.data_len(), Ok(8));
        assert_eq!(ecm.data(), Ok(&data[3..]));
    }

    #[test]
    fn with_section_syntax() {
        let data = syntax_section(EcmSection::ODD_TABLE_ID, 0, &hex!("aabbccdd"));
        let ecm = EcmSection::new(&data);
        assert_eq!(ecm.validate(), Ok(()));
        assert_eq!(ecm.is_odd(), Ok(true));
        assert_eq!(ecm.data(), Ok(&hex!("aabbccdd")[..]));
        assert_eq!(ecm.data_len(), Ok(4));
    }

    #[cfg(not(fuzz))]
    #[test]
    fn bad_crc() {
        let mut data = syntax_section(EcmSection::EVEN_TABLE_ID, 0, &hex!("aabbccdd"));
        data[9] ^= 0x01;
        assert_matches!(
            EcmSection::new(&data).validate(),
            Err(SectionError::CrcMismatch { .. })
        );
        assert_matches!(
            Section::from_bytes(&data),
            Err(SectionError::CrcMismatch { .. })
        );
    }

    #[test]
    fn malformed() {
        let data = hex!("807009 0011223344556677");
        assert_matches!(
            EcmSection::new(&data).validate(),
            Err(SectionError::LengthMismatch {
                section_length: 9,
                actual: 11
            })
        );
    }

    #[test]
    fn any_table_id() {
        let data = hex!("847004 00112233");
        let ecm = EcmSection::new(&data);
        assert_eq!(ecm.validate(), Ok(()));
        assert_eq!(ecm.is_odd(), Ok(false));
        assert_eq!(ecm.data(), Ok(&data[3..]));
    }

    #[test]
    fn dispatch() {
        let data = hex!("817002 abcd");
        let section = Section::from_bytes(&data).unwrap();
        assert_eq!(section.table_id(), Ok(TableId::Ecm(0x81)));
        assert_matches!(section, Section::Ecm(ecm) => {
            assert_eq!(ecm.data(), Ok(&data[3..]));
            assert!(format!("{:?}", ecm).contains("ab, cd"));
        });
    }
}
