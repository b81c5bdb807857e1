//! The conditional access descriptor names a CA system and the PID of the stream carrying its
//! messages.
//!
//! Within the Conditional Access Table it points at the system's _Entitlement Management
//! Message_ stream.  Within a Program Map Table (either in the program info loop, or attached
//! to a single elementary stream) it points at the _Entitlement Control Message_ stream for the
//! program or elementary stream.

use super::descriptor_len;
use super::{CoreDescriptors, DescriptorError, DescriptorIter};
use crate::pid::Pid;
use std::fmt;

/// The CA descriptors within the given descriptor list, skipping anything malformed.
pub(crate) fn find_all<'buf>(list: &'buf [u8]) -> impl Iterator<Item = CaDescriptor<'buf>> + 'buf {
    DescriptorIter::<CoreDescriptors<'buf>>::new(list).filter_map(|d| match d {
        Ok(CoreDescriptors::CA(ca)) => Some(ca),
        _ => None,
    })
}

/// Names a conditional access system, and the PID carrying its ECMs or EMMs.
pub struct CaDescriptor<'buf> {
    buf: &'buf [u8],
}
impl<'buf> CaDescriptor<'buf> {
    /// The descriptor tag value which identifies the descriptor as a `CaDescriptor`.
    pub const TAG: u8 = 9;
    const MIN_LEN: usize = 4;

    /// Construct a `CaDescriptor` instance that will parse the data from the given slice.
    pub fn new(tag: u8, buf: &'buf [u8]) -> Result<CaDescriptor<'buf>, DescriptorError> {
        descriptor_len(buf, tag, Self::MIN_LEN)?;
        Ok(CaDescriptor { buf })
    }

    /// Identifies the conditional access system, with values allocated by the standards
    /// body overseeing the broadcast (for DVB, _ETSI TS 101 162_).
    pub fn ca_system_id(&self) -> u16 {
        u16::from(self.buf[0]) << 8 | u16::from(self.buf[1])
    }
    /// The PID of the ECM or EMM stream, depending on where this descriptor appears.
    pub fn ca_pid(&self) -> Pid {
        Pid::from_masked(self.buf[2], self.buf[3])
    }
    /// Bytes whose meaning is defined by the CA system.
    pub fn private_data(&self) -> &'buf [u8] {
        &self.buf[Self::MIN_LEN..]
    }
}

impl fmt::Debug for CaDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaDescriptor")
            .field("ca_system_id", &format_args!("{:#06x}", self.ca_system_id()))
            .field("ca_pid", &self.ca_pid())
            .field("private_data", &format_args!("{:02x?}", self.private_data()))
            .finish()
    }
}
