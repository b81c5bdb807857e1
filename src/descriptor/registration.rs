//! Registration descriptor indicates which kind of syntax any 'private data' within the transport
//! stream will be following

use super::descriptor_len;
use super::DescriptorError;
use std::fmt;

/// Indicates which kind of syntax any 'private data' within the transport stream will be following
pub struct RegistrationDescriptor<'buf> {
    /// the registration data bytes
    pub buf: &'buf [u8],
}
impl<'buf> RegistrationDescriptor<'buf> {
    /// The descriptor tag value which identifies the descriptor as a `RegistrationDescriptor`.
    pub const TAG: u8 = 5;
    /// Construct a `RegistrationDescriptor` instance that will parse the data from the given
    /// slice.
    pub fn new(tag: u8, buf: &'buf [u8]) -> Result<RegistrationDescriptor<'buf>, DescriptorError> {
        descriptor_len(buf, tag, 4)?;
        Ok(RegistrationDescriptor { buf })
    }

    /// Format identifier value assigned by a _Registration Authority_, conventionally four
    /// ASCII characters such as `b"CUEI"` or `b"HDMV"`.
    pub fn format_identifier(&self) -> u32 {
        u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]])
    }

    /// `true` if the format identifier is the given four bytes.
    pub fn is_format(&self, id: &[u8; 4]) -> bool {
        self.buf[0..4] == id[..]
    }

    /// borrows a slice of additional_identification_info bytes, whose meaning is defined by
    /// the identifier returned by `format_identifier()`.
    pub fn additional_identification_info(&self) -> &'buf [u8] {
        &self.buf[4..]
    }
}
impl fmt::Debug for RegistrationDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationDescriptor")
            .field(
                "format_identifier",
                &String::from_utf8_lossy(&self.buf[0..4]),
            )
            .field(
                "additional_identification_info",
                &format_args!("{:02x?}", self.additional_identification_info()),
            )
            .finish()
    }
}
