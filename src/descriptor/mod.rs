//! Descriptors provide metadata about an element of a Transport Stream.
//!
//! For example, a descriptor may be used to specify the language of an audio track, or the
//! PID carrying the Entitlement Control Messages for a scrambled program.  Each descriptor is
//! a _tag_ byte, a _length_ byte, and `length` bytes of payload.
//!
//! The syntax of specific PSI tables often allows a list of descriptors to be attached to the
//! table itself, or to entries within the table.  These lists are walked with a
//! [`DescriptorIter`], which yields one descriptor per call and stops at the end of the list.
//!
//! # Extensions
//!
//! Descriptors are a point of extension, with a range of descriptor types defined by the core
//! standard, and further descriptor types defined by standards based upon transport streams.  In
//! order to support this extension, while avoiding allocations (a la `dyn Trait`),
//! descriptor-related types and methods within this crate have a type-parameter so that calling
//! code chooses the interpretation it wants:
//!
//! * [`RawDescriptor`] just exposes tag, length and payload
//! * [`CoreDescriptors`] decodes the descriptors defined by _ISO/IEC 13818-1_
//! * types built with the [`descriptor_enum!`](../macro.descriptor_enum.html) macro can add
//!   descriptors from other standards
//!
//! ```
//! # use mpeg2ts_si::descriptor::{CoreDescriptors, DescriptorIter};
//! let data = [0x09, 0x04, 0x0b, 0x00, 0xe0, 0x65];
//! for d in DescriptorIter::<CoreDescriptors<'_>>::new(&data[..]) {
//!     if let Ok(CoreDescriptors::CA(ca)) = d {
//!         println!("CA system {:#06x} uses {:?}", ca.ca_system_id(), ca.ca_pid());
//!     }
//! }
//! ```

pub mod ca;
pub mod iso_639_language;
pub mod registration;

use self::ca::CaDescriptor;
use self::iso_639_language::Iso639LanguageDescriptor;
use self::registration::RegistrationDescriptor;
use log::warn;
use std::fmt;
use std::iter::FusedIterator;
use std::marker;

/// Trait allowing users of this crate to supply their own descriptor implementations.
pub trait Descriptor<'buf>: Sized {
    /// Create an object that can extract data from the given slice, which starts with the
    /// descriptor's tag and length bytes.
    fn from_bytes(buf: &'buf [u8]) -> Result<Self, DescriptorError>;
}

/// Builds an enum to encapsulate all possible implementations of
/// [`Descriptor`](descriptor/trait.Descriptor.html) that might appear in a particular PSI
/// table, selected on the value of the descriptor's tag.
///
/// Tag values without a case produce `DescriptorError::UnhandledTagValue`.
#[macro_export]
macro_rules! descriptor_enum {
    (
        $(#[$outer:meta])*
        $name:ident {
            $(
                $(#[$inner:ident $($args:tt)*])*
                $case_name:ident $($tags:pat_param)|* => $t:ident
            ),*,
        }
    ) => {
        $(#[$outer])*
        pub enum $name<'buf> {
            $(
                $(#[$inner $($args)*])*
                $case_name($t<'buf>),
            )*
        }
        impl<'buf> $crate::descriptor::Descriptor<'buf> for $name<'buf> {
            fn from_bytes(buf: &'buf [u8]) -> Result<Self, $crate::descriptor::DescriptorError> {
                let raw = $crate::descriptor::RawDescriptor::at(buf, 0)?;
                let tag = raw.tag();
                let payload = raw.payload();
                match tag {
                    $( $( $tags )|* => Ok($name::$case_name($t::new(tag, payload)?)), )*
                    #[allow(unreachable_patterns)]
                    _ => Err($crate::descriptor::DescriptorError::UnhandledTagValue(tag)),
                }
            }
        }
    }
}

/// Problems found while decoding descriptors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// Fewer than the 2 bytes of descriptor tag and length are available.
    #[error("buffer of {buflen} bytes can't hold a descriptor header")]
    BufferTooShort {
        /// the number of bytes available
        buflen: usize,
    },
    /// The descriptor's length field implies more data than the buffer holds.
    #[error("descriptor length {taglen} exceeds the {buflen} byte buffer")]
    TagTooLongForBuffer {
        /// the descriptor's `length` field
        taglen: usize,
        /// the number of bytes available after the tag and length
        buflen: usize,
    },
    /// A descriptor within a list declares a length which overruns the end of the list.
    #[error("descriptor tag {tag:#04x} declares {declared} bytes, but only {available} remain in the list")]
    FramingError {
        /// the tag of the descriptor which overruns the list
        tag: u8,
        /// the size the descriptor declared
        declared: usize,
        /// the number of bytes left in the list
        available: usize,
    },
    /// The payload is too short for a descriptor of this type.
    #[error("descriptor tag {tag:#04x} needs {expected} bytes of payload, found {actual}")]
    NotEnoughData {
        /// the descriptor tag
        tag: u8,
        /// the size of the payload
        actual: usize,
        /// the minimum payload size for this descriptor
        expected: usize,
    },
    /// The descriptor-enum has no case for this tag value.
    #[error("no handler for descriptor tag {0:#04x}")]
    UnhandledTagValue(u8),
}

pub(crate) fn descriptor_len(buf: &[u8], tag: u8, len: usize) -> Result<(), DescriptorError> {
    if buf.len() < len {
        Err(DescriptorError::NotEnoughData {
            tag,
            actual: buf.len(),
            expected: len,
        })
    } else {
        Ok(())
    }
}

/// A descriptor without any interpretation of its payload.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawDescriptor<'buf> {
    buf: &'buf [u8],
}
impl<'buf> RawDescriptor<'buf> {
    /// Decode the descriptor starting `offset` bytes into `view`.  The whole of the
    /// descriptor's payload must lie within `view`.
    pub fn at(view: &'buf [u8], offset: usize) -> Result<RawDescriptor<'buf>, DescriptorError> {
        let rest = view.get(offset..).unwrap_or(&[]);
        if rest.len() < 2 {
            return Err(DescriptorError::BufferTooShort { buflen: rest.len() });
        }
        let taglen = usize::from(rest[1]);
        if taglen > rest.len() - 2 {
            return Err(DescriptorError::TagTooLongForBuffer {
                taglen,
                buflen: rest.len() - 2,
            });
        }
        Ok(RawDescriptor {
            buf: &rest[..taglen + 2],
        })
    }

    /// The `descriptor_tag` value.
    pub fn tag(&self) -> u8 {
        self.buf[0]
    }
    /// The `descriptor_length` value; the size of the payload.
    pub fn length(&self) -> u8 {
        self.buf[1]
    }
    /// The descriptor's payload, following the tag and length bytes.
    pub fn payload(&self) -> &'buf [u8] {
        &self.buf[2..]
    }
    /// The size of the descriptor including the tag and length bytes.
    pub fn total_length(&self) -> usize {
        self.buf.len()
    }
    /// Reinterpret this descriptor as some more specific type, e.g. [`CoreDescriptors`].
    pub fn interpret<Desc: Descriptor<'buf>>(&self) -> Result<Desc, DescriptorError> {
        Desc::from_bytes(self.buf)
    }
}
impl<'buf> Descriptor<'buf> for RawDescriptor<'buf> {
    fn from_bytes(buf: &'buf [u8]) -> Result<Self, DescriptorError> {
        RawDescriptor::at(buf, 0)
    }
}
impl fmt::Debug for RawDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDescriptor")
            .field("tag", &self.tag())
            .field("length", &self.length())
            .finish()
    }
}

/// Catch-all type for when there is no explicit handling for the given descriptor type.
pub struct UnknownDescriptor<'buf> {
    /// the descriptor's identifying 'tag' value; different types of descriptors are assigned
    /// different tag values
    pub tag: u8,
    /// the descriptor's payload bytes
    pub payload: &'buf [u8],
}
impl<'buf> UnknownDescriptor<'buf> {
    /// Constructor, in the form required for use with the `descriptor_enum!{}` macro.
    pub fn new(tag: u8, payload: &'buf [u8]) -> Result<UnknownDescriptor<'buf>, DescriptorError> {
        Ok(UnknownDescriptor { tag, payload })
    }
}
impl fmt::Debug for UnknownDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("UnknownDescriptor")
            .field("tag", &self.tag)
            .field("len", &self.payload.len())
            .finish()
    }
}

descriptor_enum! {
    /// Defines all the descriptor types specified by _ISO/IEC 13818-1_.  Descriptors that this
    /// crate can't decode further are produced as `UnknownDescriptor`.
    #[derive(Debug)]
    CoreDescriptors {
        /// descriptor tag values `0` and `1` are reserved
        Reserved 0|1 => UnknownDescriptor,
        /// The `video_stream_descriptor()` syntax is not yet supported
        VideoStream 2 => UnknownDescriptor,
        /// The `audio_stream_descriptor()` syntax is not yet supported
        AudioStream 3 => UnknownDescriptor,
        /// The `hierarchy_descriptor()` syntax is not yet supported
        Hierarchy 4 => UnknownDescriptor,
        /// Identifies the format of private data in the stream
        Registration 5 => RegistrationDescriptor,
        /// The `data_stream_alignment_descriptor()` syntax is not yet supported
        DataStreamAlignment 6 => UnknownDescriptor,
        /// The `target_background_grid_descriptor()` syntax is not yet supported
        TargetBackgroundGrid 7 => UnknownDescriptor,
        /// The `video_window_descriptor()` syntax is not yet supported
        VideoWindow 8 => UnknownDescriptor,
        /// Gives the PID of a conditional access system's ECM or EMM stream
        CA 9 => CaDescriptor,
        /// Gives the language of an audio or subtitle stream
        ISO639Language 10 => Iso639LanguageDescriptor,
        /// The `system_clock_descriptor()` syntax is not yet supported
        SystemClock 11 => UnknownDescriptor,
        /// The `multiplex_buffer_utilization_descriptor()` syntax is not yet supported
        MultiplexBufferUtilization 12 => UnknownDescriptor,
        /// The `copyright_descriptor()` syntax is not yet supported
        Copyright 13 => UnknownDescriptor,
        /// The `maximum_bitrate_descriptor()` syntax is not yet supported
        MaximumBitrate 14 => UnknownDescriptor,
        /// The `private_data_indicator_descriptor()` syntax is not yet supported
        PrivateDataIndicator 15 => UnknownDescriptor,
        /// The `smoothing_buffer_descriptor()` syntax is not yet supported
        SmoothingBuffer 16 => UnknownDescriptor,
        /// The `STD_descriptor()` syntax is not yet supported
        STD 17 => UnknownDescriptor,
        /// The `ibp_descriptor()` syntax is not yet supported
        IBP 18 => UnknownDescriptor,
        /// descriptor tag values `19` to `26` inclusive are defined by _ISO IEC 13818-6_
        IsoIec13818dash6 19..=26 => UnknownDescriptor,
        /// The `MPEG-4_video_descriptor()` syntax is not yet supported
        MPEG4Video 27 => UnknownDescriptor,
        /// The `MPEG-4_audio_descriptor()` syntax is not yet supported
        MPEG4Audio 28 => UnknownDescriptor,
        /// The `IOD_descriptor()` syntax is not yet supported
        IOD 29 => UnknownDescriptor,
        /// The `SL_descriptor()` syntax is not yet supported
        SL 30 => UnknownDescriptor,
        /// The `FMC_descriptor()` syntax is not yet supported
        FMC 31 => UnknownDescriptor,
        /// The `External_ES_ID_descriptor()` syntax is not yet supported
        ExternalESID 32 => UnknownDescriptor,
        /// The `MuxCode_descriptor()` syntax is not yet supported
        MuxCode 33 => UnknownDescriptor,
        /// The `FmxBufferSize_descriptor()` syntax is not yet supported
        FmxBufferSize 34 => UnknownDescriptor,
        /// The `MultiplexBuffer_descriptor()` syntax is not yet supported
        MultiplexBuffer 35 => UnknownDescriptor,
        /// descriptor tag values `36` to `63` are assigned by later amendments of
        /// _ISO/IEC 13818-1_ (AVC and HEVC video descriptors, metadata descriptors and so on)
        Amendment 36..=63 => UnknownDescriptor,
        /// descriptor tag values `64` to `255` inclusive are marked for 'use private' use
        UserPrivate 64..=255 => UnknownDescriptor,
    }
}

/// Iterator over the descriptors in a descriptor list, producing each one as `Desc`.
///
/// Each call to `next()` consumes exactly one whole descriptor.  If a descriptor's length
/// field claims more bytes than remain in the list, a single
/// `DescriptorError::FramingError` is produced and the iteration then ends.  Since the iterator
/// is forward-only, make a new one for each pass over the list.
pub struct DescriptorIter<'buf, Desc>
where
    Desc: Descriptor<'buf>,
{
    buf: &'buf [u8],
    phantom: marker::PhantomData<Desc>,
}
impl<'buf, Desc> DescriptorIter<'buf, Desc>
where
    Desc: Descriptor<'buf>,
{
    /// Iterate over the descriptors making up the whole of the given slice.
    pub fn new(buf: &'buf [u8]) -> DescriptorIter<'buf, Desc> {
        DescriptorIter {
            buf,
            phantom: marker::PhantomData,
        }
    }

    /// Iterate over the descriptors in the `len` bytes starting at offset `start` within
    /// `view`.  Fails if that range is not within `view`.
    pub fn with_range(
        view: &'buf [u8],
        start: usize,
        len: usize,
    ) -> Result<DescriptorIter<'buf, Desc>, DescriptorError> {
        match start.checked_add(len) {
            Some(end) if end <= view.len() => Ok(DescriptorIter::new(&view[start..end])),
            _ => Err(DescriptorError::TagTooLongForBuffer {
                taglen: len,
                buflen: view.len().saturating_sub(start),
            }),
        }
    }

    /// The bytes of the list not yet consumed.
    pub fn remaining(&self) -> &'buf [u8] {
        self.buf
    }

    fn fail(&mut self, tag: u8, declared: usize) -> Option<Result<Desc, DescriptorError>> {
        let available = self.buf.len();
        warn!(
            "descriptor tag {:#04x} of {} bytes overruns the {} bytes remaining in its list",
            tag, declared, available
        );
        // ensure another call to next() will yield None,
        self.buf = &self.buf[0..0];
        Some(Err(DescriptorError::FramingError {
            tag,
            declared,
            available,
        }))
    }
}
impl<'buf, Desc> Iterator for DescriptorIter<'buf, Desc>
where
    Desc: Descriptor<'buf>,
{
    type Item = Result<Desc, DescriptorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        let tag = self.buf[0];
        if self.buf.len() < 2 {
            return self.fail(tag, 2);
        }
        let total = usize::from(self.buf[1]) + 2;
        if total > self.buf.len() {
            return self.fail(tag, total);
        }
        let (desc, rest) = self.buf.split_at(total);
        self.buf = rest;
        Some(Desc::from_bytes(desc))
    }
}
impl<'buf, Desc> FusedIterator for DescriptorIter<'buf, Desc> where Desc: Descriptor<'buf> {}
impl<'buf, Desc> fmt::Debug for DescriptorIter<'buf, Desc>
where
    Desc: Descriptor<'buf>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorIter")
            .field("remaining", &format_args!("{:02x?}", self.buf))
            .finish()
    }
}

/// Formats a descriptor list for `Debug` output of the structure holding it.
pub(crate) struct DescriptorListDebug<'buf>(pub(crate) &'buf [u8]);
impl<'buf> fmt::Debug for DescriptorListDebug<'buf> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(DescriptorIter::<CoreDescriptors<'buf>>::new(self.0))
            .finish()
    }
}
