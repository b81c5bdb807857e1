//! Decoders for MPEG-2 _Program Specific Information_ sections, per the _ISO/IEC 13818-1_
//! standard.
//!
//! The caller hands over the bytes of exactly one section (already demultiplexed and
//! reassembled from Transport Stream packets) and gets back typed, borrowing views of the
//! Program Association, Program Map and Conditional Access tables, or the opaque payload of an
//! Entitlement Control Message.
//!
//! # Design principles
//!
//!  * *Avoid copying and allocating*.  Every type here borrows a slice of the caller's buffer
//!    and decodes fields only when they are asked for.
//!  * *Never trust the input*.  Constructing a section view never fails; instead validity
//!    checks and field accessors return a `Result` describing what is wrong with the data,
//!    rather than panicking or reading out of bounds.
//!  * *Lazy lists*.  Programs, elementary streams and descriptors are produced by iterators,
//!    one entry at a time, so a malformed entry at the end of a list does not prevent use of
//!    the entries before it.
//!  * *Transport Neutral*.  Nothing here reads files or sockets, or tracks table versions
//!    across repetitions; those jobs belong to the demultiplexer feeding this crate.
//!
//! # Example
//!
//! ```
//! use mpeg2ts_si::psi::Section;
//!
//! let pat = [
//!     0x00, 0xb0, 0x0d, 0x00, 0x01, 0xc1, 0x00, 0x00,
//!     0x00, 0x01, 0xf0, 0x00,
//!     0x2a, 0xb1, 0x04, 0xb2,
//! ];
//! match Section::from_bytes(&pat[..]) {
//!     Ok(Section::Pat(pat)) => {
//!         for program in pat.programs().unwrap() {
//!             println!("program {} -> {:?}", program.program_number, program.pid);
//!         }
//!     }
//!     Ok(other) => println!("some other table {:?}", other),
//!     Err(e) => println!("bad section: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, future_incompatible)]

pub mod descriptor;
pub mod mpegts_crc;
pub mod pid;
pub mod psi;

#[cfg(test)]
mod test_support;

pub use crate::pid::Pid;

macro_rules! stream_types {
    (
        $(
            $(#[$meta:meta])*
            $name:ident = $val:literal,
        )*
    ) => {
        /// The kind of content carried by an elementary stream, as signalled in the
        /// `stream_type` field of a Program Map Table entry.
        ///
        /// Values without a dedicated variant are kept as `Reserved(u8)` (below `0x80`) or
        /// `Private(u8)` (user private, `0x80` and above), so no information is lost.
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub enum StreamType {
            $(
                $(#[$meta])*
                $name,
            )*
            /// A user private value with no dedicated variant
            Private(u8),
            /// A value reserved by _ISO/IEC 13818-1_
            Reserved(u8),
        }
        impl From<u8> for StreamType {
            fn from(val: u8) -> Self {
                match val {
                    $( $val => StreamType::$name, )*
                    0x80..=0xff => StreamType::Private(val),
                    _ => StreamType::Reserved(val),
                }
            }
        }
        impl From<StreamType> for u8 {
            fn from(val: StreamType) -> Self {
                match val {
                    $( StreamType::$name => $val, )*
                    StreamType::Private(v) | StreamType::Reserved(v) => v,
                }
            }
        }
    };
}

stream_types! {
    /// ISO/IEC 11172 Video
    Iso11172Video = 0x01,
    /// ITU-T Rec. H.262 / ISO/IEC 13818-2 Video
    H262 = 0x02,
    /// ISO/IEC 11172 Audio
    Iso11172Audio = 0x03,
    /// ISO/IEC 13818-3 Audio
    Iso138183Audio = 0x04,
    /// Rec. H.222.0 private_sections
    H2220PrivateSections = 0x05,
    /// PES packets containing private data
    H2220PesPrivateData = 0x06,
    /// ISO/IEC 13522 MHEG
    Mheg = 0x07,
    /// Annex A DSM-CC
    H2220DsmCc = 0x08,
    /// ITU-T Rec. H.222.1
    H2221 = 0x09,
    /// ISO/IEC 13818-6 type A
    Iso138186MultiprotocolEncapsulation = 0x0a,
    /// ISO/IEC 13818-6 type B
    DsmccUnMessages = 0x0b,
    /// ISO/IEC 13818-6 type C
    DsmccStreamDescriptors = 0x0c,
    /// ISO/IEC 13818-6 type D
    DsmccSections = 0x0d,
    /// Rec. H.222.0 auxiliary
    H2220Auxiliary = 0x0e,
    /// ISO/IEC 13818-7 Audio with ADTS transport syntax
    Adts = 0x0f,
    /// ISO/IEC 14496-2 Visual
    Iso144962Visual = 0x10,
    /// ISO/IEC 14496-3 Audio with the LATM transport syntax
    Latm = 0x11,
    /// ISO/IEC 14496-1 SL-packetized or FlexMux stream carried in PES packets
    FlexMuxPes = 0x12,
    /// ISO/IEC 14496-1 SL-packetized or FlexMux stream carried in sections
    FlexMuxIso14496Sections = 0x13,
    /// ISO/IEC 13818-6 Synchronized Download Protocol
    SynchronizedDownloadProtocol = 0x14,
    /// Metadata carried in PES packets
    MetadataInPes = 0x15,
    /// Metadata carried in metadata_sections
    MetadataInMetadataSections = 0x16,
    /// Metadata carried in the DSM-CC Data Carousel
    DsmccDataCarouselMetadata = 0x17,
    /// Metadata carried in the DSM-CC Object Carousel
    DsmccObjectCarouselMetadata = 0x18,
    /// Metadata carried in the Synchronized Download Protocol
    SynchronizedDownloadProtocolMetadata = 0x19,
    /// IPMP stream
    Ipmp = 0x1a,
    /// AVC video stream, ITU-T Rec. H.264 / ISO/IEC 14496-10
    H264 = 0x1b,
    /// HEVC video stream, ITU-T Rec. H.265 / ISO/IEC 23008-2
    H265 = 0x24,
    /// Chinese Video Standard
    ChineseVideoStandard = 0x42,
    /// ATSC Dolby Digital audio
    AtscDolbyDigitalAudio = 0x81,
    /// ATSC DSM-CC Network Resources Table
    AtscDsmccNetworkResourcesTable = 0x95,
    /// ATSC DSM-CC synchronous data
    AtscDsmccSynchronousData = 0xc2,
}

#[cfg(test)]
mod test {
    use super::StreamType;

    #[test]
    fn stream_type_round_trips_every_value() {
        for v in 0..=255u8 {
            assert_eq!(v, u8::from(StreamType::from(v)));
        }
    }

    #[test]
    fn stream_type_catch_alls() {
        assert_eq!(StreamType::from(0x1b), StreamType::H264);
        assert_eq!(StreamType::from(0x00), StreamType::Reserved(0x00));
        assert_eq!(StreamType::from(0x30), StreamType::Reserved(0x30));
        assert_eq!(StreamType::from(0x86), StreamType::Private(0x86));
    }
}
