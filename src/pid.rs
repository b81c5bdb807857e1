//! The 13-bit _Packet Identifier_ values that PSI tables use to point at other sub-streams.

use std::fmt;

/// A Packet Identifier value, between `0x0000` and `0x1fff`.
///
/// PSI sections never carry the PID of the packets they arrived in, but they refer to other
/// PIDs constantly: the PAT points at each program's PMT, the PMT points at the PCR and the
/// elementary streams, and CA descriptors point at ECM / EMM streams.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(u16);
impl Pid {
    /// The largest possible PID value, `0x1fff`.
    pub const MAX_VALUE: u16 = 0x1fff;

    /// PID of packets carrying the Program Association Table.
    pub const PAT: Pid = Pid::new(0);
    /// PID of packets carrying the Conditional Access Table.
    pub const CAT: Pid = Pid::new(1);
    /// PID of null (stuffing) packets.
    pub const STUFFING: Pid = Pid::new(0x1fff);

    /// Panics if the given value is greater than `Pid::MAX_VALUE`.
    pub const fn new(pid: u16) -> Pid {
        assert!(pid <= Pid::MAX_VALUE);
        Pid(pid)
    }

    /// Build a PID from the two bytes of a section field whose top 3 bits are reserved.  The
    /// reserved bits are discarded.
    #[inline]
    pub(crate) fn from_masked(hi: u8, lo: u8) -> Pid {
        Pid(u16::from(hi & 0b0001_1111) << 8 | u16::from(lo))
    }
}
impl TryFrom<u16> for Pid {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value <= Pid::MAX_VALUE {
            Ok(Pid(value))
        } else {
            Err(())
        }
    }
}
impl From<Pid> for u16 {
    #[inline]
    fn from(pid: Pid) -> Self {
        pid.0
    }
}
impl From<Pid> for usize {
    #[inline]
    fn from(pid: Pid) -> Self {
        pid.0 as usize
    }
}
impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Pid({:04x})", self.0)
    }
}
