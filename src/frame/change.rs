//! Single recorded cell change.

use crate::core::UVec3;

/// Persistence of a change that is never superseded
pub const PERMANENT: i32 = -1;

/// A cell taking a new value at some frame.
///
/// `persistence <= 0` means the change lasts until the end of the recording;
/// a positive value is the number of frames until the next change at the
/// same cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockChange {
    pub start_frame: u32,
    pub cell: UVec3,
    /// Index into the recording palette
    pub value: u16,
    pub persistence: i32,
}

impl BlockChange {
    pub fn new(start_frame: u32, cell: UVec3, value: u16) -> Self {
        Self {
            start_frame,
            cell,
            value,
            persistence: PERMANENT,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.persistence <= 0
    }

    /// First frame at which this change no longer holds, if any
    pub fn end_frame(&self) -> Option<u32> {
        if self.is_permanent() {
            None
        } else {
            Some(self.start_frame + self.persistence as u32)
        }
    }
}
