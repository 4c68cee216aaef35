/// Status word of a cell, stored as an `i32` in the status block.
///
/// Only `Default` and `Wall` take part in the update rule. The transmitter
/// values are reserved and keep their word values so hosts that write them
/// stay compatible.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CellStatus {
    /// Free cell, updated by the wave rule.
    #[default]
    Default = 0,
    /// Immovable boundary, never updated and rendered transparent.
    Wall = 1,
    /// Reserved.
    PositiveTransmitter = 2,
    /// Reserved.
    NegativeTransmitter = 3,
}

impl CellStatus {
    /// Word written into the status block for this status.
    pub const fn to_word(self) -> i32 {
        self as i32
    }

    /// Decode a status word. Unknown words return `None`.
    pub fn from_word(word: i32) -> Option<Self> {
        match word {
            0 => Some(Self::Default),
            1 => Some(Self::Wall),
            2 => Some(Self::PositiveTransmitter),
            3 => Some(Self::NegativeTransmitter),
            _ => None,
        }
    }
}

/// Snapshot of one cell's five fields, in block order.
///
/// Layout: 20 bytes, one word per block.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Cell {
    /// Packed RGBA written by the last step
    pub color: u32,
    pub force: i32,
    /// Raw status word (see [`CellStatus::from_word`])
    pub status: i32,
    pub displacement: i32,
    pub velocity: i32,
}

impl Cell {
    /// Decoded status, if the word is a known one.
    pub fn status(&self) -> Option<CellStatus> {
        CellStatus::from_word(self.status)
    }
}
