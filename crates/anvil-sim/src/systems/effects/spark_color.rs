//! Warm palette for impact sparks.

use super::rng::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SparkColor {
    Gold = 0,
    Orange,
    RedOrange,
    Tomato,
    Yellow,
    GoldenYellow,
    DarkOrange,
    Coral,
}

impl SparkColor {
    pub const ALL: [SparkColor; 8] = [
        Self::Gold, Self::Orange, Self::RedOrange, Self::Tomato,
        Self::Yellow, Self::GoldenYellow, Self::DarkOrange, Self::Coral,
    ];

    pub fn random(rng: &mut Rng) -> Self {
        Self::ALL[rng.next_int(Self::ALL.len() as u32) as usize]
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Gold =>         (0xFF, 0xD7, 0x00),
            Self::Orange =>       (0xFF, 0xA5, 0x00),
            Self::RedOrange =>    (0xFF, 0x45, 0x00),
            Self::Tomato =>       (0xFF, 0x63, 0x47),
            Self::Yellow =>       (0xFF, 0xFF, 0x00),
            Self::GoldenYellow => (0xFF, 0xE1, 0x35),
            Self::DarkOrange =>   (0xFF, 0x8C, 0x00),
            Self::Coral =>        (0xFF, 0x7F, 0x50),
        }
    }
}
