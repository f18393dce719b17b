use std::fmt::Display;

use ansi_term::Colour;
use serde::Serialize;

/// The six colors activity types are painted with. A type only gets one if it's among the first
/// six of whatever ordering is used to assign them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum ActivityColor {
    Rose,
    Mint,
    Periwinkle,
    Butter,
    Orchid,
    Aqua,
}

impl ActivityColor {
    pub const ALL: [ActivityColor; 6] = [
        ActivityColor::Rose,
        ActivityColor::Mint,
        ActivityColor::Periwinkle,
        ActivityColor::Butter,
        ActivityColor::Orchid,
        ActivityColor::Aqua,
    ];

    pub fn from_position(position: usize) -> Option<Self> {
        Self::ALL.get(position).copied()
    }

    pub fn hex(&self) -> &'static str {
        match self {
            ActivityColor::Rose => "#faa",
            ActivityColor::Mint => "#afa",
            ActivityColor::Periwinkle => "#aaf",
            ActivityColor::Butter => "#ffa",
            ActivityColor::Orchid => "#faf",
            ActivityColor::Aqua => "#aff",
        }
    }

    /// Terminal equivalent of [ActivityColor::hex].
    pub fn terminal(&self) -> Colour {
        match self {
            ActivityColor::Rose => Colour::RGB(0xff, 0xaa, 0xaa),
            ActivityColor::Mint => Colour::RGB(0xaa, 0xff, 0xaa),
            ActivityColor::Periwinkle => Colour::RGB(0xaa, 0xaa, 0xff),
            ActivityColor::Butter => Colour::RGB(0xff, 0xff, 0xaa),
            ActivityColor::Orchid => Colour::RGB(0xff, 0xaa, 0xff),
            ActivityColor::Aqua => Colour::RGB(0xaa, 0xff, 0xff),
        }
    }
}

impl From<ActivityColor> for &'static str {
    fn from(value: ActivityColor) -> Self {
        value.hex()
    }
}

impl Display for ActivityColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hex())
    }
}

#[cfg(test)]
mod tests {
    use super::ActivityColor;

    #[test]
    fn only_six_positions_have_colors() {
        assert_eq!(ActivityColor::from_position(0), Some(ActivityColor::Rose));
        assert_eq!(ActivityColor::from_position(1).unwrap().hex(), "#afa");
        assert_eq!(ActivityColor::from_position(5), Some(ActivityColor::Aqua));
        assert_eq!(ActivityColor::from_position(6), None);
    }

    #[test]
    fn serializes_as_hex() {
        assert_eq!(serde_json::to_string(&ActivityColor::Mint).unwrap(), "\"#afa\"");
    }
}
