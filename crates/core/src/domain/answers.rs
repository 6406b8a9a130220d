use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A closed set of options presented by one wizard step.
///
/// `label` is the exact string exchanged with the pricing and checkout
/// services, so it doubles as the display text.
pub trait Choice: Copy + Eq + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn from_label(label: &str) -> Option<Self> {
        let wanted = label.trim();
        Self::ALL.iter().copied().find(|choice| choice.label().eq_ignore_ascii_case(wanted))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LightColor {
    #[serde(rename = "White")]
    White,
    #[serde(rename = "Blue")]
    Blue,
    #[serde(rename = "R/W")]
    RedWhite,
    #[serde(rename = "R/G")]
    RedGreen,
    #[serde(rename = "RWG")]
    RedWhiteGreen,
    #[serde(rename = "Multi")]
    Multi,
}

impl Choice for LightColor {
    const ALL: &'static [Self] = &[
        Self::White,
        Self::Blue,
        Self::RedWhite,
        Self::RedGreen,
        Self::RedWhiteGreen,
        Self::Multi,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Blue => "Blue",
            Self::RedWhite => "R/W",
            Self::RedGreen => "R/G",
            Self::RedWhiteGreen => "RWG",
            Self::Multi => "Multi",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Front,
    Back,
    Left,
    Right,
}

impl Choice for Side {
    const ALL: &'static [Self] = &[Self::Front, Self::Back, Self::Left, Self::Right];

    fn label(self) -> &'static str {
        match self {
            Self::Front => "Front",
            Self::Back => "Back",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RunLength {
    #[serde(rename = "50ft")]
    Feet50,
    #[serde(rename = "75ft")]
    Feet75,
    #[serde(rename = "100ft")]
    Feet100,
    #[serde(rename = "125ft")]
    Feet125,
    #[serde(rename = "150ft")]
    Feet150,
    #[serde(rename = "175ft")]
    Feet175,
    #[serde(rename = "200ft")]
    Feet200,
    #[serde(rename = "Custom")]
    Custom,
}

impl RunLength {
    /// Preset run length in feet; `None` for `Custom`.
    pub fn feet(self) -> Option<u32> {
        match self {
            Self::Feet50 => Some(50),
            Self::Feet75 => Some(75),
            Self::Feet100 => Some(100),
            Self::Feet125 => Some(125),
            Self::Feet150 => Some(150),
            Self::Feet175 => Some(175),
            Self::Feet200 => Some(200),
            Self::Custom => None,
        }
    }
}

impl Choice for RunLength {
    const ALL: &'static [Self] = &[
        Self::Feet50,
        Self::Feet75,
        Self::Feet100,
        Self::Feet125,
        Self::Feet150,
        Self::Feet175,
        Self::Feet200,
        Self::Custom,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::Feet50 => "50ft",
            Self::Feet75 => "75ft",
            Self::Feet100 => "100ft",
            Self::Feet125 => "125ft",
            Self::Feet150 => "150ft",
            Self::Feet175 => "175ft",
            Self::Feet200 => "200ft",
            Self::Custom => "Custom",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StoryHeight {
    #[serde(rename = "All 1 Story")]
    AllOneStory,
    #[serde(rename = "Mostly 1 Story")]
    MostlyOneStory,
    #[serde(rename = "Mixed 1S + 2S")]
    Mixed,
    #[serde(rename = "Mostly 2 Story")]
    MostlyTwoStory,
    #[serde(rename = "All 2 Story")]
    AllTwoStory,
}

impl Choice for StoryHeight {
    const ALL: &'static [Self] = &[
        Self::AllOneStory,
        Self::MostlyOneStory,
        Self::Mixed,
        Self::MostlyTwoStory,
        Self::AllTwoStory,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::AllOneStory => "All 1 Story",
            Self::MostlyOneStory => "Mostly 1 Story",
            Self::Mixed => "Mixed 1S + 2S",
            Self::MostlyTwoStory => "Mostly 2 Story",
            Self::AllTwoStory => "All 2 Story",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoofType {
    Metal,
    Shingles,
    Wood,
}

impl Choice for RoofType {
    const ALL: &'static [Self] = &[Self::Metal, Self::Shingles, Self::Wood];

    fn label(self) -> &'static str {
        match self {
            Self::Metal => "Metal",
            Self::Shingles => "Shingles",
            Self::Wood => "Wood",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoofPitch {
    Steep,
    Standard,
    Low,
    Flat,
}

impl Choice for RoofPitch {
    const ALL: &'static [Self] = &[Self::Steep, Self::Standard, Self::Low, Self::Flat];

    fn label(self) -> &'static str {
        match self {
            Self::Steep => "Steep",
            Self::Standard => "Standard",
            Self::Low => "Low",
            Self::Flat => "Flat",
        }
    }
}

/// Keys of [`AnswerRecord`], named as they appear on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Color,
    Sides,
    Length,
    CustomLength,
    Height,
    RoofType,
    RoofPitch,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Color,
        Field::Sides,
        Field::Length,
        Field::CustomLength,
        Field::Height,
        Field::RoofType,
        Field::RoofPitch,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Sides => "sides",
            Self::Length => "length",
            Self::CustomLength => "customLength",
            Self::Height => "height",
            Self::RoofType => "roofType",
            Self::RoofPitch => "roofPitch",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One user choice, typed by the field it targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    Color(LightColor),
    Side(Side),
    Length(RunLength),
    CustomLength(String),
    Height(StoryHeight),
    RoofType(RoofType),
    RoofPitch(RoofPitch),
}

impl Selection {
    pub fn field(&self) -> Field {
        match self {
            Self::Color(_) => Field::Color,
            Self::Side(_) => Field::Sides,
            Self::Length(_) => Field::Length,
            Self::CustomLength(_) => Field::CustomLength,
            Self::Height(_) => Field::Height,
            Self::RoofType(_) => Field::RoofType,
            Self::RoofPitch(_) => Field::RoofPitch,
        }
    }
}

/// Answers accumulated by one wizard run. Serializes to the payload the
/// pricing service expects.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub color: Option<LightColor>,
    #[serde(default)]
    pub sides: BTreeSet<Side>,
    pub length: Option<RunLength>,
    #[serde(default)]
    pub custom_length: String,
    pub height: Option<StoryHeight>,
    pub roof_type: Option<RoofType>,
    pub roof_pitch: Option<RoofPitch>,
}

impl AnswerRecord {
    /// Applies a selection. Sides toggle; picking `Custom` clears any
    /// previously typed custom length.
    pub fn apply(&mut self, selection: Selection) {
        match selection {
            Selection::Color(color) => self.color = Some(color),
            Selection::Side(side) => {
                if !self.sides.remove(&side) {
                    self.sides.insert(side);
                }
            }
            Selection::Length(length) => {
                if length == RunLength::Custom {
                    self.custom_length.clear();
                }
                self.length = Some(length);
            }
            Selection::CustomLength(value) => self.custom_length = value,
            Selection::Height(height) => self.height = Some(height),
            Selection::RoofType(roof_type) => self.roof_type = Some(roof_type),
            Selection::RoofPitch(roof_pitch) => self.roof_pitch = Some(roof_pitch),
        }
    }

    pub fn is_custom_length(&self) -> bool {
        self.length == Some(RunLength::Custom)
    }

    /// Custom length in whole feet, if one was typed and parses as a
    /// positive number.
    pub fn custom_length_feet(&self) -> Option<u32> {
        self.custom_length.trim().parse::<u32>().ok().filter(|feet| *feet > 0)
    }

    /// Total run length in feet, resolving `Custom` through the typed value.
    pub fn length_feet(&self) -> Option<u32> {
        match self.length? {
            RunLength::Custom => self.custom_length_feet(),
            preset => preset.feet(),
        }
    }

    /// `customLength` only counts when `Custom` is the chosen length.
    pub fn is_present(&self, field: Field) -> bool {
        match field {
            Field::Color => self.color.is_some(),
            Field::Sides => !self.sides.is_empty(),
            Field::Length => self.length.is_some(),
            Field::CustomLength => !self.is_custom_length() || self.custom_length_feet().is_some(),
            Field::Height => self.height.is_some(),
            Field::RoofType => self.roof_type.is_some(),
            Field::RoofPitch => self.roof_pitch.is_some(),
        }
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|field| !self.is_present(*field)).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}
