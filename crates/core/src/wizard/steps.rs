use serde::Serialize;

use crate::domain::answers::{
    AnswerRecord, Choice, Field, LightColor, RoofPitch, RoofType, RunLength, Selection, Side,
    StoryHeight,
};

/// How a step collects its answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Exactly one option; picking again overwrites.
    Scalar,
    /// Any non-empty subset; picking an option toggles it.
    MultiSelect,
    /// One preset, or `Custom` plus a typed length in feet.
    LengthWithCustom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub kind: StepKind,
    pub field: Field,
    pub title: &'static str,
    pub help: &'static str,
}

pub const STEP_COUNT: usize = 6;

pub const STEPS: [StepDescriptor; STEP_COUNT] = [
    StepDescriptor {
        kind: StepKind::Scalar,
        field: Field::Color,
        title: "Choose Color",
        help: "White - Warm white bulbs. Blue - Blue bulbs. R/W - Alternating red and warm white. \
               R/G - Alternating red and green. RWG - Alternating warm white, red, and green. \
               Multi - Red, green, blue, yellow, and orange.",
    },
    StepDescriptor {
        kind: StepKind::MultiSelect,
        field: Field::Sides,
        title: "Choose Sides",
        help: "Choose as many sides as you'd like. You can add or remove sides later.",
    },
    StepDescriptor {
        kind: StepKind::LengthWithCustom,
        field: Field::Length,
        title: "Choose Length",
        help: "The average home needs 80ft. Use the garage door as reference (16ft wide).",
    },
    StepDescriptor {
        kind: StepKind::Scalar,
        field: Field::Height,
        title: "Choose Height",
        help: "All 1 Story - Entire roof is one story. Mixed means a blend of one and two stories.",
    },
    StepDescriptor {
        kind: StepKind::Scalar,
        field: Field::RoofType,
        title: "Choose Roof Type",
        help: "Most roofs are shingles, but select wood or metal if applicable.",
    },
    StepDescriptor {
        kind: StepKind::Scalar,
        field: Field::RoofPitch,
        title: "Choose Roof Pitch",
        help: "Roof pitch is how steep the roof is. Most roofs have a standard pitch.",
    },
];

pub fn step(index: usize) -> Option<&'static StepDescriptor> {
    STEPS.get(index)
}

impl StepDescriptor {
    pub fn options(&self) -> Vec<&'static str> {
        match self.field {
            Field::Color => labels::<LightColor>(),
            Field::Sides => labels::<Side>(),
            Field::Length => labels::<RunLength>(),
            Field::Height => labels::<StoryHeight>(),
            Field::RoofType => labels::<RoofType>(),
            Field::RoofPitch => labels::<RoofPitch>(),
            Field::CustomLength => Vec::new(),
        }
    }

    /// Resolves user input to a selection for this step. Accepts an option
    /// label (any case) or its 1-based position in [`Self::options`].
    pub fn resolve(&self, input: &str) -> Option<Selection> {
        let input = input.trim();
        let options = self.options();
        let label = match input.parse::<usize>() {
            Ok(position) if (1..=options.len()).contains(&position) => options[position - 1],
            _ => input,
        };

        match self.field {
            Field::Color => LightColor::from_label(label).map(Selection::Color),
            Field::Sides => Side::from_label(label).map(Selection::Side),
            Field::Length => RunLength::from_label(label).map(Selection::Length),
            Field::Height => StoryHeight::from_label(label).map(Selection::Height),
            Field::RoofType => RoofType::from_label(label).map(Selection::RoofType),
            Field::RoofPitch => RoofPitch::from_label(label).map(Selection::RoofPitch),
            Field::CustomLength => None,
        }
    }

    /// Whether `label` is part of the current answer for this step.
    pub fn is_selected(&self, answers: &AnswerRecord, label: &str) -> bool {
        match self.field {
            Field::Color => answers.color.map(LightColor::label) == Some(label),
            Field::Sides => answers.sides.iter().any(|side| side.label() == label),
            Field::Length => answers.length.map(RunLength::label) == Some(label),
            Field::Height => answers.height.map(StoryHeight::label) == Some(label),
            Field::RoofType => answers.roof_type.map(RoofType::label) == Some(label),
            Field::RoofPitch => answers.roof_pitch.map(RoofPitch::label) == Some(label),
            Field::CustomLength => false,
        }
    }

    /// The first field this step still needs, if any.
    pub fn missing_field(&self, answers: &AnswerRecord) -> Option<Field> {
        if !answers.is_present(self.field) {
            return Some(self.field);
        }
        match self.kind {
            StepKind::Scalar | StepKind::MultiSelect => None,
            StepKind::LengthWithCustom => {
                (!answers.is_present(Field::CustomLength)).then_some(Field::CustomLength)
            }
        }
    }

    pub fn accepts_custom_length(&self, answers: &AnswerRecord) -> bool {
        self.kind == StepKind::LengthWithCustom && answers.is_custom_length()
    }
}

fn labels<C: Choice>() -> Vec<&'static str> {
    C::ALL.iter().map(|choice| choice.label()).collect()
}
