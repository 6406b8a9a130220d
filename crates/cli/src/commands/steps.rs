use lightquote_core::domain::answers::Field;
use lightquote_core::wizard::{StepDescriptor, StepKind, STEPS};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct StepEntry {
    number: usize,
    title: &'static str,
    field: Field,
    kind: StepKind,
    options: Vec<&'static str>,
    help: &'static str,
}

impl StepEntry {
    fn new(index: usize, step: &StepDescriptor) -> Self {
        Self {
            number: index + 1,
            title: step.title,
            field: step.field,
            kind: step.kind,
            options: step.options(),
            help: step.help,
        }
    }
}

pub fn run(json_output: bool) -> CommandResult {
    let entries: Vec<StepEntry> =
        STEPS.iter().enumerate().map(|(index, step)| StepEntry::new(index, step)).collect();

    if json_output {
        return match serde_json::to_string_pretty(&entries) {
            Ok(output) => CommandResult::text(0, output),
            Err(error) => CommandResult::failure("steps", "serialization", error.to_string(), 1),
        };
    }

    let mut lines = Vec::new();
    for entry in &entries {
        let kind = match entry.kind {
            StepKind::Scalar => "pick one",
            StepKind::MultiSelect => "pick one or more",
            StepKind::LengthWithCustom => "pick one, or Custom with a length in feet",
        };
        lines.push(format!("{}. {} ({kind})", entry.number, entry.title));
        lines.push(format!("   options: {}", entry.options.join(", ")));
    }
    CommandResult::text(0, lines.join("\n"))
}
