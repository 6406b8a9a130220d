use lightquote_client::{HttpCheckoutService, HttpPricingService};
use lightquote_core::config::{AppConfig, EndpointConfig, LoadOptions};
use lightquote_core::domain::answers::AnswerRecord;
use lightquote_core::wizard::{StepDescriptor, STEPS};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 3 };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult::text(exit_code, output);
    }

    CommandResult::text(exit_code, render_human(&report))
}

fn build_report() -> DoctorReport {
    let mut checks = vec![check_step_catalog(&STEPS)];

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_endpoint("pricing_client", &config.pricing, |endpoint| {
                HttpPricingService::new(endpoint).map(|_| ())
            }));
            checks.push(check_endpoint("checkout_client", &config.checkout, |endpoint| {
                HttpCheckoutService::new(endpoint).map(|_| ())
            }));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["pricing_client", "checkout_client"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_step_catalog(steps: &[StepDescriptor]) -> DoctorCheck {
    let mut problems = Vec::new();

    for step in steps {
        let options = step.options();
        if options.is_empty() {
            problems.push(format!("{} offers no options", step.title));
        }
        for (position, label) in options.into_iter().enumerate() {
            let by_label = step.resolve(label);
            let by_position = step.resolve(&(position + 1).to_string());
            let Some(selection) = by_label.filter(|chosen| Some(chosen) == by_position.as_ref())
            else {
                problems.push(format!(
                    "{}: `{label}` does not resolve to option {}",
                    step.title,
                    position + 1
                ));
                continue;
            };

            let mut answers = AnswerRecord::default();
            answers.apply(selection);
            if !step.is_selected(&answers, label) {
                problems.push(format!("{}: `{label}` is not marked once chosen", step.title));
            }
        }
    }

    if problems.is_empty() {
        DoctorCheck {
            name: "step_catalog",
            status: CheckStatus::Pass,
            details: format!("{} steps, every option resolves by label and number", steps.len()),
        }
    } else {
        DoctorCheck {
            name: "step_catalog",
            status: CheckStatus::Fail,
            details: problems.join("; "),
        }
    }
}

fn check_endpoint<E: std::fmt::Display>(
    name: &'static str,
    endpoint: &EndpointConfig,
    build: impl FnOnce(&EndpointConfig) -> Result<(), E>,
) -> DoctorCheck {
    match build(endpoint) {
        Ok(()) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!(
                "client ready for `{}` (timeout {}s, auth {})",
                endpoint.url,
                endpoint.timeout_secs,
                if endpoint.api_key.is_some() { "configured" } else { "none" }
            ),
        },
        Err(error) => DoctorCheck { name, status: CheckStatus::Fail, details: error.to_string() },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
