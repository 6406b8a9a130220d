use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use lightquote_client::{HttpCheckoutService, HttpPricingService, TracingAuditSink};
use lightquote_core::audit::AuditSink;
use lightquote_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use lightquote_core::domain::answers::{RunLength, Selection};
use lightquote_core::domain::customer::ContactField;
use lightquote_core::domain::quote::{OrderReceipt, QuoteHandoff};
use lightquote_core::errors::ApplicationError;
use lightquote_core::order::OrderSession;
use lightquote_core::services::{CheckoutService, PricingService};
use lightquote_core::wizard::{Advance, StepKind, WizardController, WizardSession, STEP_COUNT};
use tracing::info;

use crate::commands::CommandResult;

const COMMAND_HELP: &str = "Type a number or label to choose, `custom <feet>`, `next`, `back`, \
                            `restart` or `quit`. Option labels win over commands, so use `b` \
                            to go back from the sides step.";

#[derive(Debug)]
pub enum QuoteOutcome {
    Ordered(OrderReceipt),
    Abandoned,
}

pub fn run(overrides: ConfigOverrides) -> CommandResult {
    let config = match AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("quote", "config_validation", error.to_string(), 2)
        }
    };
    crate::init_logging(&config);

    let services = HttpPricingService::from_app_config(&config)
        .and_then(|pricing| Ok((pricing, HttpCheckoutService::from_app_config(&config)?)));
    let (pricing, checkout) = match services {
        Ok(services) => services,
        Err(error) => {
            let error =
                ApplicationError::Configuration(error.to_string()).into_interface("bootstrap");
            return CommandResult::failure("quote", error.error_class(), error.to_string(), 4);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("quote", "runtime", error.to_string(), 5),
    };

    let audit_sink: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let controller = WizardController::new(pricing).with_audit_sink(audit_sink.clone());
    let stdin = io::stdin();
    let stdout = io::stdout();
    let outcome = runtime.block_on(drive(
        &controller,
        checkout,
        audit_sink,
        &mut stdin.lock(),
        &mut stdout.lock(),
    ));

    match outcome {
        Ok(QuoteOutcome::Ordered(receipt)) => CommandResult::success(
            "quote",
            format!("order placed for session {} at ${:.2}", receipt.session_id, receipt.amount),
        ),
        Ok(QuoteOutcome::Abandoned) => CommandResult::success("quote", "no order placed"),
        Err(error) => CommandResult::failure("quote", "io", error.to_string(), 1),
    }
}

/// Runs one wizard and, once quoted, one order over a line-oriented terminal.
/// End of input at any prompt abandons the run.
pub async fn drive<P, C, R, W>(
    controller: &WizardController<P>,
    checkout: C,
    audit_sink: Arc<dyn AuditSink>,
    input: &mut R,
    output: &mut W,
) -> Result<QuoteOutcome>
where
    P: PricingService,
    C: CheckoutService,
    R: BufRead,
    W: Write,
{
    let Some(handoff) = collect_answers(controller, input, output).await? else {
        return Ok(QuoteOutcome::Abandoned);
    };
    info!(
        event_name = "cli.quote.received",
        session_id = %handoff.session_id,
        amount = %handoff.quote.amount,
        "quote ready for ordering"
    );

    let order = OrderSession::new(handoff, checkout).with_audit_sink(audit_sink);
    place_order(order, input, output).await
}

async fn collect_answers<P, R, W>(
    controller: &WizardController<P>,
    input: &mut R,
    output: &mut W,
) -> Result<Option<QuoteHandoff>>
where
    P: PricingService,
    R: BufRead,
    W: Write,
{
    let mut session = WizardSession::new();
    writeln!(output, "Lighting quote {}", session.id())?;
    writeln!(output, "{COMMAND_HELP}")?;

    loop {
        render_step(&session, output)?;
        let Some(line) = prompt(input, output, "> ")? else {
            return Ok(None);
        };
        let line = line.trim();
        if let Some(selection) = session.current_step().resolve(line) {
            controller.select_option(&mut session, selection);
            continue;
        }
        let (command, argument) = line
            .split_once(char::is_whitespace)
            .map(|(command, argument)| (command, argument.trim()))
            .unwrap_or((line, ""));

        match command.to_ascii_lowercase().as_str() {
            "" => {}
            "quit" | "q" => return Ok(None),
            "back" | "b" => {
                if !controller.retreat(&mut session) {
                    writeln!(output, "Already on the first step.")?;
                }
            }
            "restart" => {
                if let Err(error) = controller.restart(&mut session) {
                    let error = error.into_interface(session.id().to_string());
                    writeln!(output, "{}", error.user_message())?;
                }
            }
            "next" | "n" => {
                if session.is_last_step() {
                    writeln!(output, "Calculating price...")?;
                }
                match controller.advance(&mut session).await {
                    Ok(Advance::Moved { .. }) => {}
                    Ok(Advance::Quoted(handoff)) => return Ok(Some(handoff)),
                    Err(error) => {
                        if session.validation_error().is_none() {
                            let error = error.into_interface(session.id().to_string());
                            writeln!(output, "{}", error.user_message())?;
                        }
                    }
                }
            }
            "custom" if !argument.is_empty() => {
                if session.current_step().kind != StepKind::LengthWithCustom {
                    writeln!(output, "Custom lengths only apply to the length step.")?;
                    continue;
                }
                if !session.answers().is_custom_length() {
                    controller.select_option(&mut session, Selection::Length(RunLength::Custom));
                }
                let typed = Selection::CustomLength(argument.to_owned());
                controller.select_option(&mut session, typed);
            }
            _ => writeln!(output, "Unknown option `{line}`.")?,
        }
    }
}

async fn place_order<C, R, W>(
    mut order: OrderSession<C>,
    input: &mut R,
    output: &mut W,
) -> Result<QuoteOutcome>
where
    C: CheckoutService,
    R: BufRead,
    W: Write,
{
    writeln!(output, "Estimated price: ${:.2}", order.quote().amount)?;
    writeln!(output, "Enter your contact details to place the order.")?;

    for field in ContactField::ALL {
        let label = match field {
            ContactField::Name => "Name: ",
            ContactField::Email => "Email: ",
            ContactField::Phone => "Phone: ",
        };
        let Some(value) = prompt(input, output, label)? else {
            return Ok(QuoteOutcome::Abandoned);
        };
        order.update_contact_field(field, value.trim());
    }

    loop {
        match order.submit_order().await {
            Ok(receipt) => {
                writeln!(output, "Order placed.")?;
                if let Some(message) = &receipt.message {
                    writeln!(output, "{message}")?;
                }
                return Ok(QuoteOutcome::Ordered(receipt));
            }
            Err(error) if !error.is_retryable() => {
                let error = error.into_interface(order.session_id().to_string());
                writeln!(output, "{}", error.user_message())?;
                return Ok(QuoteOutcome::Abandoned);
            }
            Err(error) => {
                let reason =
                    order.last_error().map(str::to_owned).unwrap_or_else(|| error.to_string());
                writeln!(output, "Order failed: {reason}")?;
                let retry = prompt(input, output, "Retry? [y/N] ")?;
                let retry = retry.as_deref().map(str::trim).map(str::to_ascii_lowercase);
                if !matches!(retry.as_deref(), Some("y" | "yes")) {
                    return Ok(QuoteOutcome::Abandoned);
                }
            }
        }
    }
}

fn render_step<W: Write>(session: &WizardSession, output: &mut W) -> io::Result<()> {
    let step = session.current_step();
    let answers = session.answers();

    writeln!(output)?;
    writeln!(output, "Step {}/{STEP_COUNT}: {}", session.step_index() + 1, step.title)?;
    writeln!(output, "{}", step.help)?;
    for (position, label) in step.options().into_iter().enumerate() {
        let marker = if step.is_selected(answers, label) { "x" } else { " " };
        writeln!(output, "  {}) [{marker}] {label}", position + 1)?;
    }
    if step.accepts_custom_length(answers) {
        let typed = answers.custom_length.trim();
        let typed = if typed.is_empty() { "<not set>" } else { typed };
        writeln!(output, "  custom length: {typed} ft")?;
    }
    if let Some(error) = session.validation_error() {
        writeln!(output, "! {error}")?;
    }
    Ok(())
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<Option<String>> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_owned()))
}
