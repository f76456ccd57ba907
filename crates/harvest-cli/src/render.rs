//! Output rendering for text and JSON modes.

use std::fmt::Write as _;

use chrono::Utc;
use clap::ValueEnum;
use harvest_checkout::{CheckoutSnapshot, CheckoutWorkflow, Plan};
use harvest_feed::{GlobalStats, Vouch};
use serde::Serialize;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn plans(plans: &[Plan], output: OutputFormat) -> anyhow::Result<()> {
    if output == OutputFormat::Json {
        return json(&plans);
    }
    for plan in plans {
        println!("{}", plan_line(plan));
        for feature in &plan.features {
            println!("    - {feature}");
        }
    }
    Ok(())
}

fn plan_line(plan: &Plan) -> String {
    let badge = if plan.popular { "  [most popular]" } else { "" };
    format!("{:<10} {} {}{badge}", plan.name, plan.price, plan.period)
}

pub fn stats(stats: &GlobalStats, output: OutputFormat) -> anyhow::Result<()> {
    if output == OutputFormat::Json {
        return json(stats);
    }
    println!("Gold farmed     {}", stats.gold);
    println!("Elixir farmed   {}", stats.elixir);
    println!("Walls upgraded  {}", stats.walls);
    println!("Total runtime   {}", stats.runtime);
    println!("Active users    {}", stats.users);
    Ok(())
}

pub fn vouches<'a>(vouches: impl IntoIterator<Item = &'a Vouch>, output: OutputFormat) -> anyhow::Result<()> {
    let now = Utc::now();
    for vouch in vouches {
        if output == OutputFormat::Json {
            println!("{}", serde_json::to_string(vouch)?);
        } else {
            println!("{}", vouch_line(vouch, now));
        }
    }
    Ok(())
}

fn vouch_line(vouch: &Vouch, now: chrono::DateTime<Utc>) -> String {
    let mut header = vouch.display_name();
    if !vouch.name.is_empty() {
        let _ = write!(header, " @{}", vouch.username);
    }
    if let Some(age) = vouch.age(now) {
        let _ = write!(header, " ({age} ago)");
    }
    format!("{header}\n    {}", vouch.text)
}

/// Session details shown while waiting for payment
pub fn payment_started(workflow: &CheckoutWorkflow, output: OutputFormat) {
    if output == OutputFormat::Json {
        return;
    }
    if let (Some(plan), Some(session)) = (workflow.selected_plan(), workflow.session()) {
        println!("Plan:       {} {} {}", plan.name, plan.price, plan.period);
        println!("Order ID:   {}", session.order_id);
        println!("Session:    {}", session.session_id);
        println!("Waiting for payment... (Ctrl-C to cancel)");
    }
}

/// Final checkout state
pub fn checkout(snapshot: &CheckoutSnapshot, output: OutputFormat) -> anyhow::Result<()> {
    if output == OutputFormat::Json {
        return json(snapshot);
    }
    if let Some(key) = &snapshot.license_key {
        println!("Payment received. Your license key:");
        println!();
        println!("    {key}");
        println!();
    }
    if let Some(message) = &snapshot.error_message {
        eprintln!("{message}");
    }
    Ok(())
}

/// Latest toast, if still visible
pub fn toast(workflow: &CheckoutWorkflow, output: OutputFormat) {
    if output == OutputFormat::Text {
        if let Some(toast) = workflow.toasts().visible() {
            eprintln!("[{}] {}", toast.severity, toast.message);
        }
    }
}
