//! Subcommand handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use harvest_checkout::{
    CheckoutDriver, CheckoutWorkflow, HttpPaymentClient, MockPaymentApi, PaymentApi, Phase, Settlement, catalogue,
    find_plan,
};
use harvest_feed::{FeedApi, HttpFeedClient, REFRESH_INTERVAL, VouchFeed, stats_or_default};

use crate::config::Settings;
use crate::render::{self, OutputFormat};
use crate::terminal::{self, TerminalClipboard};

/// Options for `harvest buy`
#[derive(Debug, Clone)]
pub struct BuyOptions {
    pub plan: String,
    pub mock: bool,
    pub max_polls: Option<u64>,
    pub copy: bool,
}

pub fn plans(output: OutputFormat) -> anyhow::Result<()> {
    render::plans(&catalogue(), output)
}

pub async fn stats(settings: &Settings, output: OutputFormat) -> anyhow::Result<()> {
    let client = HttpFeedClient::new(settings.feed_config())?;
    let stats = stats_or_default(&client).await;
    render::stats(&stats, output)
}

pub async fn vouches(settings: &Settings, watch: bool, output: OutputFormat) -> anyhow::Result<()> {
    let client: Arc<dyn FeedApi> = Arc::new(HttpFeedClient::new(settings.feed_config())?);
    let mut feed = VouchFeed::new(client).with_limit(settings.vouch_limit);

    if let Err(e) = feed.refresh().await {
        if !watch {
            let message = e.user_message();
            return Err(e).context(message);
        }
    }
    render::vouches(feed.board().iter(), output)?;

    if watch {
        let mut render_error = None;
        feed.watch(REFRESH_INTERVAL, shutdown_signal(), |arrivals| {
            if let Err(e) = render::vouches(arrivals, output) {
                render_error.get_or_insert(e);
            }
        })
        .await;
        if let Some(e) = render_error {
            return Err(e);
        }
    }
    Ok(())
}

pub async fn buy(settings: &Settings, options: BuyOptions, output: OutputFormat) -> anyhow::Result<()> {
    let plan = find_plan(&options.plan)?;
    let api = payment_api(settings, options.mock)?;
    tracing::info!(backend = api.name(), plan = %plan.name, "Starting checkout");

    let mut driver = CheckoutDriver::new(settings.poll_interval);
    if let Some(max) = options.max_polls {
        driver = driver.with_max_polls(max);
    }

    let mut workflow = CheckoutWorkflow::new(api);
    if let Err(e) = workflow.select_plan(plan).await {
        render::checkout(&workflow.snapshot(), output)?;
        return Err(e.into());
    }

    loop {
        render::payment_started(&workflow, output);

        match driver.await_settlement(&mut workflow, shutdown_signal()).await {
            Ok(Settlement::Settled(Phase::Success)) => {
                render::checkout(&workflow.snapshot(), output)?;
                if options.copy {
                    copy_license(&mut workflow, output);
                }
                return Ok(());
            }
            Ok(Settlement::Settled(Phase::Expired)) => {
                if output == OutputFormat::Text {
                    eprintln!("Payment session expired.");
                }
                let answer = if output == OutputFormat::Text && terminal::interactive() {
                    terminal::confirm_or_cancel(
                        || terminal::confirm("Try again?", &mut std::io::stdin().lock()),
                        shutdown_signal(),
                    )
                    .await
                } else {
                    Some(false)
                };
                match answer {
                    Some(true) => {
                        if let Err(e) = workflow.retry().await {
                            render::checkout(&workflow.snapshot(), output)?;
                            return Err(e.into());
                        }
                        continue;
                    }
                    Some(false) => {}
                    None => {
                        eprintln!();
                        eprintln!("Checkout cancelled.");
                        workflow.close().await;
                        return Ok(());
                    }
                }
                render::checkout(&workflow.snapshot(), output)?;
                workflow.close().await;
                anyhow::bail!("payment session expired");
            }
            Ok(Settlement::Settled(phase)) => {
                tracing::debug!(%phase, "Checkout settled");
                render::checkout(&workflow.snapshot(), output)?;
                return Ok(());
            }
            Ok(Settlement::Cancelled) => {
                if output == OutputFormat::Text {
                    eprintln!("Checkout cancelled.");
                }
                render::checkout(&workflow.snapshot(), output)?;
                return Ok(());
            }
            Ok(Settlement::GaveUp { polls }) => {
                render::checkout(&workflow.snapshot(), output)?;
                let session = workflow
                    .session()
                    .map(|s| s.session_id.to_string())
                    .unwrap_or_default();
                anyhow::bail!("payment still pending after {polls} checks; session {session} left open");
            }
            Err(e) => {
                render::checkout(&workflow.snapshot(), output)?;
                return Err(e.into());
            }
        }
    }
}

fn payment_api(settings: &Settings, mock: bool) -> anyhow::Result<Arc<dyn PaymentApi>> {
    if mock || settings.mock {
        tracing::warn!("Using the simulated payment service");
        return Ok(Arc::new(MockPaymentApi::new().with_latency(Duration::from_millis(300))));
    }
    let client = HttpPaymentClient::new(settings.payment_config())
        .with_context(|| format!("invalid payment API settings for {}", settings.api_url))?;
    Ok(Arc::new(client))
}

fn copy_license(workflow: &mut CheckoutWorkflow, output: OutputFormat) {
    let Some(mut clipboard) = TerminalClipboard::stdout() else {
        tracing::debug!("stdout is not a terminal, skipping clipboard");
        return;
    };
    if let Err(e) = workflow.copy_license(&mut clipboard) {
        tracing::debug!(error = %e, "Clipboard write failed");
    }
    render::toast(workflow, output);
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_settings() -> Settings {
        Settings {
            mock: true,
            poll_interval: Duration::from_secs(1),
            ..Settings::default()
        }
    }

    fn options(plan: &str) -> BuyOptions {
        BuyOptions {
            plan: plan.into(),
            mock: false,
            max_polls: None,
            copy: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_buy_completes() {
        buy(&mock_settings(), options("weekly"), OutputFormat::Json).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_cap_is_an_error() {
        let opts = BuyOptions {
            max_polls: Some(1),
            ..options("monthly")
        };
        let err = buy(&mock_settings(), opts, OutputFormat::Json).await.unwrap_err();
        assert!(err.to_string().contains("after 1 checks"));
    }

    #[tokio::test]
    async fn test_unknown_plan() {
        assert!(buy(&mock_settings(), options("yearly"), OutputFormat::Json).await.is_err());
    }
}
