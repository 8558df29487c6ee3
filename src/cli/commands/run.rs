//! Run command - install the agent and send requests through it

use crate::agent::{ActivationReport, Agent, AgentSettings, FetchOutcome, InstallReport};
use crate::cache::{BucketInfo, CacheStorage, MemoryStorage};
use crate::cli::args::{OutputFormat, RunArgs};
use crate::clients::ClientRegistry;
use crate::config::Config;
use crate::dispatch::{Dispatcher, Event, EventOutcome};
use crate::error::{OffgridError, OffgridResult};
use crate::http::Request;
use crate::journal::Journal;
use crate::network::{HttpNetwork, Network, SwitchableNetwork};
use crate::ui::{self, RequestProgress, TaskSpinner, UiContext};
use console::style;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// One request sent through the agent
#[derive(Debug, Serialize)]
struct RequestRow {
    method: String,
    url: String,
    status: Option<u16>,
    source: String,
    bytes: usize,
    error: Option<String>,
}

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> OffgridResult<()> {
    let ctx = UiContext::detect().with_quiet(args.format != OutputFormat::Table);
    let settings = AgentSettings::from_config(config)?;
    let origin = settings.origin.clone();
    let static_bucket = settings.buckets.static_bucket.clone();

    let http = HttpNetwork::new(origin.clone(), &config.network);
    let network = Arc::new(SwitchableNetwork::new(Arc::new(http)));
    let storage = Arc::new(MemoryStorage::new());
    let clients = Arc::new(ClientRegistry::new());
    clients.connect(origin.as_str()).await;

    let agent = Arc::new(
        Agent::new(settings, storage.clone(), network.clone(), clients)
            .with_journal(Journal::new(config)),
    );
    let dispatcher = Dispatcher::new(agent.clone());

    ui::intro(&ctx, &format!("offgrid {}", origin));

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Installing {}...", static_bucket));
    let (install, activation) = match dispatcher.dispatch(Event::Install).await? {
        EventOutcome::Installed {
            install,
            activation,
        } => (install, activation),
        other => {
            return Err(OffgridError::Internal(format!(
                "unexpected install outcome: {:?}",
                other
            )))
        }
    };
    report_install(&ctx, &mut spinner, &install);

    // The CLI always takes over, even when install left the worker waiting
    let activation = match activation {
        Some(report) => report,
        None => match dispatcher.dispatch(Event::Activate).await? {
            EventOutcome::Activated(report) => report,
            other => {
                return Err(OffgridError::Internal(format!(
                    "unexpected activate outcome: {:?}",
                    other
                )))
            }
        },
    };
    report_activation(&ctx, &activation);

    if args.offline {
        network.set_online(false);
        ui::step_warn_hint(&ctx, "Network offline", "only cached responses are available");
    }

    let progress = RequestProgress::new(&ctx, args.urls.len());
    let mut rows = Vec::with_capacity(args.urls.len());
    for raw in &args.urls {
        progress.on_request(raw);
        rows.push(send(&dispatcher, network.as_ref(), &origin, raw, &args).await);
        progress.on_done();
    }
    progress.finish();

    let settled = agent.background().settle().await;
    debug!("Settled {} background write(s)", settled);
    let buckets = storage.describe().await?;

    match args.format {
        OutputFormat::Table => print_table(&ctx, &rows, &buckets),
        OutputFormat::Json => print_json(&install, &activation, &rows, &buckets)?,
        OutputFormat::Plain => print_plain(&rows),
    }

    let failed = rows.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        return Err(OffgridError::User(format!(
            "{} of {} request(s) failed",
            failed,
            rows.len()
        )));
    }

    if !rows.is_empty() {
        ui::outro_success(&ctx, &format!("{} request(s) answered", rows.len()));
    }
    Ok(())
}

/// Dispatch one fetch. Passthrough requests get the host's default
/// handling, a plain network fetch.
async fn send(
    dispatcher: &Dispatcher,
    network: &dyn Network,
    origin: &url::Url,
    raw: &str,
    args: &RunArgs,
) -> RequestRow {
    let mut row = RequestRow {
        method: args.method.to_string(),
        url: raw.to_string(),
        status: None,
        source: String::new(),
        bytes: 0,
        error: None,
    };

    let request = match Request::resolve(origin, raw) {
        Ok(request) => request
            .with_method(args.method)
            .with_destination(args.destination),
        Err(e) => {
            row.error = Some(e.to_string());
            return row;
        }
    };
    row.url = request.url_str().to_string();

    let outcome = match dispatcher.dispatch(Event::Fetch(request.clone())).await {
        Ok(EventOutcome::Fetched(outcome)) => outcome,
        Ok(other) => {
            row.error = Some(format!("unexpected outcome: {:?}", other));
            return row;
        }
        Err(e) => {
            row.error = Some(e.to_string());
            return row;
        }
    };

    match outcome {
        FetchOutcome::Passthrough(reason) => {
            row.source = format!("passthrough ({})", reason);
            match network.fetch(&request).await {
                Ok(response) => {
                    row.status = Some(response.status);
                    row.bytes = response.body.len();
                }
                Err(e) => row.error = Some(e.to_string()),
            }
        }
        FetchOutcome::Respond { response, source } => {
            row.source = source.to_string();
            row.status = Some(response.status);
            row.bytes = response.body.len();
        }
    }

    row
}

fn report_install(ctx: &UiContext, spinner: &mut TaskSpinner, install: &InstallReport) {
    match install.failure {
        None => spinner.stop(&format!(
            "Installed {} ({}/{} precached)",
            install.bucket, install.stored, install.requested
        )),
        Some(ref reason) => {
            spinner.stop_warn(&format!("Installed {} without precache", install.bucket));
            ui::remark(ctx, reason);
        }
    }
}

fn report_activation(ctx: &UiContext, activation: &ActivationReport) {
    let claimed = activation
        .claimed
        .map(|n| format!("{} client(s) claimed", n))
        .unwrap_or_else(|| "claim failed".to_string());
    ui::step_ok_detail(ctx, "Activated", &claimed);

    for bucket in &activation.purged {
        ui::remark(ctx, &format!("purged {}", bucket));
    }
    for failure in &activation.failed {
        ui::step_error_detail(ctx, &format!("Could not purge {}", failure.bucket), &failure.reason);
    }
}

fn print_table(ctx: &UiContext, rows: &[RequestRow], buckets: &[BucketInfo]) {
    if !rows.is_empty() {
        ui::section(ctx, "Requests");
        println!(
            "{:<7} {:<50} {:<7} {}",
            style("METHOD").bold(),
            style("URL").bold(),
            style("STATUS").bold(),
            style("SOURCE").bold()
        );
        println!("{}", "-".repeat(86));

        for row in rows {
            let status = row
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let status = match row.status {
                Some(200..=299) => style(status).green(),
                Some(_) => style(status).yellow(),
                None => style(status).red(),
            };
            let source = match row.error {
                Some(ref e) => style(e.clone()).red(),
                None => style(row.source.clone()).dim(),
            };
            println!("{:<7} {:<50} {:<7} {}", row.method, row.url, status, source);
        }
    }

    ui::section(ctx, "Buckets");
    for bucket in buckets {
        ui::key_value(
            ctx,
            &bucket.name,
            &format!("{} entries, {} bytes", bucket.entries, bucket.size_bytes),
        );
    }
}

fn print_json(
    install: &InstallReport,
    activation: &ActivationReport,
    rows: &[RequestRow],
    buckets: &[BucketInfo],
) -> OffgridResult<()> {
    let out = serde_json::json!({
        "install": install,
        "activation": activation,
        "requests": rows,
        "buckets": buckets,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_plain(rows: &[RequestRow]) {
    for row in rows {
        let status = row
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let source = row.error.as_deref().unwrap_or(&row.source);
        println!("{} {} {} {}", row.method, row.url, status, source);
    }
}
