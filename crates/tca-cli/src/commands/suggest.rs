// `tca suggest`: one-shot lookup, or an interactive session where each stdin
// line is the current contents of the search box.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tca_client::{ClientError, Debouncer, LatestRequest, Module, Suggestion, Ticket};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::debug;

use super::Context;
use crate::output::{OutputFormat, print_anyhow_error, print_output};

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Module id (pessoa, documento, ...) or English name
    pub module: Module,

    /// Partial term to complete
    #[arg(required_unless_present = "interactive")]
    pub term: Option<String>,

    /// Read successive terms from stdin, debounced
    #[arg(long, conflicts_with = "term")]
    pub interactive: bool,
}

#[derive(Serialize)]
struct SuggestOutput<'a> {
    term: &'a str,
    suggestions: &'a [Suggestion],
}

/// What to do with a finished suggestion request
#[derive(Debug)]
enum Outcome {
    /// A newer term was issued meanwhile
    Stale,
    Show(Vec<Suggestion>),
    Failed(ClientError),
    /// The session was rejected; stop asking
    Expired(ClientError),
}

pub async fn run(ctx: &Context, args: SuggestArgs) -> anyhow::Result<()> {
    ctx.require_session()?;
    ctx.require_backend().await?;

    if args.interactive {
        return interactive(ctx, args.module).await;
    }

    let term = args.term.unwrap_or_default();
    let suggestions = ctx
        .client
        .data()
        .fetch_suggestions(args.module, &term)
        .await?;
    show(ctx.format, &term, &suggestions)
}

async fn interactive(ctx: &Context, module: Module) -> anyhow::Result<()> {
    let (tx, rx) = watch::channel(String::new());
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut debouncer = Debouncer::with_default_delay(rx);
    let latest = LatestRequest::new();
    let mut tasks: JoinSet<anyhow::Result<()>> = JoinSet::new();
    let mut failure = None;

    while let Some(term) = debouncer.next().await {
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined? {
                failure = Some(e);
            }
        }
        if failure.is_some() || !ctx.client.session().is_authenticated() {
            break;
        }

        let ticket = latest.issue(&term);
        debug!("Requesting suggestions for {:?}", ticket.term());

        let client = Arc::clone(&ctx.client);
        let latest = latest.clone();
        let format = ctx.format;
        tasks.spawn(async move {
            let result = client
                .data()
                .fetch_suggestions(module, ticket.term())
                .await;
            match settle(&latest, &ticket, result) {
                Outcome::Stale => {
                    debug!("Discarding stale suggestions for {:?}", ticket.term());
                    Ok(())
                }
                Outcome::Show(suggestions) => show(format, ticket.term(), &suggestions),
                Outcome::Failed(err) => {
                    print_anyhow_error(format, &anyhow::Error::new(err));
                    Ok(())
                }
                Outcome::Expired(err) => Err(anyhow::Error::new(err)),
            }
        });
    }

    reader.abort();
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined? {
            failure.get_or_insert(e);
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn settle(
    latest: &LatestRequest,
    ticket: &Ticket,
    result: Result<Vec<Suggestion>, ClientError>,
) -> Outcome {
    match result {
        Err(err) if err.is_auth_expired() => Outcome::Expired(err),
        result => match latest.accept(ticket, result) {
            None => Outcome::Stale,
            Some(Ok(suggestions)) => Outcome::Show(suggestions),
            Some(Err(err)) => Outcome::Failed(err),
        },
    }
}

fn show(format: OutputFormat, term: &str, suggestions: &[Suggestion]) -> anyhow::Result<()> {
    let output = SuggestOutput { term, suggestions };
    print_output(format, &output, render_suggestions)?;
    Ok(())
}

fn render_suggestions(output: &SuggestOutput<'_>) -> String {
    if output.suggestions.is_empty() {
        return format!("{}: (no suggestions)", output.term);
    }
    let mut lines = vec![format!("{}:", output.term)];
    lines.extend(
        output
            .suggestions
            .iter()
            .map(|s| format!("  {:<12} {}", s.id, s.label)),
    );
    lines.join("\n")
}
