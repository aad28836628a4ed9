// Read-only record commands: health, modules, list, search-all and the
// per-person lookups.

use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use tca_client::{
    AggregatedPersonRecord, Module, PageQuery, PageResult, Reachability, Record, Role,
    constants::DEFAULT_PAGE_SIZE,
};

use super::Context;
use crate::output::{print_output, render_records};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Module id (pessoa, documento, ...) or English name
    pub module: Module,

    /// 1-based page number
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Records per page
    #[arg(
        long,
        default_value_t = DEFAULT_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub limit: u32,

    /// Free-text filter
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args, Debug)]
pub struct SearchAllArgs {
    /// Registration number, CPF or name
    pub term: String,
}

#[derive(Args, Debug)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Serialize)]
struct HealthOutput {
    base_url: String,
    reachability: Reachability,
}

#[derive(Serialize)]
struct ModuleEntry {
    id: &'static str,
    name: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct ExistsOutput<'a> {
    id: &'a str,
    exists: bool,
}

pub async fn health(ctx: &Context) -> anyhow::Result<()> {
    let reachability = ctx.client.health().check().await;
    let output = HealthOutput {
        base_url: ctx.client.config().base_url.clone(),
        reachability,
    };

    print_output(ctx.format, &output, |o| match o.reachability {
        Reachability::Reachable => format!("{} is reachable", o.base_url),
        Reachability::Unreachable | Reachability::Unknown => {
            format!("{} is unreachable", o.base_url)
        }
    })?;

    if reachability == Reachability::Unreachable {
        anyhow::bail!(tca_client::ClientError::ConnectionRefused(
            output.base_url
        ));
    }
    Ok(())
}

pub fn modules(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.require_session()?;
    let entries: Vec<ModuleEntry> = Module::visible_to(session.role_kind())
        .into_iter()
        .map(|m| ModuleEntry {
            id: m.as_str(),
            name: m.display_name(),
            description: m.description(),
        })
        .collect();

    print_output(ctx.format, &entries, |entries| {
        entries
            .iter()
            .map(|e| format!("{:<14}{:<28}{}", e.id, e.name, e.description))
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    Ok(())
}

pub async fn list(ctx: &Context, args: ListArgs) -> anyhow::Result<()> {
    let session = ctx.require_session()?;
    ensure_visible(args.module, session.role_kind())?;
    ctx.require_backend().await?;

    let mut query = PageQuery::new(args.module)
        .with_page(args.page)
        .with_page_size(args.limit);
    if let Some(term) = args.search {
        query = query.with_search(term);
    }

    let page = ctx
        .client
        .data()
        .fetch_page(&query)
        .await
        .with_context(|| format!("failed to load {}", args.module.display_name()))?;

    print_output(ctx.format, &page, |p| render_page(args.module, p))?;
    Ok(())
}

pub async fn search_all(ctx: &Context, args: SearchAllArgs) -> anyhow::Result<()> {
    ctx.require_session()?;
    ctx.require_backend().await?;

    let record = ctx
        .client
        .data()
        .fetch_aggregated_person(&args.term)
        .await?;

    print_output(ctx.format, &record, render_aggregated)?;
    Ok(())
}

pub async fn person(ctx: &Context, args: IdArgs) -> anyhow::Result<()> {
    ctx.require_session()?;
    ctx.require_backend().await?;

    let record = ctx.client.data().person_by_id(&args.id).await?;
    print_output(ctx.format, &record, |r| {
        render_records(std::slice::from_ref(r))
    })?;
    Ok(())
}

pub async fn person_exists(ctx: &Context, args: IdArgs) -> anyhow::Result<()> {
    ctx.require_session()?;
    ctx.require_backend().await?;

    let exists = ctx.client.data().person_exists(&args.id).await?;
    let output = ExistsOutput {
        id: &args.id,
        exists,
    };
    print_output(ctx.format, &output, |o| {
        if o.exists {
            format!("person {} exists", o.id)
        } else {
            format!("person {} not found", o.id)
        }
    })?;
    Ok(())
}

pub async fn documents(ctx: &Context, args: IdArgs) -> anyhow::Result<()> {
    ctx.require_session()?;
    ctx.require_backend().await?;

    let records = ctx.client.data().documents_by_person(&args.id).await?;
    print_records(ctx, records)
}

pub async fn occurrences(ctx: &Context, args: IdArgs) -> anyhow::Result<()> {
    ctx.require_session()?;
    ctx.require_backend().await?;

    let records = ctx.client.data().occurrences_by_student(&args.id).await?;
    print_records(ctx, records)
}

fn print_records(ctx: &Context, records: Vec<Record>) -> anyhow::Result<()> {
    print_output(ctx.format, &records, |r| render_records(r))?;
    Ok(())
}

/// The financial module is only offered to administrators
fn ensure_visible(module: Module, role: Role) -> anyhow::Result<()> {
    if !module.is_visible_to(role) {
        anyhow::bail!(
            "module {} is not available to this role",
            module.display_name()
        );
    }
    Ok(())
}

fn render_page(module: Module, page: &PageResult) -> String {
    format!(
        "{}\n\n{} (page {} of {}, {} records)",
        render_records(&page.records),
        module.display_name(),
        page.current_page,
        page.total_pages,
        page.total_records
    )
}

fn render_aggregated(record: &AggregatedPersonRecord) -> String {
    if record.0.is_empty() {
        return "(no records)".to_string();
    }
    record
        .categories()
        .map(|category| {
            let records = record.get(category);
            format!(
                "== {category} ({}) ==\n{}",
                records.len(),
                render_records(records)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
