// `tca new-occurrence`: validates the form locally, then submits it.

use clap::Args;
use tca_client::{CreatedOccurrence, OccurrenceDraft, OccurrenceType};
use tracing::info;

use super::Context;
use crate::output::print_output;

#[derive(Args, Debug)]
pub struct NewOccurrenceArgs {
    /// Student registration number
    #[arg(long)]
    pub student_id: String,

    #[arg(long)]
    pub student_name: String,

    /// Disciplinar, Acadêmica, Financeira, Administrativa, Comportamental,
    /// Frequência, Avaliação or Outros
    #[arg(long = "type")]
    pub occurrence_type: OccurrenceType,

    #[arg(long)]
    pub description: String,

    /// "YYYY-MM-DD HH:MM:SS"; defaults to now
    #[arg(long)]
    pub timestamp: Option<String>,

    /// Responsible user; defaults to the signed-in user
    #[arg(long)]
    pub user: Option<String>,
}

pub async fn run(ctx: &Context, args: NewOccurrenceArgs) -> anyhow::Result<()> {
    let session = ctx.require_session()?;
    let draft = build_draft(args, &session.username)?;
    ctx.require_backend().await?;

    let created = ctx.client.data().create_occurrence(&draft).await?;
    info!("Occurrence recorded for student {}", draft.student_id);

    print_output(ctx.format, &created, render_created)?;
    Ok(())
}

/// Apply the form's rules: ids and names required, description required
/// after trimming.
fn build_draft(args: NewOccurrenceArgs, session_user: &str) -> anyhow::Result<OccurrenceDraft> {
    let student_id = args.student_id.trim();
    let student_name = args.student_name.trim();
    if student_id.is_empty() {
        anyhow::bail!("student id is required");
    }
    if student_name.is_empty() {
        anyhow::bail!("student name is required");
    }
    if args.description.trim().is_empty() {
        anyhow::bail!("description is required");
    }

    let responsible_user = args
        .user
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| session_user.to_string());

    Ok(OccurrenceDraft {
        student_id: student_id.to_string(),
        student_name: student_name.to_string(),
        timestamp: args
            .timestamp
            .unwrap_or_else(OccurrenceDraft::now_timestamp),
        description: args.description,
        occurrence_type: args.occurrence_type,
        responsible_user,
    })
}

fn render_created(created: &CreatedOccurrence) -> String {
    let mut text = match &created.id {
        Some(id) => format!("Occurrence {id} recorded"),
        None => "Occurrence recorded".to_string(),
    };
    if let Some(message) = &created.message {
        text.push_str(&format!(": {message}"));
    }
    text
}
