// `tca login`, `tca logout`, `tca whoami`, `tca verify`.

use clap::Args;
use serde::Serialize;
use tca_client::Session;
use tracing::info;

use super::Context;
use crate::output::print_output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    pub username: String,

    /// Password; read from TCA_PASSWORD when omitted
    #[arg(long, env = "TCA_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Serialize)]
struct VerifyOutput {
    valid: bool,
}

#[derive(Serialize)]
struct LogoutOutput {
    logged_out: bool,
}

pub async fn login(ctx: &Context, args: LoginArgs) -> anyhow::Result<()> {
    let session = ctx
        .client
        .auth()
        .login(args.username.trim(), &args.password)
        .await?;
    info!("Logged in as {}", session.username);

    print_output(ctx.format, &session, |s| {
        format!("Logged in as {} ({})", s.username, s.role)
    })?;
    Ok(())
}

pub async fn logout(ctx: &Context) -> anyhow::Result<()> {
    ctx.client.auth().logout().await?;
    print_output(ctx.format, &LogoutOutput { logged_out: true }, |_| {
        "Logged out".to_string()
    })?;
    Ok(())
}

pub fn whoami(ctx: &Context) -> anyhow::Result<()> {
    let session = ctx.require_session()?;
    print_output(ctx.format, &session, render_session)?;
    Ok(())
}

pub async fn verify(ctx: &Context) -> anyhow::Result<()> {
    ctx.require_session()?;
    let valid = ctx.client.auth().verify_token().await?;

    print_output(ctx.format, &VerifyOutput { valid }, |v| {
        if v.valid {
            "Session is valid".to_string()
        } else {
            "Session is no longer valid; run `tca login` to sign in again".to_string()
        }
    })?;
    Ok(())
}

fn render_session(session: &Session) -> String {
    let access = if session.is_admin() {
        "administrator"
    } else {
        "standard"
    };
    format!(
        "user: {}\nrole: {} ({access} access)",
        session.username, session.role
    )
}
