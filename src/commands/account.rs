use super::Context;
use crate::api::auth::{ProfileUpdate, Registration};
use crate::models::Profile;
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct LoginArgs {
    pub username: String,
    #[arg(long, env = "MENTORA_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub username: String,
    pub email: String,
    #[arg(long, env = "MENTORA_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub bio: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// Upload a JPEG, PNG or WebP image as the avatar
    #[arg(long)]
    pub avatar: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ChangePasswordArgs {
    #[arg(long)]
    pub old: String,
    #[arg(long)]
    pub new: String,
}

#[derive(Subcommand, Debug)]
pub enum ResetCommand {
    /// Email a reset code
    Request { email: String },
    /// Check a reset code
    Verify { email: String, code: String },
    /// Set a new password using a verified code
    Complete {
        email: String,
        code: String,
        #[arg(long)]
        new_password: String,
    },
}

fn print_profile(p: &Profile) {
    let u = &p.user;
    let name = [u.first_name.as_deref(), u.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    println!("{} <{}>{}", u.username, u.email, if name.is_empty() { String::new() } else { format!("  {}", name) });
    if let Some(bio) = &u.bio {
        println!("  {}", bio);
    }
    if let Some(avatar) = &u.avatar {
        println!("  avatar: {}", avatar);
    }
    let s = &p.statistics;
    println!(
        "  {} documents, {} pages, {} chat sessions",
        s.total_documents, s.total_pages, s.total_chat_sessions
    );
}

pub async fn login(ctx: &Context, args: LoginArgs) -> Result<()> {
    let token = ctx.client.login(&args.username, &args.password).await?;
    println!("Logged in as {}", token.user.username);
    Ok(())
}

pub async fn register(ctx: &Context, args: RegisterArgs) -> Result<()> {
    let registration = Registration {
        username: args.username,
        email: args.email,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
    };
    let token = ctx.client.register(&registration).await?;
    println!("Welcome, {}!", token.user.username);
    Ok(())
}

pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.client.logout().await?;
    println!("Logged out");
    Ok(())
}

pub async fn profile(ctx: &Context, args: ProfileArgs) -> Result<()> {
    let update = ProfileUpdate {
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        bio: args.bio,
        phone: args.phone,
    };
    if !update.is_empty() {
        ctx.client.update_profile(&update).await?;
    }
    if let Some(path) = &args.avatar {
        let uploaded = ctx
            .client
            .upload_avatar(path)
            .await
            .with_context(|| format!("Failed to upload {}", path.display()))?;
        if !ctx.json {
            println!("Avatar set: {}", uploaded.avatar_url);
        }
    }
    let profile = ctx.client.profile().await?;
    ctx.emit(&profile, print_profile)
}

pub async fn change_password(ctx: &Context, args: ChangePasswordArgs) -> Result<()> {
    ctx.client.change_password(&args.old, &args.new).await?;
    println!("Password changed");
    Ok(())
}

pub async fn reset(ctx: &Context, cmd: ResetCommand) -> Result<()> {
    let message = match cmd {
        ResetCommand::Request { email } => ctx.client.request_password_reset(&email).await?,
        ResetCommand::Verify { email, code } => ctx.client.verify_reset_code(&email, &code).await?,
        ResetCommand::Complete {
            email,
            code,
            new_password,
        } => {
            ctx.client
                .complete_password_reset(&email, &code, &new_password)
                .await?
        }
    };
    println!("{}", message);
    Ok(())
}
