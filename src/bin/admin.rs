//! CLI administration tool for link-tracker.
//!
//! Manages user accounts and API bearer sessions, shows totals and checks
//! the database without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Create a user (add --admin for full visibility over all links)
//! cargo run --bin admin -- user create alice alice@example.com
//!
//! # Issue a bearer session for a user (printed once)
//! cargo run --bin admin -- session issue alice --days 30
//!
//! # Revoke a bearer session
//! cargo run --bin admin -- session revoke <token>
//!
//! # View totals
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components (required)
//! - `SESSION_SIGNING_SECRET` (required for `session` commands; must match the server)

use link_tracker::config::Config;
use link_tracker::domain::entities::Role;
use link_tracker::domain::repositories::SessionRepository;
use link_tracker::infrastructure::persistence::PgSessionRepository;
use link_tracker::utils::token::{generate_session_token, hash_session_token};

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing link-tracker.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Manage API bearer sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Show totals
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user account
    Create {
        username: String,
        email: String,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Issue a new bearer session for a user
    Issue {
        username: String,

        /// Session lifetime in days
        #[arg(short, long, default_value_t = 30)]
        days: i64,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Revoke a bearer session
    Revoke {
        /// Raw bearer token (prompted when omitted)
        token: Option<String>,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url()?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::User { action } => handle_user_action(action, &pool).await?,
        Commands::Session { action } => handle_session_action(action, &pool).await?,
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

fn session_repository(pool: &PgPool) -> Arc<PgSessionRepository> {
    Arc::new(PgSessionRepository::new(Arc::new(pool.clone())))
}

fn signing_secret() -> Result<String> {
    let secret = std::env::var("SESSION_SIGNING_SECRET")
        .context("SESSION_SIGNING_SECRET must be set")?;
    anyhow::ensure!(!secret.is_empty(), "SESSION_SIGNING_SECRET must not be empty");
    Ok(secret)
}

async fn handle_user_action(action: UserAction, pool: &PgPool) -> Result<()> {
    let repo = session_repository(pool);

    match action {
        UserAction::Create {
            username,
            email,
            admin,
        } => {
            let role = if admin { Role::Admin } else { Role::Member };

            let user = repo
                .create_user(&username, &email, role)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create user: {}", e))?;

            println!("{}", "✅ User created".green().bold());
            println!("  ID:       {}", user.id.to_string().bright_black());
            println!("  Username: {}", user.username.cyan());
            println!("  Email:    {}", user.email);
            println!("  Role:     {:?}", user.role);
            println!();
        }
    }

    Ok(())
}

async fn handle_session_action(action: SessionAction, pool: &PgPool) -> Result<()> {
    let repo = session_repository(pool);
    let secret = signing_secret()?;

    match action {
        SessionAction::Issue {
            username,
            days,
            yes,
        } => issue_session(repo, &secret, &username, days, yes).await,
        SessionAction::Revoke { token } => revoke_session(repo, &secret, token).await,
    }
}

/// Issues a bearer session.
///
/// Only the HMAC of the token is stored; the raw value is shown once.
async fn issue_session(
    repo: Arc<PgSessionRepository>,
    secret: &str,
    username: &str,
    days: i64,
    skip_confirm: bool,
) -> Result<()> {
    println!("{}", "🔑 Issue API Session".bright_blue().bold());
    println!();

    anyhow::ensure!(days > 0, "Session lifetime must be at least one day");

    let user = repo
        .find_user_by_username(username)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("User not found")?;

    let expires_at = Utc::now() + Duration::days(days);

    println!("  User:    {}", user.username.cyan());
    println!("  Role:    {:?}", user.role);
    println!("  Expires: {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Issue this session?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let token = generate_session_token();

    repo.create_session(user.id, &hash_session_token(secret, &token), expires_at)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create session: {}", e))?;

    println!();
    println!("{}", "✅ Session issued".green().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();
    println!(
        "  {}: Bearer {}",
        "Authorization".bright_cyan(),
        token.bright_yellow()
    );
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/tracking_links",
        token.bright_yellow()
    );
    println!();

    Ok(())
}

async fn revoke_session(
    repo: Arc<PgSessionRepository>,
    secret: &str,
    token: Option<String>,
) -> Result<()> {
    println!("{}", "🔒 Revoke API Session".bright_blue().bold());
    println!();

    let token = match token {
        Some(t) => t,
        None => Input::new().with_prompt("Bearer token").interact_text()?,
    };

    let confirmed = Confirm::new()
        .with_prompt("Revoke this session?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    let revoked = repo
        .revoke_session(&hash_session_token(secret, token.trim()))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke session: {}", e))?;

    if revoked {
        println!("{}", "✅ Session revoked".green().bold());
    } else {
        println!("{}", "⚠️  No active session matches this token".yellow());
    }
    println!();

    Ok(())
}

/// Displays totals for links, recorded events and active sessions.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracking_links")
        .fetch_one(pool)
        .await?;

    let events_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracking_events")
        .fetch_one(pool)
        .await?;

    let sessions_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_sessions WHERE revoked_at IS NULL AND expires_at > NOW()",
    )
    .fetch_one(pool)
    .await?;

    println!(
        "  Links:           {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Events:          {}",
        events_count.to_string().bright_green().bold()
    );
    println!(
        "  Active sessions: {}",
        sessions_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}
