mod pages;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rsvp_client::{ApiClient, FileStorage};
use rsvp_core::config::ClientConfig;
use rsvp_core::error::AppError;
use rsvp_core::models::{ExportFile, NewRsvp, RsvpListEntry};
use rsvp_core::router::Router;
use rsvp_core::session::AuthStore;
use rsvp_core::traits::Storage;

use crate::pages::CliPages;

#[derive(Parser)]
#[command(name = "rsvp", version, about = "Wedding RSVP client")]
struct Cli {
    /// Backend API base URL
    #[arg(long, global = true, env = "RSVP_API_URL")]
    api_url: Option<String>,

    /// Directory holding the persisted admin session
    #[arg(long, global = true, env = "RSVP_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all events
    Events,

    /// Show one event
    Event {
        /// Event slug (e.g., "wedding")
        slug: String,
    },

    /// Submit an RSVP for an event
    Rsvp {
        /// Event slug
        #[arg(short, long)]
        event: String,

        /// Guest name
        #[arg(short, long)]
        name: String,

        /// Guest email
        #[arg(long)]
        email: String,

        /// Whether the guest will attend
        #[arg(long, action = ArgAction::Set)]
        attending: bool,
    },

    /// Show the gift registry link
    Registry,

    /// Log in as admin and persist the session token
    Login {
        /// Admin password (prompted on stdin if not provided)
        #[arg(long, env = "RSVP_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the persisted admin session
    Logout,

    /// Show whether an admin session is active
    Status,

    /// List RSVPs (admin)
    Rsvps {
        /// Only show RSVPs for this event slug
        #[arg(short, long)]
        event: Option<String>,

        /// Print as CSV instead of a table
        #[arg(long, default_value_t = false)]
        csv: bool,
    },

    /// Show per-event response counts (admin)
    Stats,

    /// Delete an RSVP by id (admin)
    Delete {
        /// RSVP id
        id: i64,
    },

    /// Download the RSVP CSV export (admin)
    Export {
        /// Only export RSVPs for this event slug
        #[arg(short, long)]
        event: Option<String>,

        /// Output file (defaults to the server-suggested filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Open a page by path, as the site would (e.g., "/admin/dashboard")
    Open {
        #[arg(default_value = "/")]
        path: String,
    },

    /// List the site's pages
    Routes,
}

/// Session and client shared by every command.
struct App {
    store: AuthStore,
    api: ApiClient,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rsvp=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = load_config(cli.api_url.as_deref(), cli.state_dir)?;
    let app = build_app(&config)?;
    tracing::debug!(api_url = %app.api.base_url(), "Client ready");

    match cli.command {
        Commands::Events => {
            let events = app.api.list_events().await?;
            print!("{}", pages::events_table(&events));
        }
        Commands::Event { slug } => {
            let event = app.api.get_event(&slug).await?;
            print!("{}", pages::event_details(&event));
        }
        Commands::Rsvp {
            event,
            name,
            email,
            attending,
        } => {
            cmd_rsvp(
                &app,
                NewRsvp {
                    event_slug: event,
                    name,
                    email,
                    attending,
                },
            )
            .await?;
        }
        Commands::Registry => {
            let registry = app.api.get_registry().await?;
            println!("{}", registry.registry_url);
        }
        Commands::Login { password } => cmd_login(&app, password).await?,
        Commands::Logout => {
            app.store.logout().context("Failed to clear admin session")?;
            println!("Logged out.");
        }
        Commands::Status => {
            if app.store.is_authenticated() {
                println!("Logged in as admin ({})", config.state_dir.display());
            } else {
                println!("Not logged in.");
            }
        }
        Commands::Rsvps { event, csv } => {
            let rows = app
                .api
                .get_admin_rsvps(event.as_deref())
                .await
                .map_err(admin_error)?;
            if csv {
                write_csv(&rows, std::io::stdout())?;
            } else {
                print!("{}", pages::rsvps_table(&rows));
            }
        }
        Commands::Stats => {
            let stats = app.api.get_admin_stats().await.map_err(admin_error)?;
            print!("{}", pages::stats_table(&stats));
        }
        Commands::Delete { id } => {
            app.api.delete_rsvp(id).await.map_err(admin_error)?;
            tracing::info!(id, "Deleted RSVP");
            println!("Deleted RSVP {id}.");
        }
        Commands::Export { event, output } => cmd_export(&app, event.as_deref(), output).await?,
        Commands::Open { path } => cmd_open(&app, &path).await?,
        Commands::Routes => print!("{}", pages::route_list()),
    }

    Ok(())
}

/// Flag or environment value when set and non-empty, else the defaults.
fn load_config(api_url: Option<&str>, state_dir: Option<PathBuf>) -> Result<ClientConfig> {
    let mut config = ClientConfig::default();
    if let Some(url) = api_url.filter(|u| !u.is_empty()) {
        config = ClientConfig::new(url).context("Invalid API URL (--api-url / RSVP_API_URL)")?;
    }
    if let Some(dir) = state_dir.filter(|d| !d.as_os_str().is_empty()) {
        config = config.with_state_dir(dir);
    }
    Ok(config)
}

fn build_app(config: &ClientConfig) -> Result<App> {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.state_dir));
    let store = AuthStore::new(storage).context("Failed to restore admin session")?;
    let api = ApiClient::new(config, store.storage()).context("Failed to create HTTP client")?;
    Ok(App { store, api })
}

/// Point the user at `rsvp login` when the backend rejects the session.
fn admin_error(err: AppError) -> anyhow::Error {
    if err.is_unauthorized() {
        anyhow::Error::new(err).context("Admin session missing or expired; run `rsvp login`")
    } else {
        anyhow::Error::new(err)
    }
}

async fn cmd_rsvp(app: &App, rsvp: NewRsvp) -> Result<()> {
    let record = app.api.submit_rsvp(&rsvp).await?;
    tracing::info!(id = record.id, event = %record.event.slug, "RSVP recorded");

    if record.attending {
        println!(
            "Thanks {}! We look forward to seeing you at the {} on {}.",
            record.name,
            record.event.name,
            record.event.event_date.format("%B %-d, %Y")
        );
    } else {
        println!(
            "Thanks {}, we're sorry you can't make the {}.",
            record.name, record.event.name
        );
    }
    Ok(())
}

async fn cmd_login(app: &App, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    let token = app
        .api
        .admin_login(&password)
        .await
        .context("Login failed")?;
    app.store
        .set_token(Some(&token.access_token))
        .context("Failed to persist admin session")?;

    tracing::info!("Admin session stored");
    println!("Logged in.");
    Ok(())
}

fn prompt_password() -> Result<String> {
    eprint!("Admin password: ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    anyhow::ensure!(!password.is_empty(), "No password given");
    Ok(password)
}

fn write_csv(rows: &[RsvpListEntry], out: impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["Event", "Name", "Email", "Attending", "Submitted At"])?;
    for r in rows {
        let submitted = r.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string();
        writer.write_record([
            r.event_name.as_str(),
            r.name.as_str(),
            r.email.as_str(),
            r.attending_label(),
            submitted.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

async fn cmd_export(app: &App, event: Option<&str>, output: Option<PathBuf>) -> Result<()> {
    let file = app.api.export_rsvps(event).await.map_err(admin_error)?;
    let path = output.unwrap_or_else(|| export_path(&file, event));

    std::fs::write(&path, &file.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(bytes = file.bytes.len(), path = %path.display(), "Export saved");
    println!("Saved {}", path.display());
    Ok(())
}

/// Where to save an export when no `--output` was given.
///
/// Only the final component of a server-suggested name is used, so the file
/// always lands in the working directory.
fn export_path(file: &ExportFile, event: Option<&str>) -> PathBuf {
    let name = file.filename_or_default(event);
    match Path::new(&name).file_name() {
        Some(base) => PathBuf::from(base),
        None => PathBuf::from(rsvp_core::models::default_export_filename(event)),
    }
}

async fn cmd_open(app: &App, path: &str) -> Result<()> {
    let router = Router::with_auth(app.store.clone(), CliPages);
    let nav = router.navigate(path).await?;

    if let Some(from) = nav.redirected_from {
        tracing::warn!(requested = %from, shown = %nav.route, "Admin login required");
    }

    let rendered = nav.page.render(&app.api).await.map_err(admin_error)?;
    print!("{rendered}");
    Ok(())
}
