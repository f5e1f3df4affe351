use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatekeeper::capability::CapabilityView;
use gatekeeper::config::Config;
use gatekeeper::models::Session;
use gatekeeper::sync::SyncSnapshot;
use gatekeeper::Gatekeeper;

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(about = "Sign in and inspect feature-flagged capabilities")]
struct Cli {
    /// Print the capability view as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and load features
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "GATEKEEPER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Load features and show what is available
    Status,
    /// Reload features and the announcement
    Refresh,
    /// Show the signed-in user
    Whoami,
}

/// Log to stderr so stdout only carries command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "gatekeeper=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load()?;
    let app = Gatekeeper::from_config(&config).context("Failed to open session store")?;

    match cli.command {
        Commands::Login { email, password } => {
            let session = app.login(&email, &password).await?;
            println!("Signed in as {}", describe_user(&session));
            load_and_print(&app, cli.json, false).await?;
        }
        Commands::Logout => {
            let outcome = app.logout();
            println!("Signed out");
            if let Some(e) = outcome.storage_error {
                eprintln!("Warning: {}", e);
            }
        }
        Commands::Status => load_and_print(&app, cli.json, false).await?,
        Commands::Refresh => load_and_print(&app, cli.json, true).await?,
        Commands::Whoami => match app.session() {
            Some(session) => println!("{}", describe_user(&session)),
            None => println!("Not signed in"),
        },
    }

    Ok(())
}

async fn load_and_print(app: &Gatekeeper, json: bool, refresh: bool) -> anyhow::Result<()> {
    if app.session().is_none() {
        println!("Not signed in");
        return Ok(());
    }

    let result = if refresh {
        app.refresh().await
    } else {
        app.load().await
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    let view = app.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view, &app.snapshot());
    }
    Ok(())
}

fn describe_user(session: &Session) -> String {
    let badge = session.role().badge();
    format!("{} ({})", session.user.email, badge.label)
}

fn print_view(view: &CapabilityView, snapshot: &SyncSnapshot) {
    if let Some(announcement) = &view.visible_announcement {
        println!("Announcement: {}", announcement.message);
        println!("  Updated: {}", announcement.updated_at.format("%Y-%m-%d"));
    }

    println!("Features:");
    for flag in &snapshot.flags {
        println!("  [{:>3}] {} - {}", flag.status_label(), flag.name, flag.summary());
    }

    println!("Actions:");
    if view.can_open_beta_screen {
        println!("  Open Beta Screen");
    }
    if view.can_use_admin_action {
        println!("  Admin-only Action");
    }
    if !view.can_open_beta_screen && !view.can_use_admin_action {
        println!("  (none)");
    }

    println!("Load status: {}", snapshot.status.as_str());
    if let Some(error) = &view.error {
        println!("Last load failed: {}", error);
    }
}
