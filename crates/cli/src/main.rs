//! Laundr.io CLI - Laundry tracking from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Staff
//! laundrio login worker -e counter@iiitdwd.ac.in -p '...'
//! laundrio worker create --student-id 21BCS042 --student-name Asha --item Shirt:2 --item Pants:1
//! laundrio worker list --filter received
//! laundrio worker complete <entry_id>
//!
//! # Students
//! laundrio oauth url
//! laundrio oauth callback '<redirect url>'
//! laundrio student show
//! laundrio student pickup
//! ```
//!
//! # Environment Variables
//!
//! See `laundrio_client::config` for the client settings. In addition:
//! - `LAUNDRIO_PASSWORD` - Password for `login` and `register`
//! - `LAUNDRIO_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Report errors to Sentry when set
//! - `RUST_LOG` - Log filter (default: `laundrio_client=info,laundrio_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use clap::{Parser, Subcommand};
use laundrio_client::SessionNamespace;
use laundrio_core::{Role, StatusFilter};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod render;

use commands::{CliError, Context};

#[derive(Parser)]
#[command(name = "laundrio")]
#[command(author, version, about = "Laundr.io laundry tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with e-mail and password
    Login {
        #[command(subcommand)]
        target: LoginTarget,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "LAUNDRIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// `student` or `worker`
        #[arg(short, long, default_value = "student")]
        role: Role,

        /// Roll number (required for students)
        #[arg(long)]
        student_id: Option<String>,
    },
    /// Campus sign-in through the identity provider
    Oauth {
        #[command(subcommand)]
        step: OauthStep,
    },
    /// Forget a stored session
    Logout {
        /// `student`, `worker` or `generic`
        namespace: SessionNamespace,
    },
    /// Show the stored session for a role
    Whoami {
        /// `student` or `worker`
        role: Role,
    },
    /// Student dashboard
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },
    /// Laundry counter dashboard
    Worker {
        #[command(subcommand)]
        action: WorkerAction,
    },
}

#[derive(Subcommand)]
enum LoginTarget {
    /// Staff login
    Worker {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "LAUNDRIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Student credential login
    Student {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "LAUNDRIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum OauthStep {
    /// Print the provider sign-in URL
    Url {
        #[arg(long, default_value = commands::auth::DEFAULT_REDIRECT)]
        redirect: String,
    },
    /// Finish sign-in from the URL the provider redirected to
    Callback {
        /// Redirect URL, or just its `#session_id=...` fragment
        callback: String,
    },
}

#[derive(Subcommand)]
enum StudentAction {
    /// Show the entry ready for pickup and history
    Show,
    /// Confirm pickup (defaults to the entry ready for pickup)
    Pickup { entry_id: Option<String> },
}

#[derive(Subcommand)]
enum WorkerAction {
    /// List entries with stats
    List {
        /// `all`, `received`, `completed` or `picked_up`
        #[arg(short, long, default_value = "all")]
        filter: StatusFilter,
    },
    /// Register a new submission
    Create {
        #[arg(long)]
        student_id: String,

        #[arg(long)]
        student_name: String,

        /// `TYPE:QTY`, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<String>,
    },
    /// Mark an entry completed (notifies the student)
    Complete { entry_id: String },
}

/// Initialize Sentry error tracking if `SENTRY_DSN` is set.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "laundrio_client=info,laundrio_cli=info".into());

    let json = std::env::var_os("LAUNDRIO_LOG_JSON").is_some();
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Load .env before reading SENTRY_DSN
    dotenvy::dotenv().ok();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry();
    init_tracing();

    let cli = Cli::parse();

    let ctx = match Context::from_env() {
        Ok(ctx) => ctx,
        Err(e) => exit_with(&e),
    };

    let result = run(&ctx, cli).await;

    let reported = ctx.flush_notices().unwrap_or(false);
    if let Err(e) = result {
        tracing::debug!(error = %e, "Command failed");
        if reported {
            std::process::exit(1);
        }
        exit_with(&e);
    }
}

fn exit_with(e: &CliError) -> ! {
    let hint = match e {
        CliError::Client(client) if client.is_unauthorized() => {
            "\nYour session is no longer accepted; sign in again."
        }
        _ => "",
    };
    let _ = writeln!(std::io::stderr().lock(), "[error] {e}{hint}");
    std::process::exit(1);
}

async fn run(ctx: &Context, cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { target } => match target {
            LoginTarget::Worker { email, password } => {
                commands::auth::login_worker(ctx, &email, password).await?;
            }
            LoginTarget::Student { email, password } => {
                commands::auth::login_student(ctx, &email, password).await?;
            }
        },
        Commands::Register {
            email,
            password,
            name,
            role,
            student_id,
        } => {
            commands::auth::register(ctx, &email, password, &name, role, student_id.as_deref())
                .await?;
        }
        Commands::Oauth { step } => match step {
            OauthStep::Url { redirect } => commands::auth::oauth_url(ctx, &redirect)?,
            OauthStep::Callback { callback } => {
                commands::auth::oauth_callback(ctx, &callback).await?;
            }
        },
        Commands::Logout { namespace } => commands::auth::logout(ctx, namespace)?,
        Commands::Whoami { role } => commands::auth::whoami(ctx, role)?,
        Commands::Student { action } => match action {
            StudentAction::Show => commands::student::show(ctx).await?,
            StudentAction::Pickup { entry_id } => commands::student::pickup(ctx, entry_id).await?,
        },
        Commands::Worker { action } => match action {
            WorkerAction::List { filter } => commands::worker::list(ctx, filter).await?,
            WorkerAction::Create {
                student_id,
                student_name,
                items,
            } => commands::worker::create(ctx, &student_id, &student_name, &items).await?,
            WorkerAction::Complete { entry_id } => {
                commands::worker::complete(ctx, &entry_id).await?;
            }
        },
    }
    Ok(())
}
