//! Reunion CLI
//!
//! Command-line client for the alumni reunion portal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account, then confirm the emailed OTP
//! reunion signup --name "Asha Rao" --email asha@example.com
//! reunion verify-otp 0421
//!
//! # Sign in and look around
//! reunion signin --email asha@example.com
//! reunion dashboard
//! reunion events join <EVENT_ID>
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reunion_core::dto::{
    Course, FoodPreference, ProfileUpdateRequest, SignInRequest, SignupRequest, SingingRequest,
};
use reunion_core::{ClientConfig, ReunionApi};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod messages;

use commands::Status;

#[derive(Parser)]
#[command(name = "reunion")]
#[command(about = "Client for the alumni reunion portal")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// API base URL (overrides the config file and REUNION_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Path to the client config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account; an OTP is emailed to confirm it
    Signup {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "REUNION_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Confirm the OTP sent during signup
    VerifyOtp {
        /// The 4-digit code from the email
        otp: String,

        /// Email to verify (defaults to the one used for signup)
        #[arg(long)]
        email: Option<String>,
    },

    /// Sign in and remember the access token
    Signin {
        #[arg(long)]
        email: String,

        #[arg(long, env = "REUNION_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored access token
    Signout,

    /// Show or complete your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Browse and join events
    Events {
        #[command(subcommand)]
        command: EventsCommand,
    },

    /// Add a song to an event's performance list
    Sing {
        /// Event name
        #[arg(long)]
        event: String,

        /// Song title and artist
        #[arg(long)]
        song: String,

        #[arg(long)]
        topic: Option<String>,

        /// Request a karaoke track
        #[arg(long)]
        karaoke: bool,
    },

    /// Events, joined activities and added songs
    Dashboard,

    /// Attendance analytics (administrators only)
    Admin,
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Show the signed-in user
    Show,

    /// Complete or replace profile details
    Update {
        /// One of SOFTWARESYSTEMS, CYBERSECURITY, DATASCIENCE,
        /// THEORETICALCOMPUTERSCIENCE, APPLIEDMATHEMATICS
        #[arg(long)]
        course: Course,

        /// Veg or NonVeg
        #[arg(long)]
        food: FoodPreference,

        #[arg(long)]
        address: String,

        #[arg(long)]
        designation: String,

        #[arg(long)]
        gender: String,

        #[arg(long)]
        grad_year: i32,

        #[arg(long)]
        roll_number: String,

        #[arg(long)]
        phone: String,
    },
}

#[derive(Subcommand)]
enum EventsCommand {
    /// List all events
    List,

    /// Show one event
    Show { event_id: String },

    /// Register for an event
    Join { event_id: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config(
        cli.config.as_deref(),
        cli.base_url.as_deref(),
        |name| std::env::var(name).ok(),
    )?;
    init_logging(cli.verbose, &config.log_level);
    debug!("Loaded config from {:?}", config.config_path);

    let api = build_api(&config)?;
    let mut out = std::io::stdout().lock();

    let status = match cli.command {
        Commands::Signup { name, email, password } => {
            commands::signup(&api, &mut out, SignupRequest { email, password, name }).await?
        }
        Commands::VerifyOtp { otp, email } => {
            commands::verify_otp(&api, &mut out, &otp, email).await?
        }
        Commands::Signin { email, password } => {
            commands::signin(&api, &mut out, SignInRequest { email, password }).await?
        }
        Commands::Signout => commands::signout(&api, &mut out).await?,
        Commands::Profile { command } => match command {
            ProfileCommand::Show => commands::show_profile(&api, &mut out).await?,
            ProfileCommand::Update {
                course,
                food,
                address,
                designation,
                gender,
                grad_year,
                roll_number,
                phone,
            } => {
                let request = ProfileUpdateRequest {
                    food_preference: food,
                    addr: address,
                    course,
                    designation,
                    gender,
                    gradyear: grad_year,
                    rollno: roll_number,
                    phonenumber: phone,
                };
                commands::update_profile(&api, &mut out, request).await?
            }
        },
        Commands::Events { command } => match command {
            EventsCommand::List => commands::list_events(&api, &mut out).await?,
            EventsCommand::Show { event_id } => {
                commands::show_event(&api, &mut out, &event_id).await?
            }
            EventsCommand::Join { event_id } => {
                commands::join_event(&api, &mut out, &event_id).await?
            }
        },
        Commands::Sing { event, song, topic, karaoke } => {
            let request = SingingRequest {
                event,
                song_details: song,
                topic,
                need_karoke: karaoke,
            };
            commands::add_singing(&api, &mut out, request).await?
        }
        Commands::Dashboard => commands::dashboard(&api, &mut out).await?,
        Commands::Admin => commands::admin(&api, &mut out).await?,
    };

    Ok(match status {
        Status::Done => ExitCode::SUCCESS,
        Status::Failed => ExitCode::FAILURE,
    })
}

fn init_logging(verbose: bool, default_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the config file, then apply environment and command-line overrides.
fn load_config(
    path: Option<&Path>,
    base_url: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(ClientConfig::default_path);
    let mut config = ClientConfig::load_from_path(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    config.apply_env_overrides(lookup);
    if let Some(url) = base_url {
        config.base_url = Some(url.to_string());
    }
    Ok(config)
}

fn build_api(config: &ClientConfig) -> Result<ReunionApi> {
    ReunionApi::from_config(config).context("cannot reach the reunion API")
}
