//! coursegate - learner portal CLI and edge server.

mod commands;
mod output;
mod server;

use clap::{Parser, Subcommand};
use coursegate_api::{ApiError, Client, SignupForm};
use coursegate_config::{init_logging, Config, Paths};
use std::path::PathBuf;
use tracing::debug;

/// coursegate - Sign in, manage content and serve the learner portal.
#[derive(Parser)]
#[command(name = "coursegate")]
#[command(about = "CLI and edge server for the coursegate learner portal")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "COURSEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Base directory for config, cookie jar and logs (default ~/.coursegate)
    #[arg(long, global = true, env = "COURSEGATE_HOME")]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the edge server (route gate, API proxy, static bundle)
    Serve {
        /// Listen address, overriding the configured one
        #[arg(long)]
        listen: Option<String>,
        /// Directory with the built front-end bundle
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Login with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Logout and clear the session
    Logout,

    /// Check authentication status
    Status,

    /// Register a new account; an OTP is emailed
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        age: String,
        #[arg(long)]
        phone: String,
        /// male or female
        #[arg(long)]
        gender: String,
    },

    /// Confirm a signup with the emailed OTP
    VerifySignup {
        /// Six-digit code
        otp: Option<String>,
        /// Send a new code instead
        #[arg(long, conflicts_with = "otp")]
        resend: bool,
    },

    /// Request a password reset OTP
    ForgotPassword {
        email: String,
    },

    /// Confirm a password reset with the emailed OTP
    VerifyReset {
        /// Six-digit code
        otp: Option<String>,
        /// Send a new code instead
        #[arg(long, conflicts_with = "otp")]
        resend: bool,
    },

    /// Set a new password after a verified reset
    ChangePassword,

    /// Browse and manage levels
    Levels {
        #[command(subcommand)]
        command: LevelCommands,
    },

    /// Browse sections
    Sections {
        #[command(subcommand)]
        command: SectionCommands,
    },

    /// Manage users (admin)
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show learning progress or record a watched section
    Progress {
        #[command(subcommand)]
        command: Option<ProgressCommands>,
    },
}

#[derive(Subcommand)]
enum LevelCommands {
    /// List levels with lock state
    List,
    /// Show a level and its sections
    Show {
        /// Level ID
        id: String,
    },
    /// Delete a level (admin)
    Delete {
        /// Level ID
        id: String,
    },
}

#[derive(Subcommand)]
enum SectionCommands {
    /// List sections
    List {
        /// Only sections of this level
        #[arg(short, long)]
        level: Option<String>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users
    List,
    /// Delete a user
    Delete {
        /// User ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ProgressCommands {
    /// Mark a section video as watched
    Complete {
        /// Level ID
        level: String,
        /// Section ID
        section: String,
    },
}

fn resolve_paths(base_dir: Option<PathBuf>) -> anyhow::Result<Paths> {
    match base_dir {
        Some(dir) => Ok(Paths::with_base_dir(dir)),
        None => Ok(Paths::new()?),
    }
}

async fn run(cli: Cli, paths: Paths, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { listen, static_dir } => {
            let mut config = config;
            if let Some(listen) = listen {
                config.listen_addr = listen;
            }
            if static_dir.is_some() {
                config.static_dir = static_dir;
            }
            config.validate()?;
            server::serve(&config).await
        }
        command => {
            let client = commands::open_client(&paths, &config)?;
            dispatch(&client, command, &cli.format).await
        }
    }
}

async fn dispatch(client: &Client, command: Commands, format: &output::OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Serve { .. } => anyhow::bail!("serve runs without a client session"),
        Commands::Login { email } => commands::login(client, email, format).await,
        Commands::Logout => commands::logout(client, format).await,
        Commands::Status => commands::status(client, format).await,
        Commands::Signup {
            name,
            email,
            age,
            phone,
            gender,
        } => {
            let form = SignupForm {
                name,
                email,
                age,
                phone_number: phone,
                gender,
                ..Default::default()
            };
            commands::signup(client, form, format).await
        }
        Commands::VerifySignup { otp, resend } => {
            commands::verify_signup(client, otp.as_deref(), resend, format).await
        }
        Commands::ForgotPassword { email } => commands::forgot_password(client, &email, format).await,
        Commands::VerifyReset { otp, resend } => {
            commands::verify_reset(client, otp.as_deref(), resend, format).await
        }
        Commands::ChangePassword => commands::change_password(client, format).await,
        Commands::Levels { command } => match command {
            LevelCommands::List => commands::levels_list(client, format).await,
            LevelCommands::Show { id } => commands::levels_show(client, &id, format).await,
            LevelCommands::Delete { id } => commands::levels_delete(client, &id, format).await,
        },
        Commands::Sections { command } => match command {
            SectionCommands::List { level } => {
                commands::sections_list(client, level.as_deref(), format).await
            }
        },
        Commands::Users { command } => match command {
            UserCommands::List => commands::users_list(client, format).await,
            UserCommands::Delete { id } => commands::users_delete(client, &id, format).await,
        },
        Commands::Progress { command } => match command {
            None => commands::progress_show(client, format).await,
            Some(ProgressCommands::Complete { level, section }) => {
                commands::progress_complete(client, &level, &section, format).await
            }
        },
    }
}

/// Error text shown to the user, with a login hint when the session is gone.
fn error_message(error: &anyhow::Error) -> String {
    let message = format!("{:#}", error);
    match error.downcast_ref::<ApiError>() {
        Some(api) if api.is_unauthenticated() => {
            format!("{}. Run `coursegate login` to sign in again", message)
        }
        _ => message,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    let setup = resolve_paths(cli.base_dir.clone()).and_then(|paths| {
        paths.ensure_dirs()?;
        let config = Config::load(&paths)?;
        Ok((paths, config))
    });
    let (paths, config) = match setup {
        Ok(setup) => setup,
        Err(e) => {
            output::print_error(&format!("{:#}", e), &format);
            std::process::exit(1);
        }
    };

    let serving = matches!(cli.command, Commands::Serve { .. });
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(
        if serving { "edge" } else { "cli" },
        &level,
        &paths,
        serving,
    );
    debug!(base_dir = %paths.base_dir().display(), "Configuration loaded");

    if let Err(e) = run(cli, paths, config).await {
        output::print_error(&error_message(&e), &format);
        std::process::exit(1);
    }
}
