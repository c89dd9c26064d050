use chrono::Utc;
use clap::Subcommand;

use crate::cli::config::{load_session_config, save_session_config};
use crate::cli::utils::{output_item, output_success, resolve_password};
use crate::cli::OutputFormat;
use crate::database::models::{NewUser, Role, User};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Register new user (and log in)")]
    Register {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Full name")]
        name: String,
        #[arg(long, help = "Email")]
        email: String,
        #[arg(long, help = "Mobile number")]
        mobile: Option<String>,
        #[arg(long, help = "Register as admin (only if the server allows it)")]
        admin: bool,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout from server")]
    Logout,

    #[command(about = "Show current user information")]
    Whoami,
}

fn describe_user(user: &User) -> String {
    format!("{} ({}) - {} <{}>", user.username, user.role, user.name, user.email)
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = load_session_config()?;
    let client = config.client()?;

    match cmd {
        AuthCommands::Register { username, name, email, mobile, admin, password } => {
            let password = resolve_password(password)?;
            let role = if admin { Role::Admin } else { Role::Patient };
            let user = client
                .register(&NewUser { username, password, role, name, email, mobile })
                .await?;

            config.token = client.token().await;
            config.username = Some(user.username.clone());
            config.logged_in_at = Some(Utc::now());
            save_session_config(&config)?;

            output_item(&output_format, &user, |u| format!("Registered {}", describe_user(u)))
        }
        AuthCommands::Login { username, password } => {
            let password = resolve_password(password)?;
            let user = client.login(&username, &password).await?;

            config.token = client.token().await;
            config.username = Some(user.username.clone());
            config.logged_in_at = Some(Utc::now());
            save_session_config(&config)?;

            output_item(&output_format, &user, |u| format!("Logged in as {}", describe_user(u)))
        }
        AuthCommands::Logout => {
            let result = client.logout().await;
            config.clear_session();
            save_session_config(&config)?;
            result?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => match client.user().await? {
            Some(user) => output_item(&output_format, &user, describe_user),
            None => anyhow::bail!("Not logged in"),
        },
    }
}
