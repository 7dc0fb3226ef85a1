use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use mindful_companion::account::{AccountService, SignupForm};
use mindful_companion::api::{CompanionApi, HttpApiClient};
use mindful_companion::config::Config;
use mindful_companion::forum::ForumBoard;
use mindful_companion::preferences::{Credentials, FilePreferenceStore, PreferenceStore};
use mindful_companion::session::{ChatAccess, ConversationSession, GoalListSession, SessionContext};
use mindful_companion::ui::terminal::Terminal;
use mindful_companion::ui::{HistoryNavigator, Route, ScreenShell};

#[derive(Parser)]
#[command(name = "companion", version, about = "Your mental-wellbeing companion in the terminal")]
struct Cli {
    /// Config file to read instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend to talk to; overrides the config file and COMPANION_BACKEND_URL.
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Plain output without ANSI colors.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the session.
    Login {
        username: String,
        #[arg(long, env = "COMPANION_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account.
    Signup {
        username: String,
        email: String,
        #[arg(long, env = "COMPANION_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored credentials.
    Logout,
    /// Chat with your personal friend.
    Chat {
        /// Chat without signing in.
        #[arg(long)]
        guest: bool,
    },
    /// Track your goals.
    Goals,
    /// Talk with people like you.
    Forum,
    /// Show or toggle dark mode.
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

impl Command {
    fn route(&self) -> Route {
        match self {
            Command::Login { .. } | Command::Logout => Route::Login,
            Command::Signup { .. } => Route::CreateAccount,
            Command::Chat { .. } => Route::PersonalFriend,
            Command::Goals => Route::GoalsTracker,
            Command::Forum => Route::TalkingPlatform,
            Command::Theme { .. } => Route::UserSettings,
        }
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.clone()).context("loading configuration")?;
    if let Some(url) = &cli.backend_url {
        config.set_backend_url(url)?;
    }

    let prefs = match &config.preferences_path {
        Some(path) => FilePreferenceStore::open(path)?,
        None => FilePreferenceStore::open_default()?,
    };
    log::debug!("preferences at {}", prefs.path().display());
    let store: Arc<dyn PreferenceStore> = Arc::new(prefs);
    let client = HttpApiClient::from_config(&config)?;
    log::debug!("backend at {}", client.base_url());
    let api: Arc<dyn CompanionApi> = Arc::new(client);
    let nav = Arc::new(HistoryNavigator::starting_at(cli.command.route()));
    let ctx = SessionContext::new(store.clone(), nav.clone(), config.request_timeout);
    let mut shell = ScreenShell::mount(store.clone(), nav.clone());
    let mut term = Terminal::new(BufReader::new(tokio::io::stdin()), io::stdout(), !cli.no_color);

    match cli.command {
        Command::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_line("password")?,
            };
            let accounts = AccountService::new(api, ctx);
            let creds = accounts.login(&username, &password).await?;
            println!("Welcome back, {}.", creds.username);
        }
        Command::Signup {
            username,
            email,
            password,
        } => {
            let (password, confirm_password) = match password {
                Some(p) => (p.clone(), p),
                None => (read_line("password")?, read_line("confirm password")?),
            };
            let form = SignupForm {
                username,
                email,
                password,
                confirm_password,
            };
            let accounts = AccountService::new(api, ctx);
            println!("{}", accounts.signup(&form).await?);
        }
        Command::Logout => {
            AccountService::new(api, ctx).logout()?;
            println!("Signed out.");
        }
        Command::Chat { guest } => {
            let access = if guest {
                ChatAccess::Open
            } else {
                ChatAccess::RequiresLogin
            };
            let mut session = ConversationSession::new(api, ctx, access);
            term.chat(&mut shell, &mut session).await?;
        }
        Command::Goals => {
            let mut session = GoalListSession::new(api, ctx);
            term.goals(&mut shell, &mut session).await?;
        }
        Command::Forum => {
            let author = Credentials::read(store.as_ref())
                .map(|c| c.username)
                .unwrap_or_else(|| "anonymous".to_owned());
            let mut board = ForumBoard::new(author);
            term.forum(&mut shell, &mut board).await?;
        }
        Command::Theme { toggle } => {
            if toggle {
                shell.toggle_dark_mode()?;
            }
            let state = if shell.is_dark_mode() { "on" } else { "off" };
            println!("Dark mode is {state}.");
        }
    }

    if nav.current() == Route::Login && cli_needs_login(&nav) {
        eprintln!("Please sign in with `companion login <username>`.");
    }
    Ok(())
}

/// True when a screen bounced the user to login rather than the user asking for it.
fn cli_needs_login(nav: &HistoryNavigator) -> bool {
    nav.history().first().is_some_and(|start| *start != Route::Login)
}
