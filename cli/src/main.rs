use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use time::OffsetDateTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use userapp_client::config::{self, ConfigError, ProviderConfig};
use userapp_client::net::provider::{AuthProvider, ProfileStore};
use userapp_client::net::supabase::SupabaseClient;
use userapp_client::net::types::ProviderError;
use userapp_client::pages::SubmitOutcome;
use userapp_client::pages::dashboard::DashboardSummary;
use userapp_client::pages::navbar::build_navbar;
use userapp_client::pages::profile::{ProfileError, ProfileView, update_profile};
use userapp_client::pages::register::validate_register_input;
use userapp_client::pages::settings::{SettingsError, save_account, save_notifications, save_privacy};
use userapp_client::pages::{login, register};
use userapp_client::state::auth::{Identity, SessionStore};
use userapp_client::state::settings::{ProfileVisibility, load_settings};
use userapp_client::util::auth::{GuardDecision, LOGIN_PATH, RouteGuard, RoutePolicy};
use userapp_client::util::persistence::{FileStore, KeyValueStore, StorageError};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("{0}")]
    Invalid(&'static str),
    #[error("{0}")]
    AuthFailed(String),
    #[error("not signed in; run `userapp login` first")]
    NotSignedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "userapp", about = "User account CLI: sign in, profile, dashboard, settings")]
struct Cli {
    /// Directory holding the persisted session and settings.
    #[arg(long, env = config::ENV_DATA_DIR)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Sign in with email and password.
    Login(LoginArgs),
    /// Sign out and forget the persisted session.
    Logout,
    /// Print the signed-in identity.
    Whoami,
    Dashboard,
    Profile(ProfileCommand),
    Settings(SettingsCommand),
    /// Run the route guard for a path and print its decision.
    Open { path: String },
}

impl Command {
    /// Name used in logs. Arguments are left out since they may carry a password.
    fn name(&self) -> &'static str {
        match self {
            Self::Register(_) => "register",
            Self::Login(_) => "login",
            Self::Logout => "logout",
            Self::Whoami => "whoami",
            Self::Dashboard => "dashboard",
            Self::Profile(_) => "profile",
            Self::Settings(_) => "settings",
            Self::Open { .. } => "open",
        }
    }
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "USERAPP_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: String,
    #[arg(long, env = "USERAPP_PASSWORD", hide_env_values = true)]
    password: String,
    /// Defaults to `--password`.
    #[arg(long, hide_env_values = true)]
    confirm_password: Option<String>,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        full_name: String,
    },
}

#[derive(Args, Debug)]
struct SettingsCommand {
    #[command(subcommand)]
    command: SettingsSubcommand,
}

#[derive(Subcommand, Debug)]
enum SettingsSubcommand {
    Show,
    SetAccount {
        #[arg(long)]
        username: String,
        /// Defaults to the signed-in email.
        #[arg(long)]
        email: Option<String>,
    },
    SetNotifications {
        #[arg(long)]
        email_notifications: Option<bool>,
        #[arg(long)]
        marketing_emails: Option<bool>,
        #[arg(long)]
        security_alerts: Option<bool>,
        #[arg(long)]
        account_updates: Option<bool>,
    },
    SetPrivacy {
        #[arg(long)]
        visibility: Option<ProfileVisibility>,
        #[arg(long)]
        two_factor: Option<bool>,
    },
}

/// Everything one invocation needs. Created once in `main`.
struct CliContext {
    store: SessionStore,
    profiles: Arc<dyn ProfileStore>,
    storage: Arc<dyn KeyValueStore>,
    policy: RoutePolicy,
}

impl CliContext {
    fn new(provider_config: &ProviderConfig, data_dir: PathBuf) -> Result<Self, CliError> {
        let storage = Arc::new(FileStore::new(data_dir));
        let provider = Arc::new(SupabaseClient::new(provider_config)?.with_storage(storage.clone()));
        Ok(Self::from_parts(provider.clone(), provider, storage))
    }

    fn from_parts(
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileStore>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let store = SessionStore::new(auth, storage.clone());
        Self { store, profiles, storage, policy: RoutePolicy::default() }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userapp=warn,userapp_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(config::data_dir_from_env);
    let command = cli.command.name();
    tracing::debug!(command, data_dir = %data_dir.display(), "dispatching command");

    let result = run(cli.command, data_dir).await;
    if let Err(e) = &result {
        tracing::error!(command, error = %e, "command failed");
    }
    result
}

async fn run(command: Command, data_dir: PathBuf) -> Result<(), CliError> {
    let ctx = CliContext::new(&ProviderConfig::from_env()?, data_dir)?;

    match command {
        Command::Register(args) => run_register(&ctx, args).await,
        Command::Login(args) => run_login(&ctx, args).await,
        Command::Logout => run_logout(&ctx).await,
        Command::Whoami => run_whoami(&ctx).await,
        Command::Dashboard => run_dashboard(&ctx).await,
        Command::Profile(profile) => run_profile(&ctx, profile).await,
        Command::Settings(settings) => run_settings(&ctx, settings).await,
        Command::Open { path } => run_open(&ctx, &path).await,
    }
}

// =============================================================================
// ROUTING
// =============================================================================

const MAX_REDIRECTS: usize = 4;

/// Run the guard for `path` once per process, then follow redirects until it
/// settles. Returns the final path and every decision taken on the way.
async fn open_route(ctx: &CliContext, path: &str) -> (String, Vec<GuardDecision>) {
    let mut guard = RouteGuard::new(ctx.policy.clone(), path);
    let mut decisions = vec![guard.initialize(&ctx.store).await];
    while matches!(decisions.last(), Some(GuardDecision::Redirect(_))) {
        if decisions.len() > MAX_REDIRECTS {
            tracing::warn!(from = path, at = guard.current_path(), "route guard redirect limit reached");
            break;
        }
        decisions.push(guard.reevaluate(&ctx.store.snapshot()));
    }
    (guard.current_path().to_owned(), decisions)
}

/// Open a protected page and return the identity it was opened for.
async fn require_identity(ctx: &CliContext, path: &str) -> Result<Identity, CliError> {
    let (landed, _) = open_route(ctx, path).await;
    match ctx.store.identity() {
        Some(identity) if landed != LOGIN_PATH => Ok(identity),
        _ => Err(CliError::NotSignedIn),
    }
}

fn render_decision(decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::Block => "block".to_owned(),
        GuardDecision::Allow => "allow".to_owned(),
        GuardDecision::Redirect(to) => format!("redirect -> {to}"),
    }
}

async fn run_open(ctx: &CliContext, path: &str) -> Result<(), CliError> {
    let (landed, decisions) = open_route(ctx, path).await;
    for decision in &decisions {
        println!("{}", render_decision(decision));
    }
    println!("at {landed}");
    if let Some(navbar) = build_navbar(&ctx.store.snapshot(), &landed) {
        let items: Vec<String> =
            navbar.items.iter().map(|i| if i.active { format!("[{}]", i.label) } else { i.label.to_owned() }).collect();
        println!("{} | {} | {}", navbar.title, items.join(" "), navbar.user_label);
    }
    Ok(())
}

// =============================================================================
// AUTH
// =============================================================================

fn outcome_to_result(outcome: SubmitOutcome) -> Result<&'static str, CliError> {
    match outcome {
        SubmitOutcome::Redirect(to) => Ok(to),
        SubmitOutcome::Invalid(message) => Err(CliError::Invalid(message)),
        SubmitOutcome::Failed(message) => Err(CliError::AuthFailed(message)),
    }
}

async fn run_login(ctx: &CliContext, args: LoginArgs) -> Result<(), CliError> {
    let (landed, _) = open_route(ctx, "/login").await;
    if landed != LOGIN_PATH {
        println!("already signed in; redirect -> {landed}");
        return Ok(());
    }
    let to = outcome_to_result(login::submit_login(&ctx.store, &args.email, &args.password).await)?;
    println!("signed in; redirect -> {to}");
    Ok(())
}

async fn run_register(ctx: &CliContext, args: RegisterArgs) -> Result<(), CliError> {
    let (landed, _) = open_route(ctx, "/register").await;
    if landed != "/register" {
        println!("already signed in; redirect -> {landed}");
        return Ok(());
    }
    let confirm = args.confirm_password.as_deref().unwrap_or(&args.password);
    let input =
        validate_register_input(&args.email, &args.full_name, &args.password, confirm).map_err(CliError::Invalid)?;
    let to = outcome_to_result(register::submit_register(&ctx.store, &input).await)?;
    println!("account created; redirect -> {to}");
    Ok(())
}

async fn run_logout(ctx: &CliContext) -> Result<(), CliError> {
    ctx.store.sign_out().await;
    println!("signed out");
    Ok(())
}

async fn run_whoami(ctx: &CliContext) -> Result<(), CliError> {
    open_route(ctx, "/").await;
    match ctx.store.identity() {
        Some(identity) => print_json(&serde_json::to_value(&identity)?),
        None => Err(CliError::NotSignedIn),
    }
}

// =============================================================================
// PAGES
// =============================================================================

async fn run_dashboard(ctx: &CliContext) -> Result<(), CliError> {
    let identity = require_identity(ctx, "/dashboard").await?;
    let summary = DashboardSummary::build(&identity, OffsetDateTime::now_utc());
    println!("Welcome back, {}", summary.greeting_name);
    println!("[{}] {}", summary.initials, summary.full_name);
    println!("Email:       {}", summary.email);
    println!("User ID:     {}", summary.user_id);
    println!("Joined:      {}", summary.joined);
    println!("Account age: {} days", summary.account_age_days);
    Ok(())
}

async fn run_profile(ctx: &CliContext, profile: ProfileCommand) -> Result<(), CliError> {
    let identity = require_identity(ctx, "/profile").await?;
    match profile.command {
        ProfileSubcommand::Show => {
            let view = ProfileView::from_identity(&identity);
            println!("Full name: {}", view.full_name);
            println!("Email:     {}", view.email);
        }
        ProfileSubcommand::Update { full_name } => {
            let message =
                update_profile(&ctx.store, ctx.profiles.as_ref(), &full_name, OffsetDateTime::now_utc()).await?;
            println!("{message}");
        }
    }
    Ok(())
}

async fn run_settings(ctx: &CliContext, settings: SettingsCommand) -> Result<(), CliError> {
    let identity = require_identity(ctx, "/settings").await?;
    let storage = ctx.storage.as_ref();
    let message = match settings.command {
        SettingsSubcommand::Show => {
            let current = load_settings(storage, &identity)?;
            return print_json(&serde_json::to_value(&current)?);
        }
        SettingsSubcommand::SetAccount { username, email } => {
            let email = email.unwrap_or_else(|| identity.email.clone());
            save_account(storage, &identity, &username, &email)?
        }
        SettingsSubcommand::SetNotifications { email_notifications, marketing_emails, security_alerts, account_updates } => {
            let mut notifications = load_settings(storage, &identity)?.notifications;
            apply_flag(&mut notifications.email_notifications, email_notifications);
            apply_flag(&mut notifications.marketing_emails, marketing_emails);
            apply_flag(&mut notifications.security_alerts, security_alerts);
            apply_flag(&mut notifications.account_updates, account_updates);
            save_notifications(storage, &identity, notifications)?
        }
        SettingsSubcommand::SetPrivacy { visibility, two_factor } => {
            let mut privacy = load_settings(storage, &identity)?.privacy;
            if let Some(visibility) = visibility {
                privacy.profile_visibility = visibility;
            }
            apply_flag(&mut privacy.two_factor_auth, two_factor);
            save_privacy(storage, &identity, privacy)?
        }
    };
    println!("{message}");
    Ok(())
}

fn apply_flag(target: &mut bool, value: Option<bool>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
