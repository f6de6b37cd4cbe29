use clap::{Parser, Subcommand};
use lms_portal::api::ApiClient;
use lms_portal::config::{LogFormat, PortalConfig};
use lms_portal::models::{CreateTenant, RegisterRequest, UserRole};
use lms_portal::session::SessionState;
use lms_portal::store::FileStore;
use lms_portal::tenant::{slugify, validate_slug, TenantDirectory, TenantResolution};
use lms_portal::{HttpPortal, PortalError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "lms-cli")]
#[command(about = "CLI for the multi-tenant learning portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Send every request to this API base URL (tenant chosen by Host header)
    #[arg(short = 'u', long, global = true)]
    api_url: Option<String>,

    /// Domain tenants live under
    #[arg(short = 'd', long, global = true)]
    root_domain: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which tenant a hostname resolves to
    Resolve {
        #[arg(short = 'H', long)]
        host: String,
    },
    Login {
        #[arg(short = 'H', long)]
        host: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Register {
        #[arg(short = 'H', long)]
        host: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "student")]
        role: String,
    },
    Whoami {
        #[arg(short = 'H', long)]
        host: String,
    },
    /// Show the layout and page a path mounts for the saved session
    Route {
        #[arg(short = 'H', long)]
        host: String,
        #[arg(short, long, default_value = "/")]
        path: String,
    },
    Tenants {
        #[arg(short = 'H', long)]
        host: String,
    },
    SwitchTenant {
        #[arg(short = 'H', long)]
        host: String,
        #[arg(short, long)]
        id: String,
    },
    CheckSlug {
        #[arg(short, long)]
        slug: String,
    },
    /// Create a new institution and its first administrator
    Onboard {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        slug: Option<String>,
        #[arg(long)]
        admin_email: String,
        #[arg(long)]
        admin_name: String,
        #[arg(long)]
        admin_password: String,
    },
    Logout {
        #[arg(short = 'H', long)]
        host: Option<String>,
    },
}

fn init_logging(config: &PortalConfig) -> WorkerGuard {
    let (writer, guard) = match &config.log_dir {
        Some(dir) => tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "lms-cli.log")),
        None => tracing_appender::non_blocking(std::io::stderr()),
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,lms_portal=info,lms_cli=info"));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(writer))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_ansi(config.log_dir.is_none()).with_writer(writer))
            .init(),
    }
    guard
}

fn signed_in_token(portal: &HttpPortal) -> Result<String, PortalError> {
    portal
        .token()
        .map(str::to_owned)
        .ok_or_else(|| PortalError::Unauthorized("not logged in, run `lms-cli login` first".into()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = PortalConfig::from_env()?;
    config.apply_overrides(cli.api_url.as_deref(), cli.root_domain.as_deref())?;
    let _guard = init_logging(&config);

    match cli.command {
        Commands::Resolve { host } => {
            let portal = HttpPortal::boot(&config, &host).await?;
            match portal.tenant() {
                TenantResolution::MainSite => println!("{}: main site", portal.host()),
                TenantResolution::Found(tenant) => {
                    println!("{}: tenant {} ({})", portal.host(), tenant.slug, tenant.name);
                    println!("{}", serde_json::to_string_pretty(tenant)?);
                }
                TenantResolution::NotFound { slug } => {
                    println!("{}: tenant {slug} not found", portal.host())
                }
                TenantResolution::Loading => println!("{}: still loading", portal.host()),
            }
        }
        Commands::Login { host, email, password } => {
            let mut portal = HttpPortal::boot(&config, &host).await?;
            let session = portal.login(&email, &password).await?;
            println!(
                "Logged in as {} ({}). Token saved to {}",
                session.user.email,
                session.user.role,
                config.token_path.display()
            );
        }
        Commands::Register { host, email, password, name, role } => {
            let mut portal = HttpPortal::boot(&config, &host).await?;
            let user = portal
                .register(RegisterRequest {
                    email,
                    password,
                    full_name: name,
                    role: UserRole::from(role),
                })
                .await?;
            match portal.session() {
                SessionState::Active(_) => println!("Registered and logged in as {}", user.email),
                _ => println!("Registered {}. Log in to continue.", user.email),
            }
        }
        Commands::Whoami { host } => {
            let portal = HttpPortal::boot(&config, &host).await?;
            match portal.user() {
                Some(user) => println!("{}", serde_json::to_string_pretty(user)?),
                None => println!("Not logged in."),
            }
        }
        Commands::Route { host, path } => {
            let portal = HttpPortal::boot(&config, &host).await?;
            let decision = portal.route(&path);
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Commands::Tenants { host } => {
            let portal = HttpPortal::boot(&config, &host).await?;
            let token = signed_in_token(&portal)?;
            let api = portal.backend();
            let directory =
                TenantDirectory::load(api.my_tenants(&token).await?, FileStore::new(&config.tenant_path))?;
            let current = directory.current().map(|t| t.id.clone());
            for tenant in directory.tenants() {
                let marker = if Some(&tenant.id) == current.as_ref() { "*" } else { " " };
                println!("{marker} {}\t{}\t{}", tenant.id, tenant.slug, tenant.name);
            }
        }
        Commands::SwitchTenant { host, id } => {
            let portal = HttpPortal::boot(&config, &host).await?;
            let token = signed_in_token(&portal)?;
            let api = portal.backend();
            let mut directory =
                TenantDirectory::load(api.my_tenants(&token).await?, FileStore::new(&config.tenant_path))?;
            let tenant = directory.switch(&id)?;
            println!("Switched to {} ({})", tenant.name, tenant.slug);
        }
        Commands::CheckSlug { slug } => {
            validate_slug(&slug)?;
            let api = ApiClient::new(&config, &config.root_domain)?;
            let availability = api.check_slug(&slug).await?;
            if availability.available {
                println!("{slug} is available");
            } else {
                println!("{slug} is taken. Try: {}", availability.suggestions.join(", "));
            }
        }
        Commands::Onboard { name, slug, admin_email, admin_name, admin_password } => {
            let slug = slug.unwrap_or_else(|| slugify(&name));
            validate_slug(&slug)?;
            lms_portal::session::validate_email(&admin_email)?;
            lms_portal::session::validate_password(&admin_password)?;

            let api = ApiClient::new(&config, &config.root_domain)?;
            let created = api
                .create_tenant(&CreateTenant {
                    name,
                    slug,
                    admin_email,
                    admin_name,
                    admin_password,
                    settings: None,
                    branding: None,
                })
                .await?;
            println!("Created tenant {} ({})", created.tenant.name, created.tenant.slug);
            if let Some(url) = created.redirect_url {
                println!("Continue at {url}");
            }
        }
        Commands::Logout { host } => {
            let host = host.unwrap_or_else(|| config.root_domain.clone());
            let mut portal = HttpPortal::boot(&config, &host).await?;
            portal.logout()?;
            println!("Logged out (token removed).");
        }
    }

    Ok(())
}
