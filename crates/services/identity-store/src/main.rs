//! Identity Store - inspect document layouts produced by the store.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use domain::{UserClaim, UserLoginInfo};
use identity_store_lib::config::IdentityStoreConfig;
use identity_store_lib::SeedRequest;

#[derive(Parser)]
#[command(name = "identity-store")]
#[command(about = "Document-store persistence for user identities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user in an in-memory store and print the stored documents
    Seed {
        #[arg(long)]
        user: String,
        #[arg(long)]
        password_hash: Option<String>,
        #[arg(long)]
        stamp: Option<String>,
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Claim as `type=value`
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<UserClaim>,
        /// External login as `provider:key`
        #[arg(long = "login", value_parser = parse_login)]
        logins: Vec<UserLoginInfo>,
    },
    /// Print the document key of an external login
    LoginKey {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        key: String,
    },
}

fn parse_claim(value: &str) -> Result<UserClaim, String> {
    value
        .split_once('=')
        .map(|(claim_type, claim_value)| UserClaim::new(claim_type, claim_value))
        .ok_or_else(|| format!("expected `type=value`, got `{value}`"))
}

fn parse_login(value: &str) -> Result<UserLoginInfo, String> {
    value
        .split_once(':')
        .map(|(provider, key)| UserLoginInfo::new(provider, key))
        .ok_or_else(|| format!("expected `provider:key`, got `{value}`"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = IdentityStoreConfig::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.logging.log_level)
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Seed {
            user,
            password_hash,
            stamp,
            roles,
            claims,
            logins,
        } => {
            let request = SeedRequest {
                user_name: user,
                password_hash,
                security_stamp: stamp,
                roles,
                claims,
                logins,
            };

            for (key, document) in identity_store_lib::seed(&config, request).await? {
                println!("{key}");
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
        }
        Commands::LoginKey { provider, key } => {
            let login = UserLoginInfo::new(provider, key);
            println!("{}", config.key_conventions().login_key(&login));
        }
    }

    Ok(())
}
