//! login-probe - talk to an authlink service from the command line.
//!
//! ```text
//! # user login, prints the session token
//! login-probe --address auth.local --port 7000 --username alice --secret pw
//!
//! # server login, checks each token, then closes
//! login-probe --server --username game-server --secret s3rv3r \
//!     --refresh 6f1c2a0e-3d4b-4b8a-9c77-1f2e3d4c5b6a
//! ```
//!
//! Every flag can also come from an `AUTHLINK_*` environment variable.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use authlink::prelude::*;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(version, about = "Log into an authlink service and check session tokens")]
struct Args {
    /// Host name or IP address of the authentication service.
    #[arg(long, env = "AUTHLINK_ADDRESS", default_value = "127.0.0.1")]
    address: String,

    #[arg(long, env = "AUTHLINK_PORT", default_value_t = 7000)]
    port: u16,

    #[arg(long, env = "AUTHLINK_USERNAME")]
    username: String,

    #[arg(long, env = "AUTHLINK_SECRET", hide_env_values = true)]
    secret: String,

    /// Hash the secret before sending it.
    #[arg(long, env = "AUTHLINK_DIGEST")]
    digest: Option<Algorithm>,

    /// Write attempts per message.
    #[arg(long, env = "AUTHLINK_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Per-read/write deadline in seconds. 0 waits forever.
    #[arg(long, env = "AUTHLINK_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Log in as a server instead of as a user.
    #[arg(long)]
    server: bool,

    /// Session token to check (server mode, repeatable).
    #[arg(long = "refresh", value_name = "TOKEN", requires = "server")]
    refresh: Vec<SessionToken>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    Sha1,
    Sha256,
}

impl From<Algorithm> for DigestAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha1 => Self::Sha1,
            Algorithm::Sha256 => Self::Sha256,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match failure_kind(&err) {
                Some(kind) => eprintln!("error ({kind:?}): {err:#}"),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let timeout = (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs));
    let mut builder = ClientBuilder::new()
        .address(&args.address)
        .port(args.port)
        .username(&args.username)
        .secret(args.secret)
        .max_attempts(args.max_attempts)
        .io_timeout(timeout);
    if let Some(algorithm) = args.digest {
        builder = builder.digest(algorithm.into());
    }
    let mut client = builder.build()?;

    info!(address = %args.address, port = args.port, username = %args.username, server = args.server, "probing");

    if !args.server {
        let token = client.connect().await.context("user login")?;
        println!("{token}");
        return Ok(());
    }

    client.connect_as_server().await.context("server login")?;
    println!("logged in as server");

    let mut outcome = Ok(());
    for token in &args.refresh {
        match client.refresh_token(*token).await {
            Ok(valid) => println!("{token} {}", if valid { "valid" } else { "invalid" }),
            Err(err) => {
                outcome = Err(anyhow::Error::new(err).context(format!("refreshing {token}")));
                break;
            }
        }
    }
    client.close().await;
    outcome
}

fn failure_kind(err: &anyhow::Error) -> Option<FailureKind> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<SessionError>() {
            return Some(e.kind());
        }
        cause.downcast_ref::<AuthlinkError>().and_then(AuthlinkError::kind)
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_refresh_requires_server() {
        let result = Args::try_parse_from([
            "login-probe",
            "--username",
            "alice",
            "--secret",
            "pw",
            "--refresh",
            "6f1c2a0e-3d4b-4b8a-9c77-1f2e3d4c5b6a",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_parse_server_mode_with_tokens() {
        let args = Args::try_parse_from([
            "login-probe",
            "--username",
            "svc",
            "--secret",
            "pw",
            "--digest",
            "sha256",
            "--server",
            "--refresh",
            "6f1c2a0e-3d4b-4b8a-9c77-1f2e3d4c5b6a",
            "--refresh",
            "00000000-0000-0000-0000-000000000000",
        ])
        .expect("valid args");

        assert!(args.server);
        assert_eq!(args.refresh.len(), 2);
        assert!(matches!(args.digest, Some(Algorithm::Sha256)));
        assert_eq!(args.port, 7000);
    }

    #[test]
    fn test_args_bad_token_is_rejected() {
        let result = Args::try_parse_from([
            "login-probe",
            "--username",
            "svc",
            "--secret",
            "pw",
            "--server",
            "--refresh",
            "not-a-token",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_failure_kind_found_through_context() {
        let err = anyhow::Error::new(SessionError::NotAuthorizedAsServer).context("refreshing");
        assert_eq!(failure_kind(&err), Some(FailureKind::NotAuthorizedAsServer));

        let config: anyhow::Error = AuthlinkError::Config("port must not be 0".into()).into();
        assert_eq!(failure_kind(&config), None);
    }
}
