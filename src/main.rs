//! Command-line client for the OTP service.
//!
//! Reads configuration from `--config` (TOML) or the `OTP_*` environment
//! variables and prints every answer as JSON. Flags override the file's
//! `[observability]` and `[resolver]` settings.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use otp_gate::client::{
    AuthOutcome, AuthorisationStateRequest, OtpClient, RegisterUserRequest, VerifyOtpRequest,
};
use otp_gate::config::{config_from_env, load_config, ObservabilityConfig, ResolverConfig};
use otp_gate::observability::init_logging;
use otp_gate::security::{ClientIpResolver, StaticRequest, REMOTE_ADDR};

#[derive(Parser)]
#[command(name = "otp-cli")]
#[command(about = "Client for the remote OTP service", long_about = None)]
struct Cli {
    /// Path to a TOML config file; OTP_* environment variables are used otherwise.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set [default: config file, else warn].
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Service(ServiceCommand),
    /// Resolve a client IP from headers given as NAME=VALUE
    ResolveIp {
        #[arg(long = "header", value_parser = parse_pair)]
        headers: Vec<(String, String)>,
        #[arg(long)]
        remote_addr: Option<String>,
        /// Accept private and reserved addresses.
        #[arg(long)]
        allow_private: bool,
        #[arg(long)]
        ignore: Vec<String>,
    },
}

/// Commands that talk to the OTP service.
#[derive(Subcommand)]
enum ServiceCommand {
    /// Check connectivity and credentials
    Hello,
    /// Register a user
    Register {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        directory: Option<String>,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Request a user's authentication state
    State {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        directory: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        remote_ip: Option<String>,
    },
    /// Verify a one-time password
    Verify {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        otp: String,
        #[arg(short, long)]
        directory: Option<String>,
        #[arg(long)]
        remote_ip: Option<String>,
    },
    /// Delete a user
    Delete {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        directory: Option<String>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match (&cli.config, &cli.command) {
        (Some(path), _) => Some(load_config(path)?),
        (None, Commands::Service(_)) => Some(config_from_env()?),
        (None, Commands::ResolveIp { .. }) => None,
    };
    let file_config = config.as_ref().filter(|_| cli.config.is_some());

    init_logging(&logging_settings(
        file_config.map(|c| &c.observability),
        cli.log_level.as_deref(),
        cli.json_logs,
    ))?;

    match cli.command {
        Commands::ResolveIp {
            headers,
            remote_addr,
            allow_private,
            ignore,
        } => {
            let resolver = resolver_settings(
                config.as_ref().map(|c| &c.resolver),
                allow_private,
                ignore,
            );
            Ok(resolve_ip(headers, remote_addr, &resolver))
        }
        Commands::Service(command) => {
            let config = config.unwrap_or_default();
            let client = OtpClient::from_config(&config)?;
            run_service_command(&client, command).await
        }
    }
}

/// File settings (or `warn` without a file), overridden by flags.
fn logging_settings(
    file: Option<&ObservabilityConfig>,
    log_level: Option<&str>,
    json_logs: bool,
) -> ObservabilityConfig {
    let mut settings = file.cloned().unwrap_or_else(|| ObservabilityConfig {
        log_level: "warn".to_string(),
        json_logs: false,
    });
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    settings.json_logs |= json_logs;
    settings
}

/// `[resolver]` settings with flag overrides applied.
fn resolver_settings(
    file: Option<&ResolverConfig>,
    allow_private: bool,
    ignore: Vec<String>,
) -> ResolverConfig {
    let mut settings = file.cloned().unwrap_or_default();
    if allow_private {
        settings.skip_private = false;
    }
    settings.ignore.extend(ignore);
    settings
}

async fn run_service_command(
    client: &OtpClient,
    command: ServiceCommand,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        ServiceCommand::Hello => Ok(print_bool("hello_world", client.hello_world().await)),
        ServiceCommand::Register {
            user,
            directory,
            display_name,
            email,
        } => {
            let response = client
                .register_user(RegisterUserRequest {
                    directory_name: directory,
                    user_name: user,
                    display_name,
                    email,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        ServiceCommand::State {
            user,
            directory,
            description,
            remote_ip,
        } => {
            let outcome = client
                .request_authorisation_state(AuthorisationStateRequest {
                    directory_name: directory,
                    user_name: user,
                    description,
                    remote_ip,
                })
                .await?;
            print_outcome(&outcome)
        }
        ServiceCommand::Verify {
            user,
            otp,
            directory,
            remote_ip,
        } => {
            let outcome = client
                .verify_user_otp(VerifyOtpRequest {
                    directory_name: directory,
                    user_name: user,
                    otp,
                    remote_ip,
                })
                .await?;
            print_outcome(&outcome)
        }
        ServiceCommand::Delete { user, directory } => Ok(print_bool(
            "delete_user",
            client.delete_user(&user, directory.as_deref()).await,
        )),
    }
}

fn print_outcome(outcome: &AuthOutcome) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let rendered = match outcome {
        AuthOutcome::Verified(response) => json!({
            "state": response.state,
            "verified": true,
            "message": response.message,
        }),
        AuthOutcome::Unverified(rejection) => json!({
            "state": outcome.state(),
            "verified": false,
            "rejection": rejection.to_string(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&rendered)?);

    Ok(if outcome.is_authenticated() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_bool(operation: &str, ok: bool) -> ExitCode {
    println!("{}", json!({ "operation": operation, "ok": ok }));
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn resolve_ip(
    headers: Vec<(String, String)>,
    remote_addr: Option<String>,
    settings: &ResolverConfig,
) -> ExitCode {
    let mut request = StaticRequest::new();
    for (name, value) in headers {
        request = request.with_header(name, value);
    }
    if let Some(addr) = remote_addr {
        request = request.with_server_variable(REMOTE_ADDR, addr);
    }

    match ClientIpResolver::from_config(settings).resolve(&request) {
        Some(ip) => {
            println!("{}", json!({ "address": ip.address, "source": ip.source }));
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("No client IP could be resolved");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_settings_follow_file_then_flags() {
        let file = ObservabilityConfig {
            log_level: "debug".to_string(),
            json_logs: true,
        };

        let settings = logging_settings(Some(&file), None, false);
        assert_eq!(settings.log_level, "debug");
        assert!(settings.json_logs);

        let settings = logging_settings(Some(&file), Some("error"), false);
        assert_eq!(settings.log_level, "error");
        assert!(settings.json_logs);

        let settings = logging_settings(None, None, true);
        assert_eq!(settings.log_level, "warn");
        assert!(settings.json_logs);
    }

    #[test]
    fn test_resolver_settings_merge_flags() {
        let file = ResolverConfig {
            skip_private: true,
            ignore: vec!["8.8.4.4".to_string()],
        };

        let settings = resolver_settings(Some(&file), false, vec!["1.1.1.1".to_string()]);
        assert!(settings.skip_private);
        assert_eq!(settings.ignore, vec!["8.8.4.4", "1.1.1.1"]);

        let settings = resolver_settings(None, true, Vec::new());
        assert!(!settings.skip_private);
        assert!(settings.ignore.is_empty());
    }

    #[test]
    fn test_cli_parses_resolve_ip() {
        let cli = Cli::try_parse_from([
            "otp-cli",
            "--json-logs",
            "resolve-ip",
            "--header",
            "X-Forwarded-For=10.0.0.5, 8.8.8.8",
            "--remote-addr",
            "10.0.0.1",
        ])
        .unwrap();
        assert!(cli.json_logs);
        assert!(cli.log_level.is_none());
        match cli.command {
            Commands::ResolveIp { headers, .. } => assert_eq!(
                headers,
                vec![("X-Forwarded-For".to_string(), "10.0.0.5, 8.8.8.8".to_string())]
            ),
            Commands::Service(_) => panic!("expected resolve-ip"),
        }
    }
}
