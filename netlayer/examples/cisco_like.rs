//! Example: walk a Cisco-like device through its modes
//!
//! Connects over SSH, runs a show command in privileged exec, makes a change
//! in configuration mode and closes, which unwinds back to user exec.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example cisco_like -- --host 10.0.0.1 --user admin --password secret --enable secret
//! ```
//!
//! Set `RUST_LOG=debug` to see every command, prompt and transition.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use netlayer::SessionBuilder;
use netlayer::platform::vendors::cisco_like;
use netlayer::transport::SshConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = SshConfig::new(&args.host, &args.user)
        .port(args.port)
        .timeout(Duration::from_secs(args.timeout));
    if let Some(password) = &args.password {
        config = config.password(password);
    } else if let Some(key_path) = &args.key {
        config = config.private_key(key_path, None);
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    }

    let mut builder = match &args.enable {
        Some(secret) => SessionBuilder::new(cisco_like::profile_with_enable_secret())
            .secret("privilege_exec", secret),
        None => SessionBuilder::new(cisco_like::profile()),
    };
    builder = builder.timeout(Duration::from_secs(args.timeout));

    println!("Connecting to {}:{}...", args.host, args.port);
    let mut session = builder.connect_ssh(config).await?;
    println!(
        "Connected, mode: {}",
        session
            .current_mode()
            .map(|m| m.name().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );

    let response = session.run("show version", Some("privilege_exec")).await?;
    println!("{}", "-".repeat(50));
    println!("{}", response.result);
    println!("{}", "-".repeat(50));
    println!("Command completed in {:?}", response.elapsed);

    let response = session
        .run("interface Loopback99", Some("config_mode"))
        .await?;
    if !response.is_success() {
        eprintln!("Command failed: {:?}", response.failure_message);
    }
    println!("Now at prompt {}", response.prompt);

    println!("\nClosing connection...");
    session.close().await?;
    println!("Done!");

    Ok(())
}

/// Simple argument parser
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    enable: Option<String>,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: "localhost".to_string(),
            port: 22,
            user: env::var("USER").unwrap_or_else(|_| "admin".to_string()),
            password: None,
            key: None,
            enable: None,
            timeout: 30,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => parsed.host = value.unwrap_or(parsed.host),
                "--port" | "-p" => {
                    parsed.port = value.and_then(|v| v.parse().ok()).unwrap_or(22);
                }
                "--user" | "-u" => parsed.user = value.unwrap_or(parsed.user),
                "--password" | "-P" => parsed.password = value,
                "--key" | "-k" => parsed.key = value.map(PathBuf::from),
                "--enable" | "-e" => parsed.enable = value,
                "--timeout" | "-t" => {
                    parsed.timeout = value.and_then(|v| v.parse().ok()).unwrap_or(30);
                }
                "--help" => {
                    println!(
                        "USAGE: cargo run --example cisco_like -- --host <HOST> --user <USER> \
                         (--password <PASS> | --key <PATH>) [--enable <SECRET>] [--port <PORT>] \
                         [--timeout <SECS>]"
                    );
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {}", other);
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        parsed
    }
}
