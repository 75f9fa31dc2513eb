//! Example: drive a device described by a JSON profile over a raw TCP console
//!
//! Terminal servers often expose a device console as a plain TCP port.
//! This loads a profile document, wraps the socket in an `IoTransport` and
//! commits a change in a transactional configuration mode.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example profile_file -- profile.json 10.0.0.50:7001 "set system host-name lab1"
//! ```

use std::env;
use std::time::Duration;

use netlayer::platform::ProfileSpec;
use netlayer::transport::IoTransport;
use netlayer::{DeviceProfile, SessionBuilder};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("USAGE: profile_file <PROFILE.json> <HOST:PORT> <CONFIG COMMAND>...");
        std::process::exit(1);
    }

    let spec: ProfileSpec = serde_json::from_str(&std::fs::read_to_string(&args[1])?)?;
    let profile = DeviceProfile::try_from(spec)?;
    let Some(config_mode) = profile
        .layers
        .values()
        .find(|layer| layer.transactional)
        .map(|layer| layer.name.clone())
    else {
        eprintln!("Profile '{}' has no transactional layer", profile.name);
        std::process::exit(1);
    };

    println!("Connecting to {}...", args[2]);
    let socket = TcpStream::connect(&args[2]).await?;
    let mut session = SessionBuilder::new(profile)
        .timeout(Duration::from_secs(60))
        .open(IoTransport::new(socket))
        .await?;

    for command in &args[3..] {
        let response = session.run(command, Some(config_mode.as_str())).await?;
        if !response.is_success() {
            eprintln!("{}: {:?}", command, response.failure_message);
        }
    }

    if session.commit().await? {
        println!("Committed");
    }

    session.close().await?;
    Ok(())
}
