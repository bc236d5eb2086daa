//! Basic example: run a few show commands on one or more switches.
//!
//! # Prerequisites
//!
//! SSH access to at least one Cisco IOS / IOS-XE device.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example basic -- --host 10.0.0.1 --host 10.0.0.2 --user admin --password secret
//! ```

use std::env;
use std::time::Duration;

use netsweep::dispatch::{DispatcherBuilder, HostJob};
use netsweep::transport::HostKeyVerification;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.hosts.is_empty() {
        Args::print_help();
        return Ok(());
    }

    println!("Running on {} host(s)...", args.hosts.len());

    let dispatcher = DispatcherBuilder::new()
        .username(&args.user)
        .password(&args.password)
        .port(args.port)
        .timeout(Duration::from_secs(args.timeout))
        .max_sessions(args.max_sessions)
        .ping(!args.no_ping)
        .host_key_verification(HostKeyVerification::AcceptNew)
        .build()?;

    let commands = vec![
        "show clock".to_string(),
        "show version | include uptime".to_string(),
        "show ip interface brief".to_string(),
    ];
    let jobs = HostJob::shared(args.hosts, commands);

    for result in dispatcher.run(jobs).await {
        println!("\n=== {} ({}) ===", result.host, result.status);
        if let Some(hostname) = &result.hostname {
            println!("Prompt hostname: {}", hostname);
        }
        for output in &result.outputs {
            println!("--- {} ({:.1?})", output.command, output.elapsed);
            println!("{}", output.output.trim());
        }
        if let Some(error) = &result.error {
            println!("Error: {}", error);
        }
    }

    Ok(())
}

/// Simple argument parser
struct Args {
    hosts: Vec<String>,
    port: u16,
    user: String,
    password: String,
    timeout: u64,
    max_sessions: usize,
    no_ping: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut hosts = Vec::new();
        let mut port = 22u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "admin".to_string());
        let mut password = env::var("NETSWEEP_PASSWORD").unwrap_or_default();
        let mut timeout = 30u64;
        let mut max_sessions = 10usize;
        let mut no_ping = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        hosts.push(args[i].clone());
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = args[i].clone();
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(30);
                    }
                }
                "--max-sessions" => {
                    i += 1;
                    if i < args.len() {
                        max_sessions = args[i].parse().unwrap_or(10);
                    }
                }
                "--no-ping" => no_ping = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            hosts,
            port,
            user,
            password,
            timeout,
            max_sessions,
            no_ping,
        }
    }

    fn print_help() {
        println!(
            r#"netsweep basic example

USAGE:
    cargo run --example basic -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Target device (repeatable)
    -p, --port <PORT>          SSH port [default: 22]
    -u, --user <USER>          Username [default: $USER]
    -P, --password <PASS>      Password [default: $NETSWEEP_PASSWORD]
    -t, --timeout <SECS>       Connection timeout [default: 30]
    --max-sessions <N>         Devices worked on at once [default: 10]
    --no-ping                  Skip the ping check before connecting
    --help                     Print this help message

EXAMPLES:
    cargo run --example basic -- --host 10.0.0.1 --user admin --password secret
    NETSWEEP_PASSWORD=secret cargo run --example basic -- -h 10.0.0.1 -h 10.0.0.2 --no-ping
"#
        );
    }
}
