//! netsweep - run show commands across a fleet of Cisco devices.
//!
//! Usage:
//!   netsweep --hosts-file switches.csv --command "show version" -u admin
//!   NETSWEEP_PASSWORD=secret netsweep --host 10.0.0.1 --commands-file cmds.txt -u admin --json
//!   netsweep --range 10.1.0.1 10.1.0.254 -c "show clock" -u admin
//!   netsweep --jobs-file jobs.csv -u admin
//!   netsweep --firmware-file upgrades.csv --ftp-server 192.0.2.10 -u admin

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, ValueEnum};
use log::{info, warn};

use netsweep::dispatch::{DispatcherBuilder, HostJob, SessionResult};
use netsweep::driver::DriverConfig;
use netsweep::inventory;
use netsweep::report::{self, ReportFormat};
use netsweep::transport::HostKeyVerification;

#[derive(Parser, Debug)]
#[command(name = "netsweep")]
#[command(about = "Run CLI commands on many network devices over SSH")]
#[command(version)]
struct Args {
    /// Device hostname or IP (repeatable)
    #[arg(long = "host", value_name = "HOST")]
    hosts: Vec<String>,

    /// File with one device per line; only the first comma-separated column is used
    #[arg(long)]
    hosts_file: Option<PathBuf>,

    /// Every IPv4 address from START to END, inclusive (repeatable)
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    range: Vec<Ipv4Addr>,

    /// Command to run on every device (repeatable, run in order)
    #[arg(short, long = "command", value_name = "COMMAND")]
    commands: Vec<String>,

    /// File with one command per line
    #[arg(long)]
    commands_file: Option<PathBuf>,

    /// File of `host,command,command...` rows, each host with its own sequence
    #[arg(long)]
    jobs_file: Option<PathBuf>,

    /// File of `host,image` rows; stages each image for install on next reload
    #[arg(long, requires = "ftp_server")]
    firmware_file: Option<PathBuf>,

    /// FTP server the firmware images are copied from
    #[arg(long)]
    ftp_server: Option<String>,

    /// SSH username
    #[arg(short, long)]
    username: String,

    /// SSH password
    #[arg(short, long, env = "NETSWEEP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Maximum devices worked on at once
    #[arg(long, default_value_t = 100)]
    max_sessions: usize,

    /// SSH port
    #[arg(long, default_value_t = 22)]
    port: u16,

    /// Skip the ping check before connecting
    #[arg(long)]
    no_ping: bool,

    /// Host key checking mode
    #[arg(long, value_enum, default_value_t = HostKeyChecking::AcceptNew)]
    host_key_checking: HostKeyChecking,

    /// Seconds a single command may run before the device is given up on
    #[arg(long, default_value_t = 1800)]
    command_timeout: u64,

    /// Write JSON instead of CSV
    #[arg(long)]
    json: bool,

    /// Report path (default: results-<timestamp>.csv|json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HostKeyChecking {
    Strict,
    AcceptNew,
    Off,
}

impl From<HostKeyChecking> for HostKeyVerification {
    fn from(mode: HostKeyChecking) -> Self {
        match mode {
            HostKeyChecking::Strict => HostKeyVerification::Strict,
            HostKeyChecking::AcceptNew => HostKeyVerification::AcceptNew,
            HostKeyChecking::Off => HostKeyVerification::Disabled,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let jobs = collect_jobs(&args)?;
    let hosts: Vec<String> = jobs.iter().map(|job| job.host.clone()).collect();

    let dispatcher = DispatcherBuilder::new()
        .username(&args.username)
        .password(&args.password)
        .port(args.port)
        .max_sessions(args.max_sessions)
        .ping(!args.no_ping)
        .host_key_verification(args.host_key_checking.into())
        .driver_config(
            DriverConfig::default().with_command_timeout(Duration::from_secs(args.command_timeout)),
        )
        .build()?;

    let shutdown = dispatcher.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping all sessions");
            shutdown.shutdown();
        }
    });

    info!("running on {} host(s), {} at a time", hosts.len(), args.max_sessions);

    let mut results = dispatcher.run(jobs).await;
    sort_by_input(&mut results, &hosts);

    let format = if args.json {
        ReportFormat::Json
    } else {
        ReportFormat::Csv
    };
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(report::default_file_name(format, Local::now())));
    write_report(&path, format, &results)?;

    let succeeded = results.iter().filter(|r| r.status.is_success()).count();
    println!(
        "{} of {} host(s) succeeded; report written to {}",
        succeeded,
        results.len(),
        path.display()
    );
    for result in results.iter().filter(|r| !r.status.is_success()) {
        println!("  {}: {}", result.host, result.status);
    }

    Ok(())
}

/// Jobs from every input given on the command line, in input order.
fn collect_jobs(args: &Args) -> Result<Vec<HostJob>> {
    let mut hosts = args.hosts.clone();
    if let Some(path) = &args.hosts_file {
        hosts.extend(inventory::parse_hosts(&read_input(path)?));
    }
    for pair in args.range.chunks_exact(2) {
        hosts.extend(inventory::ip_range(pair[0], pair[1])?);
    }

    let mut commands = args.commands.clone();
    if let Some(path) = &args.commands_file {
        commands.extend(inventory::parse_commands(&read_input(path)?));
    }

    let mut jobs = Vec::new();
    if !hosts.is_empty() {
        if commands.is_empty() {
            bail!("no commands given; use --command or --commands-file");
        }
        jobs.extend(HostJob::shared(hosts, commands));
    } else if !commands.is_empty() {
        warn!("--command given without --host, --hosts-file or --range; ignoring it");
    }

    if let Some(path) = &args.jobs_file {
        jobs.extend(inventory::parse_jobs(&read_input(path)?)?);
    }

    if let Some(path) = &args.firmware_file {
        let server = args
            .ftp_server
            .as_deref()
            .context("--firmware-file needs --ftp-server")?;
        jobs.extend(inventory::firmware_jobs(&read_input(path)?, server)?);
    }

    if jobs.is_empty() {
        bail!("no hosts given; use --host, --hosts-file, --range, --jobs-file or --firmware-file");
    }
    Ok(jobs)
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Restore input order; results arrive in completion order.
fn sort_by_input(results: &mut [SessionResult], hosts: &[String]) {
    let mut position = HashMap::new();
    for (i, host) in hosts.iter().enumerate() {
        position.entry(host.as_str()).or_insert(i);
    }
    results.sort_by_key(|r| position.get(r.host.as_str()).copied().unwrap_or(usize::MAX));
}

fn write_report(path: &Path, format: ReportFormat, results: &[SessionResult]) -> Result<()> {
    match format {
        ReportFormat::Csv => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            report::write_csv(results, BufWriter::new(file))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        ReportFormat::Json => {
            let json = report::to_json(results)?;
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        }
    }
    Ok(())
}
