//! Host and command inventories.
//!
//! Plain-text inputs turned into [`HostJob`]s: host lists, command lists,
//! per-host command rows, firmware staging rows and IPv4 ranges.

use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::dispatch::HostJob;
use crate::error::{DriverError, Result};

/// Largest IPv4 range accepted in one expansion (a /16).
pub const MAX_RANGE: u32 = 65_536;

/// First column of each line, with spaces removed. Blank and `#` lines are skipped.
pub fn parse_hosts(text: &str) -> Vec<String> {
    rows(text)
        .filter_map(|(_, fields)| fields.first().map(|host| host.replace(' ', "")))
        .filter(|host| !host.is_empty())
        .collect()
}

/// One command per line, trimmed. Blank lines are skipped.
pub fn parse_commands(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Per-host command sequences, one `host,command,command...` row per host.
pub fn parse_jobs(text: &str) -> Result<Vec<HostJob>> {
    rows(text)
        .map(|(number, fields)| {
            let host = fields[0].replace(' ', "");
            let commands: Vec<String> = fields[1..]
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            if commands.is_empty() {
                return Err(invalid(format!("line {number}: no commands for {host}")));
            }
            Ok(HostJob::new(host, Arc::new(commands)))
        })
        .collect()
}

/// Commands that stage `image` from `ftp_server` on a Catalyst switch stack.
///
/// Old packages are cleaned first, the image is installed to activate on
/// the next reload, and the provisioned version is shown for the report.
pub fn firmware_commands(ftp_server: &str, image: &str) -> Vec<String> {
    let server = ftp_server.trim().trim_end_matches('/');
    let image = image.trim().trim_start_matches('/');
    vec![
        "request platform software package clean".to_string(),
        format!(
            "request platform software package install switch all file ftp://{server}/{image} on-reboot new auto-copy"
        ),
        "show version provisioned | i version".to_string(),
    ]
}

/// Firmware staging jobs from `host,image` rows.
pub fn firmware_jobs(text: &str, ftp_server: &str) -> Result<Vec<HostJob>> {
    if ftp_server.trim().is_empty() {
        return Err(invalid("an FTP server is required for firmware staging".to_string()));
    }

    rows(text)
        .map(|(number, fields)| {
            let host = fields[0].replace(' ', "");
            match fields.get(1).map(|image| image.trim()) {
                Some(image) if !image.is_empty() => Ok(HostJob::new(
                    host,
                    Arc::new(firmware_commands(ftp_server, image)),
                )),
                _ => Err(invalid(format!("line {number}: no firmware image for {host}"))),
            }
        })
        .collect()
}

/// Every address from `start` to `end`, both included.
pub fn ip_range(start: Ipv4Addr, end: Ipv4Addr) -> Result<Vec<String>> {
    let (first, last) = (u32::from(start), u32::from(end));
    if first > last {
        return Err(invalid(format!("range start {start} is after range end {end}")));
    }
    if last - first >= MAX_RANGE {
        return Err(invalid(format!(
            "range {start} - {end} exceeds {MAX_RANGE} addresses"
        )));
    }

    Ok((first..=last).map(|ip| Ipv4Addr::from(ip).to_string()).collect())
}

/// Non-blank, non-comment lines split on commas, with 1-based line numbers.
fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| (index + 1, line.split(',').collect()))
}

fn invalid(message: String) -> crate::Error {
    DriverError::InvalidConfig { message }.into()
}
