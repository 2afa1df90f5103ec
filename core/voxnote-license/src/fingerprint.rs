//! Hardware fingerprinting for license binding.
//!
//! Derives a stable machine identifier from hardware and OS signals.
//! Only the final SHA-256 digest ever leaves this module; raw signals
//! (MAC address, disk serial) are never exposed.

use sha2::{Digest, Sha256};
use std::env;

/// Generates the machine fingerprint: 64 uppercase hex characters.
///
/// Combines {MAC address, fixed-disk serial, CPU descriptor, OS
/// name+release}, normalized and joined with `|`, hashed with SHA-256.
/// Every probe is independently guarded and substitutes a fixed
/// sentinel on error, so this function never fails. Two calls in the
/// same OS session return the same string.
#[must_use]
pub fn generate_machine_id() -> String {
    let data = [
        get_mac_address(),
        get_disk_serial(),
        get_cpu_info(),
        get_os_info(),
    ]
    .map(|s| normalize(&s))
    .join("|");

    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize()).to_ascii_uppercase()
}

/// Trims, lowercases and strips spaces so cosmetic differences in
/// probe output don't change the fingerprint.
fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "")
}

/// MAC address of the first non-loopback network interface.
fn get_mac_address() -> String {
    probe_mac().unwrap_or_else(|| "unknown_mac".to_string())
}

fn probe_mac() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let entries = std::fs::read_dir("/sys/class/net").ok()?;
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name != "lo")
            .collect();
        names.sort();
        for name in names {
            if let Ok(addr) = std::fs::read_to_string(format!("/sys/class/net/{name}/address")) {
                let mac = addr.trim().replace(':', "");
                if !mac.is_empty() && mac.chars().any(|c| c != '0') {
                    return Some(mac);
                }
            }
        }
        None
    }

    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("ifconfig").output().ok()?;
        let text = String::from_utf8(output.stdout).ok()?;
        text.lines()
            .find_map(|l| l.trim().strip_prefix("ether "))
            .map(|mac| mac.trim().replace(':', ""))
    }

    #[cfg(target_os = "windows")]
    {
        let output = std::process::Command::new("getmac")
            .args(["/NH", "/FO", "CSV"])
            .output()
            .ok()?;
        let text = String::from_utf8(output.stdout).ok()?;
        let first = text.lines().find(|l| !l.trim().is_empty())?;
        let mac = first.split(',').next()?.trim_matches('"').replace('-', "");
        if mac.is_empty() {
            None
        } else {
            Some(mac)
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

/// Serial number of the primary fixed disk.
fn get_disk_serial() -> String {
    probe_disk_serial()
        .filter(|s| !s.is_empty())
        .map(|s| s.chars().take(32).collect::<String>())
        .unwrap_or_else(|| "unknown_disk".to_string())
}

fn probe_disk_serial() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let entries = std::fs::read_dir("/sys/block").ok()?;
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| !n.starts_with("loop") && !n.starts_with("ram") && !n.starts_with("dm-"))
            .collect();
        names.sort();
        for name in names {
            if let Ok(serial) = std::fs::read_to_string(format!("/sys/block/{name}/device/serial"))
            {
                let serial = serial.trim().replace(' ', "");
                if !serial.is_empty() {
                    return Some(serial);
                }
            }
        }
        None
    }

    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("system_profiler")
            .args(["SPNVMeDataType", "SPSerialATADataType"])
            .output()
            .ok()?;
        let text = String::from_utf8(output.stdout).ok()?;
        text.lines()
            .find_map(|l| l.trim().strip_prefix("Serial Number:"))
            .map(|s| s.trim().replace(' ', ""))
    }

    #[cfg(target_os = "windows")]
    {
        // PowerShell first for compatibility on modern Windows, wmic
        // as a fallback on older installs.
        let ps_cmd = "Get-WmiObject Win32_DiskDrive | \
             Where-Object { $_.MediaType -eq 'Fixed hard disk media' } | \
             Select-Object -First 1 -ExpandProperty SerialNumber";
        if let Ok(output) = std::process::Command::new("powershell")
            .args(["-Command", ps_cmd])
            .output()
        {
            if let Ok(text) = String::from_utf8(output.stdout) {
                let serial = text.trim().replace(' ', "");
                if !serial.is_empty() {
                    return Some(serial);
                }
            }
        }
        let output = std::process::Command::new("wmic")
            .args([
                "diskdrive",
                "where",
                "MediaType='Fixed hard disk media'",
                "get",
                "SerialNumber",
                "/value",
            ])
            .output()
            .ok()?;
        let text = String::from_utf8(output.stdout).ok()?;
        text.lines()
            .find_map(|l| l.trim().strip_prefix("SerialNumber="))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

/// Descriptor of the CPU model.
fn get_cpu_info() -> String {
    probe_cpu().unwrap_or_else(|| "unknown".to_string())
}

fn probe_cpu() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        cpuinfo
            .lines()
            .find(|l| l.starts_with("model name"))
            .and_then(|l| l.split(':').nth(1))
            .map(|s| s.trim().to_string())
    }

    #[cfg(target_os = "macos")]
    {
        let output = std::process::Command::new("sysctl")
            .args(["-n", "machdep.cpu.brand_string"])
            .output()
            .ok()?;
        String::from_utf8(output.stdout)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(target_os = "windows")]
    {
        env::var("PROCESSOR_IDENTIFIER").ok()
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        None
    }
}

/// OS name plus release, e.g. `linux 6.8.0-45-generic`.
fn get_os_info() -> String {
    format!("{} {}", env::consts::OS, get_os_release())
}

fn get_os_release() -> String {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    #[cfg(target_os = "windows")]
    {
        env::var("OS").unwrap_or_else(|_| "unknown".to_string())
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        "unknown".to_string()
    }
}
