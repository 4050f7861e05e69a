//! Host-side capabilities the assembler depends on.
//!
//! Everything the planners need to learn about the machine they run on goes
//! through [`HostEnv`], so assembly can be driven by a fake in tests.

use std::path::{Path, PathBuf};

use crate::error::IgnitionError;

pub trait HostEnv {
    /// Home directory of the invoking user.
    fn home_dir(&self) -> Option<PathBuf>;

    /// IANA name of the host's configured time zone, e.g. `Europe/Berlin`.
    fn local_time_zone(&self) -> Result<String, IgnitionError>;

    /// Environment variable lookup. Unset and non-UTF-8 values are both `None`.
    fn var(&self, key: &str) -> Option<String>;
}

/// The real host: process environment, `dirs`, and `/etc/localtime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl SystemHost {
    /// Numeric uid of the invoking user.
    #[cfg(unix)]
    pub fn current_uid(&self) -> u32 {
        // SAFETY: getuid has no preconditions and cannot fail.
        unsafe { libc::getuid() }
    }

    #[cfg(not(unix))]
    pub fn current_uid(&self) -> u32 {
        1000
    }
}

impl HostEnv for SystemHost {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn local_time_zone(&self) -> Result<String, IgnitionError> {
        if let Ok(target) = std::fs::read_link("/etc/localtime") {
            if let Some(zone) = zone_from_localtime_target(&target) {
                return Ok(zone);
            }
        }
        match std::fs::read_to_string("/etc/timezone") {
            Ok(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Ok(_) => Err(IgnitionError::TimeZone {
                message: "/etc/timezone is empty".into(),
            }),
            Err(e) => Err(IgnitionError::TimeZone {
                message: format!(
                    "/etc/localtime is not a zoneinfo link and /etc/timezone is unreadable: {e}"
                ),
            }),
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Extract the zone name from an `/etc/localtime` symlink target.
///
/// `/usr/share/zoneinfo/America/New_York` → `America/New_York`. Also handles
/// relative targets (`../usr/share/zoneinfo/UTC`) and macOS'
/// `/var/db/timezone/zoneinfo/...` layout.
pub fn zone_from_localtime_target(target: &Path) -> Option<String> {
    let s = target.to_string_lossy();
    let (_, zone) = s.split_once("zoneinfo/")?;
    let zone = zone.trim_matches('/');
    if zone.is_empty() {
        None
    } else {
        Some(zone.to_string())
    }
}
