//! The hypervisor flavour a machine runs under.
//!
//! Written verbatim into the guest's `/etc/containers/podman-machine` marker so
//! tooling inside the VM can tell which provider created it.

use std::fmt;
use std::str::FromStr;

use crate::error::IgnitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VmKind {
    #[default]
    Qemu,
    Wsl,
    AppleHv,
    HyperV,
    LibKrun,
}

impl VmKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VmKind::Qemu => "qemu",
            VmKind::Wsl => "wsl",
            VmKind::AppleHv => "applehv",
            VmKind::HyperV => "hyperv",
            VmKind::LibKrun => "libkrun",
        }
    }
}

impl fmt::Display for VmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VmKind {
    type Err = IgnitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qemu" => Ok(VmKind::Qemu),
            "wsl" => Ok(VmKind::Wsl),
            "applehv" => Ok(VmKind::AppleHv),
            "hyperv" => Ok(VmKind::HyperV),
            "libkrun" | "krun" => Ok(VmKind::LibKrun),
            other => Err(IgnitionError::Validation {
                message: format!(
                    "unknown vm kind '{other}' (use qemu, wsl, applehv, hyperv, or libkrun)"
                ),
            }),
        }
    }
}
