use std::path::{Path, PathBuf};

use facet::Facet;

use crate::error::IgnitionError;
use crate::host::{HostEnv, SystemHost};
use crate::ignition::ProvisioningRequest;
use crate::paths;
use crate::vm_kind::VmKind;

pub const DEFAULT_VM_NAME: &str = "podman-machine-default";

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct MachineConfig {
    /// VM display name; also names the default `<name>.ign` output.
    #[facet(default)]
    pub name: String,
    #[facet(default)]
    pub vm_kind: String,
    pub output: Option<String>,
    #[facet(default)]
    pub user: UserConfig,
    #[facet(default)]
    pub machine: MachineSection,
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct UserConfig {
    #[facet(default)]
    pub name: String,
    pub uid: Option<u32>,
    pub ssh_key: Option<String>,
    pub ssh_key_file: Option<String>,
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct MachineSection {
    #[facet(default)]
    pub timezone: String,
    #[facet(default)]
    pub rootful: bool,
    #[facet(default)]
    pub net_recover: bool,
    pub ready_vsock_port: Option<u32>,
    pub ignition_file: Option<String>,
}

impl MachineConfig {
    pub fn vm_name(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_VM_NAME
        } else {
            &self.name
        }
    }

    pub fn vm_kind(&self) -> Result<VmKind, IgnitionError> {
        if self.vm_kind.is_empty() {
            Ok(VmKind::default())
        } else {
            self.vm_kind.parse()
        }
    }

    /// Explicit `output`, or `<machine dir>/<vm name>.ign`.
    pub fn output_path(&self, host: &dyn HostEnv) -> PathBuf {
        match &self.output {
            Some(p) => paths::expand_tilde(p, host.home_dir().as_deref()),
            None => paths::ignition_path(self.vm_name()),
        }
    }

    /// The SSH public key text, read from `ssh_key_file` if that is how it was
    /// given, and checked to be a valid OpenSSH public key.
    pub fn ssh_key(&self, host: &dyn HostEnv) -> Result<String, IgnitionError> {
        let text = match (&self.user.ssh_key, &self.user.ssh_key_file) {
            (Some(key), None) => key.clone(),
            (None, Some(file)) => {
                let path = paths::expand_tilde(file, host.home_dir().as_deref());
                std::fs::read_to_string(&path).map_err(|source| IgnitionError::Io {
                    context: format!("reading SSH public key {}", path.display()),
                    source,
                })?
            }
            (Some(_), Some(_)) => {
                return Err(IgnitionError::Validation {
                    message: "set only one of user.ssh_key and user.ssh_key_file".into(),
                });
            }
            (None, None) => {
                return Err(IgnitionError::Validation {
                    message: "an SSH public key is required (user.ssh_key or user.ssh_key_file)"
                        .into(),
                });
            }
        };

        let key = text.trim();
        ssh_key::PublicKey::from_openssh(key).map_err(|e| IgnitionError::Validation {
            message: format!("invalid SSH public key: {e}"),
        })?;
        Ok(key.to_string())
    }

    pub fn to_request(&self, host: &SystemHost) -> Result<ProvisioningRequest, IgnitionError> {
        Ok(ProvisioningRequest {
            name: self.user.name.clone(),
            key: self.ssh_key(host)?,
            time_zone: self.machine.timezone.clone(),
            uid: self.user.uid.unwrap_or_else(|| host.current_uid()),
            vm_name: self.vm_name().to_string(),
            vm_kind: self.vm_kind()?,
            write_path: self.output_path(host),
            rootful: self.machine.rootful,
            net_recover: self.machine.net_recover,
        })
    }
}

// ── validation ────────────────────────────────────────────

pub fn validate_config(config: &MachineConfig) -> Result<(), IgnitionError> {
    validate_vm_name(config.vm_name())?;
    config.vm_kind()?;

    if !config.user.name.is_empty() {
        validate_login(&config.user.name)?;
    }

    if config.user.ssh_key.is_some() && config.user.ssh_key_file.is_some() {
        return Err(IgnitionError::Validation {
            message: "set only one of user.ssh_key and user.ssh_key_file".into(),
        });
    }

    if let Some(port) = config.machine.ready_vsock_port
        && port == 0
    {
        return Err(IgnitionError::Validation {
            message: "machine.ready_vsock_port must be non-zero".into(),
        });
    }

    Ok(())
}

fn validate_vm_name(name: &str) -> Result<(), IgnitionError> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');
    if !valid {
        return Err(IgnitionError::Validation {
            message: format!("machine name must match [a-zA-Z0-9][a-zA-Z0-9._-]* (got '{name}')"),
        });
    }
    Ok(())
}

fn validate_login(name: &str) -> Result<(), IgnitionError> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        && name.len() <= 32;
    if !valid {
        return Err(IgnitionError::Validation {
            message: format!("user name must match [a-z_][a-z0-9_-]{{0,31}} (got '{name}')"),
        });
    }
    Ok(())
}

// ── public API ────────────────────────────────────────────

pub fn load_config(path: &Path) -> Result<MachineConfig, IgnitionError> {
    let contents = std::fs::read_to_string(path).map_err(|source| IgnitionError::ConfigLoad {
        path: path.display().to_string(),
        source,
    })?;

    let config: MachineConfig =
        facet_toml::from_str(&contents).map_err(|e| IgnitionError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    validate_config(&config)?;
    Ok(config)
}
