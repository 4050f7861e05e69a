use std::path::PathBuf;

use crate::error::IgnitionError;
use crate::host::HostEnv;
use crate::vm_kind::VmKind;

use super::files::FileParams;
use super::outcome::{PlanWarning, Planned};
use super::types::{Config, Ignition, Link, Node, Passwd, Storage, Systemd};
use super::users::DEFAULT_USER;
use super::{directories, files, guest_path, links, units, users};

const ZONEINFO: &str = "/usr/share/zoneinfo";

/// Everything needed to describe one machine's first boot.
#[derive(Debug, Clone, Default)]
pub struct ProvisioningRequest {
    /// Login name; empty means [`DEFAULT_USER`].
    pub name: String,
    /// SSH public key authorized for the login and for root.
    pub key: String,
    /// `""` leaves the image default, `"local"` copies the host's zone,
    /// anything else is an IANA zone name.
    pub time_zone: String,
    pub uid: u32,
    pub vm_name: String,
    pub vm_kind: VmKind,
    /// Where the finished descriptor is written.
    pub write_path: PathBuf,
    pub rootful: bool,
    pub net_recover: bool,
}

impl ProvisioningRequest {
    pub fn login(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_USER
        } else {
            &self.name
        }
    }
}

/// An assembled descriptor and whatever planning had to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub config: Config,
    pub warnings: Vec<PlanWarning>,
}

impl Assembly {
    /// True when planning stopped early and whole groups of entries are missing.
    pub fn is_degraded(&self) -> bool {
        self.warnings.iter().any(PlanWarning::is_degraded)
    }
}

/// Build the full descriptor for `req`.
///
/// Fails only when a `"local"` time zone cannot be resolved on the host.
/// Everything else that goes wrong is reported in [`Assembly::warnings`].
pub fn assemble(req: &ProvisioningRequest, host: &dyn HostEnv) -> Result<Assembly, IgnitionError> {
    let name = req.login();

    let time_zone = match req.time_zone.as_str() {
        "" => None,
        "local" => Some(host.local_time_zone()?),
        tz => Some(tz.to_string()),
    };

    let mut planned = Planned::clean(());
    let files = planned.absorb(files::files(
        &FileParams {
            name,
            uid: req.uid,
            rootful: req.rootful,
            vm_kind: req.vm_kind,
            net_recover: req.net_recover,
        },
        host,
    ));

    let mut storage = Storage {
        directories: directories::directories(name),
        files,
        links: links::links(name),
    };
    if let Some(tz) = time_zone {
        storage.links.push(time_zone_link(&tz));
    }

    let config = Config {
        ignition: Ignition::default(),
        passwd: Passwd {
            users: users::users(name, &req.key, req.uid),
        },
        storage,
        systemd: Systemd {
            units: units::units(req.net_recover),
        },
    };

    tracing::info!(
        vm = %req.vm_name,
        user = name,
        files = config.storage.files.len(),
        units = config.systemd.units.len(),
        warnings = planned.warnings.len(),
        "assembled ignition config"
    );

    Ok(Assembly {
        config,
        warnings: planned.warnings,
    })
}

/// `/etc/localtime` → `/usr/share/zoneinfo/<tz>`.
///
/// A zone read on a Windows host may use `\` between segments.
pub fn time_zone_link(tz: &str) -> Link {
    Link {
        node: Node::root("/etc/localtime").overwrite(false),
        hard: Some(false),
        target: guest_path(ZONEINFO, &tz.replace('\\', "/")),
    }
}
