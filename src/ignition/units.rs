//! systemd units enabled, masked or overridden on first boot.

use super::types::{Dropin, Unit};
use super::unitfile::UnitFile;

pub const NET_RECOVERY_UNIT: &str = "net-health-recovery.service";
pub const NET_RECOVERY_SCRIPT_PATH: &str = "/usr/local/bin/net-health-recovery.sh";
pub const READY_UNIT: &str = "ready.service";

/// Root autologin on the serial and virtual consoles. The consoles are only
/// reachable from the host that owns the VM.
pub const AUTOLOGIN_DROPIN: &str = "\
[Service]
ExecStart=
ExecStart=-/usr/sbin/agetty --autologin root --noclear %I $TERM
";

const AUTOLOGIN_DROPIN_NAME: &str = "10-autologin.conf";

pub fn units(net_recover: bool) -> Vec<Unit> {
    let mut units = vec![
        Unit {
            enabled: Some(true),
            ..Unit::named("podman.socket")
        },
        Unit {
            enabled: Some(false),
            mask: Some(true),
            ..Unit::named("docker.service")
        },
        Unit {
            enabled: Some(false),
            mask: Some(true),
            ..Unit::named("docker.socket")
        },
        // Keep the base image from updating itself underneath the engine.
        Unit {
            enabled: Some(false),
            ..Unit::named("zincati.service")
        },
    ];

    for getty in ["serial-getty@.service", "getty@.service"] {
        units.push(Unit {
            dropins: vec![Dropin {
                name: AUTOLOGIN_DROPIN_NAME.into(),
                contents: Some(AUTOLOGIN_DROPIN.into()),
            }],
            ..Unit::named(getty)
        });
    }

    if net_recover {
        units.push(Unit {
            enabled: Some(true),
            contents: Some(net_recovery_unit_file().to_string()),
            ..Unit::named(NET_RECOVERY_UNIT)
        });
    }

    units
}

pub fn net_recovery_unit_file() -> UnitFile {
    let mut unit = UnitFile::new();
    unit.add("Unit", "Description", "Verifies health of network and recovers if necessary")
        .add("Unit", "After", "sshd.socket sshd.service")
        .add("Service", "ExecStart", NET_RECOVERY_SCRIPT_PATH)
        .add("Service", "StandardOutput", "journal")
        .add("Service", "StandardError", "journal")
        .add("Service", "StandardInput", "null")
        .add("Install", "WantedBy", "default.target");
    unit
}

/// Bounces the NIC when the host gateway stops answering. Works around a rare
/// virtio-net stall seen with qemu on macOS hosts.
pub const NET_RECOVERY_SCRIPT: &str = r#"#!/bin/bash
# Verify network health, and bounce the network device if host connectivity
# is lost.

sleep 120 # allow time for network setup on initial boot
while true; do
  sleep 30
  curl -s -o /dev/null --max-time 30 http://192.168.127.1/health
  if [ "$?" != "0" ]; then
    echo "bouncing nic due to loss of connectivity with host"
    ifconfig enp0s1 down; ifconfig enp0s1 up
  fi
done
"#;

/// Skeleton for a oneshot unit that signals the host once sshd is up. Drops
/// the guest into emergency mode if it fails.
pub fn ready_unit_file() -> UnitFile {
    let mut unit = UnitFile::new();
    unit.add("Unit", "After", "sshd.socket sshd.service")
        .add("Unit", "OnFailure", "emergency.target")
        .add("Unit", "OnFailureJobMode", "isolate")
        .add("Service", "Type", "oneshot")
        .add("Service", "RemainAfterExit", "yes")
        .add("Install", "RequiredBy", "default.target");
    unit
}

/// `ready.service` reporting readiness to the host (CID 2) on `vsock_port`.
pub fn ready_unit(vsock_port: u32) -> Unit {
    let mut file = ready_unit_file();
    file.add(
        "Service",
        "ExecStart",
        &format!("/bin/sh -c '/usr/bin/echo Ready | socat - VSOCK-CONNECT:2:{vsock_port}'"),
    );
    Unit {
        enabled: Some(true),
        contents: Some(file.to_string()),
        ..Unit::named(READY_UNIT)
    }
}
