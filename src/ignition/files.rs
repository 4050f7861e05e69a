//! Inline files written on first boot.

use std::path::{Path, PathBuf};

use crate::host::HostEnv;
use crate::vm_kind::VmKind;

use super::certs::{self, SSL_CERT_DIR, SSL_CERT_FILE};
use super::directories::guest_home;
use super::outcome::{PlanWarning, Planned};
use super::types::{File, Node, Resource};
use super::unitfile::UnitFile;
use super::units::{NET_RECOVERY_SCRIPT, NET_RECOVERY_SCRIPT_PATH};

pub const LINGER_UNIT_NAME: &str = "linger-example.service";
pub const PODMAN_DOCKER_TMPFILES_PATH: &str = "/etc/tmpfiles.d/podman-docker.conf";

/// First subordinate id handed out, and how many.
pub const SUB_ID_BASE: u32 = 100_000;
pub const SUB_ID_COUNT: u32 = 1_000_000;

const USER_CONTAINERS_CONF: &str = "\
[containers]
netns=\"bridge\"
pids_limit=0
";

// machine_enabled is deprecated but still read by older podman builds on the image.
const ROOT_CONTAINERS_CONF: &str = "\
[engine]
machine_enabled=true
";

const DELEGATE_CONF: &str = "\
[Service]
Delegate=memory pids cpu io
";

const DOCKER_HOST_PROFILE: &str =
    "export DOCKER_HOST=\"unix://$(podman info -f \"{{.Host.RemoteSocket.Path}}\")\"\n";

/// Per-machine inputs to the file plan.
#[derive(Debug, Clone, Copy)]
pub struct FileParams<'a> {
    pub name: &'a str,
    pub uid: u32,
    pub rootful: bool,
    pub vm_kind: VmKind,
    pub net_recover: bool,
}

/// `(base, count)` of the subordinate id range for a user with `uid`, moved
/// past `uid` when the default range would contain it.
pub fn sub_id_range(uid: u32) -> (u32, u32) {
    let mut base = SUB_ID_BASE;
    if uid >= SUB_ID_BASE && uid < SUB_ID_BASE + SUB_ID_COUNT {
        base = uid + 1;
    }
    (base, SUB_ID_COUNT)
}

pub fn podman_socket(uid: u32, rootful: bool) -> String {
    if rootful {
        "/run/podman/podman.sock".into()
    } else {
        format!("/run/user/{uid}/podman/podman.sock")
    }
}

/// tmpfiles.d line linking `/run/docker.sock` to the podman socket.
pub fn docker_tmpfiles_line(uid: u32, rootful: bool, newline: bool) -> String {
    let suffix = if newline { "\n" } else { "" };
    format!(
        "L+  /run/docker.sock   -    -    -     -   {}{suffix}",
        podman_socket(uid, rootful)
    )
}

/// A root-owned file with caller-supplied contents.
pub fn inline_file(dest: &str, contents: impl AsRef<[u8]>, mode: u32) -> File {
    File::with_contents(Node::root(dest), contents, Some(mode))
}

fn linger_unit_file() -> UnitFile {
    let mut unit = UnitFile::new();
    unit.add("Unit", "Description", "A systemd user unit demo")
        .add("Unit", "After", "network-online.target")
        .add("Unit", "Wants", "network-online.target podman.socket")
        .add("Service", "ExecStart", "/usr/bin/sleep infinity");
    unit
}

pub fn files(params: &FileParams<'_>, host: &dyn HostEnv) -> Planned<Vec<File>> {
    let name = params.name;
    let home = guest_home(name);
    let mut out = Planned::clean(Vec::new());
    let files = &mut out.value;

    // Placeholder user service; enabling it is what starts the user's
    // session bus (and with it the rootless podman socket).
    files.push(File::with_contents(
        Node::owned(format!("{home}/.config/systemd/user/{LINGER_UNIT_NAME}"), name),
        linger_unit_file().to_string(),
        Some(0o744),
    ));

    files.push(File::with_contents(
        Node::owned(format!("{home}/.config/containers/containers.conf"), name),
        USER_CONTAINERS_CONF,
        Some(0o744),
    ));

    let (base, count) = sub_id_range(params.uid);
    let sub_ids = format!("{name}:{base}:{count}");
    for path in ["/etc/subuid", "/etc/subgid"] {
        files.push(File::with_contents(
            Node::root(path).overwrite(true),
            &sub_ids,
            Some(0o744),
        ));
    }

    // cgroup v2: let rootless containers use cpu and io limits too.
    files.push(File::with_contents(
        Node::root("/etc/systemd/system/user@.service.d/delegate.conf"),
        DELEGATE_CONF,
        Some(0o644),
    ));

    files.push(File {
        node: Node::owned(format!("/var/lib/systemd/linger/{name}"), name),
        mode: Some(0o644),
        ..File::default()
    });

    files.push(File::with_contents(
        Node::root("/etc/containers/containers.conf"),
        ROOT_CONTAINERS_CONF,
        Some(0o644),
    ));

    files.push(File::with_contents(
        Node::root("/etc/containers/podman-machine"),
        format!("{}\n", params.vm_kind),
        Some(0o644),
    ));

    files.push(File::with_contents(
        Node::root("/etc/sysctl.d/10-inotify-instances.conf"),
        "fs.inotify.max_user_instances=524288\n",
        Some(0o644),
    ));

    // Remote clients cannot answer the short-name prompt, so pin a single
    // unqualified-search registry.
    files.push(File::with_contents(
        Node::root("/etc/containers/registries.conf.d/999-podman-machine.conf"),
        "unqualified-search-registries=[\"docker.io\"]\n",
        Some(0o644),
    ));

    files.push(File::with_contents(
        Node {
            path: PODMAN_DOCKER_TMPFILES_PATH.into(),
            ..Node::default()
        },
        docker_tmpfiles_line(params.uid, params.rootful, true),
        Some(0o644),
    ));

    files.push(File::with_contents(
        Node::root("/etc/profile.d/docker-host.sh"),
        DOCKER_HOST_PROFILE,
        Some(0o644),
    ));

    let Some(user_home) = host.home_dir() else {
        out.warn(PlanWarning::HomeDirUnavailable);
        return out;
    };

    for rel in [".config/containers/certs.d", ".config/docker/certs.d"] {
        let found = certs::collect_tree(&user_home.join(rel));
        let found = out.absorb(found);
        out.value.extend(found);
    }

    let cert_file = existing_env_path(host, SSL_CERT_FILE, &mut out);
    if let Some(path) = &cert_file {
        let found = out.absorb(certs::collect_file(path));
        out.value.extend(found);
    }
    let cert_dir = existing_env_path(host, SSL_CERT_DIR, &mut out);
    if let Some(path) = &cert_dir {
        let found = out.absorb(certs::collect_tree(path));
        out.value.extend(found);
    }
    out.value.extend(certs::ssl_environment_files(
        cert_file.as_deref(),
        cert_dir.as_deref(),
    ));

    out.value.push(File {
        node: Node::root("/etc/chrony.conf"),
        append: vec![Resource::inline("\nconfdir /etc/chrony.d\n")],
        ..File::default()
    });

    // Let chrony step the clock after a long host sleep instead of slewing.
    out.value.push(File::with_contents(
        Node::root("/etc/chrony.d/50-podman-makestep.conf"),
        "makestep 1 -1\n",
        None,
    ));

    if params.net_recover {
        out.value.push(File::with_contents(
            Node::root(NET_RECOVERY_SCRIPT_PATH),
            NET_RECOVERY_SCRIPT,
            Some(0o755),
        ));
    }

    out
}

/// `$var` as a path, if it is set and names something that exists.
fn existing_env_path(
    host: &dyn HostEnv,
    var: &str,
    out: &mut Planned<Vec<File>>,
) -> Option<PathBuf> {
    let value = host.var(var)?;
    match std::fs::metadata(Path::new(&value)) {
        Ok(_) => Some(PathBuf::from(value)),
        Err(e) => {
            out.warn(PlanWarning::CertSourceMissing {
                var: var.to_string(),
                path: value,
                message: e.to_string(),
            });
            None
        }
    }
}
