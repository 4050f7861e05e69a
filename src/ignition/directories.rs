use super::types::{Directory, Node};

/// Home directory of `name` inside the guest.
pub fn guest_home(name: &str) -> String {
    format!("/home/{name}")
}

/// Directories that must exist before files and links are written.
///
/// Ignition creates missing parents as root and does not revisit them, so the
/// per-user tree is listed parent first and every level is owned explicitly.
pub fn directories(name: &str) -> Vec<Directory> {
    let home = guest_home(name);
    let user_tree = [
        ".config",
        ".config/containers",
        ".config/systemd",
        ".config/systemd/user",
        ".config/systemd/user/default.target.wants",
    ];

    let mut dirs: Vec<Directory> = user_tree
        .iter()
        .map(|rel| Directory {
            node: Node::owned(format!("{home}/{rel}"), name),
            mode: Some(0o755),
        })
        .collect();

    // registries.conf.d: single unqualified-search registry override.
    // system.conf.d and environment.d: environment propagated from the host.
    for path in [
        "/etc/containers/registries.conf.d",
        "/etc/systemd/system.conf.d",
        "/etc/environment.d",
    ] {
        dirs.push(Directory {
            node: Node::root(path),
            mode: Some(0o755),
        });
    }

    dirs
}
