//! Host certificate propagation.
//!
//! Certificates found on the host are copied into the guest under
//! [`CERTS_TARGET_PATH`], keeping their layout relative to the source root.
//! When the host points `SSL_CERT_FILE` / `SSL_CERT_DIR` at extra material,
//! the same variables are re-exported inside the guest for every way a
//! process can be started there.

use std::io::ErrorKind;
use std::path::Path;

use walkdir::WalkDir;

use super::guest_path;
use super::outcome::{PlanWarning, Planned};
use super::types::{File, Node};

pub const CERTS_TARGET_PATH: &str = "/etc/containers/certs.d";

pub const SSL_CERT_FILE: &str = "SSL_CERT_FILE";
pub const SSL_CERT_DIR: &str = "SSL_CERT_DIR";

pub const SYSTEMD_SSL_CONF: &str = "/etc/systemd/system.conf.d/podman-machine-ssl.conf";
pub const ENVD_SSL_CONF: &str = "/etc/environment.d/podman-machine-ssl.conf";
pub const PROFILE_SSL_CONF: &str = "/etc/profile.d/podman-machine-ssl.sh";

/// Every non-directory entry below `root`, one file per certificate.
///
/// Entries come out in lexical order within each directory. A missing `root`
/// yields nothing. Unreadable entries are skipped with a warning.
pub fn collect_tree(root: &Path) -> Planned<Vec<File>> {
    let mut out = Planned::clean(Vec::new());

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let not_found = e
                    .io_error()
                    .is_some_and(|io| io.kind() == ErrorKind::NotFound);
                if !not_found {
                    let path = e.path().unwrap_or(root);
                    out.warn(PlanWarning::CertWalk {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    });
                }
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }

        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) if !rel.as_os_str().is_empty() => relative_slash(rel),
            // `root` itself is a file.
            _ => base_name(entry.path()),
        };
        match cert_file(entry.path(), &rel) {
            Ok(file) => out.value.push(file),
            Err(w) => out.warn(w),
        }
    }

    out
}

/// A single certificate, placed under its base name.
pub fn collect_file(path: &Path) -> Planned<Vec<File>> {
    let mut out = Planned::clean(Vec::new());
    match cert_file(path, &base_name(path)) {
        Ok(file) => out.value.push(file),
        Err(w) => out.warn(w),
    }
    out
}

fn cert_file(source: &Path, rel: &str) -> Result<File, PlanWarning> {
    let contents = std::fs::read(source).map_err(|e| PlanWarning::CertUnreadable {
        path: source.display().to_string(),
        message: e.to_string(),
    })?;
    let target = guest_path(CERTS_TARGET_PATH, rel);
    tracing::debug!(from = %source.display(), to = %target, "copying cert file");

    Ok(File::with_contents(Node::root(target), contents, Some(0o644)))
}

/// The three environment files exporting `SSL_CERT_FILE` and/or
/// `SSL_CERT_DIR`: service-manager defaults, `environment.d`, and the login
/// shell profile. Empty when neither source is given.
pub fn ssl_environment_files(cert_file: Option<&Path>, cert_dir: Option<&Path>) -> Vec<File> {
    let mut assignments = Vec::new();
    if let Some(file) = cert_file {
        let target = guest_path(CERTS_TARGET_PATH, &base_name(file));
        assignments.push(format!("{SSL_CERT_FILE}={target:?}\n"));
    }
    if cert_dir.is_some() {
        assignments.push(format!("{SSL_CERT_DIR}={CERTS_TARGET_PATH:?}\n"));
    }
    if assignments.is_empty() {
        return Vec::new();
    }

    let mut systemd = String::from("[Manager]\n");
    let mut envd = String::new();
    let mut profile = String::new();
    for env in &assignments {
        systemd.push_str("DefaultEnvironment=");
        systemd.push_str(env);
        envd.push_str(env);
        profile.push_str("export ");
        profile.push_str(env);
    }

    [
        (SYSTEMD_SSL_CONF, systemd),
        (ENVD_SSL_CONF, envd),
        (PROFILE_SSL_CONF, profile),
    ]
    .into_iter()
    .map(|(path, content)| File::with_contents(Node::root(path), content, Some(0o644)))
    .collect()
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Host-relative path rendered with `/` whatever the host separator is.
fn relative_slash(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
