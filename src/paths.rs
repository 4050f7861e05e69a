use std::path::{Path, PathBuf};

/// Per-machine config directory: `~/.config/machine-ignition/machine/`
pub fn machine_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("machine-ignition")
        .join("machine")
}

/// Default descriptor location for a machine: `<machine dir>/<vm_name>.ign`
pub fn ignition_path(vm_name: &str) -> PathBuf {
    ignition_path_in(&machine_dir(), vm_name)
}

pub fn ignition_path_in(dir: &Path, vm_name: &str) -> PathBuf {
    dir.join(format!("{vm_name}.ign"))
}

/// Expand a leading `~/` against `home`. Left as-is when there is no home.
pub fn expand_tilde(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => home.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}
