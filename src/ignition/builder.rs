use std::path::{Path, PathBuf};

use crate::error::IgnitionError;
use crate::host::HostEnv;

use super::assemble::{ProvisioningRequest, assemble};
use super::outcome::PlanWarning;
use super::types::{Config, File, Unit};

/// Assembles a descriptor, lets other components add to it, then writes it.
///
/// `build` and `build_with_ignition_file` consume the builder, so a builder
/// finalizes exactly once, by one of the two paths.
#[derive(Debug, Clone)]
pub struct IgnitionBuilder {
    request: ProvisioningRequest,
    config: Config,
    warnings: Vec<PlanWarning>,
}

impl IgnitionBuilder {
    pub fn new(request: ProvisioningRequest) -> Self {
        Self {
            request,
            config: Config::default(),
            warnings: Vec::new(),
        }
    }

    /// Replace the current descriptor with a freshly assembled one.
    pub fn generate(&mut self, host: &dyn HostEnv) -> Result<(), IgnitionError> {
        let assembly = assemble(&self.request, host)?;
        self.config = assembly.config;
        self.warnings = assembly.warnings;
        Ok(())
    }

    pub fn with_unit(&mut self, units: impl IntoIterator<Item = Unit>) -> &mut Self {
        self.config.systemd.units.extend(units);
        self
    }

    pub fn with_file(&mut self, files: impl IntoIterator<Item = File>) -> &mut Self {
        self.config.storage.files.extend(files);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn warnings(&self) -> &[PlanWarning] {
        &self.warnings
    }

    /// Serialize the descriptor and write it to the request's path.
    pub fn build(self) -> Result<PathBuf, IgnitionError> {
        let bytes =
            serde_json::to_vec(&self.config).map_err(|source| IgnitionError::Serialize { source })?;
        tracing::debug!(path = %self.request.write_path.display(), "writing ignition file");
        write_descriptor(&self.request.write_path, &bytes)?;
        Ok(self.request.write_path)
    }

    /// Skip assembly: copy `ignition_file` byte for byte to the request's path.
    pub fn build_with_ignition_file(self, ignition_file: &Path) -> Result<PathBuf, IgnitionError> {
        let bytes = std::fs::read(ignition_file).map_err(|source| IgnitionError::Io {
            context: format!("reading ignition file {}", ignition_file.display()),
            source,
        })?;
        tracing::debug!(
            from = %ignition_file.display(),
            path = %self.request.write_path.display(),
            "copying ignition file"
        );
        write_descriptor(&self.request.write_path, &bytes)?;
        Ok(self.request.write_path)
    }
}

fn write_descriptor(path: &Path, bytes: &[u8]) -> Result<(), IgnitionError> {
    use std::io::Write;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| IgnitionError::Io {
            context: format!("creating directory {}", parent.display()),
            source,
        })?;
    }

    let mut opts = std::fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o644);
    }

    let io_err = |source| IgnitionError::Io {
        context: format!("writing ignition file {}", path.display()),
        source,
    };
    let mut file = opts.open(path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::FakeHost;
    use crate::ignition::files::inline_file;

    fn builder(dir: &Path) -> IgnitionBuilder {
        IgnitionBuilder::new(ProvisioningRequest {
            name: "core".into(),
            key: "ssh-ed25519 AAAA core".into(),
            uid: 501,
            write_path: dir.join("machine.ign"),
            ..ProvisioningRequest::default()
        })
    }

    #[test]
    fn appended_entries_follow_generated_ones() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = builder(dir.path());
        b.generate(&FakeHost::with_home(dir.path())).unwrap();
        let units_before = b.config().systemd.units.len();
        let files_before = b.config().storage.files.len();

        b.with_unit([Unit::named("extra.service")])
            .with_file([inline_file("/etc/extra.conf", "x=1\n", 0o600)]);

        assert_eq!(b.config().systemd.units.len(), units_before + 1);
        assert_eq!(b.config().systemd.units.last().unwrap().name, "extra.service");
        assert_eq!(b.config().storage.files.len(), files_before + 1);
        assert_eq!(b.config().storage.files.last().unwrap().mode, Some(0o600));
    }

    #[test]
    fn build_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = builder(dir.path());
        b.generate(&FakeHost::with_home(dir.path())).unwrap();
        let path = b.build().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(v["ignition"]["version"], "3.2.0");
        assert_eq!(v["passwd"]["users"][0]["name"], "core");
        assert_eq!(v["systemd"]["units"][0]["name"], "podman.socket");
    }

    #[cfg(unix)]
    #[test]
    fn build_writes_world_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut b = builder(dir.path());
        b.generate(&FakeHost::with_home(dir.path())).unwrap();
        let path = b.build().unwrap();
        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
        assert_eq!(mode & 0o600, 0o600);
    }

    #[test]
    fn build_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut b = builder(&dir.path().join("a/b"));
        b.generate(&FakeHost::with_home(dir.path())).unwrap();
        assert!(b.build().unwrap().exists());
    }

    #[test]
    fn ignition_file_is_copied_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom.ign");
        let bytes = b"{ \"ignition\": {\"version\": \"3.4.0\"} }\n";
        std::fs::write(&custom, bytes).unwrap();

        let path = builder(dir.path()).build_with_ignition_file(&custom).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), bytes);
    }

    #[test]
    fn missing_ignition_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = builder(dir.path())
            .build_with_ignition_file(&dir.path().join("absent.ign"))
            .unwrap_err();
        assert!(matches!(err, IgnitionError::Io { .. }));
        assert!(!dir.path().join("machine.ign").exists());
    }
}
