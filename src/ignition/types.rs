//! Ignition config 3.2.0 document model.
//!
//! Only the subset the machine provisioner emits is modelled. Optional scalars
//! are `Option` and skipped when unset, so "absent" stays distinct from an
//! explicit `false`/`0` on the wire (`shouldExist: false` means "delete this
//! user", while a missing `shouldExist` means "create it").

use serde::{Deserialize, Serialize};

pub const IGNITION_VERSION: &str = "3.2.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub ignition: Ignition,
    #[serde(default)]
    pub passwd: Passwd,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub systemd: Systemd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ignition {
    pub version: String,
}

impl Default for Ignition {
    fn default() -> Self {
        Self {
            version: IGNITION_VERSION.into(),
        }
    }
}

// ── passwd ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passwd {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<PasswdUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswdUser {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ssh_authorized_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_exist: Option<bool>,
}

// ── storage ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories: Vec<Directory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// Owner reference by name (`{"name": "core"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOwner {
    pub name: String,
}

impl NodeOwner {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Fields shared by directories, files and links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<NodeOwner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

impl Node {
    /// A node owned by `owner:owner`.
    pub fn owned(path: impl Into<String>, owner: &str) -> Self {
        Self {
            path: path.into(),
            user: Some(NodeOwner::new(owner)),
            group: Some(NodeOwner::new(owner)),
            overwrite: None,
        }
    }

    /// A node owned by `root:root`.
    pub fn root(path: impl Into<String>) -> Self {
        Self::owned(path, "root")
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

/// Inline content reference. `source` is always a `data:,` URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Resource {
    pub fn inline(contents: impl AsRef<[u8]>) -> Self {
        Self {
            source: Some(super::dataurl::encode_data_url(contents)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct File {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<Resource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

impl File {
    /// A file whose contents are replaced with `contents`.
    pub fn with_contents(node: Node, contents: impl AsRef<[u8]>, mode: Option<u32>) -> Self {
        Self {
            node,
            contents: Some(Resource::inline(contents)),
            append: Vec::new(),
            mode,
        }
    }

    /// Decoded replacement contents, if any.
    pub fn decoded_contents(&self) -> Option<String> {
        let source = self.contents.as_ref()?.source.as_deref()?;
        super::dataurl::decode_data_url(source)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(flatten)]
    pub node: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard: Option<bool>,
    pub target: String,
}

// ── systemd ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Systemd {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<Unit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<bool>,
    /// Unit file text as systemd reads it. Ignition takes unit contents
    /// verbatim, so unlike [`File`] contents this is never a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropins: Vec<Dropin>,
}

impl Unit {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dropin {
    pub name: String,
    /// Verbatim, like [`Unit::contents`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}
