//! Ignition descriptor assembly for a new machine.
//!
//! [`assemble`] turns a [`ProvisioningRequest`] into a complete [`Config`];
//! [`IgnitionBuilder`] lets callers add units and files before it is written.

pub mod assemble;
pub mod builder;
pub mod certs;
pub mod dataurl;
pub mod directories;
pub mod files;
pub mod links;
pub mod outcome;
pub mod types;
pub mod unitfile;
pub mod units;
pub mod users;

pub use assemble::{Assembly, ProvisioningRequest, assemble};
pub use builder::IgnitionBuilder;
pub use outcome::{PlanWarning, Planned};
pub use types::Config;

/// Join `rel` onto the absolute guest path `base`.
///
/// Only `/` separates segments; any other byte, `\` included, stays part of
/// a name. Empty and `.` segments are dropped and `..` is resolved, never
/// climbing above `/`.
pub fn guest_path(base: &str, rel: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for seg in base.split('/').chain(rel.split('/')) {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}
