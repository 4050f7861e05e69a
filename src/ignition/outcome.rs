//! Non-fatal planning results.
//!
//! Fatal problems are `IgnitionError`s. Everything else the planners shrug off
//! is recorded here so callers can tell a clean assembly from a lossy one
//! without scraping logs.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    /// The invoking user's home directory could not be resolved. File planning
    /// stopped early: certificates, chrony tuning and the network-recovery
    /// script were not emitted.
    HomeDirUnavailable,

    /// An environment variable named a certificate path that does not exist.
    CertSourceMissing {
        var: String,
        path: String,
        message: String,
    },

    /// A single certificate could not be read and was skipped.
    CertUnreadable { path: String, message: String },

    /// An entry inside a certificate tree could not be visited.
    CertWalk { path: String, message: String },
}

impl PlanWarning {
    /// Degraded warnings drop a whole tail of entries, not just one.
    pub fn is_degraded(&self) -> bool {
        matches!(self, PlanWarning::HomeDirUnavailable)
    }
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::HomeDirUnavailable => {
                f.write_str("home directory unavailable; certificates and later files skipped")
            }
            PlanWarning::CertSourceMissing { var, path, message } => {
                write!(f, "invalid path in {var}: {path:?}: {message}")
            }
            PlanWarning::CertUnreadable { path, message } => {
                write!(f, "unable to read cert file {path}: {message}")
            }
            PlanWarning::CertWalk { path, message } => {
                write!(f, "error while reading certs from {path}: {message}")
            }
        }
    }
}

/// A planner's output plus whatever it had to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct Planned<T> {
    pub value: T,
    pub warnings: Vec<PlanWarning>,
}

impl<T> Planned<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Record a warning and log it.
    pub fn warn(&mut self, warning: PlanWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Move `other`'s warnings into `self`, returning its value.
    pub fn absorb<U>(&mut self, other: Planned<U>) -> U {
        self.warnings.extend(other.warnings);
        other.value
    }

    pub fn is_degraded(&self) -> bool {
        self.warnings.iter().any(PlanWarning::is_degraded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_home_dir_failure_is_degraded() {
        assert!(PlanWarning::HomeDirUnavailable.is_degraded());
        assert!(
            !PlanWarning::CertUnreadable {
                path: "/x".into(),
                message: "denied".into()
            }
            .is_degraded()
        );
    }

    #[test]
    fn absorb_collects_warnings() {
        let mut outer: Planned<Vec<u8>> = Planned::clean(Vec::new());
        let mut inner = Planned::clean(7u8);
        inner.warn(PlanWarning::CertWalk {
            path: "/certs".into(),
            message: "loop".into(),
        });
        let v = outer.absorb(inner);
        outer.value.push(v);
        assert_eq!(outer.value, vec![7]);
        assert_eq!(outer.warnings.len(), 1);
        assert!(!outer.is_degraded());
    }
}
