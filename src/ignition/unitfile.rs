//! Minimal systemd unit-file writer.
//!
//! Sections and keys keep insertion order. Repeated keys are kept as separate
//! lines, matching systemd semantics for list-valued settings.

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFile {
    sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl UnitFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key=value` to `section`, creating the section at the end if it
    /// does not exist yet.
    pub fn add(&mut self, section: &str, key: &str, value: &str) -> &mut Self {
        let idx = match self.sections.iter().position(|s| s.name == section) {
            Some(i) => i,
            None => {
                self.sections.push(Section {
                    name: section.to_string(),
                    entries: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        self.sections[idx]
            .entries
            .push((key.to_string(), value.to_string()));
        self
    }
}

impl fmt::Display for UnitFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(f, "{key}={value}")?;
            }
        }
        Ok(())
    }
}
