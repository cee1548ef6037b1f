use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Active,
    Inactive,
}

/// Capability over physical (or simulated) button lines. Implementations
/// must return promptly; the poll loop runs on a fixed cadence and never
/// blocks on input.
pub trait InputSource: Send {
    fn sample_line(&self, line: u32) -> Result<Level>;
}

/// Reads exported GPIO lines through the sysfs value files. This is plain
/// file I/O over an already-configured line, not a GPIO driver; exporting
/// and direction setup belong to system provisioning.
pub struct SysfsInput {
    root: PathBuf,
    active_low: bool,
}

impl SysfsInput {
    pub fn new(root: PathBuf, active_low: bool) -> Self {
        Self { root, active_low }
    }
}

impl InputSource for SysfsInput {
    fn sample_line(&self, line: u32) -> Result<Level> {
        let path = self.root.join(format!("gpio{line}")).join("value");
        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::input(format!("failed to read {}: {e}", path.display())))?;
        let low = match raw.trim() {
            "0" => true,
            "1" => false,
            other => {
                return Err(Error::input(format!(
                    "unexpected value '{other}' on line {line}"
                )));
            }
        };
        let pressed = if self.active_low { low } else { !low };
        Ok(if pressed { Level::Active } else { Level::Inactive })
    }
}
