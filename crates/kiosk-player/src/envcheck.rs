use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;

/// Startup environment report. Missing media is only worth a warning (the
/// controller degrades gracefully); missing renderer programs mean the
/// kiosk cannot display anything at all.
#[derive(Debug, Default)]
pub struct EnvReport {
    pub missing_programs: Vec<String>,
}

impl EnvReport {
    pub fn ok(&self) -> bool {
        self.missing_programs.is_empty()
    }
}

pub fn check(cfg: &Config) -> EnvReport {
    info!("checking environment");
    let mut report = EnvReport::default();

    for program in [&cfg.viewer.program, &cfg.player.program] {
        match which::which(program) {
            Ok(resolved) => {
                info!(program = %program, path = %resolved.display(), "renderer found")
            }
            Err(_) => {
                warn!(program = %program, "renderer not installed or not in PATH");
                report.missing_programs.push(program.clone());
            }
        }
    }

    report_path("base dir", &cfg.media.base_dir);
    report_path("uploads dir", &cfg.media.uploads_path());
    report_path("default image", &cfg.media.image_path());
    for (slot, video) in cfg.media.slot_paths() {
        report_path(&format!("slot {slot} video"), &video);
    }

    report
}

fn report_path(label: &str, path: &Path) {
    if path.exists() {
        info!(path = %path.display(), "{label} present");
    } else {
        warn!(path = %path.display(), "{label} missing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn present_programs_pass() {
        let mut cfg = Config::default();
        // `sh` exists on any unix test host.
        cfg.viewer.program = "sh".into();
        cfg.player.program = "sh".into();
        assert!(check(&cfg).ok());
    }

    #[test]
    fn missing_programs_are_reported() {
        let mut cfg = Config::default();
        cfg.viewer.program = "kiosk-no-such-viewer".into();
        cfg.player.program = "sh".into();
        let report = check(&cfg);
        assert!(!report.ok());
        assert_eq!(report.missing_programs, vec!["kiosk-no-such-viewer"]);
    }
}
