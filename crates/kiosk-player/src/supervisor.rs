use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use tracing::{debug, error, info, warn};

use crate::config::RendererConfig;
use crate::error::{Error, Result};

/// What the display controller needs from the rendering side. Implemented
/// by [`ProcessSupervisor`] for real renderer processes and by recording
/// fakes in tests.
pub trait DisplayBackend: Send + Sync {
    /// Claim the display for the still image. Missing files and spawn
    /// failures are reported through the log only; the display is left
    /// blank in that case.
    fn show_image(&self, path: &Path);

    /// Claim the display for a video and block until the player exits.
    /// Errors cover a missing file or a failed spawn; an ugly exit status
    /// of a successfully spawned player is not an error.
    fn play_video(&self, path: &Path) -> Result<()>;
}

#[derive(Default)]
struct Tracked {
    viewer: Option<Child>,
    // The playback thread owns the player Child for waiting; only the
    // process group id is tracked here so another caller can preempt it.
    player_pgid: Option<u32>,
}

/// Sole owner of renderer OS processes. At most one tracked process per
/// role; starting either role forcefully terminates whatever held the
/// display before, because the renderers do not reliably honor graceful
/// shutdown.
pub struct ProcessSupervisor {
    viewer: RendererConfig,
    player: RendererConfig,
    tracked: Mutex<Tracked>,
}

impl ProcessSupervisor {
    pub fn new(viewer: RendererConfig, player: RendererConfig) -> Self {
        Self {
            viewer,
            player,
            tracked: Mutex::new(Tracked::default()),
        }
    }

    /// Terminate both roles plus strays. Used at startup (a previous run
    /// may have leaked a renderer) and on shutdown.
    pub fn kill_all(&self) {
        self.kill_player();
        self.kill_viewer();
    }

    fn kill_viewer(&self) {
        let child = self.lock_tracked().viewer.take();
        if let Some(mut child) = child {
            debug!(pid = child.id(), "terminating image viewer");
            kill_pgroup(child.id());
            let _ = child.kill();
            match child.wait() {
                Ok(status) => debug!(%status, "image viewer reaped"),
                Err(e) => debug!(error = %e, "image viewer already gone"),
            }
        }
        clear_strays(&self.viewer);
    }

    fn kill_player(&self) {
        let pgid = self.lock_tracked().player_pgid.take();
        if let Some(pgid) = pgid {
            debug!(pgid, "terminating video player");
            kill_pgroup(pgid);
            // The playback thread blocked in wait() reaps it.
        }
        clear_strays(&self.player);
    }

    fn lock_tracked(&self) -> std::sync::MutexGuard<'_, Tracked> {
        self.tracked
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DisplayBackend for ProcessSupervisor {
    fn show_image(&self, path: &Path) {
        self.kill_player();
        self.kill_viewer();

        if !path.exists() {
            error!(path = %path.display(), "image file not found, leaving display blank");
            return;
        }
        // Spawn and record under one lock: a concurrent kill must never
        // find the slot empty while the process already exists.
        let mut tracked = self.lock_tracked();
        match spawn_renderer(&self.viewer, path) {
            Ok(child) => {
                info!(path = %path.display(), pid = child.id(), "image viewer started");
                tracked.viewer = Some(child);
            }
            Err(e) => {
                error!(program = %self.viewer.program, error = %e, "failed to start image viewer");
            }
        }
    }

    fn play_video(&self, path: &Path) -> Result<()> {
        self.kill_viewer();

        if !path.exists() {
            return Err(Error::media(format!(
                "video file not found: {}",
                path.display()
            )));
        }

        // Spawn and register under one lock so a preempting show_image
        // cannot slip between the spawn and the pgid registration and
        // leave the player untracked.
        let mut child = {
            let mut tracked = self.lock_tracked();
            let child = spawn_renderer(&self.player, path).map_err(|e| {
                Error::renderer(format!(
                    "failed to start video player '{}': {e}",
                    self.player.program
                ))
            })?;
            tracked.player_pgid = Some(child.id());
            child
        };
        let pgid = child.id();
        info!(path = %path.display(), pid = pgid, "video player started");

        let status = child.wait();

        // Only clear our own entry; a preempting caller may have taken it
        // already and a new player must not be unregistered by us.
        {
            let mut tracked = self.lock_tracked();
            if tracked.player_pgid == Some(pgid) {
                tracked.player_pgid = None;
            }
        }

        match status {
            Ok(status) if status.success() => {
                info!(path = %path.display(), "video playback finished")
            }
            Ok(status) => {
                warn!(path = %path.display(), %status, "video player exited abnormally")
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to wait on video player"),
        }
        Ok(())
    }
}

fn spawn_renderer(cfg: &RendererConfig, media: &Path) -> std::io::Result<Child> {
    let mut cmd = Command::new(&cfg.program);
    cmd.args(&cfg.args)
        .arg(media)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    for (key, value) in &cfg.env {
        cmd.env(key, value);
    }

    // Own process group so termination takes the whole renderer subtree.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            cmd.pre_exec(|| {
                if libc::setpgid(0, 0) != 0 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    cmd.spawn()
}

fn kill_pgroup(pgid: u32) {
    #[cfg(unix)]
    {
        // Negative PID targets the whole process group. A group that is
        // already gone is not an error.
        let _ = unsafe { libc::kill(-(pgid as i32), libc::SIGKILL) };
    }
    #[cfg(not(unix))]
    {
        let _ = pgid;
    }
}

// Best-effort sweep of same-named renderer processes outside our tracking.
fn clear_strays(cfg: &RendererConfig) {
    if !cfg.kill_strays {
        return;
    }
    let Some(name) = Path::new(&cfg.program).file_name().and_then(|n| n.to_str()) else {
        return;
    };
    match Command::new("pkill").args(["-9", "-x", name]).status() {
        Ok(status) => debug!(program = name, %status, "stray sweep"),
        Err(e) => debug!(program = name, error = %e, "pkill unavailable"),
    }
}
