use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::media::{self, SlotId};
use crate::supervisor::DisplayBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Idle,
    Playing(SlotId),
}

/// Consistent point-in-time view of the controller, for UI rendering.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub playback: Playback,
    pub image: PathBuf,
    pub slots: BTreeMap<SlotId, PathBuf>,
}

struct ControllerState {
    playback: Playback,
    image: PathBuf,
    slots: BTreeMap<SlotId, PathBuf>,
}

struct Inner {
    state: Mutex<ControllerState>,
    backend: Arc<dyn DisplayBackend>,
}

/// Single authority over what is currently shown. Cheap to clone; all
/// clones share one state mutex, and every transition and path mutation
/// goes through it. The Idle check and the move to Playing are therefore
/// atomic: concurrent triggers resolve to exactly one winner, the rest
/// are rejected rather than queued.
#[derive(Clone)]
pub struct DisplayController {
    inner: Arc<Inner>,
}

impl DisplayController {
    pub fn new(
        image: PathBuf,
        slots: BTreeMap<SlotId, PathBuf>,
        backend: Arc<dyn DisplayBackend>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(ControllerState {
                    playback: Playback::Idle,
                    image,
                    slots,
                }),
                backend,
            }),
        }
    }

    /// Establish the known-good initial state: Idle, image on screen.
    pub fn startup(&self) {
        let st = self.lock_state();
        info!(image = %st.image.display(), "showing startup image");
        self.inner.backend.show_image(&st.image);
    }

    /// Trigger playback of a slot. Returns immediately: `true` means the
    /// transition to Playing happened and a playback task now owns the
    /// blocking wait; `false` means the trigger was refused (already
    /// playing, or the slot is not configured).
    pub fn request_play(&self, slot: SlotId) -> bool {
        let path = {
            let mut st = self.lock_state();
            if let Playback::Playing(current) = st.playback {
                debug!(slot, current, "trigger refused, playback in progress");
                return false;
            }
            let Some(path) = st.slots.get(&slot).cloned() else {
                warn!(slot, "trigger refused, slot not configured");
                return false;
            };
            st.playback = Playback::Playing(slot);
            path
        };
        info!(slot, path = %path.display(), "playback accepted");

        let ctl = self.clone();
        let spawned = thread::Builder::new()
            .name(format!("playback-{slot}"))
            .spawn(move || {
                // The guard emits the completion transition on every exit
                // path, a panic in the backend included; a stuck Playing
                // state would refuse all future triggers.
                let _guard = CompletionGuard { ctl: &ctl };
                if let Err(e) = ctl.inner.backend.play_video(&path) {
                    error!(slot, error = %e, "playback failed");
                }
            });
        if let Err(e) = spawned {
            error!(slot, error = %e, "failed to spawn playback thread");
            self.finish_playback();
            return false;
        }
        true
    }

    /// Reassign a video slot. The file must exist now; whether it is still
    /// readable is re-checked at play time.
    pub fn assign_slot(&self, slot: SlotId, path: PathBuf) -> Result<()> {
        if !path.exists() {
            return Err(Error::media(format!("file not found: {}", path.display())));
        }
        if !media::is_video_file(&path) {
            warn!(slot, path = %path.display(), "assigned file does not look like a video");
        }
        let mut st = self.lock_state();
        info!(slot, path = %path.display(), "video slot reassigned");
        st.slots.insert(slot, path);
        Ok(())
    }

    /// Reassign the still image. Applied to the live display immediately
    /// when Idle; during playback the change is deferred and picked up by
    /// the next completion.
    pub fn assign_image(&self, path: PathBuf) -> Result<()> {
        if !path.exists() {
            return Err(Error::media(format!("file not found: {}", path.display())));
        }
        if !media::is_image_file(&path) {
            warn!(path = %path.display(), "assigned file does not look like an image");
        }
        let mut st = self.lock_state();
        st.image = path.clone();
        match st.playback {
            Playback::Idle => {
                info!(path = %path.display(), "image reassigned, updating display");
                self.inner.backend.show_image(&path);
            }
            Playback::Playing(slot) => {
                info!(path = %path.display(), slot, "image reassigned, deferred until playback ends");
            }
        }
        Ok(())
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let st = self.lock_state();
        StateSnapshot {
            playback: st.playback,
            image: st.image.clone(),
            slots: st.slots.clone(),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.lock_state().playback, Playback::Idle)
    }

    // PlaybackComplete: the only writer that returns the state to Idle.
    // Runs under the state lock so recovery cannot interleave with a new
    // trigger, and shows whatever the image slot holds *now* so deferred
    // image changes take effect here.
    fn finish_playback(&self) {
        let mut st = self.lock_state();
        st.playback = Playback::Idle;
        let image = st.image.clone();
        self.inner.backend.show_image(&image);
        info!(image = %image.display(), "playback complete, idle");
    }

    // A panicked holder must not wedge the controller; recover the inner
    // state instead of propagating the poison.
    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct CompletionGuard<'a> {
    ctl: &'a DisplayController,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.ctl.finish_playback();
    }
}
