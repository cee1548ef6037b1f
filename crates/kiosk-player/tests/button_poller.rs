//! Poll loop behavior with a simulated input source and a scripted
//! backend: one trigger per debounced press, full suppression during
//! playback.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use kiosk_player::controller::DisplayController;
use kiosk_player::debounce::Debouncer;
use kiosk_player::input::{InputSource, Level};
use kiosk_player::media::SlotId;
use kiosk_player::poll::{ButtonPoller, LineBinding};
use kiosk_player::supervisor::DisplayBackend;

#[derive(Clone, Default)]
struct FakeInput {
    active: Arc<Mutex<HashSet<u32>>>,
}

impl FakeInput {
    fn press(&self, line: u32) {
        self.active.lock().unwrap().insert(line);
    }

    fn release(&self, line: u32) {
        self.active.lock().unwrap().remove(&line);
    }
}

impl InputSource for FakeInput {
    fn sample_line(&self, line: u32) -> kiosk_player::Result<Level> {
        Ok(if self.active.lock().unwrap().contains(&line) {
            Level::Active
        } else {
            Level::Inactive
        })
    }
}

struct FakeBackend {
    plays: Mutex<Vec<PathBuf>>,
    release: Mutex<Receiver<()>>,
}

impl FakeBackend {
    fn new() -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = channel();
        (
            Arc::new(Self {
                plays: Mutex::new(Vec::new()),
                release: Mutex::new(rx),
            }),
            tx,
        )
    }

    fn plays(&self) -> Vec<PathBuf> {
        self.plays.lock().unwrap().clone()
    }
}

impl DisplayBackend for FakeBackend {
    fn show_image(&self, _path: &Path) {}

    fn play_video(&self, path: &Path) -> kiosk_player::Result<()> {
        self.plays.lock().unwrap().push(path.to_path_buf());
        // Blocks until released; a dropped sender finishes immediately.
        let _ = self.release.lock().unwrap().recv();
        Ok(())
    }
}

struct Rig {
    input: FakeInput,
    controller: DisplayController,
    stop: Arc<std::sync::atomic::AtomicBool>,
    poller: Option<thread::JoinHandle<()>>,
}

impl Rig {
    fn start(backend: Arc<FakeBackend>, debounce: Duration) -> Self {
        let slots: BTreeMap<SlotId, PathBuf> = (1..=2)
            .map(|i| (i as SlotId, PathBuf::from(format!("/media/video{i}.mp4"))))
            .collect();
        let controller = DisplayController::new(
            PathBuf::from("/media/default.png"),
            slots,
            backend as Arc<dyn DisplayBackend>,
        );
        let input = FakeInput::default();
        let bindings = vec![
            LineBinding { line: 17, slot: 1 },
            LineBinding { line: 27, slot: 2 },
        ];
        let poller = ButtonPoller::new(
            input.clone(),
            Debouncer::new(debounce),
            bindings,
            Duration::from_millis(5),
            controller.clone(),
        );
        let stop = poller.stop_handle();
        let handle = thread::spawn(move || poller.run());
        Self {
            input,
            controller,
            stop,
            poller: Some(handle),
        }
    }

    fn wait_for(&self, what: &str, cond: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(5));
        }
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        self.stop.store(true, std::sync::atomic::Ordering::Relaxed);
        if let Some(h) = self.poller.take() {
            let _ = h.join();
        }
    }
}

#[test]
fn press_triggers_the_bound_slot_and_playback_suppresses_polling() {
    let (backend, tx) = FakeBackend::new();
    let rig = Rig::start(Arc::clone(&backend), Duration::from_millis(200));

    rig.input.press(27);
    rig.wait_for("slot 2 playback", || {
        backend.plays() == vec![PathBuf::from("/media/video2.mp4")]
    });
    rig.input.release(27);

    // Mash the other button during playback: nothing may queue.
    rig.input.press(17);
    thread::sleep(Duration::from_millis(150));
    assert_eq!(backend.plays().len(), 1, "presses during playback must be ignored");
    rig.input.release(17);
    thread::sleep(Duration::from_millis(50));

    tx.send(()).unwrap();
    rig.wait_for("return to idle", || rig.controller.is_idle());
    // Still exactly one playback; the mashed press was dropped, not queued.
    thread::sleep(Duration::from_millis(100));
    assert_eq!(backend.plays().len(), 1);
}

#[test]
fn held_button_fires_once_per_debounce_window() {
    let (backend, tx) = FakeBackend::new();
    drop(tx); // playback completes immediately
    let rig = Rig::start(Arc::clone(&backend), Duration::from_millis(400));

    rig.input.press(17);
    rig.wait_for("first playback", || backend.plays().len() == 1);
    // Held active well inside the window: absorbed.
    thread::sleep(Duration::from_millis(200));
    assert_eq!(backend.plays().len(), 1);

    // Past the window the held level counts as a new press.
    rig.wait_for("re-armed press", || backend.plays().len() == 2);
    rig.input.release(17);
    assert_eq!(backend.plays()[0], PathBuf::from("/media/video1.mp4"));
}
