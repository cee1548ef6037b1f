use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::controller::DisplayController;
use crate::debounce::Debouncer;
use crate::input::{InputSource, Level};
use crate::media::SlotId;

/// Which slot a physical line triggers.
#[derive(Debug, Clone, Copy)]
pub struct LineBinding {
    pub line: u32,
    pub slot: SlotId,
}

/// Fixed-cadence poll loop over the button lines. The cadence, not
/// interrupts, bounds trigger latency. While playback is in progress the
/// loop skips sampling entirely: mashing a button during a video must not
/// queue a pending trigger.
pub struct ButtonPoller<I: InputSource> {
    input: I,
    debouncer: Debouncer,
    bindings: Vec<LineBinding>,
    interval: Duration,
    controller: DisplayController,
    stop: Arc<AtomicBool>,
}

impl<I: InputSource> ButtonPoller<I> {
    pub fn new(
        input: I,
        debouncer: Debouncer,
        bindings: Vec<LineBinding>,
        interval: Duration,
        controller: DisplayController,
    ) -> Self {
        Self {
            input,
            debouncer,
            bindings,
            interval,
            controller,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that ends the loop; tests and shutdown paths set it.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Runs until the stop flag is set. Blocks the calling thread.
    pub fn run(mut self) {
        info!(
            lines = ?self.bindings.iter().map(|b| b.line).collect::<Vec<_>>(),
            interval_ms = self.interval.as_millis() as u64,
            "button poller started"
        );
        while !self.stop.load(Ordering::Relaxed) {
            if self.controller.is_idle() {
                self.sweep();
            }
            thread::sleep(self.interval);
        }
        info!("button poller stopped");
    }

    fn sweep(&mut self) {
        let now = Instant::now();
        for binding in &self.bindings {
            let level = match self.input.sample_line(binding.line) {
                Ok(level) => level,
                Err(e) => {
                    warn!(line = binding.line, error = %e, "input sample failed");
                    Level::Inactive
                }
            };
            if self.debouncer.accept(binding.line, level, now) {
                info!(line = binding.line, slot = binding.slot, "button press");
                if !self.controller.request_play(binding.slot) {
                    debug!(slot = binding.slot, "press ignored, playback in progress");
                }
                // One trigger per sweep; remaining lines are re-sampled
                // next time around, and playback suppresses them anyway.
                break;
            }
        }
    }
}
