use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::error::SessionError;
use crate::models::state::SessionTimer;
use crate::session::audio_session::AudioSession;
use crate::traits::engine::AudioBackend;

/// A session shared between the UI thread and a [`SessionDriver`].
///
/// Every mutation goes through the one mutex, so a timer tick can never
/// interleave with `stop()` or a gesture.
pub type SharedSession<B> = Arc<Mutex<AudioSession<B>>>;

const MIN_RESOLUTION: Duration = Duration::from_millis(1);

/// Background clock firing a shared session's armed timers.
///
/// Each timer starts counting when the session arms it and fires once per
/// configured period until the session disarms it.
pub struct SessionDriver {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SessionDriver {
    pub fn start<B: AudioBackend>(session: SharedSession<B>) -> Result<Self, SessionError> {
        let resolution = {
            let s = session.lock();
            SessionTimer::ALL
                .iter()
                .map(|t| s.config().timer_period(*t))
                .min()
                .unwrap_or(MIN_RESOLUTION)
                .max(MIN_RESOLUTION)
        };

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("session-clock".into())
            .spawn(move || {
                let mut armed_at: [Option<Instant>; 3] = [None; 3];
                while flag.load(Ordering::SeqCst) {
                    thread::sleep(resolution);

                    let mut s = session.lock();
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }
                    let now = Instant::now();
                    for (slot, timer) in armed_at.iter_mut().zip(SessionTimer::ALL) {
                        if !s.is_armed(timer) {
                            *slot = None;
                            continue;
                        }
                        match *slot {
                            None => *slot = Some(now),
                            Some(last) if now.duration_since(last) >= s.config().timer_period(timer) => {
                                *slot = Some(now);
                                s.fire(timer);
                            }
                            Some(_) => {}
                        }
                    }
                }
            })
            .map_err(|e| SessionError::EngineUnavailable(format!("failed to spawn session clock: {}", e)))?;

        log::debug!("session clock running at {:?} resolution", resolution);
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop the clock. No tick fires after this returns.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
