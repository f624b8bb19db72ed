use super::service::{spawn_stream_worker, StreamCallbacks, TranslationService};
use crate::error::SessionResult;
use crate::relay::Relay;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Backend that returns each input chunk unchanged as "translated" audio.
///
/// Exercises the full relay/worker/callback path without an external
/// service; `delay` simulates service latency per chunk.
pub struct LoopbackService {
    connected: AtomicBool,
    delay: Duration,
}

impl LoopbackService {
    pub fn new(delay: Duration) -> Self {
        Self {
            connected: AtomicBool::new(false),
            delay,
        }
    }
}

impl Default for LoopbackService {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait::async_trait]
impl TranslationService for LoopbackService {
    async fn connect(&self) -> SessionResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        info!("Loopback translation service ready");
        Ok(())
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn stream(
        &self,
        target_language: &str,
        source: Arc<Relay>,
        callbacks: StreamCallbacks,
    ) -> SessionResult<()> {
        info!("Starting loopback stream (target={})", target_language);

        let delay = self.delay;
        spawn_stream_worker(
            format!("loopback-{}", target_language),
            Arc::new(callbacks),
            move |callbacks| {
                let mut echoed = 0usize;
                for chunk in source.iter() {
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    debug!("Loopback echoing chunk {} ({} bytes)", chunk.index, chunk.len());
                    callbacks.audio(chunk.into_bytes());
                    echoed += 1;
                }
                info!("Loopback stream ended, {} chunks echoed", echoed);
                Ok(())
            },
        )
    }

    fn name(&self) -> &str {
        "loopback"
    }
}
