use crate::error::{SessionError, SessionResult};
use crate::relay::Relay;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

pub type AudioCallback = Box<dyn Fn(Vec<u8>) + Send + Sync>;
pub type ErrorCallback = Box<dyn Fn(String) + Send + Sync>;

/// Callbacks a translation stream uses to hand results back.
///
/// Invoked from the worker thread. `error` delivers at most one message per
/// stream; later reports are logged and dropped.
pub struct StreamCallbacks {
    on_audio: AudioCallback,
    on_error: ErrorCallback,
    error_reported: AtomicBool,
}

impl StreamCallbacks {
    pub fn new<A, E>(on_audio: A, on_error: E) -> Self
    where
        A: Fn(Vec<u8>) + Send + Sync + 'static,
        E: Fn(String) + Send + Sync + 'static,
    {
        Self {
            on_audio: Box::new(on_audio),
            on_error: Box::new(on_error),
            error_reported: AtomicBool::new(false),
        }
    }

    /// Deliver translated audio
    pub fn audio(&self, bytes: Vec<u8>) {
        (self.on_audio)(bytes);
    }

    /// Report a stream failure (first call only)
    pub fn error(&self, message: String) {
        if self.error_reported.swap(true, Ordering::SeqCst) {
            info!("Suppressing repeated stream error: {}", message);
            return;
        }
        (self.on_error)(message);
    }

    pub fn error_reported(&self) -> bool {
        self.error_reported.load(Ordering::SeqCst)
    }
}

/// External speech-to-speech translation service.
///
/// Implementations:
/// - `LoopbackService`: echoes audio back (development, tests)
/// - `NatsTranslationService`: streams frames to a service over NATS
#[async_trait::async_trait]
pub trait TranslationService: Send + Sync {
    /// Establish connectivity (idempotent)
    async fn connect(&self) -> SessionResult<()>;

    fn disconnect(&self);

    fn is_connected(&self) -> bool;

    /// Start a streaming translation.
    ///
    /// Returns once the worker thread is running; the worker pulls chunks
    /// from `source` until end-of-stream and reports output through
    /// `callbacks`. Must be called from within a tokio runtime.
    fn stream(
        &self,
        target_language: &str,
        source: Arc<Relay>,
        callbacks: StreamCallbacks,
    ) -> SessionResult<()>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Spawn the dedicated thread that drives one blocking translation stream.
///
/// Errors and panics from `body` are caught at the thread boundary and
/// reported once through `callbacks.error`, prefixed with "Translation error".
pub(crate) fn spawn_stream_worker<F>(
    thread_name: String,
    callbacks: Arc<StreamCallbacks>,
    body: F,
) -> SessionResult<()>
where
    F: FnOnce(&StreamCallbacks) -> anyhow::Result<()> + Send + 'static,
{
    let name = thread_name.clone();

    thread::Builder::new()
        .name(thread_name)
        .spawn(move || {
            info!("Translation worker {} started", name);

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&callbacks)));

            match outcome {
                Ok(Ok(())) => info!("Translation worker {} finished", name),
                Ok(Err(e)) => {
                    error!("Translation worker {} failed: {:#}", name, e);
                    callbacks.error(format!("Translation error: {}", e));
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    error!("Translation worker {} panicked: {}", name, reason);
                    callbacks.error(format!("Translation error: {}", reason));
                }
            }
        })
        .map_err(|e| SessionError::StreamStart(format!("Failed to spawn worker thread: {}", e)))?;

    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    fn error_channel() -> (Arc<StreamCallbacks>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let callbacks = StreamCallbacks::new(
            |_| {},
            move |message| {
                let _ = tx.lock().unwrap().send(message);
            },
        );
        (Arc::new(callbacks), rx)
    }

    fn assert_single_error(rx: &mpsc::Receiver<String>, expected: &str) {
        let first = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker did not report an error");
        assert_eq!(first, expected);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_worker_error_is_reported_with_prefix() {
        let (callbacks, rx) = error_channel();

        spawn_stream_worker("worker-err".to_string(), Arc::clone(&callbacks), |_| {
            Err(anyhow::anyhow!("service refused stream"))
        })
        .unwrap();

        assert_single_error(&rx, "Translation error: service refused stream");
        assert!(callbacks.error_reported());
    }

    #[test]
    fn test_worker_panic_is_reported_with_prefix() {
        let (callbacks, rx) = error_channel();

        spawn_stream_worker(
            "worker-panic".to_string(),
            callbacks,
            |_| -> anyhow::Result<()> { panic!("decoder crashed") },
        )
        .unwrap();

        assert_single_error(&rx, "Translation error: decoder crashed");
    }

    #[test]
    fn test_formatted_panic_message_is_reported() {
        let (callbacks, rx) = error_channel();

        spawn_stream_worker(
            "worker-panic-fmt".to_string(),
            callbacks,
            |_| -> anyhow::Result<()> { panic!("chunk {} out of range", 7) },
        )
        .unwrap();

        assert_single_error(&rx, "Translation error: chunk 7 out of range");
    }

    #[test]
    fn test_error_after_reported_error_is_suppressed() {
        let (callbacks, rx) = error_channel();

        spawn_stream_worker("worker-twice".to_string(), callbacks, |callbacks| {
            callbacks.error("Translation error: stream reset".to_string());
            Err(anyhow::anyhow!("worker exiting"))
        })
        .unwrap();

        assert_single_error(&rx, "Translation error: stream reset");
    }

    #[test]
    fn test_clean_exit_reports_nothing() {
        let (callbacks, rx) = error_channel();

        spawn_stream_worker("worker-ok".to_string(), Arc::clone(&callbacks), |_| Ok(())).unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(!callbacks.error_reported());
    }
}
