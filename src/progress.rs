use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use tokio::sync::mpsc;

/// A coarse progress event emitted between pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionProgress {
    pub step: String,
    /// 0 to 100
    pub progress: u8,
    pub message: String,
}

impl ExtractionProgress {
    pub fn new(step: &str, progress: u8, message: impl Into<String>) -> Self {
        Self {
            step: step.to_string(),
            progress: progress.min(100),
            message: message.into(),
        }
    }

    /// The terminal event. The pipeline never sends this itself; callers
    /// emit it once the result has been durably stored.
    pub fn complete() -> Self {
        Self::new("complete", 100, "Recipe ready")
    }
}

/// Receives progress events. Implementations may apply backpressure by
/// suspending, which pauses the pipeline.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, event: ExtractionProgress);
}

#[async_trait]
impl ProgressSink for mpsc::Sender<ExtractionProgress> {
    async fn report(&self, event: ExtractionProgress) {
        if self.send(event).await.is_err() {
            debug!("Progress receiver dropped");
        }
    }
}

/// Sends an event if a sink was given.
pub(crate) async fn emit(
    sink: Option<&dyn ProgressSink>,
    step: &str,
    progress: u8,
    message: &str,
) {
    if let Some(sink) = sink {
        sink.report(ExtractionProgress::new(step, progress, message))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink: &dyn ProgressSink = &tx;
        emit(Some(sink), "detecting", 10, "Detecting platform").await;
        emit(Some(sink), "extracting", 70, "Extracting recipe").await;
        drop(tx);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.step, "detecting");
        assert_eq!(second.progress, 70);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closed_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        tx.report(ExtractionProgress::complete()).await;
    }

    #[test]
    fn test_progress_clamped() {
        assert_eq!(ExtractionProgress::new("x", 250, "").progress, 100);
        assert_eq!(ExtractionProgress::complete().progress, 100);
    }
}
