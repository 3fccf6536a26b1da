//! Background classification worker.
//!
//! Inference is CPU-heavy, so classification requests are served on a
//! dedicated thread fed by a channel. The model is loaded once on that
//! thread at startup; a load failure is remembered and every subsequent
//! request fails fast without wedging the pipeline.

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use super::onnx::OnnxClassifier;
use super::types::{Classification, ClassifierSettings, ClassifyError};

/// Callback invoked with the outcome of one classification request.
pub type ClassifyCallback = Box<dyn FnOnce(Result<Vec<Classification>, ClassifyError>) + Send>;

/// One queued classification request.
struct ClassifyJob {
    image: Vec<u8>,
    on_done: ClassifyCallback,
}

/// Handle for submitting classification requests to the worker thread.
#[derive(Clone)]
pub struct ClassifySubmitter {
    tx: Sender<ClassifyJob>,
}

impl ClassifySubmitter {
    /// Submit encoded image bytes for classification.
    ///
    /// The callback fires on the worker thread. If the worker is gone,
    /// it fires immediately with `ClassifyError::NotLoaded`.
    pub fn submit(&self, image: Vec<u8>, on_done: ClassifyCallback) {
        if let Err(send_err) = self.tx.send(ClassifyJob { image, on_done }) {
            let ClassifyJob { on_done, .. } = send_err.0;
            on_done(Err(ClassifyError::NotLoaded));
        }
    }
}

/// Owner of the classification worker thread.
pub struct ClassifyWorker {
    tx: Option<Sender<ClassifyJob>>,
    handle: Option<JoinHandle<()>>,
}

impl ClassifyWorker {
    /// Spawn the worker and load the model on the worker thread.
    ///
    /// Returns immediately; the first classification request may wait for
    /// the load to finish. A failed load is logged once and each request
    /// afterwards resolves with `ClassifyError::NotLoaded`.
    pub fn spawn(settings: ClassifierSettings) -> Self {
        let (tx, rx) = mpsc::channel::<ClassifyJob>();

        let handle = std::thread::spawn(move || {
            let classifier = match OnnxClassifier::load(&settings) {
                Ok(c) => Some(c),
                Err(e) => {
                    log::error!("Classifier unavailable: {}", e);
                    None
                }
            };

            while let Ok(job) = rx.recv() {
                let result = match &classifier {
                    Some(c) => c.classify(&job.image),
                    None => Err(ClassifyError::NotLoaded),
                };
                (job.on_done)(result);
            }
        });

        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    /// Get a handle for submitting requests.
    pub fn submitter(&self) -> ClassifySubmitter {
        let tx = match &self.tx {
            Some(tx) => tx.clone(),
            // Only reachable mid-shutdown; a disconnected sender resolves
            // every request as NotLoaded
            None => mpsc::channel().0,
        };
        ClassifySubmitter { tx }
    }
}

impl Drop for ClassifyWorker {
    fn drop(&mut self) {
        // Closing the channel lets the worker thread drain and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
