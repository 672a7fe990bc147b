use crate::training::{EpochMetrics, TrainingState};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Training callback trait
///
/// Callbacks observe training at epoch and batch granularity. They cannot
/// alter the run: there is no early stopping or checkpointing.
pub trait TrainingCallback: Send {
    /// Called at the start of training
    fn on_train_begin(&mut self, _total_epochs: usize) {}

    /// Called at the end of training
    fn on_train_end(&mut self, _state: &TrainingState) {}

    /// Called at the start of each epoch
    fn on_epoch_begin(&mut self, _epoch: usize, _num_batches: usize) {}

    /// Called at the end of each epoch
    fn on_epoch_end(&mut self, _epoch: usize, _train_loss: f64, _val: &EpochMetrics) {}

    /// Called at the end of each batch
    fn on_batch_end(&mut self, _batch: usize, _loss: f64) {}
}

/// Callback manager that handles multiple callbacks
#[derive(Default)]
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainingCallback>>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback
    pub fn add_callback<C: TrainingCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn on_train_begin(&mut self, total_epochs: usize) {
        for callback in &mut self.callbacks {
            callback.on_train_begin(total_epochs);
        }
    }

    pub fn on_train_end(&mut self, state: &TrainingState) {
        for callback in &mut self.callbacks {
            callback.on_train_end(state);
        }
    }

    pub fn on_epoch_begin(&mut self, epoch: usize, num_batches: usize) {
        for callback in &mut self.callbacks {
            callback.on_epoch_begin(epoch, num_batches);
        }
    }

    pub fn on_epoch_end(&mut self, epoch: usize, train_loss: f64, val: &EpochMetrics) {
        for callback in &mut self.callbacks {
            callback.on_epoch_end(epoch, train_loss, val);
        }
    }

    pub fn on_batch_end(&mut self, batch: usize, loss: f64) {
        for callback in &mut self.callbacks {
            callback.on_batch_end(batch, loss);
        }
    }
}

/// Logs one line per epoch with validation loss and accuracy
pub struct EpochLoggerCallback {
    total_epochs: usize,
}

impl EpochLoggerCallback {
    pub fn new() -> Self {
        Self { total_epochs: 0 }
    }
}

impl Default for EpochLoggerCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingCallback for EpochLoggerCallback {
    fn on_train_begin(&mut self, total_epochs: usize) {
        self.total_epochs = total_epochs;
    }

    fn on_epoch_end(&mut self, epoch: usize, train_loss: f64, val: &EpochMetrics) {
        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | val_acc={:.2}%",
            epoch + 1,
            self.total_epochs,
            train_loss,
            val.loss,
            val.accuracy * 100.0
        );
    }

    fn on_train_end(&mut self, state: &TrainingState) {
        tracing::info!(
            "Finished {} epochs, best val_acc={:.2}%",
            state.epoch,
            state.best_accuracy() * 100.0
        );
    }
}

/// Terminal progress bar over the batches of each epoch
pub struct ProgressBarCallback {
    bar: Option<ProgressBar>,
    total_epochs: usize,
    started: Option<Instant>,
}

impl ProgressBarCallback {
    pub fn new() -> Self {
        Self {
            bar: None,
            total_epochs: 0,
            started: None,
        }
    }
}

impl Default for ProgressBarCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingCallback for ProgressBarCallback {
    fn on_train_begin(&mut self, total_epochs: usize) {
        self.total_epochs = total_epochs;
        self.started = Some(Instant::now());
    }

    fn on_epoch_begin(&mut self, epoch: usize, num_batches: usize) {
        let bar = ProgressBar::new(num_batches as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(format!("epoch {}/{}", epoch + 1, self.total_epochs));
        self.bar = Some(bar);
    }

    fn on_batch_end(&mut self, _batch: usize, loss: f64) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("loss={:.4}", loss));
            bar.inc(1);
        }
    }

    fn on_epoch_end(&mut self, _epoch: usize, _train_loss: f64, _val: &EpochMetrics) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn on_train_end(&mut self, _state: &TrainingState) {
        if let Some(start) = self.started {
            tracing::debug!("Training loop took {:.2?}", start.elapsed());
        }
    }
}
