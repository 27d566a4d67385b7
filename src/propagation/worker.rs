//! Background propagation so a render loop can prepare the next tick target

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use satkit::Instant;

use super::{PropagatedBatch, Propagator};
use crate::data::ElementSet;

#[derive(Debug)]
enum WorkerCommand {
    SetCatalog(Arc<[ElementSet]>),
    Propagate { time: Instant },
    Stop,
}

/// Dedicated thread running batch propagations on request
pub struct PropagationWorker {
    sender: Sender<WorkerCommand>,
    receiver: Receiver<PropagatedBatch>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PropagationWorker {
    pub fn spawn(propagator: Propagator, catalog: Arc<[ElementSet]>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>();
        let (result_tx, result_rx) = mpsc::channel::<PropagatedBatch>();

        let handle = thread::spawn(move || {
            let mut catalog = catalog;

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    WorkerCommand::SetCatalog(new_catalog) => {
                        catalog = new_catalog;
                    }
                    WorkerCommand::Propagate { time } => {
                        let batch = propagator.propagate_batch(&catalog, time);
                        if result_tx.send(batch).is_err() {
                            break;
                        }
                    }
                    WorkerCommand::Stop => break,
                }
            }
            log::debug!("Propagation worker stopped");
        });

        Self {
            sender: cmd_tx,
            receiver: result_rx,
            handle: Some(handle),
        }
    }

    /// Queue a batch for `time`. Returns false if the worker has exited.
    pub fn request(&self, time: Instant) -> bool {
        self.sender.send(WorkerCommand::Propagate { time }).is_ok()
    }

    /// Replace the catalog used by subsequent requests
    pub fn set_catalog(&self, catalog: Arc<[ElementSet]>) -> bool {
        self.sender.send(WorkerCommand::SetCatalog(catalog)).is_ok()
    }

    /// Most recent finished batch, discarding older ones, without blocking
    pub fn try_latest(&self) -> Option<PropagatedBatch> {
        let mut latest = None;
        while let Ok(batch) = self.receiver.try_recv() {
            latest = Some(batch);
        }
        latest
    }

    /// Block until the next batch finishes
    pub fn recv(&self) -> Option<PropagatedBatch> {
        self.receiver.recv().ok()
    }
}

impl Drop for PropagationWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkerCommand::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
