//! Background writer for settings files.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::{Error, Result};

/// A unit of persistence work.
pub type SaveJob = Box<dyn FnOnce() -> Result<()> + Send>;

struct SaveRequest {
    job: SaveJob,
    reply: Option<Sender<Result<()>>>,
}

/// Runs save jobs one at a time on a dedicated thread, in submission order.
///
/// The thread exits once every handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct SaveQueue {
    sender: Sender<SaveRequest>,
}

impl SaveQueue {
    /// Start the writer thread.
    pub fn start() -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<SaveRequest>();
        thread::Builder::new()
            .name("gprops-save".to_string())
            .spawn(move || run(receiver))?;
        Ok(Self { sender })
    }

    /// Queue `job` without waiting. Failures are logged.
    pub fn submit(&self, job: SaveJob) -> Result<()> {
        self.sender
            .send(SaveRequest { job, reply: None })
            .map_err(|_| Error::SaveQueueClosed)
    }

    /// Queue `job` and block until it has run.
    pub fn submit_and_wait(&self, job: SaveJob) -> Result<()> {
        let (reply, done) = mpsc::channel();
        self.sender
            .send(SaveRequest {
                job,
                reply: Some(reply),
            })
            .map_err(|_| Error::SaveQueueClosed)?;
        done.recv().map_err(|_| Error::SaveQueueClosed)?
    }
}

impl std::fmt::Debug for SaveQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SaveQueue")
    }
}

fn run(receiver: Receiver<SaveRequest>) {
    for request in receiver {
        let result = (request.job)();
        match request.reply {
            Some(reply) => {
                let _ = reply.send(result);
            }
            None => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Background settings save failed");
                }
            }
        }
    }
    tracing::debug!("Save queue drained");
}
