//! Bounded job queue feeding a fixed pool of page workers.
//!
//! The producer calls [`Dispatcher::submit`] for each page; it blocks while
//! the queue is full, which is the only back-pressure between the dump reader
//! and the workers. [`Dispatcher::drain`] closes the queue and joins every
//! worker, so once it returns each accepted page has been fully processed.

use crate::config::DEFAULT_QUEUE_CAPACITY;
use crate::models::Page;
use crate::worker::PageWorker;
use anyhow::{bail, Context, Result};
use crossbeam_channel::{bounded, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Pages that may wait in the queue before `submit` blocks
    pub queue_capacity: usize,
    /// Stop accepting pages after this many; `None` for no limit
    pub page_limit: Option<u64>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            page_limit: None,
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers < 1 {
            bail!("Worker count must be at least 1");
        }
        if self.queue_capacity < 1 {
            bail!("Queue capacity must be at least 1");
        }
        if self.page_limit == Some(0) {
            bail!("Page limit must be at least 1 when set");
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The configured page limit was reached; the producer should stop reading.
    #[error("Parser closed: page limit of {0} reached")]
    PageLimitReached(u64),

    /// Every worker has exited, so nothing can receive the page.
    #[error("Parser closed: no worker is accepting pages")]
    Closed,
}

pub struct Dispatcher {
    sender: Sender<Page>,
    workers: Vec<JoinHandle<()>>,
    page_limit: Option<u64>,
    accepted: u64,
}

impl Dispatcher {
    /// Spawns `config.workers` threads, each running `worker` on pages pulled
    /// from a queue of `config.queue_capacity` slots.
    pub fn new(config: &DispatcherConfig, worker: PageWorker) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = bounded::<Page>(config.queue_capacity);
        let mut workers = Vec::with_capacity(config.workers);

        for i in 0..config.workers {
            let receiver = receiver.clone();
            let worker = worker.clone();
            let handle = thread::Builder::new()
                .name(format!("anvil-worker-{i}"))
                .spawn(move || {
                    let mut pages = 0u64;
                    for page in receiver.iter() {
                        worker.process(&page);
                        pages += 1;
                    }
                    debug!(worker = i, pages, "Worker finished");
                })
                .with_context(|| format!("Failed to spawn worker {}", i))?;
            workers.push(handle);
        }

        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            page_limit = ?config.page_limit,
            "Dispatcher started"
        );

        Ok(Self {
            sender,
            workers,
            page_limit: config.page_limit,
            accepted: 0,
        })
    }

    /// Queues `page` for a worker, blocking while the queue is full.
    pub fn submit(&mut self, page: Page) -> Result<(), SubmitError> {
        if let Some(limit) = self.page_limit {
            if self.accepted >= limit {
                return Err(SubmitError::PageLimitReached(limit));
            }
        }

        self.sender.send(page).map_err(|_| SubmitError::Closed)?;
        self.accepted += 1;
        Ok(())
    }

    /// Pages accepted so far. Some may still be waiting in the queue.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Closes the queue and waits for every worker to finish.
    pub fn drain(self) -> Result<()> {
        let Dispatcher {
            sender,
            workers,
            accepted,
            ..
        } = self;
        drop(sender);

        let mut panicked = 0usize;
        for handle in workers {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "Worker panicked");
                panicked += 1;
            }
        }

        if panicked > 0 {
            bail!("{} worker(s) panicked; results are incomplete", panicked);
        }

        info!(pages = accepted, "Dispatcher drained");
        Ok(())
    }
}
