/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Bounded worker pool that keeps request handlers off connection actors.

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{channel, Receiver, Sender};

const WORKER_THREAD_NAME_PREFIX: &str = "addr-ctl-worker-";

type Job = Box<dyn FnOnce() + Send + 'static>;

/// The job queue is full; the submitting delivery should be rejected rather
/// than blocking the connection actor.
#[derive(Debug)]
pub struct PoolSaturated;

impl Display for PoolSaturated {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "handler pool queue is full")
    }
}

impl Error for PoolSaturated {}

/// Fixed-size pool of dedicated worker threads draining one bounded queue.
///
/// Handlers may block (orchestrator calls, flavor waits); the pool bounds
/// how much of that blocking the process absorbs at once.
pub struct HandlerPool {
    jobs: Option<Sender<Job>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl HandlerPool {
    pub fn new(worker_count: usize, queue_size: usize) -> Self {
        let (jobs, receiver) = channel::<Job>(queue_size);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..worker_count.max(1))
            .map(|index| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("{WORKER_THREAD_NAME_PREFIX}{index}"))
                    .spawn(move || Self::worker_loop(receiver))
                    .expect("failed to spawn handler pool worker thread")
            })
            .collect();

        Self {
            jobs: Some(jobs),
            workers,
        }
    }

    /// Enqueues a job without blocking; fails when the queue is full or the
    /// pool is shut down.
    pub fn try_submit<F>(&self, job: F) -> Result<(), PoolSaturated>
    where
        F: FnOnce() + Send + 'static,
    {
        let Some(jobs) = self.jobs.as_ref() else {
            return Err(PoolSaturated);
        };
        jobs.try_send(Box::new(job)).map_err(|err| match err {
            TrySendError::Full(_) | TrySendError::Closed(_) => PoolSaturated,
        })
    }

    fn worker_loop(receiver: Arc<Mutex<Receiver<Job>>>) {
        loop {
            // The lock is held only while waiting for the next job, never
            // while running one, so workers still drain in parallel.
            let job = {
                let mut receiver = receiver.lock().expect("handler pool queue lock poisoned");
                receiver.blocking_recv()
            };
            match job {
                Some(job) => job(),
                None => break,
            }
        }
    }

    /// Closes the queue and joins every worker after it drains.
    pub fn shutdown(mut self) {
        self.jobs.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for HandlerPool {
    fn drop(&mut self) {
        // Closing the queue is enough; workers exit once it drains.
        self.jobs.take();
    }
}
