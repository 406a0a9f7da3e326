//! Background writer that absorbs index work off the critical write path.
//!
//! A single consumer drains a shared FIFO of [`KeyAndMeta`] items into the
//! numeric index. Producers hand work over under a mutex and wake the
//! worker through a condition variable only when the queue transitions
//! from empty; the worker applies the entire queue before releasing the
//! mutex, so a drain is atomic with respect to submissions and flush costs
//! amortize across the batch. The worker thread is started lazily on the
//! first submission and joined on drop after a closing flag is raised.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::index::{Index, NumericTree};
use crate::meta::KeyAndMeta;

/// Single-consumer background writer attached to an [`Index`].
pub struct IndexWriter<T: NumericTree + 'static> {
    shared: Arc<Shared<T>>,
}

struct Shared<T: NumericTree> {
    index: Arc<Index<T>>,
    state: Mutex<State>,
    work_available: Condvar,
}

struct State {
    queue: VecDeque<KeyAndMeta>,
    started: bool,
    shutdown: bool,
    worker: Option<JoinHandle<()>>,
}

impl<T: NumericTree + 'static> IndexWriter<T> {
    pub fn new(index: Arc<Index<T>>) -> Self {
        Self {
            shared: Arc::new(Shared {
                index,
                state: Mutex::new(State {
                    queue: VecDeque::new(),
                    started: false,
                    shutdown: false,
                    worker: None,
                }),
                work_available: Condvar::new(),
            }),
        }
    }

    /// The index this writer feeds.
    pub fn index(&self) -> &Arc<Index<T>> {
        &self.shared.index
    }

    /// Enqueues one work item, starting the worker on first use.
    ///
    /// Items are applied in submission order; across producers the order
    /// is the push order serialized by the queue mutex. Blocks while a
    /// drain is in progress.
    pub fn submit(&self, item: KeyAndMeta) -> Result<()> {
        let mut state = self.shared.state.lock().unwrap();
        self.ensure_started(&mut state)?;
        if state.queue.is_empty() {
            self.shared.work_available.notify_one();
        }
        state.queue.push_back(item);
        Ok(())
    }

    /// Grafts a whole prepared queue in one handoff.
    ///
    /// The writer's own queue must be drained at this point; the caller's
    /// deque is swapped in and comes back empty.
    pub fn add_queue(&self, queue: &mut VecDeque<KeyAndMeta>) -> Result<()> {
        let mut state = self.shared.state.lock().unwrap();
        debug_assert!(
            state.queue.is_empty(),
            "add_queue requires the writer queue to be drained"
        );
        std::mem::swap(&mut state.queue, queue);
        self.ensure_started(&mut state)?;
        self.shared.work_available.notify_one();
        Ok(())
    }

    fn ensure_started(&self, state: &mut State) -> Result<()> {
        if state.started {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("index-writer".into())
            .spawn(move || shared.run())?;
        state.worker = Some(handle);
        state.started = true;
        tracing::info!("index writer started");
        Ok(())
    }
}

impl<T: NumericTree + 'static> Drop for IndexWriter<T> {
    fn drop(&mut self) {
        let worker = {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
            state.worker.take()
        };
        self.shared.work_available.notify_all();
        if let Some(handle) = worker {
            let _ = handle.join();
        }
    }
}

impl<T: NumericTree> Shared<T> {
    fn run(&self) {
        loop {
            let mut state = self.state.lock().unwrap();
            while state.queue.is_empty() && !state.shutdown {
                state = self.work_available.wait(state).unwrap();
            }
            if state.queue.is_empty() {
                // Closing flag raised and nothing left to apply.
                tracing::info!("index writer shutting down");
                return;
            }
            // Apply every queued item before releasing the mutex so the
            // drain is atomic with respect to producers.
            let batch = state.queue.len();
            while let Some(item) = state.queue.pop_front() {
                if item.prev_file_number == 0 {
                    self.index.insert(item.key, &item.meta);
                } else {
                    self.index.update(item.key, item.prev_file_number, &item.meta);
                }
            }
            tracing::debug!(batch, "drained index work queue");
        }
    }
}
