//! Observable state cells.
//!
//! A cell keeps its last value, hands out any number of receivers, and marks
//! them changed synchronously inside every update.

use tokio::sync::watch;

/// Named observable value
#[derive(Debug)]
pub struct StateCell<T> {
    name: &'static str,
    tx: watch::Sender<T>,
}

impl<T> StateCell<T> {
    pub fn new(name: &'static str, initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { name, tx }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Read through a borrow. Do not hold across an await.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.tx.borrow())
    }

    /// Replace the value and notify
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Mutate in place and notify
    pub fn update(&self, modify: impl FnOnce(&mut T)) {
        self.tx.send_modify(modify);
    }

    /// Mutate in place; notify only when `modify` returns true
    pub fn update_if(&self, modify: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(modify)
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> StateCell<T> {
    /// Clone of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}
