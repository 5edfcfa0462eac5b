// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use futures_channel::oneshot;
use parking_lot::Mutex;

/// Single-slot delivery point where the first success wins.
///
/// Every attempt holds a clone. The first [`offer`][Arbiter::offer] takes the sender out of the
/// slot and delivers; every later offer finds the slot empty and drops its value. Offers never
/// block, and offers made after the receiver is gone are dropped as well.
#[derive(Debug)]
pub(crate) struct Arbiter<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Arbiter<T> {
    pub(crate) fn new() -> (Self, oneshot::Receiver<T>) {
        let (sender, receiver) = oneshot::channel();
        let arbiter = Self {
            slot: Arc::new(Mutex::new(Some(sender))),
        };

        (arbiter, receiver)
    }

    /// Offers a value. Returns `true` when this offer was the one delivered.
    pub(crate) fn offer(&self, value: T) -> bool {
        let Some(sender) = self.slot.lock().take() else {
            return false;
        };

        sender.send(value).is_ok()
    }
}

impl<T> Clone for Arbiter<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}
