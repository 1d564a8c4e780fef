//! Producer-consumer handoff over a blocking FIFO queue.
//!
//! The end of the stream is an explicit [`Message::Done`], never an
//! in-band value, and [`Producer::finish`] consumes the producer so the
//! sentinel can only be sent once and only after the last item.

use crate::core::{error::panic_message, LabError, Result};
use crate::logging::get_logger;
use crossbeam::channel::{self, Receiver, Sender};
use std::fmt;
use std::thread;

/// One slot in the handoff queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    /// A data item
    Item(T),
    /// End of stream
    Done,
}

/// Unbounded blocking FIFO between one producer and one consumer.
pub struct HandoffQueue;

impl HandoffQueue {
    /// Create the two ends of a new, empty queue
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T>() -> (Producer<T>, Consumer<T>) {
        let (sender, receiver) = channel::unbounded();
        (Producer { sender }, Consumer { receiver })
    }
}

/// Writing end of a [`HandoffQueue`]
pub struct Producer<T> {
    sender: Sender<Message<T>>,
}

impl<T> Producer<T> {
    /// Enqueue one item
    pub fn put(&self, item: T) -> Result<()> {
        self.sender
            .send(Message::Item(item))
            .map_err(|_| LabError::other("handoff consumer is gone"))
    }

    /// Enqueue the end-of-stream sentinel
    pub fn finish(self) -> Result<()> {
        self.sender
            .send(Message::Done)
            .map_err(|_| LabError::other("handoff consumer is gone"))
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("queued", &self.sender.len())
            .finish()
    }
}

/// Reading end of a [`HandoffQueue`]
pub struct Consumer<T> {
    receiver: Receiver<Message<T>>,
}

impl<T> Consumer<T> {
    /// Block for the next item; `None` once the sentinel arrives.
    ///
    /// A producer dropped without calling [`Producer::finish`] also ends the
    /// stream, with a warning.
    pub fn get(&self) -> Option<T> {
        match self.receiver.recv() {
            Ok(Message::Item(item)) => Some(item),
            Ok(Message::Done) => None,
            Err(_) => {
                get_logger("threading").warning("handoff producer dropped without sentinel");
                None
            }
        }
    }
}

impl<T> Iterator for Consumer<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.get()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("queued", &self.receiver.len())
            .finish()
    }
}

/// Run `items` through a producer thread and a transforming consumer thread.
///
/// Returns the transformed items in the order the consumer saw them, which
/// is the producer's order.
pub fn run_pipeline<T, U, F>(items: Vec<T>, transform: F) -> Result<Vec<U>>
where
    T: fmt::Debug + Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + 'static,
{
    let (producer, consumer) = HandoffQueue::new::<T>();
    let logger = get_logger("threading");

    let producer_thread = thread::Builder::new()
        .name("producer".to_string())
        .spawn(move || -> Result<()> {
            for item in items {
                logger.info(format!("producing {:?}", item));
                producer.put(item)?;
            }
            producer.finish()
        })
        .map_err(|e| LabError::spawn_with_source(0, "cannot start producer", e))?;

    let consumer_thread = thread::Builder::new()
        .name("consumer".to_string())
        .spawn(move || consumer.map(transform).collect::<Vec<U>>())
        .map_err(|e| LabError::spawn_with_source(1, "cannot start consumer", e))?;

    let produced = producer_thread
        .join()
        .map_err(|payload| LabError::join(0, panic_message(payload.as_ref())))?;
    let results = consumer_thread
        .join()
        .map_err(|payload| LabError::join(1, panic_message(payload.as_ref())))?;
    produced?;
    Ok(results)
}

/// Classic demo: produce `0..item_count`, consumer doubles each one.
pub fn producer_consumer(item_count: u64) -> Result<Vec<u64>> {
    run_pipeline((0..item_count).collect(), |item| item * 2)
}
