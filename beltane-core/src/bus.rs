//! Thread-safe publish/subscribe event bus.
//!
//! Producers (the MIDI callback thread, the OSC feedback listener, the
//! clip-engine stream threads) publish through a cloned [`BusHandle`];
//! the control loop owns the [`EventBus`] and drains it in batches.
//! Subscribers run during that drain, on the control loop's thread, and
//! a panicking subscriber is isolated: it is caught, logged, and does
//! not stop delivery to the remaining subscribers.
//!
//! Ordering: events from a single producer are delivered in publish
//! order. No ordering is guaranteed across producers.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error};

use beltane_types::{Event, Topic};

type Handler = Box<dyn Fn(&Event) + Send + Sync>;

struct Subscriber {
    name: String,
    handler: Handler,
}

/// Cloneable producer-side handle. `publish` never blocks.
#[derive(Clone)]
pub struct BusHandle {
    tx: Sender<Event>,
}

impl BusHandle {
    pub fn publish(&self, event: Event) {
        // Unbounded channel: send only fails when the bus is gone,
        // which happens during shutdown.
        let _ = self.tx.send(event);
    }
}

/// The bus itself. Owned by the control loop.
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
    subscribers: Mutex<HashMap<Topic, Vec<Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Get a producer handle for another thread.
    pub fn handle(&self) -> BusHandle {
        BusHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn publish(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Register a handler for a topic. Handlers run during [`poll`] on
    /// the caller's thread.
    ///
    /// [`poll`]: EventBus::poll
    pub fn subscribe<F>(&self, topic: Topic, name: &str, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut subs = self.subscribers.lock().expect("bus subscriber lock");
        subs.entry(topic).or_default().push(Subscriber {
            name: name.to_string(),
            handler: Box::new(handler),
        });
        debug!(target: "bus", "subscribed '{}' to {:?}", name, topic);
    }

    /// Wait up to `timeout` for an event, then drain everything pending.
    /// Each drained event is delivered to its subscribers before the
    /// batch is returned for mode dispatch.
    pub fn poll(&self, timeout: Duration) -> Vec<Event> {
        let mut batch = Vec::new();
        match self.rx.recv_timeout(timeout) {
            Ok(event) => batch.push(event),
            Err(_) => return batch,
        }
        while let Ok(event) = self.rx.try_recv() {
            batch.push(event);
        }
        for event in &batch {
            self.notify(event);
        }
        batch
    }

    /// Number of events waiting, for telemetry.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    fn notify(&self, event: &Event) {
        let subs = self.subscribers.lock().expect("bus subscriber lock");
        let Some(list) = subs.get(&event.topic()) else {
            return;
        };
        for sub in list {
            let result = panic::catch_unwind(AssertUnwindSafe(|| (sub.handler)(event)));
            if result.is_err() {
                error!(
                    target: "bus",
                    "subscriber '{}' panicked on {:?}, continuing",
                    sub.name,
                    event.topic()
                );
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltane_types::Button;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn press(button: Button) -> Event {
        Event::ButtonPressed { button }
    }

    #[test]
    fn poll_returns_published_events_in_order() {
        let bus = EventBus::new();
        bus.publish(press(Button::Play));
        bus.publish(press(Button::Stop));
        bus.publish(press(Button::Record));

        let batch = bus.poll(Duration::from_millis(10));
        assert_eq!(
            batch,
            vec![
                press(Button::Play),
                press(Button::Stop),
                press(Button::Record)
            ]
        );
    }

    #[test]
    fn poll_times_out_empty() {
        let bus = EventBus::new();
        assert!(bus.poll(Duration::from_millis(1)).is_empty());
    }

    #[test]
    fn subscribers_receive_matching_topic_only() {
        let bus = EventBus::new();
        let presses = Arc::new(AtomicUsize::new(0));
        let counter = presses.clone();
        bus.subscribe(Topic::ButtonPressed, "count", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(press(Button::Play));
        bus.publish(Event::ButtonReleased {
            button: Button::Play,
        });
        bus.poll(Duration::from_millis(10));

        assert_eq!(presses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_block_others() {
        let bus = EventBus::new();
        let reached = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Topic::ButtonPressed, "bad", |_| {
            panic!("boom");
        });
        let counter = reached.clone();
        bus.subscribe(Topic::ButtonPressed, "good", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(press(Button::Play));
        let batch = bus.poll(Duration::from_millis(10));

        assert_eq!(batch.len(), 1);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handle_publishes_from_other_threads() {
        let bus = EventBus::new();
        let handle = bus.handle();
        let join = std::thread::spawn(move || {
            for _ in 0..100 {
                handle.publish(press(Button::Play));
            }
        });
        join.join().unwrap();
        assert_eq!(bus.poll(Duration::from_millis(10)).len(), 100);
    }
}
