//! Time-ordered one-shot action queue keyed by simulation time.
//!
//! Events are kept sorted ascending by trigger time; ties keep insertion
//! order. Insertion is a linear scan from the head (event counts are small),
//! popping a due event is a front removal.
//!
//! The scheduler never runs actions itself: the owner drains it with
//! [`Scheduler::pop_due`] so that an action may schedule further actions
//! while the flush is in progress. Such an action is always removed before
//! it runs. A new event whose time is already due is popped later in the
//! same flush, behind every queued event with a time not greater than its
//! own.

/// A scheduled action with its trigger time.
#[derive(Debug)]
struct Event<A> {
    time: f64,
    action: A,
}

#[derive(Debug)]
pub struct Scheduler<A> {
    events: Vec<Event<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<A> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to fire once simulation time reaches `time`.
    pub fn schedule(&mut self, time: f64, action: A) {
        let event = Event { time, action };
        match self.events.iter().position(|e| time < e.time) {
            Some(i) => self.events.insert(i, event),
            None => self.events.push(event),
        }
    }

    /// Remove and return the earliest action if it is due at `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<A> {
        match self.events.first() {
            Some(head) if now >= head.time => Some(self.events.remove(0).action),
            _ => None,
        }
    }

    /// Trigger time of the earliest queued event.
    pub fn next_time(&self) -> Option<f64> {
        self.events.first().map(|e| e.time)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
