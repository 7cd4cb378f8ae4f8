#![forbid(unsafe_code)]

//! Stateful date display.
//!
//! A [`Clock`] owns a [`ReactiveBinding`] over a single `date` field and its
//! own mount node. Embedding it in a parent view goes through
//! [`Clock::view`], which re-watches (and so repaints) the clock and hands back
//! its mount node. The mount node is retained by the document, so a parent
//! repaint detaches it without destroying it.
//!
//! Time only moves when the owner calls [`Clock::tick`]; each due period of
//! the clock's [`Interval`] writes `date` once and therefore repaints once.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Local};
use rebind_dom::{Element, SharedDocument, View, el};
use rebind_runtime::{BindingError, ReactiveBinding, State, StateHandle, Value};
use tracing::debug;
use web_time::Instant;

use crate::interval::Interval;

/// Name of the single field a clock binds.
pub const DATE_FIELD: &str = "date";

/// Display format for the current date.
pub const DATE_FORMAT: &str = "%a %b %d %Y %H:%M:%S";

/// Produces the date written on each tick.
pub type TimeSource = Rc<dyn Fn() -> DateTime<Local>>;

/// A self-updating `<p>Date now: ...</p>`.
pub struct Clock {
    binding: ReactiveBinding,
    interval: Cell<Interval>,
    now: TimeSource,
}

impl Clock {
    /// A clock reading the system local time, ticking once per second from
    /// `started`.
    #[must_use]
    pub fn new(document: SharedDocument, started: Instant) -> Self {
        Self::with_time_source(document, started, Rc::new(Local::now))
    }

    /// A clock reading dates from `now`.
    #[must_use]
    pub fn with_time_source(document: SharedDocument, started: Instant, now: TimeSource) -> Self {
        let state = State::new().with(DATE_FIELD, Value::opaque(now()));
        Self {
            binding: ReactiveBinding::new(document, state),
            interval: Cell::new(Interval::every_second(started)),
            now,
        }
    }

    /// Replace the tick schedule.
    #[must_use]
    pub fn with_interval(self, interval: Interval) -> Self {
        self.interval.set(interval);
        self
    }

    /// Watch (and paint) the clock, returning its mount node as a view.
    pub fn view(&self) -> Result<View, BindingError> {
        let mount = self.binding.watch(render_date)?;
        Ok(View::node(mount))
    }

    /// Write a fresh date once per period due at `now`. Returns the number of
    /// writes.
    pub fn tick(&self, now: Instant) -> Result<u32, BindingError> {
        let mut interval = self.interval.get();
        let due = interval.poll(now);
        self.interval.set(interval);
        if due == 0 {
            return Ok(0);
        }

        debug!(due, "clock ticked");
        let state = self.binding.state();
        for _ in 0..due {
            state.set(DATE_FIELD, Value::opaque((self.now)()))?;
        }
        Ok(due)
    }

    /// The date currently held.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<Local>> {
        self.binding
            .state()
            .snapshot()
            .get(DATE_FIELD)
            .and_then(|value| value.downcast_ref::<DateTime<Local>>())
            .copied()
    }

    /// The underlying binding.
    #[must_use]
    pub fn binding(&self) -> &ReactiveBinding {
        &self.binding
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("mount", &self.binding.mount())
            .field("interval", &self.interval.get())
            .field("renders", &self.binding.render_count())
            .finish()
    }
}

fn render_date(state: &StateHandle) -> Element {
    let label = state
        .get(DATE_FIELD)
        .as_ref()
        .and_then(|value| value.downcast_ref::<DateTime<Local>>())
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    el("p").child(format!("Date now: {label}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rebind_dom::{Document, MemoryDocument, shared};
    use std::cell::RefCell;
    use std::time::Duration;

    const SECOND: Duration = Duration::from_secs(1);
    const EPOCH: i64 = 1_700_000_000;

    fn at(secs: i64) -> DateTime<Local> {
        Local.timestamp_opt(secs, 0).single().unwrap()
    }

    fn label(secs: i64) -> String {
        format!("Date now: {}", at(secs).format(DATE_FORMAT))
    }

    /// A clock whose time source advances one second per read.
    fn fake_clock(started: Instant) -> (Rc<RefCell<MemoryDocument>>, Clock) {
        let doc = shared(MemoryDocument::new());
        let host: SharedDocument = doc.clone();
        let secs = Rc::new(Cell::new(EPOCH));
        let source: TimeSource = Rc::new(move || {
            let now = secs.get();
            secs.set(now + 1);
            at(now)
        });
        (doc, Clock::with_time_source(host, started, source))
    }

    #[test]
    fn view_paints_initial_date() {
        let (doc, clock) = fake_clock(Instant::now());
        clock.view().unwrap();
        let mount = clock.binding().mount();

        assert_eq!(doc.borrow().text_content(mount).unwrap(), label(EPOCH));
        assert_eq!(clock.binding().render_count(), 1);
        assert_eq!(clock.date(), Some(at(EPOCH)));
    }

    #[test]
    fn tick_before_period_does_nothing() {
        let start = Instant::now();
        let (_doc, clock) = fake_clock(start);
        clock.view().unwrap();
        assert_eq!(clock.tick(start + Duration::from_millis(500)).unwrap(), 0);
        assert_eq!(clock.binding().render_count(), 1);
    }

    #[test]
    fn each_due_tick_repaints() {
        let start = Instant::now();
        let (doc, clock) = fake_clock(start);
        clock.view().unwrap();
        let mount = clock.binding().mount();

        assert_eq!(clock.tick(start + SECOND).unwrap(), 1);
        assert_eq!(clock.binding().render_count(), 2);
        assert_eq!(doc.borrow().text_content(mount).unwrap(), label(EPOCH + 1));

        assert_eq!(clock.tick(start + 4 * SECOND).unwrap(), 3);
        assert_eq!(clock.binding().render_count(), 5);
        assert_eq!(doc.borrow().text_content(mount).unwrap(), label(EPOCH + 4));
    }

    #[test]
    fn ticks_before_view_store_silently() {
        let start = Instant::now();
        let (_doc, clock) = fake_clock(start);
        assert_eq!(clock.tick(start + 2 * SECOND).unwrap(), 2);
        assert_eq!(clock.binding().render_count(), 0);
        assert_eq!(clock.date(), Some(at(EPOCH + 2)));
    }

    #[test]
    fn view_rewatches_and_keeps_mount() {
        let (_doc, clock) = fake_clock(Instant::now());
        let first = clock.view().unwrap();
        let second = clock.view().unwrap();
        assert!(matches!((first, second), (View::Node(a), View::Node(b)) if a == b));
        assert_eq!(clock.binding().render_count(), 2);
    }

    #[test]
    fn clock_survives_parent_repaint() {
        let start = Instant::now();
        let (doc, clock) = fake_clock(start);
        let clock = Rc::new(clock);
        let host: SharedDocument = doc.clone();
        let parent = ReactiveBinding::new(host, State::new().with("n", 0));

        let c = Rc::clone(&clock);
        let parent_mount = parent
            .watch(move |state: &StateHandle| -> Result<View, BindingError> {
                let n = state.get("n").and_then(|v| v.as_int()).unwrap_or(0);
                Ok(el("div")
                    .child(c.view()?)
                    .child(el("span").child(n.to_string()))
                    .into())
            })
            .unwrap();

        parent.state().set("n", 1).unwrap();
        clock.tick(start + SECOND).unwrap();

        let clock_mount = clock.binding().mount();
        assert!(doc.borrow().contains(clock_mount));
        assert!(doc.borrow().parent(clock_mount).unwrap().is_some());
        assert_eq!(
            doc.borrow().text_content(parent_mount).unwrap(),
            format!("{}1", label(EPOCH + 1))
        );
    }
}
