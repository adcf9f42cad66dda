//! The two self-contained widgets hosted by the app
//!
//! Neither widget knows about the terminal or the other widget. Both take a
//! [`Scheduler`](crate::schedule::Scheduler) for anything that has to happen
//! later and are handed the resulting wakeups back through `on_wakeup`.

pub mod countdown;
pub mod lottery;
