use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use crate::schedule::{Cadence, Pending, Scheduler, Token};

/// How long a draw "spins" before the winner is revealed
pub const DRAW_DELAY: Duration = Duration::from_secs(1);

/// Source of the random index used to pick a winner
pub trait Picker {
    /// Return an index in `0..len`. Only called with `len > 0`.
    fn pick(&mut self, len: usize) -> usize;
}

impl Picker for StdRng {
    fn pick(&mut self, len: usize) -> usize {
        self.random_range(0..len)
    }
}

/// Split bulk input on commas and newlines into trimmed, unique names
///
/// Order of first appearance is kept; blank entries are dropped.
pub fn split_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for token in text.split([',', '\n']) {
        let name = token.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Name lottery state
///
/// `original_group` follows every edit of the pool but not draws, which is
/// what lets [`Lottery::reset_to_original`] bring back a fully drawn group.
pub struct Lottery<P> {
    pool: Vec<String>,
    original_group: Vec<String>,
    drawn: Option<String>,
    pending: Option<Pending>,
    picker: P,
    draw_delay: Duration,
}

impl<P: Picker> Lottery<P> {
    pub fn new(picker: P) -> Self {
        Self {
            pool: Vec::new(),
            original_group: Vec::new(),
            drawn: None,
            pending: None,
            picker,
            draw_delay: DRAW_DELAY,
        }
    }

    pub fn with_draw_delay(mut self, delay: Duration) -> Self {
        self.draw_delay = delay;
        self
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn original_group(&self) -> &[String] {
        &self.original_group
    }

    pub fn drawn(&self) -> Option<&str> {
        self.drawn.as_deref()
    }

    pub fn is_drawing(&self) -> bool {
        self.pending.is_some()
    }

    /// Every name of a non-empty group has been drawn
    pub fn all_drawn(&self) -> bool {
        self.pool.is_empty() && !self.original_group.is_empty()
    }

    pub fn owns(&self, token: Token) -> bool {
        self.pending.as_ref().is_some_and(|p| p.owns(token))
    }

    fn sync_original(&mut self) {
        self.original_group = self.pool.clone();
    }

    /// Add one name. Returns false for blank or duplicate names.
    pub fn add_single(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.pool.iter().any(|n| n == name) {
            debug!(name, "name ignored");
            return false;
        }
        self.pool.push(name.to_string());
        self.sync_original();
        true
    }

    /// Add every name from comma/newline separated text.
    /// Returns how many names were new to the pool.
    pub fn add_bulk(&mut self, text: &str) -> usize {
        if text.trim().is_empty() {
            return 0;
        }

        let mut added = 0;
        for name in split_names(text) {
            if !self.pool.contains(&name) {
                self.pool.push(name);
                added += 1;
            }
        }
        self.sync_original();
        debug!(added, pool = self.pool.len(), "bulk add");
        added
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let removed = match self.pool.iter().position(|n| n == name) {
            Some(index) => {
                self.pool.remove(index);
                true
            }
            None => false,
        };
        self.sync_original();
        removed
    }

    /// Begin a draw; the winner is picked when the scheduled wakeup arrives.
    /// Returns false when there is nothing to draw or a draw is in flight.
    pub fn draw(&mut self, scheduler: &dyn Scheduler) -> bool {
        if self.pool.is_empty() {
            debug!("draw ignored: pool is empty");
            return false;
        }
        if self.is_drawing() {
            debug!("draw ignored: already drawing");
            return false;
        }

        self.drawn = None;
        self.pending = Some(scheduler.schedule(Cadence::Once(self.draw_delay)));
        true
    }

    /// Resolve the in-flight draw if `token` belongs to it
    pub fn on_wakeup(&mut self, token: Token) -> Option<&str> {
        if !self.owns(token) {
            return None;
        }
        self.pending = None;
        self.pick_winner();
        self.drawn.as_deref()
    }

    /// Draw without the delay, used outside the interactive UI.
    /// Returns None once the pool is exhausted.
    pub fn draw_now(&mut self) -> Option<&str> {
        if self.is_drawing() || self.pool.is_empty() {
            return None;
        }
        self.pick_winner();
        self.drawn.as_deref()
    }

    fn pick_winner(&mut self) {
        if self.pool.is_empty() {
            // the pool was emptied while the draw was spinning
            return;
        }
        let index = self.picker.pick(self.pool.len()).min(self.pool.len() - 1);
        let name = self.pool.remove(index);
        info!(name = %name, remaining = self.pool.len(), "name drawn");
        self.drawn = Some(name);
    }

    pub fn clear_all(&mut self) {
        self.pool.clear();
        self.original_group.clear();
        self.drawn = None;
        self.pending = None;
    }

    /// Bring back the original group once every name has been drawn
    pub fn reset_to_original(&mut self) -> bool {
        if !self.all_drawn() {
            return false;
        }
        self.pool = self.original_group.clone();
        self.drawn = None;
        self.pending = None;
        info!(names = self.pool.len(), "group restored");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::manual::ManualScheduler;
    use proptest::prelude::*;
    use rand::SeedableRng;

    /// Always picks the same index
    struct FixedPick(usize);

    impl Picker for FixedPick {
        fn pick(&mut self, _len: usize) -> usize {
            self.0
        }
    }

    fn lottery_with(names: &[&str]) -> Lottery<FixedPick> {
        let mut lottery = Lottery::new(FixedPick(0));
        for name in names {
            lottery.add_single(name);
        }
        lottery
    }

    fn draw_and_resolve<P: Picker>(lottery: &mut Lottery<P>, scheduler: &ManualScheduler) -> Option<String> {
        if !lottery.draw(scheduler) {
            return None;
        }
        lottery.on_wakeup(scheduler.last()).map(str::to_string)
    }

    #[test]
    fn test_split_names() {
        assert_eq!(split_names("Alice, Bob,Alice\nCharlie"), vec!["Alice", "Bob", "Charlie"]);
        assert_eq!(split_names(" , \n,,"), Vec::<String>::new());
        assert_eq!(split_names("Dan\r\nEve"), vec!["Dan", "Eve"]);
        assert_eq!(split_names("alice, Alice"), vec!["alice", "Alice"]);
    }

    #[test]
    fn test_add_single_trims_and_rejects_duplicates() {
        let mut lottery = lottery_with(&[]);
        assert!(lottery.add_single("  Alice "));
        assert!(!lottery.add_single("Alice"));
        assert!(!lottery.add_single("   "));
        assert!(lottery.add_single("alice"));

        assert_eq!(lottery.pool(), ["Alice", "alice"]);
        assert_eq!(lottery.original_group(), lottery.pool());
    }

    #[test]
    fn test_add_bulk_merges_in_order() {
        let mut lottery = lottery_with(&["Bob"]);
        let added = lottery.add_bulk("Alice, Bob,Alice\nCharlie");
        assert_eq!(added, 2);
        assert_eq!(lottery.pool(), ["Bob", "Alice", "Charlie"]);
        assert_eq!(lottery.original_group(), lottery.pool());

        assert_eq!(lottery.add_bulk("  \n "), 0);
        assert_eq!(lottery.pool().len(), 3);
    }

    #[test]
    fn test_add_bulk_mixed_separators() {
        let mut lottery = lottery_with(&[]);
        lottery.add_bulk("Alice, Bob,Alice\nCharlie");
        assert_eq!(lottery.pool(), ["Alice", "Bob", "Charlie"]);
    }

    #[test]
    fn test_remove_syncs_original_and_keeps_winner() {
        let scheduler = ManualScheduler::new();
        let mut lottery = lottery_with(&["A", "B", "C"]);
        draw_and_resolve(&mut lottery, &scheduler);
        assert_eq!(lottery.drawn(), Some("A"));

        assert!(lottery.remove("C"));
        assert!(!lottery.remove("Z"));
        assert_eq!(lottery.pool(), ["B"]);
        assert_eq!(lottery.original_group(), ["B"]);
        assert_eq!(lottery.drawn(), Some("A"));
    }

    #[test]
    fn test_draw_picks_by_index() {
        let scheduler = ManualScheduler::new();
        let mut lottery = Lottery::new(FixedPick(1));
        lottery.add_bulk("A,B,C");

        assert!(lottery.draw(&scheduler));
        assert!(lottery.is_drawing());
        assert_eq!(lottery.drawn(), None);
        assert_eq!(scheduler.last_cadence(), Cadence::Once(DRAW_DELAY));

        assert_eq!(lottery.on_wakeup(scheduler.last()), Some("B"));
        assert!(!lottery.is_drawing());
        assert_eq!(lottery.pool(), ["A", "C"]);
        assert_eq!(lottery.original_group(), ["A", "B", "C"]);
    }

    #[test]
    fn test_draw_clears_previous_winner() {
        let scheduler = ManualScheduler::new();
        let mut lottery = lottery_with(&["A", "B"]);
        draw_and_resolve(&mut lottery, &scheduler);
        assert_eq!(lottery.drawn(), Some("A"));

        lottery.draw(&scheduler);
        assert_eq!(lottery.drawn(), None);
    }

    #[test]
    fn test_draw_on_empty_pool_is_noop() {
        let scheduler = ManualScheduler::new();
        let mut lottery = lottery_with(&[]);
        assert!(!lottery.draw(&scheduler));
        assert!(!lottery.is_drawing());
        assert_eq!(lottery.drawn(), None);
        assert_eq!(scheduler.issued(), 0);

        // also after a winner is showing
        let mut lottery = lottery_with(&["A"]);
        draw_and_resolve(&mut lottery, &scheduler);
        assert!(!lottery.draw(&scheduler));
        assert_eq!(lottery.drawn(), Some("A"));
        assert!(!lottery.is_drawing());
    }

    #[test]
    fn test_concurrent_draw_is_rejected() {
        let scheduler = ManualScheduler::new();
        let mut lottery = lottery_with(&["A", "B"]);
        assert!(lottery.draw(&scheduler));
        assert!(!lottery.draw(&scheduler));
        assert_eq!(scheduler.issued(), 1);
    }

    #[test]
    fn test_clear_all_cancels_inflight_draw() {
        let scheduler = ManualScheduler::new();
        let mut lottery = lottery_with(&["A", "B"]);
        lottery.draw(&scheduler);
        let token = scheduler.last();

        lottery.clear_all();
        assert!(!lottery.is_drawing());
        assert!(lottery.pool().is_empty());
        assert!(lottery.original_group().is_empty());
        assert!(!lottery.all_drawn());

        // stale wakeup cannot resurrect a winner
        lottery.add_single("C");
        assert_eq!(lottery.on_wakeup(token), None);
        assert_eq!(lottery.pool(), ["C"]);
        assert_eq!(lottery.drawn(), None);
    }

    #[test]
    fn test_removing_last_name_while_drawing_resolves_empty() {
        let scheduler = ManualScheduler::new();
        let mut lottery = lottery_with(&["A"]);
        lottery.draw(&scheduler);
        lottery.remove("A");

        assert_eq!(lottery.on_wakeup(scheduler.last()), None);
        assert!(!lottery.is_drawing());
        assert!(!lottery.all_drawn());
    }

    #[test]
    fn test_reset_only_when_all_drawn() {
        let mut lottery = lottery_with(&[]);
        assert!(!lottery.all_drawn());
        assert!(!lottery.reset_to_original());

        let mut lottery = lottery_with(&["A", "B"]);
        assert!(!lottery.reset_to_original());
        assert_eq!(lottery.pool(), ["A", "B"]);
    }

    #[test]
    fn test_exhaust_and_reset() {
        let scheduler = ManualScheduler::new();
        let mut lottery = Lottery::new(StdRng::seed_from_u64(7));
        lottery.add_bulk("Ann\nBen\nCat\nDot");

        let mut winners = Vec::new();
        while !lottery.pool().is_empty() {
            winners.push(draw_and_resolve(&mut lottery, &scheduler).unwrap());
        }
        assert!(lottery.all_drawn());
        winners.sort();
        assert_eq!(winners, ["Ann", "Ben", "Cat", "Dot"]);

        assert!(lottery.reset_to_original());
        assert_eq!(lottery.pool(), ["Ann", "Ben", "Cat", "Dot"]);
        assert_eq!(lottery.drawn(), None);

        // the restored pool is a copy
        draw_and_resolve(&mut lottery, &scheduler);
        assert_eq!(lottery.pool().len(), 3);
        assert_eq!(lottery.original_group().len(), 4);
    }

    #[test]
    fn test_draw_now_skips_delay() {
        let mut lottery = Lottery::new(FixedPick(2));
        lottery.add_bulk("A,B,C");
        assert_eq!(lottery.draw_now(), Some("C"));
        assert_eq!(lottery.pool(), ["A", "B"]);
    }

    #[test]
    fn test_draw_now_stops_at_exhaustion() {
        let mut lottery = lottery_with(&["A", "B"]);
        let mut winners = Vec::new();
        for _ in 0..4 {
            match lottery.draw_now() {
                Some(name) => winners.push(name.to_string()),
                None => break,
            }
        }
        assert_eq!(winners, ["A", "B"]);
        assert!(lottery.all_drawn());

        // the last winner stays on display
        assert_eq!(lottery.draw_now(), None);
        assert_eq!(lottery.drawn(), Some("B"));
    }

    proptest! {
        #[test]
        fn prop_add_single_twice_keeps_one_copy(name in "\\PC*") {
            let mut lottery = lottery_with(&[]);
            lottery.add_single(&name);
            lottery.add_single(&name);

            let trimmed = name.trim();
            if trimmed.is_empty() {
                prop_assert!(lottery.pool().is_empty());
            } else {
                prop_assert_eq!(lottery.pool(), [trimmed.to_string()]);
            }
        }

        #[test]
        fn prop_exhaustion_then_reset_restores_group(
            names in proptest::collection::vec("[a-z]{1,6}", 1..12),
            seed in any::<u64>(),
        ) {
            let scheduler = ManualScheduler::new();
            let mut lottery = Lottery::new(StdRng::seed_from_u64(seed));
            for name in &names {
                lottery.add_single(name);
            }
            let group = lottery.pool().to_vec();

            while !lottery.pool().is_empty() {
                prop_assert!(draw_and_resolve(&mut lottery, &scheduler).is_some());
            }
            prop_assert!(lottery.all_drawn());
            prop_assert!(lottery.reset_to_original());
            prop_assert_eq!(lottery.pool(), group.as_slice());
        }
    }
}
