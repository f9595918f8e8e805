//! Convergence-driven loading of a lazily rendered comment list
//!
//! Each round expands collapsed replies, scrolls the list, waits for the page to
//! settle and samples how many comment items are rendered. The loop stops once
//! the count has failed to grow for a number of consecutive rounds, or at a hard
//! round cap.

use crate::{browser::Page,
            comments::{config::HarvestConfig, scripts}};
use std::time::Duration;

/// Why the interaction loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The visible count stopped growing
    Converged,
    /// The round cap was reached first
    RoundCap,
}

/// Loop state: `Loading → Checking → {Loading, Done}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Checking,
    Done(StopReason),
}

/// Stopping rule over a sequence of visible-count samples
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    max_rounds: u32,
    stagnant_limit: u32,
    rounds: u32,
    last_count: usize,
    stagnant: u32,
    phase: Phase,
}

impl StabilityTracker {
    pub fn new(max_rounds: u32, stagnant_limit: u32) -> Self {
        Self { max_rounds, stagnant_limit, rounds: 0, last_count: 0, stagnant: 0, phase: Phase::Loading }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn last_count(&self) -> usize {
        self.last_count
    }

    /// Interactions for the current round are done; the next call is `observe`
    pub fn start_check(&mut self) {
        if self.phase == Phase::Loading {
            self.phase = Phase::Checking;
        }
    }

    /// Record the count sampled at the end of a round and decide whether to continue
    pub fn observe(&mut self, count: usize) -> Phase {
        if let Phase::Done(_) = self.phase {
            return self.phase;
        }

        self.rounds += 1;
        if count <= self.last_count {
            self.stagnant += 1;
        } else {
            self.stagnant = 0;
        }
        self.last_count = count;

        self.phase = if self.stagnant >= self.stagnant_limit {
            Phase::Done(StopReason::Converged)
        } else if self.rounds >= self.max_rounds {
            Phase::Done(StopReason::RoundCap)
        } else {
            Phase::Loading
        };

        self.phase
    }
}

/// Summary of a finished interaction loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceReport {
    pub rounds: u32,
    pub last_count: usize,
    pub reason: StopReason,
}

/// Drives interaction rounds against a page until the comment list stops growing
#[derive(Debug, Clone)]
pub struct ConvergenceDriver {
    settle_interval: Duration,
    max_rounds: u32,
    stagnant_rounds: u32,
}

impl ConvergenceDriver {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            settle_interval: config.settle_interval,
            max_rounds: config.max_rounds,
            stagnant_rounds: config.stagnant_rounds,
        }
    }

    /// Run rounds until the stopping rule fires; `after_round` sees each round number and sampled count
    pub fn run<P, F>(&self, page: &P, mut after_round: F) -> ConvergenceReport
    where
        P: Page + ?Sized,
        F: FnMut(u32, usize),
    {
        let mut tracker = StabilityTracker::new(self.max_rounds, self.stagnant_rounds);

        loop {
            interact(page);
            if !self.settle_interval.is_zero() {
                std::thread::sleep(self.settle_interval);
            }

            tracker.start_check();
            let count = visible_count(page);
            let phase = tracker.observe(count);
            after_round(tracker.rounds(), count);

            if let Phase::Done(reason) = phase {
                return ConvergenceReport { rounds: tracker.rounds(), last_count: tracker.last_count(), reason };
            }
        }
    }
}

/// Expand replies and scroll; failures only cost this round's progress
fn interact<P: Page + ?Sized>(page: &P) {
    match page.evaluate(scripts::EXPAND_REPLIES) {
        Ok(clicked) if clicked.as_u64().unwrap_or(0) > 0 => log::debug!("Expanded {} reply threads", clicked),
        Ok(_) => {}
        Err(e) => log::debug!("Reply expansion failed: {}", e),
    }

    if let Err(e) = page.evaluate(scripts::SCROLL_COMMENTS) {
        log::debug!("Scroll failed: {}", e);
    }
}

/// Rendered comment items; any failure reads as zero
pub fn visible_count<P: Page + ?Sized>(page: &P) -> usize {
    page.evaluate(scripts::COUNT_COMMENTS).ok().and_then(|v| v.as_u64()).unwrap_or(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed counts until the tracker stops; returns (rounds, reason)
    fn run_sequence(counts: &[usize], max_rounds: u32) -> (u32, StopReason) {
        let mut tracker = StabilityTracker::new(max_rounds, 3);
        for (i, &count) in counts.iter().cycle().enumerate() {
            tracker.start_check();
            assert_eq!(tracker.phase(), Phase::Checking);
            if let Phase::Done(reason) = tracker.observe(count) {
                return (i as u32 + 1, reason);
            }
            assert_eq!(tracker.phase(), Phase::Loading);
        }
        unreachable!()
    }

    #[test]
    fn test_constant_count_stops_after_round_four() {
        assert_eq!(run_sequence(&[5], 30), (4, StopReason::Converged));
    }

    #[test]
    fn test_growth_resets_stagnation() {
        let counts = [5, 9, 9, 9, 12, 12, 12, 12];
        let mut tracker = StabilityTracker::new(30, 3);
        let phases: Vec<Phase> = counts.iter().map(|&c| tracker.observe(c)).collect();

        assert!(phases[..7].iter().all(|p| *p == Phase::Loading));
        assert_eq!(phases[7], Phase::Done(StopReason::Converged));
        assert_eq!(tracker.rounds(), 8);
        assert_eq!(tracker.last_count(), 12);
    }

    #[test]
    fn test_shrinking_count_counts_as_stagnant() {
        assert_eq!(run_sequence(&[10, 8, 8, 7], 30), (4, StopReason::Converged));
    }

    #[test]
    fn test_empty_page_converges_after_three_rounds() {
        assert_eq!(run_sequence(&[0], 30), (3, StopReason::Converged));
    }

    #[test]
    fn test_round_cap() {
        let growing: Vec<usize> = (1..=100).collect();
        assert_eq!(run_sequence(&growing, 30), (30, StopReason::RoundCap));
    }

    #[test]
    fn test_done_is_terminal() {
        let mut tracker = StabilityTracker::new(1, 3);
        assert_eq!(tracker.observe(4), Phase::Done(StopReason::RoundCap));
        assert_eq!(tracker.observe(99), Phase::Done(StopReason::RoundCap));
        assert_eq!(tracker.rounds(), 1);
    }
}
