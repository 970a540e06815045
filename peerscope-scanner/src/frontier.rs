use std::collections::{HashSet, VecDeque};

/// Outcome of asking the frontier for more work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pop {
    /// Address to process; it is already marked visited and in flight.
    Next(String),
    /// Queue is empty but other workers may still enqueue peers.
    Idle,
    /// Nothing left to do: budget reached or queue drained with nothing in flight.
    Done,
}

/// BFS work queue and visited set for a single crawl.
///
/// Not synchronized on its own; the crawler wraps it in a mutex and keeps
/// every call short.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<String>,
    visited: HashSet<String>,
    in_flight: usize,
    budget: usize,
    queue_cap: usize,
}

impl Frontier {
    pub fn new(budget: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            in_flight: 0,
            budget,
            queue_cap: budget.saturating_mul(3),
        }
    }

    /// Queue `address` unless it was already visited, the budget is spent or
    /// the queue is at capacity. Returns whether it was queued.
    pub fn push(&mut self, address: String) -> bool {
        if self.visited.contains(&address)
            || self.budget_reached()
            || self.queue.len() >= self.queue_cap
        {
            return false;
        }
        self.queue.push_back(address);
        true
    }

    /// Pop the next unvisited address and mark it visited in one step.
    pub fn pop(&mut self) -> Pop {
        if self.budget_reached() {
            return Pop::Done;
        }
        while let Some(address) = self.queue.pop_front() {
            if self.visited.insert(address.clone()) {
                self.in_flight += 1;
                return Pop::Next(address);
            }
        }
        if self.in_flight == 0 {
            Pop::Done
        } else {
            Pop::Idle
        }
    }

    /// Release the in-flight slot taken by a successful [`Frontier::pop`].
    pub fn complete(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub fn budget_reached(&self) -> bool {
        self.visited.len() >= self.budget
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_visited(&self, address: &str) -> bool {
        self.visited.contains(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_marks_visited_once() {
        let mut frontier = Frontier::new(10);
        assert!(frontier.push("a".into()));
        assert!(frontier.push("a".into()));

        assert_eq!(frontier.pop(), Pop::Next("a".into()));
        assert!(frontier.is_visited("a"));
        // The duplicate entry is skipped, and "a" is still in flight.
        assert_eq!(frontier.pop(), Pop::Idle);

        frontier.complete();
        assert_eq!(frontier.pop(), Pop::Done);
        assert!(!frontier.push("a".into()));
    }

    #[test]
    fn test_budget_stops_pops_and_pushes() {
        let mut frontier = Frontier::new(2);
        for addr in ["a", "b", "c"] {
            frontier.push(addr.into());
        }
        assert_eq!(frontier.pop(), Pop::Next("a".into()));
        assert_eq!(frontier.pop(), Pop::Next("b".into()));
        assert!(frontier.budget_reached());
        assert_eq!(frontier.pop(), Pop::Done);
        assert!(!frontier.push("d".into()));
        assert_eq!(frontier.visited_len(), 2);
    }

    #[test]
    fn test_queue_capped_at_three_times_budget() {
        let mut frontier = Frontier::new(2);
        let queued = (0..10)
            .filter(|i| frontier.push(format!("10.0.0.{}:1984", i)))
            .count();
        assert_eq!(queued, 6);
        assert_eq!(frontier.queued_len(), 6);
    }

    #[test]
    fn test_idle_while_in_flight() {
        let mut frontier = Frontier::new(5);
        frontier.push("a".into());
        assert!(matches!(frontier.pop(), Pop::Next(_)));
        assert_eq!(frontier.in_flight(), 1);
        assert_eq!(frontier.pop(), Pop::Idle);

        frontier.push("b".into());
        assert_eq!(frontier.pop(), Pop::Next("b".into()));
        frontier.complete();
        frontier.complete();
        assert_eq!(frontier.pop(), Pop::Done);
    }

    #[test]
    fn test_zero_budget_is_done_immediately() {
        let mut frontier = Frontier::new(0);
        assert!(!frontier.push("a".into()));
        assert_eq!(frontier.pop(), Pop::Done);
    }
}
