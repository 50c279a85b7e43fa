//! Scripted outcome queues
//!
//! Each operation kind owns a FIFO of pre-recorded outcomes. A call pops at
//! most one entry; an empty queue means "behave normally".

use std::collections::VecDeque;

/// Outcome scripted for one `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateFault {
    /// Report `Timeout` to the caller.
    pub should_error: bool,
    /// Commit the new contents regardless of what is reported.
    pub write_persists: bool,
}

impl Default for UpdateFault {
    fn default() -> Self {
        Self {
            should_error: false,
            write_persists: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct FaultQueues {
    get: VecDeque<bool>,
    list: VecDeque<bool>,
    update: VecDeque<UpdateFault>,
}

impl FaultQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_get(&mut self, should_error: bool) {
        self.get.push_back(should_error);
    }

    pub fn push_list(&mut self, should_error: bool) {
        self.list.push_back(should_error);
    }

    pub fn push_update(&mut self, fault: UpdateFault) {
        self.update.push_back(fault);
    }

    /// Whether the next `get` should fail.
    pub fn next_get(&mut self) -> bool {
        self.get.pop_front().unwrap_or(false)
    }

    /// Whether the next `list` should fail.
    pub fn next_list(&mut self) -> bool {
        self.list.pop_front().unwrap_or(false)
    }

    /// Outcome of the next `update`.
    pub fn next_update(&mut self) -> UpdateFault {
        self.update.pop_front().unwrap_or_default()
    }

    /// Entries not yet consumed, as (get, list, update).
    pub fn pending(&self) -> (usize, usize, usize) {
        (self.get.len(), self.list.len(), self.update.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_consumption() {
        let mut faults = FaultQueues::new();
        faults.push_get(false);
        faults.push_get(true);
        faults.push_get(false);

        assert!(!faults.next_get());
        assert!(faults.next_get());
        assert!(!faults.next_get());
        // Exhausted queue behaves normally.
        assert!(!faults.next_get());
    }

    #[test]
    fn test_update_default_persists() {
        let mut faults = FaultQueues::new();
        assert_eq!(faults.next_update(), UpdateFault::default());

        faults.push_update(UpdateFault {
            should_error: true,
            write_persists: false,
        });
        assert_eq!(faults.pending(), (0, 0, 1));
        let fault = faults.next_update();
        assert!(fault.should_error);
        assert!(!fault.write_persists);
        assert_eq!(faults.pending(), (0, 0, 0));
    }
}
