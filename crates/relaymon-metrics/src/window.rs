use relaymon_common::types::Observation;
use std::collections::VecDeque;

/// Count-bounded window of observations in arrival order.
///
/// Appending past capacity discards from the head, so the window always
/// holds the most recent `capacity` observations. Readers get copies via
/// [`ObservationWindow::snapshot`]; there is no other mutation besides
/// [`ObservationWindow::append`].
#[derive(Debug, Clone)]
pub struct ObservationWindow {
    capacity: usize,
    data: VecDeque<Observation>,
}

impl ObservationWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: VecDeque::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, observation: Observation) {
        self.data.push_back(observation);
        while self.data.len() > self.capacity {
            self.data.pop_front();
        }
    }

    /// Owned copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Observation> {
        self.data.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.data.iter()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self::new(100)
    }
}
