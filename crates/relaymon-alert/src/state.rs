use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Sustained-duration tracking for one condition of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionState {
    pub start_time: DateTime<Utc>,
    pub last_triggered: DateTime<Utc>,
    pub is_active: bool,
}

/// Key: (rule_id, condition index)
type ConditionKey = (String, usize);

/// Per-engine store for condition and cooldown state.
///
/// Owned by a single [`crate::engine::AlertEngine`]; all mutation happens
/// inside the evaluation cycle.
#[derive(Debug, Default)]
pub struct RuleStateStore {
    conditions: HashMap<ConditionKey, ConditionState>,
    cooldowns: HashMap<String, DateTime<Utc>>,
}

impl RuleStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies duration gating to a raw condition result and returns
    /// whether the condition counts as satisfied this cycle.
    ///
    /// Without a duration the raw result passes straight through and no
    /// state is recorded. With one, the first true cycle opens a pending
    /// state and returns false; later true cycles return true once
    /// `duration_ms` has elapsed since the state opened. A false cycle
    /// deactivates the state but keeps the entry until [`prune`](Self::prune).
    pub fn check_duration(
        &mut self,
        rule_id: &str,
        index: usize,
        duration_ms: Option<u64>,
        is_met: bool,
        now: DateTime<Utc>,
    ) -> bool {
        let duration_ms = match duration_ms {
            Some(d) if d > 0 => d,
            _ => return is_met,
        };

        let key = (rule_id.to_string(), index);
        if !is_met {
            if let Some(state) = self.conditions.get_mut(&key) {
                state.is_active = false;
            }
            return false;
        }

        if let Some(state) = self.conditions.get_mut(&key) {
            if state.is_active {
                state.last_triggered = now;
                return now - state.start_time >= Duration::milliseconds(duration_ms as i64);
            }
        }

        self.conditions.insert(
            key,
            ConditionState {
                start_time: now,
                last_triggered: now,
                is_active: true,
            },
        );
        false
    }

    pub fn is_in_cooldown(&self, rule_id: &str, cooldown_ms: u64, now: DateTime<Utc>) -> bool {
        self.cooldowns
            .get(rule_id)
            .is_some_and(|last| now - *last < Duration::milliseconds(cooldown_ms as i64))
    }

    pub fn set_cooldown(&mut self, rule_id: &str, now: DateTime<Utc>) {
        self.cooldowns.insert(rule_id.to_string(), now);
    }

    /// Drops inactive condition states last triggered before `cutoff` and
    /// cooldowns that started before it.
    pub fn prune(&mut self, cutoff: DateTime<Utc>) {
        let before = self.conditions.len() + self.cooldowns.len();
        self.conditions
            .retain(|_, state| state.is_active || state.last_triggered >= cutoff);
        self.cooldowns.retain(|_, last| *last >= cutoff);
        let removed = before - (self.conditions.len() + self.cooldowns.len());
        if removed > 0 {
            tracing::debug!(removed, "Pruned stale rule state");
        }
    }

    pub fn condition_state(&self, rule_id: &str, index: usize) -> Option<&ConditionState> {
        self.conditions.get(&(rule_id.to_string(), index))
    }

    pub fn last_fired(&self, rule_id: &str) -> Option<DateTime<Utc>> {
        self.cooldowns.get(rule_id).copied()
    }

    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    pub fn cooldown_count(&self) -> usize {
        self.cooldowns.len()
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
        self.cooldowns.clear();
    }
}
