use crate::message::create_alert;
use crate::rule::AlertRule;
use crate::state::RuleStateStore;
use crate::types::{AlertContext, AlertEvaluationResult, AlertNotification};
use crate::NotificationSink;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const REASON_DISABLED: &str = "disabled";
pub const REASON_COOLDOWN: &str = "cooldown";
pub const REASON_NOT_MET: &str = "conditions not met";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long inactive condition state and expired cooldowns are kept.
    #[serde(default = "default_state_retention_secs")]
    pub state_retention_secs: u64,
}

fn default_state_retention_secs() -> u64 {
    24 * 60 * 60
}

impl EngineConfig {
    /// Oldest instant whose state is kept. `None` when the retention
    /// reaches past the representable range, in which case nothing expires.
    pub fn retention_cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.state_retention_secs).ok()?;
        now.checked_sub_signed(Duration::try_seconds(secs)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_retention_secs: default_state_retention_secs(),
        }
    }
}

/// Evaluates rule sets against snapshots, one cycle at a time.
///
/// The engine owns the duration and cooldown state, so a fresh engine
/// starts with every rule disarmed.
pub struct AlertEngine {
    config: EngineConfig,
    state: RuleStateStore,
}

impl AlertEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: RuleStateStore::new(),
        }
    }

    pub fn state(&self) -> &RuleStateStore {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.clear();
    }

    pub async fn evaluate<'a>(
        &mut self,
        rules: &'a [AlertRule],
        ctx: &AlertContext,
        sink: Option<&dyn NotificationSink>,
    ) -> Vec<AlertEvaluationResult<'a>> {
        self.evaluate_at(rules, ctx, sink, Utc::now()).await
    }

    /// Runs one evaluation cycle as of `now`.
    ///
    /// Rules are evaluated in order. A fired rule is handed to `sink` before
    /// the next rule is evaluated; sink failures are logged and do not stop
    /// the cycle.
    pub async fn evaluate_at<'a>(
        &mut self,
        rules: &'a [AlertRule],
        ctx: &AlertContext,
        sink: Option<&dyn NotificationSink>,
        now: DateTime<Utc>,
    ) -> Vec<AlertEvaluationResult<'a>> {
        let mut results = Vec::with_capacity(rules.len());

        for rule in rules {
            let result = self.evaluate_rule(rule, ctx, now);

            if let (Some(alert), Some(sink)) = (&result.alert, sink) {
                let notification = AlertNotification::new(alert.clone(), rule, ctx);
                if let Err(e) = sink.dispatch(notification).await {
                    tracing::error!(
                        rule_id = %rule.id,
                        alert_id = %alert.id,
                        error = %e,
                        "Failed to send alert notification"
                    );
                }
            }

            results.push(result);
        }

        if let Some(cutoff) = self.config.retention_cutoff(now) {
            self.state.prune(cutoff);
        }

        let fired = results.iter().filter(|r| r.triggered).count();
        tracing::debug!(rules = rules.len(), fired, "Alert rules evaluated");
        results
    }

    fn evaluate_rule<'a>(
        &mut self,
        rule: &'a AlertRule,
        ctx: &AlertContext,
        now: DateTime<Utc>,
    ) -> AlertEvaluationResult<'a> {
        if !rule.enabled {
            return AlertEvaluationResult::skipped(rule, REASON_DISABLED);
        }

        if self.state.is_in_cooldown(&rule.id, rule.cooldown_ms, now) {
            tracing::debug!(rule_id = %rule.id, "Alert suppressed (cooldown)");
            return AlertEvaluationResult::skipped(rule, REASON_COOLDOWN);
        }

        // every condition is evaluated so that duration state advances for
        // all of them in the same cycle
        let mut all_met = !rule.conditions.is_empty();
        for (index, condition) in rule.conditions.iter().enumerate() {
            let is_met = condition.is_met(&ctx.snapshot);
            let satisfied =
                self.state
                    .check_duration(&rule.id, index, condition.duration_ms, is_met, now);
            all_met &= satisfied;
        }

        if !all_met {
            tracing::debug!(rule_id = %rule.id, "Alert rule conditions not met");
            return AlertEvaluationResult::skipped(rule, REASON_NOT_MET);
        }

        let alert = create_alert(rule, ctx, now);
        self.state.set_cooldown(&rule.id, now);
        tracing::info!(
            rule_id = %rule.id,
            alert_id = %alert.id,
            severity = %rule.severity,
            "Alert rule triggered"
        );
        AlertEvaluationResult::fired(rule, alert)
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
