use num_bigint::BigUint;
use num_traits::Zero;
use relaymon_common::types::Observation;
use serde::{Deserialize, Serialize};

/// Cost statistics for both legs of the probe, over successful observations.
///
/// Sums are unbounded so totals never clamp; averages use integer
/// division. Values serialize as decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMetrics {
    #[serde(with = "decimal")]
    pub average_send_gas: BigUint,
    #[serde(with = "decimal")]
    pub average_relay_gas: BigUint,
    #[serde(with = "decimal")]
    pub total_gas_used: BigUint,
    #[serde(with = "decimal")]
    pub min_send_gas: BigUint,
    #[serde(with = "decimal")]
    pub max_send_gas: BigUint,
    #[serde(with = "decimal")]
    pub min_relay_gas: BigUint,
    #[serde(with = "decimal")]
    pub max_relay_gas: BigUint,
}

#[derive(Default)]
struct Leg {
    count: u64,
    sum: BigUint,
    min: Option<u128>,
    max: Option<u128>,
}

impl Leg {
    fn add(&mut self, value: u128) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn average(&self) -> BigUint {
        if self.count == 0 {
            BigUint::zero()
        } else {
            &self.sum / self.count
        }
    }
}

pub fn calculate_gas_metrics(observations: &[Observation]) -> GasMetrics {
    let mut send = Leg::default();
    let mut relay = Leg::default();

    for obs in observations.iter().filter(|o| o.success) {
        if let Some(cost) = obs.send_cost {
            send.add(cost);
        }
        if let Some(cost) = obs.relay_cost {
            relay.add(cost);
        }
    }

    GasMetrics {
        average_send_gas: send.average(),
        average_relay_gas: relay.average(),
        total_gas_used: &send.sum + &relay.sum,
        min_send_gas: send.min.unwrap_or(0).into(),
        max_send_gas: send.max.unwrap_or(0).into(),
        min_relay_gas: relay.min.unwrap_or(0).into(),
        max_relay_gas: relay.max.unwrap_or(0).into(),
    }
}

mod decimal {
    use num_bigint::BigUint;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u128),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n.into()),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| serde::de::Error::custom(format!("invalid gas value '{s}': {e}"))),
        }
    }
}
