use hydro_client::UsageRecord;
use serde::Serialize;
use time::OffsetDateTime;

use super::{Sink, SinkError};
use crate::config::HomeAssistantConfig;

#[derive(Debug, Serialize)]
struct SensorAttributes {
    unit_of_measurement: &'static str,
    device_class: &'static str,
    state_class: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    last_updated: OffsetDateTime,
}

#[derive(Debug, Serialize)]
struct SensorState {
    state: f64,
    unique_id: String,
    attributes: SensorAttributes,
}

/// Pushes each usage record as a sensor state update to a Home Assistant
/// instance. An alternative consumer to the time-series sink; enabled only
/// when configured.
pub struct HomeAssistantSink {
    http: reqwest::Client,
    config: HomeAssistantConfig,
}

impl HomeAssistantSink {
    pub fn new(config: HomeAssistantConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn state_payload(&self, record: &UsageRecord) -> SensorState {
        SensorState {
            state: record.kwh,
            unique_id: self.config.entity_id.clone(),
            attributes: SensorAttributes {
                unit_of_measurement: "kWh",
                device_class: "energy",
                state_class: "measurement",
                last_updated: record.ts,
            },
        }
    }

    async fn push_state(&self, record: &UsageRecord) -> Result<(), SinkError> {
        let url = format!(
            "{}/api/states/sensor.{}",
            self.config.base_url, self.config.entity_id
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&self.state_payload(record))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SinkError::InvalidStatus(status));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Sink for HomeAssistantSink {
    async fn write(&self, records: &[UsageRecord]) -> Result<(), SinkError> {
        for record in records {
            self.push_state(record).await?;
        }
        if !records.is_empty() {
            tracing::info!(states = records.len(), "pushed sensor states to home assistant");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn sensor_state_payload_shape() {
        let sink = HomeAssistantSink::new(HomeAssistantConfig {
            base_url: "https://ha.example.com".to_string(),
            token: "token".to_string(),
            entity_id: "hydro_energy".to_string(),
        });

        let record = UsageRecord {
            ts: datetime!(2023-01-02 03:00:00 -5),
            kwh: 1.5,
            peak: "on-peak".to_string(),
            cost: 0.45,
        };

        let value = serde_json::to_value(sink.state_payload(&record)).unwrap();
        assert_eq!(value["state"], 1.5);
        assert_eq!(value["unique_id"], "hydro_energy");
        assert_eq!(value["attributes"]["unit_of_measurement"], "kWh");
        assert_eq!(value["attributes"]["device_class"], "energy");
        assert_eq!(value["attributes"]["state_class"], "measurement");
        assert_eq!(value["attributes"]["last_updated"], "2023-01-02T03:00:00-05:00");
    }
}
