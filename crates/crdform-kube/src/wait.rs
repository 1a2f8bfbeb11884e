//! Waiting for `wait_for` conditions after create and update

use kube::discovery::ApiResource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crdform_core::{JsonPath, WaitCondition};

use crate::client::{ObjectRef, ResourceClient};
use crate::error::{KubeError, Result};

/// Polling settings for condition waits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitSettings {
    /// Give up after this long
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Delay between two GETs
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Polls an object until every condition holds
pub struct ConditionWaiter {
    client: Arc<dyn ResourceClient>,
    settings: WaitSettings,
}

impl ConditionWaiter {
    pub fn new(client: Arc<dyn ResourceClient>, settings: WaitSettings) -> Self {
        Self { client, settings }
    }

    /// Wait until every condition matches, returning the last object fetched
    pub async fn wait(
        &self,
        resource: &ApiResource,
        target: &ObjectRef,
        conditions: &[WaitCondition],
    ) -> Result<Value> {
        let compiled = conditions
            .iter()
            .map(|c| Ok((JsonPath::parse(&c.jsonpath)?, c)))
            .collect::<Result<Vec<_>>>()?;

        let deadline = Instant::now() + self.settings.timeout;
        info!(
            kind = %resource.kind,
            object = %target,
            conditions = conditions.len(),
            "waiting for conditions"
        );

        loop {
            let object = self.client.get(resource, target).await?;
            let unmet: Vec<&WaitCondition> = compiled
                .iter()
                .filter(|(path, condition)| !path.matches(&object, &condition.value))
                .map(|(_, condition)| *condition)
                .collect();

            if unmet.is_empty() {
                info!(kind = %resource.kind, object = %target, "conditions met");
                return Ok(object);
            }

            if Instant::now() >= deadline {
                return Err(KubeError::Timeout(format!(
                    "{:?} waiting for {} {}: unmet conditions: {}",
                    self.settings.timeout,
                    resource.kind,
                    target,
                    describe(&unmet)
                )));
            }

            debug!(object = %target, unmet = %describe(&unmet), "conditions not met yet");
            sleep(self.settings.poll_interval).await;
        }
    }
}

fn describe(conditions: &[&WaitCondition]) -> String {
    conditions
        .iter()
        .map(|c| format!("{} == \"{}\"", c.jsonpath, c.value))
        .collect::<Vec<_>>()
        .join(", ")
}
