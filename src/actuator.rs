//! Servo rig command dispatch.
//!
//! Commands are plain HTTP GETs against the rig's control endpoint, carrying
//! `pan` and/or `tilt` as query parameters in degrees. The call is
//! fire-and-forget: the response body is never consulted, and the caller is
//! expected to log-and-drop any error. Commands are superseded every update
//! interval, so a lost one is self-healing; there are no retries.

use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::track::control::ActuatorCommand;

pub struct ActuatorClient {
    agent: ureq::Agent,
    endpoint: Url,
}

impl ActuatorClient {
    /// Build a client for the given control endpoint with a short total
    /// timeout. A late command is a stale command; past the timeout it is
    /// treated as a soft failure, not worth waiting on.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("parse actuator endpoint '{}'", endpoint))?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self { agent, endpoint })
    }

    /// Send one command. Axes absent from the command are omitted from the
    /// request so the rig leaves them unchanged.
    pub fn send(&self, command: &ActuatorCommand) -> Result<()> {
        let url = self.command_url(command);
        self.agent
            .get(url.as_str())
            .call()
            .with_context(|| format!("actuator request {}", url))?;
        Ok(())
    }

    fn command_url(&self, command: &ActuatorCommand) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(pan) = command.pan {
                query.append_pair("pan", &pan.to_string());
            }
            if let Some(tilt) = command.tilt {
                query.append_pair("tilt", &tilt.to_string());
            }
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ActuatorClient {
        ActuatorClient::new("http://rig.local/control", Duration::from_millis(200)).unwrap()
    }

    #[test]
    fn both_axes_become_query_parameters() {
        let url = client().command_url(&ActuatorCommand {
            pan: Some(92),
            tilt: Some(88),
        });
        assert_eq!(url.as_str(), "http://rig.local/control?pan=92&tilt=88");
    }

    #[test]
    fn unmoved_axis_is_omitted() {
        let url = client().command_url(&ActuatorCommand {
            pan: None,
            tilt: Some(110),
        });
        assert_eq!(url.as_str(), "http://rig.local/control?tilt=110");
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(ActuatorClient::new("not a url", Duration::from_millis(200)).is_err());
    }
}
