//! HTTP command channel
//!
//! The rover firmware takes commands as query parameters on its action
//! endpoint: `/action?go=forward`, `/action?led=on`.

use crate::error::DeliveryError;
use async_trait::async_trait;
use chaser_core::{Command, DeviceConfig};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, info};

/// Best-effort command delivery
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Deliver one command with a single bounded attempt
    async fn send(&self, command: Command) -> Result<(), DeliveryError>;
}

/// Sends commands to the rover's action endpoint
pub struct HttpCommandChannel {
    client: Client,
    action_url: Url,
    command_timeout: Duration,
    led_timeout: Duration,
}

impl HttpCommandChannel {
    pub fn new(device: &DeviceConfig) -> Result<Self, chaser_core::Error> {
        let action_url = Url::parse(&device.base_url)
            .and_then(|base| base.join(&device.action_path))
            .map_err(|e| chaser_core::Error::Configuration(format!("Invalid action URL: {}", e)))?;

        let client = Client::builder()
            .build()
            .map_err(|e| chaser_core::Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!("Command channel at {}", action_url);
        Ok(Self {
            client,
            action_url,
            command_timeout: device.command_timeout(),
            led_timeout: device.led_timeout(),
        })
    }

    pub fn action_url(&self) -> &Url {
        &self.action_url
    }

    fn timeout_for(&self, command: Command) -> Duration {
        if command.is_led() {
            self.led_timeout
        } else {
            self.command_timeout
        }
    }
}

#[async_trait]
impl CommandChannel for HttpCommandChannel {
    async fn send(&self, command: Command) -> Result<(), DeliveryError> {
        let response = self
            .client
            .get(self.action_url.clone())
            .query(&[command.query_pair()])
            .timeout(self.timeout_for(command))
            .send()
            .await
            .map_err(|e| DeliveryError::from_reqwest(command, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                command,
                status: status.as_u16(),
            });
        }

        debug!("Sent {}", command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_url() {
        let channel = HttpCommandChannel::new(&DeviceConfig::default()).unwrap();
        assert_eq!(channel.action_url().as_str(), "http://192.168.4.1/action");
    }

    #[test]
    fn test_led_commands_use_led_timeout() {
        let device = DeviceConfig {
            command_timeout_ms: 200,
            led_timeout_ms: 300,
            ..DeviceConfig::default()
        };
        let channel = HttpCommandChannel::new(&device).unwrap();
        assert_eq!(channel.timeout_for(Command::Forward), Duration::from_millis(200));
        assert_eq!(channel.timeout_for(Command::LedOn), Duration::from_millis(300));
    }

    #[test]
    fn test_invalid_base_url() {
        let device = DeviceConfig {
            base_url: "rover".to_string(),
            ..DeviceConfig::default()
        };
        assert!(HttpCommandChannel::new(&device).is_err());
    }
}
