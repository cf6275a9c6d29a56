//! Test helper functions

use std::sync::{Arc, Mutex};
use std::time::Instant;

use wiremock::{Request, Respond, ResponseTemplate};

use lockforge::config::{Config, RegistryConfig};

/// Configuration pointing both registries at a mock server.
pub fn test_config(mock_uri: &str) -> Config {
    Config {
        registry: RegistryConfig {
            npm_base_url: mock_uri.to_string(),
            pypi_base_url: mock_uri.to_string(),
            request_timeout_seconds: 2,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Responder that records the arrival time of every request it serves, so
/// tests can verify batching behavior from the registry's point of view.
#[derive(Clone)]
pub struct ArrivalRecorder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    template: ResponseTemplate,
}

impl ArrivalRecorder {
    pub fn new(template: ResponseTemplate) -> Self {
        Self {
            arrivals: Arc::new(Mutex::new(Vec::new())),
            template,
        }
    }

    pub fn arrivals(&self) -> Vec<Instant> {
        let mut times = self.arrivals.lock().unwrap().clone();
        times.sort();
        times
    }
}

impl Respond for ArrivalRecorder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        self.template.clone()
    }
}
