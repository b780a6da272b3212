use tracing::info;

use super::{DdnsUpdateError, TxtPublisher};

/// Logs the update it would have made instead of talking to a provider.
pub struct Service {
    domain: Box<str>,
    subdomain: Box<str>,
    last: Option<Box<str>>,
}

impl Service {
    pub fn new(domain: &str, subdomain: &str) -> Self {
        Self {
            domain: domain.into(),
            subdomain: subdomain.into(),
            last: None,
        }
    }

    /// The most recent token handed to this service.
    pub fn last_published(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl TxtPublisher for Service {
    fn publish_txt(&mut self, token: &str) -> Result<(), DdnsUpdateError> {
        info!(
            "Dummy: simulate updating TXT record {}.{} with token {}",
            self.subdomain, self.domain, token
        );

        self.last = Some(token.into());

        Ok(())
    }

    fn commits(&self) -> bool {
        false
    }
}
