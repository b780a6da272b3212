use tracing::debug;

use crate::http::{Error, Transport};

use super::{FetchError, IpSource};

/// Asks an IP echo service (ipify and the like) for our address with a plain
/// GET. The response body, trimmed, is the address.
pub struct HttpIpSource<T> {
    url: Box<str>,
    transport: T,
}

impl<T: Transport> HttpIpSource<T> {
    pub fn new(url: impl Into<Box<str>>, transport: T) -> Self {
        Self {
            url: url.into(),
            transport,
        }
    }
}

impl<T: Transport> IpSource for HttpIpSource<T> {
    fn fetch(&mut self) -> Result<Box<str>, FetchError> {
        let response = match self.transport.get(&self.url) {
            Ok(r) => r,
            Err(Error::Status(code, _)) => Err(FetchError::Status(code))?,
            Err(Error::Transport(t)) => Err(FetchError::Transport(t))?,
        };

        if !response.is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let text = response
            .into_string()
            .map_err(|e| FetchError::Body(e.to_string().into()))?;

        let addr = text.trim();
        if addr.is_empty() {
            return Err(FetchError::Empty);
        }

        debug!("IP source {} reported {}", self.url, addr);

        Ok(addr.into())
    }
}
