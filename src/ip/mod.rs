mod http;

use thiserror::Error;

pub use self::http::HttpIpSource;

pub const DEFAULT_IP_SOURCE: &str = "https://api.ipify.org";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP transport error: {0}")]
    Transport(Box<str>),

    #[error("IP source returned HTTP {0}")]
    Status(u16),

    #[error("unable to read the IP source response: {0}")]
    Body(Box<str>),

    #[error("IP source returned an empty response")]
    Empty,
}

/// Something that can tell us our current public IP address.
///
/// The returned text is taken as-is (apart from trimming); privddns does not
/// insist on it being a well-formed address.
pub trait IpSource {
    fn fetch(&mut self) -> Result<Box<str>, FetchError>;
}

impl<S: IpSource + ?Sized> IpSource for Box<S> {
    fn fetch(&mut self) -> Result<Box<str>, FetchError> {
        (**self).fetch()
    }
}
