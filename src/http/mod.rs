mod ureq_backend;

use std::io::{self, Cursor, Read};
use std::time::Duration;

use serde::de::DeserializeOwned;

pub use ureq_backend::Request;

pub const USER_AGENT: &str = concat!("privddns ", env!("CARGO_PKG_VERSION"));

/// Upper bound on how much of a response body is read.
const BODY_LIMIT: u64 = 2 * 1024 * 1024;

pub struct Response {
    status: u16,
    reader: Box<dyn Read + Send + Sync>,
}

pub enum Error {
    Status(u16, Response),
    Transport(Box<str>),
}

impl Response {
    pub fn from_bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reader: Box::new(Cursor::new(body.into())),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, io::Error> {
        serde_json::from_reader(self.reader.take(BODY_LIMIT))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn into_string(self) -> Result<String, io::Error> {
        let mut vec = Vec::with_capacity(1024);
        self.reader.take(BODY_LIMIT).read_to_end(&mut vec)?;
        String::from_utf8(vec).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Status(code, _) => write!(f, "HTTP status {}", code),
            Error::Transport(t) => write!(f, "{}", t),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Status(code, _) => f.debug_tuple("Status").field(code).finish(),
            Error::Transport(t) => f.debug_tuple("Transport").field(t).finish(),
        }
    }
}

/// Everything the IP source and the Porkbun client need from the network.
/// Tests substitute a recording implementation.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Response, Error>;

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> Result<Response, Error> {
        (**self).get(url)
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response, Error> {
        (**self).post_json(url, body)
    }
}

/// The production transport: one `ureq::Agent` shared by all requests, so
/// every call made through it honours the same timeout.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();

        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str) -> Result<Response, Error> {
        Request::get(&self.agent, url).call()
    }

    fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<Response, Error> {
        Request::post(&self.agent, url)
            .set("Content-Type", "application/json")
            .send_json(body)
    }
}
