use serde::Serialize;

use super::{Error, Response};

pub struct Request {
    inner: ureq::Request,
}

fn wrap(result: Result<ureq::Response, ureq::Error>) -> Result<Response, Error> {
    match result {
        Ok(resp) => Ok(Response {
            status: resp.status(),
            reader: resp.into_reader(),
        }),
        Err(ureq::Error::Status(code, resp)) => Err(Error::Status(
            code,
            Response {
                status: code,
                reader: resp.into_reader(),
            },
        )),
        Err(ureq::Error::Transport(tp)) => Err(Error::Transport(tp.to_string().into())),
    }
}

impl Request {
    pub fn get(agent: &ureq::Agent, url: &str) -> Self {
        Self {
            inner: agent.get(url),
        }
    }

    pub fn post(agent: &ureq::Agent, url: &str) -> Self {
        Self {
            inner: agent.post(url),
        }
    }

    pub fn set(mut self, header: &str, value: &str) -> Self {
        self.inner = self.inner.set(header, value);
        self
    }

    pub fn send_json(self, data: impl Serialize) -> Result<Response, Error> {
        wrap(self.inner.send_json(data))
    }

    pub fn call(self) -> Result<Response, Error> {
        wrap(self.inner.call())
    }
}
