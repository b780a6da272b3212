use std::str::FromStr;

use serde_derive::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::credentials::{self, Credentials};
use crate::http::{Error, Response, Transport};
use crate::util::optional_string_or_number;

use super::{DdnsUpdateError, TxtPublisher};

const API_BASE: &str = "https://api.porkbun.com/api/json/v3";
const IPV4_API_BASE: &str = "https://api-ipv4.porkbun.com/api/json/v3";

pub const DEFAULT_TTL: u32 = 600;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Mx,
    Cname,
    Alias,
    Txt,
    Ns,
    Aaaa,
    Srv,
    Tlsa,
    Caa,
}

impl RecordType {
    pub const ALL: [RecordType; 10] = [
        RecordType::A,
        RecordType::Mx,
        RecordType::Cname,
        RecordType::Alias,
        RecordType::Txt,
        RecordType::Ns,
        RecordType::Aaaa,
        RecordType::Srv,
        RecordType::Tlsa,
        RecordType::Caa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Mx => "MX",
            RecordType::Cname => "CNAME",
            RecordType::Alias => "ALIAS",
            RecordType::Txt => "TXT",
            RecordType::Ns => "NS",
            RecordType::Aaaa => "AAAA",
            RecordType::Srv => "SRV",
            RecordType::Tlsa => "TLSA",
            RecordType::Caa => "CAA",
        }
    }

    pub fn supports_priority(self) -> bool {
        matches!(self, RecordType::Mx | RecordType::Srv)
    }
}

impl FromStr for RecordType {
    type Err = DdnsUpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DdnsUpdateError::RecordTypeUnsupported(s.into()))
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS record as returned by `retrieveByNameType`.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: Box<str>,

    pub name: Box<str>,

    #[serde(rename = "type")]
    pub kind: Box<str>,

    pub content: Box<str>,

    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub ttl: Option<Box<str>>,

    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub prio: Option<Box<str>>,

    #[serde(default)]
    pub notes: Option<Box<str>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordOptions {
    pub ttl: u32,
    pub priority: Option<u32>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            priority: None,
        }
    }
}

fn validate(rtype: &str, priority: Option<u32>) -> Result<RecordType, DdnsUpdateError> {
    let rtype = rtype.parse::<RecordType>()?;

    if priority.is_some() && !rtype.supports_priority() {
        return Err(DdnsUpdateError::PriorityUnsupported(rtype));
    }

    Ok(rtype)
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Client for the record-level part of the Porkbun v3 JSON API.
///
/// Every call takes an optional explicit credential pair. When it is absent
/// or incomplete the client falls back to the environment and then to the
/// defaults it was built with (see [`credentials::resolve`]).
pub struct Client<T> {
    transport: T,
    defaults: Option<Credentials>,
    env: fn(&str) -> Option<String>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            defaults: None,
            env: process_env,
        }
    }

    pub fn with_defaults(mut self, defaults: Credentials) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_env(mut self, env: fn(&str) -> Option<String>) -> Self {
        self.env = env;
        self
    }

    fn credentials(&self, explicit: Option<&Credentials>) -> Result<Credentials, DdnsUpdateError> {
        credentials::resolve(explicit, self.env, self.defaults.as_ref())
            .ok_or(DdnsUpdateError::CredentialsMissing)
    }

    fn check_response(response: Response) -> Result<Value, DdnsUpdateError> {
        let code = response.status();
        let success = response.is_success();
        let json = response.into_json::<Value>();

        // An error status inside the body wins over the HTTP status code.
        if let Ok(json) = &json {
            if json.get("status").and_then(|v| v.as_str()) == Some("ERROR") {
                let message = json
                    .get("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown porkbun error");
                return Err(DdnsUpdateError::Porkbun(message.into()));
            }
        }

        if !success {
            return Err(DdnsUpdateError::Status(code));
        }

        json.map_err(|e| DdnsUpdateError::Json(e.to_string().into()))
    }

    fn post(
        &self,
        url: &str,
        credentials: &Credentials,
        fields: Map<String, Value>,
    ) -> Result<Value, DdnsUpdateError> {
        let mut payload = Map::new();
        payload.insert("secretapikey".into(), Value::from(&*credentials.secretapikey));
        payload.insert("apikey".into(), Value::from(&*credentials.apikey));
        payload.extend(fields);

        debug!("POST {}", url);

        let response = match self.transport.post_json(url, &Value::Object(payload)) {
            Ok(r) => r,
            Err(Error::Status(_, r)) => r,
            Err(Error::Transport(t)) => Err(DdnsUpdateError::TransportError(t))?,
        };

        Self::check_response(response)
    }

    /// Checks the credentials and returns our IP address as Porkbun sees it.
    /// With `ipv4only`, the IPv4-only API host is used.
    pub fn ping(
        &self,
        ipv4only: bool,
        credentials: Option<&Credentials>,
    ) -> Result<Box<str>, DdnsUpdateError> {
        let credentials = self.credentials(credentials)?;
        let base = if ipv4only { IPV4_API_BASE } else { API_BASE };

        let json = self.post(&format!("{}/ping", base), &credentials, Map::new())?;

        Ok(json
            .get("yourIp")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .into())
    }

    pub fn nsupdate(
        &self,
        domain: &str,
        nameservers: &[&str],
        credentials: Option<&Credentials>,
    ) -> Result<(), DdnsUpdateError> {
        let credentials = self.credentials(credentials)?;

        let mut fields = Map::new();
        fields.insert("ns".into(), json!(nameservers));

        let url = format!("{}/domain/updateNS/{}", API_BASE, domain);
        self.post(&url, &credentials, fields).map(|_| ())
    }

    pub fn create(
        &self,
        domain: &str,
        subdomain: &str,
        rtype: &str,
        content: &str,
        options: RecordOptions,
        credentials: Option<&Credentials>,
    ) -> Result<(), DdnsUpdateError> {
        let rtype = validate(rtype, options.priority)?;
        let credentials = self.credentials(credentials)?;

        let mut fields = Map::new();
        fields.insert("type".into(), rtype.as_str().into());
        fields.insert("name".into(), subdomain.into());
        fields.insert("ttl".into(), options.ttl.into());
        fields.insert("content".into(), content.into());
        if let Some(prio) = options.priority {
            fields.insert("prio".into(), prio.into());
        }

        let url = format!("{}/dns/create/{}", API_BASE, domain);
        self.post(&url, &credentials, fields).map(|_| ())
    }

    pub fn read(
        &self,
        domain: &str,
        subdomain: &str,
        rtype: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<Record>, DdnsUpdateError> {
        let rtype = validate(rtype, None)?;
        let credentials = self.credentials(credentials)?;

        let url = format!(
            "{}/dns/retrieveByNameType/{}/{}/{}",
            API_BASE, domain, rtype, subdomain
        );
        let mut json = self.post(&url, &credentials, Map::new())?;

        match json.get_mut("records").map(Value::take) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(records) => serde_json::from_value(records)
                .map_err(|e| DdnsUpdateError::Json(e.to_string().into())),
        }
    }

    pub fn update(
        &self,
        domain: &str,
        subdomain: &str,
        rtype: &str,
        content: &str,
        options: RecordOptions,
        credentials: Option<&Credentials>,
    ) -> Result<(), DdnsUpdateError> {
        let rtype = validate(rtype, options.priority)?;
        let credentials = self.credentials(credentials)?;

        let mut fields = Map::new();
        fields.insert("content".into(), content.into());
        fields.insert("ttl".into(), options.ttl.into());
        if let Some(prio) = options.priority {
            fields.insert("prio".into(), prio.into());
        }

        let url = format!(
            "{}/dns/editByNameType/{}/{}/{}",
            API_BASE, domain, rtype, subdomain
        );
        self.post(&url, &credentials, fields).map(|_| ())
    }

    pub fn delete(
        &self,
        domain: &str,
        subdomain: &str,
        rtype: &str,
        credentials: Option<&Credentials>,
    ) -> Result<(), DdnsUpdateError> {
        let rtype = validate(rtype, None)?;
        let credentials = self.credentials(credentials)?;

        let url = format!(
            "{}/dns/deleteByNameType/{}/{}/{}",
            API_BASE, domain, rtype, subdomain
        );
        self.post(&url, &credentials, Map::new()).map(|_| ())
    }

    /// Points the A (or AAAA) record of `subdomain` at `ip`, or at the address
    /// Porkbun sees us coming from if `ip` is `None`. AAAA is only used when
    /// `ipv4only` is off and the address looks like IPv6.
    pub fn ddns_update(
        &self,
        domain: &str,
        subdomain: &str,
        ip: Option<&str>,
        ipv4only: bool,
        credentials: Option<&Credentials>,
    ) -> Result<(), DdnsUpdateError> {
        let credentials = self.credentials(credentials)?;

        let ip: Box<str> = match ip.filter(|ip| !ip.is_empty()) {
            Some(ip) => ip.into(),
            None => self.ping(ipv4only, Some(&credentials))?,
        };

        let rtype = if ipv4only || !ip.contains(':') {
            RecordType::A
        } else {
            RecordType::Aaaa
        };

        self.update(
            domain,
            subdomain,
            rtype.as_str(),
            &ip,
            RecordOptions::default(),
            Some(&credentials),
        )
    }
}

/// Publishes tokens into one TXT record through the Porkbun client.
pub struct TxtRecord<T> {
    client: Client<T>,
    domain: Box<str>,
    subdomain: Box<str>,
    ttl: u32,
}

impl<T: Transport> TxtRecord<T> {
    pub fn new(client: Client<T>, domain: &str, subdomain: &str, ttl: u32) -> Self {
        Self {
            client,
            domain: domain.into(),
            subdomain: subdomain.into(),
            ttl,
        }
    }
}

impl<T: Transport> TxtPublisher for TxtRecord<T> {
    fn publish_txt(&mut self, token: &str) -> Result<(), DdnsUpdateError> {
        let options = RecordOptions {
            ttl: self.ttl,
            priority: None,
        };

        self.client.update(
            &self.domain,
            &self.subdomain,
            RecordType::Txt.as_str(),
            token,
            options,
            None,
        )
    }
}
