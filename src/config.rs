use std::fs;
use std::io;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_derive::Deserialize;
use thiserror::Error;

use crate::credentials::Credentials;
use crate::crypto::DEFAULT_KEY_FILE;
use crate::ip::DEFAULT_IP_SOURCE;
use crate::services::porkbun::DEFAULT_TTL;

pub const DEFAULT_CHECK_INTERVAL: u32 = 1800;
pub const DEFAULT_LAST_IP_FILE: &str = "./data/last_ip";
pub const DEFAULT_SUBDOMAIN: &str = "_privddns";
pub const DEFAULT_SECRETS_FILE: &str = "./porkbun_secrets.toml";
pub const DEFAULT_HTTP_TIMEOUT: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORKBUN_DOMAIN is not set (neither in the environment nor in the secrets file)")]
    MissingDomain,

    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(&'static str, Box<str>),

    #[error("unable to read secrets file {0}: {1}")]
    SecretsUnreadable(Box<str>, io::Error),

    #[error("unable to parse secrets file {0}: {1}")]
    SecretsInvalid(Box<str>, toml::de::Error),
}

/// The optional, usually git-ignored, secrets file. Anything set here is
/// overridden by the environment.
///
/// ```toml
/// apikey = "pk1_..."
/// secretapikey = "sk1_..."
/// domain = "example.com"
/// subdomain = "_privddns"
/// ```
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Secrets {
    pub apikey: Option<Box<str>>,

    pub secretapikey: Option<Box<str>>,

    pub domain: Option<Box<str>>,

    pub subdomain: Option<Box<str>>,
}

impl Secrets {
    /// A missing file is an empty layer. A file that exists but cannot be
    /// read or parsed is an error.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(ConfigError::SecretsUnreadable(display(path), e))?,
        };

        toml::from_str::<Secrets>(&text)
            .map(Some)
            .map_err(|e| ConfigError::SecretsInvalid(display(path), e))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// `None` means run a single cycle and exit.
    pub check_interval: Option<NonZeroU32>,
    pub last_ip_file: PathBuf,
    pub ip_source: Box<str>,
    pub http_timeout: Duration,
    pub domain: Box<str>,
    pub subdomain: Box<str>,
    pub ttl: u32,
    pub key_file: PathBuf,
    /// Credentials from the secrets file. They sit below the environment in
    /// the resolution order.
    pub default_credentials: Credentials,
    pub dry_run: bool,
}

fn display(path: &Path) -> Box<str> {
    path.display().to_string().into()
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(name, value.into()))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(name, value.into())),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from `lookup`, which stands in for the process
    /// environment. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let secrets_file = var("PORKBUN_SECRETS_FILE").unwrap_or_else(|| DEFAULT_SECRETS_FILE.into());
        let secrets = Secrets::load(Path::new(&secrets_file))?.unwrap_or_default();

        let check_interval = match var("CHECK_INTERVAL") {
            Some(v) => NonZeroU32::new(parse_number("CHECK_INTERVAL", &v)?),
            None => NonZeroU32::new(DEFAULT_CHECK_INTERVAL),
        };

        let http_timeout = match var("HTTP_TIMEOUT") {
            Some(v) => match parse_number::<u64>("HTTP_TIMEOUT", &v)? {
                0 => Err(ConfigError::InvalidValue("HTTP_TIMEOUT", v.into()))?,
                secs => Duration::from_secs(secs),
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT),
        };

        let ttl = match var("PORKBUN_TTL") {
            Some(v) => parse_number("PORKBUN_TTL", &v)?,
            None => DEFAULT_TTL,
        };

        let dry_run = match var("DRY_RUN") {
            Some(v) => parse_bool("DRY_RUN", &v)?,
            None => false,
        };

        let domain: Box<str> = var("PORKBUN_DOMAIN")
            .map(Into::into)
            .or(secrets.domain)
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::MissingDomain)?;

        let subdomain: Box<str> = var("PORKBUN_SUBDOMAIN")
            .map(Into::into)
            .or(secrets.subdomain)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SUBDOMAIN.into());

        Ok(Self {
            check_interval,
            last_ip_file: var("LAST_IP_FILE")
                .unwrap_or_else(|| DEFAULT_LAST_IP_FILE.into())
                .into(),
            ip_source: var("IP_SOURCE")
                .unwrap_or_else(|| DEFAULT_IP_SOURCE.into())
                .into(),
            http_timeout,
            domain,
            subdomain,
            ttl,
            key_file: var("KEY_FILE")
                .unwrap_or_else(|| DEFAULT_KEY_FILE.into())
                .into(),
            default_credentials: Credentials::new(
                secrets.apikey.unwrap_or_default(),
                secrets.secretapikey.unwrap_or_default(),
            ),
            dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: Vec<(&str, String)>) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect::<HashMap<_, _>>();
        move |k| map.get(k).cloned()
    }

    /// Points the secrets file somewhere that does not exist, so the tests
    /// never pick up a real one from the working directory.
    fn no_secrets(dir: &tempfile::TempDir) -> (&'static str, String) {
        let path = dir.path().join("absent.toml");
        ("PORKBUN_SECRETS_FILE", path.display().to_string())
    }

    #[test]
    fn defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_lookup(lookup(vec![
            no_secrets(&dir),
            ("PORKBUN_DOMAIN", "example.com".into()),
        ]))
        .unwrap();

        assert_eq!(config.check_interval, NonZeroU32::new(1800));
        assert_eq!(config.last_ip_file, PathBuf::from("./data/last_ip"));
        assert_eq!(&*config.ip_source, "https://api.ipify.org");
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(&*config.domain, "example.com");
        assert_eq!(&*config.subdomain, "_privddns");
        assert_eq!(config.ttl, 600);
        assert_eq!(config.key_file, PathBuf::from("aes_key.bin"));
        assert_eq!(config.default_credentials, Credentials::default());
        assert!(!config.dry_run);
    }

    #[test]
    fn missing_domain_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        let result = Config::from_lookup(lookup(vec![no_secrets(&dir)]));
        assert!(matches!(result, Err(ConfigError::MissingDomain)));

        let result = Config::from_lookup(lookup(vec![
            no_secrets(&dir),
            ("PORKBUN_DOMAIN", String::new()),
        ]));
        assert!(matches!(result, Err(ConfigError::MissingDomain)));
    }

    #[test]
    fn overrides() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_lookup(lookup(vec![
            no_secrets(&dir),
            ("PORKBUN_DOMAIN", "example.org".into()),
            ("PORKBUN_SUBDOMAIN", "_home".into()),
            ("CHECK_INTERVAL", "60".into()),
            ("LAST_IP_FILE", "/var/lib/privddns/last_ip".into()),
            ("IP_SOURCE", "https://ifconfig.example/ip".into()),
            ("HTTP_TIMEOUT", "3".into()),
            ("PORKBUN_TTL", "300".into()),
            ("KEY_FILE", "/etc/privddns/key.bin".into()),
            ("DRY_RUN", "yes".into()),
        ]))
        .unwrap();

        assert_eq!(config.check_interval, NonZeroU32::new(60));
        assert_eq!(config.last_ip_file, PathBuf::from("/var/lib/privddns/last_ip"));
        assert_eq!(&*config.ip_source, "https://ifconfig.example/ip");
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(&*config.subdomain, "_home");
        assert_eq!(config.ttl, 300);
        assert_eq!(config.key_file, PathBuf::from("/etc/privddns/key.bin"));
        assert!(config.dry_run);
    }

    #[test]
    fn zero_interval_means_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_lookup(lookup(vec![
            no_secrets(&dir),
            ("PORKBUN_DOMAIN", "example.com".into()),
            ("CHECK_INTERVAL", "0".into()),
        ]))
        .unwrap();

        assert_eq!(config.check_interval, None);
    }

    #[test]
    fn invalid_values() {
        let dir = tempfile::tempdir().unwrap();

        for (name, value) in [
            ("CHECK_INTERVAL", "half an hour"),
            ("CHECK_INTERVAL", "-5"),
            ("HTTP_TIMEOUT", "0"),
            ("PORKBUN_TTL", "ten"),
            ("DRY_RUN", "maybe"),
        ] {
            let result = Config::from_lookup(lookup(vec![
                no_secrets(&dir),
                ("PORKBUN_DOMAIN", "example.com".into()),
                (name, value.into()),
            ]));

            match result {
                Err(ConfigError::InvalidValue(n, _)) => assert_eq!(n, name),
                other => panic!("{}={} gave {:?}", name, value, other),
            }
        }
    }

    #[test]
    fn secrets_file_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("porkbun_secrets.toml");
        fs::write(
            &path,
            r#"
            apikey = "pk1_file"
            secretapikey = "sk1_file"
            domain = "example.net"
            subdomain = "_fromfile"
            "#,
        )
        .unwrap();
        let secrets_var = ("PORKBUN_SECRETS_FILE", path.display().to_string());

        let config = Config::from_lookup(lookup(vec![secrets_var.clone()])).unwrap();
        assert_eq!(&*config.domain, "example.net");
        assert_eq!(&*config.subdomain, "_fromfile");
        assert_eq!(config.default_credentials, Credentials::new("pk1_file", "sk1_file"));

        // The environment wins over the file.
        let config = Config::from_lookup(lookup(vec![
            secrets_var,
            ("PORKBUN_DOMAIN", "example.com".into()),
        ]))
        .unwrap();
        assert_eq!(&*config.domain, "example.com");
        assert_eq!(&*config.subdomain, "_fromfile");
    }

    #[test]
    fn broken_secrets_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("porkbun_secrets.toml");
        fs::write(&path, "apikey = [not toml").unwrap();

        let result = Config::from_lookup(lookup(vec![
            ("PORKBUN_SECRETS_FILE", path.display().to_string()),
            ("PORKBUN_DOMAIN", "example.com".into()),
        ]));
        assert!(matches!(result, Err(ConfigError::SecretsInvalid(..))));

        fs::write(&path, "apikey = \"pk1\"\npassword = \"hunter2\"\n").unwrap();
        let result = Config::from_lookup(lookup(vec![
            ("PORKBUN_SECRETS_FILE", path.display().to_string()),
            ("PORKBUN_DOMAIN", "example.com".into()),
        ]));
        assert!(matches!(result, Err(ConfigError::SecretsInvalid(..))));
    }
}
