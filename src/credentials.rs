pub const APIKEY_VAR: &str = "PORKBUN_APIKEY";
pub const SECRETAPIKEY_VAR: &str = "PORKBUN_SECRETAPIKEY";

/// A Porkbun API key pair. Both halves are opaque to privddns.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub apikey: Box<str>,

    pub secretapikey: Box<str>,
}

impl Credentials {
    pub fn new(apikey: impl Into<Box<str>>, secretapikey: impl Into<Box<str>>) -> Self {
        Self {
            apikey: apikey.into(),
            secretapikey: secretapikey.into(),
        }
    }

    /// Only a pair with both halves present is usable.
    pub fn is_complete(&self) -> bool {
        !self.apikey.is_empty() && !self.secretapikey.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("apikey", &if self.apikey.is_empty() { "" } else { "<redacted>" })
            .field("secretapikey", &if self.secretapikey.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// Picks the credentials to use: the explicit pair, then the
/// `PORKBUN_APIKEY`/`PORKBUN_SECRETAPIKEY` variables seen through `env`, then
/// `defaults`. A tier is only taken as a whole, so a key from one tier is
/// never combined with a secret from another. Returns `None` if no tier has a
/// complete pair.
pub fn resolve<F>(
    explicit: Option<&Credentials>,
    env: F,
    defaults: Option<&Credentials>,
) -> Option<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(explicit) = explicit.filter(|c| c.is_complete()) {
        return Some(explicit.clone());
    }

    let from_env = Credentials::new(
        env(APIKEY_VAR).unwrap_or_default(),
        env(SECRETAPIKEY_VAR).unwrap_or_default(),
    );
    if from_env.is_complete() {
        return Some(from_env);
    }

    defaults.filter(|c| c.is_complete()).cloned()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn explicit_wins_over_env() {
        let explicit = Credentials::new("pk1_arg", "sk1_arg");
        let env = env_of(&[(APIKEY_VAR, "pk1_env"), (SECRETAPIKEY_VAR, "sk1_env")]);
        let defaults = Credentials::new("pk1_def", "sk1_def");

        let resolved = resolve(Some(&explicit), env, Some(&defaults)).unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn env_then_defaults() {
        let env = env_of(&[(APIKEY_VAR, "pk1_env"), (SECRETAPIKEY_VAR, "sk1_env")]);
        let defaults = Credentials::new("pk1_def", "sk1_def");

        let resolved = resolve(None, env, Some(&defaults)).unwrap();
        assert_eq!(resolved, Credentials::new("pk1_env", "sk1_env"));

        let resolved = resolve(None, env_of(&[]), Some(&defaults)).unwrap();
        assert_eq!(resolved, defaults);
    }

    #[test]
    fn partial_tiers_are_skipped_whole() {
        // Key from the arguments, secret from the environment: neither tier
        // is complete, so both are passed over.
        let explicit = Credentials::new("pk1_arg", "");
        let env = env_of(&[(SECRETAPIKEY_VAR, "sk1_env")]);
        let defaults = Credentials::new("pk1_def", "sk1_def");

        let resolved = resolve(Some(&explicit), env, Some(&defaults)).unwrap();
        assert_eq!(resolved, defaults);
    }

    #[test]
    fn nothing_complete() {
        let explicit = Credentials::new("", "sk1_arg");
        let env = env_of(&[(APIKEY_VAR, "pk1_env"), (SECRETAPIKEY_VAR, "")]);
        let defaults = Credentials::new("pk1_def", "");

        assert_eq!(resolve(Some(&explicit), env, Some(&defaults)), None);
        assert_eq!(resolve(None, env_of(&[]), None), None);
    }

    #[test]
    fn debug_hides_secrets() {
        let printed = format!("{:?}", Credentials::new("pk1_abc", "sk1_def"));
        assert!(!printed.contains("pk1_abc"));
        assert!(!printed.contains("sk1_def"));
    }
}
