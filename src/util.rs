use serde::de::Visitor;
use serde::Deserializer;

/// Porkbun is not consistent about how it encodes numbers: `ttl` and `prio`
/// usually arrive as strings, sometimes as numbers, and `prio` may be `null`.
/// This helper accepts all of those and keeps the textual form.
///
/// For example,
/// ```text
/// JSON "600" ---> Some(Box("600"))
/// JSON 600   ---> Some(Box("600"))
/// JSON null  ---> None
/// ```
pub(crate) fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<Box<str>>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = Option<Box<str>>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, a number or null")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.into()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string().into()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string().into()))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string().into()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}

#[cfg(test)]
mod tests {
    use serde_derive::Deserialize;

    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "optional_string_or_number")]
        value: Option<Box<str>>,
    }

    #[test]
    fn accepts_strings_numbers_and_null() {
        let parse = |s: &str| serde_json::from_str::<Sample>(s).unwrap().value;

        assert_eq!(parse(r#"{"value":"600"}"#).as_deref(), Some("600"));
        assert_eq!(parse(r#"{"value":600}"#).as_deref(), Some("600"));
        assert_eq!(parse(r#"{"value":-1}"#).as_deref(), Some("-1"));
        assert_eq!(parse(r#"{"value":null}"#), None);
        assert_eq!(parse(r#"{}"#), None);
    }

    #[test]
    fn rejects_other_types() {
        assert!(serde_json::from_str::<Sample>(r#"{"value":[1]}"#).is_err());
    }
}
