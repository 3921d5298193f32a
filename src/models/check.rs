use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol a check probes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "http" => Some(Protocol::Http),
            "https" => Some(Protocol::Https),
            _ => None,
        }
    }
}

/// HTTP method the check issues against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl CheckMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "get" => Some(CheckMethod::Get),
            "post" => Some(CheckMethod::Post),
            "put" => Some(CheckMethod::Put),
            "delete" => Some(CheckMethod::Delete),
            _ => None,
        }
    }
}

/// A monitored HTTP(S) endpoint configuration owned by a user.
///
/// Ownership (`user_phone`) is always taken from the stored record, never
/// from caller input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: String,
    pub user_phone: String,
    pub protocol: Protocol,
    pub url: String,
    pub method: CheckMethod,
    pub success_codes: Vec<u16>,
    pub timeout_seconds: u8,
}

impl Check {
    pub const ID_LEN: usize = 20;
    pub const TIMEOUT_RANGE: std::ops::RangeInclusive<u64> = 1..=5;
}

/// A non-empty array of integers that each fit an HTTP status code.
pub fn parse_success_codes(value: Option<&Value>) -> Option<Vec<u16>> {
    let array = value?.as_array()?;
    if array.is_empty() {
        return None;
    }
    let mut codes = Vec::with_capacity(array.len());
    for code in array {
        codes.push(u16::try_from(code.as_u64()?).ok()?);
    }
    Some(codes)
}

/// A whole number of seconds in the accepted window.
pub fn parse_timeout_seconds(value: Option<&Value>) -> Option<u8> {
    value?
        .as_u64()
        .filter(|t| Check::TIMEOUT_RANGE.contains(t))
        .map(|t| t as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn protocol_and_method_parse_lowercase_only() {
        assert_eq!(Protocol::parse("https"), Some(Protocol::Https));
        assert_eq!(Protocol::parse("HTTPS"), None);
        assert_eq!(Protocol::parse("ftp"), None);
        assert_eq!(CheckMethod::parse("put"), Some(CheckMethod::Put));
        assert_eq!(CheckMethod::parse("patch"), None);
    }

    #[test]
    fn success_codes_must_be_non_empty_integers() {
        assert_eq!(
            parse_success_codes(Some(&json!([200, 201]))),
            Some(vec![200, 201])
        );
        assert_eq!(parse_success_codes(Some(&json!([]))), None);
        assert_eq!(parse_success_codes(Some(&json!([200, "201"]))), None);
        assert_eq!(parse_success_codes(Some(&json!([200.5]))), None);
        assert_eq!(parse_success_codes(Some(&json!("200"))), None);
        assert_eq!(parse_success_codes(None), None);
    }

    #[test]
    fn timeout_is_a_whole_number_between_one_and_five() {
        assert_eq!(parse_timeout_seconds(Some(&json!(1))), Some(1));
        assert_eq!(parse_timeout_seconds(Some(&json!(5))), Some(5));
        assert_eq!(parse_timeout_seconds(Some(&json!(0))), None);
        assert_eq!(parse_timeout_seconds(Some(&json!(6))), None);
        assert_eq!(parse_timeout_seconds(Some(&json!(3.5))), None);
        assert_eq!(parse_timeout_seconds(Some(&json!(-1))), None);
    }

    #[test]
    fn check_serializes_with_camel_case_fields() {
        let check = Check {
            id: "a".repeat(20),
            user_phone: "5551234567".to_string(),
            protocol: Protocol::Https,
            url: "example.com".to_string(),
            method: CheckMethod::Get,
            success_codes: vec![200],
            timeout_seconds: 3,
        };
        let value = serde_json::to_value(&check).expect("check encodes");
        assert_eq!(value["userPhone"], "5551234567");
        assert_eq!(value["protocol"], "https");
        assert_eq!(value["method"], "get");
        assert_eq!(value["successCodes"], json!([200]));
        assert_eq!(value["timeoutSeconds"], 3);
    }
}
