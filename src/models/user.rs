use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A registered account, keyed by its phone number. The phone is immutable
/// once the record is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub hashed_password: String,
    pub tos_agreement: bool,
    /// Ids of the checks this user owns. Must mirror the set of check
    /// records whose `userPhone` equals this phone.
    #[serde(default)]
    pub checks: Vec<String>,
}

impl User {
    /// Wire form of the record: everything except the password hash.
    pub fn public(&self) -> Value {
        json!({
            "phone": self.phone,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "tosAgreement": self.tos_agreement,
            "checks": self.checks,
        })
    }
}

/// Exactly ten ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_must_be_ten_digits() {
        assert!(is_valid_phone("5551234567"));
        assert!(!is_valid_phone("555123456"));
        assert!(!is_valid_phone("55512345678"));
        assert!(!is_valid_phone("555123456a"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn public_form_strips_password_hash() {
        let user = User {
            phone: "5551234567".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            hashed_password: "abc123".to_string(),
            tos_agreement: true,
            checks: vec!["a".repeat(20)],
        };
        let public = user.public();
        assert!(public.get("hashedPassword").is_none());
        assert_eq!(public["firstName"], "Ada");
        assert_eq!(public["checks"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn checks_field_defaults_to_empty_on_deserialize() {
        let value = json!({
            "phone": "5551234567",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "hashedPassword": "abc",
            "tosAgreement": true
        });
        let user: User = serde_json::from_value(value).expect("user decodes");
        assert!(user.checks.is_empty());
    }
}
