//! Contact submission request and response models

use crate::error::AppError;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const SUCCESS_STATUS: &str = "success";
pub const RECEIVED_MESSAGE: &str = "Form submission received successfully";

/// Inbound body as sent by the contact form.
///
/// Any JSON value except `null` decodes. Bodies that are not objects carry no
/// fields. Falsy field values (`null`, `false`, `0`, `""`) are left unset, and
/// other non-string values keep their JSON text.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl<'de> Deserialize<'de> for ContactForm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Null => Err(de::Error::custom("form body is null")),
            Value::Object(mut fields) => Ok(Self {
                name: field_text(fields.remove("name")),
                email: field_text(fields.remove("email")),
                message: field_text(fields.remove("message")),
            }),
            _ => Ok(Self::default()),
        }
    }
}

fn field_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// A validated submission, forwarded verbatim to the upstream service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    /// Absent, `null` and empty fields all count as missing.
    pub fn into_submission(self) -> Result<ContactSubmission, AppError> {
        let present = |field: Option<String>| field.filter(|value| !value.is_empty());

        match (present(self.name), present(self.email), present(self.message)) {
            (Some(name), Some(email), Some(message)) => Ok(ContactSubmission {
                name,
                email,
                message,
            }),
            _ => Err(AppError::MissingFields),
        }
    }
}

impl TryFrom<ContactForm> for ContactSubmission {
    type Error = AppError;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        form.into_submission()
    }
}

/// Uniform response envelope. Exactly one of `message` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubmissionResult {
    pub fn received() -> Self {
        Self {
            success: true,
            message: Some(RECEIVED_MESSAGE.to_string()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// The parts of an upstream response body we look at. Bodies that are not
/// JSON objects, or whose fields are not strings, leave the fields unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: Option<String>,
    pub message: Option<String>,
}

impl UpstreamReply {
    pub fn from_slice(body: &[u8]) -> Self {
        let value = match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(value) => value,
            Err(_) => return Self::default(),
        };

        let field = |key: &str| value.get(key).and_then(|v| v.as_str()).map(str::to_string);

        Self {
            status: field("status"),
            message: field("message"),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(SUCCESS_STATUS)
    }

    /// Nested upstream message, ignoring empty strings.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: Option<&str>, email: Option<&str>, message: Option<&str>) -> ContactForm {
        ContactForm {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_complete_form_is_accepted() {
        let submission = form(Some("Ada"), Some("ada@example.com"), Some("Hello"))
            .into_submission()
            .unwrap();
        assert_eq!(submission.name, "Ada");
        assert_eq!(submission.email, "ada@example.com");
        assert_eq!(submission.message, "Hello");
    }

    #[test]
    fn test_missing_or_empty_fields_are_rejected() {
        let cases = [
            form(None, Some("ada@example.com"), Some("Hello")),
            form(Some("Ada"), None, Some("Hello")),
            form(Some("Ada"), Some("ada@example.com"), None),
            form(Some(""), Some("ada@example.com"), Some("Hello")),
            form(Some("Ada"), Some(""), Some("Hello")),
            form(Some("Ada"), Some("ada@example.com"), Some("")),
            ContactForm::default(),
        ];

        for case in cases {
            assert!(matches!(
                ContactSubmission::try_from(case),
                Err(AppError::MissingFields)
            ));
        }
    }

    #[test]
    fn test_email_format_is_not_checked() {
        let submission = form(Some("Ada"), Some("not-an-email"), Some("Hello")).into_submission();
        assert!(submission.is_ok());
    }

    #[test]
    fn test_null_fields_deserialize_as_missing() {
        let form: ContactForm =
            serde_json::from_str(r#"{"name":null,"email":"a@b.c","message":"hi","extra":1}"#)
                .unwrap();
        assert!(form.name.is_none());
        assert!(form.into_submission().is_err());
    }

    #[test]
    fn test_falsy_field_values_are_missing() {
        for falsy in ["null", "false", "0", "0.0", "\"\""] {
            let body = format!(r#"{{"name":{falsy},"email":"a@b.c","message":"hi"}}"#);
            let form: ContactForm = serde_json::from_str(&body).unwrap();
            assert!(form.name.is_none(), "name: {falsy}");
            assert!(matches!(form.into_submission(), Err(AppError::MissingFields)));
        }
    }

    #[test]
    fn test_truthy_non_string_fields_keep_json_text() {
        let form: ContactForm =
            serde_json::from_str(r#"{"name":42,"email":true,"message":["hi"]}"#).unwrap();
        let submission = form.into_submission().unwrap();
        assert_eq!(submission.name, "42");
        assert_eq!(submission.email, "true");
        assert_eq!(submission.message, r#"["hi"]"#);
    }

    #[test]
    fn test_non_object_bodies_have_no_fields() {
        for body in ["[1,2,3]", "\"hello\"", "42", "true"] {
            let form: ContactForm = serde_json::from_str(body).unwrap();
            assert!(form.name.is_none() && form.email.is_none() && form.message.is_none());
            assert!(matches!(form.into_submission(), Err(AppError::MissingFields)));
        }
    }

    #[test]
    fn test_null_body_does_not_decode() {
        assert!(serde_json::from_str::<ContactForm>("null").is_err());
    }

    #[test]
    fn test_envelope_serialization() {
        let ok = serde_json::to_value(SubmissionResult::received()).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"success": true, "message": RECEIVED_MESSAGE})
        );

        let err = serde_json::to_value(SubmissionResult::failure("nope")).unwrap();
        assert_eq!(err, serde_json::json!({"success": false, "error": "nope"}));
    }

    #[test]
    fn test_upstream_reply_parsing() {
        let reply = UpstreamReply::from_slice(br#"{"code":200,"status":"success"}"#);
        assert!(reply.is_success());

        let reply = UpstreamReply::from_slice(br#"{"status":"failed","message":"Spam"}"#);
        assert!(!reply.is_success());
        assert_eq!(reply.message(), Some("Spam"));

        let reply = UpstreamReply::from_slice(br#"{"status":200,"message":""}"#);
        assert!(!reply.is_success());
        assert_eq!(reply.message(), None);

        let reply = UpstreamReply::from_slice(b"<html>Thanks!</html>");
        assert_eq!(reply, UpstreamReply::default());
        assert!(!reply.is_success());
    }
}
