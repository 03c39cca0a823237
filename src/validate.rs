//! Schema-based validation for inbound mutation payloads.
//!
//! Every mutation endpoint declares a [`Schema`] and runs it against the raw
//! JSON body before the payload is deserialized into its typed form and
//! before any store access happens. All failing rules are collected; the
//! first message doubles as the primary user-facing error string.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::err::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub enum Kind {
    /// Structural email check, max 254 chars.
    Email,
    /// UTF-8 string with an inclusive character-count range.
    Str { min: usize, max: usize },
    Bool,
    /// Membership in a fixed set of string values.
    OneOf(&'static [&'static str]),
    /// String form of a UUID (entity references in bodies).
    Uuid,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    /// Vietnamese label used in messages, e.g. "mật khẩu".
    pub label: &'static str,
    pub required: bool,
    pub kind: Kind,
}

/// Cross-field refinement: `field` must equal `must_match`.
#[derive(Debug, Clone, Copy)]
pub struct EqualPair {
    pub field: &'static str,
    pub must_match: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub fields: &'static [Field],
    pub equal_pairs: &'static [EqualPair],
}

pub const MALFORMED_BODY: &str = "Dữ liệu gửi lên không hợp lệ.";

impl Schema {
    /// Collects every violation in `raw`. An empty result means the payload
    /// passed all declared rules.
    pub fn issues(&self, raw: &Value) -> Vec<Issue> {
        let obj = match raw.as_object() {
            Some(obj) => obj,
            None => {
                return vec![Issue {
                    field: "",
                    message: MALFORMED_BODY.to_string(),
                }]
            }
        };

        let mut out = Vec::new();
        for field in self.fields {
            match obj.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        out.push(Issue {
                            field: field.name,
                            message: format!("Vui lòng nhập {}.", field.label),
                        });
                    }
                }
                Some(value) => {
                    if let Some(issue) = check_kind(field, value) {
                        out.push(issue);
                    }
                }
            }
        }
        for pair in self.equal_pairs {
            let a = obj.get(pair.field).and_then(Value::as_str);
            let b = obj.get(pair.must_match).and_then(Value::as_str);
            if a != b {
                out.push(Issue {
                    field: pair.field,
                    message: pair.message.to_string(),
                });
            }
        }
        out
    }

    /// Validates `raw` and only then deserializes it into `T`. Never touches
    /// the store; callers run this first so a rejected payload causes no
    /// partial writes.
    pub fn parse<T: DeserializeOwned>(&self, raw: Value) -> Result<T, Error> {
        let issues = self.issues(&raw);
        if !issues.is_empty() {
            return Err(Error::validation(issues));
        }
        serde_json::from_value(raw).map_err(|err| {
            log::warn!("payload passed schema but failed to deserialize: {err}");
            Error::validation(vec![Issue {
                field: "",
                message: MALFORMED_BODY.to_string(),
            }])
        })
    }
}

fn check_kind(field: &Field, value: &Value) -> Option<Issue> {
    match field.kind {
        Kind::Email => {
            let s = match value.as_str() {
                Some(s) => s,
                None => return type_issue(field),
            };
            if !looks_like_email(s) {
                return Some(Issue {
                    field: field.name,
                    message: "Email không hợp lệ.".to_string(),
                });
            }
            None
        }
        Kind::Str { min, max } => {
            let s = match value.as_str() {
                Some(s) => s,
                None => return type_issue(field),
            };
            let len = s.chars().count();
            if len < min {
                return Some(Issue {
                    field: field.name,
                    message: format!(
                        "{} phải có ít nhất {} ký tự.",
                        capitalize(field.label),
                        min
                    ),
                });
            }
            if len > max {
                return Some(Issue {
                    field: field.name,
                    message: format!(
                        "{} không được vượt quá {} ký tự.",
                        capitalize(field.label),
                        max
                    ),
                });
            }
            None
        }
        Kind::Bool => {
            if value.as_bool().is_none() {
                return type_issue(field);
            }
            None
        }
        Kind::OneOf(allowed) => {
            let s = match value.as_str() {
                Some(s) => s,
                None => return type_issue(field),
            };
            if !allowed.contains(&s) {
                return Some(Issue {
                    field: field.name,
                    message: format!("{} không hợp lệ.", capitalize(field.label)),
                });
            }
            None
        }
        Kind::Uuid => {
            let ok = value
                .as_str()
                .map_or(false, |s| uuid::Uuid::parse_str(s).is_ok());
            if !ok {
                return Some(Issue {
                    field: field.name,
                    message: format!("{} không hợp lệ.", capitalize(field.label)),
                });
            }
            None
        }
    }
}

fn type_issue(field: &Field) -> Option<Issue> {
    Some(Issue {
        field: field.name,
        message: format!("{} không đúng định dạng.", capitalize(field.label)),
    })
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Structural check only; deliverability is not our problem.
fn looks_like_email(s: &str) -> bool {
    if s.len() > 254 || s.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = s.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
