use actix_web::{web, HttpResponse};
use serde::Serialize;
use thiserror::Error;
use url::form_urlencoded;

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("{0} is required.")]
    MissingField(&'static str),
    #[error("{0} must be a number.")]
    InvalidNumber(&'static str),
    #[error("Unknown impact level '{0}'.")]
    InvalidImpact(String),
    #[error("The form is not open.")]
    NotOpen,
}

/// Which shape a create-or-edit form is in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FormMode {
    Closed,
    Creating,
    Editing { id: String },
}

impl FormMode {
    /// Rebuilds the mode from a submitted hidden `editing_id` field.
    pub fn from_editing_id(editing_id: Option<&str>) -> Self {
        match editing_id.map(str::trim) {
            Some(id) if !id.is_empty() => FormMode::Editing { id: id.to_string() },
            _ => FormMode::Creating,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, FormMode::Closed)
    }
}

pub fn require(value: &str, field: &'static str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        Err(FormError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Blank input counts as zero; there is no range check.
pub fn coerce_f64(raw: &str, field: &'static str) -> Result<f64, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(FormError::InvalidNumber(field)),
    }
}

/// Like [`coerce_f64`] but the value must be a whole number.
pub fn coerce_i64(raw: &str, field: &'static str) -> Result<i64, FormError> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(n);
    }
    let n = coerce_f64(raw, field)?;
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Ok(n as i64)
    } else {
        Err(FormError::InvalidNumber(field))
    }
}

/// URL-encoded form fields in submission order. Repeated keys (such as the
/// highlight inputs) are all kept.
#[derive(Debug, Default, Clone)]
pub struct ParsedForm {
    pairs: Vec<(String, String)>,
}

impl ParsedForm {
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        ParsedForm {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }
}

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors gracefully.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<ParsedForm, HttpResponse> {
    let body = match String::from_utf8(form_bytes.to_vec()) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(ParsedForm::from_pairs(form_urlencoded::parse(body.as_bytes()).into_owned()))
}
