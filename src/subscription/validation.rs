use reqwest::Url;

use crate::model::SubscriptionRequest;
use crate::pattern;
use crate::utils::error::ValidationError;

const MAX_URL_LEN: usize = 500;
const MAX_SQUAD_LEN: usize = 100;
const MAX_TOPIC_LEN: usize = 200;
const MAX_EVENT_LEN: usize = 100;

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '#' | '*')
}

fn is_topic_char(c: char) -> bool {
    is_name_char(c) || c == ':'
}

fn check_text(
    field: &'static str,
    value: &str,
    max_len: usize,
    allowed: fn(char) -> bool,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::field(field, "must not be blank"));
    }
    if value.chars().count() > max_len {
        return Err(ValidationError::field(
            field,
            format!("must be at most {max_len} characters"),
        ));
    }
    if let Some(bad) = value.chars().find(|c| !allowed(*c)) {
        return Err(ValidationError::field(
            field,
            format!("contains unsupported character '{bad}'"),
        ));
    }
    pattern::validate(value)?;
    Ok(())
}

fn check_url(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::field("webhookUrl", "must not be blank"));
    }
    if value.len() > MAX_URL_LEN {
        return Err(ValidationError::field(
            "webhookUrl",
            format!("must be at most {MAX_URL_LEN} characters"),
        ));
    }
    let url = Url::parse(value)
        .map_err(|e| ValidationError::field("webhookUrl", format!("is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ValidationError::field(
            "webhookUrl",
            "must be an http or https URL with a host",
        ));
    }
    Ok(())
}

/// Field checks for a subscription request, including `#` placement in the
/// squad, topic and event patterns.
pub fn validate_request(request: &SubscriptionRequest) -> Result<(), ValidationError> {
    check_url(&request.webhook_url)?;
    check_text("squadName", &request.squad_name, MAX_SQUAD_LEN, is_name_char)?;
    check_text("topic", &request.topic, MAX_TOPIC_LEN, is_topic_char)?;
    check_text("eventName", &request.event_name, MAX_EVENT_LEN, is_name_char)?;
    Ok(())
}
