//! Request validation rules, applied in full before any network I/O.
//!
//! Validation short-circuits on the first violation; every failure names the
//! parameter, the violated bound and the offending value, and none of them
//! should ever be retried.

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::model::{Content, ContentPart, Message, Request, Stop, ToolChoice, ToolSpec};

const TOOL_CHOICE_MODES: [&str; 2] = ["auto", "none"];
const REASONING_EFFORTS: [&str; 3] = ["low", "medium", "high"];
const ACCEPTED_IMAGE_SUBTYPES: [&str; 4] = ["jpeg", "png", "gif", "webp"];
const MAX_STOP_SEQUENCES: usize = 4;

/// Check every backend-independent rule on a request.
pub fn validate_request(request: &Request) -> Result<()> {
    validate_messages(&request.messages)?;
    validate_tools(request.tools.as_deref(), request.tool_choice.as_ref())?;
    validate_ranges(request)?;

    if request.max_tokens.is_some() {
        // Deprecated but accepted; never an error.
        tracing::warn!("`max_tokens` is deprecated, prefer `max_completion_tokens`");
    }

    Ok(())
}

/// `reasoning_effort` rule, applied by adapters to reasoning-class models.
pub fn validate_reasoning_effort(effort: &str) -> Result<()> {
    if REASONING_EFFORTS.contains(&effort) {
        return Ok(());
    }
    Err(Error::Validation(format!(
        "reasoning_effort must be one of {}, got \"{effort}\"",
        REASONING_EFFORTS.iter().join(", ")
    )))
}

fn validate_messages(messages: &[Message]) -> Result<()> {
    if messages.is_empty() {
        return Err(Error::Validation("messages must not be empty".into()));
    }

    for message in messages {
        match &message.content {
            Content::Text(text) => {
                if text.is_empty() {
                    return Err(Error::Validation(format!(
                        "message content must not be empty (role {})",
                        message.role.as_str()
                    )));
                }
            }
            Content::Parts(parts) => {
                if parts.is_empty() {
                    return Err(Error::Validation(
                        "message content parts must not be empty".into(),
                    ));
                }
                if !parts
                    .iter()
                    .any(|part| matches!(part, ContentPart::Text { .. }))
                {
                    return Err(Error::Validation(
                        "message content parts must include at least one text part".into(),
                    ));
                }
                for part in parts {
                    if let ContentPart::ImageUrl { image_url } = part {
                        validate_image_url(&image_url.url)?;
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_image_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }

    if let Some(rest) = url.strip_prefix("data:") {
        let Some((mime, payload)) = rest.split_once(";base64,") else {
            return Err(Error::Validation(format!(
                "image data URI must be base64-encoded, got \"{url}\""
            )));
        };
        let subtype = mime.strip_prefix("image/").unwrap_or("");
        if !ACCEPTED_IMAGE_SUBTYPES.contains(&subtype) {
            return Err(Error::Validation(format!(
                "image data URI must use an image/{{{}}} media type, got \"{mime}\"",
                ACCEPTED_IMAGE_SUBTYPES.iter().join("|")
            )));
        }
        if payload.is_empty() {
            return Err(Error::Validation(
                "image data URI has an empty payload".into(),
            ));
        }
        return Ok(());
    }

    Err(Error::Validation(format!(
        "image url must be an http(s) URL or base64 data URI, got \"{url}\""
    )))
}

fn validate_tools(tools: Option<&[ToolSpec]>, tool_choice: Option<&ToolChoice>) -> Result<()> {
    let tools = tools.unwrap_or_default();

    if tool_choice.is_some() && tools.is_empty() {
        return Err(Error::Validation(
            "tool_choice requires a non-empty tools list".into(),
        ));
    }

    for tool in tools {
        if tool.kind != "function" {
            return Err(Error::Validation(format!(
                "tool type must be \"function\", got \"{}\"",
                tool.kind
            )));
        }
    }

    match tool_choice {
        None => {}
        Some(ToolChoice::Mode(mode)) => {
            if !TOOL_CHOICE_MODES.contains(&mode.as_str()) {
                return Err(Error::Validation(format!(
                    "tool_choice must be one of {} or a named function, got \"{mode}\"",
                    TOOL_CHOICE_MODES.iter().join(", ")
                )));
            }
        }
        Some(ToolChoice::Function { kind, function }) => {
            if kind != "function" {
                return Err(Error::Validation(format!(
                    "tool_choice type must be \"function\", got \"{kind}\""
                )));
            }
            if !tools.iter().any(|tool| tool.function.name == function.name) {
                return Err(Error::Validation(format!(
                    "tool_choice function \"{}\" not found in tools (available: {})",
                    function.name,
                    tools.iter().map(|tool| &tool.function.name).join(", ")
                )));
            }
        }
    }

    Ok(())
}

fn validate_ranges(request: &Request) -> Result<()> {
    check_range("temperature", request.temperature, 0.0, 2.0)?;
    check_range("top_p", request.top_p, 0.0, 1.0)?;
    check_range("frequency_penalty", request.frequency_penalty, -2.0, 2.0)?;
    check_range("presence_penalty", request.presence_penalty, -2.0, 2.0)?;

    if let Some(top_logprobs) = request.top_logprobs {
        if request.logprobs != Some(true) {
            return Err(Error::Validation(
                "top_logprobs requires logprobs to be enabled".into(),
            ));
        }
        if top_logprobs > 20 {
            return Err(Error::Validation(format!(
                "top_logprobs must be between 0 and 20, got {top_logprobs}"
            )));
        }
    }

    if let Some(logit_bias) = &request.logit_bias {
        for (token, bias) in logit_bias {
            if !(-100.0..=100.0).contains(bias) {
                return Err(Error::Validation(format!(
                    "logit_bias for token \"{token}\" must be between -100 and 100, got {bias}"
                )));
            }
        }
    }

    if let Some(Stop::Sequences(sequences)) = &request.stop {
        if sequences.len() > MAX_STOP_SEQUENCES {
            return Err(Error::Validation(format!(
                "stop accepts at most {MAX_STOP_SEQUENCES} sequences, got {}",
                sequences.len()
            )));
        }
    }

    Ok(())
}

fn check_range(name: &str, value: Option<f32>, min: f32, max: f32) -> Result<()> {
    match value {
        Some(value) if !(min..=max).contains(&value) => Err(Error::Validation(format!(
            "{name} must be between {min} and {max}, got {value}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FunctionSpec, Message};
    use std::collections::HashMap;

    fn request() -> Request {
        Request::new("openai/gpt-4o-mini", vec![Message::user("hi")])
    }

    fn weather_tool() -> ToolSpec {
        ToolSpec::function(FunctionSpec {
            name: "get_weather".into(),
            description: Some("Current weather for a city".into()),
            parameters: Some(serde_json::json!({"type": "object"})),
        })
    }

    fn violation(result: Result<()>) -> String {
        match result.unwrap_err() {
            Error::Validation(message) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_messages_rejected() {
        let request = Request::new("openai/gpt-4o-mini", vec![]);
        let message = violation(validate_request(&request));
        assert!(message.contains("messages must not be empty"), "{message}");
    }

    #[test]
    fn empty_text_content_rejected() {
        let request = Request::new("openai/gpt-4o-mini", vec![Message::user("")]);
        let message = violation(validate_request(&request));
        assert!(message.contains("must not be empty"), "{message}");
    }

    #[test]
    fn parts_require_a_text_part() {
        let request = Request::new(
            "openai/gpt-4o-mini",
            vec![Message::user_parts(vec![ContentPart::image_url(
                "https://example.com/cat.png",
            )])],
        );
        let message = violation(validate_request(&request));
        assert!(message.contains("at least one text part"), "{message}");
    }

    #[test]
    fn image_urls_must_be_http_or_data_uri() {
        let request = Request::new(
            "openai/gpt-4o-mini",
            vec![Message::user_parts(vec![
                ContentPart::text("look:"),
                ContentPart::image_url("ftp://example.com/cat.png"),
            ])],
        );
        let message = violation(validate_request(&request));
        assert!(message.contains("ftp://example.com/cat.png"), "{message}");
    }

    #[test]
    fn image_data_uri_subtypes() {
        for url in [
            "data:image/jpeg;base64,aGVsbG8=",
            "data:image/png;base64,aGVsbG8=",
            "data:image/gif;base64,aGVsbG8=",
            "data:image/webp;base64,aGVsbG8=",
        ] {
            let request = Request::new(
                "openai/gpt-4o-mini",
                vec![Message::user_parts(vec![
                    ContentPart::text("look:"),
                    ContentPart::image_url(url),
                ])],
            );
            assert!(validate_request(&request).is_ok(), "{url}");
        }

        let request = Request::new(
            "openai/gpt-4o-mini",
            vec![Message::user_parts(vec![
                ContentPart::text("look:"),
                ContentPart::image_url("data:image/tiff;base64,aGVsbG8="),
            ])],
        );
        let message = violation(validate_request(&request));
        assert!(message.contains("image/tiff"), "{message}");
    }

    #[test]
    fn tool_choice_without_tools_rejected() {
        let request = request().with_tool_choice(ToolChoice::auto());
        let message = violation(validate_request(&request));
        assert!(
            message.contains("tool_choice requires a non-empty tools list"),
            "{message}"
        );
    }

    #[test]
    fn tool_type_must_be_function() {
        let mut tool = weather_tool();
        tool.kind = "retrieval".into();
        let request = request().with_tools(vec![tool]);
        let message = violation(validate_request(&request));
        assert!(message.contains("retrieval"), "{message}");
    }

    #[test]
    fn tool_choice_function_must_exist() {
        let request = request()
            .with_tools(vec![weather_tool()])
            .with_tool_choice(ToolChoice::function("get_rain"));
        let message = violation(validate_request(&request));
        assert!(message.contains("get_rain"), "{message}");
        assert!(message.contains("not found in tools"), "{message}");
        assert!(message.contains("get_weather"), "{message}");
    }

    #[test]
    fn tool_choice_mode_strings_are_closed() {
        let request = request()
            .with_tools(vec![weather_tool()])
            .with_tool_choice(ToolChoice::Mode("required".into()));
        let message = violation(validate_request(&request));
        assert!(message.contains("required"), "{message}");
    }

    #[test]
    fn numeric_ranges_name_parameter_bound_and_value() {
        let message = violation(validate_request(&request().with_temperature(3.0)));
        assert!(message.contains("temperature"), "{message}");
        assert!(message.contains('2'), "{message}");
        assert!(message.contains('3'), "{message}");

        let message = violation(validate_request(&request().with_top_p(1.5)));
        assert!(message.contains("top_p"), "{message}");
        assert!(message.contains("1.5"), "{message}");

        let message = violation(validate_request(&request().with_frequency_penalty(-3.0)));
        assert!(message.contains("frequency_penalty"), "{message}");
        assert!(message.contains("-3"), "{message}");

        let message = violation(validate_request(&request().with_presence_penalty(2.5)));
        assert!(message.contains("presence_penalty"), "{message}");
    }

    #[test]
    fn top_logprobs_requires_logprobs() {
        let message = violation(validate_request(&request().with_top_logprobs(5)));
        assert!(message.contains("requires logprobs"), "{message}");

        let message = violation(validate_request(
            &request().with_logprobs(true).with_top_logprobs(21),
        ));
        assert!(message.contains("21"), "{message}");

        assert!(
            validate_request(&request().with_logprobs(true).with_top_logprobs(20)).is_ok()
        );
    }

    #[test]
    fn logit_bias_range() {
        let bias = HashMap::from([("123".to_string(), 250.0_f32)]);
        let message = violation(validate_request(&request().with_logit_bias(bias)));
        assert!(message.contains("250"), "{message}");
        assert!(message.contains("123"), "{message}");
    }

    #[test]
    fn stop_accepts_at_most_four_sequences() {
        let stop = Stop::Sequences(vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()]);
        let message = violation(validate_request(&request().with_stop(stop)));
        assert!(message.contains("at most 4"), "{message}");

        let stop = Stop::Sequences(vec!["a".into(), "b".into()]);
        assert!(validate_request(&request().with_stop(stop)).is_ok());
    }

    #[test]
    fn deprecated_max_tokens_is_accepted() {
        assert!(validate_request(&request().with_max_tokens(256)).is_ok());
    }

    #[test]
    fn reasoning_effort_values() {
        for effort in ["low", "medium", "high"] {
            assert!(validate_reasoning_effort(effort).is_ok());
        }
        let message = violation(validate_reasoning_effort("extreme"));
        assert!(message.contains("extreme"), "{message}");
        assert!(message.contains("low, medium, high"), "{message}");
    }
}
