//! Built-in tools that need nothing but the standard environment.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;

use super::{ToolError, ToolHandler, tool_fn};
use crate::provider::{JsonSchema, ToolDefinition};

#[derive(Debug, Default, Deserialize)]
struct TimeArgs {
    #[serde(default)]
    timezone: String,
}

/// `get_current_time`: the current date and time in a timezone.
///
/// Accepts an IANA name (`{"timezone": "Europe/Paris"}`), `"UTC"`, or an
/// offset such as `"+05:30"`, `"-0800"` or `"UTC+2"`. An empty timezone
/// means UTC.
pub fn current_time() -> impl ToolHandler {
    tool_fn(
        ToolDefinition {
            name: "get_current_time".into(),
            description: "Get the current date and time, optionally in a given timezone".into(),
            parameters: JsonSchema::new(json!({
                "type": "object",
                "properties": {
                    "timezone": {
                        "type": "string",
                        "description": "IANA timezone like Europe/Paris, UTC, or an offset like +05:30"
                    }
                }
            })),
        },
        |arguments: String| std::future::ready(describe_now(&arguments, Utc::now())),
    )
}

fn describe_now(arguments: &str, now: DateTime<Utc>) -> Result<String, ToolError> {
    let args: TimeArgs = if arguments.trim().is_empty() {
        TimeArgs::default()
    } else {
        serde_json::from_str(arguments)?
    };
    let local = local_time(&args.timezone, now)
        .ok_or_else(|| ToolError::new(format!("unsupported timezone: {}", args.timezone)))?;

    let body = json!({
        "current_time": local.to_rfc3339(),
        "timezone": if args.timezone.is_empty() { "UTC" } else { args.timezone.as_str() },
        "year": local.year(),
        "month": local.month(),
        "day": local.day(),
        "hour": local.hour(),
        "minute": local.minute(),
        "second": local.second(),
        "weekday": local.format("%A").to_string(),
    });
    Ok(body.to_string())
}

/// `now` seen from `zone`: a tz database name first, then a fixed offset.
fn local_time(zone: &str, now: DateTime<Utc>) -> Option<DateTime<FixedOffset>> {
    let zone = zone.trim();
    if let Ok(tz) = zone.parse::<Tz>() {
        return Some(now.with_timezone(&tz).fixed_offset());
    }
    parse_offset(zone).map(|offset| now.with_timezone(&offset))
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    let rest = zone
        .strip_prefix("UTC")
        .or_else(|| zone.strip_prefix("GMT"))
        .unwrap_or(zone);
    if rest.is_empty() || rest == "Z" {
        return FixedOffset::east_opt(0);
    }

    let (sign, digits) = match rest.as_bytes()[0] {
        b'+' => (1, &rest[1..]),
        b'-' => (-1, &rest[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = if digits.len() <= 2 {
        (digits.parse::<i32>().ok()?, 0)
    } else {
        let split = digits.len() - 2;
        (digits[..split].parse::<i32>().ok()?, digits[split..].parse::<i32>().ok()?)
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
