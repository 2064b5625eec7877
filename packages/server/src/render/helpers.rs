//! Template helper filters.
//!
//! The fixed helper table registered on every compiled template set:
//! `str2html` (markup passthrough, chained with tera's `safe`), `date`
//! (timestamp or RFC 3339 string to a formatted date), and `digest` (md5
//! hex, as used for gravatar-style avatar URLs).

use std::collections::HashMap;

use chrono::{DateTime, Local, TimeZone};
use tera::{Tera, Value};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Registers the helper table on a compiled template set. Idempotent, so
/// the reload engine can call it after every rebuild.
pub fn register(tera: &mut Tera) {
    tera.register_filter("str2html", str2html);
    tera.register_filter("date", date);
    tera.register_filter("digest", digest);
}

/// Passthrough for values holding trusted markup. Templates chain it with
/// the built-in `safe` filter, which does the actual escape suppression:
/// `{{ body | str2html | safe }}`.
fn str2html(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(value.clone())
}

/// Formats a unix timestamp (local time) or an RFC 3339 string. The target
/// layout comes from the `format` argument, defaulting to
/// `%Y-%m-%d %H:%M:%S`.
fn date(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let format = args
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_DATE_FORMAT);

    let formatted = match value {
        Value::Number(number) => {
            let secs = number
                .as_i64()
                .ok_or_else(|| tera::Error::msg("date: timestamp out of range"))?;
            let datetime = Local
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| tera::Error::msg("date: invalid timestamp"))?;
            datetime.format(format).to_string()
        }
        Value::String(text) => {
            let datetime = DateTime::parse_from_rfc3339(text)
                .map_err(|err| tera::Error::msg(format!("date: {err}")))?;
            datetime.format(format).to_string()
        }
        _ => {
            return Err(tera::Error::msg(
                "date: expected a unix timestamp or an RFC 3339 string",
            ))
        }
    };
    Ok(Value::String(formatted))
}

/// Hex md5 digest of a string value.
fn digest(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("digest: expected a string"))?;
    Ok(Value::String(format!("{:x}", md5::compute(raw.as_bytes()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_args() -> HashMap<String, Value> {
        HashMap::new()
    }

    #[test]
    fn str2html_passes_value_through() {
        let value = Value::String("<b>bold</b>".to_string());
        assert_eq!(str2html(&value, &no_args()).unwrap(), value);
    }

    #[test]
    fn digest_matches_known_md5_vectors() {
        let hashed = digest(&Value::String("foo".to_string()), &no_args()).unwrap();
        assert_eq!(hashed, Value::String("acbd18db4cc2f85cedef654fccc4a4d8".to_string()));

        let empty = digest(&Value::String(String::new()), &no_args()).unwrap();
        assert_eq!(empty, Value::String("d41d8cd98f00b204e9800998ecf8427e".to_string()));
    }

    #[test]
    fn digest_rejects_non_string() {
        assert!(digest(&Value::Bool(true), &no_args()).is_err());
    }

    #[test]
    fn date_formats_rfc3339_string_with_custom_layout() {
        let mut args = HashMap::new();
        args.insert("format".to_string(), Value::String("%Y-%m-%d".to_string()));
        let formatted = date(&Value::String("2024-05-06T07:08:09Z".to_string()), &args).unwrap();
        assert_eq!(formatted, Value::String("2024-05-06".to_string()));
    }

    #[test]
    fn date_accepts_unix_timestamp() {
        // 2023-11-14T22:13:20Z: the same calendar year in every timezone.
        let mut args = HashMap::new();
        args.insert("format".to_string(), Value::String("%Y".to_string()));
        let formatted = date(&Value::Number(1_700_000_000.into()), &args).unwrap();
        assert_eq!(formatted, Value::String("2023".to_string()));
    }

    #[test]
    fn date_rejects_other_shapes() {
        assert!(date(&Value::Bool(false), &no_args()).is_err());
        assert!(date(&Value::String("not a date".to_string()), &no_args()).is_err());
    }

    #[test]
    fn register_is_idempotent() {
        let mut tera = Tera::default();
        register(&mut tera);
        register(&mut tera);
    }
}
