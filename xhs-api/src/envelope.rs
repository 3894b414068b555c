//! Response envelope.
//!
//! Every endpoint wraps its payload the same way:
//!
//! ```json
//! {
//!   "success": true,
//!   "code": 0,
//!   "msg": "成功",
//!   "data": { ...endpoint-specific payload... }
//! }
//! ```
//!
//! `success` defaults to `true` and `code` to `0` when absent. An envelope
//! with `success == false` or a non-zero `code` is an error, classified by
//! code:
//!
//! | Code | Error |
//! |------|-------|
//! | `10001`, `10002` | [`XhsError::Auth`] |
//! | `10003` | [`XhsError::RateLimited`] |
//! | other | [`XhsError::Api`] |

use crate::error::{Result, XhsError};
use serde_json::Value;
use std::time::Duration;

pub(crate) const AUTH_CODES: [i64; 2] = [10001, 10002];
pub(crate) const RATE_LIMIT_CODE: i64 = 10003;

const BODY_PREVIEW_CHARS: usize = 200;

/// Parse `body` and return the payload of a successful envelope.
///
/// Returns `data` verbatim, or the whole envelope if `data` is absent or
/// null. `rate_limit_backoff` becomes the advised wait of a
/// [`XhsError::RateLimited`].
pub fn unwrap(status: u16, body: &str, rate_limit_backoff: Duration) -> Result<Value> {
    let json: Value = serde_json::from_str(body).map_err(|_| malformed(status, body))?;
    if !json.is_object() {
        return Err(malformed(status, body));
    }

    let success = json.get("success").and_then(Value::as_bool).unwrap_or(true);
    let code = json.get("code").and_then(Value::as_i64).unwrap_or(0);

    if !success || code != 0 {
        let message = json
            .get("msg")
            .or_else(|| json.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_owned();
        return Err(classify(code, message, json, rate_limit_backoff));
    }

    match json.get("data") {
        Some(data) if !data.is_null() => Ok(data.clone()),
        _ => Ok(json),
    }
}

fn classify(code: i64, message: String, envelope: Value, backoff: Duration) -> XhsError {
    if AUTH_CODES.contains(&code) {
        XhsError::Auth { code, message }
    } else if code == RATE_LIMIT_CODE {
        XhsError::RateLimited {
            message,
            retry_after: backoff,
        }
    } else {
        XhsError::Api {
            code,
            message,
            response: Box::new(envelope),
        }
    }
}

fn malformed(status: u16, body: &str) -> XhsError {
    XhsError::MalformedResponse {
        status,
        body: body.chars().take(BODY_PREVIEW_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BACKOFF: Duration = Duration::from_secs(60);

    fn run(v: &Value) -> Result<Value> {
        unwrap(200, &v.to_string(), BACKOFF)
    }

    #[test]
    fn success_returns_data() {
        let out = run(&json!({"success": true, "code": 0, "data": {"a": 1}})).unwrap();
        assert_eq!(out, json!({"a": 1}));
    }

    #[test]
    fn missing_data_returns_envelope() {
        let env = json!({"success": true, "items": []});
        assert_eq!(run(&env).unwrap(), env);
        let env = json!({"code": 0, "data": null});
        assert_eq!(run(&env).unwrap(), env);
    }

    #[test]
    fn auth_codes() {
        for code in AUTH_CODES {
            let err = run(&json!({"success": false, "code": code, "msg": "登录已过期"})).unwrap_err();
            assert!(matches!(err, XhsError::Auth { code: c, ref message } if c == code && message == "登录已过期"));
        }
    }

    #[test]
    fn rate_limit_carries_backoff() {
        let err = run(&json!({"success": false, "code": 10003})).unwrap_err();
        match err {
            XhsError::RateLimited {
                message,
                retry_after,
            } => {
                assert_eq!(message, "unknown error");
                assert_eq!(retry_after, BACKOFF);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn generic_api_error_keeps_envelope() {
        let env = json!({"code": 300013, "message": "访问频次异常"});
        match run(&env).unwrap_err() {
            XhsError::Api {
                code,
                message,
                response,
            } => {
                assert_eq!(code, 300_013);
                assert_eq!(message, "访问频次异常");
                assert_eq!(*response, env);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn success_false_with_zero_code_is_error() {
        assert!(matches!(
            run(&json!({"success": false, "code": 0})),
            Err(XhsError::Api { code: 0, .. })
        ));
    }

    #[test]
    fn non_json_and_non_object_are_malformed() {
        let long = "<html>".repeat(100);
        match unwrap(461, &long, BACKOFF).unwrap_err() {
            XhsError::MalformedResponse { status, body } => {
                assert_eq!(status, 461);
                assert_eq!(body.chars().count(), 200);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            unwrap(200, "[1,2]", BACKOFF),
            Err(XhsError::MalformedResponse { .. })
        ));
    }
}
