//! JSON output for one-shot commands
//!
//! - Output: a single JSON object per command, one line
//! - Success: `{"status":"ok","data":...}`
//! - Failure: `{"status":"error","code":...,"message":...}`, plus
//!   `"details"` when the error carries any

use std::io::Write;

use serde_json::Value;

use super::errors::CliResult;

/// Write a success response
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(out, &response)
}

/// Write an error response
pub fn write_error<W: Write>(
    out: &mut W,
    code: &str,
    message: &str,
    details: Option<&str>,
) -> CliResult<()> {
    let mut response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    if let Some(details) = details {
        response["details"] = Value::from(details);
    }
    write_line(out, &response)
}

fn write_line<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_shape() {
        let mut out = Vec::new();
        write_response(&mut out, serde_json::json!({"count": 2})).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["data"]["count"], 2);
    }

    #[test]
    fn test_error_shape() {
        let mut out = Vec::new();
        write_error(&mut out, "ROLLBOOK_NOT_FOUND", "No student record with ID S9 exists", None)
            .unwrap();

        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["status"], "error");
        assert_eq!(parsed["code"], "ROLLBOOK_NOT_FOUND");
        assert!(parsed.get("details").is_none());
    }

    #[test]
    fn test_error_details_included() {
        let mut out = Vec::new();
        write_error(&mut out, "ROLLBOOK_CORRUPT_STORE", "bad size", Some("byte_offset: 204"))
            .unwrap();

        let parsed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["details"], "byte_offset: 204");
    }
}
