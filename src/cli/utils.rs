use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// `{"success": true, "message": ...}` merged with the fields of `data`
pub fn success_json(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
        target.extend(extra);
    }
    response
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_json(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Progress line; JSON output stays a single document so these are text only
pub fn output_progress(output_format: &OutputFormat, line: &str) {
    if *output_format == OutputFormat::Text {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_json_merges_object_data() {
        let value = success_json("done", Some(json!({ "created": 3 })));
        assert_eq!(value, json!({ "success": true, "message": "done", "created": 3 }));
    }

    #[test]
    fn success_json_ignores_non_object_data() {
        let value = success_json("done", Some(json!([1, 2])));
        assert_eq!(value, json!({ "success": true, "message": "done" }));
    }
}
