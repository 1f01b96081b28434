use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
///
/// Object `data` is merged into the JSON response; anything else lands under `data`.
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_body(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

fn success_body(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    match data {
        Some(Value::Object(fields)) => {
            if let Value::Object(body) = &mut response {
                body.extend(fields);
            }
        }
        Some(other) => response["data"] = other,
        None => {}
    }
    response
}
