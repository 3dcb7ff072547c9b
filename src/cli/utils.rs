use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(object), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print an API payload: raw JSON, or `key: value` lines for objects
pub fn output_data(output_format: &OutputFormat, data: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => print_text(data, 0),
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ collection_name: [] }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Announce badges unlocked by a logged session (`data.new_badges`)
pub fn output_new_badges(output_format: &OutputFormat, data: &Value) {
    if !matches!(output_format, OutputFormat::Text) {
        return;
    }
    let Some(badges) = data.get("new_badges").and_then(Value::as_array) else {
        return;
    };
    for badge in badges {
        let icon = badge.get("icon").and_then(Value::as_str).unwrap_or("🏅");
        let slug = badge.get("slug").and_then(Value::as_str).unwrap_or("badge");
        println!("{} New badge unlocked: {}", icon, slug);
    }
}

fn print_text(value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                match v {
                    Value::Object(_) | Value::Array(_) => {
                        println!("{}{}:", pad, key);
                        print_text(v, indent + 1);
                    }
                    _ => println!("{}{}: {}", pad, key, scalar(v)),
                }
            }
        }
        Value::Array(items) if items.is_empty() => println!("{}(none)", pad),
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 && item.is_object() {
                    println!();
                }
                match item {
                    Value::Object(_) | Value::Array(_) => print_text(item, indent),
                    _ => println!("{}- {}", pad, scalar(item)),
                }
            }
        }
        _ => println!("{}{}", pad, scalar(value)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_render_plainly() {
        assert_eq!(scalar(&json!("fr")), "fr");
        assert_eq!(scalar(&json!(null)), "-");
        assert_eq!(scalar(&json!(7.5)), "7.5");
    }
}
