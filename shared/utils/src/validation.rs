use crate::error::{PlatebookError, PlatebookResult};
use platebook_models::{is_well_formed, Volume};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use validator::{Validate, ValidationErrors};

pub fn validate_model<T: Validate>(model: &T) -> PlatebookResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(PlatebookError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match &error.code {
                std::borrow::Cow::Borrowed("url") => {
                    format!("Invalid URL format for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("length") => {
                    format!("Length validation failed for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("range") => {
                    format!("Value out of range for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("identifier_naming_convention") => {
                    "Identifier does not match the naming convention".to_string()
                }
                std::borrow::Cow::Borrowed("working_range_unordered") => {
                    "Working volume range minimum exceeds maximum".to_string()
                }
                _ => format!("Validation failed for field '{}': {}", field, error.code),
            };
            messages.push(message);
        }
    }

    messages.join(", ")
}

/// Validate a PLR definition identifier against the naming convention.
pub fn validate_identifier(identifier: &str) -> PlatebookResult<()> {
    if identifier.trim().is_empty() {
        return Err(PlatebookError::validation(
            "identifier",
            "Identifier is empty",
        ));
    }

    if !is_well_formed(identifier) {
        return Err(PlatebookError::validation(
            "identifier",
            format!(
                "'{}' does not match <Vendor>_<wells>_wellplate_<volume><unit>_<bottom>",
                identifier
            ),
        ));
    }

    Ok(())
}

pub fn validate_manufacturer_url(url: &str) -> PlatebookResult<()> {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let url_regex = URL_REGEX.get_or_init(|| Regex::new(r"^https?://\S+$").unwrap());

    if !url_regex.is_match(url) {
        return Err(PlatebookError::validation(
            "manufacturer_url",
            "Expected an absolute http(s) URL",
        ));
    }

    Ok(())
}

pub fn validate_volume_cell(cell: &str) -> PlatebookResult<Volume> {
    Volume::parse(cell)
        .map_err(|e| PlatebookError::validation("volume", e.to_string()))
}

pub fn validate_file_type(file_name: &str, allowed_types: &[&str]) -> PlatebookResult<()> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    if !allowed_types.contains(&extension.to_lowercase().as_str()) {
        return Err(PlatebookError::validation(
            "file_type",
            format!(
                "File type '{}' not allowed. Allowed types: {}",
                extension,
                allowed_types.join(", ")
            ),
        ));
    }

    Ok(())
}

pub fn validate_required_fields<T>(
    data: &HashMap<String, T>,
    required_fields: &[&str],
) -> PlatebookResult<()> {
    let missing_fields: Vec<&str> = required_fields
        .iter()
        .filter(|field| !data.contains_key(**field))
        .copied()
        .collect();

    if !missing_fields.is_empty() {
        return Err(PlatebookError::validation(
            "required_fields",
            format!("Missing required fields: {}", missing_fields.join(", ")),
        ));
    }

    Ok(())
}
