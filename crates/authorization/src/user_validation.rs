//! Syntactic checks applied to ordinary user and group names.

const NAME_MAY_NOT_BE: &[&str] = &[".", ".."];
const NAME_MAY_NOT_CONTAIN: &[&str] = &["/", "%"];

/// Checks done on every name that ends up as a segment of a REST path.
fn validate_path_segment_name(name: &str) -> Vec<String> {
    if let Some(illegal) = NAME_MAY_NOT_BE.iter().find(|illegal| name == **illegal) {
        return vec![format!("may not be '{illegal}'")];
    }

    NAME_MAY_NOT_CONTAIN
        .iter()
        .filter(|illegal| name.contains(**illegal))
        .map(|illegal| format!("may not contain '{illegal}'"))
        .collect()
}

fn validate_identity_name(name: &str) -> Vec<String> {
    if name.is_empty() {
        return vec!["may not be empty".to_string()];
    }
    let reasons = validate_path_segment_name(name);
    if !reasons.is_empty() {
        return reasons;
    }
    if name.contains(':') {
        return vec![r#"may not contain ":""#.to_string()];
    }
    if name == "~" {
        return vec![r#"may not equal "~""#.to_string()];
    }
    Vec::new()
}

/// Returns the reasons why `name` is not a valid user name. An empty list
/// means the name is valid.
pub fn validate_user_name(name: &str) -> Vec<String> {
    validate_identity_name(name)
}

/// Returns the reasons why `name` is not a valid group name. An empty list
/// means the name is valid.
pub fn validate_group_name(name: &str) -> Vec<String> {
    let mut reasons = validate_identity_name(name);
    if reasons.is_empty() && name != name.trim() {
        reasons.push("may not contain leading or trailing whitespace".to_string());
    }
    reasons
}

pub fn is_valid_user_name(name: &str) -> bool {
    validate_user_name(name).is_empty()
}

pub fn is_valid_group_name(name: &str) -> bool {
    validate_group_name(name).is_empty()
}
