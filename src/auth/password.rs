use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{ApiError, FieldErrors};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Similarity ratio at which a password counts as derived from an attribute
const MAX_SIMILARITY: f64 = 0.7;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password12", "password123", "password1234", "passw0rd", "p@ssw0rd",
    "12345678", "123456789", "1234567890", "87654321", "11111111", "00000000", "qwertyuiop",
    "qwerty123", "qwerty12", "1q2w3e4r", "1qaz2wsx", "zaq12wsx", "abc12345", "abcd1234",
    "iloveyou", "sunshine", "princess", "football", "baseball", "welcome1", "welcome123",
    "whatever", "trustno1", "superman", "starwars", "letmein1", "letmein123", "dragon123",
    "monkey123", "michael1", "computer", "internet", "corvette", "mercedes", "master123",
    "admin123", "administrator", "changeme", "changeme123", "secret123", "default1",
    "asdfghjkl", "asdf1234", "zxcvbnm1", "q1w2e3r4", "aa123456", "qazwsxedc", "1password",
    "jennifer", "michelle", "jordan23", "hunter22", "shadow12", "batman123", "liverpool",
    "chelsea1", "arsenal1", "samsung1", "google123", "freedom1", "summer2024", "winter2024",
];

/// Hash with bcrypt at the default cost
pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    hash(plain, DEFAULT_COST).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        ApiError::internal_server_error("Failed to process password")
    })
}

/// Constant-time bcrypt check; malformed hashes never match
pub fn verify_password(plain: &str, password_hash: &str) -> bool {
    verify(plain, password_hash).unwrap_or(false)
}

/// Strength rules for new passwords. Returns every violated rule.
pub fn password_problems(password: &str, username: &str, email: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if COMMON_PASSWORDS.contains(&password.trim().to_lowercase().as_str()) {
        problems.push("This password is too common.".to_string());
    }
    if let Some(attribute) = similar_attribute(password, &[("username", username), ("email address", email)]) {
        problems.push(format!("The password is too similar to the {}.", attribute));
    }

    problems
}

/// Validate and report violations as a `password` field error
pub fn validate_new_password(password: &str, username: &str, email: &str) -> Result<(), ApiError> {
    let problems = password_problems(password, username, email);
    if problems.is_empty() {
        return Ok(());
    }
    let mut field_errors = FieldErrors::new();
    field_errors.insert("password".to_string(), problems.join(" "));
    Err(ApiError::validation_error(problems.join(" "), Some(field_errors)))
}

fn similar_attribute<'a>(password: &str, attributes: &[(&'a str, &str)]) -> Option<&'a str> {
    let password = password.to_lowercase();
    for (name, value) in attributes {
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            continue;
        }
        let mut parts: Vec<&str> = value.split(|c: char| !c.is_alphanumeric()).filter(|p| !p.is_empty()).collect();
        parts.push(&value);
        if parts.iter().any(|part| similarity(&password, part) >= MAX_SIMILARITY) {
            return Some(name);
        }
    }
    None
}

/// Ratio of matched characters, 2*M / (len(a) + len(b)), where M sums the
/// longest common blocks found recursively on either side of each match.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f64 / total as f64
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matched_chars(&a[..start_a], &b[..start_b]) + matched_chars(&a[start_a + len..], &b[start_b + len..])
}

fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let mut row = vec![0usize; b.len() + 1];
        for j in 0..b.len() {
            if a[i] == b[j] {
                row[j + 1] = prev[j] + 1;
                if row[j + 1] > best.2 {
                    best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
                }
            }
        }
        prev = row;
    }
    best
}
