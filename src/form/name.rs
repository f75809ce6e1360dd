//! Job name rules.

use std::sync::LazyLock;

use regex::Regex;

/// Longest accepted job name.
pub const MAX_NAME_LENGTH: usize = 63;

static VALID_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._][a-zA-Z0-9._ -]{0,62}$").expect("job name pattern compiles")
});
static INVALID_FIRST_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^a-zA-Z0-9._]").expect("first char pattern compiles"));
static INVALID_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9._ -]").expect("char class pattern compiles"));

/// Name used when nothing of the input survives sanitizing.
const FALLBACK_NAME: &str = "job";

pub fn name_is_valid(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

/// Why `name` is rejected, or an empty string when it is valid.
pub fn name_error(name: &str) -> String {
    if name_is_valid(name) {
        return String::new();
    }
    if name.is_empty() {
        return "You must specify a name".to_string();
    }
    if INVALID_FIRST_CHAR.is_match(name) {
        return "Name must start with a letter, number, period, or underscore".to_string();
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return format!("Name may not be longer than {MAX_NAME_LENGTH} characters");
    }
    "Name must contain only letters, numbers, spaces, periods, hyphens, and underscores".to_string()
}

/// Turn arbitrary text into a valid name: drop an invalid first character,
/// truncate, then strip invalid characters.
pub fn make_name_valid(name: &str) -> String {
    if name_is_valid(name) {
        return name.to_string();
    }

    let trimmed = if INVALID_FIRST_CHAR.is_match(name) {
        name.chars().skip(1).collect::<String>()
    } else {
        name.to_string()
    };
    let truncated: String = trimmed.chars().take(MAX_NAME_LENGTH).collect();
    let purged = INVALID_CHARS.replace_all(&truncated, "");
    // Purging can expose a space or hyphen at the front.
    let cleaned = purged.trim_start_matches([' ', '-']);

    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Default job name for an input file: its file name without the extension.
pub fn name_from_input_file(path: &str) -> String {
    let file = path.rsplit('/').next().unwrap_or(path);
    let stem = match file.rfind('.') {
        Some(dot) if dot > 0 => &file[..dot],
        _ => file,
    };
    make_name_valid(stem)
}
