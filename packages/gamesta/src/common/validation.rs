//! Client-side input validation and sanitization.
//!
//! Everything here runs before a network call. Field validators return the
//! normalized value on success and a user-facing message on failure; the
//! form layer collects those into field -> message maps.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

lazy_static! {
    // RFC 5322, simplified
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();

    static ref HTML_TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();

    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();

    static ref SPECIAL_CHAR_REGEX: Regex = Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).unwrap();
}

const COMMON_PASSWORDS: &[&str] = &["password", "123456", "password123", "admin", "qwerty", "letmein"];

const RESERVED_USERNAMES: &[&str] = &[
    "admin", "root", "user", "test", "api", "www", "mail", "ftp", "gamesta", "mitaoe",
];

const INAPPROPRIATE_WORDS: &[&str] = &["spam", "scam", "hack", "cheat", "exploit"];

/// Field -> message map for a rejected form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub BTreeMap<String, String>);

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.to_string(), message.into());
        Self(map)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

/// Length and labelling rules for free-text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRules {
    pub min_length: usize,
    pub max_length: usize,
    pub field_name: &'static str,
}

impl Default for ContentRules {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 1000,
            field_name: "Content",
        }
    }
}

/// Remove HTML tags.
pub fn strip_html(input: &str) -> String {
    HTML_TAG_REGEX.replace_all(input, "").into_owned()
}

/// Escape HTML special characters so text renders literally.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Accept only absolute http(s) URLs; returns the normalized form.
pub fn sanitize_url(input: &str) -> Option<String> {
    let parsed = url::Url::parse(input.trim()).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed.to_string()),
        _ => None,
    }
}

/// Returns the trimmed, lowercased address.
pub fn validate_email(email: &str) -> Result<String, String> {
    let trimmed = email.trim().to_lowercase();

    if trimmed.is_empty() {
        return Err("Email is required".into());
    }
    if trimmed.len() > 254 {
        return Err("Email is too long".into());
    }
    if !EMAIL_REGEX.is_match(&trimmed) {
        return Err("Please enter a valid email address".into());
    }
    Ok(trimmed)
}

pub fn validate_password(password: &str) -> Result<PasswordStrength, String> {
    let length = password.chars().count();

    if password.is_empty() {
        return Err("Password is required".into());
    }
    if length < 6 {
        return Err("Password must be at least 6 characters long".into());
    }
    if length > 128 {
        return Err("Password is too long".into());
    }
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        return Err("Please choose a stronger password".into());
    }

    let criteria = [
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        SPECIAL_CHAR_REGEX.is_match(password),
    ]
    .iter()
    .filter(|met| **met)
    .count();

    let strength = if length >= 8 && criteria >= 3 {
        PasswordStrength::Strong
    } else if criteria >= 2 {
        PasswordStrength::Medium
    } else {
        PasswordStrength::Weak
    };
    Ok(strength)
}

/// Returns the trimmed username.
pub fn validate_username(username: &str) -> Result<String, String> {
    let trimmed = username.trim();
    let length = trimmed.chars().count();

    if trimmed.is_empty() {
        return Err("Username is required".into());
    }
    if length < 3 {
        return Err("Username must be at least 3 characters long".into());
    }
    if length > 30 {
        return Err("Username must be less than 30 characters".into());
    }
    if !USERNAME_REGEX.is_match(trimmed) {
        return Err(
            "Username can only contain letters, numbers, underscores, and hyphens".into(),
        );
    }
    if trimmed.starts_with(['_', '-']) || trimmed.ends_with(['_', '-']) {
        return Err("Username cannot start or end with underscore or hyphen".into());
    }
    if RESERVED_USERNAMES.contains(&trimmed.to_lowercase().as_str()) {
        return Err("This username is reserved".into());
    }
    Ok(trimmed.to_string())
}

/// Returns the sanitized text: tags stripped, whitespace collapsed.
pub fn validate_content(content: &str, rules: &ContentRules) -> Result<String, String> {
    let stripped = strip_html(content.trim());
    let sanitized = WHITESPACE_REGEX.replace_all(&stripped, " ").trim().to_string();
    let length = sanitized.chars().count();

    if sanitized.is_empty() && rules.min_length > 0 {
        return Err(format!("{} is required", rules.field_name));
    }
    if length < rules.min_length {
        return Err(format!(
            "{} must be at least {} characters long",
            rules.field_name, rules.min_length
        ));
    }
    if length > rules.max_length {
        return Err(format!(
            "{} must be less than {} characters",
            rules.field_name, rules.max_length
        ));
    }

    let lower = sanitized.to_lowercase();
    if INAPPROPRIATE_WORDS.iter().any(|word| lower.contains(word)) {
        return Err("Content contains inappropriate language".into());
    }
    Ok(sanitized)
}

/// Metadata of a file selected for upload.
#[derive(Debug, Clone)]
pub struct FileMeta<'a> {
    pub name: &'a str,
    pub size: u64,
    pub mime_type: &'a str,
}

pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Image upload check: size, mime type, extension.
pub fn validate_file(file: &FileMeta<'_>) -> Result<(), String> {
    if file.size > MAX_UPLOAD_BYTES {
        return Err(format!(
            "File size must be less than {}MB",
            MAX_UPLOAD_BYTES / 1024 / 1024
        ));
    }
    if !ALLOWED_IMAGE_TYPES.contains(&file.mime_type) {
        return Err("File type not allowed".into());
    }
    let extension = file
        .name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err("File extension not allowed".into());
    }
    Ok(())
}

// ============================================================================
// Form validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    Email,
    Password,
    /// Non-empty only; used where strength rules would lock out existing accounts.
    PasswordPresent,
    Username,
    Content(ContentRules),
    /// Optional; blank is accepted and omitted from the output.
    Url,
}

/// Collected result of validating a whole form.
#[derive(Debug, Clone, Default)]
pub struct FormValidation {
    pub errors: BTreeMap<String, String>,
    pub warnings: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Normalized values on success.
    pub fn into_result(self) -> Result<BTreeMap<String, String>, ValidationErrors> {
        if self.is_valid() {
            Ok(self.data)
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Apply `rules` to the named `fields`. Missing fields validate as empty.
pub fn validate_form(fields: &[(&str, &str)], rules: &[(&str, FieldRule)]) -> FormValidation {
    let mut result = FormValidation::default();

    for (field, rule) in rules {
        let value = fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| *v)
            .unwrap_or("");
        let key = field.to_string();

        let outcome = match rule {
            FieldRule::Email => validate_email(value).map(Some),
            FieldRule::Password => validate_password(value).map(|strength| {
                if strength == PasswordStrength::Weak {
                    result
                        .warnings
                        .insert(key.clone(), "Consider using a stronger password".into());
                }
                Some(value.to_string())
            }),
            FieldRule::PasswordPresent => {
                if value.is_empty() {
                    Err("Password is required".to_string())
                } else {
                    Ok(Some(value.to_string()))
                }
            }
            FieldRule::Username => validate_username(value).map(Some),
            FieldRule::Content(content_rules) => validate_content(value, content_rules).map(Some),
            FieldRule::Url => {
                if value.trim().is_empty() {
                    Ok(None)
                } else {
                    sanitize_url(value)
                        .map(Some)
                        .ok_or_else(|| "Please enter a valid URL".to_string())
                }
            }
        };

        match outcome {
            Ok(Some(normalized)) => {
                result.data.insert(key, normalized);
            }
            Ok(None) => {}
            Err(message) => {
                result.errors.insert(key, message);
            }
        }
    }

    result
}

/// Predefined rule sets for the application's forms.
pub mod rules {
    use super::{ContentRules, FieldRule};

    pub fn login() -> Vec<(&'static str, FieldRule)> {
        vec![("email", FieldRule::Email), ("password", FieldRule::PasswordPresent)]
    }

    pub fn register() -> Vec<(&'static str, FieldRule)> {
        vec![
            ("email", FieldRule::Email),
            ("password", FieldRule::Password),
            ("username", FieldRule::Username),
        ]
    }

    pub fn idea_submission() -> Vec<(&'static str, FieldRule)> {
        vec![
            (
                "title",
                FieldRule::Content(ContentRules {
                    min_length: 5,
                    max_length: 100,
                    field_name: "Title",
                }),
            ),
            (
                "description",
                FieldRule::Content(ContentRules {
                    min_length: 10,
                    max_length: 1000,
                    field_name: "Description",
                }),
            ),
        ]
    }

    pub fn profile_update() -> Vec<(&'static str, FieldRule)> {
        vec![
            ("username", FieldRule::Username),
            (
                "bio",
                FieldRule::Content(ContentRules {
                    min_length: 0,
                    max_length: 500,
                    field_name: "Bio",
                }),
            ),
        ]
    }

    pub fn comment() -> Vec<(&'static str, FieldRule)> {
        vec![(
            "content",
            FieldRule::Content(ContentRules {
                min_length: 1,
                max_length: 1000,
                field_name: "Comment",
            }),
        )]
    }
}

// ============================================================================
// Rate limiting
// ============================================================================

/// Sliding-window attempt counter keyed by an arbitrary string.
#[derive(Debug, Default)]
pub struct RateLimiter {
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt if fewer than `max_attempts` happened within `window`.
    /// Keys with no attempts left inside `window` are dropped.
    pub fn is_allowed(&self, key: &str, max_attempts: usize, window: Duration) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        attempts.retain(|_, times| {
            times.retain(|t| now.duration_since(*t) < window);
            !times.is_empty()
        });
        let entry = attempts.entry(key.to_string()).or_default();

        if entry.len() >= max_attempts {
            return false;
        }
        entry.push(now);
        true
    }

    /// Time until the oldest attempt in the window expires.
    pub fn remaining(&self, key: &str, window: Duration) -> Duration {
        let attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        attempts
            .get(key)
            .and_then(|entry| entry.iter().min())
            .map(|oldest| window.saturating_sub(oldest.elapsed()))
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(
            validate_email("  Player.One@MITAOE.ac.in ").unwrap(),
            "player.one@mitaoe.ac.in"
        );
    }

    #[test]
    fn test_email_rejections() {
        assert_eq!(validate_email("   ").unwrap_err(), "Email is required");
        assert_eq!(
            validate_email("not-an-email").unwrap_err(),
            "Please enter a valid email address"
        );
        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email(&long).unwrap_err(), "Email is too long");
    }

    #[test]
    fn test_password_rules_and_strength() {
        assert!(validate_password("").is_err());
        assert!(validate_password("abc").is_err());
        assert_eq!(
            validate_password("Password").unwrap_err(),
            "Please choose a stronger password"
        );
        assert_eq!(validate_password("abcdefg").unwrap(), PasswordStrength::Weak);
        assert_eq!(validate_password("abc123").unwrap(), PasswordStrength::Medium);
        assert_eq!(validate_password("Abcdef12!").unwrap(), PasswordStrength::Strong);
        // Strong needs 8+ characters
        assert!(validate_password("Ab1!x").is_err());
        assert_eq!(validate_password("Ab1!xy").unwrap(), PasswordStrength::Medium);
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("  speedrunner ").unwrap(), "speedrunner");
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("_leading").is_err());
        assert!(validate_username("trailing-").is_err());
        assert_eq!(
            validate_username("Admin").unwrap_err(),
            "This username is reserved"
        );
    }

    #[test]
    fn test_content_is_sanitized() {
        let rules = ContentRules {
            min_length: 5,
            max_length: 100,
            field_name: "Title",
        };
        assert_eq!(
            validate_content("  <b>Valorant</b>   Night\n\nCup ", &rules).unwrap(),
            "Valorant Night Cup"
        );
        assert_eq!(
            validate_content("<i></i>", &rules).unwrap_err(),
            "Title is required"
        );
        assert_eq!(
            validate_content("Cup", &rules).unwrap_err(),
            "Title must be at least 5 characters long"
        );
        assert_eq!(
            validate_content("Free SPAM giveaway", &rules).unwrap_err(),
            "Content contains inappropriate language"
        );
    }

    #[test]
    fn test_optional_content_may_be_empty() {
        let rules = ContentRules {
            min_length: 0,
            max_length: 500,
            field_name: "Bio",
        };
        assert_eq!(validate_content("", &rules).unwrap(), "");
    }

    #[test]
    fn test_sanitize_url() {
        assert_eq!(
            sanitize_url("https://mitaoe.ac.in/gamesta").as_deref(),
            Some("https://mitaoe.ac.in/gamesta")
        );
        assert_eq!(sanitize_url("javascript:alert(1)"), None);
        assert_eq!(sanitize_url("not a url"), None);
    }

    #[test]
    fn test_escape_and_strip_html() {
        assert_eq!(escape_html("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(strip_html("<p>GG <em>wp</em></p>"), "GG wp");
    }

    #[test]
    fn test_validate_file() {
        let ok = FileMeta {
            name: "avatar.PNG",
            size: 1024,
            mime_type: "image/png",
        };
        assert!(validate_file(&ok).is_ok());

        let too_big = FileMeta {
            size: MAX_UPLOAD_BYTES + 1,
            ..ok.clone()
        };
        assert_eq!(
            validate_file(&too_big).unwrap_err(),
            "File size must be less than 5MB"
        );

        let wrong_ext = FileMeta {
            name: "avatar.exe",
            ..ok.clone()
        };
        assert_eq!(
            validate_file(&wrong_ext).unwrap_err(),
            "File extension not allowed"
        );
    }

    #[test]
    fn test_register_form_collects_every_error() {
        let result = validate_form(
            &[("email", "bad"), ("password", "123"), ("username", "ok_name")],
            &rules::register(),
        );

        assert!(!result.is_valid());
        assert!(result.errors.contains_key("email"));
        assert!(result.errors.contains_key("password"));
        assert!(!result.errors.contains_key("username"));
        assert_eq!(result.data.get("username").map(String::as_str), Some("ok_name"));
    }

    #[test]
    fn test_weak_password_is_a_warning_not_an_error() {
        let result = validate_form(
            &[
                ("email", "Gamer@Example.com"),
                ("password", "abcdefg"),
                ("username", "gamer42"),
            ],
            &rules::register(),
        );

        assert!(result.is_valid());
        assert!(result.warnings.contains_key("password"));
        let data = result.into_result().unwrap();
        assert_eq!(data["email"], "gamer@example.com");
    }

    #[test]
    fn test_login_form_does_not_apply_strength_rules() {
        let result = validate_form(
            &[("email", "gamer@example.com"), ("password", "password")],
            &rules::login(),
        );
        assert!(result.is_valid());

        let missing = validate_form(&[("email", "gamer@example.com")], &rules::login());
        assert_eq!(
            missing.errors.get("password").map(String::as_str),
            Some("Password is required")
        );
    }

    #[test]
    fn test_rate_limiter_window() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);

        assert!(limiter.is_allowed("login:a", 2, window));
        assert!(limiter.is_allowed("login:a", 2, window));
        assert!(!limiter.is_allowed("login:a", 2, window));
        assert!(limiter.is_allowed("login:b", 2, window));
        assert!(limiter.remaining("login:a", window) > Duration::ZERO);
        assert_eq!(limiter.remaining("login:none", window), Duration::ZERO);

        assert!(limiter.is_allowed("short", 1, Duration::ZERO));
        assert!(limiter.is_allowed("short", 1, Duration::ZERO));
    }

    #[test]
    fn test_rate_limiter_forgets_idle_keys() {
        let limiter = RateLimiter::new();
        let window = Duration::from_millis(20);

        for i in 0..10 {
            assert!(limiter.is_allowed(&format!("player{}@mitaoe.ac.in", i), 5, window));
        }
        assert_eq!(limiter.attempts.lock().unwrap().len(), 10);

        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.is_allowed("late@mitaoe.ac.in", 5, window));

        let attempts = limiter.attempts.lock().unwrap();
        assert_eq!(attempts.len(), 1);
        assert!(attempts.contains_key("late@mitaoe.ac.in"));
    }
}
