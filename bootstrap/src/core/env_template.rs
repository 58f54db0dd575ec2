//! Default `.env` document for a freshly bootstrapped project.
//!
//! The template is rendered as ordered `KEY=VALUE` lines grouped under `#`
//! headers. Secrets are placeholders and must never reach production.

use super::types::EnvironmentMode;

pub const INSECURE_DEFAULTS_NOTICE: &str = "\
# WARNING: placeholder secrets below are insecure defaults.
# Replace every CHANGE_ME value before deploying anywhere but localhost.
";

/// A titled group of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSection {
    pub title: &'static str,
    pub entries: Vec<(String, String)>,
}

impl EnvSection {
    fn new(title: &'static str, entries: &[(&str, &str)]) -> Self {
        Self {
            title,
            entries: entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

/// `APP_ENV` value the application recognizes for `mode`.
///
/// The application treats only `dev` as development (it relaxes secure
/// cookies there); every other value is production-like.
pub fn app_env_value(mode: EnvironmentMode) -> &'static str {
    match mode {
        EnvironmentMode::Development => "dev",
        EnvironmentMode::Production => "production",
    }
}

/// Default sections. `data_dir` is the project-relative data directory.
pub fn default_sections(mode: EnvironmentMode, data_dir: &str) -> Vec<EnvSection> {
    let data_dir = data_dir.trim_end_matches('/');
    let database_path = format!("{data_dir}/copilot.db");
    vec![
        EnvSection::new(
            "Application",
            &[("APP_ENV", app_env_value(mode)), ("DEMO_MODE", "false")],
        ),
        EnvSection::new(
            "Security",
            &[
                ("JWT_SECRET", "CHANGE_ME_32+_character_random_secret"),
                ("ACCESS_TOKEN_EXPIRE_MINUTES", "60"),
                ("API_KEY", "CHANGE_ME_dev-api-key"),
            ],
        ),
        EnvSection::new(
            "Admin bootstrap",
            &[
                ("ADMIN_EMAIL", "admin@example.com"),
                ("ADMIN_PASSWORD", "CHANGE_ME_admin_password"),
            ],
        ),
        EnvSection::new(
            "Storage",
            &[
                ("DATA_DIR", data_dir),
                ("DATABASE_PATH", database_path.as_str()),
            ],
        ),
        EnvSection::new(
            "Risk engine",
            &[("RISK_THRESHOLD", "0.75"), ("PAYWALL_CODE", "CHANGE_ME")],
        ),
        EnvSection::new(
            "AI",
            &[("OPENAI_API_KEY", ""), ("OPENAI_MODEL", "gpt-4o-mini")],
        ),
        EnvSection::new(
            "Email",
            &[
                ("SENDGRID_API_KEY", ""),
                ("ALERT_EMAIL_FROM", "alerts@example.com"),
                ("ALERT_EMAIL_TO", "you@example.com"),
            ],
        ),
        EnvSection::new(
            "Billing",
            &[
                ("STRIPE_SECRET_KEY", ""),
                ("STRIPE_PRICE_ID", ""),
                ("STRIPE_WEBHOOK_SECRET", ""),
            ],
        ),
        EnvSection::new(
            "Blockchain endpoints",
            &[
                ("XRPL_RPC_URL", "https://s2.ripple.com:51234"),
                ("BSC_API_KEY", ""),
            ],
        ),
    ]
}

/// Render sections into a complete document with a trailing newline.
pub fn render_env_document(sections: &[EnvSection]) -> String {
    let mut out = String::from(INSECURE_DEFAULTS_NOTICE);
    for section in sections {
        out.push('\n');
        out.push_str("# ");
        out.push_str(section.title);
        out.push('\n');
        for (key, value) in &section.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
    }
    out
}

/// Parse `KEY=VALUE` lines in order, ignoring blanks and `#` comments.
/// Values may themselves contain `=`.
pub fn parse_env_document(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .collect()
}
