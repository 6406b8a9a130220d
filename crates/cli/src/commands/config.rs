use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use lightquote_core::config::{default_config_paths, AppConfig, EndpointConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

struct ConfigFile {
    path: Option<PathBuf>,
    doc: Option<Value>,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let path = default_config_paths().into_iter().find(|path| path.exists());
    let file = ConfigFile { doc: load_config_file_doc(path.as_deref()), path };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    render_endpoint(&mut lines, &file, "pricing", &config.pricing);
    render_endpoint(&mut lines, &file, "checkout", &config.checkout);

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            &["LIGHTQUOTE_LOGGING_LEVEL", "LIGHTQUOTE_LOG_LEVEL"],
            &file,
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_ascii_lowercase(),
        field_source(
            "logging.format",
            &["LIGHTQUOTE_LOGGING_FORMAT", "LIGHTQUOTE_LOG_FORMAT"],
            &file,
        ),
    ));

    lines.join("\n")
}

fn render_endpoint(
    lines: &mut Vec<String>,
    file: &ConfigFile,
    section: &str,
    endpoint: &EndpointConfig,
) {
    let env_prefix = format!("LIGHTQUOTE_{}", section.to_ascii_uppercase());
    let rows = [
        ("url", endpoint.url.clone(), "URL"),
        ("timeout_secs", endpoint.timeout_secs.to_string(), "TIMEOUT_SECS"),
        ("api_key", redact_key(endpoint.api_key.as_ref()), "API_KEY"),
    ];

    for (field, value, env_suffix) in rows {
        let key_path = format!("{section}.{field}");
        let env_key = format!("{env_prefix}_{env_suffix}");
        let source = field_source(&key_path, &[env_key.as_str()], file);
        lines.push(render_line(&key_path, &value, source));
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_keys: &[&str], file: &ConfigFile) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = &file.doc {
        if contains_path(doc, key_path) {
            let file_path = file
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_key(key: Option<&SecretString>) -> String {
    let Some(key) = key else {
        return "<unset>".to_string();
    };

    let trimmed = key.expose_secret().trim();
    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::redact_key;

    #[test]
    fn keys_are_redacted_down_to_their_prefix() {
        let prefixed: SecretString = "pk-live-123456".to_string().into();
        let bare: SecretString = "abcdef".to_string().into();

        assert_eq!(redact_key(Some(&prefixed)), "pk-***");
        assert_eq!(redact_key(Some(&bare)), "<redacted>");
        assert_eq!(redact_key(None), "<unset>");
    }
}
