use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

use crate::types::Config;

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let foundry_url = required(env, "FOUNDRY_URL")?;
    let ontology_rid = required(env, "ONTOLOGY_RID")?;
    let foundry_token = required(env, "FOUNDRY_BEARER_TOKEN")?;
    let slack_token = required(env, "SLACK_BOT_TOKEN")?;
    let slack_channel_id = required(env, "SLACK_CHANNEL_ID")?;

    let object_type = env
        .get_var("OBJECT_TYPE")
        .unwrap_or_else(|| "ThreadInsight".to_string());

    let timestamp_column = env
        .get_var("TIMESTAMP_COLUMN")
        .unwrap_or_else(|| "timestamp".to_string());

    let page_size: u32 = env
        .get_var("PAGE_SIZE")
        .unwrap_or_else(|| "1000".to_string())
        .parse()
        .context("Invalid PAGE_SIZE")?;
    if page_size == 0 {
        return Err(anyhow!("PAGE_SIZE must be greater than zero"));
    }

    let lookback_hours: i64 = env
        .get_var("LOOKBACK_HOURS")
        .unwrap_or_else(|| "24".to_string())
        .parse()
        .context("Invalid LOOKBACK_HOURS")?;

    let poll_interval_hours: i64 = env
        .get_var("POLL_INTERVAL_HOURS")
        .unwrap_or_else(|| "24".to_string())
        .parse()
        .unwrap_or(24);

    let retry_delay_secs: u64 = env
        .get_var("RETRY_DELAY_SECS")
        .unwrap_or_else(|| "300".to_string())
        .parse()
        .unwrap_or(300);

    let post_delay_ms: u64 = env
        .get_var("POST_DELAY_MS")
        .unwrap_or_else(|| "1000".to_string())
        .parse()
        .unwrap_or(1000);

    let slack_base_url = env
        .get_var("SLACK_BASE_URL")
        .unwrap_or_else(|| "https://slack.com/api".to_string());

    let fail_if_type_missing = env
        .get_var("FAIL_IF_TYPE_MISSING")
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(true);

    Ok(Config {
        foundry_url,
        ontology_rid,
        foundry_token,
        object_type,
        timestamp_column,
        page_size,
        lookback_hours,
        slack_base_url,
        slack_token,
        slack_channel_id,
        poll_interval_hours,
        retry_delay_secs,
        post_delay_ms,
        fail_if_type_missing,
    })
}

fn required<E: EnvironmentProvider>(env: &E, key: &str) -> Result<String> {
    env.get_var(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow!("{} must be set", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_env() -> MockEnvironment {
        MockEnvironment::new()
            .with_var("FOUNDRY_URL", "https://foundry.example.com")
            .with_var("ONTOLOGY_RID", "ri.ontology.main.ontology.123")
            .with_var("FOUNDRY_BEARER_TOKEN", "foundry-token")
            .with_var("SLACK_BOT_TOKEN", "xoxb-test")
            .with_var("SLACK_CHANNEL_ID", "C012345")
    }

    #[test]
    fn test_config_loading_with_env() {
        let env = minimal_env()
            .with_var("OBJECT_TYPE", "CustomInsight")
            .with_var("TIMESTAMP_COLUMN", "updatedAt")
            .with_var("PAGE_SIZE", "500")
            .with_var("LOOKBACK_HOURS", "48")
            .with_var("POLL_INTERVAL_HOURS", "12")
            .with_var("RETRY_DELAY_SECS", "60")
            .with_var("POST_DELAY_MS", "250")
            .with_var("SLACK_BASE_URL", "https://slack.example.com/api")
            .with_var("FAIL_IF_TYPE_MISSING", "false");

        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.foundry_url, "https://foundry.example.com");
        assert_eq!(config.ontology_rid, "ri.ontology.main.ontology.123");
        assert_eq!(config.object_type, "CustomInsight");
        assert_eq!(config.timestamp_column, "updatedAt");
        assert_eq!(config.page_size, 500);
        assert_eq!(config.lookback_hours, 48);
        assert_eq!(config.poll_interval_hours, 12);
        assert_eq!(config.retry_delay_secs, 60);
        assert_eq!(config.post_delay_ms, 250);
        assert_eq!(config.slack_base_url, "https://slack.example.com/api");
        assert_eq!(config.fail_if_type_missing, false);
    }

    #[test]
    fn test_config_loading_defaults() {
        let config = load_config_with_env(&minimal_env()).unwrap();

        assert_eq!(config.object_type, "ThreadInsight");
        assert_eq!(config.timestamp_column, "timestamp");
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.lookback_hours, 24);
        assert_eq!(config.poll_interval_hours, 24);
        assert_eq!(config.retry_delay_secs, 300);
        assert_eq!(config.post_delay_ms, 1000);
        assert_eq!(config.slack_base_url, "https://slack.com/api");
        assert_eq!(config.fail_if_type_missing, true);
    }

    #[test]
    fn test_config_loading_missing_required() {
        for missing in [
            "FOUNDRY_URL",
            "ONTOLOGY_RID",
            "FOUNDRY_BEARER_TOKEN",
            "SLACK_BOT_TOKEN",
            "SLACK_CHANNEL_ID",
        ] {
            let mut env = minimal_env();
            env.vars.remove(missing);

            let result = load_config_with_env(&env);
            assert!(result.is_err(), "expected error without {}", missing);
            assert!(result.unwrap_err().to_string().contains(missing));
        }
    }

    #[test]
    fn test_config_loading_empty_required() {
        let env = minimal_env().with_var("SLACK_CHANNEL_ID", "");

        let result = load_config_with_env(&env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("SLACK_CHANNEL_ID"));
    }

    #[test]
    fn test_config_loading_invalid_page_size() {
        let env = minimal_env().with_var("PAGE_SIZE", "invalid");

        let result = load_config_with_env(&env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PAGE_SIZE"));

        let env = minimal_env().with_var("PAGE_SIZE", "0");

        let result = load_config_with_env(&env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PAGE_SIZE"));
    }

    #[test]
    fn test_config_loading_invalid_lookback() {
        let env = minimal_env().with_var("LOOKBACK_HOURS", "soon");

        let result = load_config_with_env(&env);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("LOOKBACK_HOURS"));
    }

    #[test]
    fn test_interval_parsing_with_invalid_values() {
        // Interval knobs fall back to their defaults instead of failing
        let env = minimal_env()
            .with_var("POLL_INTERVAL_HOURS", "invalid")
            .with_var("RETRY_DELAY_SECS", "also_invalid")
            .with_var("POST_DELAY_MS", "nope");

        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.poll_interval_hours, 24);
        assert_eq!(config.retry_delay_secs, 300);
        assert_eq!(config.post_delay_ms, 1000);
    }

    #[test]
    fn test_boolean_parsing() {
        for val in ["1", "true", "TRUE", "True"] {
            let env = minimal_env().with_var("FAIL_IF_TYPE_MISSING", val);
            let config = load_config_with_env(&env).unwrap();
            assert!(config.fail_if_type_missing, "Failed for value: {}", val);
        }

        for val in ["0", "false", "FALSE", "False", "no", "off", ""] {
            let env = minimal_env().with_var("FAIL_IF_TYPE_MISSING", val);
            let config = load_config_with_env(&env).unwrap();
            assert!(!config.fail_if_type_missing, "Failed for value: {}", val);
        }

        let config = load_config_with_env(&minimal_env()).unwrap();
        assert!(config.fail_if_type_missing);
    }
}
