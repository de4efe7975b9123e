// src/config/mod.rs

use std::env;

/// Runtime configuration, read once from the process environment.
/// There are no CLI flags or config files; empty values count as unset.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub ding_webhook: Option<String>,
    pub ding_secret: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            ding_webhook: read("DING_WEBHOOK"),
            ding_secret: read("DING_SECRET"),
            ai_api_key: read("AI_API_KEY"),
            ai_base_url: read("AI_BASE_URL"),
        }
    }

    /// Webhook URL + signing secret, when both are configured.
    pub fn dingtalk(&self) -> Option<(&str, &str)> {
        Some((self.ding_webhook.as_deref()?, self.ding_secret.as_deref()?))
    }
}

fn read(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_values_count_as_unset() {
        env::set_var("DING_WEBHOOK", "https://oapi.dingtalk.com/robot/send?access_token=t");
        env::set_var("DING_SECRET", "   ");
        env::remove_var("AI_API_KEY");
        env::remove_var("AI_BASE_URL");

        let cfg = Config::from_env();
        assert!(cfg.ding_webhook.is_some());
        assert!(cfg.ding_secret.is_none());
        assert!(cfg.ai_api_key.is_none());
        // the pair accessor needs both halves
        assert!(cfg.dingtalk().is_none());

        env::set_var("DING_SECRET", "SEC0b1");
        let cfg = Config::from_env();
        let (webhook, secret) = cfg.dingtalk().unwrap();
        assert!(webhook.starts_with("https://oapi.dingtalk.com"));
        assert_eq!(secret, "SEC0b1");
    }
}
