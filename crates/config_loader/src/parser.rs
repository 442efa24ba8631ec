//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{EngineConfig, TelemetryError};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<EngineConfig, TelemetryError> {
    toml::from_str(content).map_err(|e| TelemetryError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<EngineConfig, TelemetryError> {
    serde_json::from_str(content).map_err(|e| TelemetryError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<EngineConfig, TelemetryError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_sections() {
        let content = r#"
[time]
max_backward_jump_s = 2.5

[glide]
roll_max_deg = 30.0
smoothing_window_s = 10.0
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.time.max_backward_jump_s, 2.5);
        assert_eq!(config.time.max_forward_jump_s, 100.0);
        assert_eq!(config.glide.roll_max_deg, 30.0);
        assert_eq!(config.flightbook.min_throttle_percent, 20.0);
    }

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(parse_toml("").unwrap(), EngineConfig::default());
        assert_eq!(parse_json("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_parse_json_section() {
        let content = r#"{ "flightbook": { "min_altitude_m": 3.0 } }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.flightbook.min_altitude_m, 3.0);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, TelemetryError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_wrong_type() {
        let err = parse_toml("[time]\nmax_forward_jump_s = \"far\"").unwrap_err();
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
