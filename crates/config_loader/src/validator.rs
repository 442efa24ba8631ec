//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (validator derive)
//! - 时间跳变阈值 > 0
//! - roll_max_deg < 90 (滑翔比修正除以 cos(roll))
//! - min_samples >= 3

use contracts::{EngineConfig, TelemetryError};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 EngineConfig
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &EngineConfig) -> Result<(), TelemetryError> {
    config
        .validate()
        .map_err(|e| TelemetryError::config_validation(first_field(&e), e.to_string()))?;
    validate_time(config)?;
    validate_timing(config)?;
    validate_glide(config)?;
    Ok(())
}

/// Dotted path of the alphabetically first failing field.
fn first_field(errors: &ValidationErrors) -> String {
    let Some((name, kind)) = errors.errors().iter().min_by(|a, b| a.0.cmp(b.0)) else {
        return String::new();
    };
    match kind {
        ValidationErrorsKind::Field(_) => name.to_string(),
        ValidationErrorsKind::Struct(inner) => format!("{name}.{}", first_field(inner)),
        ValidationErrorsKind::List(items) => match items.iter().next() {
            Some((index, inner)) => format!("{name}[{index}].{}", first_field(inner)),
            None => name.to_string(),
        },
    }
}

/// 校验时间跳变阈值
fn validate_time(config: &EngineConfig) -> Result<(), TelemetryError> {
    let time = &config.time;
    if time.max_backward_jump_s <= 0.0 {
        return Err(TelemetryError::config_validation(
            "time.max_backward_jump_s",
            format!("must be > 0, got {}", time.max_backward_jump_s),
        ));
    }
    if time.max_forward_jump_s <= 0.0 {
        return Err(TelemetryError::config_validation(
            "time.max_forward_jump_s",
            format!("must be > 0, got {}", time.max_forward_jump_s),
        ));
    }
    Ok(())
}

fn validate_timing(config: &EngineConfig) -> Result<(), TelemetryError> {
    if config.timing.min_samples < 3 {
        return Err(TelemetryError::config_validation(
            "timing.min_samples",
            format!("must be >= 3, got {}", config.timing.min_samples),
        ));
    }
    Ok(())
}

/// 校验滑翔过滤参数
fn validate_glide(config: &EngineConfig) -> Result<(), TelemetryError> {
    let glide = &config.glide;
    if glide.roll_max_deg >= 90.0 {
        return Err(TelemetryError::config_validation(
            "glide.roll_max_deg",
            format!("must be < 90, got {}", glide.roll_max_deg),
        ));
    }
    if !glide.speed_min.is_finite() || !glide.accx_max.is_finite() {
        return Err(TelemetryError::config_validation(
            "glide",
            "speed_min and accx_max must be finite",
        ));
    }
    Ok(())
}
