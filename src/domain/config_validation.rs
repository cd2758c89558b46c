//! Configuration validation.
//!
//! Validates every config field before an analysis, simulation or sweep runs.
//! Absent optional keys fall back to defaults and are not errors.

use crate::domain::bias::BiasKind;
use crate::domain::error::BiastraderError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), BiastraderError> {
    for key in ["date_column", "close_column", "date_format"] {
        if let Some(value) = config.get_string("data", key) {
            if value.trim().is_empty() {
                return Err(invalid("data", key, format!("{} must not be empty", key)));
            }
        }
    }
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), BiastraderError> {
    validate_positive_int(config, "analysis", "lookback_days")?;
    validate_positive_int(config, "analysis", "base_shares")?;
    validate_threshold(config, "analysis")?;
    parse_optional_date(config, "analysis", "as_of")?;
    Ok(())
}

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), BiastraderError> {
    validate_starting_cash(config)?;
    validate_threshold(config, "simulation")?;
    validate_positive_int(config, "simulation", "lookback_days")?;
    validate_bias(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), BiastraderError> {
    parse_list::<f64>(config, "sweep", "thresholds")?
        .iter()
        .try_for_each(|&t| check_threshold(t, "sweep", "thresholds"))?;
    for lookback in parse_list::<u32>(config, "sweep", "lookbacks")? {
        if lookback == 0 {
            return Err(invalid("sweep", "lookbacks", "lookbacks must be positive".into()));
        }
    }
    parse_list::<BiasKind>(config, "sweep", "bias")?;
    Ok(())
}

fn validate_starting_cash(config: &dyn ConfigPort) -> Result<(), BiastraderError> {
    if config.get_string("simulation", "starting_cash").is_none() {
        return Ok(());
    }
    let value = config.get_double("simulation", "starting_cash", f64::NAN);
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "simulation",
            "starting_cash",
            "starting_cash must be positive".into(),
        ));
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort, section: &str) -> Result<(), BiastraderError> {
    if config.get_string(section, "threshold").is_none() {
        return Ok(());
    }
    let value = config.get_double(section, "threshold", f64::NAN);
    check_threshold(value, section, "threshold")
}

fn check_threshold(value: f64, section: &str, key: &str) -> Result<(), BiastraderError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(invalid(
            section,
            key,
            format!("threshold must be a fraction between 0 and 1, got {}", value),
        ));
    }
    Ok(())
}

fn validate_positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), BiastraderError> {
    if config.get_string(section, key).is_none() {
        return Ok(());
    }
    let value = config.get_int(section, key, -1);
    if value <= 0 || value > i64::from(u32::MAX) {
        return Err(invalid(
            section,
            key,
            format!("{} must be a positive integer", key),
        ));
    }
    Ok(())
}

fn validate_bias(config: &dyn ConfigPort) -> Result<(), BiastraderError> {
    if let Some(value) = config.get_string("simulation", "bias") {
        value
            .parse::<BiasKind>()
            .map_err(|reason| invalid("simulation", "bias", reason))?;
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), BiastraderError> {
    let start = parse_optional_date(config, "simulation", "start_date")?;
    let end = parse_optional_date(config, "simulation", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "simulation",
                "start_date",
                "start_date must be before end_date".into(),
            ));
        }
    }
    Ok(())
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, BiastraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                invalid(
                    section,
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
    }
}

/// Parse a comma-separated list; an absent key is an empty list.
pub fn parse_list<T: std::str::FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Vec<T>, BiastraderError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<T>()
                .map_err(|_| invalid(section, key, format!("invalid list entry '{}'", s)))
        })
        .collect()
}

fn invalid(section: &str, key: &str, reason: String) -> BiastraderError {
    BiastraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}
