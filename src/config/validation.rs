//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse: the raw TOML is first walked as a `toml::Value` tree and
//! compared against the known key set, producing "did you mean?" warnings.
//! Serde deserialization then runs as usual. Warnings never break a config.

use std::collections::HashSet;

use super::{EdgeConfig, PublisherKind};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of [`EdgeConfig`].
///
/// Maintained by hand to match `edge_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        "pipeline",
        "pipeline.tick_interval_secs",
        "pipeline.history_capacity",
        "pipeline.alert_threshold_kg",
        "pipeline.anomaly_ceiling_kg",
        "source",
        "source.kind",
        "source.tcp_bind",
        "publisher",
        "publisher.kind",
        "publisher.http_url",
        "mqtt",
        "mqtt.advisories",
        "mqtt.host",
        "mqtt.port",
        "mqtt.client_id",
        "mqtt.data_topic",
        "mqtt.recommend_topic",
        "mqtt.keep_alive_secs",
        "baseline",
        "baseline.csv_path",
        "server",
        "server.addr",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively collect all dotted key paths of a TOML table.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
            keys.push(path);
        }
    }
    keys
}

// ============================================================================
// Suggestions
// ============================================================================

/// Levenshtein edit distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within edit distance 3, if any. Ties go to the
/// lexicographically smaller key so suggestions are stable.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (edit_distance(unknown, k), *k))
        .filter(|(d, _)| *d <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Warn about keys in `raw_toml` that [`EdgeConfig`] does not know.
///
/// Never fails: TOML syntax errors are reported later by serde.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    let mut found = walk_toml_keys(&value, "");
    found.sort();

    found
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Check a parsed config for impossible values.
///
/// Returns (errors, warnings). Errors must prevent startup; warnings are
/// suspicious but usable.
pub fn validate_ranges(config: &EdgeConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let p = &config.pipeline;

    if p.tick_interval_secs == 0 {
        errors.push("pipeline.tick_interval_secs must be > 0".to_string());
    }
    if p.history_capacity == 0 {
        errors.push("pipeline.history_capacity must be > 0".to_string());
    }
    if !p.alert_threshold_kg.is_finite() || p.alert_threshold_kg < 0.0 {
        errors.push(format!(
            "pipeline.alert_threshold_kg = {} must be a finite, non-negative mass",
            p.alert_threshold_kg
        ));
    }
    if !p.anomaly_ceiling_kg.is_finite() || p.anomaly_ceiling_kg <= 0.0 {
        errors.push(format!(
            "pipeline.anomaly_ceiling_kg = {} must be a finite, positive mass",
            p.anomaly_ceiling_kg
        ));
    }

    if config.publisher.kind == PublisherKind::Http && config.publisher.http_url.trim().is_empty()
    {
        errors.push("publisher.http_url is required when publisher.kind = \"http\"".to_string());
    }

    let m = &config.mqtt;
    let uses_mqtt = m.advisories || config.publisher.kind == PublisherKind::Mqtt;
    if uses_mqtt {
        if m.host.trim().is_empty() {
            errors.push("mqtt.host must not be empty".to_string());
        }
        if m.client_id.trim().is_empty() || m.client_id.starts_with(' ') {
            errors.push("mqtt.client_id must be a non-empty identifier".to_string());
        }
        if m.data_topic.is_empty() || m.recommend_topic.is_empty() {
            errors.push("mqtt topics must not be empty".to_string());
        }
    }

    // A 5 s cadence against a 1-minute history is the intended shape; a
    // history spanning more than a day of ticks is almost certainly a typo.
    let span_secs = p.tick_interval_secs.saturating_mul(p.history_capacity as u64);
    if span_secs > 86_400 {
        warnings.push(ValidationWarning {
            field: "pipeline.history_capacity".to_string(),
            message: format!(
                "history spans {span_secs} s ({} records x {} s), more than a day",
                p.history_capacity, p.tick_interval_secs
            ),
            suggestion: None,
        });
    }

    if p.alert_threshold_kg >= p.anomaly_ceiling_kg * 10.0 {
        warnings.push(ValidationWarning {
            field: "pipeline.alert_threshold_kg".to_string(),
            message: format!(
                "alert_threshold_kg = {:.1} is far above the anomaly ceiling ({:.1}); alerts may never fire",
                p.alert_threshold_kg, p.anomaly_ceiling_kg
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("hello", "hello"), 0);
        assert_eq!(edit_distance("intervall", "interval"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let value: toml::Value = r#"
            [mqtt]
            host = "localhost"
            port = 1883
        "#
        .parse()
        .unwrap();
        let mut keys = walk_toml_keys(&value, "");
        keys.sort();
        assert_eq!(keys, vec!["mqtt", "mqtt.host", "mqtt.port"]);
    }

    #[test]
    fn test_all_default_keys_are_known() {
        let text = EdgeConfig::default().to_toml().unwrap();
        assert!(validate_unknown_keys(&text).is_empty());
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let warnings = validate_unknown_keys("[pipeline]\ntick_intervl_secs = 3\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("pipeline.tick_interval_secs")
        );
    }

    #[test]
    fn test_http_publisher_requires_url() {
        let mut config = EdgeConfig::default();
        config.publisher.kind = PublisherKind::Http;
        let (errors, _) = validate_ranges(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("http_url"));
    }

    #[test]
    fn test_nan_threshold_rejected() {
        let mut config = EdgeConfig::default();
        config.pipeline.alert_threshold_kg = f64::NAN;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("alert_threshold_kg")));
    }

    #[test]
    fn test_mqtt_checks_skipped_when_unused() {
        let mut config = EdgeConfig::default();
        config.mqtt.advisories = false;
        config.mqtt.host = String::new();
        let (errors, _) = validate_ranges(&config);
        assert!(errors.is_empty());
    }
}
