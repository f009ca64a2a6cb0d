use serde::{Deserialize, Serialize};

/// Sampling parameters for a single generation call.
///
/// Every field is optional: `None` means "let the provider decide", which is
/// different from any explicit value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Maximum number of output tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_length: Option<u32>,
}

impl GenerationConfig {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_output_length(mut self, output_length: u32) -> Self {
        self.output_length = Some(output_length);
        self
    }

    /// Fill every unset field from `defaults`. Fields already set win.
    pub fn or(self, defaults: &GenerationConfig) -> Self {
        Self {
            temperature: self.temperature.or(defaults.temperature),
            top_p: self.top_p.or(defaults.top_p),
            top_k: self.top_k.or(defaults.top_k),
            output_length: self.output_length.or(defaults.output_length),
        }
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(GenerationConfig::default().is_empty());
    }

    #[test]
    fn explicit_zero_is_not_unset() {
        let cfg = GenerationConfig::default().with_temperature(0.0);
        assert!(!cfg.is_empty());
        assert_eq!(cfg.temperature, Some(0.0));
    }

    #[test]
    fn or_keeps_explicit_fields() {
        let defaults = GenerationConfig::default()
            .with_temperature(0.7)
            .with_output_length(512);
        let cfg = GenerationConfig::default().with_temperature(0.1).or(&defaults);
        assert_eq!(cfg.temperature, Some(0.1));
        assert_eq!(cfg.output_length, Some(512));
        assert_eq!(cfg.top_k, None);
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let cfg = GenerationConfig::default().with_top_k(40);
        let json = serde_json::to_string(&cfg).unwrap();
        assert_eq!(json, r#"{"top_k":40}"#);
    }
}
