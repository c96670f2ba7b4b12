//! Shared test support, exposed to the front-end crates behind the
//! `testing` feature.

#[cfg(any(test, feature = "testing"))]
pub mod test_helpers {
    use crate::config::{LintersSettingsTable, NetlintConfig, RuleSeverity};

    /// Build a configuration that enables exactly the given rules, leaving
    /// every other rule off so tests stay isolated from the rest of the
    /// catalog. Pass `Some(settings)` to exercise a rule's knobs.
    ///
    /// ```
    /// use netlint_core::config::RuleSeverity;
    /// use netlint_core::test_utils::test_helpers::lint_config;
    ///
    /// let config = lint_config(&[("enable-secret", RuleSeverity::Error)], None);
    /// assert_eq!(RuleSeverity::Error, config.severity_for("enable-secret"));
    /// assert_eq!(RuleSeverity::Off, config.severity_for("no-http-server"));
    /// ```
    pub fn lint_config(
        enabled: &[(&str, RuleSeverity)],
        settings: Option<LintersSettingsTable>,
    ) -> NetlintConfig {
        let mut config = NetlintConfig::default();
        for (alias, severity) in enabled {
            config
                .linters
                .severity
                .insert((*alias).to_string(), *severity);
        }
        if let Some(settings) = settings {
            config.linters.settings = settings;
        }
        config
    }
}
