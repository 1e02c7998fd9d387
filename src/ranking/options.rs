use std::collections::HashMap;

use crate::util::env::env_parse_opt;

/// Integer options owned by the host (pool configuration).
pub trait HostOptions: Send + Sync {
    /// Value of `name`, or `None` when the host has no setting for it.
    fn get_option(&self, name: &str) -> Option<i64>;

    fn get_option_or(&self, name: &str, default: i64) -> i64 {
        self.get_option(name).unwrap_or(default)
    }
}

/// Options read from `FOOTBALLPOOL_<NAME>` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvOptions;

impl EnvOptions {
    pub fn var_name(name: &str) -> String {
        format!("FOOTBALLPOOL_{}", name.to_ascii_uppercase())
    }
}

impl HostOptions for EnvOptions {
    fn get_option(&self, name: &str) -> Option<i64> {
        env_parse_opt(&Self::var_name(name))
    }
}

/// Fixed in-memory options.
#[derive(Debug, Clone, Default)]
pub struct MapOptions(HashMap<String, i64>);

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: i64) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }
}

impl HostOptions for MapOptions {
    fn get_option(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }
}

/// Points awarded per unit of each match category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsConfig {
    pub full: i64,
    pub toto: i64,
    pub goal_bonus: i64,
    pub goal_diff: i64,
}

impl PointsConfig {
    pub const FULL_POINTS: i64 = 5;
    pub const TOTO_POINTS: i64 = 2;
    pub const GOAL_POINTS: i64 = 0;
    pub const DIFF_POINTS: i64 = 0;

    pub const FULL_OPTION: &'static str = "fullpoints";
    pub const TOTO_OPTION: &'static str = "totopoints";
    pub const GOAL_OPTION: &'static str = "goalpoints";
    pub const DIFF_OPTION: &'static str = "diffpoints";

    /// Read the four multipliers, falling back to the host defaults.
    pub fn load(options: &dyn HostOptions) -> Self {
        Self {
            full: options.get_option_or(Self::FULL_OPTION, Self::FULL_POINTS),
            toto: options.get_option_or(Self::TOTO_OPTION, Self::TOTO_POINTS),
            goal_bonus: options.get_option_or(Self::GOAL_OPTION, Self::GOAL_POINTS),
            goal_diff: options.get_option_or(Self::DIFF_OPTION, Self::DIFF_POINTS),
        }
    }
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            full: Self::FULL_POINTS,
            toto: Self::TOTO_POINTS,
            goal_bonus: Self::GOAL_POINTS,
            goal_diff: Self::DIFF_POINTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_options_fall_back_to_host_defaults() {
        let points = PointsConfig::load(&MapOptions::new().with("totopoints", 3));
        assert_eq!(
            points,
            PointsConfig { full: 5, toto: 3, goal_bonus: 0, goal_diff: 0 }
        );
    }

    #[test]
    fn env_options_use_prefixed_upper_case_names() {
        assert_eq!(EnvOptions::var_name("diffpoints"), "FOOTBALLPOOL_DIFFPOINTS");
        // process-wide; keep the name unique to this test
        std::env::set_var("FOOTBALLPOOL_FPX_TEST_POINTS", "4");
        assert_eq!(EnvOptions.get_option("fpx_test_points"), Some(4));
        assert_eq!(EnvOptions.get_option("fpx_test_points_unset"), None);
    }
}
