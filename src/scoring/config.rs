use serde::{Deserialize, Serialize};

use super::stakes::StakesTable;

pub const DEFAULT_CURRENCY: &str = "SGD";
pub const DEFAULT_PER_POINT: u32 = 50;

/// Dinner stakes configuration.
///
/// Each field is optional; anything left out falls back to the defaults.
/// A mood label may contain `{loser}`, replaced with the trailing athlete's name.
///
/// Example YAML:
/// ```yaml
/// stakes:
///   currency: SGD
///   per_point: 50
///   venues:
///     - { min_gap: 0, label: "Hawker Centre" }
///     - { min_gap: 3, label: "Fine Dining" }
///   moods:
///     - { min_gap: 0, label: "Too close to call" }
///     - { min_gap: 1, label: "{loser} is slightly concerned about their wallet" }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StakesConfig {
    #[serde(default)]
    pub currency: Option<String>,

    /// Debt per point of margin
    #[serde(default)]
    pub per_point: Option<u32>,

    #[serde(default)]
    pub venues: Option<Vec<StakesTier>>,

    #[serde(default)]
    pub moods: Option<Vec<StakesTier>>,
}

/// One row of a stakes table: applies when the gap is at least `min_gap`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StakesTier {
    pub min_gap: u32,
    pub label: String,
}

impl StakesTier {
    fn new(min_gap: u32, label: &str) -> Self {
        Self {
            min_gap,
            label: label.to_string(),
        }
    }
}

fn default_venues() -> Vec<StakesTier> {
    vec![
        StakesTier::new(0, "Hawker Centre"),
        StakesTier::new(1, "Casual Restaurant"),
        StakesTier::new(2, "Smart Casual Dining"),
        StakesTier::new(3, "Fine Dining"),
        StakesTier::new(4, "1 Michelin Star"),
        StakesTier::new(5, "2 Michelin Stars"),
        StakesTier::new(6, "3 Michelin Stars, tasting menu with wine pairing"),
    ]
}

fn default_moods() -> Vec<StakesTier> {
    vec![
        StakesTier::new(0, "Too close to call, both wallets are safe... for now"),
        StakesTier::new(1, "{loser} is slightly concerned about their wallet"),
        StakesTier::new(2, "{loser} is Googling Michelin star restaurants"),
        StakesTier::new(3, "{loser} is checking their credit card limit"),
        StakesTier::new(4, "{loser} has called their bank for an emergency credit increase"),
        StakesTier::new(5, "{loser} has started selling furniture to afford dinner"),
    ]
}

impl Default for StakesConfig {
    fn default() -> Self {
        Self {
            currency: Some(DEFAULT_CURRENCY.to_string()),
            per_point: Some(DEFAULT_PER_POINT),
            venues: Some(default_venues()),
            moods: Some(default_moods()),
        }
    }
}

impl StakesConfig {
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn per_point(&self) -> u32 {
        self.per_point.unwrap_or(DEFAULT_PER_POINT)
    }

    pub fn venue_table(&self) -> StakesTable<String> {
        to_table(self.venues.clone().unwrap_or_else(default_venues))
    }

    pub fn mood_table(&self) -> StakesTable<String> {
        to_table(self.moods.clone().unwrap_or_else(default_moods))
    }
}

fn to_table(tiers: Vec<StakesTier>) -> StakesTable<String> {
    StakesTable::new(tiers.into_iter().map(|t| (t.min_gap, t.label)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stakes_config() {
        let config = StakesConfig::default();

        assert_eq!(config.currency(), "SGD");
        assert_eq!(config.per_point(), 50);
        assert_eq!(config.venues.as_ref().map(Vec::len), Some(7));
        assert_eq!(config.moods.as_ref().map(Vec::len), Some(6));
    }

    #[test]
    fn test_stakes_config_serde_roundtrip() {
        let config = StakesConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: StakesConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_stakes_config_falls_back() {
        let yaml = r#"
currency: EUR
per_point: 20
"#;
        let config: StakesConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.currency(), "EUR");
        assert_eq!(config.per_point(), 20);
        assert!(config.venues.is_none());
        assert_eq!(config.venue_table().lookup(6).map(String::as_str), Some("3 Michelin Stars, tasting menu with wine pairing"));
    }

    #[test]
    fn test_custom_tiers_parse() {
        let yaml = r#"
venues:
  - min_gap: 0
    label: "Pizza"
  - min_gap: 10
    label: "Omakase"
"#;
        let config: StakesConfig = serde_saphyr::from_str(yaml).unwrap();
        let venues = config.venue_table();
        assert_eq!(venues.lookup(9).map(String::as_str), Some("Pizza"));
        assert_eq!(venues.lookup(10).map(String::as_str), Some("Omakase"));
    }

    #[test]
    fn test_empty_stakes_config_parse() {
        let config: StakesConfig = serde_saphyr::from_str("{}").unwrap();
        assert!(config.currency.is_none());
        assert!(config.per_point.is_none());
        assert!(config.moods.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<StakesConfig, _> = serde_saphyr::from_str("tip: 10");
        assert!(result.is_err());
    }
}
