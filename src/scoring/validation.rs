use std::collections::HashSet;

use super::config::StakesTier;
use crate::competition::Sport;
use crate::config::Config;

/// Validate the competition definition at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_competition(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Athletes: one seat may still be empty, never more than two
    if config.athletes.is_empty() || config.athletes.len() > 2 {
        errors.push(format!(
            "athletes: expected one or two athletes, found {}",
            config.athletes.len()
        ));
    }
    let mut athlete_ids = HashSet::new();
    for (i, athlete) in config.athletes.iter().enumerate() {
        if athlete.id.trim().is_empty() {
            errors.push(format!("athletes[{}].id: must not be empty", i));
        } else if !athlete_ids.insert(athlete.id.as_str()) {
            errors.push(format!("athletes[{}].id: duplicate id '{}'", i, athlete.id));
        }
        if athlete.name.trim().is_empty() {
            errors.push(format!("athletes[{}].name: must not be empty", i));
        }
    }

    // Blocks
    if config.blocks.is_empty() {
        errors.push("blocks: at least one block is required".to_string());
    }
    let mut block_ids = HashSet::new();
    for (i, block) in config.blocks.iter().enumerate() {
        if !block_ids.insert(block.id.as_str()) {
            errors.push(format!("blocks[{}].id: duplicate id '{}'", i, block.id));
        }

        if block.sports.is_empty() {
            errors.push(format!("blocks[{}].sports: at least one sport is required", i));
        }
        let mut sports = HashSet::new();
        for (j, name) in block.sports.iter().enumerate() {
            match name.parse::<Sport>() {
                Ok(sport) => {
                    if !sports.insert(sport) {
                        errors.push(format!("blocks[{}].sports[{}]: '{}' listed twice", i, j, name));
                    }
                }
                Err(e) => errors.push(format!("blocks[{}].sports[{}]: {}", i, j, e)),
            }
        }

        if block.closes <= block.opens {
            errors.push(format!("blocks[{}]: closes must be after opens", i));
        }
        if i > 0 {
            let previous = &config.blocks[i - 1];
            if block.opens <= previous.closes {
                errors.push(format!(
                    "blocks[{}]: window overlaps or precedes '{}'",
                    i, previous.id
                ));
            }
        }
    }

    if config.max_points_per_block == Some(0) {
        errors.push("max_points_per_block: must be positive".to_string());
    }

    if let Some(ref stakes) = config.stakes {
        if let Some(ref venues) = stakes.venues {
            validate_tiers("stakes.venues", venues, &mut errors);
        }
        if let Some(ref moods) = stakes.moods {
            validate_tiers("stakes.moods", moods, &mut errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_tiers(field: &str, tiers: &[StakesTier], errors: &mut Vec<String>) {
    if !tiers.iter().any(|t| t.min_gap == 0) {
        errors.push(format!("{}: a tier with min_gap 0 is required", field));
    }
    let mut seen = HashSet::new();
    for (i, tier) in tiers.iter().enumerate() {
        if !seen.insert(tier.min_gap) {
            errors.push(format!(
                "{}[{}].min_gap: duplicate threshold {}",
                field, i, tier.min_gap
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{sample_config, AthleteConfig};
    use crate::scoring::StakesConfig;
    use chrono::Duration;

    #[test]
    fn test_valid_config() {
        assert!(validate_competition(&sample_config()).is_ok());
    }

    #[test]
    fn test_single_athlete_allowed() {
        let mut config = sample_config();
        config.athletes.truncate(1);
        assert!(validate_competition(&config).is_ok());
    }

    #[test]
    fn test_too_many_athletes() {
        let mut config = sample_config();
        config.athletes.push(AthleteConfig {
            id: "p3".to_string(),
            name: "Gamma".to_string(),
        });
        let errors = validate_competition(&config).unwrap_err();
        assert!(errors[0].contains("athletes"));
    }

    #[test]
    fn test_duplicate_athlete_id() {
        let mut config = sample_config();
        config.athletes[1].id = "p1".to_string();
        let errors = validate_competition(&config).unwrap_err();
        assert!(errors[0].contains("athletes[1].id"));
    }

    #[test]
    fn test_unknown_sport() {
        let mut config = sample_config();
        config.blocks[1].sports.push("Rowing".to_string());
        let errors = validate_competition(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("blocks[1].sports[3]"));
    }

    #[test]
    fn test_repeated_sport() {
        let mut config = sample_config();
        config.blocks[0].sports.push("swimming".to_string());
        let errors = validate_competition(&config).unwrap_err();
        assert!(errors[0].contains("listed twice"));
    }

    #[test]
    fn test_inverted_window() {
        let mut config = sample_config();
        config.blocks[0].closes = config.blocks[0].opens - Duration::hours(1);
        let errors = validate_competition(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("closes must be after opens")));
    }

    #[test]
    fn test_overlapping_windows() {
        let mut config = sample_config();
        config.blocks[1].opens = config.blocks[0].closes;
        let errors = validate_competition(&config).unwrap_err();
        assert!(errors[0].contains("overlaps"));
    }

    #[test]
    fn test_stakes_tiers_need_floor() {
        let mut config = sample_config();
        let mut stakes = StakesConfig::default();
        stakes.venues = Some(vec![StakesTier {
            min_gap: 2,
            label: "Fancy".to_string(),
        }]);
        config.stakes = Some(stakes);
        let errors = validate_competition(&config).unwrap_err();
        assert!(errors[0].contains("stakes.venues"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = sample_config();
        config.athletes[0].name = " ".to_string(); // Error 1
        config.blocks[0].sports.clear(); // Error 2
        config.max_points_per_block = Some(0); // Error 3
        let errors = validate_competition(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
