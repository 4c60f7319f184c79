//! Catalog loading, validation, and eligibility lookup.

use std::collections::HashMap;

use netgrid_core::store::PlayerRecord;
use serde::Deserialize;
use thiserror::Error;

use crate::definition::CommandDefinition;

/// Built-in command set, compiled into the binary. A deployment can
/// override it with a YAML file of the same shape.
const BUILTIN_COMMANDS: &str = include_str!("../config/commands.yaml");

/// Configuration errors, all rejected at load time.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The YAML document could not be parsed.
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The catalog contains no commands.
    #[error("catalog is empty")]
    Empty,

    /// Two definitions share an id.
    #[error("duplicate command id: {0}")]
    DuplicateCommand(String),

    /// `reward_min > reward_max`, or a negative payout bound.
    #[error("command {id}: invalid reward range [{min}, {max}]")]
    InvalidRewardRange {
        /// The offending command.
        id: String,
        /// Configured minimum.
        min: i64,
        /// Configured maximum.
        max: i64,
    },

    /// The reward span does not fit the uniform draw.
    #[error("command {id}: reward span exceeds u32")]
    RewardSpanTooWide {
        /// The offending command.
        id: String,
    },

    /// `success_probability` outside `[0, 1]` (or NaN).
    #[error("command {id}: success probability {value} outside [0, 1]")]
    InvalidProbability {
        /// The offending command.
        id: String,
        /// Configured value.
        value: f64,
    },

    /// A quantity that must be non-negative is negative.
    #[error("command {id}: {field} must not be negative")]
    NegativeQuantity {
        /// The offending command.
        id: String,
        /// The offending field name.
        field: &'static str,
    },

    /// `required_level` below 1 can never gate anything.
    #[error("command {id}: required_level must be at least 1")]
    InvalidRequiredLevel {
        /// The offending command.
        id: String,
    },
}

/// On-disk catalog shape.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    commands: Vec<CommandDefinition>,
}

/// The immutable command catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    commands: Vec<CommandDefinition>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog from definitions, validating every entry.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` describing the first misconfiguration found.
    pub fn new(commands: Vec<CommandDefinition>) -> Result<Self, CatalogError> {
        if commands.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(commands.len());
        for (position, definition) in commands.iter().enumerate() {
            validate(definition)?;
            if index.insert(definition.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateCommand(definition.id.clone()));
            }
        }

        Ok(Self { commands, index })
    }

    /// Parses and validates a YAML catalog document.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` on parse failure or misconfiguration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        Self::new(file.commands)
    }

    /// The built-in command set.
    ///
    /// # Panics
    ///
    /// Panics if the embedded catalog is invalid, which is a build defect
    /// caught by this crate's tests.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_yaml_str(BUILTIN_COMMANDS).expect("built-in catalog must be valid")
    }

    /// Looks up a definition by id.
    #[must_use]
    pub fn get(&self, command_id: &str) -> Option<&CommandDefinition> {
        self.index.get(command_id).map(|&pos| &self.commands[pos])
    }

    /// All definitions, in configuration order.
    #[must_use]
    pub fn commands(&self) -> &[CommandDefinition] {
        &self.commands
    }

    /// Number of configured commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Always false: an empty catalog does not construct.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether the player may invoke the command: either it is in the
    /// player's unlocked set, or it is a zero-cost starter. Unknown ids are
    /// never unlocked.
    #[must_use]
    pub fn is_unlocked_for(&self, player: &PlayerRecord, command_id: &str) -> bool {
        let Some(definition) = self.get(command_id) else {
            return false;
        };
        definition.is_starter() || player.unlocked_commands.iter().any(|id| id == command_id)
    }
}

fn validate(definition: &CommandDefinition) -> Result<(), CatalogError> {
    let id = &definition.id;

    if definition.reward_min < 0 || definition.reward_min > definition.reward_max {
        return Err(CatalogError::InvalidRewardRange {
            id: id.clone(),
            min: definition.reward_min,
            max: definition.reward_max,
        });
    }
    if definition.reward_max - definition.reward_min > i64::from(u32::MAX) {
        return Err(CatalogError::RewardSpanTooWide { id: id.clone() });
    }
    if !(0.0..=1.0).contains(&definition.success_probability) {
        return Err(CatalogError::InvalidProbability {
            id: id.clone(),
            value: definition.success_probability,
        });
    }
    if definition.xp_reward < 0 {
        return Err(CatalogError::NegativeQuantity {
            id: id.clone(),
            field: "xp_reward",
        });
    }
    if definition.unlock_cost < 0 {
        return Err(CatalogError::NegativeQuantity {
            id: id.clone(),
            field: "unlock_cost",
        });
    }
    if definition.required_level < 1 {
        return Err(CatalogError::InvalidRequiredLevel { id: id.clone() });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn player_with_unlocks(unlocked: Vec<String>) -> PlayerRecord {
        PlayerRecord {
            player_id: Uuid::new_v4(),
            handle: "operator".to_owned(),
            level: 1,
            xp: 0,
            balance: 0,
            unlocked_commands: unlocked,
            banned: false,
            ban_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 0,
        }
    }

    fn definition(id: &str) -> CommandDefinition {
        CommandDefinition {
            id: id.to_owned(),
            title: id.to_owned(),
            script: format!("./{id}"),
            reward_min: 1,
            reward_max: 5,
            fail_penalty: -2,
            success_probability: 0.5,
            cooldown_secs: 10,
            xp_reward: 4,
            unlock_cost: 100,
            required_level: 1,
            lesson_only: false,
        }
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        assert!(catalog.get("phish").is_some());
    }

    #[test]
    fn test_builtin_phish_matches_original_tuning() {
        let catalog = Catalog::builtin();
        let phish = catalog.get("phish").unwrap();
        assert_eq!(phish.reward_min, 1);
        assert_eq!(phish.reward_max, 5);
        assert_eq!(phish.fail_penalty, -2);
        assert!((phish.success_probability - 0.71).abs() < f64::EPSILON);
        assert_eq!(phish.cooldown_secs, 12);
        assert!(phish.is_starter());
        assert_eq!(phish.xp_on_failure(), 1);
    }

    #[test]
    fn test_empty_catalog_is_rejected() {
        let result = Catalog::new(vec![]);
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let result = Catalog::new(vec![definition("phish"), definition("phish")]);
        assert!(matches!(result, Err(CatalogError::DuplicateCommand(id)) if id == "phish"));
    }

    #[test]
    fn test_inverted_reward_range_is_rejected() {
        let mut bad = definition("phish");
        bad.reward_min = 10;
        bad.reward_max = 5;

        let result = Catalog::new(vec![bad]);
        assert!(matches!(
            result,
            Err(CatalogError::InvalidRewardRange { min: 10, max: 5, .. })
        ));
    }

    #[test]
    fn test_negative_reward_min_is_rejected() {
        let mut bad = definition("phish");
        bad.reward_min = -1;

        let result = Catalog::new(vec![bad]);
        assert!(matches!(result, Err(CatalogError::InvalidRewardRange { .. })));
    }

    #[test]
    fn test_fixed_reward_is_allowed() {
        let mut fixed = definition("phish");
        fixed.reward_min = 3;
        fixed.reward_max = 3;

        assert!(Catalog::new(vec![fixed]).is_ok());
    }

    #[test]
    fn test_probability_above_one_is_rejected() {
        let mut bad = definition("phish");
        bad.success_probability = 1.5;

        let result = Catalog::new(vec![bad]);
        assert!(matches!(result, Err(CatalogError::InvalidProbability { .. })));
    }

    #[test]
    fn test_probability_bounds_are_inclusive() {
        let mut zero = definition("zero");
        zero.success_probability = 0.0;
        let mut one = definition("one");
        one.success_probability = 1.0;

        assert!(Catalog::new(vec![zero, one]).is_ok());
    }

    #[test]
    fn test_nan_probability_is_rejected() {
        let mut bad = definition("phish");
        bad.success_probability = f64::NAN;

        let result = Catalog::new(vec![bad]);
        assert!(matches!(result, Err(CatalogError::InvalidProbability { .. })));
    }

    #[test]
    fn test_negative_xp_reward_is_rejected() {
        let mut bad = definition("phish");
        bad.xp_reward = -4;

        let result = Catalog::new(vec![bad]);
        assert!(matches!(
            result,
            Err(CatalogError::NegativeQuantity { field: "xp_reward", .. })
        ));
    }

    #[test]
    fn test_get_unknown_id_returns_none() {
        let catalog = Catalog::builtin();
        assert!(catalog.get("nonexistent").is_none());
    }

    #[test]
    fn test_starter_command_is_unlocked_for_everyone() {
        let catalog = Catalog::builtin();
        let player = player_with_unlocks(vec![]);
        assert!(catalog.is_unlocked_for(&player, "phish"));
    }

    #[test]
    fn test_priced_command_is_locked_until_purchased() {
        let catalog = Catalog::builtin();
        let player = player_with_unlocks(vec![]);
        assert!(!catalog.is_unlocked_for(&player, "portscan"));

        let owner = player_with_unlocks(vec!["portscan".to_owned()]);
        assert!(catalog.is_unlocked_for(&owner, "portscan"));
    }

    #[test]
    fn test_lesson_only_zero_cost_is_not_a_starter() {
        let mut limited = definition("limited");
        limited.unlock_cost = 0;
        limited.lesson_only = true;
        let catalog = Catalog::new(vec![limited]).unwrap();

        let player = player_with_unlocks(vec![]);
        assert!(!catalog.is_unlocked_for(&player, "limited"));
    }

    #[test]
    fn test_unknown_command_is_never_unlocked() {
        let catalog = Catalog::builtin();
        let player = player_with_unlocks(vec!["nonexistent".to_owned()]);
        assert!(!catalog.is_unlocked_for(&player, "nonexistent"));
    }

    #[test]
    fn test_from_yaml_str_round_trip() {
        let yaml = r"
commands:
  - id: probe
    title: Probe
    script: ./probe
    reward_min: 2
    reward_max: 2
    fail_penalty: 0
    success_probability: 1.0
    cooldown_secs: 0
    xp_reward: 1
    unlock_cost: 0
    required_level: 1
";
        let catalog = Catalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.len(), 1);
        let probe = catalog.get("probe").unwrap();
        assert!(probe.is_starter());
        assert_eq!(probe.cooldown(), chrono::Duration::zero());
    }

    #[test]
    fn test_malformed_yaml_is_rejected() {
        let result = Catalog::from_yaml_str("commands: [not, a, definition]");
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }
}
