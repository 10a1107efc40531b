pub mod tactics;
pub mod cruiser;
pub mod wanderer;
pub mod chaser;
pub mod orbiter;
pub mod gunner;
pub mod marksman;
pub mod terminator;

pub use chaser::Chaser;
pub use cruiser::Cruiser;
pub use gunner::Gunner;
pub use marksman::Marksman;
pub use orbiter::Orbiter;
pub use terminator::Terminator;
pub use wanderer::Wanderer;

use duel_shared::{ControllerConfig, ControllerKind};

use crate::actions::ActionSpace;
use crate::learning::TableError;
use crate::policy::Controller;

/// Action space a learning variant's table is indexed by; `None` for heuristic variants.
pub fn action_space(config: &ControllerConfig) -> Option<ActionSpace> {
    match config.kind {
        ControllerKind::Terminator => Some(ActionSpace::combined(&config.actions)),
        ControllerKind::Gunner | ControllerKind::Marksman => Some(ActionSpace::aiming(&config.actions)),
        _ => None,
    }
}

/// Build the configured controller. Learning variants restore their table first
/// when asked to.
pub fn build(config: &ControllerConfig) -> Result<Box<dyn Controller>, TableError> {
    let mut controller: Box<dyn Controller> = match config.kind {
        ControllerKind::Cruiser => Box::new(Cruiser::new(&config.driving)),
        ControllerKind::Wanderer => Box::new(Wanderer::new(config)),
        ControllerKind::Chaser => Box::new(Chaser::new(&config.driving)),
        ControllerKind::Orbiter => Box::new(Orbiter::new(&config.driving)),
        ControllerKind::Gunner => Box::new(Gunner::new(config)),
        ControllerKind::Marksman => Box::new(Marksman::new(config)),
        ControllerKind::Terminator => Box::new(Terminator::new(config)),
    };

    if config.persistence.load_q_table {
        if let Some(agent) = controller.learner_mut() {
            agent.restore_with(&config.persistence.q_table_path, config.persistence.on_missing)?;
        }
    }
    Ok(controller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use duel_shared::MissingTable;

    #[test]
    fn test_build_every_kind() {
        for kind in ControllerKind::ALL {
            let controller = build(&ControllerConfig::for_kind(kind)).unwrap();
            assert_eq!(controller.name(), kind.name());
            assert_eq!(controller.learner().is_some(), kind.learns());
        }
    }

    #[test]
    fn test_action_space_matches_controller() {
        for kind in ControllerKind::ALL {
            let config = ControllerConfig::for_kind(kind);
            let controller = build(&config).unwrap();
            let expected = controller.learner().map(|agent| agent.actions().len());
            assert_eq!(action_space(&config).map(|space| space.len()), expected, "{kind}");
        }
        let gunner = ControllerConfig::for_kind(ControllerKind::Gunner);
        assert_eq!(action_space(&gunner).unwrap().len(), 2);
    }

    #[test]
    fn test_build_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ControllerConfig::default();
        config.persistence.load_q_table = true;
        config.persistence.q_table_path = dir.path().join("absent.json");

        assert!(matches!(build(&config), Err(TableError::Missing(_))));

        config.persistence.on_missing = MissingTable::Empty;
        let controller = build(&config).unwrap();
        assert!(controller.learner().unwrap().table().is_empty());

        // heuristic variants ignore the flag
        config.kind = ControllerKind::Chaser;
        config.persistence.on_missing = MissingTable::Fail;
        assert!(build(&config).is_ok());
    }
}
