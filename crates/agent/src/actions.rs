use std::collections::HashMap;

use duel_shared::ActionConfig;

/// One discrete aiming/firing choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Action {
    pub fire: bool,
    /// Turret declination to command.
    pub declination: f32,
    /// Added to the turret-lock bearing.
    pub correction: f32,
}

type ActionKey = (bool, u32, u32);

fn key_of(a: &Action) -> ActionKey {
    (a.fire, a.declination.to_bits(), a.correction.to_bits())
}

/// Ordered, fixed list of actions. An action's identity is its index.
#[derive(Debug, Clone)]
pub struct ActionSpace {
    actions: Vec<Action>,
    index: HashMap<ActionKey, usize>,
    fires: bool,
}

impl ActionSpace {
    /// Fire flag x declination x correction, fire flag outermost.
    pub fn combined(config: &ActionConfig) -> Self {
        Self::build(&[false, true], config)
    }

    /// Declination x correction only; firing is decided elsewhere.
    pub fn aiming(config: &ActionConfig) -> Self {
        Self::build(&[false], config)
    }

    fn build(fire_domain: &[bool], config: &ActionConfig) -> Self {
        let declinations = linspace(0.0, config.declination_max, config.declination_levels);
        let corrections = linspace(
            -config.correction_span,
            config.correction_span,
            config.correction_levels,
        );

        let mut actions = Vec::with_capacity(fire_domain.len() * declinations.len() * corrections.len());
        for &fire in fire_domain {
            for &declination in &declinations {
                for &correction in &corrections {
                    actions.push(Action {
                        fire,
                        declination,
                        correction,
                    });
                }
            }
        }

        let index = actions
            .iter()
            .enumerate()
            .map(|(i, a)| (key_of(a), i))
            .collect();

        Self {
            actions,
            index,
            fires: fire_domain.contains(&true),
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Whether the fire flag is part of the action.
    pub fn has_fire_flag(&self) -> bool {
        self.fires
    }

    pub fn get(&self, idx: usize) -> Option<&Action> {
        self.actions.get(idx)
    }

    pub fn index_of(&self, action: &Action) -> Option<usize> {
        self.index.get(&key_of(action)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}

/// `n` evenly spaced values from `lo` to `hi` inclusive.
pub fn linspace(lo: f32, hi: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f32;
            (0..n)
                .map(|i| if i == n - 1 { hi } else { lo + step * i as f32 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 2.5, 6), vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5]);
        let c = linspace(-2.5, 2.5, 11);
        assert_eq!(c.len(), 11);
        assert_eq!(c[0], -2.5);
        assert_eq!(c[5], 0.0);
        assert_eq!(c[10], 2.5);
        assert_eq!(linspace(1.0, 5.0, 1), vec![1.0]);
        assert!(linspace(1.0, 5.0, 0).is_empty());
    }

    #[test]
    fn test_combined_size_and_order() {
        let space = ActionSpace::combined(&ActionConfig::default());
        assert_eq!(space.len(), 2 * 6 * 11);
        assert!(space.has_fire_flag());

        let first = space.get(0).unwrap();
        assert!(!first.fire);
        assert_eq!(first.declination, 0.0);
        assert_eq!(first.correction, -2.5);

        // fire flag is the outermost dimension
        let half = space.get(66).unwrap();
        assert!(half.fire);
        assert_eq!(half.declination, 0.0);
        assert_eq!(half.correction, -2.5);

        let last = space.get(131).unwrap();
        assert!(last.fire);
        assert_eq!(last.declination, 2.5);
        assert_eq!(last.correction, 2.5);
        assert!(space.get(132).is_none());
    }

    #[test]
    fn test_aiming_has_no_fire() {
        let space = ActionSpace::aiming(&ActionConfig::default());
        assert_eq!(space.len(), 66);
        assert!(!space.has_fire_flag());
        assert!(space.iter().all(|a| !a.fire));
    }

    #[test]
    fn test_index_of_matches_position() {
        let space = ActionSpace::combined(&ActionConfig::default());
        for (i, a) in space.iter().enumerate() {
            assert_eq!(space.index_of(a), Some(i));
        }
        let foreign = Action {
            fire: true,
            declination: 0.25,
            correction: 0.0,
        };
        assert_eq!(space.index_of(&foreign), None);
    }
}
