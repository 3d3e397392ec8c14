use std::collections::BTreeMap;

use crate::cache::Handle;

use super::VideoError;

pub const HEX_DIRECTION_COUNT: u8 = 6;

/// Animations keyed by `(action, direction)`, one of which is active.
#[derive(Debug, Clone, Default)]
pub struct ComplexAnimation {
    name: String,
    actions: BTreeMap<u8, BTreeMap<u8, Handle>>,
    action: u8,
    direction: u8,
    active: Option<Handle>,
}

impl ComplexAnimation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn register_animation(&mut self, action: u8, direction: u8, animation: Handle) {
        self.actions
            .entry(action)
            .or_default()
            .insert(direction, animation);
    }

    pub fn register_all_directions(&mut self, action: u8, animation: Handle) {
        for direction in 0..HEX_DIRECTION_COUNT {
            self.register_animation(action, direction, animation);
        }
    }

    pub fn lookup(&self, action: u8, direction: u8) -> Result<Handle, VideoError> {
        self.actions
            .get(&action)
            .and_then(|directions| directions.get(&direction))
            .copied()
            .ok_or(VideoError::UnregisteredAction { action, direction })
    }

    pub fn set_action_direction(&mut self, action: u8, direction: u8) -> Result<(), VideoError> {
        let animation = self.lookup(action, direction)?;
        self.action = action;
        self.direction = direction;
        self.active = Some(animation);
        Ok(())
    }

    pub fn set_action(&mut self, action: u8) -> Result<(), VideoError> {
        self.set_action_direction(action, self.direction)
    }

    pub fn set_direction(&mut self, direction: u8) -> Result<(), VideoError> {
        self.set_action_direction(self.action, direction)
    }

    /// Activates the lowest registered `(action, direction)` pair.
    pub fn activate_first(&mut self) -> Result<(), VideoError> {
        let first = self.actions.iter().find_map(|(action, directions)| {
            directions
                .keys()
                .next()
                .map(|direction| (*action, *direction))
        });
        match first {
            Some((action, direction)) => self.set_action_direction(action, direction),
            None => Err(VideoError::NoFrames),
        }
    }

    pub fn action(&self) -> u8 {
        self.action
    }

    pub fn direction(&self) -> u8 {
        self.direction
    }

    pub fn active_animation(&self) -> Option<Handle> {
        self.active
    }

    pub fn registered_count(&self) -> usize {
        self.actions.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_action_and_direction_changes_active_animation() {
        let mut complex = ComplexAnimation::new("critter");
        complex.register_animation(0, 0, Handle::from_raw(10));
        complex.register_animation(0, 3, Handle::from_raw(11));
        complex.register_animation(1, 3, Handle::from_raw(12));

        complex.set_action(0).expect("action 0 dir 0");
        assert_eq!(complex.active_animation(), Some(Handle::from_raw(10)));
        complex.set_direction(3).expect("action 0 dir 3");
        assert_eq!(complex.active_animation(), Some(Handle::from_raw(11)));
        complex.set_action(1).expect("action 1 dir 3");
        assert_eq!(complex.active_animation(), Some(Handle::from_raw(12)));
    }

    #[test]
    fn unregistered_pair_fails_and_keeps_state() {
        let mut complex = ComplexAnimation::new("critter");
        complex.register_animation(0, 0, Handle::from_raw(10));
        complex.set_action(0).expect("registered");

        assert_eq!(
            complex.set_direction(4),
            Err(VideoError::UnregisteredAction {
                action: 0,
                direction: 4
            })
        );
        assert_eq!(complex.direction(), 0);
        assert_eq!(complex.active_animation(), Some(Handle::from_raw(10)));
    }

    #[test]
    fn all_directions_registration_covers_hex_directions() {
        let mut complex = ComplexAnimation::new("door");
        complex.register_all_directions(2, Handle::from_raw(7));
        assert_eq!(complex.registered_count(), HEX_DIRECTION_COUNT as usize);
        for direction in 0..HEX_DIRECTION_COUNT {
            assert_eq!(complex.lookup(2, direction), Ok(Handle::from_raw(7)));
        }
    }

    #[test]
    fn activate_first_picks_lowest_pair() {
        let mut complex = ComplexAnimation::new("critter");
        assert!(complex.activate_first().is_err());
        complex.register_animation(4, 2, Handle::from_raw(3));
        complex.register_animation(1, 5, Handle::from_raw(4));
        complex.activate_first().expect("activate");
        assert_eq!((complex.action(), complex.direction()), (1, 5));
    }
}
