use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::protocol::Role;

/// Credential store. A username is unique within a role; the same username in
/// both roles names two distinct accounts. Credentials are compared literally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStore {
    #[serde(default)]
    player: BTreeMap<String, String>,
    #[serde(default)]
    developer: BTreeMap<String, String>,
}

impl UserStore {
    fn accounts(&self, role: Role) -> &BTreeMap<String, String> {
        match role {
            Role::Player => &self.player,
            Role::Developer => &self.developer,
        }
    }

    fn accounts_mut(&mut self, role: Role) -> &mut BTreeMap<String, String> {
        match role {
            Role::Player => &mut self.player,
            Role::Developer => &mut self.developer,
        }
    }

    pub fn register(
        &mut self,
        role: Role,
        username: &str,
        password: &str,
    ) -> Result<(), StoreError> {
        let accounts = self.accounts_mut(role);
        if accounts.contains_key(username) {
            return Err(StoreError::UserExists);
        }
        accounts.insert(username.to_string(), password.to_string());
        Ok(())
    }

    pub fn verify(&self, role: Role, username: &str, password: &str) -> Result<(), StoreError> {
        match self.accounts(role).get(username) {
            Some(stored) if stored == password => Ok(()),
            _ => Err(StoreError::BadCredentials),
        }
    }

    #[cfg(test)]
    pub fn len(&self, role: Role) -> usize {
        self.accounts(role).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_verify() {
        let mut store = UserStore::default();
        store.register(Role::Player, "p1", "secret").unwrap();
        assert!(store.verify(Role::Player, "p1", "secret").is_ok());
        assert_eq!(
            store.verify(Role::Player, "p1", "wrong"),
            Err(StoreError::BadCredentials)
        );
        assert_eq!(
            store.verify(Role::Player, "nobody", "secret"),
            Err(StoreError::BadCredentials)
        );
    }

    #[test]
    fn duplicate_registration_within_role_fails() {
        let mut store = UserStore::default();
        store.register(Role::Player, "p1", "a").unwrap();
        assert_eq!(
            store.register(Role::Player, "p1", "b"),
            Err(StoreError::UserExists)
        );
        assert_eq!(store.len(Role::Player), 1);
    }

    #[test]
    fn same_username_in_both_roles_is_two_accounts() {
        let mut store = UserStore::default();
        store.register(Role::Player, "sam", "player-pass").unwrap();
        store
            .register(Role::Developer, "sam", "dev-pass")
            .unwrap();

        assert!(store.verify(Role::Player, "sam", "player-pass").is_ok());
        assert!(store.verify(Role::Developer, "sam", "dev-pass").is_ok());
        assert!(store.verify(Role::Player, "sam", "dev-pass").is_err());
    }

    #[test]
    fn snapshot_shape_is_role_keyed() {
        let mut store = UserStore::default();
        store.register(Role::Player, "p1", "x").unwrap();
        store.register(Role::Developer, "d1", "y").unwrap();

        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["player"]["p1"], "x");
        assert_eq!(json["developer"]["d1"], "y");
    }
}
