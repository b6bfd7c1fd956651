//! The room table: matchmaking containers keyed by monotonic id.
//!
//! Membership rules are enforced here so every mutation path preserves the
//! same invariants: a player belongs to at most one room, the host is always
//! a member, and a room vanishes the moment it empties.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::protocol::{RoomPhase, RoomSnapshot};

use super::ready_check::ReadyCheck;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("Room not found")]
    NotFound,
    #[error("Room is full")]
    Full,
    #[error("Game already in progress")]
    InProgress,
}

#[derive(Debug)]
pub struct Room {
    pub id: u32,
    pub name: String,
    pub game_id: u32,
    pub game_name: String,
    pub host: String,
    pub members: Vec<String>,
    pub min_players: u32,
    pub max_players: u32,
    pub phase: RoomPhase,
    pub ready_check: Option<ReadyCheck>,
    /// Bumped on every start attempt; stale timer/launch/child events carrying
    /// an older value are ignored.
    pub launch_seq: u64,
}

impl Room {
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id,
            name: self.name.clone(),
            game_id: self.game_id,
            game_name: self.game_name.clone(),
            host: self.host.clone(),
            members: self.members.clone(),
            min_players: self.min_players,
            max_players: self.max_players,
            status: self.phase,
        }
    }

    pub fn is_member(&self, player: &str) -> bool {
        self.members.iter().any(|m| m == player)
    }

    pub fn next_seq(&mut self) -> u64 {
        self.launch_seq += 1;
        self.launch_seq
    }
}

/// What happened to the room a player left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub room_id: u32,
    /// The room emptied and was destroyed.
    pub destroyed: bool,
    /// Hosting passed to the oldest remaining member.
    pub host_changed: bool,
}

#[derive(Debug, Default)]
pub struct Rooms {
    rooms: BTreeMap<u32, Room>,
    next_id: u32,
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: u32) -> Option<&Room> {
        self.rooms.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// The room a player currently belongs to, if any.
    pub fn room_of(&self, player: &str) -> Option<u32> {
        self.rooms
            .values()
            .find(|r| r.is_member(player))
            .map(|r| r.id)
    }

    pub fn references_game(&self, game_id: u32) -> bool {
        self.rooms.values().any(|r| r.game_id == game_id)
    }

    /// Create a room hosted by `host`, removing the host from any prior room
    /// first. Returns the new room id and the outcome for the prior room.
    pub fn create(
        &mut self,
        name: String,
        game_id: u32,
        game_name: String,
        min_players: u32,
        max_players: u32,
        host: String,
    ) -> (u32, Option<LeaveOutcome>) {
        let prior = self.leave(&host);

        self.next_id += 1;
        let id = self.next_id;
        self.rooms.insert(
            id,
            Room {
                id,
                name,
                game_id,
                game_name,
                host: host.clone(),
                members: vec![host],
                min_players,
                max_players,
                phase: RoomPhase::Waiting,
                ready_check: None,
                launch_seq: 0,
            },
        );
        (id, prior)
    }

    /// Admit a player. Idempotent when the player is already a member.
    /// Admission requires a waiting room with spare capacity; only then does
    /// the player leave any prior room.
    pub fn join(
        &mut self,
        id: u32,
        player: &str,
    ) -> Result<(bool, Option<LeaveOutcome>), JoinError> {
        let room = self.rooms.get(&id).ok_or(JoinError::NotFound)?;
        if room.is_member(player) {
            return Ok((false, None));
        }
        if room.phase != RoomPhase::Waiting {
            return Err(JoinError::InProgress);
        }
        if room.members.len() as u32 >= room.max_players {
            return Err(JoinError::Full);
        }

        let prior = self.leave(player);
        // The target room cannot have been the prior room (membership was
        // checked above), so it still exists.
        if let Some(room) = self.rooms.get_mut(&id) {
            room.members.push(player.to_string());
        }
        Ok((true, prior))
    }

    /// Remove a player from whichever room holds them. Destroys the room when
    /// it empties, transfers hosting otherwise.
    pub fn leave(&mut self, player: &str) -> Option<LeaveOutcome> {
        let room_id = self.room_of(player)?;
        let room = self.rooms.get_mut(&room_id)?;
        room.members.retain(|m| m != player);

        if room.members.is_empty() {
            self.rooms.remove(&room_id);
            return Some(LeaveOutcome {
                room_id,
                destroyed: true,
                host_changed: false,
            });
        }

        let mut host_changed = false;
        if room.host == player {
            room.host = room.members[0].clone();
            host_changed = true;
        }
        Some(LeaveOutcome {
            room_id,
            destroyed: false,
            host_changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn create_default(rooms: &mut Rooms, host: &str) -> u32 {
        rooms
            .create("room".into(), 1, "RPS".into(), 2, 4, host.into())
            .0
    }

    #[test]
    fn ids_are_monotonic() {
        let mut rooms = Rooms::new();
        let a = create_default(&mut rooms, "p1");
        let b = create_default(&mut rooms, "p2");
        assert_eq!((a, b), (1, 2));
    }

    #[test]
    fn join_is_idempotent_for_members() {
        let mut rooms = Rooms::new();
        let id = create_default(&mut rooms, "p1");
        rooms.join(id, "p2").unwrap();
        let (admitted, prior) = rooms.join(id, "p2").unwrap();
        assert!(!admitted);
        assert!(prior.is_none());
        assert_eq!(rooms.get(id).unwrap().members, vec!["p1", "p2"]);
    }

    #[test]
    fn join_refuses_full_and_playing_rooms() {
        let mut rooms = Rooms::new();
        let id = rooms
            .create("room".into(), 1, "RPS".into(), 2, 2, "p1".into())
            .0;
        rooms.join(id, "p2").unwrap();
        assert_eq!(rooms.join(id, "p3").unwrap_err(), JoinError::Full);

        rooms.get_mut(id).unwrap().phase = RoomPhase::Playing;
        // p2 already inside: still idempotent even while playing
        assert!(rooms.join(id, "p2").is_ok());
        rooms.get_mut(id).unwrap().members.pop();
        assert_eq!(rooms.join(id, "p3").unwrap_err(), JoinError::InProgress);
    }

    #[test]
    fn creating_a_room_leaves_the_prior_one() {
        let mut rooms = Rooms::new();
        let first = create_default(&mut rooms, "p1");
        rooms.join(first, "p2").unwrap();

        let (second, prior) = rooms.create("other".into(), 1, "RPS".into(), 2, 4, "p1".into());
        let prior = prior.unwrap();
        assert_eq!(prior.room_id, first);
        assert!(prior.host_changed);
        assert_eq!(rooms.get(first).unwrap().host, "p2");
        assert_eq!(rooms.room_of("p1"), Some(second));
    }

    #[test]
    fn last_leave_destroys_the_room() {
        let mut rooms = Rooms::new();
        let id = create_default(&mut rooms, "p1");
        let outcome = rooms.leave("p1").unwrap();
        assert!(outcome.destroyed);
        assert!(rooms.get(id).is_none());
    }

    #[test]
    fn host_leaving_promotes_oldest_member() {
        let mut rooms = Rooms::new();
        let id = create_default(&mut rooms, "p1");
        rooms.join(id, "p2").unwrap();
        rooms.join(id, "p3").unwrap();

        let outcome = rooms.leave("p1").unwrap();
        assert!(!outcome.destroyed);
        assert!(outcome.host_changed);
        let room = rooms.get(id).unwrap();
        assert_eq!(room.host, "p2");
        assert_eq!(room.members, vec!["p2", "p3"]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create(usize),
        Join(u32, usize),
        Leave(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..6).prop_map(Op::Create),
            (1u32..8, 0usize..6).prop_map(|(r, p)| Op::Join(r, p)),
            (0usize..6).prop_map(Op::Leave),
        ]
    }

    proptest! {
        /// For all sequences of create/join/leave, every player appears in at
        /// most one room, hosts are members, capacity holds, and no room is
        /// ever empty.
        #[test]
        fn membership_invariants_hold(ops in proptest::collection::vec(op_strategy(), 1..60)) {
            let players = ["p0", "p1", "p2", "p3", "p4", "p5"];
            let mut rooms = Rooms::new();

            for op in ops {
                match op {
                    Op::Create(p) => {
                        rooms.create("r".into(), 1, "g".into(), 2, 3, players[p].into());
                    }
                    Op::Join(r, p) => {
                        let _ = rooms.join(r, players[p]);
                    }
                    Op::Leave(p) => {
                        rooms.leave(players[p]);
                    }
                }

                for player in &players {
                    let containing = rooms.iter().filter(|r| r.is_member(player)).count();
                    prop_assert!(containing <= 1, "{player} is in {containing} rooms");
                }
                for room in rooms.iter() {
                    prop_assert!(!room.members.is_empty());
                    prop_assert!(room.is_member(&room.host));
                    prop_assert!(room.members.len() as u32 <= room.max_players);
                }
            }
        }
    }
}
