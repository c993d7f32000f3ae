//! Keys, names and connection state of the four participant roles.
//!
//! Every command carries a key. The registry maps it to the role it was
//! issued to, checks the role may send that command, and remembers which
//! session the role last spoke from so frames reach the right socket after a
//! reconnect. A commentator or reporter that is not launched is unregistered:
//! it holds no key and counts as ready.

use crate::error::AuthError;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{GameInfo, Role, RpcCommand, Team, KEY_LENGTH};

const KEY_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random ASCII-letter key of [`KEY_LENGTH`] characters.
pub fn generate_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..KEY_LENGTH)
        .filter_map(|_| KEY_ALPHABET.choose(rng).map(|&c| c as char))
        .collect()
}

#[derive(Debug, Clone)]
struct RoleEntry {
    name: String,
    key: Option<String>,
    session: Option<u32>,
    ready: bool,
}

#[derive(Debug)]
pub struct RoleRegistry {
    entries: [RoleEntry; 4],
    game_time_ms: u64,
}

impl RoleRegistry {
    /// Issues a fresh key to every role. `names` follows [`Role::ALL`].
    pub fn new<R: Rng + ?Sized>(names: [String; 4], game_time_ms: u64, rng: &mut R) -> Self {
        let entries = names.map(|name| RoleEntry {
            name,
            key: Some(generate_key(rng)),
            session: None,
            ready: false,
        });
        Self { entries, game_time_ms }
    }

    fn entry(&self, role: Role) -> &RoleEntry {
        &self.entries[index(role)]
    }

    fn entry_mut(&mut self, role: Role) -> &mut RoleEntry {
        &mut self.entries[index(role)]
    }

    /// Key issued to `role`, `None` once the role is unregistered.
    pub fn key(&self, role: Role) -> Option<&str> {
        self.entry(role).key.as_deref()
    }

    pub fn name(&self, role: Role) -> &str {
        &self.entry(role).name
    }

    pub fn resolve(&self, key: &str) -> Result<Role, AuthError> {
        Role::ALL
            .into_iter()
            .find(|&role| self.key(role) == Some(key))
            .ok_or_else(|| AuthError::UnknownKey(key.to_string()))
    }

    /// Checks that `role` may send `command`.
    pub fn authorize(&self, role: Role, command: &RpcCommand) -> Result<(), AuthError> {
        let allowed = match command {
            RpcCommand::GetInfo | RpcCommand::Ready | RpcCommand::Invalid(_) => true,
            RpcCommand::SetSpeeds(_) => role.team().is_some(),
            RpcCommand::Commentate(_) => role == Role::Commentator,
            RpcCommand::Report(_) => role == Role::Reporter,
        };
        if allowed {
            Ok(())
        } else {
            Err(AuthError::Forbidden {
                role,
                command: command.name(),
            })
        }
    }

    /// Routes the role's frames to `session` from now on.
    pub fn bind(&mut self, role: Role, session: u32) {
        let entry = self.entry_mut(role);
        if entry.session != Some(session) {
            info!("{} speaks from session {}", role, session);
            entry.session = Some(session);
        }
    }

    /// Forgets a closed session wherever it is bound.
    pub fn unbind_session(&mut self, session: u32) {
        for entry in self.entries.iter_mut().filter(|e| e.session == Some(session)) {
            entry.session = None;
        }
    }

    pub fn session_of(&self, role: Role) -> Option<u32> {
        self.entry(role).session
    }

    /// Revokes the role's key and stops waiting for it. Commands signed with
    /// the old key are rejected from then on.
    pub fn unregister(&mut self, role: Role) {
        let entry = self.entry_mut(role);
        entry.key = None;
        entry.session = None;
        entry.ready = true;
    }

    pub fn is_registered(&self, role: Role) -> bool {
        self.entry(role).key.is_some()
    }

    pub fn mark_ready(&mut self, role: Role) {
        self.entry_mut(role).ready = true;
    }

    pub fn is_ready(&self, role: Role) -> bool {
        self.entry(role).ready
    }

    pub fn all_ready(&self) -> bool {
        self.entries.iter().all(|e| e.ready)
    }

    /// `get_info` answer for `role`. Commentator and reporter see team red's
    /// view with their own key.
    pub fn info_for(&self, role: Role) -> GameInfo {
        let team = role.team().unwrap_or(Team::Red);
        GameInfo::new(
            self.game_time_ms as f64 / 1000.0,
            self.name(Role::of_team(team)),
            self.name(Role::of_team(team.opponent())),
            self.key(role).unwrap_or_default(),
        )
    }

    /// Exchanges everything held for team red and team blue, so each team
    /// process plays the other side with the key it already has.
    pub fn swap_teams(&mut self) {
        self.entries.swap(index(Role::TeamRed), index(Role::TeamBlue));
        info!(
            "Roles swapped: {} plays red, {} plays blue",
            self.name(Role::TeamRed),
            self.name(Role::TeamBlue)
        );
    }
}

fn index(role: Role) -> usize {
    match role {
        Role::TeamRed => 0,
        Role::TeamBlue => 1,
        Role::Commentator => 2,
        Role::Reporter => 3,
    }
}
