//! Entity registry: the hecs world plus stable-identifier indexes.
//!
//! Every cross-entity link (mob to spawner, projectile to owner, player to
//! realm) is stored as an identifier and resolved here at use time. Indexes
//! are ordered maps so iteration order is deterministic.

use std::collections::{BTreeMap, BTreeSet};

use hecs::{Entity, World};

use arena_core::components::*;
use arena_core::constants::{DEFAULT_REALM, PLAYER_MAX_ENERGY, ENERGY_REGEN_PER_SEC};
use arena_core::realms::RealmConfig;
use arena_core::types::{Position, Velocity};

use arena_drone_ai::brain::Brain;

/// Owns all simulation entities and the lookup tables into them.
pub struct Registry {
    pub world: World,
    realms: Vec<RealmConfig>,
    players: BTreeMap<String, Entity>,
    members: BTreeMap<String, BTreeSet<String>>,
    mobs: BTreeMap<MobId, Entity>,
    spawners: BTreeMap<SpawnerId, Entity>,
    next_mob_id: u32,
    next_spawner_id: u32,
    next_projectile_id: u64,
}

impl Registry {
    pub fn new(realms: Vec<RealmConfig>) -> Self {
        let members = realms
            .iter()
            .map(|r| (r.name.clone(), BTreeSet::new()))
            .collect();
        Self {
            world: World::new(),
            realms,
            players: BTreeMap::new(),
            members,
            mobs: BTreeMap::new(),
            spawners: BTreeMap::new(),
            next_mob_id: 0,
            next_spawner_id: 0,
            next_projectile_id: 0,
        }
    }

    // ---- Realms ----

    pub fn realms(&self) -> &[RealmConfig] {
        &self.realms
    }

    pub fn realm(&self, name: &str) -> Option<&RealmConfig> {
        self.realms.iter().find(|r| r.name == name)
    }

    /// The named realm, or the default realm when the name is unknown.
    pub fn realm_or_default(&self, name: &str) -> Option<&RealmConfig> {
        self.realm(name).or_else(|| self.realm(DEFAULT_REALM))
    }

    /// Usernames currently in a realm, in name order.
    pub fn members(&self, realm: &str) -> impl Iterator<Item = &str> {
        self.members
            .get(realm)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    // ---- Players ----

    pub fn player(&self, username: &str) -> Option<Entity> {
        self.players.get(username).copied()
    }

    pub fn has_player(&self, username: &str) -> bool {
        self.players.contains_key(username)
    }

    /// Connected players in name order.
    pub fn players(&self) -> impl Iterator<Item = (&str, Entity)> {
        self.players.iter().map(|(name, e)| (name.as_str(), *e))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Spawn a player entity with full energy and idle weapons.
    pub fn insert_player(&mut self, player: Player, position: Position, now: f64) -> Entity {
        let username = player.username.clone();
        let realm = player.realm.clone();
        let energy = Energy {
            current: PLAYER_MAX_ENERGY,
            max: PLAYER_MAX_ENERGY,
            regen_per_sec: ENERGY_REGEN_PER_SEC,
            regen_accum_secs: 0.0,
            next_status_at: now,
        };
        let entity = self.world.spawn((
            player,
            position,
            Velocity::default(),
            energy,
            WeaponState::default(),
        ));
        self.players.insert(username.clone(), entity);
        self.members.entry(realm).or_default().insert(username);
        entity
    }

    /// Despawn a player, returning its final components.
    pub fn remove_player(&mut self, username: &str) -> Option<(Player, Position)> {
        let entity = self.players.remove(username)?;
        let player = self.world.get::<&Player>(entity).ok().map(|p| (*p).clone());
        let position = self
            .world
            .get::<&Position>(entity)
            .ok()
            .map(|p| *p)
            .unwrap_or_default();
        let _ = self.world.despawn(entity);
        let player = player?;
        if let Some(set) = self.members.get_mut(&player.realm) {
            set.remove(username);
        }
        Some((player, position))
    }

    /// Move a player's realm membership. The caller updates the component.
    pub fn move_member(&mut self, username: &str, from: &str, to: &str) {
        if let Some(set) = self.members.get_mut(from) {
            set.remove(username);
        }
        self.members
            .entry(to.to_string())
            .or_default()
            .insert(username.to_string());
    }

    // ---- Mobs ----

    pub fn mob(&self, id: MobId) -> Option<Entity> {
        self.mobs.get(&id).copied()
    }

    /// Live drones in id order.
    pub fn mob_ids(&self) -> Vec<MobId> {
        self.mobs.keys().copied().collect()
    }

    pub fn allocate_mob_id(&mut self) -> MobId {
        let id = MobId(self.next_mob_id);
        self.next_mob_id += 1;
        id
    }

    pub fn insert_mob(&mut self, mob: Mob, position: Position, brain: Brain) -> MobId {
        let id = mob.id;
        let entity = self
            .world
            .spawn((mob, position, Velocity::default(), brain));
        self.mobs.insert(id, entity);
        id
    }

    /// Remove a drone from the world and from its owning spawner.
    pub fn remove_mob(&mut self, id: MobId) -> Option<Mob> {
        let entity = self.mobs.remove(&id)?;
        let mob = self.world.get::<&Mob>(entity).ok().map(|m| (*m).clone());
        let _ = self.world.despawn(entity);
        let mob = mob?;
        if let Some(owner) = mob.spawner.and_then(|s| self.spawner(s)) {
            if let Ok(mut spawner) = self.world.get::<&mut Spawner>(owner) {
                spawner.owned.remove(&id);
            }
        }
        Some(mob)
    }

    // ---- Spawners ----

    pub fn spawner(&self, id: SpawnerId) -> Option<Entity> {
        self.spawners.get(&id).copied()
    }

    pub fn spawner_ids(&self) -> Vec<SpawnerId> {
        self.spawners.keys().copied().collect()
    }

    pub fn allocate_spawner_id(&mut self) -> SpawnerId {
        let id = SpawnerId(self.next_spawner_id);
        self.next_spawner_id += 1;
        id
    }

    pub fn insert_spawner(&mut self, spawner: Spawner, position: Position) -> SpawnerId {
        let id = spawner.id;
        let entity = self.world.spawn((spawner, position));
        self.spawners.insert(id, entity);
        id
    }

    // ---- Projectiles ----

    pub fn spawn_projectile(
        &mut self,
        owner: ProjectileOwner,
        realm: &str,
        position: Position,
        velocity: Velocity,
        damage: f64,
        lifetime_secs: f64,
    ) -> ProjectileId {
        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id += 1;
        self.world.spawn((
            Projectile {
                id,
                owner,
                damage,
                lifetime_secs,
                realm: realm.to_string(),
            },
            position,
            velocity,
        ));
        id
    }

    pub fn projectile_count(&self) -> usize {
        self.world.query::<&Projectile>().iter().count()
    }
}
