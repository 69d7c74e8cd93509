//! Ward bookkeeping and the combined team visibility overlay.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use lanewatch_core::{
    BuildingSnapshot, CoordinateTransform, PlacementError, Team, TeamView, TreeOcclusion,
    VisionCell, VisionSourceKind, WardId, WorldPoint, SENTRY_TRUE_SIGHT_RADIUS,
    WARD_EXPIRY_WARNING,
};
use tracing::debug;

use crate::VisionSimulator;

/// Distance within which a click selects a ward.
pub const WARD_HIT_RADIUS: f32 = 100.0;

/// Kinds of placeable wards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WardKind {
    /// Grants vision for a limited time.
    Observer,
    /// Grants true sight; never expires.
    Sentry,
}

impl WardKind {
    /// Vision source the ward provides.
    #[must_use]
    pub const fn vision_source(self) -> VisionSourceKind {
        match self {
            Self::Observer => VisionSourceKind::ObserverWard,
            Self::Sentry => VisionSourceKind::SentryWard,
        }
    }
}

/// Ward placed on the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ward {
    /// Identity of the ward.
    pub id: WardId,
    /// Kind of ward.
    pub kind: WardKind,
    /// Owning team.
    pub team: Team,
    /// World position the ward was placed at.
    pub position: WorldPoint,
    /// Vision cell containing the ward.
    pub cell: VisionCell,
    /// Game time of placement.
    pub placed_at: f64,
}

impl Ward {
    /// Seconds left before the ward expires, `None` for permanent wards.
    #[must_use]
    pub fn remaining(&self, now: f64) -> Option<f64> {
        self.kind
            .vision_source()
            .lifetime()
            .map(|lifetime| lifetime - (now - self.placed_at))
    }

    /// Whether the ward is still on the map at `now`.
    #[must_use]
    pub fn is_active(&self, now: f64) -> bool {
        self.remaining(now).map_or(true, |remaining| remaining > 0.0)
    }

    /// Whether the ward is about to expire.
    #[must_use]
    pub fn is_expiring(&self, now: f64) -> bool {
        self.remaining(now)
            .is_some_and(|remaining| remaining > 0.0 && remaining < WARD_EXPIRY_WARNING)
    }

    /// Radius drawn around the ward: the true-sight ring for sentries,
    /// the vision radius otherwise.
    #[must_use]
    pub fn display_radius(&self, is_day: bool) -> f32 {
        match self.kind {
            WardKind::Sentry => SENTRY_TRUE_SIGHT_RADIUS,
            WardKind::Observer => self.kind.vision_source().radius(is_day),
        }
    }
}

/// Fog-of-war overlay combining building and ward vision.
#[derive(Debug)]
pub struct FogOfWar {
    simulator: VisionSimulator,
    wards: BTreeMap<WardId, Ward>,
    next_ward: u32,
    is_day: bool,
    game_time: f64,
    building_cache: HashMap<(Team, bool), BTreeSet<VisionCell>>,
}

impl FogOfWar {
    /// Creates an overlay at daytime with no wards.
    #[must_use]
    pub fn new(simulator: VisionSimulator) -> Self {
        Self {
            simulator,
            wards: BTreeMap::new(),
            next_ward: 1,
            is_day: true,
            game_time: 0.0,
            building_cache: HashMap::new(),
        }
    }

    /// Underlying line-of-sight simulator.
    #[must_use]
    pub fn simulator(&self) -> &VisionSimulator {
        &self.simulator
    }

    /// Mutable access for ad-hoc visibility queries.
    pub fn simulator_mut(&mut self) -> &mut VisionSimulator {
        &mut self.simulator
    }

    /// Whether it is currently day.
    #[must_use]
    pub const fn is_day(&self) -> bool {
        self.is_day
    }

    /// Game time the overlay was last synchronized to.
    #[must_use]
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Wards in placement order.
    pub fn wards(&self) -> impl Iterator<Item = &Ward> {
        self.wards.values()
    }

    /// Looks up a ward.
    #[must_use]
    pub fn ward(&self, id: WardId) -> Option<&Ward> {
        self.wards.get(&id)
    }

    /// Places a ward after validating the target cell.
    pub fn place_ward<T>(
        &mut self,
        trees: &T,
        team: Team,
        kind: WardKind,
        position: WorldPoint,
    ) -> Result<WardId, PlacementError>
    where
        T: TreeOcclusion + ?Sized,
    {
        let cell = CoordinateTransform::world_to_vision(position);
        self.validate(trees, position, cell)?;

        let id = WardId::new(self.next_ward);
        self.next_ward = self.next_ward.wrapping_add(1);
        let _ = self.wards.insert(
            id,
            Ward {
                id,
                kind,
                team,
                position,
                cell,
                placed_at: self.game_time,
            },
        );
        debug!(ward = id.get(), ?kind, ?team, x = cell.x(), y = cell.y(), "ward placed");
        Ok(id)
    }

    /// Moves a ward; an invalid target leaves it in place.
    pub fn move_ward<T>(
        &mut self,
        trees: &T,
        id: WardId,
        position: WorldPoint,
    ) -> Result<(), PlacementError>
    where
        T: TreeOcclusion + ?Sized,
    {
        if !self.wards.contains_key(&id) {
            return Err(PlacementError::UnknownWard);
        }
        let cell = CoordinateTransform::world_to_vision(position);
        self.validate(trees, position, cell)?;
        if let Some(ward) = self.wards.get_mut(&id) {
            ward.position = position;
            ward.cell = cell;
        }
        Ok(())
    }

    /// Removes a ward.
    pub fn remove_ward(&mut self, id: WardId) -> Result<Ward, PlacementError> {
        self.wards.remove(&id).ok_or(PlacementError::UnknownWard)
    }

    /// Removes every ward.
    pub fn clear_wards(&mut self) {
        self.wards.clear();
    }

    /// Ward within [`WARD_HIT_RADIUS`] of the point, earliest placed first.
    #[must_use]
    pub fn hit_test_ward(&self, point: WorldPoint) -> Option<WardId> {
        self.wards
            .values()
            .find(|ward| ward.position.distance(point) < WARD_HIT_RADIUS)
            .map(|ward| ward.id)
    }

    /// Synchronizes the clock and drops expired wards, returning how many expired.
    pub fn set_game_time(&mut self, now: f64) -> usize {
        self.game_time = now;
        let before = self.wards.len();
        self.wards.retain(|_, ward| ward.is_active(now));
        let expired = before - self.wards.len();
        if expired > 0 {
            debug!(expired, now, "wards expired");
        }
        expired
    }

    /// Switches between day and night, invalidating cached building vision.
    pub fn set_daytime(&mut self, is_day: bool) {
        if self.is_day == is_day {
            return;
        }
        self.is_day = is_day;
        self.invalidate_building_cache();
    }

    /// Drops cached building vision, for example after trees changed.
    pub fn invalidate_building_cache(&mut self) {
        self.building_cache.clear();
    }

    /// Cells seen by the team's buildings at the current time of day.
    pub fn building_vision<T>(
        &mut self,
        trees: &T,
        buildings: &[BuildingSnapshot],
        team: Team,
    ) -> &BTreeSet<VisionCell>
    where
        T: TreeOcclusion + ?Sized,
    {
        let key = (team, self.is_day);
        if !self.building_cache.contains_key(&key) {
            let mut seen = BTreeSet::new();
            for building in buildings.iter().filter(|building| building.team == team) {
                let origin = CoordinateTransform::world_to_vision(building.position);
                let radius = building.kind.vision_source().grid_radius(self.is_day);
                let lit = self.simulator.update_visibility(trees, origin, radius);
                seen.extend(lit.iter().copied());
            }
            let _ = self.building_cache.insert(key, seen);
        }
        self.building_cache.entry(key).or_default()
    }

    /// Cells seen by one ward, empty for wards that grant no vision.
    pub fn ward_vision<T>(&mut self, trees: &T, id: WardId) -> BTreeSet<VisionCell>
    where
        T: TreeOcclusion + ?Sized,
    {
        match self.wards.get(&id).copied() {
            Some(ward) if ward.kind == WardKind::Observer && ward.is_active(self.game_time) => {
                let radius = ward.kind.vision_source().grid_radius(self.is_day);
                self.simulator
                    .update_visibility(trees, ward.cell, radius)
                    .clone()
            }
            _ => BTreeSet::new(),
        }
    }

    /// Union of building vision and active observer vision for the view.
    pub fn combined_visibility<T>(
        &mut self,
        trees: &T,
        buildings: &[BuildingSnapshot],
        view: TeamView,
    ) -> BTreeSet<VisionCell>
    where
        T: TreeOcclusion + ?Sized,
    {
        let mut combined = BTreeSet::new();
        for team in Team::ALL.into_iter().filter(|&team| view.includes(team)) {
            combined.extend(self.building_vision(trees, buildings, team).iter().copied());
        }

        let observers: Vec<WardId> = self
            .wards
            .values()
            .filter(|ward| view.includes(ward.team))
            .map(|ward| ward.id)
            .collect();
        for id in observers {
            combined.extend(self.ward_vision(trees, id));
        }
        combined
    }

    fn validate<T>(
        &self,
        trees: &T,
        position: WorldPoint,
        cell: VisionCell,
    ) -> Result<(), PlacementError>
    where
        T: TreeOcclusion + ?Sized,
    {
        if !CoordinateTransform::is_in_world(position) {
            return Err(PlacementError::OutOfBounds);
        }
        self.simulator.check_placement(trees, cell, true, true, true)
    }
}
