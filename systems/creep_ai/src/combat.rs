//! Attack timing and physical damage resolution.

use lanewatch_core::{AttackState, CombatStats, UnitSnapshot};
use rand::Rng;

/// Seconds the attack swing animation lasts.
pub const ATTACK_ANIMATION: f32 = 0.2;

/// Multiplier physical damage is scaled by against the given armor.
///
/// Positive armor approaches full immunity asymptotically; negative armor
/// amplifies damage towards double.
#[must_use]
pub fn armor_multiplier(armor: f32) -> f32 {
    if armor >= 0.0 {
        1.0 - (0.06 * armor) / (1.0 + 0.06 * armor)
    } else {
        2.0 - 0.94_f32.powf(-armor)
    }
}

/// Damage dealt by `attacker` against `target` for a roll in `[0, 1)`.
#[must_use]
pub fn physical_damage(attacker: &CombatStats, target: &CombatStats, roll: f32) -> f32 {
    let spread = (attacker.damage_max - attacker.damage_min).max(0.0);
    let raw = attacker.damage_min + roll.clamp(0.0, 1.0) * spread;
    (raw * armor_multiplier(target.armor)).floor()
}

/// Rolls damage for one attack.
pub fn roll_damage<R>(attacker: &CombatStats, target: &CombatStats, rng: &mut R) -> f32
where
    R: Rng + ?Sized,
{
    physical_damage(attacker, target, rng.gen::<f32>())
}

/// Whether the attack cooldown elapsed at `now`.
#[must_use]
pub fn can_attack(attack: &AttackState, stats: &CombatStats, now: f64) -> bool {
    now - attack.last_attack_time >= stats.attack_rate
}

/// Center distance within which `attacker` can strike `target`.
#[must_use]
pub fn effective_range(attacker: &UnitSnapshot, target: &UnitSnapshot) -> f32 {
    attacker.stats.attack_range + target.collision_radius
}
