use rand::Rng;

const BASE_ENEMY_HEALTH: f64 = 100.0;
const BASE_DAMAGE_MIN: f64 = 5.0;
const BASE_DAMAGE_MAX: f64 = 10.0;

pub const ENEMY_DAMAGE_FLOOR: u32 = 3;
pub const ENEMY_DAMAGE_CEILING: u32 = 25;

pub const MIN_MULTIPLIER: f64 = 0.25;
pub const MAX_MULTIPLIER: f64 = 5.0;

/// Clamp a catalog multiplier into the supported range. NaN falls back to a
/// neutral 1.0.
pub fn clamp_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_nan() {
        1.0
    } else {
        multiplier.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
    }
}

pub fn scale_enemy_health(multiplier: f64) -> u32 {
    let m = clamp_multiplier(multiplier);
    (BASE_ENEMY_HEALTH * m).round().max(1.0) as u32
}

/// Inclusive damage bounds for a multiplier, both inside
/// `[ENEMY_DAMAGE_FLOOR, ENEMY_DAMAGE_CEILING]`.
pub fn enemy_damage_range(multiplier: f64) -> (u32, u32) {
    let m = clamp_multiplier(multiplier);
    let low = ((BASE_DAMAGE_MIN * m).floor() as u32).clamp(ENEMY_DAMAGE_FLOOR, ENEMY_DAMAGE_CEILING);
    let high = ((BASE_DAMAGE_MAX * m).ceil() as u32).clamp(ENEMY_DAMAGE_FLOOR, ENEMY_DAMAGE_CEILING);
    (low, high.max(low))
}

pub fn roll_enemy_damage<R: Rng + ?Sized>(multiplier: f64, rng: &mut R) -> u32 {
    let (low, high) = enemy_damage_range(multiplier);
    rng.gen_range(low..=high)
}

pub fn scale_battle_xp(base_xp: u32, multiplier: f64) -> u32 {
    let m = clamp_multiplier(multiplier);
    (base_xp as f64 * m).round().max(1.0) as u32
}
