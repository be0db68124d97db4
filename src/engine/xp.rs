const HEALTH_WEIGHT: f64 = 50.0;
const EFFICIENCY_WEIGHT: f64 = 30.0;
const STREAK_POINTS: u32 = 2;
const STREAK_CAP: u32 = 10;

pub const MIN_BASE_XP: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XpInputs {
    pub player_health: u32,
    pub player_max_health: u32,
    pub turns_taken: u32,
    pub max_turns: u32,
    pub longest_streak: u32,
}

/// Base XP for a finished battle, before difficulty scaling.
pub fn calculate_xp(inputs: &XpInputs) -> u32 {
    let health_fraction = if inputs.player_max_health == 0 {
        0.0
    } else {
        (inputs.player_health as f64 / inputs.player_max_health as f64).clamp(0.0, 1.0)
    };

    let turns = inputs.turns_taken.max(1);
    let max_turns = inputs.max_turns.max(1);
    let efficiency = (max_turns - turns.min(max_turns) + 1) as f64 / max_turns as f64;

    let streak = inputs.longest_streak.min(STREAK_CAP) * STREAK_POINTS;

    let score = HEALTH_WEIGHT * health_fraction + EFFICIENCY_WEIGHT * efficiency.min(1.0);
    (score.round() as u32 + streak).max(MIN_BASE_XP)
}
