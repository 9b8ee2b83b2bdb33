use rand::Rng;

use crate::occasion::OccasionKind;
use crate::tactics::TacticProfile;

pub const YELLOW_CARD: &str = "Yellow card for a reckless challenge";
pub const RED_CARD: &str = "RED CARD - dangerous play, down to ten";

fn goal_lines(kind: OccasionKind) -> [&'static str; 3] {
    match kind {
        OccasionKind::Penalty => [
            "GOAL FROM THE SPOT! Flawless conversion from twelve yards",
            "GOAL! Penalty dispatched with ice in the veins",
            "GOAL! Penalty tucked into the corner, keeper had no chance",
        ],
        OccasionKind::OneOnOne => [
            "WHAT A GOAL! Composed finish in the one-on-one",
            "GOAL! A delicate chip over the onrushing keeper",
            "GOAL! Perfect finish after getting clean through on goal",
        ],
        OccasionKind::InsideBox => [
            "GOAL! Clinical strike from inside the box",
            "GOAL! Low drive across the keeper into the far corner",
            "GOAL! Point-blank finish, unstoppable",
        ],
        OccasionKind::EdgeOfBox => [
            "GOAL! Shot from the edge of the area beats the keeper",
            "GOAL! Curled from the top of the box into the top corner",
            "GOAL! Powerful strike from just outside the area",
        ],
        OccasionKind::LongRange => [
            "WHAT A GOAL! Thunderbolt from distance",
            "GOAL! Long-range effort catches the keeper off his line",
            "GOAL! Rocket from twenty-five yards",
        ],
        OccasionKind::Corner => [
            "GOAL! Powerful header from the corner",
            "GOAL! Corner met first time and it flies in",
            "GOAL! Scrambled home after the corner",
        ],
        OccasionKind::FreeKick => [
            "FREE-KICK GOAL! Masterful direct free kick",
            "WHAT A GOAL! Free kick bent into the top corner",
            "GOAL! Perfect free kick over the wall",
        ],
        OccasionKind::CounterAttack => [
            "GOAL! Lethal counter-attack finished off",
            "GOAL! Lightning break ends in the net",
            "GOAL! Won it back, raced away and scored",
        ],
        OccasionKind::Rebound => [
            "GOAL! Pounces on the rebound and makes no mistake",
            "GOAL! Follows up after the keeper's save",
            "GOAL! Loose ball in the box bundled over the line",
        ],
        OccasionKind::Header => [
            "GOAL! Unstoppable header from the cross",
            "GOAL! Textbook header",
            "GOAL! Glancing header at the back post",
        ],
    }
}

fn miss_lines(kind: OccasionKind) -> [&'static str; 3] {
    match kind {
        OccasionKind::Penalty => [
            "PENALTY MISSED! The keeper guesses right",
            "Penalty wasted, dragged wide",
            "OFF THE POST! The penalty crashes against the upright",
        ],
        OccasionKind::OneOnOne => [
            "HUGE CHANCE! Keeper stands tall with a great save",
            "One-on-one wasted, shot pulled wide",
            "WHAT A MISS! Clean through and puts it wide",
        ],
        OccasionKind::InsideBox => [
            "Clear chance in the box drifts wide",
            "Close-range effort palmed away by the keeper",
            "OFF THE POST! Strike rattles the woodwork",
        ],
        OccasionKind::EdgeOfBox => [
            "Effort from the edge flies over",
            "Powerful shot held by the keeper",
            "Strike from the top of the box goes wide",
        ],
        OccasionKind::LongRange => [
            "Long-range shot sails over the bar",
            "Rocket from distance gathered by the keeper",
            "Speculative effort from range goes wide",
        ],
        OccasionKind::Corner => [
            "Dangerous corner cleared by the defence",
            "Header from the corner goes wide",
            "Corner flashes across the box, nobody gets a touch",
        ],
        OccasionKind::FreeKick => [
            "Free kick straight at the keeper",
            "Free kick clears the wall and the bar",
            "Dangerous free kick punched clear",
        ],
        OccasionKind::CounterAttack => [
            "Counter-attack not finished properly",
            "Break stopped by a last-ditch tackle",
            "Counter wasted with a poor final pass",
        ],
        OccasionKind::Rebound => [
            "Rebound in the box not taken",
            "Loose ball hacked clear",
            "Follow-up shot fired wide",
        ],
        OccasionKind::Header => [
            "Header goes over the bar",
            "Header straight into the keeper's arms",
            "Header glances wide",
        ],
    }
}

pub fn goal_description(kind: OccasionKind, rng: &mut impl Rng) -> &'static str {
    let lines = goal_lines(kind);
    lines[rng.gen_range(0..lines.len())]
}

pub fn missed_chance_description(kind: OccasionKind, rng: &mut impl Rng) -> &'static str {
    let lines = miss_lines(kind);
    lines[rng.gen_range(0..lines.len())]
}

pub fn kick_off_description(
    team1: &str,
    tactic1: &TacticProfile,
    team2: &str,
    tactic2: &TacticProfile,
) -> String {
    format!(
        "{team1} ({}: {}) vs {team2} ({}: {})",
        tactic1.tactic.label(),
        tactic1.tactic.description(),
        tactic2.tactic.label(),
        tactic2.tactic.description()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn every_kind_has_goal_and_miss_text() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for kind in OccasionKind::ALL {
            assert!(goal_description(kind, &mut rng).contains("GOAL"));
            assert!(!missed_chance_description(kind, &mut rng).is_empty());
        }
    }
}
