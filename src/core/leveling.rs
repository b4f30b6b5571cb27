//! Leveling - maps total XP onto the level ladder.
//!
//! Levels run from 1 to 20 over a fixed threshold table. Progress percentages,
//! level-up detection and milestone rewards are all derived from that table.

use serde::Serialize;

/// XP needed to reach each level; index 0 is level 1.
pub const LEVEL_THRESHOLDS: [i64; 20] = [
    0, 200, 400, 800, 1200, 1800, 2600, 3600, 4800, 6200, // early game
    8000, 10000, 12500, 15000, 18000, // soft bump
    22000, 27000, 33000, 40000, 50000, // late game
];

/// Highest reachable level.
pub const MAX_LEVEL: u32 = 20;

/// Where an XP total sits within its level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelProgress {
    /// Level for the XP total
    pub current_level: u32,
    /// Next level, or the current one at the cap
    pub next_level: u32,
    /// The XP total the progress was computed for
    pub current_xp: i64,
    /// XP threshold of the current level
    pub current_threshold: i64,
    /// XP threshold of the next level, `None` at the cap
    pub next_threshold: Option<i64>,
    /// XP earned since reaching the current level
    pub xp_into_level: i64,
    /// XP still missing for the next level (0 at the cap)
    pub xp_for_next_level: i64,
    /// Width of the current level in XP (0 at the cap)
    pub xp_required_for_level: i64,
    /// 0-100, rounded to two decimals; 100 at the cap
    pub progress_percentage: f64,
}

/// Result of comparing the level before and after an XP change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    /// Whether at least one level was gained
    pub leveled_up: bool,
    /// Level before the change
    pub old_level: u32,
    /// Level after the change
    pub new_level: u32,
    /// Every level reached on the way, in ascending order
    pub levels_crossed: Vec<u32>,
}

impl LevelUp {
    /// Number of levels gained.
    #[must_use]
    pub fn levels_gained(&self) -> u32 {
        self.new_level.saturating_sub(self.old_level)
    }
}

/// Rewards granted for reaching a level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelRewards {
    /// Level the rewards belong to
    pub level: u32,
    /// Bonus XP for milestone levels (every 5th)
    pub xp_bonus: i64,
    /// Title unlocked at this level
    pub title: Option<&'static str>,
    /// Badge name granted at this level
    pub badge: Option<String>,
    /// Features unlocked at this level
    pub unlocks: Vec<&'static str>,
}

/// Level for a total XP amount. Negative totals count as zero.
#[must_use]
pub fn level_from_xp(xp: i64) -> u32 {
    let xp = xp.max(0);
    let reached = LEVEL_THRESHOLDS
        .iter()
        .take_while(|threshold| xp >= **threshold)
        .count();
    u32::try_from(reached).unwrap_or(MAX_LEVEL).max(1)
}

/// XP threshold of a level; clamps to the table's ends.
#[must_use]
pub fn xp_for_level(level: u32) -> i64 {
    if level < 1 {
        return 0;
    }
    let index = level.min(MAX_LEVEL) as usize - 1;
    LEVEL_THRESHOLDS[index]
}

/// XP threshold of the level after `level`, or `None` at the cap.
#[must_use]
pub fn next_level_threshold(level: u32) -> Option<i64> {
    LEVEL_THRESHOLDS.get(level as usize).copied()
}

/// Detailed progress of an XP total within its level.
#[must_use]
pub fn progress_from_xp(xp: i64) -> LevelProgress {
    let current_level = level_from_xp(xp);
    let current_threshold = xp_for_level(current_level);
    let next_threshold = next_level_threshold(current_level);
    let xp_into_level = (xp - current_threshold).max(0);

    let (xp_required_for_level, xp_for_next_level, progress_percentage) = match next_threshold {
        Some(next) => {
            let width = next - current_threshold;
            #[allow(clippy::cast_precision_loss)]
            let pct = xp_into_level as f64 / width as f64 * 100.0;
            (width, (width - xp_into_level).max(0), round_two(pct))
        }
        None => (0, 0, 100.0),
    };

    LevelProgress {
        current_level,
        next_level: if next_threshold.is_some() {
            current_level + 1
        } else {
            current_level
        },
        current_xp: xp,
        current_threshold,
        next_threshold,
        xp_into_level,
        xp_for_next_level,
        xp_required_for_level,
        progress_percentage,
    }
}

/// Compares levels before and after an XP change.
#[must_use]
pub fn check_level_up(old_xp: i64, new_xp: i64) -> LevelUp {
    let old_level = level_from_xp(old_xp);
    let new_level = level_from_xp(new_xp);
    let leveled_up = new_level > old_level;

    LevelUp {
        leveled_up,
        old_level,
        new_level,
        levels_crossed: if leveled_up {
            (old_level + 1..=new_level).collect()
        } else {
            Vec::new()
        },
    }
}

/// Rewards for reaching `level`.
///
/// Every fifth level grants `level * 10` bonus XP and a "Level N Master" badge;
/// levels 10, 15 and 20 also unlock a title. The bonus is reported, not
/// credited; [`crate::core::progress::award_xp`] lists it in `XpAward::rewards`.
#[must_use]
pub fn level_rewards(level: u32) -> LevelRewards {
    let mut rewards = LevelRewards {
        level,
        ..LevelRewards::default()
    };

    if level > 0 && level % 5 == 0 {
        rewards.xp_bonus = i64::from(level) * 10;
        rewards.badge = Some(format!("Level {level} Master"));
    }

    match level {
        10 => {
            rewards.title = Some("Apprentice");
            rewards.unlocks.push("Custom avatar frames");
        }
        15 => {
            rewards.title = Some("Journeyman");
            rewards.unlocks.push("Special emotes");
        }
        20 => {
            rewards.title = Some("Master");
            rewards.unlocks.push("Elite clan features");
        }
        _ => {}
    }

    rewards
}

impl LevelRewards {
    /// True when the level grants nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.xp_bonus == 0
            && self.title.is_none()
            && self.badge.is_none()
            && self.unlocks.is_empty()
    }
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped = progress_percent.clamp(0.0, 100.0);

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((clamped / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    format!(
        "[{}{}] {:.0}%",
        "█".repeat(filled),
        "░".repeat(empty),
        clamped
    )
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
