/* This file is part of dbft-core
 *
 * Copyright (C) 2024-2026 dbft-core Contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Per-epoch reward bookkeeping (§4.5.4), grounded on
//! `original_source/logos/staking/rewards_manager.cpp`'s `Claim` handler.

/// The epoch-wide reward pool (§3, §4.5.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalRewardsInfo {
    pub total_stake: u128,
    pub total_reward: u128,
    pub remaining_reward: u128,
}

/// One representative's share of the epoch's reward pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewardsInfo {
    pub levy_percentage: u8,
    pub remaining_reward: u128,
}

#[derive(Clone, Copy, Debug, thiserror::Error, PartialEq, Eq)]
pub enum RewardsError {
    #[error("harvested amount exceeds the representative's or the epoch's remaining reward")]
    ExceedsRemaining,
}

/// Opens a new epoch's global reward record (§4.5.4).
pub fn open_epoch(total_stake: u128, total_reward: u128) -> GlobalRewardsInfo {
    GlobalRewardsInfo { total_stake, total_reward, remaining_reward: total_reward }
}

/// Opens a representative's reward row for the epoch, recording its levy
/// percentage at open time (§4.5.4).
pub fn open_rep(global: &GlobalRewardsInfo, levy_percentage: u8) -> RewardsInfo {
    RewardsInfo { levy_percentage, remaining_reward: global.remaining_reward }
}

/// Deducts `harvested` from both `rep` and `global`'s remaining reward,
/// deleting `rep` (setting it to `None`) once its row is drained (§4.5.4,
/// §8 scenario S5).
pub fn claim(global: &mut GlobalRewardsInfo, rep: &mut Option<RewardsInfo>, harvested: u128) -> Result<(), RewardsError> {
    let row = rep.as_mut().ok_or(RewardsError::ExceedsRemaining)?;
    if harvested > row.remaining_reward || harvested > global.remaining_reward {
        return Err(RewardsError::ExceedsRemaining)
    }
    row.remaining_reward -= harvested;
    global.remaining_reward -= harvested;
    if row.remaining_reward == 0 {
        *rep = None;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// §8 scenario S5.
    #[test]
    fn rewards_claim_scenario() {
        let mut global = open_epoch(30_000, 100_000);
        let mut rep = Some(open_rep(&global, 15));

        claim(&mut global, &mut rep, 1_000).unwrap();
        assert_eq!(rep.unwrap().remaining_reward, 99_000);
        assert_eq!(global.remaining_reward, 99_000);

        claim(&mut global, &mut rep, 1_000).unwrap();
        assert_eq!(rep.unwrap().remaining_reward, 98_000);
        assert_eq!(global.remaining_reward, 98_000);

        claim(&mut global, &mut rep, 98_000).unwrap();
        assert!(rep.is_none());
        assert_eq!(global.remaining_reward, 0);
    }

    #[test]
    fn claim_beyond_remaining_is_rejected() {
        let mut global = open_epoch(1_000, 5_000);
        let mut rep = Some(open_rep(&global, 10));
        assert_eq!(claim(&mut global, &mut rep, 6_000), Err(RewardsError::ExceedsRemaining));
        assert!(rep.is_some());
    }

    #[test]
    fn claim_after_row_deleted_is_rejected() {
        let mut global = open_epoch(1_000, 100);
        let mut rep = Some(open_rep(&global, 10));
        claim(&mut global, &mut rep, 100).unwrap();
        assert!(rep.is_none());
        assert_eq!(claim(&mut global, &mut rep, 1), Err(RewardsError::ExceedsRemaining));
    }
}
