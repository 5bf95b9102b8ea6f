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

//! Staking, liabilities, voting power, rewards and delegate election
//! (§4.5), grounded on `original_source/logos/staking/`,
//! `logos/elections/` and `logos/staking/voting_power_manager.hpp`.

pub mod election;
pub mod liability;
pub mod rewards;
pub mod stake;
pub mod voting_power;

pub use election::{select_next_epoch_delegates, Candidate};
pub use liability::can_create_secondary_liability;
pub use rewards::{claim, open_epoch, open_rep, GlobalRewardsInfo, RewardsError, RewardsInfo};
pub use stake::{apply_stake, merge_thaw, prune_expired_thawing, THAWING_PERIOD};
pub use voting_power::{Snapshot, VotingPowerInfo, DILUTION_FACTOR};
