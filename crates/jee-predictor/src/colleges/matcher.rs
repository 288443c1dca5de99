use super::domain::{ChanceTier, CollegeMatch, Cutoff, CutoffRecord};
use crate::estimation::Category;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::trace;

pub const DEFAULT_TOP_N: usize = 8;

/// Rank-to-cutoff ratio ceilings for each chance tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChanceBands {
    pub safe: f64,
    pub moderate: f64,
    pub risky: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BandError {
    #[error("chance bands must be positive and ascending (safe {safe}, moderate {moderate}, risky {risky})")]
    NotAscending { safe: f64, moderate: f64, risky: f64 },
}

impl ChanceBands {
    pub fn new(safe: f64, moderate: f64, risky: f64) -> Result<Self, BandError> {
        let valid = [safe, moderate, risky].iter().all(|value| value.is_finite())
            && safe > 0.0
            && safe <= moderate
            && moderate <= risky;
        if !valid {
            return Err(BandError::NotAscending {
                safe,
                moderate,
                risky,
            });
        }
        Ok(Self {
            safe,
            moderate,
            risky,
        })
    }

    /// Tier for a candidate rank against a closing rank, `None` when the
    /// candidate is beyond the risky band.
    pub fn classify(&self, candidate_rank: u32, closing_rank: u32) -> Option<ChanceTier> {
        if closing_rank == 0 {
            return None;
        }
        let ratio = f64::from(candidate_rank) / f64::from(closing_rank);
        if ratio <= self.safe {
            Some(ChanceTier::Safe)
        } else if ratio <= self.moderate {
            Some(ChanceTier::Moderate)
        } else if ratio <= self.risky {
            Some(ChanceTier::Risky)
        } else {
            None
        }
    }
}

impl Default for ChanceBands {
    fn default() -> Self {
        Self {
            safe: 0.8,
            moderate: 1.2,
            risky: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    pub bands: ChanceBands,
    pub top_n: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            bands: ChanceBands::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Ranks a candidate holds in each seat pool they may compete in.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStanding {
    pub category: Category,
    pub home_state: Option<String>,
    pool_ranks: BTreeMap<Category, u32>,
}

impl CandidateStanding {
    /// `pool_ranks` must hold the open (General) rank; reserved categories
    /// should also carry their own and their base category's rank.
    pub fn new(
        category: Category,
        home_state: Option<String>,
        pool_ranks: BTreeMap<Category, u32>,
    ) -> Self {
        Self {
            category,
            home_state,
            pool_ranks,
        }
    }

    pub fn rank_in(&self, pool: Category) -> Option<u32> {
        self.pool_ranks.get(&pool).copied()
    }

    /// Seat pools in preference order: the declared category, its base
    /// category, then the open pool.
    fn pools(&self) -> Vec<Category> {
        let mut pools = vec![self.category];
        if self.category.base() != self.category {
            pools.push(self.category.base());
        }
        if !pools.contains(&Category::General) {
            pools.push(Category::General);
        }
        pools
    }
}

/// Turns a cutoff into a closing rank comparable with the candidate's rank
/// in the same seat pool.
pub trait CutoffResolver {
    fn closing_rank(&self, cutoff: Cutoff, pool: Category) -> Option<u32>;
}

/// Resolver for data sets that only carry closing ranks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosingRanksOnly;

impl CutoffResolver for ClosingRanksOnly {
    fn closing_rank(&self, cutoff: Cutoff, _pool: Category) -> Option<u32> {
        match cutoff {
            Cutoff::ClosingRank(rank) => Some(rank),
            Cutoff::ClosingMarks(_) => None,
        }
    }
}

pub fn match_colleges<R>(
    standing: &CandidateStanding,
    records: &[CutoffRecord],
    policy: &MatchPolicy,
    resolver: &R,
) -> Vec<CollegeMatch>
where
    R: CutoffResolver + ?Sized,
{
    let mut matches: Vec<CollegeMatch> = records
        .iter()
        .filter_map(|record| best_match(standing, record, policy, resolver))
        .collect();

    matches.sort_by(|a, b| {
        a.chance
            .cmp(&b.chance)
            .then(more_selective_first(a, b))
            .then_with(|| a.institution.cmp(&b.institution))
            .then_with(|| a.branch.cmp(&b.branch))
    });
    matches.truncate(policy.top_n);
    matches
}

fn best_match<R>(
    standing: &CandidateStanding,
    record: &CutoffRecord,
    policy: &MatchPolicy,
    resolver: &R,
) -> Option<CollegeMatch>
where
    R: CutoffResolver + ?Sized,
{
    let home_state_quota = standing
        .home_state
        .as_deref()
        .map(|state| record.serves_home_state(state))
        .unwrap_or(false);

    let mut reserved_pool_used = false;
    let mut best: Option<CollegeMatch> = None;

    for pool in standing.pools() {
        // Only the first reserved column the record lists is competed for.
        if pool != Category::General {
            if reserved_pool_used || !record.has_column(pool, home_state_quota) {
                continue;
            }
            reserved_pool_used = true;
        }

        let Some(candidate_rank) = standing.rank_in(pool) else {
            continue;
        };
        let Some((cutoff, from_home_state)) = record.cutoff_for(pool, home_state_quota) else {
            continue;
        };
        let Some(closing_rank) = resolver.closing_rank(cutoff, pool) else {
            trace!(institution = %record.institution, ?cutoff, "cutoff could not be resolved");
            continue;
        };
        let Some(chance) = policy.bands.classify(candidate_rank, closing_rank) else {
            continue;
        };

        let candidate = CollegeMatch {
            institution: record.institution.clone(),
            class: record.class,
            branch: record.branch.clone(),
            location: record.location.clone(),
            state: record.state.clone(),
            seat_category: pool,
            closing_rank,
            candidate_rank,
            rank_ratio: f64::from(candidate_rank) / f64::from(closing_rank),
            chance,
            home_state_quota: from_home_state,
        };

        let better = match &best {
            None => true,
            Some(current) => candidate
                .chance
                .cmp(&current.chance)
                .then(more_selective_first(&candidate, current))
                .is_lt(),
        };
        if better {
            best = Some(candidate);
        }
    }

    best
}

/// Closing ranks from different pools are on different scales. Mapped onto
/// the open pool a closing rank is `open_rank / rank_ratio`, so for one
/// candidate a higher ratio is the more selective seat.
fn more_selective_first(a: &CollegeMatch, b: &CollegeMatch) -> Ordering {
    b.rank_ratio.total_cmp(&a.rank_ratio)
}
