//! Open-data fetchers for the municipal indicator reports.
//!
//! | Module | Source | Report |
//! |--------|--------|--------|
//! | [`ibge`] | IBGE population and GDP endpoints | Social indicators ranked by GDP per capita |
//! | [`siconfi`] | SICONFI RREO endpoint | Health and education spending ranked by total |
//! | [`transparency`] | IBGE per-municipality endpoints | Monte Santo comparison |
//!
//! Every request yields a [`FetchOutcome`](crate::api::FetchOutcome). When a
//! request fails or carries nothing usable, the fetcher substitutes a value
//! from its static estimate table, so reports always come back successful.

pub mod ibge;
pub mod siconfi;
pub mod transparency;

use crate::models::RankStatus;

/// Rank positions after sorting, best first.
///
/// `rank_for` returns the status and the colour for a position.
pub(crate) fn assign_ranks<T>(
    records: &mut [T],
    rank_for: impl Fn(usize, usize) -> (RankStatus, &'static str),
    mut apply: impl FnMut(&mut T, RankStatus, &'static str),
) {
    let len = records.len();
    for (i, record) in records.iter_mut().enumerate() {
        let (status, color) = rank_for(i, len);
        apply(record, status, color);
    }
}
