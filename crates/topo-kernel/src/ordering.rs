//! Deterministic projection ordering.
//!
//! Projections are connected family by family: afferent input first,
//! lateral connections last. Within a family, tree order is kept.

use crate::error::TopoError;
use crate::spec::ProjectionSpec;

/// Connection order by match name.
pub const CONNECTION_ORDER: [&str; 8] = [
    "afferent_projections",
    "afferent_center_projections",
    "afferent_surround_projections",
    "lateral_gain_control_projections",
    "afferent_ON_projections",
    "afferent_OFF_projections",
    "lateral_excitatory_projections",
    "lateral_inhibitory_projections",
];

/// Position of `matchname` in [`CONNECTION_ORDER`].
pub fn match_rank(matchname: &str) -> Option<usize> {
    CONNECTION_ORDER.iter().position(|name| *name == matchname)
}

/// Stable sort by match rank. Any projection without a ranked match name
/// fails the whole ordering.
pub fn order_projections<'a, I>(projections: I) -> Result<Vec<&'a ProjectionSpec>, TopoError>
where
    I: IntoIterator<Item = &'a ProjectionSpec>,
{
    let mut ranked = projections
        .into_iter()
        .map(|proj| {
            proj.matchname()
                .and_then(match_rank)
                .map(|rank| (rank, proj))
                .ok_or_else(|| TopoError::UnrankedMatch {
                    projection: proj.to_string(),
                    matchname: proj.matchname().unwrap_or("<untagged>").to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, proj)| proj).collect())
}
