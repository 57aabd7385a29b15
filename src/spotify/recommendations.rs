use log::debug;

use crate::{
    error::FetchError,
    spotify::Catalog,
    types::{
        Fetched, Recommendation, RecommendationConstraints, RecommendationRequest, ResolvedTrack,
    },
    utils::{MAX_RECOMMENDATIONS, MIN_RECOMMENDATIONS},
};

/// Seeds a request with exactly the resolved track and its primary artist.
///
/// `count` is clamped to 1..=10 so an out-of-range value can never reach the
/// service.
pub fn build_request(
    seed: &ResolvedTrack,
    count: u8,
    constraints: &RecommendationConstraints,
) -> RecommendationRequest {
    RecommendationRequest {
        seed_tracks: vec![seed.track_id.clone()],
        seed_artists: vec![seed.artist_id.clone()],
        limit: count.clamp(MIN_RECOMMENDATIONS, MAX_RECOMMENDATIONS),
        constraints: constraints.clone(),
    }
}

/// Fetches recommendations and maps them to display records, keeping the
/// service's order.
pub async fn fetch<C: Catalog>(
    catalog: &mut C,
    request: &RecommendationRequest,
) -> Result<Fetched, FetchError> {
    let tracks = catalog.recommendations(request).await?;
    debug!("Received {} recommendations", tracks.len());

    if tracks.is_empty() {
        return Ok(Fetched::Empty);
    }

    Ok(Fetched::Tracks(
        tracks.into_iter().map(Recommendation::from).collect(),
    ))
}
