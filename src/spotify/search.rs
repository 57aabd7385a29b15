use log::debug;

use crate::{
    error::FetchError,
    spotify::Catalog,
    types::{Resolution, ResolvedTrack},
    utils,
};

/// Resolves a title and an artist to the service's top search hit.
///
/// An empty result is the ordinary [`Resolution::NotFound`] outcome, not an
/// error. A hit without a track id or without an artist id cannot seed a
/// recommendation request and is treated the same way.
pub async fn resolve<C: Catalog>(
    catalog: &mut C,
    title: &str,
    artist: &str,
) -> Result<Resolution, FetchError> {
    let query = utils::build_search_query(title, artist);
    debug!("Searching for {:?}", query);

    let Some(track) = catalog.search_tracks(&query, 1).await?.into_iter().next() else {
        return Ok(Resolution::NotFound);
    };

    let primary = track.artists.into_iter().next();
    match (track.id, primary) {
        (Some(track_id), Some(primary)) => match primary.id {
            Some(artist_id) => Ok(Resolution::Found(ResolvedTrack {
                track_id,
                artist_id,
                name: track.name,
                artist_name: primary.name,
            })),
            None => {
                debug!("Top hit {} has no artist id", track_id);
                Ok(Resolution::NotFound)
            }
        },
        _ => {
            debug!("Top hit {:?} cannot be used as a seed", track.name);
            Ok(Resolution::NotFound)
        }
    }
}
