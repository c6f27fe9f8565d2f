//! Metadata completeness gate.

use crate::domain::EpisodeDescriptor;

/// True when every non-special episode carries a synopsis.
///
/// Only gates the Completed state. An empty catalog is vacuously complete.
pub fn metadata_complete(episodes: &[EpisodeDescriptor]) -> bool {
    episodes
        .iter()
        .filter(|ep| !ep.is_special())
        .all(EpisodeDescriptor::has_synopsis)
}
