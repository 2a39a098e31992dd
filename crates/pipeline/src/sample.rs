use hnsample_source::StoryId;
use rand::Rng;
use rand::seq::SliceRandom;

/// Pick `min(limit, ids.len())` distinct identifiers uniformly at random.
///
/// Runs a partial Fisher-Yates shuffle: only `limit` swaps are made however
/// long the ranking is. The order of the returned identifiers is itself
/// random, and it is the order the rest of the pipeline preserves.
pub fn sample<R: Rng + ?Sized>(mut ids: Vec<StoryId>, limit: usize, rng: &mut R) -> Vec<StoryId> {
    let amount = limit.min(ids.len());
    let (picked, _rest) = ids.partial_shuffle(rng, amount);
    picked.to_vec()
}
