use std::time::{Duration, Instant};
use strata17_types::BlockPos;

/// How long an optimistic client-side edit is allowed to go unconfirmed before it
/// is rolled back.
pub const TENTATIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// An optimistic edit applied locally before the server confirmed it. Rolled back
/// to `prior_block`/`prior_metadata` if nothing fulfills it within [`TENTATIVE_TIMEOUT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TentativeBlock {
    pub pos: BlockPos,
    pub prior_block: u8,
    pub prior_metadata: u8,
    pub placed_at: Instant,
}

impl TentativeBlock {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.placed_at) >= TENTATIVE_TIMEOUT
    }
}

/// Tracks in-flight optimistic edits keyed by position. A position reused for a
/// second edit before the first resolves simply replaces the entry: only the most
/// recent edit at a position can be rolled back.
#[derive(Debug, Default)]
pub struct TentativeList {
    entries: Vec<TentativeBlock>,
}

impl TentativeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pos: BlockPos, prior_block: u8, prior_metadata: u8, now: Instant) {
        self.entries.retain(|e| e.pos != pos);
        self.entries.push(TentativeBlock {
            pos,
            prior_block,
            prior_metadata,
            placed_at: now,
        });
    }

    /// Removes and returns the tentative entry at `pos`, if any — called when the
    /// server confirms the edit via block-change, multi-block-change, or a chunk
    /// splat covering the position.
    pub fn fulfill(&mut self, pos: BlockPos) -> Option<TentativeBlock> {
        let idx = self.entries.iter().position(|e| e.pos == pos)?;
        Some(self.entries.remove(idx))
    }

    /// Removes and returns every entry still unfulfilled at `now`, for the caller
    /// to roll back.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<TentativeBlock> {
        let (expired, remaining): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|e| e.is_expired(now));
        self.entries = remaining;
        expired
    }

    /// Snapshot of positions currently tracked, for callers that need to test
    /// membership (e.g. "does this chunk splat cover any tentative edit") without
    /// borrowing `self` mutably.
    pub fn positions(&self) -> Vec<BlockPos> {
        self.entries.iter().map(|e| e.pos).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfilled_entry_is_removed() {
        let mut list = TentativeList::new();
        let pos = BlockPos::new(1, 64, 1);
        list.record(pos, 0, 0, Instant::now());
        assert_eq!(list.len(), 1);
        let entry = list.fulfill(pos).unwrap();
        assert_eq!(entry.pos, pos);
        assert!(list.is_empty());
    }

    #[test]
    fn unfulfilled_entry_expires() {
        let mut list = TentativeList::new();
        let pos = BlockPos::new(2, 64, 2);
        let placed_at = Instant::now() - Duration::from_secs(6);
        list.entries.push(TentativeBlock {
            pos,
            prior_block: 1,
            prior_metadata: 0,
            placed_at,
        });
        let expired = list.drain_expired(Instant::now());
        assert_eq!(expired.len(), 1);
        assert!(list.is_empty());
    }

    #[test]
    fn unexpired_entry_survives_drain() {
        let mut list = TentativeList::new();
        let pos = BlockPos::new(3, 64, 3);
        list.record(pos, 0, 0, Instant::now());
        let expired = list.drain_expired(Instant::now());
        assert!(expired.is_empty());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn re_recording_same_position_replaces_entry() {
        let mut list = TentativeList::new();
        let pos = BlockPos::new(4, 64, 4);
        list.record(pos, 0, 0, Instant::now());
        list.record(pos, 5, 2, Instant::now());
        assert_eq!(list.len(), 1);
        let entry = list.fulfill(pos).unwrap();
        assert_eq!(entry.prior_block, 5);
    }
}
