//! Ordered block storage with run-local deduplication
//!
//! Blocks are grouped by component type in insertion order. A new block is
//! compared only against the run of same-type blocks directly before it, and
//! never against the legacy prefix once that prefix has been sealed.

use tracing::trace;

use super::block::Block;
use super::component::ComponentType;
use crate::constants::block::COMPONENT_TYPE_COUNT;
use crate::constants::capacity::MAX_BLOCKS;

/// What happened to a reading offered to a [`BlockSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Block appended
    Added,
    /// Same value already present in the current run
    Duplicate,
    /// Capacity reached, reading dropped
    Full,
    /// Empty reading, nothing to hash
    Absent,
}

/// Blocks of one fingerprinting session, split into legacy prefix and current suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSet {
    blocks: Vec<Block>,
    start_index: usize,
    max_blocks: usize,
}

impl Default for BlockSet {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSet {
    /// Empty set with the standard capacity
    pub fn new() -> Self {
        Self::with_max_blocks(MAX_BLOCKS)
    }

    /// Empty set holding at most `max_blocks` blocks
    pub fn with_max_blocks(max_blocks: usize) -> Self {
        Self {
            blocks: Vec::with_capacity(max_blocks),
            start_index: 0,
            max_blocks,
        }
    }

    /// Hash `raw` and insert the resulting block
    pub fn insert_raw(&mut self, raw: &[u8], component: ComponentType) -> InsertOutcome {
        if self.is_full() {
            trace!(component = %component, "Block set full, dropping reading");
            return InsertOutcome::Full;
        }

        match Block::encode(raw, component) {
            Some(block) => self.push(block),
            None => InsertOutcome::Absent,
        }
    }

    /// Insert an already-encoded block
    pub fn push(&mut self, block: Block) -> InsertOutcome {
        if self.is_full() {
            trace!(block = %block, "Block set full, dropping block");
            return InsertOutcome::Full;
        }

        for prev in self.blocks[self.start_index..].iter().rev() {
            if *prev == block {
                trace!(block = %block, "Duplicate block in run, skipping");
                return InsertOutcome::Duplicate;
            }
            if prev.component() != block.component() {
                break;
            }
        }

        self.blocks.push(block);
        InsertOutcome::Added
    }

    /// End the legacy prefix: everything inserted so far is legacy
    ///
    /// Later insertions never deduplicate against the prefix.
    pub fn seal_legacy(&mut self) {
        self.start_index = self.blocks.len();
    }

    /// Index of the first current block (= number of legacy blocks)
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// All blocks, legacy prefix included
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Legacy prefix (comparison only, never serialized)
    pub fn legacy(&self) -> &[Block] {
        &self.blocks[..self.start_index]
    }

    /// Current suffix (the part that gets serialized)
    pub fn current(&self) -> &[Block] {
        &self.blocks[self.start_index..]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.blocks.len() >= self.max_blocks
    }

    pub fn max_blocks(&self) -> usize {
        self.max_blocks
    }

    /// Number of current blocks per component type, indexed by tag
    pub fn current_counts(&self) -> [usize; COMPONENT_TYPE_COUNT] {
        let mut counts = [0; COMPONENT_TYPE_COUNT];
        for block in self.current() {
            counts[block.component().index()] += 1;
        }
        counts
    }
}
