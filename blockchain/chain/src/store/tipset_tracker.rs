// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{collections::HashMap, sync::Arc};

use arbor_blocks::{BlockHeader, Tipset};
use arbor_blockstore::BlockStore;
use arbor_clock::ChainEpoch;
use cid::Cid;

use super::Error;

/// Tracks known blocks by their height for the purpose of forming tipsets.
pub struct TipsetTracker<DB> {
    entries: HashMap<ChainEpoch, Vec<Cid>>,
    db: Arc<DB>,
}

impl<DB: BlockStore> TipsetTracker<DB> {
    pub fn new(db: Arc<DB>) -> Self {
        Self {
            entries: HashMap::new(),
            db,
        }
    }

    /// Adds a block header to the tracker.
    pub fn add(&mut self, header: &BlockHeader) {
        let entries = self.entries.entry(header.epoch()).or_default();

        for cid in entries.iter() {
            if cid == header.cid() {
                log::debug!("tried to add block to tipset tracker that was already there");
                return;
            }

            if let Ok(Some(block)) = self.db.get::<BlockHeader>(cid) {
                if header.miner_address() == block.miner_address() {
                    log::warn!(
                        "Have multiple blocks from miner {} at height {} in our tipset cache {}-{}",
                        header.miner_address(),
                        header.epoch(),
                        header.cid(),
                        cid
                    );
                }
            }
        }

        entries.push(*header.cid());
    }

    /// Expands the given block header into the largest possible tipset by
    /// combining it with known blocks at the same height with the same
    /// parents.
    pub fn expand(&self, header: &BlockHeader) -> Result<Tipset, Error> {
        let mut headers = vec![header.clone()];

        if let Some(entries) = self.entries.get(&header.epoch()) {
            for cid in entries {
                if cid == header.cid() {
                    continue;
                }

                let h = self
                    .db
                    .get::<BlockHeader>(cid)
                    .ok()
                    .flatten()
                    .ok_or_else(|| {
                        Error::Other(format!(
                            "failed to load block ({}) for tipset expansion",
                            cid
                        ))
                    })?;

                // A block whose ticket collides with one already collected
                // cannot join the tipset; keep the first seen.
                if h.parents() == header.parents()
                    && !headers.iter().any(|e| e.ticket() == h.ticket())
                {
                    headers.push(h);
                }
            }
        }

        let ts = Tipset::new(headers)?;
        Ok(ts)
    }
}
