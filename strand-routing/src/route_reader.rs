//! Cross-term replay for a single hash.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use strand_core::RangeName;
use strand_store::{DataPacket, FileSystem, ShardReader, StoreError};
use tracing::{debug, warn};

use crate::error::{RouteError, RouteResult};
use crate::listing::{parse_listing, supersession_order, ParsedRange};

/// Hands out replay readers for individual hashes.
#[derive(Clone)]
pub struct RouteReader {
    fs: Arc<dyn FileSystem>,
}

impl RouteReader {
    /// Creates a replay-reader factory over the given store.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Returns a reader that replays every record whose hash is `hash`.
    #[must_use]
    pub fn read_from(&self, hash: u64) -> HashReader {
        HashReader {
            hash,
            fs: Arc::clone(&self.fs),
            current: None,
            consumed: HashSet::new(),
            last_index: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for RouteReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteReader").finish_non_exhaustive()
    }
}

/// Replays the chain of shard files covering one hash, in term order.
///
/// Each file is drained in record-index order before the next term is
/// opened, so the overall sequence is: files ascending by term, records
/// ascending by index within a file, every record exactly once.
///
/// [`read`](Self::read) returning [`RouteError::EndOfStream`] means the
/// reader has caught up, not that it is finished: the newest covering
/// shard is re-opened at the stored position on the next call, tailing
/// the live file. Owned by a single consumer; not shareable.
pub struct HashReader {
    hash: u64,
    fs: Arc<dyn FileSystem>,
    current: Option<CurrentFile>,
    /// Ranges fully drained (EOF observed).
    consumed: HashSet<RangeName>,
    /// Last delivered record index per file name.
    last_index: HashMap<String, u64>,
}

struct CurrentFile {
    reader: Box<dyn ShardReader>,
    range: RangeName,
}

impl HashReader {
    /// Reads the next record for this hash.
    ///
    /// # Errors
    ///
    /// - [`RouteError::EndOfStream`] when everything currently readable
    ///   has been delivered; read again later to tail the live shard.
    /// - [`RouteError::Store`] for listing, open, or read failures; the
    ///   reader's position is untouched and the next call retries.
    pub async fn read(&mut self) -> RouteResult<DataPacket> {
        loop {
            if self.current.is_none() {
                self.open_next().await?;
            }

            let current = self
                .current
                .as_mut()
                .expect("current reader opened above");
            match current.reader.read().await {
                Ok(packet) => {
                    self.last_index.insert(packet.file.clone(), packet.index);
                    return Ok(packet);
                }
                Err(StoreError::EndOfStream) => {
                    let mut done = self
                        .current
                        .take()
                        .expect("current reader opened above");
                    self.consumed.insert(done.range);
                    if let Err(e) = done.reader.close().await {
                        warn!(error = %e, "closing drained shard reader failed");
                    }
                    // Advance to the next term (or signal caught-up).
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Releases the current underlying reader, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to release it cleanly.
    pub async fn close(&mut self) -> RouteResult<()> {
        if let Some(mut current) = self.current.take() {
            current.reader.close().await?;
        }
        Ok(())
    }

    /// Opens the lowest-term unconsumed file covering the hash, resuming
    /// after the last record it ever delivered from that file.
    async fn open_next(&mut self) -> RouteResult<()> {
        let listing = self.fs.list().await?;
        let mut covering: Vec<ParsedRange> = parse_listing(listing)
            .into_iter()
            .filter(|p| p.range.covers(self.hash))
            .collect();
        covering.sort_by(supersession_order);

        let next = covering
            .iter()
            .find(|p| !self.consumed.contains(&p.range))
            .cloned();

        let Some(next) = next else {
            // Caught up to the newest live range. Un-consume it so the
            // next read re-opens it at the stored position and tails.
            if let Some(newest) = covering.last() {
                self.consumed.remove(&newest.range);
            }
            return Err(RouteError::EndOfStream);
        };

        let start = self.last_index.get(&next.file).map_or(0, |i| i + 1);
        debug!(hash = self.hash, file = %next.file, start, "opening shard for replay");
        let reader = self.fs.reader(&next.file, start).await?;
        self.current = Some(CurrentFile {
            reader,
            range: next.range,
        });
        Ok(())
    }
}

impl std::fmt::Debug for HashReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashReader")
            .field("hash", &self.hash)
            .field("consumed", &self.consumed.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use strand_store::MemoryFileSystem;

    use super::*;

    const HASH: u64 = 5_000;

    fn seeded(files: &[(RangeName, &[&str])]) -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        for (range, records) in files {
            let name = range.file_name();
            for record in *records {
                fs.append_raw(&name, Bytes::from((*record).to_string()));
            }
        }
        fs
    }

    async fn drain(reader: &mut HashReader) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            match reader.read().await {
                Ok(packet) => {
                    out.push(String::from_utf8(packet.payload.to_vec()).unwrap());
                }
                Err(RouteError::EndOfStream) => return out,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_store_is_end_of_stream() {
        let fs = MemoryFileSystem::new();
        let mut reader = RouteReader::new(Arc::new(fs)).read_from(HASH);

        assert!(reader.read().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn test_files_replay_in_term_order() {
        let fs = seeded(&[
            (RangeName::new(0, u64::MAX, 2, 1), &["c1", "c2"][..]),
            (RangeName::new(0, u64::MAX, 0, 2), &["a1"][..]),
            (RangeName::new(0, u64::MAX, 1, 3), &["b1"][..]),
        ]);
        let mut reader = RouteReader::new(Arc::new(fs)).read_from(HASH);

        assert_eq!(drain(&mut reader).await, vec!["a1", "b1", "c1", "c2"]);
    }

    #[tokio::test]
    async fn test_non_covering_ranges_are_skipped() {
        let fs = seeded(&[
            (RangeName::new(0, 100, 0, 1), &["other"][..]),
            (RangeName::new(0, u64::MAX, 1, 2), &["mine"][..]),
        ]);
        let mut reader = RouteReader::new(Arc::new(fs)).read_from(HASH);

        assert_eq!(drain(&mut reader).await, vec!["mine"]);
    }

    #[tokio::test]
    async fn test_caught_up_reader_tails_the_live_shard() {
        let live = RangeName::new(0, u64::MAX, 1, 1);
        let fs = seeded(&[(live, &["r0"][..])]);
        let mut reader = RouteReader::new(Arc::new(fs.clone())).read_from(HASH);

        assert_eq!(drain(&mut reader).await, vec!["r0"]);
        // Still caught up.
        assert!(reader.read().await.unwrap_err().is_end_of_stream());

        // New data lands on the live shard; the reader resumes past what
        // it already delivered, without replaying r0.
        fs.append_raw(&live.file_name(), Bytes::from("r1"));
        let packet = reader.read().await.unwrap();
        assert_eq!(packet.payload, Bytes::from("r1"));
        assert_eq!(packet.index, 1);
    }

    #[tokio::test]
    async fn test_new_term_created_mid_replay_is_picked_up() {
        let old = RangeName::new(0, u64::MAX, 0, 1);
        let fs = seeded(&[(old, &["a1"][..])]);
        let mut reader = RouteReader::new(Arc::new(fs.clone())).read_from(HASH);

        assert_eq!(drain(&mut reader).await, vec!["a1"]);

        // A reshape creates a newer covering shard and traffic moves.
        let new = RangeName::new(0, u64::MAX, 1, 2);
        fs.append_raw(&new.file_name(), Bytes::from("b1"));

        assert_eq!(drain(&mut reader).await, vec!["b1"]);
    }

    #[tokio::test]
    async fn test_foreign_file_names_are_ignored() {
        let fs = seeded(&[(RangeName::new(0, u64::MAX, 0, 1), &["data"][..])]);
        fs.append_raw("checkpoint.tmp", Bytes::from("junk"));
        let mut reader = RouteReader::new(Arc::new(fs)).read_from(HASH);

        assert_eq!(drain(&mut reader).await, vec!["data"]);
    }

    #[tokio::test]
    async fn test_list_failure_surfaces_and_position_survives() {
        let range = RangeName::new(0, u64::MAX, 0, 1);
        let fs = seeded(&[(range, &["a1", "a2"][..])]);
        let mut reader = RouteReader::new(Arc::new(fs.clone())).read_from(HASH);

        assert_eq!(reader.read().await.unwrap().payload, Bytes::from("a1"));

        // Drop the current reader so the next read must list again, and
        // make that listing fail.
        reader.close().await.unwrap();
        fs.force_list_fail();
        assert!(matches!(reader.read().await, Err(RouteError::Store(_))));

        // The failed call corrupted nothing: replay resumes at a2.
        assert_eq!(reader.read().await.unwrap().payload, Bytes::from("a2"));
    }

    #[tokio::test]
    async fn test_close_without_current_reader_is_a_no_op() {
        let fs = MemoryFileSystem::new();
        let mut reader = RouteReader::new(Arc::new(fs)).read_from(HASH);
        reader.close().await.unwrap();
    }
}
