use std::io;

/// Keyed blob store for encoded save records. The core assumes at most one
/// record per id and newest-first iteration for [`RecordStore::latest`];
/// implementations index on a creation timestamp. I/O errors pass through
/// to the caller untouched.
pub trait RecordStore {
    /// Stores `bytes` under `id`, replacing any previous record.
    fn put(&mut self, id: &str, bytes: &[u8]) -> io::Result<()>;

    /// Fetches the record stored under `id`, if any.
    fn get(&self, id: &str) -> io::Result<Option<Vec<u8>>>;

    /// The most recently created record, if the store is non-empty.
    fn latest(&self) -> io::Result<Option<(String, Vec<u8>)>>;
}
