use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use geov_types::{ContentId, Geometry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SyncMode;
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryDocumentStore;
use crate::object::GeoDocument;
use crate::traits::DocumentStore;

/// A single journal record.
///
/// On-disk framing:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (JSON-serialized JournalRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum JournalRecord {
    Insert { doc: GeoDocument },
    Delete { id: ContentId },
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: u64 = 8;

struct JournalWriter {
    writer: BufWriter<File>,
    /// End of the last complete record.
    offset: u64,
}

/// Append-only, crash-recoverable document store.
///
/// Every insert and delete is appended to a single journal file. On open the
/// journal is replayed into an in-memory index that serves all reads.
/// Records that fail the CRC check are skipped. A frame whose length header
/// cannot be trusted ends recovery; the bytes from there on are copied to
/// `<journal>.<offset>.discarded` and then cut off so later appends stay
/// readable.
///
/// All mutations take the writer lock, so the uniqueness check, the append
/// and the index update happen as one step.
pub struct FileDocumentStore {
    path: PathBuf,
    index: InMemoryDocumentStore,
    writer: Mutex<JournalWriter>,
    sync_mode: SyncMode,
}

impl FileDocumentStore {
    /// Open (or create) the journal at `path` and replay it.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        let file_len = file.metadata()?.len();

        let (records, valid_len) = recover(path)?;
        if valid_len < file_len {
            let backup = preserve_tail(path, valid_len)?;
            warn!(
                path = %path.display(),
                backup = %backup.display(),
                valid_len,
                file_len,
                "moving unreadable journal tail aside"
            );
            file.set_len(valid_len)?;
        }

        let index = InMemoryDocumentStore::new();
        let replayed = records.len();
        for record in records {
            match record {
                JournalRecord::Insert { doc } => index.restore(doc)?,
                JournalRecord::Delete { id } => {
                    index.delete_one(&id)?;
                }
            }
        }

        let documents = index.len()?;
        info!(
            path = %path.display(),
            records = replayed,
            documents,
            "journal opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            index,
            writer: Mutex::new(JournalWriter {
                writer: BufWriter::new(file),
                offset: valid_len,
            }),
            sync_mode,
        })
    }

    /// Rewrite the journal so it holds exactly one insert per live document.
    pub fn compact(&self) -> StoreResult<()> {
        let mut w = self.lock()?;
        w.writer.flush()?;

        let docs = self.index.snapshot()?;
        let tmp_path = self.path.with_extension("journal.compact");
        let mut offset = 0;
        {
            let mut tmp = BufWriter::new(File::create(&tmp_path)?);
            for doc in &docs {
                offset += write_frame(&mut tmp, &JournalRecord::Insert { doc: doc.clone() })?;
            }
            tmp.flush()?;
            tmp.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        w.writer = BufWriter::new(file);
        w.offset = offset;

        info!(path = %self.path.display(), documents = docs.len(), bytes = offset, "journal compacted");
        Ok(())
    }

    /// Current journal length in bytes.
    pub fn offset(&self) -> StoreResult<u64> {
        Ok(self.lock()?.offset)
    }

    /// Path to the journal file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, JournalWriter>> {
        self.writer
            .lock()
            .map_err(|_| StoreError::Unavailable("journal lock poisoned".into()))
    }

    fn append(&self, w: &mut JournalWriter, record: &JournalRecord) -> StoreResult<()> {
        let written = match write_frame(&mut w.writer, record).and_then(|n| {
            w.writer.flush()?;
            if self.sync_mode == SyncMode::EveryWrite {
                w.writer.get_ref().sync_all()?;
            }
            Ok(n)
        }) {
            Ok(n) => n,
            Err(e) => {
                warn!(offset = w.offset, error = %e, "journal append failed; rolling back");
                self.rollback(w)?;
                return Err(e);
            }
        };

        debug!(offset = w.offset, len = written, "journal append");
        w.offset += written;
        Ok(())
    }

    /// Drop any partially written record so the journal ends on a frame
    /// boundary again.
    fn rollback(&self, w: &mut JournalWriter) -> StoreResult<()> {
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let old = std::mem::replace(&mut w.writer, BufWriter::new(file));
        // Discard buffered bytes instead of letting drop flush them.
        let _ = old.into_parts();
        w.writer.get_ref().set_len(w.offset)?;
        Ok(())
    }
}

impl DocumentStore for FileDocumentStore {
    fn insert_one(&self, doc: GeoDocument) -> StoreResult<()> {
        let mut w = self.lock()?;
        if self.index.contains(&doc.id)? {
            return Err(StoreError::DuplicateId(doc.id));
        }
        self.append(&mut w, &JournalRecord::Insert { doc: doc.clone() })?;
        self.index.insert_one(doc)
    }

    fn find_one(&self, id: &ContentId) -> StoreResult<Option<GeoDocument>> {
        self.index.find_one(id)
    }

    fn delete_one(&self, id: &ContentId) -> StoreResult<bool> {
        let mut w = self.lock()?;
        if !self.index.contains(id)? {
            return Ok(false);
        }
        self.append(&mut w, &JournalRecord::Delete { id: *id })?;
        self.index.delete_one(id)
    }

    fn count(&self) -> StoreResult<u64> {
        self.index.count()
    }

    fn ids(&self) -> StoreResult<Vec<ContentId>> {
        self.index.ids()
    }

    fn find_by_type(&self, type_tag: &str) -> StoreResult<Vec<GeoDocument>> {
        self.index.find_by_type(type_tag)
    }

    fn find_within(&self, polygon: &Geometry) -> StoreResult<Vec<GeoDocument>> {
        self.index.find_within(polygon)
    }

    fn contains(&self, id: &ContentId) -> StoreResult<bool> {
        self.index.contains(id)
    }

    fn flush(&self) -> StoreResult<()> {
        let mut w = self.lock()?;
        w.writer.flush()?;
        w.writer.get_ref().sync_all()?;
        Ok(())
    }
}

impl Drop for FileDocumentStore {
    fn drop(&mut self) {
        if let Err(e) = DocumentStore::flush(self) {
            warn!(path = %self.path.display(), error = %e, "failed to flush journal on drop");
        }
    }
}

impl std::fmt::Debug for FileDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDocumentStore")
            .field("path", &self.path)
            .field("document_count", &self.index.len().ok())
            .finish()
    }
}

/// Serialize and frame one record. Returns the number of bytes written.
fn write_frame<W: Write>(out: &mut W, record: &JournalRecord) -> StoreResult<u64> {
    let payload = serde_json::to_vec(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization("journal record exceeds 4 GiB".into()))?;
    let crc = crc32fast::hash(&payload);

    out.write_all(&length.to_le_bytes())?;
    out.write_all(&crc.to_le_bytes())?;
    out.write_all(&payload)?;
    Ok(HEADER_SIZE + payload.len() as u64)
}

/// Copy everything from `from` to the end of the journal into a sidecar
/// file next to it. Returns the sidecar path.
fn preserve_tail(path: &Path, from: u64) -> StoreResult<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{from}.discarded"));
    let backup = PathBuf::from(name);

    let mut src = File::open(path)?;
    src.seek(SeekFrom::Start(from))?;
    let mut dst = File::create(&backup)?;
    io::copy(&mut src, &mut dst)?;
    dst.sync_all()?;
    Ok(backup)
}

/// Read every intact record from the journal at `path`.
///
/// Returns the records and the byte length of the well-framed prefix.
fn recover(path: &Path) -> StoreResult<(Vec<JournalRecord>, u64)> {
    let mut file = BufReader::new(File::open(path)?);
    let file_len = file.get_ref().metadata()?.len();
    let mut records = Vec::new();
    let mut offset: u64 = 0;

    while offset + HEADER_SIZE <= file_len {
        file.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; HEADER_SIZE as usize];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        if length == 0 || offset + HEADER_SIZE + u64::from(length) > file_len {
            warn!(offset, length, file_len, "invalid journal record length; stopping recovery");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match file.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(offset, "truncated journal record; stopping recovery");
                break;
            }
            Err(e) => return Err(e.into()),
        }
        let next = offset + HEADER_SIZE + u64::from(length);

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(offset, expected = expected_crc, actual = actual_crc, "CRC mismatch; skipping record");
            offset = next;
            continue;
        }

        match serde_json::from_slice::<JournalRecord>(&payload) {
            Ok(record) => records.push(record),
            Err(e) => warn!(offset, error = %e, "failed to decode journal record; skipping"),
        }
        offset = next;
    }

    debug!(recovered = records.len(), "journal recovery complete");
    Ok((records, offset))
}
