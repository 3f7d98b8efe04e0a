//! Binary persistence for completed tasks.
//!
//! File layout: `u32` count of succeeded tasks, that many records, `u32` count
//! of failed tasks, that many records. Integers are little-endian. Each record
//! is [`RECORD_LEN`] bytes:
//!
//! | offset | size | field                                   |
//! |-------:|-----:|-----------------------------------------|
//! | 0      | 4    | id                                      |
//! | 4      | 100  | description, UTF-8, zero-padded         |
//! | 104    | 1    | priority (0 high, 1 low)                |
//! | 105    | 8    | registered_at, seconds since epoch      |
//! | 113    | 4    | registered_at, sub-second nanos         |
//! | 117    | 1    | completed_at present (0/1)              |
//! | 118    | 8    | completed_at, seconds since epoch       |
//! | 126    | 4    | completed_at, sub-second nanos          |
//! | 130    | 1    | outcome (0 pending, 1 succeeded, 2 failed) |
//!
//! Pending tasks are never written.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::tracker::{DESCRIPTION_SLOT, Description, Outcome, Priority, Task, TaskRegistry};

pub const RECORD_LEN: usize = 4 + DESCRIPTION_SLOT + 1 + 12 + 1 + 12 + 1;

const COUNT_LEN: usize = 4;

/// Both completed collections, as read back from disk.
#[derive(Debug, Clone, Default)]
pub struct CompletedSet {
    pub succeeded: TaskRegistry,
    pub failed: TaskRegistry,
}

/// Writes both registries to `path`, replacing any existing file.
pub fn save(succeeded: &TaskRegistry, failed: &TaskRegistry, path: &Path) -> Result<()> {
    let bytes = encode(succeeded, failed)?;
    std::fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        succeeded = succeeded.len(),
        failed = failed.len(),
        bytes = bytes.len(),
        "completed tasks saved"
    );
    Ok(())
}

/// Reads both registries from `path`. Each comes back with `capacity == len`.
pub fn load(path: &Path) -> Result<CompletedSet> {
    let bytes = std::fs::read(path)?;
    let set = decode(&bytes)?;
    info!(
        path = %path.display(),
        succeeded = set.succeeded.len(),
        failed = set.failed.len(),
        "completed tasks loaded"
    );
    Ok(set)
}

pub fn encode(succeeded: &TaskRegistry, failed: &TaskRegistry) -> Result<Vec<u8>> {
    let mut buf =
        Vec::with_capacity(2 * COUNT_LEN + (succeeded.len() + failed.len()) * RECORD_LEN);
    for registry in [succeeded, failed] {
        let count = u32::try_from(registry.len()).map_err(|_| {
            TrackerError::InvalidInput(format!("{} tasks exceed the file format limit", registry.len()))
        })?;
        buf.extend_from_slice(&count.to_le_bytes());
        for task in registry {
            encode_record(task, &mut buf);
        }
    }
    Ok(buf)
}

pub fn decode(bytes: &[u8]) -> Result<CompletedSet> {
    let mut reader = Reader::new(bytes);
    let succeeded = reader.read_collection("succeeded", Outcome::Succeeded)?;
    let failed = reader.read_collection("failed", Outcome::Failed)?;
    if reader.remaining() != 0 {
        return Err(TrackerError::corrupt(format!(
            "{} unexpected trailing bytes",
            reader.remaining()
        )));
    }
    Ok(CompletedSet {
        succeeded: TaskRegistry::with_exact_capacity(succeeded),
        failed: TaskRegistry::with_exact_capacity(failed),
    })
}

fn encode_record(task: &Task, buf: &mut Vec<u8>) {
    let start = buf.len();
    buf.extend_from_slice(&task.id.to_le_bytes());

    let mut slot = [0u8; DESCRIPTION_SLOT];
    let text = task.description.as_str().as_bytes();
    slot[..text.len()].copy_from_slice(text);
    buf.extend_from_slice(&slot);

    buf.push(match task.priority {
        Priority::High => 0,
        Priority::Low => 1,
    });
    encode_timestamp(&task.registered_at, buf);
    match &task.completed_at {
        Some(at) => {
            buf.push(1);
            encode_timestamp(at, buf);
        }
        None => {
            buf.push(0);
            buf.extend_from_slice(&[0u8; 12]);
        }
    }
    buf.push(match task.outcome {
        Outcome::Pending => 0,
        Outcome::Succeeded => 1,
        Outcome::Failed => 2,
    });
    debug_assert_eq!(buf.len() - start, RECORD_LEN);
}

fn encode_timestamp(at: &DateTime<Utc>, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&at.timestamp().to_le_bytes());
    buf.extend_from_slice(&at.timestamp_subsec_nanos().to_le_bytes());
}

/// Bounds-checked cursor over the file contents.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(TrackerError::truncated(format!(
                "need {n} bytes at offset {}, only {} left",
                self.pos,
                self.remaining()
            )));
        }
        let chunk = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(chunk)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    /// Every record in the collection must be completed with `expected`.
    fn read_collection(&mut self, name: &str, expected: Outcome) -> Result<Vec<Task>> {
        let count = self.u32()? as usize;
        // Validate the declared count before allocating anything for it.
        let needed = count.checked_mul(RECORD_LEN).ok_or_else(|| {
            TrackerError::corrupt(format!("{name} count {count} overflows"))
        })?;
        if needed > self.remaining() {
            return Err(TrackerError::truncated(format!(
                "{name} declares {count} records ({needed} bytes) but only {} bytes remain",
                self.remaining()
            )));
        }
        debug!(collection = name, count, "decoding records");
        let mut tasks = Vec::with_capacity(count);
        for _ in 0..count {
            let task = self.read_record()?;
            if task.outcome != expected {
                return Err(TrackerError::corrupt(format!(
                    "task {}: outcome {} stored in the {name} collection",
                    task.id, task.outcome
                )));
            }
            tasks.push(task);
        }
        Ok(tasks)
    }

    fn read_record(&mut self) -> Result<Task> {
        let id = self.u32()?;
        let description = decode_description(self.take(DESCRIPTION_SLOT)?, id)?;
        let priority = match self.u8()? {
            0 => Priority::High,
            1 => Priority::Low,
            tag => {
                return Err(TrackerError::corrupt(format!(
                    "task {id}: unknown priority tag {tag}"
                )));
            }
        };
        let registered_at = self.timestamp(id)?;
        let has_completion = self.u8()?;
        let (secs, nanos) = (self.i64()?, self.u32()?);
        let completed_at = match has_completion {
            0 if secs == 0 && nanos == 0 => None,
            0 => {
                return Err(TrackerError::corrupt(format!(
                    "task {id}: completion time set without completion flag"
                )));
            }
            1 => Some(to_datetime(id, secs, nanos)?),
            flag => {
                return Err(TrackerError::corrupt(format!(
                    "task {id}: invalid completion flag {flag}"
                )));
            }
        };
        let outcome = match self.u8()? {
            0 => Outcome::Pending,
            1 => Outcome::Succeeded,
            2 => Outcome::Failed,
            tag => {
                return Err(TrackerError::corrupt(format!(
                    "task {id}: unknown outcome tag {tag}"
                )));
            }
        };
        if (outcome == Outcome::Pending) != completed_at.is_none() {
            return Err(TrackerError::corrupt(format!(
                "task {id}: outcome {outcome} does not match its completion time"
            )));
        }
        Ok(Task {
            id,
            description,
            priority,
            registered_at,
            completed_at,
            outcome,
        })
    }

    fn timestamp(&mut self, id: u32) -> Result<DateTime<Utc>> {
        let secs = self.i64()?;
        let nanos = self.u32()?;
        to_datetime(id, secs, nanos)
    }
}

fn to_datetime(id: u32, secs: i64, nanos: u32) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
        TrackerError::corrupt(format!("task {id}: timestamp {secs}.{nanos} out of range"))
    })
}

fn decode_description(slot: &[u8], id: u32) -> Result<Description> {
    let end = slot.iter().position(|&b| b == 0).ok_or_else(|| {
        TrackerError::corrupt(format!("task {id}: description is not terminated"))
    })?;
    if slot[end..].iter().any(|&b| b != 0) {
        return Err(TrackerError::corrupt(format!(
            "task {id}: description padding is not zeroed"
        )));
    }
    let text = std::str::from_utf8(&slot[..end]).map_err(|e| {
        TrackerError::corrupt(format!("task {id}: description is not UTF-8: {e}"))
    })?;
    Description::new(text)
        .map_err(|e| TrackerError::corrupt(format!("task {id}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn completed(id: u32, desc: &str, priority: Priority, outcome: Outcome) -> Task {
        let mut task = Task::new(id, Description::new(desc).unwrap(), priority);
        task.complete(outcome, Utc::now());
        task
    }

    fn registry(tasks: Vec<Task>) -> TaskRegistry {
        let mut reg = TaskRegistry::new();
        for t in tasks {
            reg.append(t);
        }
        reg
    }

    fn io_kind(err: TrackerError) -> std::io::ErrorKind {
        match err {
            TrackerError::Io(e) => e.kind(),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn record_len_matches_layout() {
        assert_eq!(RECORD_LEN, 131);
        let reg = registry(vec![completed(1, "a", Priority::High, Outcome::Succeeded)]);
        let bytes = encode(&reg, &TaskRegistry::new()).unwrap();
        assert_eq!(bytes.len(), 2 * COUNT_LEN + RECORD_LEN);
    }

    #[test]
    fn empty_roundtrip() {
        let bytes = encode(&TaskRegistry::new(), &TaskRegistry::new()).unwrap();
        assert_eq!(bytes, vec![0u8; 8]);
        let set = decode(&bytes).unwrap();
        assert!(set.succeeded.is_empty());
        assert!(set.failed.is_empty());
    }

    #[test]
    fn single_and_many_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.bin");

        let succeeded = registry(vec![completed(
            1,
            "Ship release",
            Priority::High,
            Outcome::Succeeded,
        )]);
        let failed = registry(
            (1..=25)
                .map(|i| {
                    let p = if i % 2 == 0 { Priority::High } else { Priority::Low };
                    completed(i, &format!("Tarefa número {i}"), p, Outcome::Failed)
                })
                .collect(),
        );

        save(&succeeded, &failed, &path).unwrap();
        let set = load(&path).unwrap();

        assert_eq!(set.succeeded.as_slice(), succeeded.as_slice());
        assert_eq!(set.failed.as_slice(), failed.as_slice());
        assert_eq!(set.succeeded.capacity(), 1);
        assert_eq!(set.failed.capacity(), 25);
    }

    #[test]
    fn pending_record_is_corrupt_in_either_collection() {
        let task = Task::new(9, Description::new("never ran").unwrap(), Priority::High);
        let reg = registry(vec![task]);

        let err = decode(&encode(&reg, &TaskRegistry::new()).unwrap()).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::InvalidData);

        let err = decode(&encode(&TaskRegistry::new(), &reg).unwrap()).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn record_in_the_wrong_collection_is_corrupt() {
        let failed = registry(vec![completed(1, "broke", Priority::Low, Outcome::Failed)]);
        let err = decode(&encode(&failed, &TaskRegistry::new()).unwrap()).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::InvalidData);

        let ok = registry(vec![completed(2, "fine", Priority::High, Outcome::Succeeded)]);
        let err = decode(&encode(&TaskRegistry::new(), &ok).unwrap()).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn completion_flag_must_agree_with_timestamp_and_outcome() {
        let reg = registry(vec![completed(1, "a", Priority::High, Outcome::Succeeded)]);
        let clean = encode(&reg, &TaskRegistry::new()).unwrap();
        let flag = COUNT_LEN + 117;

        // Terminal outcome without a completion flag.
        let mut unflagged = clean.clone();
        unflagged[flag] = 0;
        assert_eq!(
            io_kind(decode(&unflagged).unwrap_err()),
            std::io::ErrorKind::InvalidData
        );

        // Flag cleared and time zeroed still leaves a succeeded task uncompleted.
        let mut zeroed = unflagged.clone();
        zeroed[flag + 1..flag + 13].fill(0);
        assert_eq!(
            io_kind(decode(&zeroed).unwrap_err()),
            std::io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn max_length_description_roundtrips() {
        let text = "z".repeat(crate::tracker::MAX_DESCRIPTION_LEN);
        let reg = registry(vec![completed(1, &text, Priority::Low, Outcome::Succeeded)]);
        let set = decode(&encode(&reg, &TaskRegistry::new()).unwrap()).unwrap();
        assert_eq!(set.succeeded.as_slice()[0].description.as_str(), text);
    }

    #[test]
    fn pre_epoch_timestamp_roundtrips() {
        let mut task = completed(1, "old", Priority::High, Outcome::Succeeded);
        task.registered_at = Utc.with_ymd_and_hms(1960, 5, 1, 12, 0, 0).unwrap();
        let reg = registry(vec![task.clone()]);
        let set = decode(&encode(&reg, &TaskRegistry::new()).unwrap()).unwrap();
        assert_eq!(set.succeeded.as_slice(), &[task]);
    }

    #[test]
    fn truncated_file_is_io_error() {
        let reg = registry(vec![
            completed(1, "a", Priority::High, Outcome::Succeeded),
            completed(2, "b", Priority::Low, Outcome::Succeeded),
        ]);
        let bytes = encode(&reg, &TaskRegistry::new()).unwrap();

        // Cut inside the second record.
        let err = decode(&bytes[..COUNT_LEN + RECORD_LEN + 10]).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::UnexpectedEof);

        // Missing the failed count entirely.
        let err = decode(&bytes[..bytes.len() - COUNT_LEN]).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::UnexpectedEof);

        // Shorter than the first count.
        let err = decode(&[1, 0]).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn huge_declared_count_is_rejected_without_allocating() {
        let bytes = u32::MAX.to_le_bytes();
        let err = decode(&bytes).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn trailing_bytes_are_corrupt() {
        let mut bytes = encode(&TaskRegistry::new(), &TaskRegistry::new()).unwrap();
        bytes.push(0xff);
        let err = decode(&bytes).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn bad_tags_are_corrupt() {
        let reg = registry(vec![completed(1, "a", Priority::High, Outcome::Succeeded)]);
        let clean = encode(&reg, &TaskRegistry::new()).unwrap();

        let mut bad_priority = clean.clone();
        bad_priority[COUNT_LEN + 104] = 9;
        assert_eq!(
            io_kind(decode(&bad_priority).unwrap_err()),
            std::io::ErrorKind::InvalidData
        );

        let mut bad_outcome = clean.clone();
        bad_outcome[COUNT_LEN + 130] = 3;
        assert_eq!(
            io_kind(decode(&bad_outcome).unwrap_err()),
            std::io::ErrorKind::InvalidData
        );

        let mut unterminated = clean;
        for b in &mut unterminated[COUNT_LEN + 4..COUNT_LEN + 104] {
            *b = b'x';
        }
        assert_eq!(
            io_kind(decode(&unterminated).unwrap_err()),
            std::io::ErrorKind::InvalidData
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.bin")).unwrap_err();
        assert_eq!(io_kind(err), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn unwritable_destination_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("tasks.bin");
        let err = save(&TaskRegistry::new(), &TaskRegistry::new(), &path).unwrap_err();
        assert!(matches!(err, TrackerError::Io(_)));
    }
}
