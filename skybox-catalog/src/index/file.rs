//! Persistent index: an append-only record file with an in-memory grid mirror.
//!
//! The file has two sections:
//!
//! 1. **Header** (64 bytes) — magic `SKYB`, version, committed record count,
//!    largest committed id, reserved padding
//! 2. **Records** (`count × 72` bytes) — `id: u64` then
//!    `xmin xmax ymin ymax zmin zmax mmin mmax` as `f64`, all little-endian
//!
//! A batch commit appends its records and syncs, then rewrites the header
//! count and syncs again. The header count is the commit point: bytes past
//! `64 + count × 72` belong to a batch that never committed and are cut off
//! the next time the file is opened.
//!
//! Queries never touch the file. [`FileIndex::open`] maps the file once,
//! validates it and loads the committed prefix into a [`GridIndex`]. The
//! mirror keeps every entry in memory (about 100 bytes each with its cell
//! slots), so a 44M-point catalog needs several GB of RAM and is rebuilt on
//! every open. Catalogs beyond that size need an index that queries the map
//! in place.

use super::{check_batch, CatalogEntry, GridIndex, SpatialIndex};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use log::{debug, info, warn};
use memmap2::Mmap;
use skybox_core::{Bounds, Error, Range, Result};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const FILE_MAGIC: &[u8; 4] = b"SKYB";
pub const FILE_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 64;
pub const RECORD_SIZE: usize = 72;

/// Metadata stored in the first 64 bytes of a catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: u32,
    /// Records covered by the last successful commit.
    pub count: u64,
    pub max_id: u64,
}

impl FileHeader {
    fn empty() -> Self {
        Self {
            version: FILE_VERSION,
            count: 0,
            max_id: 0,
        }
    }

    fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(FILE_MAGIC);
        LittleEndian::write_u32(&mut buf[4..8], self.version);
        LittleEndian::write_u64(&mut buf[8..16], self.count);
        LittleEndian::write_u64(&mut buf[16..24], self.max_id);
        buf
    }

    /// Byte length of header plus committed records.
    ///
    /// # Errors
    /// [`Error::Storage`] if the count is too large to address.
    pub fn committed_len(&self) -> Result<u64> {
        self.count
            .checked_mul(RECORD_SIZE as u64)
            .and_then(|b| b.checked_add(HEADER_SIZE as u64))
            .ok_or_else(|| {
                Error::storage(
                    "open",
                    format!("header record count {} overflows the file size", self.count),
                )
            })
    }
}

impl fmt::Display for FileHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Format version: {}", self.version)?;
        writeln!(f, "Committed records: {}", self.count)?;
        write!(f, "Max id: {}", self.max_id)
    }
}

fn parse_header(bytes: &[u8]) -> Result<FileHeader> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::storage(
            "open",
            format!("catalog file too small: {} bytes", bytes.len()),
        ));
    }
    let magic = &bytes[0..4];
    if magic != FILE_MAGIC {
        return Err(Error::storage(
            "open",
            format!(
                "invalid catalog magic: expected {:?}, got {:?}",
                FILE_MAGIC, magic
            ),
        ));
    }
    let version = LittleEndian::read_u32(&bytes[4..8]);
    if version != FILE_VERSION {
        return Err(Error::storage(
            "open",
            format!(
                "unsupported catalog version: expected {}, got {}",
                FILE_VERSION, version
            ),
        ));
    }
    Ok(FileHeader {
        version,
        count: LittleEndian::read_u64(&bytes[8..16]),
        max_id: LittleEndian::read_u64(&bytes[16..24]),
    })
}

fn decode_record(rec: &[u8]) -> CatalogEntry {
    let f = |i: usize| LittleEndian::read_f64(&rec[8 + 8 * i..16 + 8 * i]);
    CatalogEntry {
        id: LittleEndian::read_u64(&rec[0..8]),
        bounds: Bounds {
            x: Range::new(f(0), f(1)),
            y: Range::new(f(2), f(3)),
            z: Range::new(f(4), f(5)),
            m: Range::new(f(6), f(7)),
        },
    }
}

fn encode_records(entries: &[CatalogEntry]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(entries.len() * RECORD_SIZE);
    for e in entries {
        buf.write_u64::<LittleEndian>(e.id)?;
        for r in e.bounds.axes() {
            buf.write_f64::<LittleEndian>(r.min)?;
            buf.write_f64::<LittleEndian>(r.max)?;
        }
    }
    Ok(buf)
}

fn storage_io(operation: &str, path: &Path, err: std::io::Error) -> Error {
    Error::storage(operation, format!("{}: {}", path.display(), err))
}

/// File-backed [`SpatialIndex`].
pub struct FileIndex {
    path: PathBuf,
    file: File,
    header: FileHeader,
    mirror: GridIndex,
}

impl fmt::Debug for FileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileIndex")
            .field("path", &self.path)
            .field("header", &self.header)
            .finish()
    }
}

impl FileIndex {
    /// Start a new empty catalog at `path`, replacing any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_grid(path, GridIndex::new())
    }

    /// Like [`create`](Self::create) with a caller-chosen mirror grid.
    pub fn create_with_grid(path: impl AsRef<Path>, grid: GridIndex) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Self::fresh_file(&path)?;
        let mut mirror = grid;
        mirror.reset()?;
        info!("Created empty catalog {}", path.display());
        Ok(Self {
            path,
            file,
            header: FileHeader::empty(),
            mirror,
        })
    }

    /// Open an existing catalog, discarding any uncommitted tail.
    ///
    /// # Errors
    /// [`Error::Storage`] if the file is missing, has a bad header, is
    /// shorter than its committed count, or holds records that break the
    /// id ordering.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_grid(path, GridIndex::new())
    }

    pub fn open_with_grid(path: impl AsRef<Path>, grid: GridIndex) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| storage_io("open", &path, e))?;

        let mut mirror = grid;
        mirror.reset()?;

        let (header, file_len) = {
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| storage_io("mmap", &path, e))?;
            let header = parse_header(&mmap)?;
            let committed = header.committed_len()?;
            let available = (mmap.len() - HEADER_SIZE) / RECORD_SIZE;
            if (available as u64) < header.count {
                return Err(Error::storage(
                    "open",
                    format!(
                        "catalog truncated: header commits {} records ({} bytes), file has {} bytes",
                        header.count,
                        committed,
                        mmap.len()
                    ),
                ));
            }

            let records: Vec<CatalogEntry> = mmap[HEADER_SIZE..committed as usize]
                .chunks_exact(RECORD_SIZE)
                .map(decode_record)
                .collect();
            mirror
                .insert_batch(&records)
                .map_err(|e| Error::storage("open", format!("corrupt catalog records: {}", e)))?;
            if mirror.max_id() != header.max_id {
                return Err(Error::storage(
                    "open",
                    format!(
                        "header max id {} disagrees with records (max id {})",
                        header.max_id,
                        mirror.max_id()
                    ),
                ));
            }
            (header, mmap.len() as u64)
        };

        let committed = header.committed_len()?;
        if file_len > committed {
            warn!(
                "Discarding {} bytes of uncommitted data in {}",
                file_len - committed,
                path.display()
            );
            file.set_len(committed)
                .map_err(|e| storage_io("truncate", &path, e))?;
            file.sync_all()?;
        }

        info!(
            "Opened catalog {} ({} entries, max id {})",
            path.display(),
            header.count,
            header.max_id
        );
        Ok(Self {
            path,
            file,
            header,
            mirror,
        })
    }

    /// [`open`](Self::open) if the file exists, [`create`](Self::create)
    /// otherwise.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    fn fresh_file(path: &Path) -> Result<File> {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(storage_io("reset", path, e)),
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| storage_io("create", path, e))?;
        file.write_all(&FileHeader::empty().to_bytes())?;
        file.sync_all()?;
        Ok(file)
    }

    fn write_header(&mut self, header: &FileHeader) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header.to_bytes())?;
        self.file.sync_all()?;
        Ok(())
    }
}

impl SpatialIndex for FileIndex {
    fn insert_batch(&mut self, entries: &[CatalogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let max_id = check_batch(entries, self.header.max_id)?;
        let bytes = encode_records(entries)?;

        // overwrite any leftover tail from a failed commit
        self.file.seek(SeekFrom::Start(self.header.committed_len()?))?;
        self.file.write_all(&bytes)?;
        self.file.sync_data()?;

        let next = FileHeader {
            version: FILE_VERSION,
            count: self.header.count + entries.len() as u64,
            max_id,
        };
        self.write_header(&next)?;
        self.header = next;

        self.mirror.insert_batch(entries)?;
        debug!(
            "Committed {} records to {} (total {})",
            entries.len(),
            self.path.display(),
            next.count
        );
        Ok(())
    }

    fn range_query(&self, bounds: &Bounds) -> Result<Vec<CatalogEntry>> {
        self.mirror.range_query(bounds)
    }

    fn len(&self) -> usize {
        self.mirror.len()
    }

    fn max_id(&self) -> u64 {
        self.header.max_id
    }

    fn reset(&mut self) -> Result<()> {
        self.file = Self::fresh_file(&self.path)?;
        self.header = FileHeader::empty();
        self.mirror.reset()?;
        info!("Reset catalog {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybox_core::Vector3;
    use tempfile::{tempdir, NamedTempFile};

    fn point(id: u64, v: Vector3, mag: f64) -> CatalogEntry {
        CatalogEntry::point(id, &v, mag)
    }

    #[test]
    fn record_layout() {
        let e = point(7, Vector3::new(0.6, 0.8, 0.0), 12.5);
        let bytes = encode_records(&[e]).unwrap();
        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(LittleEndian::read_u64(&bytes[0..8]), 7);
        assert_eq!(LittleEndian::read_f64(&bytes[16..24]), 0.6);
        assert_eq!(LittleEndian::read_f64(&bytes[64..72]), 12.5);
        assert_eq!(decode_record(&bytes), e);
    }

    #[test]
    fn committed_batches_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.skyb");
        {
            let mut idx = FileIndex::create(&path).unwrap();
            idx.insert_batch(&[point(1, Vector3::x_axis(), 1.0), point(2, Vector3::y_axis(), 2.0)])
                .unwrap();
            idx.insert(point(3, Vector3::z_axis(), 3.0)).unwrap();
        }
        let idx = FileIndex::open(&path).unwrap();
        assert_eq!(idx.len(), 3);
        assert_eq!(idx.max_id(), 3);
        assert_eq!(idx.header().count, 3);
        let q = Bounds::cube(&Vector3::z_axis(), 0.01, Range::unbounded());
        let hits = idx.range_query(&q).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 3);
    }

    #[test]
    fn uncommitted_tail_is_discarded_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.skyb");
        {
            let mut idx = FileIndex::create(&path).unwrap();
            idx.insert(point(1, Vector3::x_axis(), 1.0)).unwrap();
        }
        // half-written batch: records appended but header never updated
        {
            let mut f = OpenOptions::new().append(true).open(&path).unwrap();
            let tail = encode_records(&[point(2, Vector3::y_axis(), 2.0)]).unwrap();
            f.write_all(&tail).unwrap();
            f.write_all(&[0xAB; 10]).unwrap();
        }
        let mut idx = FileIndex::open(&path).unwrap();
        assert_eq!(idx.len(), 1);
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            (HEADER_SIZE + RECORD_SIZE) as u64
        );

        idx.insert(point(2, Vector3::y_axis(), 2.0)).unwrap();
        drop(idx);
        assert_eq!(FileIndex::open(&path).unwrap().len(), 2);
    }

    #[test]
    fn rejected_batch_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.skyb");
        let mut idx = FileIndex::create(&path).unwrap();
        idx.insert(point(5, Vector3::x_axis(), 1.0)).unwrap();
        assert!(idx.insert(point(4, Vector3::y_axis(), 1.0)).is_err());
        assert_eq!(idx.len(), 1);
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            (HEADER_SIZE + RECORD_SIZE) as u64
        );
    }

    #[test]
    fn open_missing_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let err = FileIndex::open(dir.path().join("absent.skyb")).unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[test]
    fn open_bad_magic() {
        let mut file = NamedTempFile::new().unwrap();
        let mut buf = FileHeader::empty().to_bytes();
        buf[0..4].copy_from_slice(b"XXXX");
        file.write_all(&buf).unwrap();
        file.flush().unwrap();
        let msg = FileIndex::open(file.path()).unwrap_err().to_string();
        assert!(msg.contains("magic"), "unexpected error: {}", msg);
    }

    #[test]
    fn open_too_small() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 16]).unwrap();
        file.flush().unwrap();
        let msg = FileIndex::open(file.path()).unwrap_err().to_string();
        assert!(msg.contains("too small"), "unexpected error: {}", msg);
    }

    #[test]
    fn open_short_committed_section() {
        let mut file = NamedTempFile::new().unwrap();
        let header = FileHeader {
            version: FILE_VERSION,
            count: 2,
            max_id: 2,
        };
        file.write_all(&header.to_bytes()).unwrap();
        file.write_all(&encode_records(&[point(1, Vector3::x_axis(), 1.0)]).unwrap())
            .unwrap();
        file.flush().unwrap();
        let msg = FileIndex::open(file.path()).unwrap_err().to_string();
        assert!(msg.contains("truncated"), "unexpected error: {}", msg);
    }

    #[test]
    fn open_overflowing_count() {
        for count in [u64::MAX / 8, 1u64 << 61, u64::MAX] {
            let mut file = NamedTempFile::new().unwrap();
            let header = FileHeader {
                version: FILE_VERSION,
                count,
                max_id: 0,
            };
            file.write_all(&header.to_bytes()).unwrap();
            file.flush().unwrap();
            let err = FileIndex::open(file.path()).unwrap_err();
            assert!(matches!(err, Error::Storage { .. }), "count {}: {}", count, err);
        }
    }

    #[test]
    fn reset_recreates_file_and_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cat.skyb");
        let mut idx = FileIndex::create(&path).unwrap();
        idx.insert(point(1, Vector3::x_axis(), 1.0)).unwrap();

        fs::remove_file(&path).unwrap();
        idx.reset().unwrap();
        assert!(idx.is_empty());
        assert_eq!(fs::metadata(&path).unwrap().len(), HEADER_SIZE as u64);

        idx.reset().unwrap();
        idx.insert(point(1, Vector3::y_axis(), 1.0)).unwrap();
        assert_eq!(FileIndex::open(&path).unwrap().len(), 1);
    }

    #[test]
    fn open_or_create_creates_when_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.skyb");
        let idx = FileIndex::open_or_create(&path).unwrap();
        assert!(idx.is_empty());
        assert!(path.exists());
    }
}
