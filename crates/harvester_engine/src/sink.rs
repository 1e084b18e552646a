use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use harvest_logging::{harvest_debug, harvest_error, harvest_info, harvest_warn};
use harvester_core::{HarvestRecord, RECORD_HEADER};
use tempfile::NamedTempFile;

use crate::persist::{ensure_output_dir, parent_dir, PersistError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Durable destination for harvested records.
pub trait RecordSink: Send {
    fn append(&mut self, record: &HarvestRecord) -> Result<(), PersistError>;
}

/// Append-only CSV file with a BOM and a header written exactly once.
///
/// Each record is encoded whole and written in one call; a write that fails
/// part way is cut back to the previous record boundary.
pub struct CsvRecordSink {
    path: PathBuf,
    file: File,
    appended: usize,
}

impl CsvRecordSink {
    /// Opens `path` for appending, creating it with a header if it does not
    /// exist yet. Existing rows are never rewritten; a last line missing its
    /// terminator is closed off first.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let dir = parent_dir(&path);
        ensure_output_dir(&dir)?;
        create_with_header(&path, &dir)?;

        let mut file = OpenOptions::new().read(true).append(true).open(&path)?;
        terminate_last_line(&mut file, &path)?;
        Ok(Self {
            path,
            file,
            appended: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this handle.
    pub fn appended(&self) -> usize {
        self.appended
    }
}

fn terminate_last_line(file: &mut File, path: &Path) -> Result<(), PersistError> {
    if file.metadata()?.len() == 0 {
        return Ok(());
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        harvest_warn!("{} ends mid-line; terminating it", path.display());
        file.write_all(b"\n")?;
        file.sync_data()?;
    }
    Ok(())
}

fn create_with_header(path: &Path, dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {
            harvest_debug!("appending to existing {}", path.display());
            return Ok(());
        }
        // A zero-length file never received its header; start it over.
        Ok(_) => fs::remove_file(path)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(UTF8_BOM)?;
    {
        let mut header = csv::Writer::from_writer(tmp.as_file_mut());
        header.write_record(RECORD_HEADER)?;
        header.flush()?;
    }
    tmp.as_file_mut().sync_all()?;

    match tmp.persist_noclobber(path) {
        Ok(_) => {
            harvest_info!("created {}", path.display());
            Ok(())
        }
        // Someone else created it in between; theirs wins.
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err.error.into()),
    }
}

impl RecordSink for CsvRecordSink {
    fn append(&mut self, record: &HarvestRecord) -> Result<(), PersistError> {
        let row = encode_row(record)?;
        append_whole(&mut self.file, &row)?;
        self.appended += 1;
        Ok(())
    }
}

fn encode_row(record: &HarvestRecord) -> Result<Vec<u8>, PersistError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(record.to_row())?;
    writer
        .into_inner()
        .map_err(|err| PersistError::Io(err.into_error()))
}

/// Byte store a sink appends to.
trait AppendTarget {
    fn size(&self) -> io::Result<u64>;
    fn push(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn sync(&mut self) -> io::Result<()>;
    fn cut_to(&mut self, len: u64) -> io::Result<()>;
}

impl AppendTarget for File {
    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }

    fn cut_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_data()
    }
}

fn append_whole<T: AppendTarget>(target: &mut T, row: &[u8]) -> Result<(), PersistError> {
    let mark = target.size()?;
    let written = target.push(row).and_then(|()| target.sync());
    if let Err(err) = written {
        if let Err(rollback) = target.cut_to(mark) {
            harvest_error!("could not cut partial row back to {mark} bytes: {rollback}");
        }
        return Err(err.into());
    }
    Ok(())
}
