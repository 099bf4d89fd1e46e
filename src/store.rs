use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Flat file of fixed-size records, loaded whole and rewritten whole.
pub struct RecordStore<T> {
    path: PathBuf,
    records: Vec<T>,
}

impl<T> RecordStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Loads every record from `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<RecordStore<T>> {
        let path = path.as_ref().to_path_buf();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::info!("{} not found, starting empty", path.display());
                Vec::new()
            }
            Err(source) => return Err(Error::Storage { path, source }),
        };

        let mut records = Vec::new();
        let mut rest = bytes.as_slice();
        while !rest.is_empty() {
            match bincode::deserialize_from(&mut rest) {
                Ok(record) => records.push(record),
                Err(source) => return Err(Error::Corrupt { path, source }),
            }
        }
        log::debug!("loaded {} records from {}", records.len(), path.display());

        Ok(RecordStore { path, records })
    }

    pub fn save(&self) -> Result<()> {
        let mut bytes = Vec::new();
        for record in &self.records {
            bincode::serialize_into(&mut bytes, record).map_err(|source| Error::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, bytes).map_err(|source| Error::Storage {
            path: self.path.clone(),
            source,
        })
    }

    pub fn push(&mut self, record: T) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> T {
        self.records.remove(index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.records.get_mut(index)
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: u32,
        value: f64,
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store: RecordStore<Entry> = RecordStore::open(dir.path().join("none.dat")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.dat");
        let mut store: RecordStore<Entry> = RecordStore::open(&path).unwrap();
        store.push(Entry { id: 1, value: 2.5 });
        store.push(Entry { id: 2, value: -1.0 });
        store.save().unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 2 * 12);
        let reloaded: RecordStore<Entry> = RecordStore::open(&path).unwrap();
        assert_eq!(reloaded.records(), store.records());
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.dat");
        std::fs::write(&path, [1u8, 0, 0]).unwrap();
        let result: Result<RecordStore<Entry>> = RecordStore::open(&path);
        assert!(matches!(result, Err(Error::Corrupt { .. })));
    }
}
