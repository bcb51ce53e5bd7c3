use crate::models::AlarmList;
use anyhow::Result;
use std::fs;
use std::path::PathBuf;

pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn get_base_dir() -> Result<PathBuf> {
        let mut path =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        path.push(".belfry");
        if !path.exists() {
            fs::create_dir_all(&path)?;
        }
        Ok(path)
    }

    pub fn new() -> Result<Self> {
        let path = Self::get_base_dir()?;
        Ok(Self::from_path(path.join("alarms.json")))
    }

    pub fn from_path(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                let _ = fs::create_dir_all(parent);
            }
        }
        Self { path }
    }

    pub fn load(&self) -> Result<AlarmList> {
        if !self.path.exists() {
            return Ok(AlarmList::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let list = serde_json::from_str(&data)?;
        Ok(list)
    }

    pub fn save(&self, list: &AlarmList) -> Result<()> {
        let data = serde_json::to_string_pretty(list)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, &data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlarmKind;
    use tempfile::tempdir;

    #[test]
    fn test_storage_save_load() -> Result<()> {
        let dir = tempdir()?;
        let storage = Storage::from_path(dir.path().join("alarms.json"));

        let mut list = AlarmList::default();
        list.add(
            "tea".to_string(),
            AlarmKind::Countdown { seconds: 300 },
            "notify-send 'tea is ready'".to_string(),
        );
        list.add(
            "wake".to_string(),
            AlarmKind::DailyTime { minutes: 450 },
            String::new(),
        );
        storage.save(&list)?;

        let loaded = storage.load()?;
        assert_eq!(loaded.len(), 2);
        let first = loaded.iter().next().unwrap();
        assert_eq!(first.name, "tea");
        assert_eq!(first.kind, AlarmKind::Countdown { seconds: 300 });
        assert_eq!(first.command, "notify-send 'tea is ready'");
        Ok(())
    }

    #[test]
    fn test_storage_load_nonexistent() -> Result<()> {
        let dir = tempdir()?;
        let storage = Storage::from_path(dir.path().join("nonexistent.json"));

        let list = storage.load()?;
        assert!(list.is_empty());
        Ok(())
    }

    #[test]
    fn test_id_allocation_survives_reload() -> Result<()> {
        let dir = tempdir()?;
        let storage = Storage::from_path(dir.path().join("alarms.json"));

        let mut list = AlarmList::default();
        let first = list.add(
            "a".to_string(),
            AlarmKind::Countdown { seconds: 1 },
            String::new(),
        );
        list.remove(first);
        storage.save(&list)?;

        let mut loaded = storage.load()?;
        let second = loaded.add(
            "b".to_string(),
            AlarmKind::Countdown { seconds: 2 },
            String::new(),
        );
        assert_ne!(first, second);
        Ok(())
    }
}
