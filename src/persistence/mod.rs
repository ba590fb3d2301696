use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    de::DeserializeOwned,
    Serialize,
};
use uuid::Uuid;

use crate::core::ShengciError;

pub mod session_log;

const APP_NAME: &str = "shengci";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_data_file_path(filename: &str) -> PathBuf {
    get_app_data_dir().join(filename)
}

pub fn save_json<T: Serialize>(data: &T, filename: &str) -> Result<(), ShengciError> {
    let file_path = get_data_file_path(filename);
    let json = serde_json::to_string_pretty(data)?;
    write_atomic(&file_path, json.as_bytes())
}

pub fn load_json<T: DeserializeOwned + Default>(filename: &str) -> Result<T, ShengciError> {
    let file_path = get_data_file_path(filename);

    if !file_path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(&file_path)?;
    let data: T = serde_json::from_str(&json)?;
    Ok(data)
}

pub fn load_json_or_default<T: DeserializeOwned + Default>(filename: &str) -> T {
    match load_json::<T>(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Failed to load {}: {}. Using defaults.", filename, e);
            T::default()
        }
    }
}

/// Write to a uniquely named temporary sibling, then rename into place.
/// A concurrent reader (e.g. a sync client) never observes a partial file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ShengciError> {
    let parent = path
        .parent()
        .ok_or_else(|| ShengciError::Custom(format!("No parent directory for {}", path.display())))?;
    fs::create_dir_all(parent)?;

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("file");
    let tmp = parent.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    fs::write(&tmp, bytes)?;

    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) if path.exists() => {
            // Windows cannot rename over an existing file
            fs::remove_file(path)?;
            fs::rename(&tmp, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e.into())
        }
    }
}

pub fn append_atomic(path: &Path, text: &str) -> Result<(), ShengciError> {
    let existing = if path.exists() { fs::read_to_string(path)? } else { String::new() };
    write_atomic(path, format!("{}{}", existing, text).as_bytes())
}
