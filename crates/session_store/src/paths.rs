use std::path::{Path, PathBuf};

pub const STORE_DIR: &str = ".assistant";
pub const STORE_FILE: &str = "store.json";

/// Default location of the persisted thread record for a working directory.
#[must_use]
pub fn store_path(cwd: &Path) -> PathBuf {
    cwd.join(STORE_DIR).join(STORE_FILE)
}

#[must_use]
pub(crate) fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| STORE_FILE.to_string());
    path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{store_path, temp_sibling};

    #[test]
    fn store_path_nests_under_hidden_dir() {
        assert_eq!(
            store_path(Path::new("/work")),
            Path::new("/work/.assistant/store.json")
        );
    }

    #[test]
    fn temp_sibling_stays_in_the_same_directory() {
        let temp = temp_sibling(Path::new("/work/.assistant/store.json"));
        assert_eq!(temp.parent(), Some(Path::new("/work/.assistant")));
        let name = temp.file_name().expect("name").to_string_lossy().into_owned();
        assert!(name.starts_with(".store.json."));
        assert!(name.ends_with(".tmp"));
    }
}
