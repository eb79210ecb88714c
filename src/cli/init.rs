use std::path::PathBuf;

use crate::db::DB_FILE;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::Store;

pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    Store::open(&resolved.join(DB_FILE))?.close()?;

    println!("Initialized billmatch at {}", resolved.display());
    Ok(())
}
