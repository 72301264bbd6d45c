use std::path::{Path, PathBuf};
use crate::core::{FileSelector, MediaRole};

/// Native open dialogs through rfd.
#[derive(Debug, Default)]
pub struct RfdFileSelector;

impl RfdFileSelector {
    pub fn dialog_title(role: MediaRole) -> &'static str {
        match role {
            MediaRole::Video => "Choose Video File",
            MediaRole::Audio => "Choose Audio File",
        }
    }
}

impl FileSelector for RfdFileSelector {
    fn pick(&mut self, role: MediaRole, start_dir: Option<&Path>) -> Option<PathBuf> {
        let start = start_dir
            .filter(|dir| dir.is_dir())
            .map(Path::to_path_buf)
            .or_else(dirs::home_dir);

        let mut dialog = rfd::FileDialog::new().set_title(Self::dialog_title(role));
        if let Some(dir) = start {
            dialog = dialog.set_directory(dir);
        }

        let picked = dialog.pick_file();
        match &picked {
            Some(path) => log::info!("Selected {} file: {}", role, path.display()),
            None => log::info!("{} file selection cancelled", role),
        }
        picked
    }
}
