//! Desktop launch shortcut creation for the first-run prompt.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Write a freedesktop `.desktop` entry pointing at the launch script.
/// Returns the path of the created file.
pub fn create_shortcut(launch_script: Option<&Path>) -> Result<PathBuf> {
    let Some(script) = launch_script else {
        bail!("No launch script configured; pass --launch-script");
    };
    if !script.exists() {
        bail!("Launch script not found: {}", script.display());
    }

    let apps_dir = dirs::data_dir()
        .context("Could not find data directory")?
        .join("applications");
    fs::create_dir_all(&apps_dir).context("Failed to create applications directory")?;

    let path = apps_dir.join("repodeck.desktop");
    let contents = desktop_entry(script);
    fs::write(&path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn desktop_entry(script: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=repodeck\n\
         Comment=Browse and launch repositories\n\
         Exec={}\n\
         Terminal=true\n\
         Categories=Development;\n",
        script.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_script_path_is_an_error() {
        assert!(create_shortcut(None).is_err());
        assert!(create_shortcut(Some(Path::new("/no/such/script"))).is_err());
    }

    #[test]
    fn desktop_entry_references_the_script() {
        let entry = desktop_entry(Path::new("/opt/bin/repodeck.sh"));
        assert!(entry.contains("Exec=/opt/bin/repodeck.sh"));
        assert!(entry.contains("Terminal=true"));
    }
}
