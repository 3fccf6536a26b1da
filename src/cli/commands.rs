//! Non-TUI subcommands.

use std::path::Path;

use super::ConfigAction;
use crate::camera::list_devices;
use crate::config::{default_path, CONFIG_TEMPLATE};

/// Print the available camera devices.
pub fn run_list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let devices = list_devices()?;
    if devices.is_empty() {
        println!("No cameras found");
        return Ok(());
    }
    println!("Available cameras:");
    for device in devices {
        println!("  {}", device);
    }
    Ok(())
}

/// Handle `spotter config show|init`.
pub fn run_config(
    action: &ConfigAction,
    path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_path);

    match action {
        ConfigAction::Show => {
            if path.exists() {
                print!("{}", std::fs::read_to_string(&path)?);
            } else {
                println!("No config file at {} (using defaults)", path.display());
            }
        }
        ConfigAction::Init => {
            if path.exists() {
                println!("Config file already exists at {}", path.display());
                return Ok(());
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, CONFIG_TEMPLATE)?;
            println!("Created {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_init_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        run_config(&ConfigAction::Init, Some(&path)).unwrap();
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[classifier]"));
    }

    #[test]
    fn test_config_init_does_not_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();
        run_config(&ConfigAction::Init, Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
    }

    #[test]
    fn test_config_show_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(run_config(&ConfigAction::Show, Some(&path)).is_ok());
    }
}
