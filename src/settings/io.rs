// src/settings/io.rs
use directories_next::ProjectDirs;
use std::fs;
use std::io::{self, BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "GridStudio";
const APPLICATION: &str = "gridstudio";
const CONFIG_FILE: &str = "grid_settings.json";

fn get_config_path() -> io::Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION) {
        let config_dir = proj_dirs.config_dir();
        fs::create_dir_all(config_dir)?;
        Ok(config_dir.join(CONFIG_FILE))
    } else {
        Err(io::Error::new(
            ErrorKind::NotFound,
            "Could not determine project directories for grid settings.",
        ))
    }
}

/// Loads settings from the platform config directory. A missing file yields defaults.
pub fn load_settings_from_file<T: for<'de> serde::de::Deserialize<'de> + Default>() -> io::Result<T> {
    let config_file = get_config_path()?;
    load_settings_from_path(&config_file)
}

pub fn load_settings_from_path<T: for<'de> serde::de::Deserialize<'de> + Default>(
    config_file: &Path,
) -> io::Result<T> {
    info!("GridSettings: Attempting to load settings from {:?}", config_file);
    match fs::File::open(config_file) {
        Ok(file) => {
            let reader = BufReader::new(file);
            match serde_json::from_reader(reader) {
                Ok(settings) => {
                    info!("GridSettings: Successfully deserialized settings.");
                    Ok(settings)
                }
                Err(e) => {
                    error!("GridSettings: Failed to parse settings file {:?}: {}", config_file, e);
                    Err(io::Error::new(
                        ErrorKind::InvalidData,
                        format!("Failed to parse settings file: {}", e),
                    ))
                }
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("GridSettings: Settings file not found at {:?}. Returning default.", config_file);
            Ok(Default::default())
        }
        Err(e) => {
            error!("GridSettings: Failed to open settings file {:?}: {}", config_file, e);
            Err(e)
        }
    }
}

pub fn save_settings_to_file<T: serde::Serialize>(settings: &T) -> io::Result<()> {
    let config_file = get_config_path()?;
    save_settings_to_path(settings, &config_file)
}

pub fn save_settings_to_path<T: serde::Serialize>(settings: &T, config_file: &Path) -> io::Result<()> {
    info!("GridSettings: Saving settings to {:?}", config_file);
    let file = fs::File::create(config_file)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, settings).map_err(|e| {
        error!("GridSettings: Failed to serialize settings to {:?}: {}", config_file, e);
        io::Error::new(ErrorKind::Other, e)
    })?;
    debug!("GridSettings: settings written");
    Ok(())
}
