use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StackError;

/// Display-preference file, relative to the acquisition folder.
pub const SETTINGS_FILE: &str = "layer_settings.json";

/// Per-channel display preferences, exchanged with the display bridge at
/// session start and end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSettings {
    pub colormap: String,
    pub contrast_limits: (f64, f64),
}

/// Channel-id to preference mapping as stored on disk.
pub type ChannelSettings = BTreeMap<String, LayerSettings>;

/// Read the display preferences stored next to an acquisition.
///
/// An absent file is a normal first-visit state and returns `Ok(None)`.
pub fn import_layer_settings(
    folder: impl AsRef<Path>,
) -> Result<Option<ChannelSettings>, StackError> {
    let path = folder.as_ref().join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)?;
    let settings = serde_json::from_str(&contents).map_err(StackError::SettingsMalformed)?;
    Ok(Some(settings))
}

/// Write the display preferences as a full overwrite.
///
/// The file is written to a sibling temp path and renamed into place so a
/// reader never sees a half-written file.
pub fn export_layer_settings(
    folder: impl AsRef<Path>,
    settings: &ChannelSettings,
) -> Result<(), StackError> {
    let path = folder.as_ref().join(SETTINGS_FILE);
    let tmp_path = folder.as_ref().join(format!("{SETTINGS_FILE}.tmp"));
    let json = serde_json::to_string_pretty(settings).map_err(StackError::SettingsMalformed)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, &path)?;
    Ok(())
}
