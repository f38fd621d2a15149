//! The optional caption manifest.

use std::path::Path;

use meetcast_common::MeetcastResult;
use serde::{Deserialize, Serialize};

/// One caption track advertised by `captions.json`. The matching VTT lives
/// at `caption_<locale>.vtt` next to the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub locale: String,

    #[serde(rename = "localeName", default)]
    pub locale_name: String,
}

impl CaptionTrack {
    /// VTT filename for this track.
    pub fn vtt_name(&self) -> String {
        format!("caption_{}.vtt", self.locale)
    }
}

/// Load the manifest; an absent file means no captions, not an error.
pub fn load_captions(path: &Path) -> MeetcastResult<Vec<CaptionTrack>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.json");
        std::fs::write(
            &path,
            r#"[{"locale":"en-US","localeName":"English"},{"locale":"de-DE","localeName":"Deutsch"}]"#,
        )
        .unwrap();

        let tracks = load_captions(&path).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].vtt_name(), "caption_en-US.vtt");
        assert_eq!(tracks[1].locale_name, "Deutsch");
    }

    #[test]
    fn absent_manifest_means_no_captions() {
        let dir = tempfile::tempdir().unwrap();
        let tracks = load_captions(&dir.path().join("captions.json")).unwrap();
        assert!(tracks.is_empty());
    }
}
