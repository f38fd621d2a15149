//! The per-meeting scratch tree.
//!
//! Scratch files live in subdirectories of the published recording root and
//! are deleted only on the success path; a failed run leaves them behind
//! for diagnosis.

use std::path::{Path, PathBuf};

use meetcast_common::MeetcastResult;

/// Handle over the scratch paths of one render run.
#[derive(Debug, Clone)]
pub struct Scratch {
    root: PathBuf,
}

impl Scratch {
    /// Create the scratch directories under the published root.
    pub fn create(published_dir: &Path) -> MeetcastResult<Self> {
        let scratch = Self {
            root: published_dir.to_path_buf(),
        };
        for dir in [
            scratch.frames_dir(),
            scratch.cursor_dir(),
            scratch.chats_dir(),
            scratch.timestamps_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(scratch)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.root.join("frames")
    }

    pub fn frame_path(&self, index: usize, svgz: bool) -> PathBuf {
        let ext = if svgz { "svgz" } else { "svg" };
        self.frames_dir().join(format!("frame{index}.{ext}"))
    }

    /// Playlist entry for a frame, relative to the timestamps directory.
    pub fn frame_ref(&self, index: usize, svgz: bool) -> String {
        let ext = if svgz { "svgz" } else { "svg" };
        format!("../frames/frame{index}.{ext}")
    }

    pub fn cursor_dir(&self) -> PathBuf {
        self.root.join("cursor")
    }

    pub fn cursor_svg(&self) -> PathBuf {
        self.cursor_dir().join("cursor.svg")
    }

    pub fn chats_dir(&self) -> PathBuf {
        self.root.join("chats")
    }

    pub fn chat_svg(&self) -> PathBuf {
        self.chats_dir().join("chat.svg")
    }

    pub fn timestamps_dir(&self) -> PathBuf {
        self.root.join("timestamps")
    }

    pub fn whiteboard_timestamps(&self) -> PathBuf {
        self.timestamps_dir().join("whiteboard_timestamps")
    }

    pub fn cursor_timestamps(&self) -> PathBuf {
        self.timestamps_dir().join("cursor_timestamps")
    }

    pub fn chat_timestamps(&self) -> PathBuf {
        self.timestamps_dir().join("chat_timestamps")
    }

    pub fn shapes_modified(&self) -> PathBuf {
        self.root.join("shapes_modified.svg")
    }

    pub fn meeting_metadata(&self) -> PathBuf {
        self.root.join("meeting_metadata")
    }

    /// Target of the main encode, before the chapter pass.
    pub fn render_mp4(&self) -> PathBuf {
        self.root.join("render.mp4")
    }

    /// Target of the chapter remux, renamed into place on success.
    pub fn muxed_mp4(&self) -> PathBuf {
        self.root.join("muxed.mp4")
    }

    /// Remove every scratch file and directory. Missing entries are fine;
    /// anything else under the published root is left alone.
    pub fn cleanup(&self) -> std::io::Result<()> {
        for dir in [
            self.frames_dir(),
            self.cursor_dir(),
            self.chats_dir(),
            self.timestamps_dir(),
        ] {
            ignore_missing(std::fs::remove_dir_all(dir))?;
        }
        for file in [
            self.shapes_modified(),
            self.meeting_metadata(),
            self.render_mp4(),
            self.muxed_mp4(),
        ] {
            ignore_missing(std::fs::remove_file(file))?;
        }
        Ok(())
    }
}

fn ignore_missing(result: std::io::Result<()>) -> std::io::Result<()> {
    match result {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
