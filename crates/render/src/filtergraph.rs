//! The encoder invocation: input enumeration and filter-graph assembly.
//!
//! Input order is stable and determines every filter label: 0 background,
//! 1 whiteboard concat, 2 cursor sprite, 3 webcams, then desk-share when
//! present, then chat background and chat sprite when chat is present.

use std::path::{Path, PathBuf};

use meetcast_common::config::{EncoderSettings, Layout};

/// Composite background fill.
const BACKGROUND_COLOR: &str = "#06172A";

/// Chat panel backdrop, masked to alpha 153 in the graph.
const CHAT_BACKGROUND_COLOR: &str = "#FFFFFF";

/// Everything the assembler needs to know about one run's inputs.
#[derive(Debug)]
pub struct EncoderJob {
    pub whiteboard_playlist: PathBuf,
    pub cursor_sprite: PathBuf,
    pub cursor_commands: PathBuf,
    pub webcams: PathBuf,
    pub deskshare: Option<PathBuf>,
    pub chat: Option<ChatJob>,
    pub duration_secs: f64,
    pub meeting_name: String,
    pub threads: usize,
    pub output: PathBuf,
}

/// Chat inputs, present only when at least one message was laid out.
#[derive(Debug)]
pub struct ChatJob {
    pub sprite: PathBuf,
    pub commands: PathBuf,
}

/// Build the complete ffmpeg argument vector for the main encode.
pub fn assemble(job: &EncoderJob, layout: &Layout, encoder: &EncoderSettings) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
    ];

    // 0: seamless background loop.
    let background = format!(
        "color=c={BACKGROUND_COLOR}:s={}x{}",
        layout.output_width, layout.output_height
    );
    push_args(&mut args, ["-f", "lavfi", "-i", background.as_str()]);
    // 1: whiteboard frames.
    push_args(&mut args, ["-f", "concat", "-safe", "0", "-i"]);
    args.push(path_arg(&job.whiteboard_playlist));
    // 2: cursor sprite.
    push_args(&mut args, ["-loop", "1", "-i"]);
    args.push(path_arg(&job.cursor_sprite));
    // 3: webcams.
    args.push("-i".into());
    args.push(path_arg(&job.webcams));

    let mut next_input = 4usize;
    let deskshare_idx = job.deskshare.as_ref().map(|path| {
        args.push("-i".into());
        args.push(path_arg(path));
        let idx = next_input;
        next_input += 1;
        idx
    });
    let chat_indices = job.chat.as_ref().map(|chat| {
        let backdrop = format!(
            "color=c={CHAT_BACKGROUND_COLOR}:s={}x{}",
            layout.chat_width, layout.chat_height
        );
        push_args(&mut args, ["-f", "lavfi", "-i", backdrop.as_str()]);
        let bg = next_input;
        push_args(&mut args, ["-loop", "1", "-i"]);
        args.push(path_arg(&chat.sprite));
        (bg, bg + 1)
    });

    args.push("-filter_complex".into());
    args.push(filter_graph(job, layout, deskshare_idx, chat_indices));

    push_args(&mut args, ["-map", "[video]", "-map", "3:a"]);
    push_args(&mut args, ["-c:a", "aac"]);
    push_args(&mut args, ["-c:v", "libx264", "-pix_fmt", "yuv420p"]);
    args.push("-crf".into());
    args.push(encoder.constant_rate_factor.to_string());
    args.push("-threads".into());
    args.push(job.threads.to_string());
    args.push("-shortest".into());
    args.push("-t".into());
    args.push(format!("{:.3}", job.duration_secs));
    args.push("-metadata".into());
    args.push(format!("title={}", job.meeting_name));
    args.push(path_arg(&job.output));
    args
}

fn filter_graph(
    job: &EncoderJob,
    layout: &Layout,
    deskshare_idx: Option<usize>,
    chat_indices: Option<(usize, usize)>,
) -> String {
    let radius = layout.border_radius;
    let mut chains: Vec<String> = Vec::new();

    // Bind the overlay-command stream to the cursor layer.
    chains.push(format!(
        "[2]sendcmd=f={}[cursor]",
        path_arg(&job.cursor_commands)
    ));

    chains.push(format!(
        "[3]scale={}:{}[webcams_scaled]",
        layout.webcams_width, layout.webcams_height
    ));
    chains.push(format!(
        "[webcams_scaled]format=yuva444p,{}[webcams]",
        rounded_mask(radius, 255)
    ));

    if let Some(idx) = deskshare_idx {
        chains.push(format!(
            "[{idx}]scale=w={}:h={}:force_original_aspect_ratio=1[deskshare]",
            layout.slides_width, layout.slides_height
        ));
        chains.push("[deskshare][1]overlay[slides]".to_string());
    } else {
        chains.push("[1]null[slides]".to_string());
    }

    chains.push("[slides][cursor]overlay@m[annotated]".to_string());
    chains.push(format!(
        "[annotated]format=yuva444p,{}[rounded]",
        rounded_mask(radius, 255)
    ));
    chains.push(format!(
        "[0][rounded]overlay=x={}:y={}[canvas]",
        layout.slides_x, layout.slides_y
    ));

    let mut main = "canvas";
    if let (Some((bg_idx, sprite_idx)), Some(chat)) = (chat_indices, job.chat.as_ref()) {
        chains.push(format!(
            "[{sprite_idx}]sendcmd=f={},crop@c=w={}:h={}:x=0:y=0[chat]",
            path_arg(&chat.commands),
            layout.chat_width,
            layout.chat_height
        ));
        chains.push(format!(
            "[{bg_idx}]format=yuva444p,{}[chat_bg]",
            rounded_mask(radius, 153)
        ));
        chains.push("[chat_bg][chat]overlay[chat_panel]".to_string());
        chains.push(format!(
            "[canvas][chat_panel]overlay=x={}:y={}[composite]",
            layout.chat_outer_x, layout.chat_outer_y
        ));
        main = "composite";
    }

    chains.push(format!(
        "[{main}][webcams]overlay=x={}:y={}[video]",
        layout.webcams_x, layout.webcams_y
    ));

    chains.join(";")
}

/// Per-pixel alpha: opaque everywhere except the four corner squares, where
/// a pixel keeps alpha only within `radius` of the inner corner anchor.
fn rounded_mask(radius: u32, alpha: u8) -> String {
    format!(
        "geq=lum='lum(X,Y)':cb='cb(X,Y)':cr='cr(X,Y)':\
         a='if(gt(abs(W/2-X),W/2-{r})*gt(abs(H/2-Y),H/2-{r}),\
         if(lte(hypot({r}-(W/2-abs(W/2-X)),{r}-(H/2-abs(H/2-Y))),{r}),{a},0),{a})'",
        r = radius,
        a = alpha,
    )
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn push_args<'a>(args: &mut Vec<String>, items: impl IntoIterator<Item = &'a str>) {
    args.extend(items.into_iter().map(str::to_string));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(deskshare: bool, chat: bool) -> EncoderJob {
        EncoderJob {
            whiteboard_playlist: "/pub/timestamps/whiteboard_timestamps".into(),
            cursor_sprite: "/pub/cursor/cursor.svg".into(),
            cursor_commands: "/pub/timestamps/cursor_timestamps".into(),
            webcams: "/pub/video/webcams.mp4".into(),
            deskshare: deskshare.then(|| "/pub/deskshare/deskshare.mp4".into()),
            chat: chat.then(|| ChatJob {
                sprite: "/pub/chats/chat.svg".into(),
                commands: "/pub/timestamps/chat_timestamps".into(),
            }),
            duration_secs: 600.0,
            meeting_name: "Weekly sync".into(),
            threads: 8,
            output: "/pub/render.mp4".into(),
        }
    }

    fn args_of(deskshare: bool, chat: bool) -> Vec<String> {
        assemble(
            &job(deskshare, chat),
            &Layout::default(),
            &EncoderSettings::default(),
        )
    }

    fn graph_of(args: &[String]) -> String {
        let idx = args.iter().position(|a| a == "-filter_complex").unwrap();
        args[idx + 1].clone()
    }

    #[test]
    fn minimal_graph_has_no_chat_or_deskshare_branches() {
        let args = args_of(false, false);
        let graph = graph_of(&args);

        assert!(graph.contains("[1]null[slides]"));
        assert!(!graph.contains("crop@c"));
        assert!(!graph.contains("deskshare"));
        assert!(graph.contains("[canvas][webcams]overlay=x=0:y=0[video]"));
        // No chat inputs enumerated either.
        assert!(!args.iter().any(|a| a.contains("chat.svg")));
    }

    #[test]
    fn deskshare_takes_the_slide_box_and_whiteboard_overlays_it() {
        let graph = graph_of(&args_of(true, false));
        assert!(graph
            .contains("[4]scale=w=1600:h=1080:force_original_aspect_ratio=1[deskshare]"));
        assert!(graph.contains("[deskshare][1]overlay[slides]"));
        assert!(!graph.contains("[1]null"));
    }

    #[test]
    fn chat_branch_crops_masks_and_composites() {
        let args = args_of(false, true);
        let graph = graph_of(&args);

        // Without deskshare, chat bg is input 4 and the sprite input 5.
        assert!(graph.contains("[5]sendcmd=f=/pub/timestamps/chat_timestamps,crop@c=w=320:h=820:x=0:y=0[chat]"));
        assert!(graph.contains("153"));
        assert!(graph.contains("[canvas][chat_panel]overlay=x=0:y=250[composite]"));
        assert!(graph.contains("[composite][webcams]overlay=x=0:y=0[video]"));
    }

    #[test]
    fn deskshare_shifts_chat_input_indices() {
        let graph = graph_of(&args_of(true, true));
        assert!(graph.contains("[6]sendcmd="));
        assert!(graph.contains("[5]format=yuva444p"));
    }

    #[test]
    fn output_settings_follow_the_encoder_config() {
        let args = args_of(false, false);
        let joined = args.join(" ");

        assert!(joined.contains("-map [video] -map 3:a"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-crf 23"));
        assert!(joined.contains("-threads 8"));
        assert!(joined.contains("-shortest -t 600.000"));
        assert!(joined.contains("-metadata title=Weekly sync"));
        assert!(args.last().unwrap().ends_with("render.mp4"));
    }

    #[test]
    fn assembly_is_deterministic() {
        assert_eq!(args_of(true, true), args_of(true, true));
    }
}
