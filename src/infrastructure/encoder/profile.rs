//! Fixed ffmpeg argument templates, one per output format.
//!
//! These flags determine bit-compatible output (profile/level, keyframe
//! alignment, segment naming) and are kept verbatim.

use std::path::Path;

use crate::infrastructure::storage::StreamFormat;

pub const HLS_SEGMENT_SECONDS: u32 = 10;
pub const DASH_VIDEO_BITRATE: &str = "1500k";
pub const DASH_AUDIO_BITRATE: &str = "128k";
pub const DASH_KEYFRAME_INTERVAL: u32 = 60;
pub const DASH_INIT_SEGMENT_NAME: &str = "init-$RepresentationID$.m4s";
pub const DASH_MEDIA_SEGMENT_NAME: &str = "chunk-$RepresentationID$-$Number%05d$.m4s";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingProfile {
    pub format: StreamFormat,
}

impl EncodingProfile {
    pub fn for_format(format: StreamFormat) -> Self {
        Self { format }
    }

    /// Full argument list (excluding the program) for transcoding `input`
    /// into `output_dir`.
    pub fn args(&self, input: &Path, output_dir: &Path) -> Vec<String> {
        let input = input.to_string_lossy().into_owned();
        let manifest = output_dir
            .join(self.format.manifest_name())
            .to_string_lossy()
            .into_owned();

        let mut args = vec!["-i".to_string(), input];
        match self.format {
            StreamFormat::Hls => {
                let hls_time = HLS_SEGMENT_SECONDS.to_string();
                args.extend(
                    [
                        "-profile:v", "baseline",
                        "-level", "3.0",
                        "-start_number", "0",
                        "-hls_time", hls_time.as_str(),
                        "-hls_list_size", "0",
                        "-f", "hls",
                    ]
                    .map(String::from),
                );
            }
            StreamFormat::Dash => {
                let keyint = DASH_KEYFRAME_INTERVAL.to_string();
                let x264_params = format!(
                    "keyint={k}:min-keyint={k}:no-scenecut=1",
                    k = DASH_KEYFRAME_INTERVAL
                );
                args.extend(
                    [
                        "-map", "0:v",
                        "-map", "0:a",
                        "-c:v", "libx264",
                        "-x264-params", x264_params.as_str(),
                        "-b:v:0", DASH_VIDEO_BITRATE,
                        "-c:a", "aac",
                        "-b:a", DASH_AUDIO_BITRATE,
                        "-bf", "1",
                        "-keyint_min", keyint.as_str(),
                        "-g", keyint.as_str(),
                        "-sc_threshold", "0",
                        "-f", "dash",
                        "-use_template", "1",
                        "-use_timeline", "1",
                        "-init_seg_name", DASH_INIT_SEGMENT_NAME,
                        "-media_seg_name", DASH_MEDIA_SEGMENT_NAME,
                        "-adaptation_sets", "id=0,streams=v id=1,streams=a",
                    ]
                    .map(String::from),
                );
            }
        }
        args.push(manifest);
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hls_template() {
        let args = EncodingProfile::for_format(StreamFormat::Hls)
            .args(Path::new("uploads/j/in.mp4"), Path::new("streams/j/hls"));
        assert_eq!(
            args,
            [
                "-i", "uploads/j/in.mp4",
                "-profile:v", "baseline",
                "-level", "3.0",
                "-start_number", "0",
                "-hls_time", "10",
                "-hls_list_size", "0",
                "-f", "hls",
                "streams/j/hls/playlist.m3u8",
            ]
        );
    }

    #[test]
    fn dash_template() {
        let args = EncodingProfile::for_format(StreamFormat::Dash)
            .args(Path::new("in.mkv"), Path::new("out/dash"));
        let joined = args.join(" ");
        assert!(joined.starts_with("-i in.mkv -map 0:v -map 0:a -c:v libx264"));
        assert!(joined.contains("-x264-params keyint=60:min-keyint=60:no-scenecut=1"));
        assert!(joined.contains("-b:v:0 1500k -c:a aac -b:a 128k -bf 1 -keyint_min 60 -g 60 -sc_threshold 0"));
        assert!(joined.contains("-init_seg_name init-$RepresentationID$.m4s"));
        assert!(joined.contains("-media_seg_name chunk-$RepresentationID$-$Number%05d$.m4s"));
        // The adaptation set list is one argument containing a space.
        assert!(args.iter().any(|a| a == "id=0,streams=v id=1,streams=a"));
        assert_eq!(args.last().map(String::as_str), Some("out/dash/manifest.mpd"));
    }
}
