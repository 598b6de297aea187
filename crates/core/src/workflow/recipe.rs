//! The fixed conversions offered by the workflows.

use crate::engine::ExecRequest;

use super::types::InputSlot;

/// Where a slot's bytes go in the engine's scratch filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeInput {
    pub slot: InputSlot,
    pub scratch_name: &'static str,
}

/// A fixed conversion: inputs, engine arguments and the produced output.
#[derive(Debug, PartialEq, Eq)]
pub struct Recipe {
    /// Stable identifier, used in routes.
    pub id: &'static str,
    pub title: &'static str,
    pub inputs: &'static [RecipeInput],
    /// Engine argument list, referring to inputs and output by scratch name.
    pub args: &'static [&'static str],
    pub output_name: &'static str,
    pub output_mime: &'static str,
    /// Input whose duration bounds the output's.
    pub timing_slot: InputSlot,
    /// Input that must carry an audio stream.
    pub requires_audio: Option<InputSlot>,
}

/// Loops a still image over an audio track into an H.264/AAC MP4.
pub const IMAGE_TO_VIDEO: Recipe = Recipe {
    id: "image-to-video",
    title: "Image to Video",
    inputs: &[
        RecipeInput {
            slot: InputSlot::Image,
            scratch_name: "input.jpg",
        },
        RecipeInput {
            slot: InputSlot::Audio,
            scratch_name: "input.mp3",
        },
    ],
    args: &[
        "-loop",
        "1",
        "-i",
        "input.jpg",
        "-i",
        "input.mp3",
        "-c:v",
        "libx264",
        "-tune",
        "stillimage",
        "-c:a",
        "aac",
        "-b:a",
        "192k",
        "-pix_fmt",
        "yuv420p",
        "-shortest",
        "output.mp4",
    ],
    output_name: "output.mp4",
    output_mime: "video/mp4",
    timing_slot: InputSlot::Audio,
    requires_audio: Some(InputSlot::Audio),
};

/// Drops the video stream and encodes the audio as 192k/44.1kHz MP3.
pub const VIDEO_TO_AUDIO: Recipe = Recipe {
    id: "video-to-audio",
    title: "Video to Audio",
    inputs: &[RecipeInput {
        slot: InputSlot::Video,
        scratch_name: "input.mp4",
    }],
    args: &[
        "-i",
        "input.mp4",
        "-vn",
        "-acodec",
        "libmp3lame",
        "-ab",
        "192k",
        "-ar",
        "44100",
        "output.mp3",
    ],
    output_name: "output.mp3",
    output_mime: "audio/mpeg",
    timing_slot: InputSlot::Video,
    requires_audio: Some(InputSlot::Video),
};

/// Every recipe, in landing page order.
pub const RECIPES: [&Recipe; 2] = [&IMAGE_TO_VIDEO, &VIDEO_TO_AUDIO];

impl Recipe {
    /// Looks a recipe up by id.
    pub fn by_id(id: &str) -> Option<&'static Recipe> {
        RECIPES.into_iter().find(|r| r.id == id)
    }

    pub fn input(&self, slot: InputSlot) -> Option<&RecipeInput> {
        self.inputs.iter().find(|i| i.slot == slot)
    }

    pub fn accepts(&self, slot: InputSlot) -> bool {
        self.input(slot).is_some()
    }

    /// The engine invocation for this recipe.
    pub fn exec_request(&self, expected_duration_secs: Option<f64>) -> ExecRequest {
        ExecRequest::new(self.args.iter().copied())
            .with_expected_duration(expected_duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_to_video_args() {
        let request = IMAGE_TO_VIDEO.exec_request(Some(5.0));
        assert_eq!(
            request.args.join(" "),
            "-loop 1 -i input.jpg -i input.mp3 -c:v libx264 -tune stillimage -c:a aac \
             -b:a 192k -pix_fmt yuv420p -shortest output.mp4"
        );
        assert_eq!(request.expected_duration_secs, Some(5.0));
    }

    #[test]
    fn test_video_to_audio_args() {
        let request = VIDEO_TO_AUDIO.exec_request(None);
        assert_eq!(
            request.args.join(" "),
            "-i input.mp4 -vn -acodec libmp3lame -ab 192k -ar 44100 output.mp3"
        );
    }

    #[test]
    fn test_args_reference_scratch_names() {
        for recipe in RECIPES {
            for input in recipe.inputs {
                assert!(recipe.args.contains(&input.scratch_name), "{}", recipe.id);
            }
            assert_eq!(recipe.args.last(), Some(&recipe.output_name));
            assert!(recipe.accepts(recipe.timing_slot));
            // Timing input must carry sound
            assert_eq!(recipe.requires_audio, Some(recipe.timing_slot), "{}", recipe.id);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Recipe::by_id("video-to-audio"), Some(&VIDEO_TO_AUDIO));
        assert!(Recipe::by_id("audio-to-video").is_none());
        assert!(IMAGE_TO_VIDEO.accepts(InputSlot::Image));
        assert!(!IMAGE_TO_VIDEO.accepts(InputSlot::Video));
    }
}
