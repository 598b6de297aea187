//! HTML pages, their assets and the redirect routes the landing cards use.

use axum::{
    http::header,
    response::{Html, IntoResponse, Redirect},
};
use mediaconv_core::workflow::{InputSlot, Recipe, IMAGE_TO_VIDEO, VIDEO_TO_AUDIO};

const APP_JS: &str = include_str!("../../assets/app.js");
const STYLE_CSS: &str = include_str!("../../assets/style.css");

/// Page path of a workflow.
pub fn page_path(recipe: &Recipe) -> &'static str {
    if recipe.id == VIDEO_TO_AUDIO.id {
        "/ffmpeg/video-to-audio"
    } else {
        "/ffmpeg"
    }
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Media Converter</title>
<link rel="stylesheet" href="/assets/style.css">
</head>
<body>
<main>
{body}
</main>
</body>
</html>
"#
    ))
}

/// GET /
pub async fn landing() -> Html<String> {
    layout(
        "Home",
        r#"<h1>Media Converter</h1>
<p class="subtitle">Choose a conversion service to get started</p>
<div class="cards">
  <a class="card" href="/redirects/videoTOaudio">
    <h2>Image to Video</h2>
    <p>Create videos from images with custom audio</p>
    <span>Get Started</span>
  </a>
  <a class="card" href="/redirects/audioTOvideo">
    <h2>Video to Audio</h2>
    <p>Extract audio from your videos</p>
    <span>Get Started</span>
  </a>
</div>"#,
    )
}

/// GET /ffmpeg
pub async fn image_to_video_page() -> Html<String> {
    workflow_page(
        &IMAGE_TO_VIDEO,
        "Upload an image and an audio file to create a video",
        "Create Video",
        r#"<video id="preview" controls></video>"#,
    )
}

/// GET /ffmpeg/video-to-audio
pub async fn video_to_audio_page() -> Html<String> {
    workflow_page(
        &VIDEO_TO_AUDIO,
        "Upload a video to extract its audio track",
        "Extract Audio",
        r#"<audio id="preview" controls></audio>"#,
    )
}

fn workflow_page(recipe: &Recipe, description: &str, action: &str, player: &str) -> Html<String> {
    let pickers: String = recipe
        .inputs
        .iter()
        .map(|input| {
            let slot = input.slot.as_str();
            format!(
                r#"<label for="{slot}" data-label="{slot}" data-title="{name}">Select {name}</label>
<input id="{slot}" type="file" accept="{accept}" data-slot="{slot}">
<p class="selection" data-selection="{slot}" hidden></p>
"#,
                name = slot_title(input.slot),
                accept = input.slot.accept(),
            )
        })
        .collect();

    let body = format!(
        r#"<div data-workflow="{id}" data-action="{action}">
<h1>{title}</h1>
<p class="subtitle">{description}</p>
{pickers}<button id="convert" disabled>{action}</button>
<progress id="progress" max="100" value="0" hidden></progress>
<div id="error" class="alert" role="alert" hidden></div>
<section id="result" hidden>
{player}
<a id="download" download="{output}">Download {output}</a>
</section>
</div>
<script src="/assets/app.js"></script>"#,
        id = recipe.id,
        title = recipe.title,
        output = recipe.output_name,
    );
    layout(recipe.title, &body)
}

fn slot_title(slot: InputSlot) -> &'static str {
    match slot {
        InputSlot::Image => "Image",
        InputSlot::Audio => "Audio",
        InputSlot::Video => "Video",
    }
}

/// GET /redirects/videoTOaudio
///
/// Wired to the "Image to Video" card.
pub async fn redirect_video_to_audio() -> Redirect {
    Redirect::to(page_path(&IMAGE_TO_VIDEO))
}

/// GET /redirects/audioTOvideo
///
/// Wired to the "Video to Audio" card.
pub async fn redirect_audio_to_video() -> Redirect {
    Redirect::to(page_path(&VIDEO_TO_AUDIO))
}

/// GET /assets/app.js
pub async fn app_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript")], APP_JS)
}

/// GET /assets/style.css
pub async fn style_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], STYLE_CSS)
}
