//! Camera-endpoint classification heuristics
//!
//! Pure decision over a probe response; deterministic, no I/O, no state.

use crate::probe::ProbeResponse;

/// Lines of body text the classifier inspects
const BODY_LINE_LIMIT: usize = 20;

/// Content-type prefixes that immediately classify an endpoint as a stream
const STREAM_CONTENT_PREFIXES: &[&str] = &["image/", "video/", "multipart/"];

/// Body keywords marking a camera UI or stream page. Includes the CJK terms
/// that Chinese-market firmware uses for camera, surveillance, video, and
/// live view.
const CAMERA_KEYWORDS: &[&str] = &[
    "camera",
    "video",
    "stream",
    "mjpeg",
    "rtsp",
    "surveillance",
    "摄像",
    "监控",
    "视频",
    "直播",
];

/// Decide whether a probed endpoint looks like a camera stream or UI.
///
/// Positive when the status is 200 or 401 and either the content-type is
/// stream-like or the first 20 case-folded body lines contain a camera
/// keyword. A 401 is positive on content-type evidence alone: a protected
/// endpoint serving an image/multipart error page is overwhelmingly a
/// camera.
pub fn is_camera_response(response: &ProbeResponse) -> bool {
    if response.status != 200 && response.status != 401 {
        return false;
    }

    if let Some(ref content_type) = response.content_type {
        let content_type = content_type.to_lowercase();
        if STREAM_CONTENT_PREFIXES.iter().any(|p| content_type.starts_with(p))
            || content_type.contains("mjpeg")
        {
            return true;
        }
    }

    let body = response.folded_body_lines(BODY_LINE_LIMIT);
    CAMERA_KEYWORDS.iter().any(|k| body.contains(k))
}
