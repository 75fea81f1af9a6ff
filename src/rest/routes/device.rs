// rest/routes/device.rs — user-agent classification for the gallery front-end.
//
// The front-end tunes its AR entry flow per platform (WebXR on Android
// Chrome, Quick Look hints on iOS), so the server answers a coarse
// mobile/iOS/Android split from the User-Agent header.

use axum::http::{header, HeaderMap};
use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static MOBILE_UA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("regex: mobile ua")
});

static IOS_UA: Lazy<Regex> = Lazy::new(|| Regex::new(r"iPad|iPhone|iPod").expect("regex: ios ua"));

pub async fn device_info(headers: HeaderMap) -> Json<Value> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    Json(json!({
        "isMobile": MOBILE_UA.is_match(user_agent),
        "isIOS": IOS_UA.is_match(user_agent),
        "isAndroid": user_agent.contains("Android"),
        "userAgent": user_agent,
    }))
}
