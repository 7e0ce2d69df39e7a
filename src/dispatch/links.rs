//! URL and deep-link builders for searches, videos, maps and alarms.

use urlencoding::encode;

use super::collaborators::Linker;
use super::errors::DispatchError;
use crate::config::Platform;

/// Google web search.
pub fn google_search_url(query: &str) -> String {
    format!("https://www.google.com/search?q={}", encode(query))
}

/// YouTube search links, most direct first. The last entry is the browser
/// URL, which always opens.
pub fn youtube_candidates(query: &str) -> [String; 4] {
    let q = encode(query);
    [
        format!("youtube://www.youtube.com/results?search_query={q}&autoplay=1"),
        format!("vnd.youtube:///results?search_query={q}&autoplay=1"),
        format!("youtube://youtube.com/v?search={q}"),
        youtube_browser_url(query),
    ]
}

pub fn youtube_browser_url(query: &str) -> String {
    format!(
        "https://www.youtube.com/results?search_query={}&autoplay=1",
        encode(query)
    )
}

/// Walking directions in the native maps app, if the platform has one.
pub fn native_maps_url(platform: Platform, start: &str, end: &str) -> Option<String> {
    match platform {
        Platform::Ios => Some(format!(
            "comgooglemaps://?saddr={}&daddr={}&directionsmode=walking",
            encode(start),
            encode(end)
        )),
        Platform::Android => Some(format!(
            "google.navigation:q={}&saddr={}&mode=w",
            encode(end),
            encode(start)
        )),
        Platform::Desktop => None,
    }
}

/// Walking directions on the Google Maps website.
pub fn web_maps_url(start: &str, end: &str) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}&travelmode=walking",
        encode(start),
        encode(end)
    )
}

/// Clock-app links that set an alarm on Android, most specific first.
pub fn android_alarm_uris(hour: u32, minute: u32) -> [String; 3] {
    [
        format!(
            "android-app://com.android.deskclock/set_alarm?hour={hour}&minutes={minute}&message={}&vibrate=true&skipUi=true",
            encode("Báo thức")
        ),
        format!(
            "intent:#Intent;action=android.intent.action.SET_ALARM;\
             component=com.android.deskclock/.AlarmClock;\
             i.android.intent.extra.alarm.HOUR={hour};\
             i.android.intent.extra.alarm.MINUTES={minute};\
             b.android.intent.extra.alarm.SKIP_UI=false;end"
        ),
        "content://com.android.deskclock".to_string(),
    ]
}

/// Open the first candidate some handler accepts. Returns the opened URL,
/// or `None` when no candidate is accepted.
pub async fn open_first_available(
    linker: &dyn Linker,
    candidates: &[String],
) -> Result<Option<String>, DispatchError> {
    for url in candidates {
        if linker.can_open(url).await {
            linker.open(url).await?;
            return Ok(Some(url.clone()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct PrefixLinker {
        accepts: Vec<&'static str>,
        opened: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Linker for PrefixLinker {
        async fn can_open(&self, url: &str) -> bool {
            self.accepts.iter().any(|p| url.starts_with(p))
        }

        async fn open(&self, url: &str) -> Result<(), DispatchError> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_google_search_url_encodes_query() {
        assert_eq!(
            google_search_url("thời tiết Hà Nội"),
            "https://www.google.com/search?q=th%E1%BB%9Di%20ti%E1%BA%BFt%20H%C3%A0%20N%E1%BB%99i"
        );
    }

    #[test]
    fn test_youtube_candidates_order() {
        let urls = youtube_candidates("lofi");
        assert!(urls[0].starts_with("youtube://www.youtube.com/results"));
        assert!(urls[1].starts_with("vnd.youtube:"));
        assert!(urls[2].starts_with("youtube://youtube.com/v?search=lofi"));
        assert_eq!(urls[3], youtube_browser_url("lofi"));
    }

    #[test]
    fn test_maps_urls() {
        let ios = native_maps_url(Platform::Ios, "A B", "C").unwrap();
        assert_eq!(
            ios,
            "comgooglemaps://?saddr=A%20B&daddr=C&directionsmode=walking"
        );
        let android = native_maps_url(Platform::Android, "A", "C").unwrap();
        assert_eq!(android, "google.navigation:q=C&saddr=A&mode=w");
        assert!(native_maps_url(Platform::Desktop, "A", "C").is_none());
        assert!(web_maps_url("A", "C").ends_with("origin=A&destination=C&travelmode=walking"));
    }

    #[test]
    fn test_android_alarm_uris() {
        let uris = android_alarm_uris(7, 5);
        assert!(uris[0].contains("hour=7&minutes=5"));
        assert!(uris[1].contains("HOUR=7;i.android.intent.extra.alarm.MINUTES=5;"));
        assert_eq!(uris[2], "content://com.android.deskclock");
    }

    #[tokio::test]
    async fn test_open_first_available_skips_unhandled() {
        let linker = PrefixLinker {
            accepts: vec!["vnd.youtube:"],
            opened: Mutex::new(Vec::new()),
        };
        let candidates = youtube_candidates("mèo");
        let opened = open_first_available(&linker, &candidates).await.unwrap();
        assert_eq!(opened.as_deref(), Some(candidates[1].as_str()));
        assert_eq!(linker.opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_first_available_none() {
        let linker = PrefixLinker {
            accepts: vec![],
            opened: Mutex::new(Vec::new()),
        };
        let opened = open_first_available(&linker, &android_alarm_uris(6, 0))
            .await
            .unwrap();
        assert!(opened.is_none());
    }
}
