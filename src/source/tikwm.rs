// tikwm.com metadata client
//
// Community-maintained TikTok metadata API. Listing endpoints page at
// ~33 records per call with an opaque cursor; the fetch loop keeps
// requesting until the window is filled or the service reports the end.
// Refusals (non-zero API code, HTTP failure) surface as
// SourceUnavailable and are never retried here.

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::debug;

use super::traits::VideoSource;
use crate::errors::DownloadError;
use crate::models::{FetchWindow, ProfileInfo, Subject, VideoRecord};

const PAGE_SIZE: usize = 33;
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

pub struct TikwmSource {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PostsData {
    #[serde(default)]
    videos: Vec<ApiVideo>,
    #[serde(default)]
    cursor: serde_json::Value,
    #[serde(default, rename = "hasMore")]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ApiVideo {
    #[serde(default, alias = "id")]
    video_id: String,
    #[serde(default)]
    play_count: u64,
    #[serde(default)]
    create_time: i64,
    author: Option<ApiAuthor>,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    #[serde(default)]
    unique_id: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoData {
    stats: Option<ApiStats>,
}

#[derive(Debug, Deserialize)]
struct ApiStats {
    #[serde(default, alias = "videoCount")]
    video_count: u64,
    #[serde(default, alias = "followerCount")]
    follower_count: u64,
    #[serde(default, alias = "followingCount")]
    following_count: u64,
    #[serde(default, alias = "heartCount", alias = "heart")]
    heart_count: u64,
}

impl TikwmSource {
    pub fn new(base_url: &str) -> Result<Self, DownloadError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DownloadError::SourceUnavailable(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn listing_endpoint(subject: &Subject) -> (&'static str, &'static str) {
        match subject {
            Subject::User(_) => ("/api/user/posts", "unique_id"),
            Subject::Hashtag(_) => ("/api/challenge/posts", "challenge_name"),
        }
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, DownloadError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| DownloadError::SourceUnavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DownloadError::SourceUnavailable(format!(
                "HTTP {} from {}",
                resp.status(),
                endpoint
            )));
        }

        let envelope: ApiEnvelope<T> = resp
            .json()
            .await
            .map_err(|e| DownloadError::ParseError(format!("bad response body: {}", e)))?;

        if envelope.code != 0 {
            return Err(DownloadError::SourceUnavailable(envelope.msg));
        }
        envelope
            .data
            .ok_or_else(|| DownloadError::ParseError("response carried no data".to_string()))
    }

    fn to_record(video: ApiVideo, subject: &Subject) -> VideoRecord {
        let author = match (&video.author, subject) {
            (Some(a), _) if !a.unique_id.is_empty() => a.unique_id.clone(),
            (_, Subject::User(name)) => name.clone(),
            _ => "unknown".to_string(),
        };
        let created_at = if video.create_time > 0 {
            OffsetDateTime::from_unix_timestamp(video.create_time).ok()
        } else {
            None
        };
        VideoRecord {
            id: video.video_id,
            author,
            view_count: video.play_count,
            created_at,
        }
    }

    fn cursor_string(cursor: &serde_json::Value) -> String {
        match cursor {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => "0".to_string(),
        }
    }
}

#[async_trait]
impl VideoSource for TikwmSource {
    fn name(&self) -> &'static str {
        "tikwm"
    }

    async fn fetch(
        &self,
        subject: &Subject,
        window: FetchWindow,
    ) -> Result<Vec<VideoRecord>, DownloadError> {
        let cap = window.cap();
        let (endpoint, subject_key) = Self::listing_endpoint(subject);

        let mut records: Vec<VideoRecord> = Vec::new();
        let mut cursor = "0".to_string();

        loop {
            let page_size = (cap - records.len()).min(PAGE_SIZE);
            let query = [
                (subject_key, subject.value().to_string()),
                ("count", page_size.to_string()),
                ("cursor", cursor.clone()),
            ];
            let page: PostsData = self.get_page(endpoint, &query).await?;

            let before = records.len();
            for video in page.videos {
                if video.video_id.is_empty() {
                    debug!("skipping record without id");
                    continue;
                }
                records.push(Self::to_record(video, subject));
                if records.len() >= cap {
                    break;
                }
            }
            debug!(fetched = records.len(), cap, "metadata page complete");

            // Stop on a full window, an exhausted listing, or a page
            // that made no progress (a stuck cursor must not loop)
            if records.len() >= cap || !page.has_more || records.len() == before {
                break;
            }
            cursor = Self::cursor_string(&page.cursor);
        }

        Ok(records)
    }

    async fn profile(&self, subject: &Subject) -> Result<Option<ProfileInfo>, DownloadError> {
        let name = match subject {
            Subject::User(name) => name,
            Subject::Hashtag(_) => return Ok(None),
        };
        let query = [("unique_id", name.clone())];
        let info: UserInfoData = self.get_page("/api/user/info", &query).await?;
        let stats = info
            .stats
            .ok_or_else(|| DownloadError::ParseError("profile carried no stats".to_string()))?;
        Ok(Some(ProfileInfo {
            video_count: stats.video_count,
            follower_count: stats.follower_count,
            following_count: stats.following_count,
            heart_count: stats.heart_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn listing_body(ids: &[(&str, u64, i64)], cursor: &str, has_more: bool) -> String {
        let videos: Vec<String> = ids
            .iter()
            .map(|(id, views, ts)| {
                format!(
                    r#"{{"video_id":"{}","play_count":{},"create_time":{},"author":{{"unique_id":"alice"}}}}"#,
                    id, views, ts
                )
            })
            .collect();
        format!(
            r#"{{"code":0,"msg":"success","data":{{"videos":[{}],"cursor":"{}","hasMore":{}}}}}"#,
            videos.join(","),
            cursor,
            has_more
        )
    }

    #[tokio::test]
    async fn maps_listing_fields_into_records() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/user/posts")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(listing_body(
                &[("701", 1200, 1_700_000_000), ("702", 90, 1_700_000_100)],
                "0",
                false,
            ))
            .create_async()
            .await;

        let source = TikwmSource::new(&server.url()).unwrap();
        let subject = Subject::user("alice").unwrap();
        let records = source
            .fetch(&subject, FetchWindow::Limited(10))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "701");
        assert_eq!(records[0].author, "alice");
        assert_eq!(records[0].view_count, 1200);
        assert!(records[0].created_at.is_some());
    }

    #[tokio::test]
    async fn nonzero_code_is_source_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/user/posts")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":-1,"msg":"rate limit exceeded","data":null}"#)
            .create_async()
            .await;

        let source = TikwmSource::new(&server.url()).unwrap();
        let subject = Subject::user("alice").unwrap();
        let err = source
            .fetch(&subject, FetchWindow::Limited(10))
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn pagination_stops_at_window_cap() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/api/user/posts")
            .match_query(Matcher::UrlEncoded("cursor".into(), "0".into()))
            .with_status(200)
            .with_body(listing_body(
                &[("1", 1, 1), ("2", 2, 2), ("3", 3, 3)],
                "next",
                true,
            ))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/api/user/posts")
            .match_query(Matcher::UrlEncoded("cursor".into(), "next".into()))
            .with_status(200)
            .with_body(listing_body(&[("4", 4, 4), ("5", 5, 5)], "later", true))
            .create_async()
            .await;

        let source = TikwmSource::new(&server.url()).unwrap();
        let subject = Subject::user("alice").unwrap();
        let records = source
            .fetch(&subject, FetchWindow::Limited(4))
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].id, "4");
    }

    #[tokio::test]
    async fn records_without_ids_are_dropped() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/challenge/posts")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"code":0,"msg":"","data":{"videos":[{"video_id":"","play_count":5},{"video_id":"9","play_count":7,"author":{"unique_id":"bob"}}],"cursor":"0","hasMore":false}}"#,
            )
            .create_async()
            .await;

        let source = TikwmSource::new(&server.url()).unwrap();
        let subject = Subject::hashtag("dance").unwrap();
        let records = source
            .fetch(&subject, FetchWindow::Limited(10))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "9");
        assert_eq!(records[0].author, "bob");
    }

    #[tokio::test]
    async fn profile_reads_stats_and_skips_hashtags() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/user/info")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"code":0,"msg":"","data":{"stats":{"videoCount":12,"followerCount":3400,"followingCount":10,"heartCount":99000}}}"#,
            )
            .create_async()
            .await;

        let source = TikwmSource::new(&server.url()).unwrap();
        let user = Subject::user("alice").unwrap();
        let profile = source.profile(&user).await.unwrap().unwrap();
        assert_eq!(profile.video_count, 12);
        assert_eq!(profile.follower_count, 3400);

        let tag = Subject::hashtag("dance").unwrap();
        assert!(source.profile(&tag).await.unwrap().is_none());
    }
}
