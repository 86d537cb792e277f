//! iTunes Search API response types.

use serde::Deserialize;

use crate::artwork::upscale_artwork_url;
use crate::providers::Candidate;
use coverframe_core::TrackMetadata;
use coverframe_core::metadata::{format_track_time, truncate_release_date};

/// Raw iTunes API response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItunesApiResponse {
    #[serde(default)]
    pub result_count: u32,
    #[serde(default)]
    pub results: Vec<ItunesTrack>,
}

/// One track result. Every field is optional in practice.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItunesTrack {
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub collection_name: Option<String>,
    pub primary_genre_name: Option<String>,
    pub release_date: Option<String>,
    pub track_time_millis: Option<u64>,
    pub preview_url: Option<String>,
    pub track_view_url: Option<String>,
    pub artwork_url100: Option<String>,
    pub artwork_url60: Option<String>,
}

impl ItunesTrack {
    /// Convert into a ranked candidate, rewriting the artwork size token.
    pub fn into_candidate(self, target_size: u32) -> Candidate {
        let high_res = self.artwork_url100.is_some();
        let artwork_url = self
            .artwork_url100
            .or(self.artwork_url60)
            .map(|url| upscale_artwork_url(&url, target_size));

        let title = self.track_name.unwrap_or_default();
        let artist = self.artist_name.unwrap_or_default();
        let album = self.collection_name.unwrap_or_default();

        let metadata = TrackMetadata {
            title: title.clone(),
            artist: artist.clone(),
            album: album.clone(),
            genre: self.primary_genre_name.unwrap_or_default(),
            release_date: truncate_release_date(self.release_date.as_deref().unwrap_or_default()),
            track_time: format_track_time(self.track_time_millis),
            preview_url: self.preview_url.unwrap_or_default(),
            itunes_url: Some(self.track_view_url.unwrap_or_default()),
            spotify_url: None,
        }
        .with_unknown_defaults();

        Candidate { title, artist, album, high_res, artwork_url, metadata }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "resultCount": 2,
        "results": [
            {
                "wrapperType": "track",
                "kind": "song",
                "trackName": "Money",
                "artistName": "Pink Floyd",
                "collectionName": "The Dark Side of the Moon",
                "primaryGenreName": "Rock",
                "releaseDate": "1973-03-01T12:00:00Z",
                "trackTimeMillis": 382296,
                "previewUrl": "https://audio.example/money.m4a",
                "trackViewUrl": "https://music.apple.com/us/album/money/1065973699?i=1065973706",
                "artworkUrl60": "https://is1-ssl.mzstatic.com/image/thumb/a/b/60x60bb.jpg",
                "artworkUrl100": "https://is1-ssl.mzstatic.com/image/thumb/a/b/100x100bb.jpg"
            },
            {
                "trackName": "Money (Live)",
                "artworkUrl60": "https://is1-ssl.mzstatic.com/image/thumb/c/d/60x60bb.jpg"
            }
        ]
    }"#;

    #[test]
    fn test_parse_fixture() {
        let response: ItunesApiResponse = serde_json::from_str(FIXTURE).unwrap();
        assert_eq!(response.result_count, 2);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].track_time_millis, Some(382296));
    }

    #[test]
    fn test_into_candidate_full_record() {
        let response: ItunesApiResponse = serde_json::from_str(FIXTURE).unwrap();
        let candidate = response.results[0].clone().into_candidate(720);

        assert!(candidate.high_res);
        assert_eq!(
            candidate.artwork_url.as_deref(),
            Some("https://is1-ssl.mzstatic.com/image/thumb/a/b/720x720bb.jpg")
        );
        assert_eq!(candidate.metadata.title, "Money");
        assert_eq!(candidate.metadata.genre, "Rock");
        assert_eq!(candidate.metadata.release_date, "1973-03-01");
        assert_eq!(candidate.metadata.track_time, "6:22");
        assert!(candidate.metadata.itunes_url.as_deref().unwrap().starts_with("https://music.apple.com"));
        assert!(candidate.metadata.spotify_url.is_none());
    }

    #[test]
    fn test_into_candidate_sparse_record() {
        let response: ItunesApiResponse = serde_json::from_str(FIXTURE).unwrap();
        let candidate = response.results[1].clone().into_candidate(600);

        assert!(!candidate.high_res);
        assert_eq!(
            candidate.artwork_url.as_deref(),
            Some("https://is1-ssl.mzstatic.com/image/thumb/c/d/600x600bb.jpg")
        );
        assert_eq!(candidate.artist, "");
        assert_eq!(candidate.metadata.artist, "Unknown Artist");
        assert_eq!(candidate.metadata.track_time, "");
    }

    #[test]
    fn test_empty_response() {
        let response: ItunesApiResponse = serde_json::from_str(r#"{"resultCount":0,"results":[]}"#).unwrap();
        assert!(response.results.is_empty());
    }
}
