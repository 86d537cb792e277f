//! Candidate ranking.
//!
//! All comparisons run on trimmed, lower-cased strings. Substring relations
//! are checked in both directions, so an empty field overlaps any query.

use super::Candidate;

const EXACT_TITLE: u32 = 100;
const TITLE_OVERLAP: u32 = 50;
const ARTIST_OVERLAP: u32 = 30;
const ALBUM_OVERLAP: u32 = 20;
const HIGH_RES_ARTWORK: u32 = 10;

fn overlaps(query: &str, field: &str) -> bool {
    query.contains(field) || field.contains(query)
}

/// Relevance of one candidate to a search query.
pub fn score(query: &str, candidate: &Candidate) -> u32 {
    let query = query.trim().to_lowercase();
    let title = candidate.title.trim().to_lowercase();
    let artist = candidate.artist.trim().to_lowercase();
    let album = candidate.album.trim().to_lowercase();

    let mut score = 0;

    if query == title || query == format!("{artist} {title}") {
        score += EXACT_TITLE;
    } else if overlaps(&query, &title) {
        score += TITLE_OVERLAP;
    }

    if overlaps(&query, &artist) {
        score += ARTIST_OVERLAP;
    }
    if overlaps(&query, &album) {
        score += ALBUM_OVERLAP;
    }
    if candidate.high_res {
        score += HIGH_RES_ARTWORK;
    }

    score
}

/// Highest-scoring candidate; the earliest one wins ties.
pub fn select_best<'a>(query: &str, candidates: &'a [Candidate]) -> Option<&'a Candidate> {
    let mut best: Option<(u32, &Candidate)> = None;
    for candidate in candidates {
        let s = score(query, candidate);
        tracing::trace!(title = %candidate.title, score = s, "scored candidate");
        if best.is_none_or(|(top, _)| s > top) {
            best = Some((s, candidate));
        }
    }
    best.map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, artist: &str, album: &str, high_res: bool) -> Candidate {
        Candidate {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            high_res,
            artwork_url: Some(format!("https://cdn.example/{title}.jpg")),
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_exact_title_beats_partial() {
        let partial = candidate("Dark Side of the Moon", "Pink Floyd", "Pink Floyd Hits", false);
        let exact = candidate("Dark Side", "Pink Floyd", "Pink Floyd Hits", false);

        assert_eq!(score("Dark Side", &partial), 50);
        assert_eq!(score("Dark Side", &exact), 100);

        let candidates = [partial, exact];
        let best = select_best("Dark Side", &candidates).unwrap();
        assert_eq!(best.title, "Dark Side");
    }

    #[test]
    fn test_artist_title_form_is_exact() {
        let c = candidate("Money", "Pink Floyd", "The Dark Side of the Moon", true);
        // exact + artist overlap + high-res
        assert_eq!(score("pink floyd money", &c), 100 + 30 + 10);
    }

    #[test]
    fn test_album_and_high_res_bonus() {
        let c = candidate("Breathe", "Pink Floyd", "The Dark Side of the Moon", true);
        assert_eq!(score("the dark side of the moon", &c), 20 + 10);
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let first = candidate("Time", "Pink Floyd", "DSOTM", false);
        let second = candidate("Time", "Pink Floyd", "DSOTM", false);
        let mut second = second;
        second.artwork_url = Some("second".into());

        let candidates = [first, second];
        let best = select_best("time", &candidates).unwrap();
        assert_eq!(best.artwork_url.as_deref(), Some("https://cdn.example/Time.jpg"));
    }

    #[test]
    fn test_high_res_breaks_otherwise_equal_scores() {
        let low = candidate("Us and Them", "Pink Floyd", "DSOTM", false);
        let high = candidate("Us and Them", "Pink Floyd", "DSOTM", true);
        let candidates = [low, high];
        assert!(select_best("us and them", &candidates).unwrap().high_res);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(select_best("anything", &[]).is_none());
    }
}
