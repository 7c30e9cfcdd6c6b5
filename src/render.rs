use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clients::entities::TrackSummary;
use crate::flow::{FlowState, Snapshot};

pub const LOADING_CAPTION: &str = "Loading Songs around you...";
pub const ERROR_CAPTION: &str = "Something went wrong. Please try again.";

/// Global player state shared by every card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Id of the song currently selected in the player.
    pub active_song: Option<String>,
    pub is_playing: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card<'a> {
    pub key: &'a str,
    pub index: usize,
    pub song: &'a TrackSummary,
    pub active_song: Option<&'a str>,
    pub is_playing: bool,
    pub is_active: bool,
    /// The whole list this card belongs to, shared by every card.
    #[serde(skip)]
    pub data: &'a [TrackSummary],
    /// Length of `data`.
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum View<'a> {
    Loading { caption: &'static str },
    Error { caption: &'static str },
    Cards { heading: String, cards: Vec<Card<'a>> },
}

impl<'a> View<'a> {
    pub fn new(state: &'a FlowState, country: &str, player: &'a PlayerState) -> Self {
        match state {
            FlowState::Loading => View::Loading {
                caption: LOADING_CAPTION,
            },
            FlowState::Ready(tracks) if !tracks.is_empty() => View::Cards {
                heading: format!("Around you {country}").trim_end().to_string(),
                cards: cards(tracks, player),
            },
            _ => View::Error {
                caption: ERROR_CAPTION,
            },
        }
    }

    pub fn from_snapshot(snapshot: &'a Snapshot, player: &'a PlayerState) -> Self {
        View::new(&snapshot.state, &snapshot.country, player)
    }
}

fn cards<'a>(tracks: &'a [TrackSummary], player: &'a PlayerState) -> Vec<Card<'a>> {
    let active_song = player.active_song.as_deref();
    tracks
        .iter()
        .enumerate()
        .map(|(index, song)| Card {
            key: &song.id,
            index,
            song,
            active_song,
            is_playing: player.is_playing,
            is_active: active_song == Some(song.id.as_str()),
            data: tracks,
            total: tracks.len(),
        })
        .collect()
}

impl fmt::Display for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Loading { caption } | View::Error { caption } => writeln!(f, "{caption}"),
            View::Cards { heading, cards } => {
                writeln!(f, "{heading}")?;
                for card in cards {
                    let marker = match (card.is_active, card.is_playing) {
                        (true, true) => "▶",
                        (true, false) => "⏸",
                        _ => " ",
                    };
                    writeln!(
                        f,
                        "{marker} {:>2}. {} - {}",
                        card.index + 1,
                        card.song.title,
                        card.song.artist_name
                    )?;
                    writeln!(f, "       {}", card.song.external_url)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(id: &str, title: &str) -> TrackSummary {
        TrackSummary {
            id: id.into(),
            title: title.into(),
            artist_name: "Artist Y".into(),
            artwork_url: "http://img".into(),
            external_url: "http://link".into(),
        }
    }

    #[test]
    fn loading_and_empty_views_use_fixed_captions() {
        let player = PlayerState::default();
        let loading = View::new(&FlowState::Loading, "", &player);
        assert_eq!(loading.to_string().trim(), LOADING_CAPTION);

        let empty = View::new(&FlowState::Empty, "US", &player);
        assert_eq!(empty.to_string().trim(), ERROR_CAPTION);

        let no_tracks = FlowState::Ready(Vec::new());
        assert!(matches!(
            View::new(&no_tracks, "US", &player),
            View::Error { .. }
        ));
    }

    #[test]
    fn one_card_per_track_with_player_state() {
        let state = FlowState::Ready(vec![summary("a1", "Song X"), summary("b2", "Song Z")]);
        let player = PlayerState {
            active_song: Some("b2".into()),
            is_playing: true,
        };
        let View::Cards { heading, cards } = View::new(&state, "US", &player) else {
            panic!("expected cards");
        };
        assert_eq!(heading, "Around you US");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].key, "a1");
        assert!(!cards[0].is_active);
        assert!(cards[1].is_active);
        assert_eq!(cards[1].index, 1);
        assert!(cards.iter().all(|c| c.total == 2 && c.is_playing));
        assert_eq!(cards[1].data[0].id, "a1");
        assert!(std::ptr::eq(cards[0].data, cards[1].data));
    }

    #[test]
    fn heading_without_country_has_no_trailing_space() {
        let state = FlowState::Ready(vec![summary("a1", "Song X")]);
        let player = PlayerState::default();
        let View::Cards { heading, .. } = View::new(&state, "", &player) else {
            panic!("expected cards");
        };
        assert_eq!(heading, "Around you");
    }

    #[test]
    fn cards_view_serializes_for_the_front_end() {
        let state = FlowState::Ready(vec![summary("a1", "Song X")]);
        let player = PlayerState::default();
        let value = serde_json::to_value(View::new(&state, "US", &player)).unwrap();
        assert_eq!(
            value,
            json!({
                "view": "cards",
                "heading": "Around you US",
                "cards": [{
                    "key": "a1",
                    "index": 0,
                    "song": {
                        "id": "a1",
                        "title": "Song X",
                        "artist": "Artist Y",
                        "artwork": "http://img",
                        "previewUrl": "http://link"
                    },
                    "activeSong": null,
                    "isPlaying": false,
                    "isActive": false,
                    "total": 1
                }]
            })
        );
    }
}
