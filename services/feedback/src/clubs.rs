//! Club → location mapping shared by submission validation and feedback
//! link generation.

use serde::{Deserialize, Serialize};

/// One configured club and its ordered locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubEntry {
    pub id: String,
    /// Empty means the club has a single implicit location
    #[serde(default)]
    pub locations: Vec<String>,
}

/// Outcome of checking a location against a club
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationCheck {
    /// Location is listed for the club
    Listed,
    /// Club is known but does not list this location
    NotListed,
    /// Club is not configured, no constraint applies
    UnknownClub,
}

/// Static club → location configuration, loaded once at startup.
/// Clubs keep their configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClubLocationMap {
    clubs: Vec<ClubEntry>,
}

impl ClubLocationMap {
    /// Build the map; a repeated club id keeps its first entry
    pub fn new(entries: impl IntoIterator<Item = ClubEntry>) -> Self {
        let mut clubs: Vec<ClubEntry> = Vec::new();
        for entry in entries {
            if !clubs.iter().any(|existing| existing.id == entry.id) {
                clubs.push(entry);
            }
        }
        Self { clubs }
    }

    /// Built-in clubs used when the configuration does not list any
    pub fn builtin() -> Self {
        Self::new(default_club_entries())
    }

    pub fn locations(&self, club_id: &str) -> Option<&[String]> {
        self.clubs
            .iter()
            .find(|entry| entry.id == club_id)
            .map(|entry| entry.locations.as_slice())
    }

    pub fn check_location(&self, club_id: &str, location: &str) -> LocationCheck {
        match self.locations(club_id) {
            None => LocationCheck::UnknownClub,
            Some(locations) if locations.iter().any(|l| l == location) => LocationCheck::Listed,
            Some(_) => LocationCheck::NotListed,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.clubs
            .iter()
            .map(|entry| (entry.id.as_str(), entry.locations.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.clubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clubs.is_empty()
    }

    /// Feedback form links for every club, one per location
    pub fn feedback_links(&self, base_url: &str) -> Vec<ClubLinks> {
        let base = base_url.trim_end_matches('/');

        self.iter()
            .map(|(club, locations)| {
                let club_path = format!("{base}/{}", urlencoding::encode(club));
                let links = if locations.is_empty() {
                    vec![FeedbackLink {
                        label: "Main".to_string(),
                        location: None,
                        url: club_path,
                    }]
                } else {
                    locations
                        .iter()
                        .map(|location| FeedbackLink {
                            label: location.clone(),
                            location: Some(location.clone()),
                            url: format!(
                                "{club_path}?location={}",
                                urlencoding::encode(location)
                            ),
                        })
                        .collect()
                };

                ClubLinks {
                    club_id: club.to_string(),
                    links,
                }
            })
            .collect()
    }
}

/// Links for one club
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubLinks {
    pub club_id: String,
    pub links: Vec<FeedbackLink>,
}

/// Link to a club's feedback form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackLink {
    pub label: String,
    pub location: Option<String>,
    pub url: String,
}

pub fn default_club_entries() -> Vec<ClubEntry> {
    let entry = |id: &str, locations: &[&str]| ClubEntry {
        id: id.to_string(),
        locations: locations.iter().map(|l| l.to_string()).collect(),
    };

    vec![
        entry("LEVEL", &["ASTANA", "SARAISHYK", "ZAHZAGANSK"]),
        entry("SPACE", &["MAMETOVA", "TRK"]),
        entry("PINGWIN", &[]),
    ]
}
