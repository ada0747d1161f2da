use serde::{Deserialize, Serialize};

use super::ids::PlayerId;

/// Static identity of a registered player, supplied by the identity
/// collaborator. Home region and party feed filing validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub name: String,
    pub home_region: String,
    /// `None` for independents; never matches a partisan primary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
}

impl PlayerProfile {
    pub fn new(id: PlayerId, name: &str, home_region: &str, party: Option<&str>) -> Self {
        Self {
            id,
            name: name.to_string(),
            home_region: home_region.to_string(),
            party: party.map(str::to_string),
        }
    }
}
