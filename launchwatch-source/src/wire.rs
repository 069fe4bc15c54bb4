//! JSON shapes served by the rocketlaunch.live feed.

use launchwatch_core::LaunchRecord;
use serde::Deserialize;

/// Every feed endpoint wraps its payload as `{"result": [...]}`.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub result: Vec<WireLaunch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Named {
    #[serde(default)]
    pub name: String,
}

/// Providers appear either as a bare name or as an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NameOrObject {
    Name(String),
    Object(Named),
}

impl NameOrObject {
    fn into_name(self) -> String {
        match self {
            Self::Name(name) => name,
            Self::Object(named) => named.name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePad {
    #[serde(default)]
    pub name: String,
    pub location: Option<Named>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMedia {
    pub media_url: Option<String>,
    pub youtube_vidid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireLaunch {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    pub t0: Option<String>,
    pub win_open: Option<String>,
    #[serde(default)]
    pub date_str: String,
    pub mission_description: Option<String>,
    pub vehicle: Option<Named>,
    pub provider: Option<NameOrObject>,
    pub pad: Option<WirePad>,
    pub location: Option<Named>,
    #[serde(default)]
    pub media: Vec<WireMedia>,
}

impl From<WireLaunch> for LaunchRecord {
    fn from(wire: WireLaunch) -> Self {
        let pad_location = wire
            .pad
            .as_ref()
            .and_then(|pad| pad.location.as_ref())
            .map(|loc| loc.name.clone());
        let location = wire.location.map(|loc| loc.name).or(pad_location);

        let media = wire
            .media
            .into_iter()
            .filter_map(|m| {
                m.media_url
                    .or_else(|| m.youtube_vidid.map(|id| format!("https://www.youtube.com/watch?v={id}")))
            })
            .collect();

        LaunchRecord {
            slug: wire.slug,
            name: wire.name,
            t0: wire.t0.filter(|s| !s.is_empty()),
            win_open: wire.win_open.filter(|s| !s.is_empty()),
            date_str: wire.date_str,
            mission_description: wire.mission_description.filter(|s| !s.trim().is_empty()),
            vehicle: wire.vehicle.map(|v| v.name).unwrap_or_default(),
            provider: wire.provider.map(NameOrObject::into_name).unwrap_or_default(),
            pad: wire.pad.map(|p| p.name).filter(|s| !s.is_empty()),
            location: location.filter(|s| !s.is_empty()),
            media,
        }
    }
}

/// Decode a feed response body into launch records, feed order preserved.
pub fn decode_launches(body: &str) -> Result<Vec<LaunchRecord>, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(body)?;
    Ok(envelope.result.into_iter().map(LaunchRecord::from).collect())
}
