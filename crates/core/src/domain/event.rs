use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::text::normalize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "mariage")]
    Wedding,
    #[serde(rename = "anniversaire")]
    Birthday,
    #[serde(rename = "soiree")]
    PrivateParty,
    #[serde(rename = "entreprise")]
    Corporate,
    #[serde(rename = "conference")]
    Conference,
    #[serde(rename = "ceremonie")]
    ReligiousCeremony,
    #[serde(rename = "autre")]
    Other,
}

impl EventKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Wedding => "mariage",
            Self::Birthday => "anniversaire",
            Self::PrivateParty => "soiree",
            Self::Corporate => "entreprise",
            Self::Conference => "conference",
            Self::ReligiousCeremony => "ceremonie",
            Self::Other => "autre",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Wedding => "mariage",
            Self::Birthday => "anniversaire",
            Self::PrivateParty => "soirée privée",
            Self::Corporate => "événement d'entreprise",
            Self::Conference => "conférence",
            Self::ReligiousCeremony => "cérémonie",
            Self::Other => "événement",
        }
    }

    /// Events where speeches happen and a microphone is always provided.
    pub fn requires_microphone(self) -> bool {
        matches!(self, Self::Wedding | Self::ReligiousCeremony | Self::Corporate)
    }

    pub fn is_party(self) -> bool {
        matches!(self, Self::PrivateParty | Self::Birthday)
    }
}

impl FromStr for EventKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "mariage" | "wedding" => Ok(Self::Wedding),
            "anniversaire" | "birthday" => Ok(Self::Birthday),
            "soiree" | "fete" | "party" | "soiree privee" => Ok(Self::PrivateParty),
            "entreprise" | "corporate" | "soiree d'entreprise" => Ok(Self::Corporate),
            "conference" | "seminaire" => Ok(Self::Conference),
            "ceremonie" | "ceremony" | "bapteme" | "communion" => Ok(Self::ReligiousCeremony),
            "autre" | "other" => Ok(Self::Other),
            _ => Err(DomainError::UnknownValue { field: "event_type", value: value.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    #[serde(rename = "interieur")]
    Indoor,
    #[serde(rename = "exterieur")]
    Outdoor,
}

impl Environment {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Indoor => "interieur",
            Self::Outdoor => "exterieur",
        }
    }
}

impl FromStr for Environment {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "interieur" | "indoor" | "salle" => Ok(Self::Indoor),
            "exterieur" | "outdoor" | "plein air" => Ok(Self::Outdoor),
            _ => Err(DomainError::UnknownValue { field: "environment", value: value.to_string() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ambiance {
    Festive,
    Lounge,
    Speech,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryChoice {
    #[serde(rename = "livraison")]
    Delivery,
    #[serde(rename = "retrait")]
    Pickup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Need {
    #[serde(rename = "son")]
    Sound,
    #[serde(rename = "dj")]
    Dj,
    #[serde(rename = "micro")]
    Microphone,
    #[serde(rename = "micro_sans_fil")]
    WirelessMicrophone,
    #[serde(rename = "lumiere")]
    Lighting,
    #[serde(rename = "karaoke")]
    Karaoke,
    #[serde(rename = "basses")]
    ExtraBass,
    #[serde(rename = "plus_de_voies")]
    MoreChannels,
    #[serde(rename = "plus_de_puissance")]
    MorePower,
    #[serde(rename = "installation")]
    Installation,
}

impl Need {
    pub fn is_microphone(self) -> bool {
        matches!(self, Self::Microphone | Self::WirelessMicrophone)
    }
}

impl FromStr for Need {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).replace(' ', "_").as_str() {
            "son" | "sound" | "sono" => Ok(Self::Sound),
            "dj" => Ok(Self::Dj),
            "micro" | "microphone" | "micro_filaire" => Ok(Self::Microphone),
            "micro_sans_fil" | "micro_hf" => Ok(Self::WirelessMicrophone),
            "lumiere" | "lumieres" | "eclairage" | "lighting" => Ok(Self::Lighting),
            "karaoke" => Ok(Self::Karaoke),
            "basses" | "caisson" | "bass" => Ok(Self::ExtraBass),
            "plus_de_voies" | "voies" | "channels" => Ok(Self::MoreChannels),
            "plus_de_puissance" | "puissance" => Ok(Self::MorePower),
            "installation" => Ok(Self::Installation),
            _ => Err(DomainError::UnknownValue { field: "needs", value: value.to_string() }),
        }
    }
}

/// Guest-count buckets offered by the booking form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuestBucket {
    #[serde(rename = "0-50")]
    UpTo50,
    #[serde(rename = "50-100")]
    From50To100,
    #[serde(rename = "100-200")]
    From100To200,
    #[serde(rename = "200-400")]
    From200To400,
    #[serde(rename = "400+")]
    Over400,
}

impl GuestBucket {
    pub const ALL: [GuestBucket; 5] =
        [Self::UpTo50, Self::From50To100, Self::From100To200, Self::From200To400, Self::Over400];

    /// Representative headcount used for pack selection.
    pub fn midpoint(self) -> u32 {
        match self {
            Self::UpTo50 => 25,
            Self::From50To100 => 75,
            Self::From100To200 => 150,
            Self::From200To400 => 300,
            Self::Over400 => 600,
        }
    }

    pub fn for_count(count: u32) -> Self {
        match count {
            0..=50 => Self::UpTo50,
            51..=100 => Self::From50To100,
            101..=200 => Self::From100To200,
            201..=400 => Self::From200To400,
            _ => Self::Over400,
        }
    }

    pub fn is_top(self) -> bool {
        self == Self::Over400
    }
}

impl FromStr for GuestBucket {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().replace(' ', "").as_str() {
            "0-50" | "1-50" | "-50" => Ok(Self::UpTo50),
            "50-100" | "51-100" => Ok(Self::From50To100),
            "100-200" | "101-200" => Ok(Self::From100To200),
            "200-400" | "201-400" => Ok(Self::From200To400),
            "400+" | "+400" | "400-plus" => Ok(Self::Over400),
            _ => Err(DomainError::UnknownValue { field: "guests", value: value.to_string() }),
        }
    }
}

/// Either a booking-form bucket or an exact headcount taken from the chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestCount {
    Bucket(GuestBucket),
    Exact(u32),
}

impl GuestCount {
    pub fn headcount(self) -> u32 {
        match self {
            Self::Bucket(bucket) => bucket.midpoint(),
            Self::Exact(count) => count,
        }
    }

    pub fn bucket(self) -> GuestBucket {
        match self {
            Self::Bucket(bucket) => bucket,
            Self::Exact(count) => GuestBucket::for_count(count),
        }
    }
}

impl FromStr for GuestCount {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Ok(count) = value.trim().parse::<u32>() {
            return Ok(Self::Exact(count));
        }
        value.parse::<GuestBucket>().map(Self::Bucket)
    }
}

impl fmt::Display for GuestCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bucket(bucket) => write!(f, "{}", bucket.midpoint()),
            Self::Exact(count) => write!(f, "{count}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventKind, GuestBucket, GuestCount, Need};

    #[test]
    fn bucket_midpoints_match_booking_form() {
        assert_eq!("0-50".parse::<GuestBucket>().map(GuestBucket::midpoint), Ok(25));
        assert_eq!("100-200".parse::<GuestBucket>().map(GuestBucket::midpoint), Ok(150));
        assert_eq!("400+".parse::<GuestBucket>().map(GuestBucket::midpoint), Ok(600));
    }

    #[test]
    fn bucket_for_count_puts_boundaries_in_lower_bucket() {
        assert_eq!(GuestBucket::for_count(50), GuestBucket::UpTo50);
        assert_eq!(GuestBucket::for_count(51), GuestBucket::From50To100);
        assert_eq!(GuestBucket::for_count(401), GuestBucket::Over400);
    }

    #[test]
    fn guest_count_accepts_exact_numbers_and_buckets() {
        assert_eq!("120".parse::<GuestCount>(), Ok(GuestCount::Exact(120)));
        assert_eq!("50-100".parse::<GuestCount>(), Ok(GuestCount::Bucket(GuestBucket::From50To100)));
        assert!("beaucoup".parse::<GuestCount>().is_err());
    }

    #[test]
    fn french_tags_parse() {
        assert_eq!("Mariage".parse::<EventKind>(), Ok(EventKind::Wedding));
        assert_eq!("micro sans fil".parse::<Need>(), Ok(Need::WirelessMicrophone));
        assert_eq!("son".parse::<Need>(), Ok(Need::Sound));
    }
}
