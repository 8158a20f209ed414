use serde::{Deserialize, Serialize};

/// `[latitude, longitude]`, either of which may be unset.
/// Serialized as a two-element array to match what the front end sends.
pub type Coordinates = [Option<f64>; 2];

/// Roles attached to a user account. Every account holds at least `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

/// Two-state lifecycle shared by users, categories, growth stages, plants
/// and messages. These kinds are never physically deleted; deactivation is
/// their only form of removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    pub fn as_int(self) -> i64 {
        match self {
            Status::Active => 1,
            Status::Inactive => 2,
        }
    }
}

impl From<Status> for u8 {
    fn from(s: Status) -> u8 {
        s.as_int() as u8
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Status::Active),
            2 => Ok(Status::Inactive),
            other => Err(format!("invalid status: {other}")),
        }
    }
}

/// Ad lifecycle. `Pending` marks a listing whose exchange is under way;
/// browse endpoints only surface `Active` ads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AdStatus {
    Active,
    Inactive,
    Pending,
}

impl AdStatus {
    pub fn as_int(self) -> i64 {
        match self {
            AdStatus::Active => 1,
            AdStatus::Inactive => 2,
            AdStatus::Pending => 3,
        }
    }
}

impl From<AdStatus> for u8 {
    fn from(s: AdStatus) -> u8 {
        s.as_int() as u8
    }
}

impl TryFrom<u8> for AdStatus {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(AdStatus::Active),
            2 => Ok(AdStatus::Inactive),
            3 => Ok(AdStatus::Pending),
            other => Err(format!("invalid ad status: {other}")),
        }
    }
}
