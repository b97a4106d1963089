use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ScreeningError;

/// Access role of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Read a stored role; anything other than `admin` is a plain user
    pub fn from_stored(value: &str) -> Self {
        if value.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ScreeningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ScreeningError::ValidationError(format!(
                "Unknown role '{}', expected user or admin", other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BloodType {
    A,
    B,
    AB,
    O,
    Unspecified,
}

impl BloodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::A => "A",
            BloodType::B => "B",
            BloodType::AB => "AB",
            BloodType::O => "O",
            BloodType::Unspecified => "Unspecified",
        }
    }

    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "A" => Some(BloodType::A),
            "B" => Some(BloodType::B),
            "AB" => Some(BloodType::AB),
            "O" => Some(BloodType::O),
            "Unspecified" => Some(BloodType::Unspecified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "Male" => Some(Gender::Male),
            "Female" => Some(Gender::Female),
            "Other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// Mutable profile of an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub blood_type: Option<BloodType>,
    pub emergency_contact: Option<String>,
    pub gender: Option<Gender>,
    pub chronic_disease: Option<String>,
    pub allergy: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// Name shown when no profile document exists
    pub const UNSPECIFIED_NAME: &'static str = "unspecified";

    /// Profile returned for an identity that has no stored document
    pub fn default_for(email: &str) -> Self {
        Self {
            email: email.to_string(),
            name: Self::UNSPECIFIED_NAME.to_string(),
            lastname: None,
            phone: None,
            role: Role::User,
            blood_type: None,
            emergency_contact: None,
            gender: None,
            chronic_disease: None,
            allergy: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// First name and last name joined, as shown in admin views
    pub fn full_name(&self) -> String {
        match self.lastname.as_deref().filter(|l| !l.is_empty()) {
            Some(last) => format!("{} {}", self.name, last),
            None => self.name.clone(),
        }
    }
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub blood_type: Option<BloodType>,
    pub emergency_contact: Option<String>,
    pub gender: Option<Gender>,
    pub chronic_disease: Option<String>,
    pub allergy: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::from_stored("something"), Role::User);
    }

    #[test]
    fn test_full_name() {
        let mut profile = UserProfile::default_for("ana@example.com");
        profile.name = "Ana".to_string();
        assert_eq!(profile.full_name(), "Ana");
        profile.lastname = Some("Silva".to_string());
        assert_eq!(profile.full_name(), "Ana Silva");
    }
}
