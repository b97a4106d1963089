use serde::{Deserialize, Serialize};

/// Storage model for a user profile document, keyed by email
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredUserProfile {
    /// Identity key
    pub email: String,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    /// `user` or `admin`
    pub role: String,
    pub blood_type: Option<String>,
    pub emergency_contact: Option<String>,
    pub gender: Option<String>,
    pub chronic_disease: Option<String>,
    pub allergy: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl StoredUserProfile {
    /// A fresh profile with the default `user` role
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: "user".to_string(),
            ..Default::default()
        }
    }

    /// Overwrite only the fields present in `changes`
    pub fn apply(&mut self, changes: &ProfileChanges) {
        fn set(target: &mut Option<String>, value: &Option<String>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        set(&mut self.name, &changes.name);
        set(&mut self.lastname, &changes.lastname);
        set(&mut self.phone, &changes.phone);
        if let Some(role) = &changes.role {
            self.role = role.clone();
        }
        set(&mut self.blood_type, &changes.blood_type);
        set(&mut self.emergency_contact, &changes.emergency_contact);
        set(&mut self.gender, &changes.gender);
        set(&mut self.chronic_disease, &changes.chronic_disease);
        set(&mut self.allergy, &changes.allergy);
        set(&mut self.created_at, &changes.created_at);
        set(&mut self.updated_at, &changes.updated_at);
    }
}

/// Partial update of a profile document. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub blood_type: Option<String>,
    pub emergency_contact: Option<String>,
    pub gender: Option<String>,
    pub chronic_disease: Option<String>,
    pub allergy: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
