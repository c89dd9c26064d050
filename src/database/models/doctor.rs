use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_RATING: &str = "5.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: i32,
    pub name: String,
    pub specialization: String,
    pub bio: String,
    pub image_url: String,
    /// Free-text schedule, e.g. "Mon-Fri 09:00-17:00"
    pub availability: String,
    pub experience: i32,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub name: String,
    pub specialization: String,
    pub bio: String,
    pub image_url: String,
    pub availability: String,
    pub experience: i32,
    pub rating: String,
}

impl NewDoctor {
    pub fn into_doctor(self, id: i32) -> Doctor {
        Doctor {
            id,
            name: self.name,
            specialization: self.specialization,
            bio: self.bio,
            image_url: self.image_url,
            availability: self.availability,
            experience: self.experience,
            rating: self.rating,
        }
    }
}
