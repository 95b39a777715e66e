//! The authenticated user's own profile.

use crate::{
    metadata::RequestMetadata,
    resource::{null_as_empty, Timestamp},
    Client, Result,
};
use http::Method;
use serde::{Deserialize, Serialize};

/// The signed-in user, including fields only they may see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateUser {
    /// User id.
    pub id: i64,
    /// Login handle; empty if the server sent none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub login: String,
    /// Display name.
    pub name: Option<String>,
    /// Account email, visible only to the user.
    pub email: Option<String>,
    /// Profile page URL.
    pub uri: Option<String>,
    /// Preferred zone for displaying times.
    pub time_zone: Option<String>,
    /// Observations the user has made.
    pub observations_count: Option<i64>,
    /// The user's life list.
    pub life_list_id: Option<i64>,
    /// Taxa on the life list.
    pub life_list_taxa_count: Option<i64>,
    /// Avatar URL.
    pub icon_url: Option<String>,
    pub icon_content_type: Option<String>,
    pub icon_file_name: Option<String>,
    /// Avatar size in bytes.
    pub icon_file_size: Option<i64>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl Client {
    /// Fetches the profile of the user the client is authenticated as.
    ///
    /// `GET /users/edit.json`. Fails with a 401 [`crate::Error::HttpError`]
    /// on an unauthenticated client.
    pub async fn current_user(&self) -> Result<PrivateUser> {
        let metadata = RequestMetadata::new(Method::GET, "/users/edit.json");
        Ok(self.get::<PrivateUser>(metadata).await?.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_user_decodes_partial_profile() {
        let raw = r#"{
            "id": 477,
            "login": null,
            "email": "someone@example.org",
            "observations_count": 12,
            "icon_url": null
        }"#;
        let user: PrivateUser = serde_json::from_str(raw).unwrap();
        assert_eq!(user.login, "");
        assert_eq!(user.email.as_deref(), Some("someone@example.org"));
        assert_eq!(user.observations_count, Some(12));
        assert!(user.icon_url.is_none());
    }
}
