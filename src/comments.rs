//! Comments on observations and other commentable records.

use crate::{
    metadata::RequestMetadata,
    resource::{null_as_empty, SimpleUser, Timestamp},
    Client, Result,
};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// The kinds of record a comment can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentParentType {
    AssessmentSection,
    ListedTaxon,
    Observation,
    ObservationField,
    Post,
    TaxonChange,
}

/// A comment as embedded in an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id.
    pub id: i64,
    /// Comment text; empty if the server sent none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    /// Id of the record commented on.
    pub parent_id: Option<i64>,
    /// Kind of record commented on, e.g. `Observation`.
    pub parent_type: Option<String>,
    /// Author's user id.
    pub user_id: Option<i64>,
    /// Author.
    pub user: Option<SimpleUser>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// Body of [`Client::add_comment`].
#[derive(Debug, Clone, Serialize)]
pub struct AddCommentOpt {
    /// Kind of record to comment on.
    pub parent_type: CommentParentType,
    /// Id of the record to comment on.
    pub parent_id: i64,
    /// Comment text.
    pub body: String,
}

/// Body of [`Client::update_comment`].
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCommentOpt {
    /// Replacement text.
    pub body: String,
}

impl Client {
    /// Posts a comment. Requires authentication.
    ///
    /// `POST /comments.json`, success on 200 or 201.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use naturalist::{AddCommentOpt, Client, CommentParentType};
    ///
    /// # async fn example(client: Client) -> Result<(), naturalist::Error> {
    /// client
    ///     .add_comment(&AddCommentOpt {
    ///         parent_type: CommentParentType::Observation,
    ///         parent_id: 100,
    ///         body: "Lovely shot".to_string(),
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add_comment(&self, opt: &AddCommentOpt) -> Result<()> {
        let metadata = RequestMetadata::new(Method::POST, "/comments.json");
        self.execute::<_, serde_json::Value>(metadata, Some(opt), &[StatusCode::CREATED])
            .await?;
        Ok(())
    }

    /// Edits a comment's body. Requires authentication.
    ///
    /// `PUT /comments/{id}.json`, success on 200 or 204.
    pub async fn update_comment(&self, id: i64, opt: &UpdateCommentOpt) -> Result<()> {
        let metadata = RequestMetadata::new(Method::PUT, format!("/comments/{}.json", id));
        self.execute::<_, serde_json::Value>(metadata, Some(opt), &[StatusCode::NO_CONTENT])
            .await?;
        Ok(())
    }

    /// Deletes a comment. Requires authentication.
    ///
    /// `DELETE /comments/{id}.json`, success on 200 or 204.
    pub async fn delete_comment(&self, id: i64) -> Result<()> {
        let metadata = RequestMetadata::new(Method::DELETE, format!("/comments/{}.json", id));
        self.execute::<(), serde_json::Value>(metadata, None, &[StatusCode::NO_CONTENT])
            .await?;
        Ok(())
    }
}
