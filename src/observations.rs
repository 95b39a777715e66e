//! Observation records and endpoints.

use crate::{
    comments::Comment,
    metadata::{listing, QueryParams, RequestMetadata},
    pagination::Page,
    projects::ProjectObservation,
    resource::{encode_segment, Timestamp},
    Client, Result,
};
use chrono::NaiveDate;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// An observation as it appears in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleObservation {
    /// Observation id.
    pub id: i64,
    /// Observer's user id.
    pub user_id: Option<i64>,
    /// Observer's login.
    pub user_login: Option<String>,
    /// Free-text location as the observer typed it.
    pub place_guess: Option<String>,
    /// Free-text species name as the observer typed it.
    pub species_guess: Option<String>,
    /// Decimal degrees, sent as a string.
    pub latitude: Option<String>,
    /// Decimal degrees, sent as a string.
    pub longitude: Option<String>,
    /// Observation date as entered, unparsed.
    pub observed_on_string: Option<String>,
    /// Identified taxon.
    pub taxon_id: Option<i64>,
    /// Zone the observation time was recorded in.
    pub time_zone: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// A single observation with its photos, comments and project links inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullObservation {
    /// Observation id.
    pub id: i64,
    /// Observer's user id.
    pub user_id: Option<i64>,
    /// Free-text species name as the observer typed it.
    pub species_guess: Option<String>,
    /// Observer's notes.
    pub description: Option<String>,
    /// Decimal degrees, sent as a string.
    pub latitude: Option<String>,
    /// Decimal degrees, sent as a string.
    pub longitude: Option<String>,
    /// Observation date as entered, unparsed.
    pub observed_on_string: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    /// Attached photos, in display order.
    #[serde(rename = "observation_photos", default)]
    pub photos: Vec<ObservationPhoto>,
    /// Comments, in the order the server sent them.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Projects this observation belongs to.
    #[serde(rename = "project_observations", default)]
    pub projects: Vec<ProjectObservation>,
}

/// Link between an observation and one of its photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationPhoto {
    /// Link id.
    pub id: i64,
    /// Linked photo id.
    pub photo_id: Option<i64>,
    /// Linked observation id.
    pub observation_id: Option<i64>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    /// The photo itself.
    pub photo: Option<SimplePhoto>,
}

/// A photo in the sizes the site serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplePhoto {
    /// Photo id.
    pub id: i64,
    /// Largest size offered.
    pub large_url: Option<String>,
    pub medium_url: Option<String>,
    pub small_url: Option<String>,
    /// Square thumbnail.
    pub square_url: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// A page of observations.
pub type ObservationsPage = Page<SimpleObservation>;

/// Filters for [`Client::get_observations`].
#[derive(Debug, Clone, Default)]
pub struct GetObservationsOpt {
    /// 1-indexed page to fetch.
    pub page: Option<u32>,
    /// Records per page.
    pub per_page: Option<u32>,
    /// Only observations made on this date.
    pub on: Option<NaiveDate>,
    /// Only observations of this taxon.
    pub taxon_id: Option<i64>,
    /// Free-text search.
    pub q: Option<String>,
}

impl QueryParams for GetObservationsOpt {
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page".to_string(), per_page.to_string()));
        }
        if let Some(on) = self.on {
            params.push(("on".to_string(), on.format("%Y-%m-%d").to_string()));
        }
        if let Some(taxon_id) = self.taxon_id {
            params.push(("taxon_id".to_string(), taxon_id.to_string()));
        }
        if let Some(q) = &self.q {
            params.push(("q".to_string(), q.clone()));
        }
        params
    }
}

/// Fields for creating or editing an observation. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObservationFields {
    /// Free-text species name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species_guess: Option<String>,
    /// Identified taxon.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxon_id: Option<i64>,
    /// Observation date, e.g. `2016-05-01 10:00`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_on_string: Option<String>,
    /// Zone `observed_on_string` is in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    /// Notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_guess: Option<String>,
    /// Decimal degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Decimal degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Body of [`Client::add_observation`].
pub type AddObservationOpt = ObservationFields;

/// Body of [`Client::update_observation`].
pub type UpdateObservationOpt = ObservationFields;

impl Client {
    /// Lists observations, newest first.
    ///
    /// `GET /observations.json`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use naturalist::{Client, GetObservationsOpt};
    ///
    /// # async fn example() -> Result<(), naturalist::Error> {
    /// let client = Client::builder().build()?;
    /// let opt = GetObservationsOpt { page: Some(2), ..Default::default() };
    /// let page = client.get_observations(Some(&opt)).await?;
    /// println!("{} on this page, more: {}", page.len(), page.has_next_page());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_observations(&self, opt: Option<&GetObservationsOpt>) -> Result<ObservationsPage> {
        let response = self
            .get::<Vec<SimpleObservation>>(listing("/observations.json", opt))
            .await?;
        Ok(Page::new(response.data, response.paging))
    }

    /// Fetches one observation with its nested photos, comments and projects.
    ///
    /// `GET /observations/{id}.json`
    pub async fn get_observation(&self, id: i64) -> Result<FullObservation> {
        let metadata = RequestMetadata::new(Method::GET, format!("/observations/{}.json", id));
        Ok(self.get::<FullObservation>(metadata).await?.data)
    }

    /// Lists one user's observations.
    ///
    /// `GET /observations/{username}.json`
    pub async fn get_observations_by_username(&self, username: &str) -> Result<ObservationsPage> {
        let metadata = RequestMetadata::new(
            Method::GET,
            format!("/observations/{}.json", encode_segment(username)),
        );
        let response = self.get::<Vec<SimpleObservation>>(metadata).await?;
        Ok(Page::new(response.data, response.paging))
    }

    /// Creates an observation. Requires authentication.
    ///
    /// `POST /observations.json`, success on 200 or 201.
    pub async fn add_observation(&self, opt: &AddObservationOpt) -> Result<()> {
        let metadata = RequestMetadata::new(Method::POST, "/observations.json");
        self.execute::<_, serde_json::Value>(metadata, Some(opt), &[StatusCode::CREATED])
            .await?;
        Ok(())
    }

    /// Edits an observation. Requires authentication.
    ///
    /// `PUT /observations/{id}.json`, success on 200 or 204.
    pub async fn update_observation(&self, id: i64, opt: &UpdateObservationOpt) -> Result<()> {
        let metadata = RequestMetadata::new(Method::PUT, format!("/observations/{}.json", id));
        self.execute::<_, serde_json::Value>(metadata, Some(opt), &[StatusCode::NO_CONTENT])
            .await?;
        Ok(())
    }

    /// Deletes an observation. Requires authentication.
    ///
    /// `DELETE /observations/{id}.json`, success on 200 or 204.
    pub async fn delete_observation(&self, id: i64) -> Result<()> {
        let metadata = RequestMetadata::new(Method::DELETE, format!("/observations/{}.json", id));
        self.execute::<(), serde_json::Value>(metadata, None, &[StatusCode::NO_CONTENT])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_only_set_fields() {
        let opt = GetObservationsOpt {
            page: Some(3),
            on: NaiveDate::from_ymd_opt(2016, 5, 1),
            ..Default::default()
        };
        assert_eq!(
            opt.query_params(),
            vec![
                ("page".to_string(), "3".to_string()),
                ("on".to_string(), "2016-05-01".to_string()),
            ]
        );
        assert!(GetObservationsOpt::default().query_params().is_empty());
    }

    #[test]
    fn test_null_fields_decode_as_none() {
        let raw = r#"{
            "id": 1,
            "user_login": "kueda",
            "place_guess": null,
            "species_guess": null,
            "latitude": null,
            "longitude": null,
            "created_at": "2016-05-01T10:00:00-07:00"
        }"#;
        let observation: SimpleObservation = serde_json::from_str(raw).unwrap();
        assert_eq!(observation.user_login.as_deref(), Some("kueda"));
        assert!(observation.place_guess.is_none());
        assert!(observation.updated_at.is_none());
    }

    #[test]
    fn test_full_observation_keeps_nested_order() {
        let raw = r#"{
            "id": 9,
            "observation_photos": [
                {"id": 3, "photo_id": 30, "photo": {"id": 30, "square_url": "sq3"}},
                {"id": 1, "photo_id": 10, "photo": {"id": 10, "square_url": "sq1"}}
            ],
            "comments": [
                {"id": 5, "body": "second?", "user": {"id": 2, "login": "b"}},
                {"id": 4, "body": "first?", "user": {"id": 1, "login": "a"}}
            ],
            "project_observations": [
                {"id": 8, "observation_id": 9, "project_id": 100}
            ]
        }"#;
        let observation: FullObservation = serde_json::from_str(raw).unwrap();
        let photo_ids: Vec<_> = observation.photos.iter().map(|p| p.id).collect();
        assert_eq!(photo_ids, vec![3, 1]);
        let comment_ids: Vec<_> = observation.comments.iter().map(|c| c.id).collect();
        assert_eq!(comment_ids, vec![5, 4]);
        assert_eq!(observation.projects[0].project_id, Some(100));
        assert_eq!(
            observation.photos[0].photo.as_ref().unwrap().square_url.as_deref(),
            Some("sq3")
        );
    }

    #[test]
    fn test_null_comment_body_does_not_fail_observation() {
        let raw = r#"{
            "id": 9,
            "comments": [
                {"id": 5, "body": null, "user": {"id": 2, "login": "b"}},
                {"id": 4, "body": "first?"}
            ]
        }"#;
        let observation: FullObservation = serde_json::from_str(raw).unwrap();
        assert_eq!(observation.comments[0].body, "");
        assert_eq!(observation.comments[1].body, "first?");
    }

    #[test]
    fn test_observation_fields_skip_unset() {
        let opt = AddObservationOpt {
            species_guess: Some("Coyote".to_string()),
            latitude: Some(37.5),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&opt).unwrap(),
            serde_json::json!({"species_guess": "Coyote", "latitude": 37.5})
        );
    }
}
