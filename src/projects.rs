//! Projects, their members and their observations.

use crate::{
    metadata::{listing, QueryParams, RequestMetadata},
    pagination::Page,
    resource::{encode_segment, null_as_empty, ResourceRef, SimpleUser, Timestamp},
    Client, Result,
};
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

/// A project as it appears in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleProject {
    /// Project id.
    pub id: i64,
    /// Project name; empty if the server sent none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// URL slug, usable in place of the id.
    pub slug: Option<String>,
    /// Description, may contain HTML.
    pub description: Option<String>,
    /// Terms members agree to when joining.
    pub terms: Option<String>,
    /// Owner of the project.
    pub user_id: Option<i64>,
    /// Project icon.
    pub icon_url: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// A single project with its counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullProject {
    /// The fields shared with listings.
    #[serde(flatten)]
    pub project: SimpleProject,
    /// Number of observations added to the project.
    pub project_observations_count: Option<i64>,
    /// Project kind, e.g. `contest` or `bioblitz`.
    pub project_type: Option<String>,
}

/// Link between a project and an observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectObservation {
    /// Link id.
    pub id: i64,
    /// Linked project id.
    pub project_id: Option<i64>,
    /// Linked observation id.
    pub observation_id: Option<i64>,
    /// Caller-supplied tag for the link.
    pub tracking_code: Option<String>,
    /// Identification a curator chose for this project.
    pub curator_identification_id: Option<i64>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// A user's membership in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    /// Membership id.
    pub id: i64,
    /// Project id.
    pub project_id: Option<i64>,
    /// Member's user id.
    pub user_id: Option<i64>,
    /// `curator`, `manager`, or absent for plain members.
    pub role: Option<String>,
    /// Observations the member added to the project.
    pub observations_count: Option<i64>,
    /// Distinct taxa among those observations.
    pub taxa_count: Option<i64>,
    /// The member.
    pub user: Option<SimpleUser>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// A page of projects.
pub type ProjectsPage = Page<SimpleProject>;

/// A page of project members.
pub type ProjectMembersPage = Page<ProjectMember>;

/// Filters for [`Client::get_projects`].
#[derive(Debug, Clone, Default)]
pub struct GetProjectsOpt {
    /// 1-indexed page to fetch.
    pub page: Option<u32>,
    /// Records per page.
    pub per_page: Option<u32>,
}

impl QueryParams for GetProjectsOpt {
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page".to_string(), per_page.to_string()));
        }
        params
    }
}

#[derive(Serialize)]
struct AddObservationToProjectBody {
    project_id: i64,
    observation_id: i64,
}

impl Client {
    /// Lists projects.
    ///
    /// `GET /projects.json`
    pub async fn get_projects(&self, opt: Option<&GetProjectsOpt>) -> Result<ProjectsPage> {
        let response = self
            .get::<Vec<SimpleProject>>(listing("/projects.json", opt))
            .await?;
        Ok(Page::new(response.data, response.paging))
    }

    /// Fetches one project by id or slug.
    ///
    /// `GET /projects/{id|slug}.json`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # async fn example(client: naturalist::Client) -> Result<(), naturalist::Error> {
    /// let by_slug = client.get_project("the-sonoran-desert").await?;
    /// let by_id = client.get_project(by_slug.project.id).await?;
    /// assert_eq!(by_slug.project.title, by_id.project.title);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_project(&self, project: impl Into<ResourceRef>) -> Result<FullProject> {
        let metadata = RequestMetadata::new(
            Method::GET,
            format!("/projects/{}.json", project.into().path_segment()),
        );
        Ok(self.get::<FullProject>(metadata).await?.data)
    }

    /// Lists the projects a user belongs to.
    ///
    /// `GET /projects/user/{login}.json`
    pub async fn get_projects_by_login(&self, login: &str) -> Result<ProjectsPage> {
        let metadata = RequestMetadata::new(
            Method::GET,
            format!("/projects/user/{}.json", encode_segment(login)),
        );
        let response = self.get::<Vec<SimpleProject>>(metadata).await?;
        Ok(Page::new(response.data, response.paging))
    }

    /// Lists a project's members.
    ///
    /// `GET /projects/{id|slug}/members.json`
    pub async fn get_project_members(
        &self,
        project: impl Into<ResourceRef>,
    ) -> Result<ProjectMembersPage> {
        let metadata = RequestMetadata::new(
            Method::GET,
            format!("/projects/{}/members.json", project.into().path_segment()),
        );
        let response = self.get::<Vec<ProjectMember>>(metadata).await?;
        Ok(Page::new(response.data, response.paging))
    }

    /// Joins a project as the authenticated user.
    ///
    /// `POST /projects/{id|slug}/join.json`, success on 200 or 201.
    pub async fn join_project(&self, project: impl Into<ResourceRef>) -> Result<()> {
        let metadata = RequestMetadata::new(
            Method::POST,
            format!("/projects/{}/join.json", project.into().path_segment()),
        );
        self.execute::<(), serde_json::Value>(metadata, None, &[StatusCode::CREATED])
            .await?;
        Ok(())
    }

    /// Leaves a project as the authenticated user.
    ///
    /// `DELETE /projects/{id|slug}/leave.json`, success on 200 or 204.
    pub async fn leave_project(&self, project: impl Into<ResourceRef>) -> Result<()> {
        let metadata = RequestMetadata::new(
            Method::DELETE,
            format!("/projects/{}/leave.json", project.into().path_segment()),
        );
        self.execute::<(), serde_json::Value>(metadata, None, &[StatusCode::NO_CONTENT])
            .await?;
        Ok(())
    }

    /// Adds an observation to a project.
    ///
    /// `POST /project_observations.json`, success on 200 or 201.
    pub async fn add_observation_to_project(
        &self,
        project_id: i64,
        observation_id: i64,
    ) -> Result<()> {
        let metadata = RequestMetadata::new(Method::POST, "/project_observations.json");
        let body = AddObservationToProjectBody {
            project_id,
            observation_id,
        };
        self.execute::<_, serde_json::Value>(metadata, Some(&body), &[StatusCode::CREATED])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_project_flattens_simple_fields() {
        let raw = serde_json::json!({
            "id": 7,
            "title": "The Sonoran Desert",
            "slug": "the-sonoran-desert",
            "user_id": 3,
            "icon_url": "https://example.org/icon.png",
            "terms": "",
            "project_observations_count": 1200,
            "project_type": "contest",
            "created_at": "2012-04-01T00:00:00-07:00"
        });
        let project: FullProject = serde_json::from_value(raw).unwrap();
        assert_eq!(project.project.id, 7);
        assert_eq!(project.project.user_id, Some(3));
        assert_eq!(project.project.slug.as_deref(), Some("the-sonoran-desert"));
        assert_eq!(project.project_observations_count, Some(1200));
        assert_eq!(project.project_type.as_deref(), Some("contest"));
    }

    #[test]
    fn test_null_title_decodes_as_empty() {
        let project: SimpleProject =
            serde_json::from_value(serde_json::json!({"id": 1, "title": null})).unwrap();
        assert_eq!(project.title, "");

        let project: FullProject = serde_json::from_value(serde_json::json!({
            "id": 2,
            "title": null,
            "project_type": "bioblitz"
        }))
        .unwrap();
        assert_eq!(project.project.title, "");
        assert_eq!(project.project_type.as_deref(), Some("bioblitz"));
    }

    #[test]
    fn test_projects_query_params() {
        let opt = GetProjectsOpt {
            page: Some(4),
            per_page: None,
        };
        assert_eq!(opt.query_params(), vec![("page".to_string(), "4".to_string())]);
    }
}
