//! Endpoint paths, verbs and bodies against a mock server.

use http::StatusCode;
use naturalist::{
    AddCommentOpt, AddObservationOpt, Client, CommentParentType, Error, GetPlacesOpt,
    GetProjectsOpt, UpdateObservationOpt,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(server.uri())
        .unwrap()
        .bearer_token("tok")
        .unwrap()
        .build()
        .unwrap()
}

fn project_json(id: i64, slug: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": "The Sonoran Desert",
        "slug": slug,
        "description": "Plants and animals of the Sonoran Desert",
        "user_id": 3,
        "icon_url": null,
        "created_at": "2012-03-12T15:24:11-07:00",
        "updated_at": "2016-01-02T08:00:00-07:00",
        "project_observations_count": 1200,
        "project_type": "contest"
    })
}

#[tokio::test]
async fn test_add_comment_created_without_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/comments.json"))
        .and(body_json(json!({
            "parent_type": "Observation",
            "parent_id": 100,
            "body": "Lovely shot"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .add_comment(&AddCommentOpt {
            parent_type: CommentParentType::Observation,
            parent_id: 100,
            body: "Lovely shot".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_add_comment_validation_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/comments.json"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"errors": ["Body can't be blank"]})),
        )
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .add_comment(&AddCommentOpt {
            parent_type: CommentParentType::Observation,
            parent_id: 100,
            body: String::new(),
        })
        .await;

    match result {
        Err(Error::HttpError {
            status,
            provider_error,
            ..
        }) => {
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            let provider_error = provider_error.unwrap();
            assert_eq!(provider_error.messages(), vec!["Body can't be blank".to_string()]);
        }
        other => panic!("Expected HttpError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_comment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/comments/42.json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server).delete_comment(42).await.unwrap();
}

#[tokio::test]
async fn test_get_observation_with_nested_records() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/observations/9.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9,
            "species_guess": "Coyote",
            "description": null,
            "observation_photos": [
                {"id": 2, "photo_id": 20, "photo": {"id": 20, "medium_url": "m2"}},
                {"id": 1, "photo_id": 10, "photo": {"id": 10, "medium_url": "m1"}}
            ],
            "comments": [
                {"id": 5, "body": "Nice", "user": {"id": 2, "login": "b", "name": null}}
            ],
            "project_observations": []
        })))
        .mount(&mock_server)
        .await;

    let observation = client_for(&mock_server).get_observation(9).await.unwrap();

    assert_eq!(observation.species_guess.as_deref(), Some("Coyote"));
    assert!(observation.description.is_none());
    let photo_ids: Vec<_> = observation.photos.iter().map(|p| p.id).collect();
    assert_eq!(photo_ids, vec![2, 1]);
    assert_eq!(observation.comments[0].user.as_ref().unwrap().login, "b");
    assert!(observation.projects.is_empty());
}

#[tokio::test]
async fn test_get_observations_by_username() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/observations/kueda.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Total-Entries", "2")
                .insert_header("X-Per-Page", "30")
                .insert_header("X-Page", "1")
                .set_body_json(json!([{"id": 2}, {"id": 1}])),
        )
        .mount(&mock_server)
        .await;

    let page = client_for(&mock_server)
        .get_observations_by_username("kueda")
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.total_pages(), Some(1));
    assert!(!page.has_next_page());
}

#[tokio::test]
async fn test_observations_without_filters_send_no_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/observations.json"))
        .and(query_param_is_missing("page"))
        .and(query_param_is_missing("per_page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = client_for(&mock_server).get_observations(None).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_add_update_delete_observation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/observations.json"))
        .and(body_json(json!({"species_guess": "Coyote", "latitude": 37.5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 11}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/observations/11.json"))
        .and(body_json(json!({"description": "Trotting along the ridge"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/observations/11.json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    client
        .add_observation(&AddObservationOpt {
            species_guess: Some("Coyote".to_string()),
            latitude: Some(37.5),
            ..Default::default()
        })
        .await
        .unwrap();

    client
        .update_observation(
            11,
            &UpdateObservationOpt {
                description: Some("Trotting along the ridge".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    client.delete_observation(11).await.unwrap();
}

#[tokio::test]
async fn test_get_project_by_slug_and_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/the-sonoran-desert.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(project_json(7, "the-sonoran-desert")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/7.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(project_json(7, "the-sonoran-desert")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let by_slug = client.get_project("the-sonoran-desert").await.unwrap();
    let by_id = client.get_project(7).await.unwrap();

    assert_eq!(by_slug, by_id);
    assert_eq!(by_slug.project.title, "The Sonoran Desert");
    assert_eq!(by_slug.project_observations_count, Some(1200));
    assert!(by_slug.project.icon_url.is_none());
}

#[tokio::test]
async fn test_get_project_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/missing.json"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Not found"})))
        .mount(&mock_server)
        .await;

    let error = client_for(&mock_server)
        .get_project("missing")
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(
        error.provider_error().and_then(|e| e.error.clone()).as_deref(),
        Some("Not found")
    );
}

#[tokio::test]
async fn test_get_projects_and_by_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects.json"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            project_json(7, "the-sonoran-desert"),
            project_json(3, "bay-area-birds")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/user/kueda.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([project_json(3, "bay-area-birds")])),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let opt = GetProjectsOpt {
        per_page: Some(2),
        ..Default::default()
    };
    let slugs: Vec<_> = client
        .get_projects(Some(&opt))
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.slug.unwrap_or_default())
        .collect();
    assert_eq!(slugs, vec!["the-sonoran-desert", "bay-area-birds"]);

    let mine = client.get_projects_by_login("kueda").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine.records[0].id, 3);
}

#[tokio::test]
async fn test_project_membership() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/bay-area-birds/members.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "project_id": 3, "user_id": 8, "role": "curator",
             "user": {"id": 8, "login": "owl"}},
            {"id": 2, "project_id": 3, "user_id": 9, "role": null,
             "user": {"id": 9, "login": "wren"}}
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/projects/bay-area-birds/join.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 3})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/projects/3/leave.json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let members = client.get_project_members("bay-area-birds").await.unwrap();
    assert_eq!(members.records[0].role.as_deref(), Some("curator"));
    assert!(members.records[1].role.is_none());

    client.join_project("bay-area-birds").await.unwrap();
    client.leave_project(3).await.unwrap();
}

#[tokio::test]
async fn test_add_observation_to_project() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project_observations.json"))
        .and(body_json(json!({"project_id": 3, "observation_id": 11})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .add_observation_to_project(3, 11)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_places_by_coordinates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/places.json"))
        .and(query_param("latitude", "37.77"))
        .and(query_param("longitude", "-122.42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "San Francisco", "display_name": "San Francisco, CA, US",
             "latitude": "37.77", "longitude": "-122.42"},
            {"id": 14, "name": "California", "display_name": null}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let opt = GetPlacesOpt {
        latitude: Some(37.77),
        longitude: Some(-122.42),
        ..Default::default()
    };
    let places = client_for(&mock_server).get_places(Some(&opt)).await.unwrap();

    let names: Vec<_> = places.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["San Francisco", "California"]);
    assert!(places.records[1].display_name.is_none());
}

#[tokio::test]
async fn test_current_user_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/edit.json"))
        .respond_with(ResponseTemplate::new(401).set_body_string(""))
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .build()
        .unwrap();

    let error = client.current_user().await.unwrap_err();
    assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(error.provider_error().is_none());
    assert!(!error.is_retryable());
}
