//! Browses public data: paged observations, a project and nearby places.
//!
//! This demo shows how to:
//! - Walk listing pages using the pagination headers
//! - Address a project by slug
//! - Inspect the errors a call can fail with
//!
//! Set `NATURALIST_TOKEN` to browse as a signed-in user.
//!
//! Run with: `cargo run --example browse`

use naturalist::{Client, Error, GetObservationsOpt, GetPlacesOpt};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("naturalist=info,browse=info")
        .init();

    let mut builder = Client::builder()
        .auto_retry(Duration::from_secs(2), 5)
        .timeout(Duration::from_secs(30));
    if let Ok(token) = std::env::var("NATURALIST_TOKEN") {
        builder = builder.bearer_token(token)?;
    }
    let client = builder.build()?;

    println!("=== Paged observations ===");
    let mut opt = GetObservationsOpt {
        per_page: Some(5),
        q: Some("coyote".to_string()),
        ..Default::default()
    };
    for _ in 0..2 {
        let page = client.get_observations(Some(&opt)).await?;
        if let Some(paging) = page.paging {
            println!(
                "Page {} of {} ({} total)",
                paging.page,
                paging.total_pages(),
                paging.total_entries
            );
        }
        for observation in &page {
            println!(
                "  #{} {} by {}",
                observation.id,
                observation.species_guess.as_deref().unwrap_or("(unknown)"),
                observation.user_login.as_deref().unwrap_or("?")
            );
        }
        match page.next_page() {
            Some(next) => opt.page = Some(next),
            None => break,
        }
    }
    println!();

    println!("=== Project by slug ===");
    let project = client.get_project("the-sonoran-desert").await?;
    println!(
        "{}: {} observations",
        project.project.title,
        project.project_observations_count.unwrap_or(0)
    );
    println!();

    println!("=== Places around San Francisco ===");
    let places = client
        .get_places(Some(&GetPlacesOpt {
            latitude: Some(37.77),
            longitude: Some(-122.42),
            ..Default::default()
        }))
        .await?;
    for place in places {
        println!("  {}", place.display_name.unwrap_or(place.name));
    }
    println!();

    println!("=== Handling errors ===");
    match client.get_project("no-such-project-anywhere").await {
        Ok(project) => println!("Unexpected: {:?}", project.project.title),
        Err(Error::HttpError {
            status,
            provider_error,
            ..
        }) => {
            println!("HTTP {}", status);
            if let Some(provider_error) = provider_error {
                println!("  Provider said: {:?}", provider_error.messages());
            }
        }
        Err(Error::MaxRetriesExceeded { attempts, .. }) => {
            println!("Still throttled after {} attempts", attempts);
        }
        Err(e) => println!("Other error: {} (retryable: {})", e, e.is_retryable()),
    }

    Ok(())
}
