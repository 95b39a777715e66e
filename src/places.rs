//! Places: named areas observations can be attributed to.

use crate::{
    metadata::{listing, QueryParams},
    pagination::Page,
    resource::{null_as_empty, Timestamp},
    Client, Result,
};
use serde::{Deserialize, Serialize};

/// A place as it appears in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Place id.
    pub id: i64,
    /// Short name; empty if the server sent none.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Name qualified by its enclosing places, e.g. `Oakland, CA, US`.
    pub display_name: Option<String>,
    /// URL slug.
    pub slug: Option<String>,
    /// Kind of place, e.g. `County`.
    pub place_type_name: Option<String>,
    /// Enclosing place.
    pub parent_id: Option<i64>,
    /// Centroid latitude, sent as a string.
    pub latitude: Option<String>,
    /// Centroid longitude, sent as a string.
    pub longitude: Option<String>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// A page of places.
pub type PlacesPage = Page<Place>;

/// Filters for [`Client::get_places`].
///
/// `latitude` and `longitude` select places containing that point.
#[derive(Debug, Clone, Default)]
pub struct GetPlacesOpt {
    /// 1-indexed page to fetch.
    pub page: Option<u32>,
    /// Records per page.
    pub per_page: Option<u32>,
    /// Decimal degrees.
    pub latitude: Option<f64>,
    /// Decimal degrees.
    pub longitude: Option<f64>,
    /// Free-text search.
    pub q: Option<String>,
}

impl QueryParams for GetPlacesOpt {
    fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page".to_string(), per_page.to_string()));
        }
        if let Some(latitude) = self.latitude {
            params.push(("latitude".to_string(), latitude.to_string()));
        }
        if let Some(longitude) = self.longitude {
            params.push(("longitude".to_string(), longitude.to_string()));
        }
        if let Some(q) = &self.q {
            params.push(("q".to_string(), q.clone()));
        }
        params
    }
}

impl Client {
    /// Lists places.
    ///
    /// `GET /places.json`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use naturalist::{Client, GetPlacesOpt};
    ///
    /// # async fn example(client: Client) -> Result<(), naturalist::Error> {
    /// let opt = GetPlacesOpt {
    ///     latitude: Some(37.77),
    ///     longitude: Some(-122.42),
    ///     ..Default::default()
    /// };
    /// for place in client.get_places(Some(&opt)).await? {
    ///     println!("{}", place.display_name.unwrap_or(place.name));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_places(&self, opt: Option<&GetPlacesOpt>) -> Result<PlacesPage> {
        let response = self.get::<Vec<Place>>(listing("/places.json", opt)).await?;
        Ok(Page::new(response.data, response.paging))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_name_decodes_as_empty() {
        let place: Place =
            serde_json::from_str(r#"{"id": 14, "name": null, "display_name": "CA, US"}"#).unwrap();
        assert_eq!(place.name, "");
        assert_eq!(place.display_name.as_deref(), Some("CA, US"));
    }

    #[test]
    fn test_coordinates_in_query() {
        let opt = GetPlacesOpt {
            latitude: Some(37.5),
            longitude: Some(-122.25),
            ..Default::default()
        };
        assert_eq!(
            opt.query_params(),
            vec![
                ("latitude".to_string(), "37.5".to_string()),
                ("longitude".to_string(), "-122.25".to_string()),
            ]
        );
    }
}
