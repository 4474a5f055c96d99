//! How to get to the restaurant

use crate::api::{ApiClient, ApiError};
use crate::model::TransportLocation;

pub const NO_TRANSPORT: &str = "No transport info available.";
pub const TRANSPORT_FAILED: &str = "Unable to load transport info.";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TransportView {
    #[default]
    Loading,
    Locations(Vec<TransportLocation>),
    Empty,
    Failed,
}

impl TransportView {
    pub fn from_result(result: Result<Vec<TransportLocation>, ApiError>) -> Self {
        match result {
            Ok(locations) if locations.is_empty() => Self::Empty,
            Ok(locations) => Self::Locations(locations),
            Err(e) => {
                tracing::warn!("Transport info failed: {}", e);
                Self::Failed
            }
        }
    }

    pub fn render_text(&self) -> Vec<String> {
        match self {
            Self::Loading => vec!["Loading...".to_string()],
            Self::Locations(locations) => locations
                .iter()
                .map(|loc| format!("{} – {}", loc.title, loc.description))
                .collect(),
            Self::Empty => vec![NO_TRANSPORT.to_string()],
            Self::Failed => vec![TRANSPORT_FAILED.to_string()],
        }
    }
}

/// Fetch and render; every failure collapses into the fixed error text
pub async fn load_transport_info(api: &ApiClient) -> TransportView {
    TransportView::from_result(api.transport_info().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn view_for(response: ResponseTemplate) -> TransportView {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/transport-info"))
            .respond_with(response)
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri()).unwrap();
        load_transport_info(&api).await
    }

    #[tokio::test]
    async fn test_locations_are_listed() {
        let view = view_for(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "locations": [
                {"title": "Metro (M2)", "description": "About 25 minutes."},
                {"title": "Campus", "description": "About 5 km."}
            ]
        })))
        .await;

        assert_eq!(
            view.render_text(),
            vec!["Metro (M2) – About 25 minutes.", "Campus – About 5 km."]
        );
    }

    #[tokio::test]
    async fn test_empty_list_shows_placeholder() {
        let view = view_for(ResponseTemplate::new(200).set_body_json(serde_json::json!({}))).await;
        assert_eq!(view, TransportView::Empty);
        assert_eq!(view.render_text(), vec![NO_TRANSPORT]);
    }

    #[tokio::test]
    async fn test_non_json_body_shows_error_text() {
        let view = view_for(ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;
        assert_eq!(view.render_text(), vec![TRANSPORT_FAILED]);
    }

    #[tokio::test]
    async fn test_server_error_shows_error_text() {
        let view = view_for(ResponseTemplate::new(500)).await;
        assert_eq!(view, TransportView::Failed);
    }
}
