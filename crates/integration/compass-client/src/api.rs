//! Typed endpoints of the catalog API.

use crate::authorizer::{RequestAuthorizer, CURRENT_USER_PATH};
use crate::request::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::{ClientError, Result};
use compass_core::{
    ApiResponse, Comment, CommentType, CurrentUser, ErrorBody, NewComment, NewRating, Page,
    PageRequest, PagedResponse, Rating, RatingSummary, Solution,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Catalog API client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    authorizer: RequestAuthorizer,
}

impl ApiClient {
    /// Endpoints are rooted at the authorizer's API base.
    pub fn new(transport: Arc<dyn Transport>, authorizer: RequestAuthorizer) -> Self {
        Self {
            transport,
            authorizer,
        }
    }

    pub fn api_base(&self) -> &str {
        self.authorizer.api_base()
    }

    pub fn authorizer(&self) -> &RequestAuthorizer {
        &self.authorizer
    }

    // ============== Solutions ==============

    /// `GET /solutions/{slug}`
    pub async fn solution(&self, slug: &str) -> Result<Solution> {
        let url = self.endpoint(&["solutions", slug])?;
        let resp = self.send(HttpRequest::get(url)).await?;
        Ok(resp.json::<ApiResponse<Solution>>()?.into_data()?)
    }

    /// `GET /solutions/my/?skip&limit`
    pub async fn my_solutions(&self, page: PageRequest) -> Result<Page<Solution>> {
        let mut url = self.endpoint_url(&["solutions", "my", ""])?;
        append_page(&mut url, page);
        let resp = self.send(HttpRequest::get(url.as_str())).await?;
        Ok(resp.json::<PagedResponse<Solution>>()?.into_page()?)
    }

    // ============== Comments ==============

    /// `GET /solutions/{slug}/comments?skip&limit&type`
    pub async fn comments(
        &self,
        slug: &str,
        comment_type: CommentType,
        page: PageRequest,
    ) -> Result<Page<Comment>> {
        let mut url = self.endpoint_url(&["solutions", slug, "comments"])?;
        append_page(&mut url, page);
        url.query_pairs_mut()
            .append_pair("type", comment_type.as_query());

        let resp = self.send(HttpRequest::get(url.as_str())).await?;
        Ok(resp.json::<PagedResponse<Comment>>()?.into_page()?)
    }

    /// `POST /solutions/{slug}/comments`
    pub async fn post_comment(&self, slug: &str, comment: &NewComment) -> Result<()> {
        let url = self.endpoint(&["solutions", slug, "comments"])?;
        let resp = self.send(HttpRequest::post(url).json(comment)?).await?;
        ensure_success(&resp)
    }

    // ============== Ratings ==============

    /// `GET /solutions/{slug}/ratings?skip&limit`
    pub async fn ratings(&self, slug: &str, page: PageRequest) -> Result<Page<Rating>> {
        let mut url = self.endpoint_url(&["solutions", slug, "ratings"])?;
        append_page(&mut url, page);
        let resp = self.send(HttpRequest::get(url.as_str())).await?;
        Ok(resp.json::<PagedResponse<Rating>>()?.into_page()?)
    }

    /// `POST /solutions/{slug}/ratings`
    pub async fn post_rating(&self, slug: &str, rating: &NewRating) -> Result<()> {
        let url = self.endpoint(&["solutions", slug, "ratings"])?;
        let resp = self.send(HttpRequest::post(url).json(rating)?).await?;
        ensure_success(&resp)
    }

    /// `GET /solutions/{slug}/ratings/summary`
    pub async fn rating_summary(&self, slug: &str) -> Result<RatingSummary> {
        let url = self.endpoint(&["solutions", slug, "ratings", "summary"])?;
        let resp = self.send(HttpRequest::get(url)).await?;
        Ok(resp.json::<ApiResponse<RatingSummary>>()?.into_data()?)
    }

    /// `GET /solutions/{slug}/ratings/me`; `None` when the caller has not rated
    pub async fn my_rating(&self, slug: &str) -> Result<Option<Rating>> {
        let url = self.endpoint(&["solutions", slug, "ratings", "me"])?;
        match self.send(HttpRequest::get(url)).await {
            Ok(resp) => Ok(Some(resp.json::<ApiResponse<Rating>>()?.into_data()?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ============== Users ==============

    /// `GET /users/me`
    pub async fn current_user(&self) -> Result<CurrentUser> {
        let url = format!("{}{}", self.api_base(), CURRENT_USER_PATH);
        let resp = self.send(HttpRequest::get(url)).await?;
        Ok(resp.json::<ApiResponse<CurrentUser>>()?.into_data()?)
    }

    // ============== Plumbing ==============

    /// Authorize, execute, and turn non-2xx statuses into errors
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let request = self.authorizer.authorize(&request);
        debug!(method = %request.method, url = %request.url, "dispatching request");

        let resp = self.transport.execute(request).await?;
        if resp.is_success() {
            return Ok(resp);
        }

        let detail = ErrorBody::parse(&resp.body).message();
        warn!(status = resp.status, detail = ?detail, "request failed");
        Err(ClientError::Status {
            status: resp.status,
            detail,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<String> {
        Ok(self.endpoint_url(segments)?.into())
    }

    /// API base plus percent-encoded path segments
    fn endpoint_url(&self, segments: &[&str]) -> Result<url::Url> {
        let mut url = url::Url::parse(self.api_base())
            .map_err(|e| ClientError::InvalidRequest(format!("api base: {e}")))?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidRequest("api base cannot hold a path".into()))?;
            path.pop_if_empty();
            for segment in segments {
                if segment.is_empty() {
                    path.push("");
                } else {
                    check_segment(segment)?;
                    path.push(segment);
                }
            }
        }
        Ok(url)
    }
}

fn check_segment(segment: &str) -> Result<()> {
    if segment.trim().is_empty() || segment == "." || segment == ".." {
        return Err(ClientError::InvalidRequest(format!(
            "invalid path segment '{segment}'"
        )));
    }
    Ok(())
}

fn append_page(url: &mut url::Url, page: PageRequest) {
    url.query_pairs_mut()
        .append_pair("skip", &page.skip.to_string())
        .append_pair("limit", &page.limit.to_string());
}

/// Accept `{success: true}`, `{status: "success"}` or an empty body
fn ensure_success(resp: &HttpResponse) -> Result<()> {
    if resp.body.trim().is_empty() {
        return Ok(());
    }
    let envelope: ApiResponse<serde_json::Value> = resp.json()?;
    if envelope.is_success() {
        Ok(())
    } else {
        Err(ClientError::Api(compass_core::Error::Unsuccessful(
            envelope.status.unwrap_or_else(|| "success=false".to_string()),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Method, AUTHORIZATION};
    use crate::testing::ScriptedTransport;
    use crate::token::MemoryTokenStore;
    use serde_json::json;

    const BASE: &str = "http://api.test/api";

    fn client(transport: Arc<ScriptedTransport>, token: Option<&str>) -> ApiClient {
        let store = match token {
            Some(t) => MemoryTokenStore::with_entry("token", t),
            None => MemoryTokenStore::new(),
        };
        let authorizer = RequestAuthorizer::new(BASE, Arc::new(store), "token");
        ApiClient::new(transport, authorizer)
    }

    #[tokio::test]
    async fn test_solution_endpoint() {
        let transport = Arc::new(ScriptedTransport::new(|req| {
            assert_eq!(req.url, "http://api.test/api/solutions/kafka");
            ScriptedTransport::reply(200, json!({"success": true, "data": {"slug": "kafka", "name": "Kafka"}}))
        }));
        let api = client(transport.clone(), Some("abc"));

        let solution = api.solution("kafka").await.unwrap();
        assert_eq!(solution.name, "Kafka");
        // Plain GET: no token
        assert_eq!(transport.requests()[0].header(AUTHORIZATION), None);
    }

    #[tokio::test]
    async fn test_comments_query_parameters() {
        let transport = Arc::new(ScriptedTransport::new(|req| {
            assert_eq!(req.path().as_deref(), Some("/api/solutions/kafka/comments"));
            assert_eq!(req.query_param("skip").as_deref(), Some("20"));
            assert_eq!(req.query_param("limit").as_deref(), Some("10"));
            assert_eq!(req.query_param("type").as_deref(), Some("OFFICIAL"));
            ScriptedTransport::reply(
                200,
                json!({"success": true, "data": [{"content": "note"}], "total": 21}),
            )
        }));
        let api = client(transport, None);

        let page = api
            .comments("kafka", CommentType::Official, PageRequest::for_page(2))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 21);
    }

    #[tokio::test]
    async fn test_post_comment_carries_token_and_body() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            ScriptedTransport::reply(201, json!({"success": true}))
        }));
        let api = client(transport.clone(), Some("abc"));

        api.post_comment("kafka", &NewComment::new("hello").unwrap())
            .await
            .unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.header(AUTHORIZATION), Some("Bearer abc"));
        assert_eq!(sent.body.as_deref(), Some(r#"{"content":"hello"}"#));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_status_error() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            ScriptedTransport::reply(401, json!({"detail": "Not authenticated"}))
        }));
        let api = client(transport, None);

        let err = api
            .post_comment("kafka", &NewComment::new("hello").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.detail(), Some("Not authenticated"));
    }

    #[tokio::test]
    async fn test_post_rating_unsuccessful_envelope() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            ScriptedTransport::reply(200, json!({"success": false}))
        }));
        let api = client(transport, Some("abc"));

        let err = api
            .post_rating("kafka", &NewRating::new(4, "").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api(_)));
    }

    #[tokio::test]
    async fn test_my_rating_not_found_is_none() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            ScriptedTransport::reply(404, json!({"detail": "Rating not found"}))
        }));
        let api = client(transport, Some("abc"));
        assert_eq!(api.my_rating("kafka").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_current_user_and_my_solutions_authorized() {
        let transport = Arc::new(ScriptedTransport::new(|req| {
            if req.url.ends_with("/users/me") {
                ScriptedTransport::reply(200, json!({"success": true, "data": {"username": "ann"}}))
            } else {
                ScriptedTransport::reply(200, json!({"success": true, "data": [], "total": 0}))
            }
        }));
        let api = client(transport.clone(), Some("abc"));

        assert_eq!(api.current_user().await.unwrap().username, "ann");
        api.my_solutions(PageRequest::first()).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "http://api.test/api/users/me");
        assert!(requests[1].url.contains("/solutions/my/"));
        assert!(requests
            .iter()
            .all(|r| r.header(AUTHORIZATION) == Some("Bearer abc")));
    }

    #[tokio::test]
    async fn test_slug_is_percent_encoded() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            ScriptedTransport::reply(200, json!({"success": true, "data": {"slug": "a b"}}))
        }));
        let api = client(transport.clone(), None);
        api.solution("a b").await.unwrap();
        assert_eq!(transport.requests()[0].url, "http://api.test/api/solutions/a%20b");

        assert!(matches!(
            api.solution("..").await,
            Err(ClientError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Err(ClientError::Transport("connection refused".into()))
        }));
        let api = client(transport, None);
        let err = api.ratings("kafka", PageRequest::first()).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_writes_authorized_under_rewritten_base() {
        for base in [
            "http://API.test/api",
            "http://api.test:80/api",
            "http://api.test/api/v1/../v1",
        ] {
            let transport = Arc::new(ScriptedTransport::new(|_| {
                ScriptedTransport::reply(201, json!({"success": true}))
            }));
            let store = Arc::new(MemoryTokenStore::with_entry("token", "abc"));
            let api = ApiClient::new(
                transport.clone(),
                RequestAuthorizer::new(base, store, "token"),
            );

            api.post_comment("kafka", &NewComment::new("hello").unwrap())
                .await
                .unwrap();

            let sent = &transport.requests()[0];
            assert!(sent.url.ends_with("/solutions/kafka/comments"), "{base}");
            assert_eq!(sent.header(AUTHORIZATION), Some("Bearer abc"), "{base}");
        }
    }
}

