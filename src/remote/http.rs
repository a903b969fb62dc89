use crate::metrics;
use crate::remote::structs::{
    Comment, CommentId, CommentPatch, ListPosts, NewComment, NewUser, Post, PostId, User, UserId,
};
use crate::twoface::{Cause, Describe, DescribeErr, ExternalError, Fallible};
use actix_web::http::{header, StatusCode};
use actix_web::web::Bytes;
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use awc::ClientRequest;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Largest response body we'll read from the remote service.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

const UNAVAILABLE: &str = "The post service is unavailable";

/// An implementation of remote::Client that speaks JSON over HTTP.
#[derive(Clone)]
pub struct Client {
    http: awc::Client,
    base: Url,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, anyhow::Error> {
        let mut base = Url::parse(base_url)?;
        // Url::join replaces the last path segment unless the base ends in a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = awc::Client::builder()
            .timeout(timeout)
            .add_default_header((header::ACCEPT, "application/json"))
            .finish();
        Ok(Self { http, base })
    }

    fn url(&self, path: &str) -> Fallible<Url> {
        self.base
            .join(path)
            .describe_err(ExternalError::default())
    }

    /// Send a request, returning the body of a successful response, or `None` for a 404.
    async fn exchange<B: Serialize>(
        &self,
        resource: &'static str,
        request: ClientRequest,
        body: Option<&B>,
    ) -> Fallible<Option<Bytes>> {
        debug!(resource, method = %request.get_method(), url = %request.get_uri(), "calling remote API");
        let sent = match body {
            Some(body) => request.send_json(body),
            None => request.send(),
        }
        .await;
        let result: anyhow::Result<Option<Bytes>> = async {
            // awc's errors aren't Send, so they're flattened to text here.
            let mut response = sent.map_err(|e| anyhow!("{} request failed: {}", resource, e))?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                bail!("{} request answered {}", resource, status);
            }
            let bytes = response
                .body()
                .limit(BODY_LIMIT)
                .await
                .map_err(|e| anyhow!("reading {} response: {}", resource, e))?;
            Ok(Some(bytes))
        }
        .await;
        metrics::UPSTREAM_REQUESTS
            .with_label_values(&[resource, if result.is_ok() { "ok" } else { "err" }])
            .inc();
        result.upstream(UNAVAILABLE)
    }

    async fn get<T: DeserializeOwned>(&self, resource: &'static str, url: Url) -> Fallible<Option<T>> {
        let request = self.http.get(url.as_str());
        match self.exchange::<()>(resource, request, None).await? {
            Some(bytes) => decode(resource, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Like `get`, but a 404 is an error because the resource must exist.
    async fn send<T: DeserializeOwned, B: Serialize>(
        &self,
        resource: &'static str,
        request: ClientRequest,
        body: Option<&B>,
    ) -> Fallible<T> {
        let Some(bytes) = self.exchange(resource, request, body).await? else {
            return Err(anyhow!("{} not found", resource)
                .describe(ExternalError::new(Cause::NotFound, "Not found")));
        };
        decode(resource, &bytes)
    }
}

fn decode<T: DeserializeOwned>(resource: &'static str, bytes: &[u8]) -> Fallible<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| anyhow!("decoding {} response: {}", resource, e))
        .upstream(UNAVAILABLE)
}

/// The remote service only echoes the id of things it creates.
#[derive(Deserialize)]
struct Created {
    #[serde(default)]
    id: u64,
}

#[async_trait(?Send)]
impl super::Client for Client {
    async fn list_posts(&self, params: ListPosts) -> Fallible<Vec<Post>> {
        let mut url = self.url("posts")?;
        if let Some(user_id) = params.user_id {
            url.query_pairs_mut()
                .append_pair("userId", &user_id.to_string());
        }
        let mut posts: Vec<Post> = self.get("posts", url).await?.unwrap_or_default();
        if let Some(limit) = params.limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> Fallible<Option<Post>> {
        let url = self.url(&format!("posts/{}", id))?;
        self.get("post", url).await
    }

    async fn list_users(&self) -> Fallible<Vec<User>> {
        let url = self.url("users")?;
        Ok(self.get("users", url).await?.unwrap_or_default())
    }

    async fn get_user(&self, id: UserId) -> Fallible<Option<User>> {
        let url = self.url(&format!("users/{}", id))?;
        self.get("user", url).await
    }

    async fn create_user(&self, new_user: NewUser) -> Fallible<User> {
        let url = self.url("users")?;
        let request = self.http.post(url.as_str());
        let created: Created = self.send("users", request, Some(&new_user)).await?;
        Ok(User {
            id: created.id,
            name: new_user.name,
            username: new_user.username,
            email: new_user.email,
            phone: None,
            website: None,
            address: None,
            company: None,
        })
    }

    async fn comments_for_post(&self, post_id: PostId) -> Fallible<Vec<Comment>> {
        let url = self.url(&format!("posts/{}/comments", post_id))?;
        Ok(self.get("comments", url).await?.unwrap_or_default())
    }

    async fn get_comment(&self, id: CommentId) -> Fallible<Option<Comment>> {
        let url = self.url(&format!("comments/{}", id))?;
        self.get("comment", url).await
    }

    async fn create_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let url = self.url("comments")?;
        let request = self.http.post(url.as_str());
        let created: Created = self.send("comments", request, Some(&new_comment)).await?;
        Ok(Comment {
            id: created.id,
            post_id: new_comment.post_id,
            name: new_comment.name,
            email: new_comment.email,
            body: new_comment.body,
            user_id: new_comment.user_id,
            created_at: Some(chrono::Utc::now()),
        })
    }

    async fn update_comment(&self, mut comment: Comment, patch: CommentPatch) -> Fallible<Comment> {
        let url = self.url(&format!("comments/{}", comment.id))?;
        let request = self.http.put(url.as_str());
        let _: serde_json::Value = self.send("comment", request, Some(&patch)).await?;
        comment.apply(patch);
        Ok(comment)
    }

    async fn delete_comment(&self, id: CommentId) -> Fallible<()> {
        let url = self.url(&format!("comments/{}", id))?;
        let request = self.http.delete(url.as_str());
        self.exchange::<()>("comment", request, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::Client as _;
    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixture_posts() -> serde_json::Value {
        json!([
            {"id": 1, "title": "First", "body": "One", "userId": 1, "createdAt": "2024-01-15"},
            {"id": 2, "title": "Second", "body": "Two", "userId": 2, "createdAt": "yesterday"},
            {"id": 3, "title": "Third", "body": "Three", "userId": 1},
        ])
    }

    async fn posts(query: web::Query<HashMap<String, String>>) -> HttpResponse {
        let user_id: Option<u64> = query.get("userId").and_then(|id| id.parse().ok());
        let posts: Vec<_> = fixture_posts()
            .as_array()
            .unwrap()
            .iter()
            .filter(|p| user_id.map_or(true, |id| p["userId"] == id))
            .cloned()
            .collect();
        HttpResponse::Ok().json(posts)
    }

    async fn post(id: web::Path<u64>) -> HttpResponse {
        match *id {
            1 => HttpResponse::Ok().json(&fixture_posts()[0]),
            _ => HttpResponse::NotFound().finish(),
        }
    }

    async fn comment(reads: web::Data<AtomicUsize>, id: web::Path<u64>) -> HttpResponse {
        reads.fetch_add(1, Ordering::SeqCst);
        HttpResponse::Ok().json(json!({
            "id": *id,
            "postId": 1,
            "name": "Jayne Kuhic",
            "email": "Jayne_Kuhic@sydney.com",
            "body": "I had the same question about mocks",
            "userId": 2,
        }))
    }

    async fn edit_comment(id: web::Path<u64>) -> HttpResponse {
        HttpResponse::Ok().json(json!({ "id": *id }))
    }

    /// Serve a small version of the remote API under `/api`, returning a client pointed at it and
    /// a count of single-comment reads.
    async fn fixture() -> (Client, web::Data<AtomicUsize>) {
        let reads = web::Data::new(AtomicUsize::new(0));
        let shared = reads.clone();
        let server = HttpServer::new(move || {
            App::new().app_data(shared.clone()).service(
                web::scope("/api")
                    .route("/posts", web::get().to(posts))
                    .route("/posts/{id}", web::get().to(post))
                    .route(
                        "/users",
                        web::get().to(|| async { HttpResponse::InternalServerError().finish() }),
                    )
                    .route(
                        "/users/{id}",
                        web::get().to(|| async { HttpResponse::Ok().body("not json") }),
                    )
                    .route("/comments/{id}", web::get().to(comment))
                    .route("/comments/{id}", web::put().to(edit_comment)),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_rt::spawn(server.run());
        // No trailing slash: paths must still land under /api.
        let client = Client::new(&format!("http://{}/api", addr), Duration::from_secs(5)).unwrap();
        (client, reads)
    }

    #[test]
    fn test_base_url_gets_a_trailing_slash() {
        let client = Client::new("http://localhost:3000/api", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url("posts/7").unwrap().as_str(),
            "http://localhost:3000/api/posts/7"
        );
        assert!(Client::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[actix_rt::test]
    async fn test_list_posts() {
        let (client, _) = fixture().await;

        let posts = client.list_posts(ListPosts::default()).await.unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(posts[0].created_at.is_some());
        // Unparseable dates are treated as missing.
        assert!(posts[1].created_at.is_none());

        let params = ListPosts {
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(client.list_posts(params).await.unwrap().len(), 2);

        let params = ListPosts {
            user_id: Some(1),
            ..Default::default()
        };
        let ids: Vec<_> = client
            .list_posts(params)
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[actix_rt::test]
    async fn test_missing_things_are_none() {
        let (client, _) = fixture().await;
        assert_eq!(client.get_post(1).await.unwrap().unwrap().title, "First");
        assert!(client.get_post(99).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_failures_are_upstream_errors() {
        let (client, _) = fixture().await;

        let err = client.list_users().await.unwrap_err();
        assert!(matches!(err.cause(), Cause::UpstreamError));

        let err = client.get_user(1).await.unwrap_err();
        assert!(matches!(err.cause(), Cause::UpstreamError));
        assert_eq!(err.external.text, UNAVAILABLE);
    }

    #[actix_rt::test]
    async fn test_update_comment_only_writes() {
        let (client, reads) = fixture().await;
        let current = client.get_comment(5).await.unwrap().unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 1);

        let patch = CommentPatch {
            body: Some("Edited to say something else".to_owned()),
            ..Default::default()
        };
        let updated = client.update_comment(current, patch).await.unwrap();
        assert_eq!(updated.id, 5);
        assert_eq!(updated.body, "Edited to say something else");
        assert_eq!(updated.name, "Jayne Kuhic");
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }
}
