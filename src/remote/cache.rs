//! Reuse the unfiltered post list across requests for a while. Search filters locally over a
//! snapshot, so there's no reason to hit the remote service on every page view.
use crate::metrics;
use crate::remote::structs::{
    Comment, CommentId, CommentPatch, ListPosts, NewComment, NewUser, Post, PostId, User, UserId,
};
use crate::twoface::Fallible;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct Snapshot {
    fetched_at: Instant,
    limit: Option<usize>,
    posts: Arc<Vec<Post>>,
}

/// The shared slot holding the latest snapshot. Clones share the slot, so one of these can be
/// handed to every worker.
#[derive(Clone, Default)]
pub struct SnapshotCache {
    slot: Arc<Mutex<Option<Snapshot>>>,
}

impl SnapshotCache {
    fn fresh(&self, limit: Option<usize>, stale_after: Duration) -> Option<Arc<Vec<Post>>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|s| s.limit == limit && s.fetched_at.elapsed() < stale_after)
            .map(|s| Arc::clone(&s.posts))
    }

    fn store(&self, limit: Option<usize>, posts: Arc<Vec<Post>>) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Snapshot {
            fetched_at: Instant::now(),
            limit,
            posts,
        });
    }

    pub fn clear(&self) {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Wraps a remote::Client, serving the unfiltered post list from a snapshot until it goes stale.
/// Everything else passes straight through.
#[derive(Clone)]
pub struct Cached<C> {
    inner: C,
    cache: SnapshotCache,
    stale_after: Duration,
}

impl<C> Cached<C> {
    pub fn new(inner: C, cache: SnapshotCache, stale_after: Duration) -> Self {
        Self {
            inner,
            cache,
            stale_after,
        }
    }
}

#[async_trait(?Send)]
impl<C: super::Client> super::Client for Cached<C> {
    async fn list_posts(&self, params: ListPosts) -> Fallible<Vec<Post>> {
        if params.user_id.is_some() {
            return self.inner.list_posts(params).await;
        }
        if let Some(posts) = self.cache.fresh(params.limit, self.stale_after) {
            debug!(posts = posts.len(), "serving posts from snapshot");
            return Ok(posts.as_ref().clone());
        }
        let posts = self.inner.list_posts(params).await?;
        metrics::SNAPSHOT_FETCHES.inc();
        self.cache.store(params.limit, Arc::new(posts.clone()));
        Ok(posts)
    }

    async fn get_post(&self, id: PostId) -> Fallible<Option<Post>> {
        self.inner.get_post(id).await
    }

    async fn list_users(&self) -> Fallible<Vec<User>> {
        self.inner.list_users().await
    }

    async fn get_user(&self, id: UserId) -> Fallible<Option<User>> {
        self.inner.get_user(id).await
    }

    async fn create_user(&self, new_user: NewUser) -> Fallible<User> {
        self.inner.create_user(new_user).await
    }

    async fn comments_for_post(&self, post_id: PostId) -> Fallible<Vec<Comment>> {
        self.inner.comments_for_post(post_id).await
    }

    async fn get_comment(&self, id: CommentId) -> Fallible<Option<Comment>> {
        self.inner.get_comment(id).await
    }

    async fn create_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        self.inner.create_comment(new_comment).await
    }

    async fn update_comment(&self, current: Comment, patch: CommentPatch) -> Fallible<Comment> {
        self.inner.update_comment(current, patch).await
    }

    async fn delete_comment(&self, id: CommentId) -> Fallible<()> {
        self.inner.delete_comment(id).await
    }
}
