//! The remote REST service that owns posts, users and comments. Everything this app shows comes
//! from here; nothing is stored locally.
pub mod cache;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod structs;

use crate::twoface::Fallible;
use async_trait::async_trait;
use structs::{
    Comment, CommentId, CommentPatch, ListPosts, NewComment, NewUser, Post, PostId, User, UserId,
};

#[async_trait(?Send)]
/// The interface for reading and writing remote data.
pub trait Client: Clone {
    async fn list_posts(&self, params: ListPosts) -> Fallible<Vec<Post>>;
    async fn get_post(&self, id: PostId) -> Fallible<Option<Post>>;
    async fn list_users(&self) -> Fallible<Vec<User>>;
    async fn get_user(&self, id: UserId) -> Fallible<Option<User>>;
    async fn create_user(&self, new_user: NewUser) -> Fallible<User>;
    async fn comments_for_post(&self, post_id: PostId) -> Fallible<Vec<Comment>>;
    async fn get_comment(&self, id: CommentId) -> Fallible<Option<Comment>>;
    async fn create_comment(&self, new_comment: NewComment) -> Fallible<Comment>;
    /// Apply an edit to a comment the caller has already read, returning the edited comment.
    async fn update_comment(&self, current: Comment, patch: CommentPatch) -> Fallible<Comment>;
    async fn delete_comment(&self, id: CommentId) -> Fallible<()>;
}
