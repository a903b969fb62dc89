use crate::remote::structs::{
    parse_instant, Comment, CommentId, CommentPatch, ListPosts, NewComment, NewUser, Post, PostId,
    User, UserId,
};
use crate::twoface::{Cause, Fallible, TfError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Store<T> = Arc<Mutex<Vec<T>>>;

/// A mock implementation of remote::Client. Clones share the same data.
#[derive(Clone, Default, Debug)]
pub struct Client {
    posts: Store<Post>,
    users: Store<User>,
    comments: Store<Comment>,
    fail_posts: Arc<AtomicBool>,
    post_fetches: Arc<AtomicUsize>,
    comment_reads: Arc<AtomicUsize>,
}

impl Client {
    pub fn set_posts(&mut self, posts: Vec<Post>) {
        *self.posts.lock().unwrap() = posts;
    }

    pub fn set_users(&mut self, users: Vec<User>) {
        *self.users.lock().unwrap() = users;
    }

    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        *self.comments.lock().unwrap() = comments;
    }

    /// Make every post listing fail, as if the remote service were down.
    pub fn fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    /// How many times posts were listed.
    pub fn post_fetches(&self) -> usize {
        self.post_fetches.load(Ordering::SeqCst)
    }

    /// How many times a single comment was read.
    pub fn comment_reads(&self) -> usize {
        self.comment_reads.load(Ordering::SeqCst)
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl super::Client for Client {
    async fn list_posts(&self, params: ListPosts) -> Fallible<Vec<Post>> {
        self.post_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(TfError::user(Cause::UpstreamError, "The post service is unavailable"));
        }
        let all_posts = self.posts.lock().unwrap();
        let posts = all_posts
            .iter()
            .filter(|p| params.user_id.map_or(true, |id| id == p.user_id))
            .take(params.limit.unwrap_or(usize::MAX));
        let mut results = Vec::new();
        for post in posts {
            results.push(post.clone())
        }
        Ok(results)
    }

    async fn get_post(&self, id: PostId) -> Fallible<Option<Post>> {
        Ok(self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn list_users(&self) -> Fallible<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn get_user(&self, id: UserId) -> Fallible<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Fallible<User> {
        // Like the real service: the new user is echoed back but never stored, and its id is
        // always one past the fixed user list.
        let id = self.users.lock().unwrap().len() as u64 + 1;
        Ok(User {
            id,
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
        let comments = self.comments.lock().unwrap();
        Ok(comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: CommentId) -> Fallible<Option<Comment>> {
        self.comment_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.comments.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn create_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let id = comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let comment = Comment {
            id,
            post_id: new_comment.post_id,
            name: new_comment.name,
            email: new_comment.email,
            body: new_comment.body,
            user_id: new_comment.user_id,
            created_at: None,
        };
        comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, current: Comment, patch: CommentPatch) -> Fallible<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let Some(comment) = comments.iter_mut().find(|c| c.id == current.id) else {
            return Err(TfError::user(Cause::NotFound, "Comment not found"));
        };
        comment.apply(patch);
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: CommentId) -> Fallible<()> {
        self.comments.lock().unwrap().retain(|c| c.id != id);
        Ok(())
    }
}

fn post(id: PostId, title: &str, body: &str, user_id: UserId, comments: u32, created: Option<&str>) -> Post {
    Post {
        id,
        title: title.to_owned(),
        body: body.to_owned(),
        user_id,
        author: None,
        comments_count: Some(comments),
        created_at: created.and_then(parse_instant),
    }
}

/// Four posts by users 1, 2, 1 and 3, with 5, 12, 8 and 3 comments. The last one is undated.
pub fn posts() -> Vec<Post> {
    vec![
        post(
            1,
            "React Testing Guide",
            "Learn how to test React components effectively",
            1,
            5,
            Some("2024-01-15T10:00:00Z"),
        ),
        post(
            2,
            "TypeScript Best Practices",
            "Improve your TypeScript code quality",
            2,
            12,
            Some("2024-01-20T14:30:00Z"),
        ),
        post(
            3,
            "JavaScript Fundamentals",
            "Master the basics of JavaScript programming",
            1,
            8,
            Some("2024-01-25T09:15:00Z"),
        ),
        post(
            4,
            "Ownership Explained",
            "Borrowing rules without the tears",
            3,
            3,
            None,
        ),
    ]
}

pub fn user(id: UserId, name: &str, username: &str, email: &str) -> User {
    User {
        id,
        name: name.to_owned(),
        username: username.to_owned(),
        email: email.to_owned(),
        phone: None,
        website: None,
        address: None,
        company: None,
    }
}

pub fn users() -> Vec<User> {
    vec![
        user(1, "Leanne Graham", "Bret", "Sincere@april.biz"),
        user(2, "Ervin Howell", "Antonette", "Shanna@melissa.tv"),
        user(3, "Clementine Bauch", "Samantha", "Nathan@yesenia.net"),
    ]
}

pub fn comments() -> Vec<Comment> {
    vec![
        Comment {
            id: 1,
            post_id: 1,
            name: "Eliseo Leannon".to_owned(),
            email: "Eliseo@gardner.biz".to_owned(),
            body: "Great walkthrough of the testing setup".to_owned(),
            user_id: None,
            created_at: None,
        },
        Comment {
            id: 2,
            post_id: 1,
            name: "Jayne Kuhic".to_owned(),
            email: "Jayne_Kuhic@sydney.com".to_owned(),
            body: "I had the same question about mocks".to_owned(),
            user_id: Some(2),
            created_at: None,
        },
    ]
}

/// A mock client preloaded with the fixtures above.
pub fn seeded() -> Client {
    let mut client = Client::default();
    client.set_posts(posts());
    client.set_users(users());
    client.set_comments(comments());
    client
}
