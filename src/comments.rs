//! Reading and writing comments on posts. Anyone can read; writing needs a session, and only the
//! author of a comment may change or delete it.
use crate::auth::{forms::check_person_name, Session};
use crate::remote::{
    structs::{Comment, CommentId, CommentPatch, NewComment, PostId},
    Client,
};
use crate::twoface::{Cause, Fallible, TfError, Validated};
use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

#[derive(Deserialize, Validate, Debug, Clone)]
pub struct CommentForm {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Name must be between 2 and 100 characters"
    ))]
    pub name: String,
    #[validate(
        email(message = "Please enter a valid email address"),
        length(max = 255, message = "Email must be less than 255 characters")
    )]
    pub email: String,
    #[validate(length(
        min = 10,
        max = 500,
        message = "Comment must be between 10 and 500 characters"
    ))]
    pub body: String,
}

impl Validated for CommentForm {
    fn extra_checks(&self, errors: &mut ValidationErrors) {
        check_person_name("name", &self.name, errors);
    }
}

/// An edit to an existing comment. Only the fields present are changed, and they follow the same
/// rules as a new comment.
#[derive(Deserialize, Validate, Debug, Clone, Default)]
pub struct CommentEdit {
    #[validate(length(
        min = 2,
        max = 100,
        message = "Name must be between 2 and 100 characters"
    ))]
    pub name: Option<String>,
    #[validate(
        email(message = "Please enter a valid email address"),
        length(max = 255, message = "Email must be less than 255 characters")
    )]
    pub email: Option<String>,
    #[validate(length(
        min = 10,
        max = 500,
        message = "Comment must be between 10 and 500 characters"
    ))]
    pub body: Option<String>,
}

impl Validated for CommentEdit {
    fn extra_checks(&self, errors: &mut ValidationErrors) {
        if let Some(name) = &self.name {
            check_person_name("name", name, errors);
        }
    }
}

impl From<CommentEdit> for CommentPatch {
    fn from(edit: CommentEdit) -> Self {
        Self {
            name: edit.name,
            email: edit.email,
            body: edit.body,
        }
    }
}

#[derive(Clone)]
pub struct Comments<C> {
    client: C,
}

impl<C: Client> Comments<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Post ids start at 1, so there's nothing to ask the remote service about for 0.
    pub async fn for_post(&self, post_id: PostId) -> Fallible<Vec<Comment>> {
        if post_id == 0 {
            return Ok(Vec::new());
        }
        self.client.comments_for_post(post_id).await
    }

    pub async fn create(
        &self,
        session: &Session,
        post_id: PostId,
        form: CommentForm,
    ) -> Fallible<Comment> {
        form.validated()?;
        if post_id == 0 {
            return Err(TfError::user(Cause::NotFound, "Post not found"));
        }
        let comment = self
            .client
            .create_comment(NewComment {
                post_id,
                name: form.name,
                email: form.email,
                body: form.body,
                user_id: Some(session.user_id),
            })
            .await?;
        info!(comment_id = comment.id, post_id, user_id = session.user_id, "comment created");
        Ok(comment)
    }

    pub async fn update(
        &self,
        session: &Session,
        id: CommentId,
        edit: CommentEdit,
    ) -> Fallible<Comment> {
        edit.validated()?;
        let comment = self
            .owned(session, id, "You can only edit your own comments")
            .await?;
        self.client.update_comment(comment, edit.into()).await
    }

    pub async fn delete(&self, session: &Session, id: CommentId) -> Fallible<()> {
        self.owned(session, id, "You can only delete your own comments")
            .await?;
        self.client.delete_comment(id).await?;
        info!(comment_id = id, user_id = session.user_id, "comment deleted");
        Ok(())
    }

    /// Find a comment the session is allowed to change. Comments with no known author are fair
    /// game for anyone signed in.
    async fn owned(
        &self,
        session: &Session,
        id: CommentId,
        forbidden: &'static str,
    ) -> Fallible<Comment> {
        let Some(comment) = self.client.get_comment(id).await? else {
            return Err(TfError::user(Cause::NotFound, "Comment not found"));
        };
        match comment.user_id {
            Some(owner) if owner != session.user_id => {
                warn!(comment_id = id, owner, user_id = session.user_id, "refused to touch someone else's comment");
                Err(TfError::user(Cause::Forbidden, forbidden))
            }
            _ => Ok(comment),
        }
    }
}
