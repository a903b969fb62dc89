use crate::api::{observe, State};
use crate::comments::{CommentEdit, CommentForm};
use crate::remote::{
    structs::{Comment, CommentId, PostId},
    Client,
};
use crate::twoface::Fallible;
use actix_web::{web, HttpResponse};
use actix_web_httpauth::extractors::bearer::BearerAuth;

pub fn configure<C: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/posts/{post_id}/comments")
            .route(web::get().to(list_comments::<C>))
            .route(web::post().to(create_comment::<C>)),
    )
    .service(
        web::resource("/comments/{comment_id}")
            .route(web::put().to(update_comment::<C>))
            .route(web::delete().to(delete_comment::<C>)),
    );
}

async fn list_comments<C: Client + 'static>(
    state: web::Data<State<C>>,
    post_id: web::Path<PostId>,
) -> Fallible<web::Json<Vec<Comment>>> {
    observe("list_comments", || async {
        Ok(web::Json(state.comments.for_post(*post_id).await?))
    })
    .await
}

async fn create_comment<C: Client + 'static>(
    state: web::Data<State<C>>,
    bearer: BearerAuth,
    post_id: web::Path<PostId>,
    form: web::Json<CommentForm>,
) -> Fallible<HttpResponse> {
    observe("create_comment", || async {
        let session = state.session(&bearer)?;
        let comment = state
            .comments
            .create(&session, *post_id, form.into_inner())
            .await?;
        Ok(HttpResponse::Created().json(comment))
    })
    .await
}

async fn update_comment<C: Client + 'static>(
    state: web::Data<State<C>>,
    bearer: BearerAuth,
    comment_id: web::Path<CommentId>,
    edit: web::Json<CommentEdit>,
) -> Fallible<web::Json<Comment>> {
    observe("update_comment", || async {
        let session = state.session(&bearer)?;
        let comment = state
            .comments
            .update(&session, *comment_id, edit.into_inner())
            .await?;
        Ok(web::Json(comment))
    })
    .await
}

async fn delete_comment<C: Client + 'static>(
    state: web::Data<State<C>>,
    bearer: BearerAuth,
    comment_id: web::Path<CommentId>,
) -> Fallible<HttpResponse> {
    observe("delete_comment", || async {
        let session = state.session(&bearer)?;
        state.comments.delete(&session, *comment_id).await?;
        Ok(HttpResponse::NoContent().finish())
    })
    .await
}
