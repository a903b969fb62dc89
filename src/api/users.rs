use crate::api::{observe, State};
use crate::remote::{
    structs::{User, UserId},
    Client,
};
use crate::twoface::{Cause, Fallible, TfError};
use actix_web::web;

pub fn configure<C: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/users").route(web::get().to(list_users::<C>)))
        .service(web::resource("/users/{user_id}").route(web::get().to(get_user::<C>)));
}

async fn list_users<C: Client + 'static>(
    state: web::Data<State<C>>,
) -> Fallible<web::Json<Vec<User>>> {
    observe("list_users", || async {
        Ok(web::Json(state.client.list_users().await?))
    })
    .await
}

async fn get_user<C: Client + 'static>(
    state: web::Data<State<C>>,
    user_id: web::Path<UserId>,
) -> Fallible<web::Json<User>> {
    observe("get_user", || async {
        let user = state
            .client
            .get_user(*user_id)
            .await?
            .ok_or_else(|| TfError::user(Cause::NotFound, "User not found"))?;
        Ok(web::Json(user))
    })
    .await
}
