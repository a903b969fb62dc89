use crate::api::{observe, State};
use crate::auth::{AuthResponse, LoginForm, SignupForm};
use crate::remote::{structs::User, Client};
use crate::twoface::Fallible;
use actix_web::{web, HttpResponse};
use actix_web_httpauth::extractors::bearer::BearerAuth;

pub fn configure<C: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login::<C>))
            .route("/signup", web::post().to(signup::<C>))
            .route("/refresh", web::post().to(refresh::<C>))
            .route("/logout", web::post().to(logout::<C>))
            .route("/me", web::get().to(me::<C>)),
    );
}

async fn login<C: Client + 'static>(
    state: web::Data<State<C>>,
    form: web::Json<LoginForm>,
) -> Fallible<web::Json<AuthResponse>> {
    observe("login", || async {
        let resp = state.auth.login(form.into_inner()).await?;
        Ok(web::Json(resp))
    })
    .await
}

async fn signup<C: Client + 'static>(
    state: web::Data<State<C>>,
    form: web::Json<SignupForm>,
) -> Fallible<web::Json<AuthResponse>> {
    observe("signup", || async {
        let resp = state.auth.signup(form.into_inner()).await?;
        Ok(web::Json(resp))
    })
    .await
}

async fn refresh<C: Client + 'static>(
    state: web::Data<State<C>>,
    bearer: BearerAuth,
) -> Fallible<web::Json<AuthResponse>> {
    observe("refresh", || async {
        let session = state.session(&bearer)?;
        Ok(web::Json(state.auth.refresh(&session).await?))
    })
    .await
}

async fn logout<C: Client + 'static>(
    state: web::Data<State<C>>,
    bearer: BearerAuth,
) -> Fallible<HttpResponse> {
    observe("logout", || async {
        let session = state.session(&bearer)?;
        state.auth.logout(&session);
        Ok(HttpResponse::NoContent().finish())
    })
    .await
}

async fn me<C: Client + 'static>(
    state: web::Data<State<C>>,
    bearer: BearerAuth,
) -> Fallible<web::Json<User>> {
    observe("me", || async {
        let session = state.session(&bearer)?;
        Ok(web::Json(state.auth.current_user(&session).await?))
    })
    .await
}
