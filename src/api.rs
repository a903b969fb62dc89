use crate::auth::{Auth, Revocations, Session, Tokens};
use crate::comments::Comments;
use crate::metrics;
use crate::remote::Client;
use crate::search::SearchSettings;
use crate::twoface::Fallible;
use actix_web::web;
use actix_web_httpauth::extractors::bearer::BearerAuth;
use std::future::Future;
use std::time::Instant;

pub mod auth;
pub mod comments;
pub mod posts;
pub mod users;

/// Everything a handler needs. Each worker builds its own, because the HTTP client can't be
/// shared between threads; the parts that must be global (post snapshot, revoked tokens) are
/// shared inside the client and the `Revocations`.
pub struct State<C> {
    pub client: C,
    pub auth: Auth<C>,
    pub comments: Comments<C>,
    pub search: SearchSettings,
}

impl<C: Client> State<C> {
    pub fn new(
        client: C,
        tokens: Tokens,
        revocations: Revocations,
        search: SearchSettings,
    ) -> Self {
        Self {
            auth: Auth::new(client.clone(), tokens, revocations),
            comments: Comments::new(client.clone()),
            client,
            search,
        }
    }

    /// Check the caller's bearer token.
    fn session(&self, bearer: &BearerAuth) -> Fallible<Session> {
        self.auth.authenticate(bearer.token())
    }
}

pub fn configure<C: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.configure(auth::configure::<C>)
        .configure(posts::configure::<C>)
        .configure(comments::configure::<C>)
        .configure(users::configure::<C>);
}

/// Execute the closure, then log its operational metrics, e.g. time taken, whether it returned Ok/Err, etc.
async fn observe<F, Fut, R>(name: &'static str, f: F) -> Fallible<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Fallible<R>>,
{
    let start = Instant::now();
    let return_val = f().await;
    let duration = start.elapsed();
    metrics::HANDLER_SECS
        .with_label_values(&[name])
        .observe(duration.as_secs_f64());
    metrics::RESPONSES
        .with_label_values(&[name, variant_name(&return_val)])
        .inc();
    return_val
}

fn variant_name<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "err"
    }
}
