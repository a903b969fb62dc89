//! The search view and single posts. The search view's URL is the request's query string: every
//! response carries the canonical URL for what's being shown, so the UI can replace its address
//! bar with it.
use crate::api::{observe, State};
use crate::remote::{
    structs::{ListPosts, Post, PostId},
    Client,
};
use crate::search::{
    pagination::clamp_page,
    suggestions::{suggest, Suggestion},
    FilterPatch, MemoryLocation, Search, SearchView,
};
use crate::twoface::{Cause, Fallible, TfError};
use actix_web::{web, HttpRequest};
use serde::{Deserialize, Serialize};

/// Where the search view lives.
const SEARCH_PATH: &str = "/posts";

pub fn configure<C: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource(SEARCH_PATH).route(web::get().to(search_posts::<C>)))
        .service(web::resource("/posts/search").route(web::post().to(refine_search::<C>)))
        .service(web::resource("/posts/suggestions").route(web::get().to(suggestions::<C>)))
        .service(web::resource("/posts/{post_id}").route(web::get().to(get_post::<C>)));
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(flatten)]
    pub view: SearchView,
    /// The URL to show for this search, e.g. `/posts?q=rust&page=2`
    pub location: String,
}

/// A change to the search in the request's URL.
#[derive(Deserialize, Default, Debug)]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: FilterPatch,
    /// Forget every filter instead of applying `filters`.
    #[serde(default)]
    pub clear: bool,
}

#[derive(Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub q: String,
}

async fn search_posts<C: Client + 'static>(
    state: web::Data<State<C>>,
    req: HttpRequest,
) -> Fallible<web::Json<SearchResponse>> {
    observe("search_posts", || async {
        let search = mount(&state, &req).await?;
        Ok(web::Json(respond(search)))
    })
    .await
}

async fn refine_search<C: Client + 'static>(
    state: web::Data<State<C>>,
    req: HttpRequest,
    body: web::Json<SearchRequest>,
) -> Fallible<web::Json<SearchResponse>> {
    let SearchRequest { filters, clear } = body.into_inner();
    observe("refine_search", || async {
        let mut search = mount(&state, &req).await?;
        if clear {
            search.clear_search();
        } else {
            search.update_filters(filters);
        }
        // Nobody's typing on the other end of an HTTP request.
        search.flush();
        Ok(web::Json(respond(search)))
    })
    .await
}

/// Start a search view from the request's query string and load the posts. A failed load fails
/// the request; there are no partial results.
async fn mount<C: Client + 'static>(
    state: &State<C>,
    req: &HttpRequest,
) -> Fallible<Search<C, MemoryLocation>> {
    let location = MemoryLocation::new(SEARCH_PATH, req.query_string());
    let mut search = Search::mount(state.client.clone(), location, None, state.search);
    search.load().await;
    search.into_result()
}

/// Keep the page in range, then describe the view.
fn respond<C: Client>(mut search: Search<C, MemoryLocation>) -> SearchResponse {
    let page = clamp_page(search.page(), search.total_pages());
    if page != search.page() {
        search.update_page(page);
    }
    SearchResponse {
        view: search.view(),
        location: search.location().href(),
    }
}

async fn suggestions<C: Client + 'static>(
    state: web::Data<State<C>>,
    query: web::Query<SuggestionQuery>,
) -> Fallible<web::Json<Vec<Suggestion>>> {
    observe("suggestions", || async {
        let posts = state
            .client
            .list_posts(ListPosts {
                limit: Some(state.search.fetch_limit),
                ..Default::default()
            })
            .await?;
        Ok(web::Json(suggest(&query.q, &posts)))
    })
    .await
}

/// A post, with its author filled in when the remote service knows them.
async fn get_post<C: Client + 'static>(
    state: web::Data<State<C>>,
    post_id: web::Path<PostId>,
) -> Fallible<web::Json<Post>> {
    observe("get_post", || async {
        let Some(mut post) = state.client.get_post(*post_id).await? else {
            return Err(TfError::user(Cause::NotFound, "Post not found"));
        };
        post.author = state.client.get_user(post.user_id).await?;
        Ok(web::Json(post))
    })
    .await
}
