//! Bag routes
//!
//! - `GET /bags/:bag/tiddlers` (also `tiddlers.txt`, `.json`, `.html`)
//! - `GET /bags/:bag/tiddlers/:title`

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use gateway::facets::REPRESENTATIONS;
use gateway::{CurrentUser, RequestFacets};

use crate::error::Result;
use crate::filter;
use crate::representation;
use crate::store::BagStore;

pub async fn list_tiddlers(
    State(store): State<Arc<BagStore>>,
    CurrentUser(user): CurrentUser,
    facets: RequestFacets,
    Path(bag): Path<String>,
) -> Result<Response> {
    let tiddlers = store.read_tiddlers(&bag, &user)?;
    let tiddlers = filter::apply(tiddlers, &facets.filters)?;
    Ok(representation::tiddler_list(&bag, &tiddlers, &facets.media_type))
}

pub async fn get_tiddler(
    State(store): State<Arc<BagStore>>,
    CurrentUser(user): CurrentUser,
    facets: RequestFacets,
    Path((bag, title)): Path<(String, String)>,
) -> Result<Response> {
    let tiddler = store.read_tiddler(&bag, facets.strip_extension(&title), &user)?;
    Ok(representation::tiddler(&tiddler, &facets.media_type))
}

pub fn routes(store: Arc<BagStore>) -> Router {
    let mut router = Router::new()
        .route("/bags/:bag/tiddlers", get(list_tiddlers))
        .route("/bags/:bag/tiddlers/:title", get(get_tiddler));
    for (ext, _) in REPRESENTATIONS {
        router = router.route(&format!("/bags/:bag/tiddlers.{}", ext), get(list_tiddlers));
    }
    router.with_state(store)
}
