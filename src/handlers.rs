use std::collections::HashMap;
use std::io::Read;
use std::sync::{Arc, Mutex};

use iron::{status, AfterMiddleware, Chain, Handler, Headers, IronError, IronResult, Plugin, Request, Response};
use iron::headers::{AccessControlAllowMethods, AccessControlAllowOrigin, ContentType};
use iron::method::Method;
use router::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{self, Value};
use urlencoded::UrlEncodedQuery;

use database::Database;
use error::{PostError, Result};
use model::{NewPost, PostPatch};

/// Match a `Result` into its inner value, or answer the request
/// with the JSON error body and status of the corresponding `PostError`.
macro_rules! try_handler {
    ( $e:expr ) => {
        match $e {
            Ok(x) => x,
            Err(e) => {
                let err = PostError::from(e);
                warn!("rejected request: {}", err);
                return Ok(error_response(&err));
            }
        }
    };
}

/// Lock a `Mutex`. This macro simply calls `m.lock().unwrap()`,
/// because the thread should panic if the lock can not be obtained:
/// we cannot recover from that.
macro_rules! lock {
    ( $e:expr ) => { $e.lock().unwrap() }
}

/// Get the `:id` segment of the URI as a post id.
/// A segment that is not an unsigned integer answers `404 Not Found`.
/// If we could not obtain the parameter list, return `500 Internal Server Error`.
macro_rules! get_post_id {
    ( $r:expr ) => {
        match $r.extensions.get::<Router>().and_then(|router| router.find("id")) {
            Some(val) => match parse_id(val) {
                Some(id) => id,
                None => return Ok(json_response(status::NotFound, &json!({ "error": NOT_FOUND }))),
            },
            None => return Ok(Response::with(status::InternalServerError)),
        }
    }
}

const NOT_FOUND: &'static str = "Not Found";

/// Plain decimal digits only; `parse` alone would also take a leading `+`.
fn parse_id(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn json_response<T: Serialize>(status: status::Status, body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(payload) => Response::with((status, payload)),
        Err(e) => error_response(&PostError::from(e)),
    }
}

fn error_response(err: &PostError) -> Response {
    let payload = json!({ "error": err.to_string() }).to_string();
    Response::with((err.status(), payload))
}

fn read_body(req: &mut Request) -> Result<String> {
    let mut payload = String::new();
    req.body.read_to_string(&mut payload).map_err(|_| PostError::MalformedInput)?;
    Ok(payload)
}

/// Decode a request body that must be a JSON object.
fn parse_object<T: DeserializeOwned>(payload: &str) -> Result<T> {
    let value: Value = serde_json::from_str(payload).map_err(|_| PostError::MalformedInput)?;
    if !value.is_object() {
        return Err(PostError::MalformedInput);
    }
    serde_json::from_value(value).map_err(|_| PostError::MalformedInput)
}

fn first_value(query: &HashMap<String, Vec<String>>, key: &str) -> Option<String> {
    query.get(key).and_then(|values| values.first()).cloned()
}

pub struct Handlers {
    pub list: ListHandler,
    pub search: SearchHandler,
    pub create: CreateHandler,
    pub post: PostHandler,
    pub update: UpdateHandler,
    pub delete: DeleteHandler,
}

impl Handlers {
    pub fn new(database: Database) -> Handlers {
        let database = Arc::new(Mutex::new(database));
        Handlers {
            list: ListHandler { database: database.clone() },
            search: SearchHandler { database: database.clone() },
            create: CreateHandler { database: database.clone() },
            post: PostHandler { database: database.clone() },
            update: UpdateHandler { database: database.clone() },
            delete: DeleteHandler { database: database },
        }
    }
}

/// Route every endpoint to its handler over a shared `database`.
/// Request logging is left to the caller.
pub fn chain(database: Database) -> Chain {
    let handlers = Handlers::new(database);

    let mut router = Router::new();
    router.get("/api/posts", handlers.list, "list_posts");
    router.get("/api/posts/search", handlers.search, "search_posts");
    router.get("/api/posts/:id", handlers.post, "get_post");
    router.post("/api/posts", handlers.create, "create_post");
    router.put("/api/posts/:id", handlers.update, "update_post");
    router.delete("/api/posts/:id", handlers.delete, "delete_post");
    router.options("/api/posts", PreflightHandler, "preflight_posts");
    router.options("/api/posts/search", PreflightHandler, "preflight_search");
    router.options("/api/posts/:id", PreflightHandler, "preflight_post");

    let mut chain = Chain::new(router);
    chain.link_after(JsonAfterMiddleware);
    chain.link_after(CorsAfterMiddleware);
    chain
}

pub struct ListHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for ListHandler {
    fn handle(&self, _: &mut Request) -> IronResult<Response> {
        let payload = try_handler!(serde_json::to_string(lock!(self.database).posts()));
        Ok(Response::with((status::Ok, payload)))
    }
}

pub struct SearchHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for SearchHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        // A request without a query string is not an error, it just matches nothing.
        let (title, content) = match req.get_ref::<UrlEncodedQuery>() {
            Ok(query) => (first_value(query, "title"), first_value(query, "content")),
            Err(_) => (None, None),
        };

        let posts = lock!(self.database).search(title.as_deref(), content.as_deref());
        Ok(json_response(status::Ok, &posts))
    }
}

pub struct CreateHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for CreateHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let payload = try_handler!(read_body(req));
        let new_post: NewPost = try_handler!(parse_object(&payload));

        let post = try_handler!(lock!(self.database).create(new_post));
        info!("post {} created", post.id());

        Ok(json_response(status::Created, &post))
    }
}

pub struct PostHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for PostHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        let post = try_handler!(lock!(self.database).get(id).map(|post| post.clone()));
        Ok(json_response(status::Ok, &post))
    }
}

pub struct UpdateHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for UpdateHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        let payload = try_handler!(read_body(req));
        let patch: PostPatch = if payload.trim().is_empty() {
            PostPatch::default()
        } else {
            try_handler!(parse_object(&payload))
        };

        let post = try_handler!(lock!(self.database).update(id, patch));
        info!("post {} updated", id);

        Ok(json_response(status::Ok, &post))
    }
}

pub struct DeleteHandler {
    database: Arc<Mutex<Database>>,
}

impl Handler for DeleteHandler {
    fn handle(&self, req: &mut Request) -> IronResult<Response> {
        let id = get_post_id!(req);

        let result = lock!(self.database).delete(id);
        match result {
            Ok(_) => {
                info!("post {} deleted", id);
                let message = format!("Post with id {} has been deleted successfully.", id);
                Ok(json_response(status::Ok, &json!({ "message": message })))
            }
            Err(PostError::NotFound(id)) => {
                warn!("delete of unknown post {}", id);
                let error = format!("post with id {} is not found", id);
                Ok(json_response(status::NotFound, &json!({ "error": error })))
            }
            Err(err) => Ok(error_response(&err)),
        }
    }
}

/// Answers CORS preflight requests; the headers themselves come from `CorsAfterMiddleware`.
pub struct PreflightHandler;

impl Handler for PreflightHandler {
    fn handle(&self, _: &mut Request) -> IronResult<Response> {
        let mut res = Response::with((status::Ok, "{}"));
        res.headers.set(AccessControlAllowMethods(vec![
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Options,
        ]));
        res.headers.set_raw("Access-Control-Allow-Headers", vec![b"Content-Type".to_vec()]);
        Ok(res)
    }
}

pub struct JsonAfterMiddleware;

impl AfterMiddleware for JsonAfterMiddleware {
    fn after(&self, _: &mut Request, mut res: Response) -> IronResult<Response> {
        res.headers.set(ContentType::json());
        Ok(res)
    }

    /// Errors escaping the router (unknown routes mostly) still get a JSON body.
    fn catch(&self, _: &mut Request, err: IronError) -> IronResult<Response> {
        let status = err.response.status.unwrap_or(status::InternalServerError);
        let reason = match status {
            status::NotFound => NOT_FOUND,
            _ => status.canonical_reason().unwrap_or("Unknown error"),
        };
        let mut res = Response::with((status, json!({ "error": reason }).to_string()));
        res.headers.set(ContentType::json());
        Ok(res)
    }
}

/// Allow cross-origin requests from anywhere.
pub struct CorsAfterMiddleware;

impl CorsAfterMiddleware {
    fn allow(headers: &mut Headers) {
        headers.set(AccessControlAllowOrigin::Any);
    }
}

impl AfterMiddleware for CorsAfterMiddleware {
    fn after(&self, _: &mut Request, mut res: Response) -> IronResult<Response> {
        CorsAfterMiddleware::allow(&mut res.headers);
        Ok(res)
    }

    fn catch(&self, _: &mut Request, mut err: IronError) -> IronResult<Response> {
        CorsAfterMiddleware::allow(&mut err.response.headers);
        Err(err)
    }
}
