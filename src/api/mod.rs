use crate::application::adapters::{CreateUserDTO, UserDTO};
use crate::application::repositories::UserRepository;
use crate::domain::errors::RepositoryError;
use crate::infrastructure::server_impl::request::Request;
use crate::infrastructure::server_impl::response::{JsonResponse, Response};
use crate::infrastructure::server_impl::router::{Handler, RouteTable};
use crate::infrastructure::server_impl::server::Method;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

const ID_KEY: &str = "id";

/// Registers every endpoint the server exposes, in match order.
pub fn routes<R: UserRepository>(users: Arc<R>) -> RouteTable {
    let mut table = RouteTable::new();
    register_hello_routes(&mut table);
    register_user_routes(&mut table, users);
    table
}

pub fn register_hello_routes(table: &mut RouteTable) {
    table.add(Method::GET, "/hello", hello_world_route);
}

pub fn register_user_routes<R: UserRepository>(table: &mut RouteTable, users: Arc<R>) {
    table
        .add(Method::POST, "/users/create", CreateUserRoute::new(users.clone()))
        .add(Method::GET, "/users/{id}", UserByPathRoute::new(users.clone()))
        .add(Method::GET, "/users", UserByQueryRoute::new(users));
}

pub fn hello_world_route(_: &Request<'_>) -> Response {
    Response::ok("Hello World")
}

/// Ids outside storage's `i32` range cannot exist, so they read as not found.
async fn user_response<R: UserRepository>(users: &R, id: i64) -> Response {
    let lookup = match i32::try_from(id) {
        Ok(id) => users.get_by_id(id).await,
        Err(_) => Err(RepositoryError::NotFound),
    };

    match lookup {
        Ok(user) => JsonResponse::from(UserDTO::from(user)).into_inner(),
        Err(err) => Response::bad_request(err.to_string()),
    }
}

fn parse_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.parse().ok())
}

/// `POST /users/create`, body `{"username": .., "password": ..}`.
#[derive(Debug)]
pub struct CreateUserRoute<R> {
    users: Arc<R>,
}

impl<R> CreateUserRoute<R> {
    pub fn new(users: Arc<R>) -> Self {
        Self { users }
    }
}

impl<R: UserRepository> Handler for CreateUserRoute<R> {
    fn handle<'a>(&'a self, request: &'a Request<'a>) -> BoxFuture<'a, Response> {
        async move {
            let dto = match serde_json::from_str::<CreateUserDTO>(request.body) {
                Ok(dto) => dto,
                Err(err) => {
                    tracing::debug!(error = %err, "rejecting user payload");
                    return Response::bad_request(format!("invalid user payload: {err}"));
                }
            };

            match self.users.create(&dto.username, &dto.password).await {
                Ok(()) => {
                    tracing::info!(username = %dto.username, "user created");
                    Response::ok("Created user")
                }
                Err(err) => Response::bad_request(err.to_string()),
            }
        }
        .boxed()
    }
}

/// `GET /users/{id}`.
#[derive(Debug)]
pub struct UserByPathRoute<R> {
    users: Arc<R>,
}

impl<R> UserByPathRoute<R> {
    pub fn new(users: Arc<R>) -> Self {
        Self { users }
    }
}

impl<R: UserRepository> Handler for UserByPathRoute<R> {
    fn handle<'a>(&'a self, request: &'a Request<'a>) -> BoxFuture<'a, Response> {
        async move {
            let Some(id) = parse_id(request.path_variable(ID_KEY)) else {
                return Response::bad_request(format!("missing path variable: {ID_KEY}"));
            };

            user_response(self.users.as_ref(), id).await
        }
        .boxed()
    }
}

/// `GET /users?id=`.
#[derive(Debug)]
pub struct UserByQueryRoute<R> {
    users: Arc<R>,
}

impl<R> UserByQueryRoute<R> {
    pub fn new(users: Arc<R>) -> Self {
        Self { users }
    }
}

impl<R: UserRepository> Handler for UserByQueryRoute<R> {
    fn handle<'a>(&'a self, request: &'a Request<'a>) -> BoxFuture<'a, Response> {
        async move {
            let Some(id) = parse_id(request.query_param(ID_KEY)) else {
                return Response::bad_request(format!("missing query key: {ID_KEY}"));
            };

            user_response(self.users.as_ref(), id).await
        }
        .boxed()
    }
}
