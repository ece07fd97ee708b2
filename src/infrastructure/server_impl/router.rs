use std::future::ready;
use std::str::FromStr;
use std::sync::Arc;

use compact_str::CompactString;
use enum_map::EnumMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use thiserror::Error;

use crate::infrastructure::server_impl::request::{Params, Request};
use crate::infrastructure::server_impl::response::Response;
use crate::infrastructure::server_impl::server::Method;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
}

/// Something that turns a matched request into a response.
///
/// Plain `fn(&Request) -> Response` functions implement it, endpoints that need to
/// await (storage lookups) implement it by hand.
pub trait Handler: Send + Sync {
    fn handle<'a>(&'a self, request: &'a Request<'a>) -> BoxFuture<'a, Response>;
}

impl<F> Handler for F
where
    F: Fn(&Request<'_>) -> Response + Send + Sync,
{
    fn handle<'a>(&'a self, request: &'a Request<'a>) -> BoxFuture<'a, Response> {
        ready(self(request)).boxed()
    }
}

#[derive(Clone)]
pub struct Route {
    pub pattern: CompactString,
    pub handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// Ordered routes per supported method. Built once before the listener starts.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: EnumMap<Method, Vec<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route under `method`. Patterns are not de-duplicated, the first one
    /// registered wins at match time.
    pub fn register(
        &mut self,
        method: &str,
        pattern: &str,
        handler: impl Handler + 'static,
    ) -> Result<&mut Self, RouteError> {
        let Ok(method) = Method::from_str(method) else {
            tracing::warn!(method, pattern, "Unsupported method, route not registered");
            return Err(RouteError::UnsupportedMethod(method.to_string()));
        };

        Ok(self.add(method, pattern, handler))
    }

    pub fn add(
        &mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler + 'static,
    ) -> &mut Self {
        tracing::debug!(method = ?method, pattern, "Route registered");
        self.routes[method].push(Route {
            pattern: pattern.into(),
            handler: Arc::new(handler),
        });
        self
    }

    pub fn lookup(&self, method: &str) -> &[Route] {
        Method::from_str(method)
            .map(|m| self.routes[m].as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dispatches parsed requests over a frozen [RouteTable].
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RouteTable>,
}

impl From<RouteTable> for Router {
    fn from(table: RouteTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        table.into()
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Runs the first route whose pattern matches. Unknown methods and unmatched
    /// paths both get the 405 page.
    pub async fn route(&self, mut request: Request<'_>) -> Response {
        let (path, query) = split_path_and_query(request.path);

        if Method::from_str(request.method).is_err() {
            tracing::debug!(method = request.method, "Unsupported method");
            return Response::method_not_allowed();
        }

        for route in self.table.lookup(request.method) {
            let Some(path_variables) = match_and_extract(&route.pattern, path) else {
                continue;
            };

            tracing::debug!(
                method = request.method,
                path,
                pattern = %route.pattern,
                "Route matched"
            );
            request.query = parse_query_params(query);
            request.path_variables = path_variables;
            return route.handler.handle(&request).await;
        }

        tracing::debug!(method = request.method, path, "No route matched");
        Response::method_not_allowed()
    }
}

/// Splits on the first `?`; the query is empty when there is none.
pub fn split_path_and_query(target: &str) -> (&str, &str) {
    target.split_once('?').unwrap_or((target, ""))
}

/// Binds `{name}` segments of `pattern` to the matching segments of `path`.
/// Returns `None` when the segment counts differ or a literal segment differs.
pub fn match_and_extract(pattern: &str, path: &str) -> Option<Params> {
    let pattern_parts = pattern.split('/');
    let path_parts = path.split('/');

    if pattern_parts.clone().count() != path_parts.clone().count() {
        return None;
    }

    let mut vars = Params::default();
    for (pattern_part, path_part) in pattern_parts.zip(path_parts) {
        match pattern_part
            .strip_prefix('{')
            .and_then(|p| p.strip_suffix('}'))
        {
            Some(key) => {
                vars.insert(key.into(), path_part.into());
            }
            None if pattern_part != path_part => return None,
            None => {}
        }
    }

    Some(vars)
}

/// `&`-separated pairs split on their first `=`. Pairs without `=` are dropped.
pub fn parse_query_params(query: &str) -> Params {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::server_impl::response::StatusCode;
    use crate::infrastructure::server_impl::server::parse_http;

    fn echo_vars(request: &Request<'_>) -> Response {
        let mut vars = request
            .path_variables
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>();
        vars.sort();
        Response::ok(vars.join(","))
    }

    fn hello(_: &Request<'_>) -> Response {
        Response::ok("Hello World")
    }

    fn literal(_: &Request<'_>) -> Response {
        Response::ok("literal")
    }

    fn user_and_expand(req: &Request<'_>) -> Response {
        Response::ok(format!(
            "{}:{}",
            req.path_variable("id").unwrap_or("-"),
            req.query_param("expand").unwrap_or("-")
        ))
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (CompactString::from(*k), CompactString::from(*v)))
            .collect()
    }

    #[test]
    fn match_literal_pattern() {
        assert_eq!(match_and_extract("/hello", "/hello"), Some(Params::default()));
        assert_eq!(match_and_extract("/hello", "/world"), None);
    }

    #[test]
    fn match_binds_variables_verbatim() {
        assert_eq!(
            match_and_extract("/users/{id}/posts/{post}", "/users/abc/posts/7"),
            Some(params(&[("id", "abc"), ("post", "7")]))
        );
    }

    #[test]
    fn segment_count_must_match() {
        assert_eq!(match_and_extract("/users/{id}", "/users"), None);
        assert_eq!(match_and_extract("/users/{id}", "/users/5/extra"), None);
        assert_eq!(match_and_extract("/users/{id}", "/users/"), Some(params(&[("id", "")])));
    }

    #[test]
    fn query_params_drop_pairs_without_equals() {
        assert_eq!(
            parse_query_params("id=5&bad&key="),
            params(&[("id", "5"), ("key", "")])
        );
        assert_eq!(parse_query_params("a=b=c"), params(&[("a", "b=c")]));
        assert!(parse_query_params("").is_empty());
    }

    #[test]
    fn split_query_on_first_question_mark() {
        assert_eq!(split_path_and_query("/users?id=1?x"), ("/users", "id=1?x"));
        assert_eq!(split_path_and_query("/users"), ("/users", ""));
    }

    #[test]
    fn register_rejects_unsupported_method() {
        let mut table = RouteTable::new();
        let res = table.register("PATCH", "/hello", hello);
        assert_eq!(
            res.err(),
            Some(RouteError::UnsupportedMethod("PATCH".to_string()))
        );
        assert!(table.is_empty());
        assert!(table.lookup("PATCH").is_empty());
    }

    #[test]
    fn lookup_keeps_registration_order() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/a", hello);
        table.add(Method::GET, "/b", hello);
        table.add(Method::POST, "/c", hello);

        let patterns = table
            .lookup("GET")
            .iter()
            .map(|r| r.pattern.as_str())
            .collect::<Vec<_>>();
        assert_eq!(patterns, ["/a", "/b"]);
        assert_eq!(table.lookup("POST").len(), 1);
        assert!(table.lookup("get").is_empty());
        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn first_registered_wins() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/a/{x}", echo_vars);
        table.add(Method::GET, "/a/b", literal);
        let router = Router::new(table);

        let request = parse_http(b"GET /a/b HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(router.route(request).await, Response::ok("x=b"));
    }

    #[tokio::test]
    async fn query_and_path_variables_are_attached() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/users/{id}", user_and_expand);
        let router = Router::new(table);

        let request = parse_http(b"GET /users/9?expand=true&bad HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(router.route(request).await, Response::ok("9:true"));
    }

    #[tokio::test]
    async fn fallback_for_unmatched_path_and_unknown_method() {
        let mut table = RouteTable::new();
        table.add(Method::GET, "/hello", hello);
        let router = Router::new(table);

        for raw in [
            &b"GET /nope HTTP/1.1\r\n\r\n"[..],
            b"PATCH /hello HTTP/1.1\r\n\r\n",
            b"PUT /hello HTTP/1.1\r\n\r\n",
        ] {
            let response = router.route(parse_http(raw).unwrap()).await;
            assert_eq!(response.status_code, StatusCode::MethodNotAllowed);
        }
    }
}
