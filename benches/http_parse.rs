use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use raw_http_server::infrastructure::server_impl::response::{Response, StatusCode};
use raw_http_server::infrastructure::server_impl::router::{
    match_and_extract, parse_query_params, split_path_and_query,
};
use raw_http_server::infrastructure::server_impl::server::parse_http;

const SAMPLE: &[u8] = b"POST /users/create?trace=1 HTTP/1.1\r\nHost: localhost:4221\r\n\
    User-Agent: curl/8.5.0\r\nAccept: */*\r\nContent-Type: application/json\r\n\r\n\
    {\"username\":\"daniel\",\"password\":\"123456\"}";

fn bench_http_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("http_parse");

    group.bench_function(BenchmarkId::new("parse_http", "sample http"), |c| {
        c.iter(|| parse_http(black_box(SAMPLE)))
    });
    group.bench_function(BenchmarkId::new("match_and_extract", "users by id"), |c| {
        c.iter(|| {
            let (path, query) = split_path_and_query(black_box("/users/42/posts/7?expand=true&x"));
            let vars = match_and_extract(black_box("/users/{id}/posts/{post}"), path);
            (vars, parse_query_params(query))
        })
    });
}

fn bench_http_response_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("response_build");

    group.bench_function(BenchmarkId::new("into_http", "with body"), |c| {
        c.iter(|| Response::into_http(black_box(Response::ok("Hello World"))))
    });
    group.bench_function(BenchmarkId::new("into_http", "status only"), |c| {
        c.iter(|| Response::into_http(black_box(Response::from(StatusCode::NoContent))))
    });
}

criterion_group!(http_parse, bench_http_parsing);
criterion_group!(http_response, bench_http_response_build);

criterion_main!(http_parse, http_response);
