pub mod test {
    use std::convert::Infallible;
    use std::net::SocketAddr;

    use futures::Future;
    use hyper::server::conn::Http;
    use hyper::service::service_fn;
    use hyper::{Body, Method, StatusCode};
    use hyper::{Request, Response};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    pub const HEALTH_PATH: &str = "/health";
    pub const HEADER_NAME: &str = "Content-Type";
    pub const HEADER_VALUE: &str = "nothing";
    pub const REPEATED_HEADER: &str = "X-Trace";
    pub const USERNAME: &str = "trillian";
    pub const PASSWORD: &str = "tricia123";
    // base64("trillian:tricia123")
    const AUTHORIZATION: &str = "Basic dHJpbGxpYW46dHJpY2lhMTIz";
    pub const TIMEOUT: u64 = 3;

    fn status(code: StatusCode) -> Result<Response<Body>, Infallible> {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = code;
        Ok(response)
    }

    /// 200 for `HEAD /health`, 404 for everything else.
    pub async fn http_handler_head_health(
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        if request.uri().path() != HEALTH_PATH || request.method() != Method::HEAD {
            return status(StatusCode::NOT_FOUND);
        }
        status(StatusCode::OK)
    }

    pub async fn http_handler_always_204(
        _request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        status(StatusCode::NO_CONTENT)
    }

    pub async fn http_handler_always_500(
        _request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub async fn http_handler_delay(
        _request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        tokio::time::sleep(tokio::time::Duration::from_secs(TIMEOUT)).await;
        status(StatusCode::OK)
    }

    /// 200 only when `X-Trace` arrives with exactly the values `a` and `b`.
    pub async fn http_handler_repeated_header(
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        let values: Vec<&str> = request
            .headers()
            .get_all(REPEATED_HEADER)
            .iter()
            .map(|v| v.to_str().unwrap_or(""))
            .collect();

        if values == ["a", "b"] {
            return status(StatusCode::OK);
        }
        status(StatusCode::BAD_REQUEST)
    }

    /// 204 only for a `POST /healthy` carrying the test header and credentials.
    pub async fn http_handler_check_request(
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        if request.uri().path() != "/healthy" {
            return status(StatusCode::NOT_FOUND);
        }

        if request.method() != Method::POST {
            return status(StatusCode::METHOD_NOT_ALLOWED);
        }

        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .map(|v| v.to_str().unwrap_or(""))
                .unwrap_or("")
                .to_string()
        };

        if header(HEADER_NAME) != HEADER_VALUE {
            return status(StatusCode::NOT_ACCEPTABLE);
        }

        if header("Authorization") != AUTHORIZATION {
            return status(StatusCode::UNAUTHORIZED);
        }

        status(StatusCode::NO_CONTENT)
    }

    async fn bind_local() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    /// A port on localhost that nothing is listening on.
    pub async fn closed_port() -> u16 {
        let (listener, port) = bind_local().await;
        drop(listener);
        port
    }

    /// Accepts connections and closes them straight away.
    pub async fn tcp_server() -> (u16, JoinHandle<()>) {
        let (listener, port) = bind_local().await;

        let handle = tokio::spawn(async move {
            loop {
                let _ = listener.accept().await;
            }
        });

        (port, handle)
    }

    /// Binds a listener that never accepts; the caller owns it.
    pub async fn tcp_listener() -> (TcpListener, SocketAddr) {
        let (listener, _) = bind_local().await;
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    pub async fn http1_server<F, S>(f: F) -> (u16, JoinHandle<()>)
    where
        F: FnMut(Request<Body>) -> S + Send + std::marker::Copy + 'static,
        S: Future<Output = Result<Response<Body>, Infallible>> + Send + Sync + 'static,
    {
        let (listener, port) = bind_local().await;

        let handle = tokio::spawn(async move {
            loop {
                let (tcp_stream, _) = listener.accept().await.unwrap();

                tokio::spawn(async move {
                    let _ = Http::new()
                        .http1_only(true)
                        .serve_connection(tcp_stream, service_fn(f))
                        .await;
                });
            }
        });

        (port, handle)
    }
}
