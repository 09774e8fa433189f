use http::{HeaderMap, Method, Request, Uri};

/// Request-scoped view handed to business methods.
#[derive(Debug, Clone)]
pub struct Context {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl Context {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            headers: req.headers().clone(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_request_metadata() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/user/create?login=x")
            .header("X-Auth", "100500")
            .body(())
            .unwrap();
        let ctx = Context::from_request(&req);
        assert_eq!(*ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/user/create");
        assert_eq!(ctx.header("x-auth"), Some("100500"));
        assert_eq!(ctx.header("missing"), None);
    }
}
