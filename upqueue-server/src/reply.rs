use serde::Serialize;
use warp::http::header::{CONTENT_TYPE, SET_COOKIE};
use warp::http::HeaderValue;
use warp::http::StatusCode;
use warp::hyper::Body;
use warp::reply::Response;
use warp::Reply;

macro_rules! impl_reply_for_text {
    ($reply:ident, $content_type:expr) => {
        pub struct $reply(String);

        impl From<String> for $reply {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Reply for $reply {
            fn into_response(self) -> Response {
                let mut res = Response::new(Body::from(self.0));
                res.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static($content_type));
                res
            }
        }
    };
}

impl_reply_for_text!(ScriptReply, "application/javascript");
impl_reply_for_text!(TextReply, "text/plain; charset=utf-8");

pub struct JsonReply<T>(T);

impl<T: Serialize + Send> From<T> for JsonReply<T> {
    fn from(t: T) -> Self {
        Self(t)
    }
}

impl<T: Serialize + Send> Reply for JsonReply<T> {
    fn into_response(self) -> Response {
        match serde_json::to_string(&self.0) {
            Ok(json) => {
                let mut res = Response::new(Body::from(json));
                res.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                res
            }
            Err(e) => {
                log::error!("can't serialize reply: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Issues the session cookie along with `R` when the session is new
pub struct SessionReply<R> {
    inner: R,
    cookie: Option<String>,
}

impl<R: Reply> SessionReply<R> {
    pub fn new(inner: R, cookie: Option<String>) -> Self {
        Self { inner, cookie }
    }
}

impl<R: Reply> Reply for SessionReply<R> {
    fn into_response(self) -> Response {
        let mut res = self.inner.into_response();

        if let Some(cookie) = self.cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => log::error!("invalid session cookie {:?}: {}", cookie, e),
            }
        }

        res
    }
}
