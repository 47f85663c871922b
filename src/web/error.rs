use crate::middleware::ClientCtx;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{Error, Result};
use askama_actix::Template;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPageTemplate<'a> {
    client: ClientCtx,
    status: StatusCode,
    error: Option<&'a Error>,
}

/// JSON endpoints keep their own bodies.
fn is_api_request<B>(res: &ServiceResponse<B>) -> bool {
    res.request().path().starts_with("/api/")
}

/// Error pages are HTML and must never be cached by a proxy.
fn set_error_page_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
}

/// Replaces the body of a failed page request with the rendered error page.
pub fn error_document<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    if is_api_request(&res) {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    let page = ErrorPageTemplate {
        client: ClientCtx::default(),
        status: res.status(),
        error: res.response().error(),
    }
    .to_string();

    let mut res = res.map_body(|_, _| EitherBody::<B, BoxBody>::right(BoxBody::new(page)));
    set_error_page_headers(res.response_mut().headers_mut());

    Ok(ErrorHandlerResponse::Response(res))
}

pub fn render_400<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    error_document::<B>(res)
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    error_document::<B>(res)
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    error_document::<B>(res)
}
