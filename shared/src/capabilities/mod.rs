//! Capabilities the catalog core asks the shell for: HTTP reads, re-render
//! and history replacement.

mod http;
mod navigation;

pub use self::http::{
    from_crux, into_success_body, HttpError, HttpOutput, HttpResult, ACCEPT_JSON,
};
pub use self::navigation::{Navigation, NavigationOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub navigation: Navigation<Event>,
}
