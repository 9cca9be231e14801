//! Pylon HTTP Client
//!
//! Backend collaborators for the session store, speaking the console's
//! `{ code, message, data }` JSON envelope over `reqwest`.

mod envelope;
mod http;
mod proxy;

pub use envelope::{Envelope, DEFAULT_SUCCESS_CODE};
pub use http::{ApiConfig, HttpApi, LOGIN_PATH, PERMMENU_PATH, PERSON_PATH};
pub use proxy::ProxyRule;
