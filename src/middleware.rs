pub mod auth_middleware;
pub mod problem_details;
pub mod request_context;

pub use auth_middleware::{AuthenticatedUser, auth_middleware};
pub use problem_details::problem_details_middleware;
pub use request_context::{REQUEST_ID_HEADER, RequestContext, request_context_middleware};
