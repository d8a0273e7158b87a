//! Coral Dashboard - job scheduler dashboard on Coral Pages
//!
//! The collaborator layer of a scheduler web interface: wire models, the
//! API client, the dashboard store with its named setters, the actions that
//! connect them, the create-job form parser and the route table. Page
//! templates are left to the application.
//!
//! - [`models`]: jobs, metrics and execution records
//! - [`api`]: the [`JobsApi`] contract and [`HttpJobsApi`]
//! - [`store`]: [`dashboard_store`] and its setter names
//! - [`actions`]: [`Actions`], which call the API and update the store
//! - [`form`]: [`JobForm`] parsing and validation
//! - [`routes`]: [`dashboard_routes`] and router options

pub mod actions;
pub mod api;
pub mod form;
pub mod models;
pub mod routes;
pub mod store;

pub use actions::{ActionError, Actions, Submission};
pub use api::{ApiError, HttpJobsApi, JobsApi};
pub use form::{FormError, JobForm};
pub use models::{Job, JobMetadata, JobStat, JobType, Metrics, RemoteProperties};
pub use routes::{DASHBOARD_TITLE, dashboard_router_options, dashboard_routes};
pub use store::dashboard_store;
