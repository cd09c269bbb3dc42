//! Domain services shared by the public and admin APIs

pub mod contact_service;
pub mod geoip;
pub mod mailer;
pub mod profile_service;
pub mod project_service;
pub mod uploads;

pub use contact_service::{ContactService, ContactSubmission, SubmissionOutcome};
pub use geoip::{GeoInfo, GeoIpService};
pub use mailer::Mailer;
pub use profile_service::{ProfilePatch, ProfileService};
pub use project_service::{NewProject, ProjectPatch, ProjectService, PublishedFilter};
pub use uploads::UploadService;
