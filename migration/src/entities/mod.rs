pub mod analytics_event;
pub mod client_error;
pub mod contact;
pub mod page_view;
pub mod profile;
pub mod project;
pub mod visitor_session;
pub mod web_vital;

pub use analytics_event::Entity as AnalyticsEventEntity;
pub use client_error::Entity as ClientErrorEntity;
pub use contact::Entity as ContactEntity;
pub use page_view::Entity as PageViewEntity;
pub use profile::Entity as ProfileEntity;
pub use project::Entity as ProjectEntity;
pub use visitor_session::Entity as VisitorSessionEntity;
pub use web_vital::Entity as WebVitalEntity;
