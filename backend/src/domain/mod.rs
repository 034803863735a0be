//! Domain layer: models plus the services that own the business rules.

pub mod invoice_service;
pub mod models;
pub mod person_service;
pub mod user_service;

pub use invoice_service::InvoiceService;
pub use person_service::PersonService;
pub use user_service::UserService;
