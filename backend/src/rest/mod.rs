//! HTTP surface: the response envelope, application state, and the router.
//!
//! Every handler returns the `{status, message, data}` envelope. Handlers
//! stay thin; person, invoice, and user requests go through their services,
//! the school entities talk to their repositories directly.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::auth::require_auth;
use crate::config::Config;
use crate::domain::{InvoiceService, PersonService, UserService};
use crate::storage::classroom_repository::ClassroomRepository;
use crate::storage::invoice_repository::InvoiceRepository;
use crate::storage::person_repository::PersonRepository;
use crate::storage::product_repository::ProductRepository;
use crate::storage::schedule_repository::ScheduleRepository;
use crate::storage::subject_repository::SubjectRepository;
use crate::storage::teacher_repository::TeacherRepository;
use crate::storage::user_repository::UserRepository;
use crate::storage::DbConnection;

pub mod classroom_apis;
pub mod invoice_apis;
pub mod person_apis;
pub mod product_apis;
pub mod schedule_apis;
pub mod subject_apis;
pub mod teacher_apis;
pub mod user_apis;

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    /// Present on every response; null on errors.
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

/// Paged list payload carried inside the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub person_service: PersonService,
    pub invoice_service: InvoiceService,
    pub user_service: UserService,
    pub teacher_repository: TeacherRepository,
    pub subject_repository: SubjectRepository,
    pub classroom_repository: ClassroomRepository,
    pub schedule_repository: ScheduleRepository,
    pub product_repository: ProductRepository,
}

impl AppState {
    pub fn new(db: DbConnection, config: Arc<Config>) -> Self {
        Self {
            person_service: PersonService::new(PersonRepository::new(db.clone())),
            invoice_service: InvoiceService::new(InvoiceRepository::new(db.clone())),
            user_service: UserService::new(UserRepository::new(db.clone()), config.clone()),
            teacher_repository: TeacherRepository::new(db.clone()),
            subject_repository: SubjectRepository::new(db.clone()),
            classroom_repository: ClassroomRepository::new(db.clone()),
            schedule_repository: ScheduleRepository::new(db.clone()),
            product_repository: ProductRepository::new(db),
            config,
        }
    }
}

/// Build the full application router. Everything under `/api` requires a
/// bearer token; `/login` is the only open route.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/persons",
            post(person_apis::create_person)
                .put(person_apis::update_person)
                .get(person_apis::get_person)
                .delete(person_apis::delete_person),
        )
        .route("/persons/search", get(person_apis::search_persons))
        .route("/persons/family", get(person_apis::get_family_info))
        .route(
            "/invoices",
            post(invoice_apis::create_invoice)
                .get(invoice_apis::list_invoices)
                .delete(invoice_apis::delete_invoice),
        )
        .route("/invoices/detail", get(invoice_apis::get_invoice))
        .route("/invoices/summary", get(invoice_apis::invoice_summary))
        .route(
            "/invoices/report/products",
            get(invoice_apis::product_sales_report),
        )
        .route(
            "/invoices/report/grouped",
            get(invoice_apis::sales_by_period_report),
        )
        .route(
            "/teachers",
            post(teacher_apis::create_teacher)
                .put(teacher_apis::update_teacher)
                .get(teacher_apis::list_teachers)
                .delete(teacher_apis::delete_teacher),
        )
        .route("/teachers/detail", get(teacher_apis::get_teacher))
        .route(
            "/subjects",
            post(subject_apis::create_subject)
                .put(subject_apis::update_subject)
                .get(subject_apis::list_subjects)
                .delete(subject_apis::delete_subject),
        )
        .route("/subjects/detail", get(subject_apis::get_subject))
        .route(
            "/classrooms",
            post(classroom_apis::create_classroom)
                .put(classroom_apis::update_classroom)
                .get(classroom_apis::list_classrooms)
                .delete(classroom_apis::delete_classroom),
        )
        .route("/classrooms/detail", get(classroom_apis::get_classroom))
        .route(
            "/schedules",
            post(schedule_apis::create_schedule)
                .put(schedule_apis::update_schedule)
                .get(schedule_apis::list_schedules)
                .delete(schedule_apis::delete_schedule),
        )
        .route("/schedules/detail", get(schedule_apis::get_schedule))
        .route("/schedules/by-week", get(schedule_apis::get_schedule_by_week))
        .route(
            "/products",
            post(product_apis::create_product)
                .put(product_apis::update_product)
                .get(product_apis::list_products)
                .delete(product_apis::delete_product),
        )
        .route("/products/detail", get(product_apis::get_product))
        .route(
            "/users",
            post(user_apis::create_user).get(user_apis::list_users),
        )
        .route("/users/person", put(user_apis::update_person_link))
        .route("/users/password", put(user_apis::change_password))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/login", post(user_apis::login))
        .nest("/api", api)
        .layer(cors)
        .with_state(state)
}

/// Shared `?id=` query shape.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    /// Unwrap the id or fail with the standard message.
    pub fn require(self) -> Result<String, crate::error::AppError> {
        self.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| crate::error::AppError::Validation("Missing id query param".to_string()))
    }
}

#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let db = DbConnection::init_test().await.expect("init test db");
    let config = Arc::new(Config {
        port: 0,
        database_url: String::new(),
        jwt_secret: "test-secret".to_string(),
        admin_username: "admin".to_string(),
        admin_password: "admin123".to_string(),
    });
    AppState::new(db, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_builds() {
        let state = test_state().await;
        let _router = router(state);
    }

    #[test]
    fn envelope_shapes() {
        let ok = ApiResponse::success("done", 7);
        assert_eq!(ok.status, "success");
        assert_eq!(ok.data, Some(7));

        let err = ApiResponse::<()>::error("boom");
        assert_eq!(err.status, "error");
        assert!(err.data.is_none());
    }

    #[test]
    fn error_envelope_serializes_null_data() {
        let err = ApiResponse::<()>::error("boom");
        let value = serde_json::to_value(&err).expect("serialize envelope");
        assert_eq!(value["data"], serde_json::Value::Null);
    }
}
