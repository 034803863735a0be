//! Handlers for products.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::domain::models::product::{CreateProductRequest, Product, UpdateProductRequest};
use crate::error::AppError;
use crate::rest::{ApiResponse, AppState, IdQuery};

fn new_product_id() -> String {
    format!("product::{}", Utc::now().timestamp_millis())
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    info!("POST /api/products - name: {}", request.name);
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if request.price < 0.0 {
        return Err(AppError::Validation("Price must not be negative".to_string()));
    }

    let now = Utc::now();
    let product = Product {
        id: new_product_id(),
        name: request.name,
        price: request.price,
        description: request.description,
        image_url: request.image_url,
        created_at: now,
        updated_at: now,
    };
    state.product_repository.insert(&product).await?;
    Ok(Json(ApiResponse::success("Product created", product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    info!("PUT /api/products - id: {}", request.id);
    let product = state
        .product_repository
        .update(&request)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(ApiResponse::success("Product updated", product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<Product>>, AppError> {
    let id = query.require()?;
    info!("GET /api/products/detail - id: {}", id);
    let product = state
        .product_repository
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(ApiResponse::success("Product found", product)))
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>, AppError> {
    info!("GET /api/products");
    let products = state.product_repository.get_all().await?;
    Ok(Json(ApiResponse::success("Products", products)))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = query.require()?;
    info!("DELETE /api/products - id: {}", id);
    if !state.product_repository.delete(&id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    Ok(Json(ApiResponse::success("Product deleted", ())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_state;

    #[tokio::test]
    async fn partial_update_keeps_unsupplied_fields() {
        let state = test_state().await;
        let created = create_product(
            State(state.clone()),
            Json(CreateProductRequest {
                name: "Gạo ST25".to_string(),
                price: 35_000.0,
                description: Some("Túi 5kg".to_string()),
                image_url: None,
            }),
        )
        .await
        .unwrap();
        let product = created.0.data.unwrap();

        let updated = update_product(
            State(state),
            Json(UpdateProductRequest {
                id: product.id.clone(),
                price: Some(32_000.0),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let updated = updated.0.data.unwrap();
        assert_eq!(updated.price, 32_000.0);
        assert_eq!(updated.name, "Gạo ST25");
        assert_eq!(updated.description.as_deref(), Some("Túi 5kg"));
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let state = test_state().await;
        let result = create_product(
            State(state),
            Json(CreateProductRequest {
                name: "X".to_string(),
                price: -1.0,
                description: None,
                image_url: None,
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
