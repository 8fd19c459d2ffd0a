//! Currency handlers

use axum::Json;

use core_kernel::Currency;

use crate::dto::currency::CurrencyResponse;

/// Lists supported currencies with their display symbols
pub async fn list_currencies() -> Json<Vec<CurrencyResponse>> {
    Json(Currency::ALL.into_iter().map(CurrencyResponse::from).collect())
}
