//! Currency DTOs

use serde::Serialize;

use core_kernel::Currency;

#[derive(Debug, Serialize)]
pub struct CurrencyResponse {
    pub code: &'static str,
    pub symbol: &'static str,
}

impl From<Currency> for CurrencyResponse {
    fn from(currency: Currency) -> Self {
        Self {
            code: currency.code(),
            symbol: currency.symbol(),
        }
    }
}
