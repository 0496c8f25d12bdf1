//! Admission checks
//!
//! Validates incoming commands against the symbol registry before they
//! reach a matcher: known symbol, positive price and quantity, tick/lot
//! conformance, and price presence per order type. Rejections here never
//! mutate engine state.

use std::collections::HashMap;
use types::errors::RejectReason;
use types::ids::Symbol;
use types::numeric::{Price, Quantity};
use types::order::OrderType;
use types::symbol::SymbolSpec;

/// A new-order request as delivered by the transport, pre-admission.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub client_order_id: Option<String>,
    pub symbol: Symbol,
    pub side: types::order::Side,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub quantity: Quantity,
}

/// Read-only registry of hosted symbols.
#[derive(Debug, Clone, Default)]
pub struct SymbolRegistry {
    specs: HashMap<String, SymbolSpec>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: SymbolSpec) {
        self.specs.insert(spec.symbol.as_str().to_string(), spec);
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&SymbolSpec> {
        self.specs.get(symbol.as_str())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &SymbolSpec> {
        self.specs.values()
    }
}

/// Validate a new-order request.
///
/// Returns the spec of the target symbol so the caller can route the
/// order without a second lookup.
pub fn admit<'a>(
    registry: &'a SymbolRegistry,
    request: &NewOrder,
) -> Result<&'a SymbolSpec, RejectReason> {
    let spec = registry
        .get(&request.symbol)
        .ok_or_else(|| RejectReason::UnknownSymbol(request.symbol.as_str().to_string()))?;

    if request.quantity.is_zero() {
        return Err(RejectReason::MalformedOrder(
            "quantity must be positive".into(),
        ));
    }
    if !spec.quantity_conforms(request.quantity) {
        return Err(RejectReason::MalformedOrder(format!(
            "quantity {} not a multiple of lot size {}",
            request.quantity, spec.lot_size
        )));
    }

    match (request.order_type.requires_price(), request.price) {
        (true, None) => {
            return Err(RejectReason::MalformedOrder(
                "limit, IOC, and FOK orders require a price".into(),
            ));
        }
        (false, Some(_)) => {
            return Err(RejectReason::MalformedOrder(
                "market orders must not carry a price".into(),
            ));
        }
        (true, Some(price)) => {
            if !spec.price_conforms(price) {
                return Err(RejectReason::MalformedOrder(format!(
                    "price {} not a multiple of tick size {}",
                    price, spec.tick_size
                )));
            }
        }
        (false, None) => {}
    }

    Ok(spec)
}
