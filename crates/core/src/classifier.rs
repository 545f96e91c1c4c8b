//! Line items and the shipping classifier.
//!
//! A checkout needs physical delivery iff at least one of its lines is a
//! physical product. Digital-only checkouts skip the address and shipping
//! method steps entirely.

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::interfaces::Catalog;
use crate::types::VariantId;

/// Product-type level classification of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Physical,
    Digital,
}

/// Anything that can say whether it must be shipped.
pub trait Shippable {
    /// `true` if fulfilling this item needs physical delivery.
    fn is_physical(&self) -> bool;
}

impl Shippable for ProductKind {
    fn is_physical(&self) -> bool {
        matches!(self, Self::Physical)
    }
}

impl<T: Shippable + ?Sized> Shippable for &T {
    fn is_physical(&self) -> bool {
        (**self).is_physical()
    }
}

/// Whether any item requires shipping.
///
/// Pure and total: the empty sequence needs no shipping.
pub fn is_shipping_required<I>(items: I) -> bool
where
    I: IntoIterator,
    I::Item: Shippable,
{
    items.into_iter().any(|item| item.is_physical())
}

/// A purchased variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub variant_id: VariantId,
    pub quantity: u32,
    pub is_digital: bool,
}

impl Shippable for LineItem {
    fn is_physical(&self) -> bool {
        !self.is_digital
    }
}

/// A requested line, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub variant_id: VariantId,
    pub quantity: i64,
}

impl LineInput {
    /// Create a new line request.
    #[must_use]
    pub fn new(variant_id: impl Into<VariantId>, quantity: i64) -> Self {
        Self {
            variant_id: variant_id.into(),
            quantity,
        }
    }
}

/// Which quantities [`resolve_lines`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityRule {
    /// Strictly positive (create, add).
    Positive,
    /// Zero allowed; a zero quantity removes the line (update).
    AllowZero,
}

/// Validate quantities and classify each requested variant via the catalog.
///
/// The catalog is called once for the whole batch.
///
/// # Errors
///
/// - [`CheckoutError::InvalidQuantity`] for a quantity outside the rule or
///   above `u32::MAX`
/// - [`CheckoutError::VariantNotFound`] for a variant the catalog does not know
/// - [`CheckoutError::Collaborator`] if the catalog cannot answer
pub async fn resolve_lines(
    catalog: &dyn Catalog,
    inputs: &[LineInput],
    rule: QuantityRule,
) -> Result<Vec<LineItem>, CheckoutError> {
    let min = match rule {
        QuantityRule::Positive => 1,
        QuantityRule::AllowZero => 0,
    };
    let mut quantities = Vec::with_capacity(inputs.len());
    for input in inputs {
        let quantity = u32::try_from(input.quantity)
            .ok()
            .filter(|q| *q >= min)
            .ok_or_else(|| CheckoutError::InvalidQuantity {
                variant: input.variant_id.clone(),
                quantity: input.quantity,
            })?;
        quantities.push(quantity);
    }

    let variants: Vec<VariantId> = inputs.iter().map(|i| i.variant_id.clone()).collect();
    let kinds = catalog.product_kinds(&variants).await?;

    variants
        .into_iter()
        .zip(quantities)
        .zip(kinds.into_iter().map(Some).chain(std::iter::repeat(None)))
        .map(|((variant_id, quantity), kind)| match kind.flatten() {
            Some(kind) => Ok(LineItem {
                variant_id,
                quantity,
                is_digital: kind == ProductKind::Digital,
            }),
            None => Err(CheckoutError::VariantNotFound(variant_id)),
        })
        .collect()
}
