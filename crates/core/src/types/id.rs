//! Newtype IDs for type-safe entity references.
//!
//! Orders are keyed by UUIDs generated at fulfillment time; products and
//! payment intents use provider-assigned string identifiers. Wrapping each in
//! its own type prevents mixing them up at call sites.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a persisted order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random order id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OrderId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(feature = "postgres")]
impl ::sqlx::Type<::sqlx::Postgres> for OrderId {
    fn type_info() -> ::sqlx::postgres::PgTypeInfo {
        <Uuid as ::sqlx::Type<::sqlx::Postgres>>::type_info()
    }
}

#[cfg(feature = "postgres")]
impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for OrderId {
    fn decode(
        value: ::sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, Box<dyn ::std::error::Error + Send + Sync + 'static>> {
        Ok(Self(<Uuid as ::sqlx::Decode<'r, ::sqlx::Postgres>>::decode(
            value,
        )?))
    }
}

#[cfg(feature = "postgres")]
impl<'q> ::sqlx::Encode<'q, ::sqlx::Postgres> for OrderId {
    fn encode_by_ref(
        &self,
        buf: &mut ::sqlx::postgres::PgArgumentBuffer,
    ) -> Result<::sqlx::encode::IsNull, Box<dyn ::std::error::Error + Send + Sync + 'static>> {
        <Uuid as ::sqlx::Encode<'q, ::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Macro to define a string-backed ID wrapper for provider-assigned
/// identifiers.
macro_rules! define_string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// Stripe payment-intent identifier (`pi_...`). Doubles as the order
    /// idempotency key.
    PaymentIntentId
);

define_string_id!(
    /// Identifier of a product row. A single fixed product exists in this
    /// deployment; the id comes from configuration.
    ProductId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_ids_are_unique() {
        assert_ne!(OrderId::generate(), OrderId::generate());
    }

    #[test]
    fn order_id_displays_as_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(OrderId::new(uuid).to_string(), uuid.to_string());
    }

    #[test]
    fn payment_intent_id_round_trips() {
        let id = PaymentIntentId::new("pi_3Nv7Kq2eZvKYlo2C");
        assert_eq!(id.as_str(), "pi_3Nv7Kq2eZvKYlo2C");
        assert_eq!(id.into_inner(), "pi_3Nv7Kq2eZvKYlo2C");
    }

    #[test]
    fn string_ids_serialize_transparently() {
        let id = ProductId::new("zine-athens-rainforest");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"zine-athens-rainforest\"");
    }
}
