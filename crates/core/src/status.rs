//! Text-valued status enums shared by the engine, the stores and the API.
//!
//! Each enum maps one-to-one onto the lowercase text stored in the database
//! and emitted over JSON; [`as_str`](LifecycleStatus::as_str) and
//! [`from_str_db`](LifecycleStatus::from_str_db) are the only conversions.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored / serialized text form.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }

            /// Parse the stored text form.
            pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    _ => Err(CoreError::Validation(format!(
                        concat!("Invalid ", stringify!($name), " '{}'"),
                        s
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        #[cfg(feature = "sqlx")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(Self::from_str_db(text)?)
            }
        }

        #[cfg(feature = "sqlx")]
        impl sqlx::Encode<'_, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

define_text_enum! {
    /// Which side of the wedding a guest unit belongs to.
    GuestSide {
        Bride => "bride",
        Groom => "groom",
        Neutral => "neutral",
    }
}

define_text_enum! {
    /// Delivery state of one dispatched invite message.
    LifecycleStatus {
        Sent => "sent",
        Delivered => "delivered",
        Read => "read",
        Failed => "failed",
    }
}

define_text_enum! {
    /// Aggregate status of one send run.
    RunStatus {
        Running => "running",
        Completed => "completed",
        Partial => "partial",
        Failed => "failed",
    }
}

define_text_enum! {
    /// Why the eligibility policy refused to dispatch to a recipient.
    RejectionReason {
        DnmBlocked => "dnm_blocked",
        RecipientNotInviteable => "recipient_not_inviteable",
        MissingPhone => "missing_phone",
        MissingSource => "missing_source",
        ProviderConfigurationMissing => "provider_configuration_missing",
    }
}

define_text_enum! {
    /// Outcome of authenticating and parsing one webhook request.
    AuthResult {
        Verified => "verified",
        InvalidSignature => "invalid_signature",
        InvalidPayload => "invalid_payload",
    }
}

define_text_enum! {
    /// Processing outcome recorded on a webhook receipt.
    ReceiptStatus {
        Accepted => "accepted",
        Ignored => "ignored",
        Rejected => "rejected",
    }
}

define_text_enum! {
    /// What produced a lifecycle transition row.
    TransitionSource {
        Dispatch => "dispatch",
        Webhook => "webhook",
    }
}

define_text_enum! {
    /// State of one RSVP conversation session.
    FlowStatus {
        Active => "active",
        Completed => "completed",
        Cancelled => "cancelled",
        Expired => "expired",
    }
}

define_text_enum! {
    /// An attendance answer, for a whole unit or one person.
    RsvpChoice {
        Accept => "accept",
        Decline => "decline",
    }
}

define_text_enum! {
    /// Where a recipient phone number came from.
    SourceKind {
        /// The guest unit's own delivery identity.
        Unit => "unit",
        /// An individual member's identity.
        Person => "person",
    }
}
