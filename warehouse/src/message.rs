use crate::errors::WarehouseResult;
use uuid::Uuid;

/// Capability set required of a message type stored in a collection.
///
/// # Purpose
/// A [MessageCollection] is generic over the message type it persists; this
/// trait supplies the three capabilities the collection needs: encoding a
/// message to its binary payload, decoding a payload back, and a stable
/// fingerprint of the type's schema used for cross-version compatibility
/// checks.
///
/// # Fingerprints
/// The fingerprint recorded by a collection's first insert is compared with
/// the current type's fingerprint when the collection is reopened; a
/// mismatch is reported by [MessageCollection::type_signature_matches] but
/// does not block operations. The default derives a UUID v5 from the fully
/// qualified type name, which detects renamed or relocated types; override
/// it with a digest of the actual schema when the encoding can evolve
/// without the type name changing.
///
/// # Implementing
/// With the default `serde` feature, [warehouse_message!] implements this
/// trait for any `Serialize + DeserializeOwned` type using MessagePack:
///
/// ```rust,ignore
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct LaserScan {
///     ranges: Vec<f32>,
///     angle_increment: f32,
/// }
///
/// warehouse::warehouse_message!(LaserScan);
/// ```
///
/// [MessageCollection]: crate::collection::MessageCollection
/// [MessageCollection::type_signature_matches]: crate::collection::MessageCollection::type_signature_matches
/// [warehouse_message!]: crate::warehouse_message
pub trait Message: Sized + Send + Sync {
    /// Serializes the message into its binary payload.
    fn encode(&self) -> WarehouseResult<Vec<u8>>;

    /// Deserializes a message from its binary payload.
    fn decode(bytes: &[u8]) -> WarehouseResult<Self>;

    /// A stable digest of the message type's schema.
    fn type_fingerprint() -> String {
        Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            std::any::type_name::<Self>().as_bytes(),
        )
        .to_string()
    }
}

#[cfg(feature = "serde")]
mod serde_support {
    use crate::errors::{ErrorKind, WarehouseError, WarehouseResult};
    use serde::de::DeserializeOwned;
    use serde::Serialize;

    /// Encodes a serde-serializable value as a MessagePack payload.
    pub fn serde_encode<M: Serialize>(message: &M) -> WarehouseResult<Vec<u8>> {
        rmp_serde::to_vec_named(message).map_err(|e| {
            WarehouseError::new(
                &format!("Failed to encode message payload: {}", e),
                ErrorKind::EncodeError,
            )
        })
    }

    /// Decodes a MessagePack payload into a serde-deserializable value.
    pub fn serde_decode<M: DeserializeOwned>(bytes: &[u8]) -> WarehouseResult<M> {
        rmp_serde::from_slice(bytes).map_err(|e| {
            WarehouseError::new(
                &format!("Failed to decode message payload: {}", e),
                ErrorKind::DecodeError,
            )
        })
    }
}

#[cfg(feature = "serde")]
pub use serde_support::{serde_decode, serde_encode};

/// Implements [Message] for a serde-serializable type using MessagePack.
///
/// The single-argument form uses the default type-name fingerprint; the
/// two-argument form records an explicit schema fingerprint:
///
/// ```rust,ignore
/// warehouse::warehouse_message!(LaserScan);
/// warehouse::warehouse_message!(PointCloud, fingerprint = "pc2-v3-xyzrgb");
/// ```
#[cfg(feature = "serde")]
#[macro_export]
macro_rules! warehouse_message {
    ($message:ty) => {
        impl $crate::message::Message for $message {
            fn encode(&self) -> $crate::errors::WarehouseResult<Vec<u8>> {
                $crate::message::serde_encode(self)
            }

            fn decode(bytes: &[u8]) -> $crate::errors::WarehouseResult<Self> {
                $crate::message::serde_decode(bytes)
            }
        }
    };

    ($message:ty, fingerprint = $fingerprint:expr) => {
        impl $crate::message::Message for $message {
            fn encode(&self) -> $crate::errors::WarehouseResult<Vec<u8>> {
                $crate::message::serde_encode(self)
            }

            fn decode(bytes: &[u8]) -> $crate::errors::WarehouseResult<Self> {
                $crate::message::serde_decode(bytes)
            }

            fn type_fingerprint() -> String {
                $fingerprint.to_string()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Pose {
        x: f64,
        y: f64,
        frame: String,
    }

    warehouse_message!(Pose);

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Twist {
        linear: f64,
        angular: f64,
    }

    warehouse_message!(Twist, fingerprint = "twist-v1");

    #[test]
    fn test_encode_decode_round_trip() {
        let pose = Pose {
            x: 1.5,
            y: -2.0,
            frame: "map".to_string(),
        };
        let bytes = pose.encode().unwrap();
        let decoded = Pose::decode(&bytes).unwrap();
        assert_eq!(decoded, pose);
    }

    #[test]
    fn test_decode_garbage_fails_with_decode_error() {
        let result = Pose::decode(&[0xc1, 0xff, 0x00]);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::DecodeError);
    }

    #[test]
    fn test_default_fingerprint_is_stable_and_distinct() {
        assert_eq!(Pose::type_fingerprint(), Pose::type_fingerprint());
        assert_ne!(Pose::type_fingerprint(), Twist::type_fingerprint());
    }

    #[test]
    fn test_explicit_fingerprint() {
        assert_eq!(Twist::type_fingerprint(), "twist-v1");
    }
}
