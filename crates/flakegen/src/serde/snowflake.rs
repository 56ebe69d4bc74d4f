use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{SerdeError, SnowflakeId};

impl Serialize for SnowflakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        as_native_snow::serialize(self, s)
    }
}

impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        as_native_snow::deserialize(d)
    }
}

fn validate<E>(raw: u64) -> Result<SnowflakeId, E>
where
    E: serde::de::Error,
{
    let id = SnowflakeId::from_raw(raw);
    if !id.is_valid() {
        return Err(E::custom(SerdeError::DecodeOverflow { raw }));
    }
    Ok(id)
}

/// Serialize a Snowflake ID as its native `u64`. This is also what the
/// [`Serialize`] impl on [`SnowflakeId`] does.
pub mod as_native_snow {
    use super::{Deserialize, Deserializer, Serialize, Serializer, validate};
    use crate::SnowflakeId;

    /// Serialize a Snowflake ID as its native integer representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_raw().serialize(s)
    }

    /// Deserialize a Snowflake ID from its native integer representation.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The value sets the reserved bit
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        validate(u64::deserialize(d)?)
    }
}

/// Serialize a Snowflake ID as a decimal string.
///
/// JSON consumers that store numbers as `f64` lose precision above 2^53, which
/// every ID past the first few days of the epoch exceeds.
pub mod as_decimal_snow {
    use super::{Deserializer, Serializer, validate};
    use crate::SnowflakeId;

    /// Serialize a Snowflake ID as its decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(id)
    }

    /// Deserialize a Snowflake ID from a decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The string is not a decimal `u64`
    /// - The value sets the reserved bit
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DecimalVisitor;

        impl serde::de::Visitor<'_> for DecimalVisitor {
            type Value = SnowflakeId;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a decimal encoded snowflake id")
            }

            #[inline]
            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let raw = v.parse::<u64>().map_err(E::custom)?;
                validate(raw)
            }
        }

        d.deserialize_str(DecimalVisitor)
    }
}
