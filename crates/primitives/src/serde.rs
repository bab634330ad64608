//! Integers wider than a JSON double travel as decimal strings.
//!
//! Decoding also accepts plain JSON integers, which is how small values
//! usually come out of the chain decoder. Strings must be plain ASCII digits,
//! no sign, exponent or fraction.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;


struct Decimal<T>(PhantomData<T>);


impl<'de, T: FromStr> serde::de::Visitor<'de> for Decimal<T> {
    type Value = T;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "a decimal {}", std::any::type_name::<T>())
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<T, E> {
        if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
            return Err(E::custom(format!("`{}` is not a decimal amount", v)))
        }
        T::from_str(v).map_err(|_| {
            E::custom(format!("`{}` does not fit into {}", v, std::any::type_name::<T>()))
        })
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<T, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_u128<E: serde::de::Error>(self, v: u128) -> Result<T, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<T, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::custom(format!("negative amount {}", v)))
        }
    }
}


struct OptionalDecimal<T>(PhantomData<T>);


impl<'de, T: FromStr> serde::de::Visitor<'de> for OptionalDecimal<T> {
    type Value = Option<T>;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "null or a decimal {}", std::any::type_name::<T>())
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        decode_decimal(deserializer).map(Some)
    }
}


pub fn decode_decimal<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where D: serde::Deserializer<'de>,
      T: FromStr
{
    deserializer.deserialize_any(Decimal(PhantomData))
}


pub fn decode_decimal_option<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where D: serde::Deserializer<'de>,
      T: FromStr
{
    deserializer.deserialize_option(OptionalDecimal(PhantomData))
}


/// `#[serde(with = "decimal")]`
pub mod decimal {
    pub use super::decode_decimal as deserialize;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where T: super::Display,
          S: serde::Serializer
    {
        serializer.collect_str(value)
    }
}


/// `#[serde(with = "decimal_option")]`
pub mod decimal_option {
    pub use super::decode_decimal_option as deserialize;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where T: super::Display,
          S: serde::Serializer
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none()
        }
    }
}

