use sxp_primitives::serde::decode_decimal;


/// Unsigned amount which the chain encodes either as a JSON integer
/// or as a decimal string (values above `u64::MAX` are always strings).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct Amount(pub u128);


impl <'de> serde::Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>
    {
        decode_decimal(deserializer).map(Amount)
    }
}


impl Amount {
    pub fn from_json(value: &serde_json::Value) -> anyhow::Result<u128> {
        let amount: Amount = serde::Deserialize::deserialize(value)?;
        Ok(amount.0)
    }
}
