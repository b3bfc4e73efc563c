pub mod duration {
    use crate::time::DurationUnit;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.parse::<DurationUnit>() {
            Ok(unit) => Ok(unit.into()),
            Err(err) => Err(D::Error::custom(err.to_string())),
        }
    }
}
