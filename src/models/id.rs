use serde::{Deserialize, Deserializer};

// The backend sends numeric ids; the client treats every id as a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

pub fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "deserialize_id")]
        id: String,
        #[serde(default, deserialize_with = "deserialize_nullable_string")]
        note: String,
    }

    #[test]
    fn test_numeric_id_is_stringified() {
        let holder: Holder = serde_json::from_str(r#"{"id": 42, "note": "x"}"#).unwrap();
        assert_eq!(holder.id, "42");
        assert_eq!(holder.note, "x");
    }

    #[test]
    fn test_string_id_and_null_note() {
        let holder: Holder = serde_json::from_str(r#"{"id": "abc", "note": null}"#).unwrap();
        assert_eq!(holder.id, "abc");
        assert_eq!(holder.note, "");
    }
}
