use std::{collections::HashMap, str::FromStr};

use serde_json::Value;

use super::error::{ApiError, TypeError};

pub type FormData = HashMap<String, Value>;

/// Flat request body with typed access. Used by the handlers whose payloads
/// are a handful of scalar fields (login, registration, password change).
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, ApiError>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| TypeError::new("Invalid type conversion").into()),
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_number<T>(&self, key: &str) -> Result<T, ApiError>
    where
        T: FromStr,
    {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => v
                    .to_owned()
                    .parse()
                    .map_err(|_e| TypeError::new("Invalid type conversion").into()),
                None => Err(TypeError::new("Failed to parse value as str").into()),
            },
            None => Err(TypeError::new("Invalid key").into()),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, TypeError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new("Invalid key")),
            },
            None => Err(TypeError::new("Invalid key")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form() -> Form {
        let mut data = FormData::new();
        data.insert("email".to_string(), json!("cook@example.com"));
        data.insert("limit".to_string(), json!("3"));
        Form::from_data(data)
    }

    #[test]
    fn get_str_reads_string_fields() {
        assert_eq!(form().get_str("email").unwrap(), "cook@example.com");
        assert!(form().get_str("missing").is_err());
    }

    #[test]
    fn get_number_parses_string_numbers() {
        let limit: i64 = form().get_number("limit").unwrap();
        assert_eq!(limit, 3);
        assert!(form().get_number::<i64>("email").is_err());
    }
}
