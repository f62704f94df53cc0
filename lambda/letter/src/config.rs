use lambda_http::Error;

const DEFAULT_TABLE: &str = "digital-chitthi-letters";
const DEFAULT_BASE_HOST: &str = "digital-chitthi-web.s3-website-us-east-1.amazonaws.com";

/// Settings read once at cold start.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) letters_table: String,
    pub(crate) base_host: String,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let var = |key: &str, default: &str| match lookup(key) {
            Some(v) if v.trim().is_empty() => Err(Error::from(format!("{key} is set but empty"))),
            Some(v) => Ok(v),
            None => Ok(default.to_string()),
        };

        Ok(Self {
            letters_table: var("LETTERS_TABLE", DEFAULT_TABLE)?,
            base_host: var("LETTER_BASE_HOST", DEFAULT_BASE_HOST)?,
        })
    }

    pub(crate) fn letter_url(&self, letter_id: &str) -> String {
        format!("http://{}/letter/{}", self.base_host, letter_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.letters_table, DEFAULT_TABLE);
        assert_eq!(config.base_host, DEFAULT_BASE_HOST);
    }

    #[test]
    fn reads_overrides_and_rejects_empty() {
        let env: HashMap<&str, &str> =
            HashMap::from([("LETTERS_TABLE", "letters-dev"), ("LETTER_BASE_HOST", "localhost:8080")]);
        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.letters_table, "letters-dev");
        assert_eq!(config.letter_url("abc"), "http://localhost:8080/letter/abc");

        assert!(Config::from_lookup(|k| (k == "LETTERS_TABLE").then(|| " ".to_string())).is_err());
    }
}
