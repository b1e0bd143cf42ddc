use percent_encoding::percent_decode_str;

/// Decode an `application/x-www-form-urlencoded` body into ordered pairs.
/// Pairs without `=` get an empty value; empty segments are dropped.
pub fn parse_urlencoded(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode(key), decode(value)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// A posted save request: the anti-forgery token plus region updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveForm {
    pub token: Option<String>,
    /// `(region name, raw body)` in posted order.
    pub updates: Vec<(String, String)>,
}

impl SaveForm {
    /// Split a decoded form into the token field and the region fields.
    pub fn from_pairs(pairs: Vec<(String, String)>, token_field: &str) -> Self {
        let mut form = SaveForm::default();
        for (key, value) in pairs {
            if key == token_field {
                form.token = Some(value);
            } else {
                form.updates.push((key, value));
            }
        }
        form
    }

    pub fn parse(body: &str, token_field: &str) -> Self {
        Self::from_pairs(parse_urlencoded(body), token_field)
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.updates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pairs() {
        assert_eq!(
            parse_urlencoded("a=1&b=hello+world&c=%23+Title%0A%0A*x*&flag"),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "hello world".to_string()),
                ("c".to_string(), "# Title\n\n*x*".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert!(parse_urlencoded("").is_empty());
    }

    #[test]
    fn literal_plus_survives_when_encoded() {
        assert_eq!(parse_urlencoded("x=1%2B1")[0].1, "1+1");
    }

    #[test]
    fn splits_token_from_updates() {
        let form = SaveForm::parse("ct-nonce=abc&region-0=Hi&intro=Welcome", "ct-nonce");
        assert_eq!(form.token.as_deref(), Some("abc"));
        assert_eq!(
            form.updates,
            vec![
                ("region-0".to_string(), "Hi".to_string()),
                ("intro".to_string(), "Welcome".to_string()),
            ]
        );
    }

    #[test]
    fn missing_token() {
        let form = SaveForm::parse("region-0=Hi", "ct-nonce");
        assert_eq!(form.token, None);
        assert!(!form.is_empty());
        assert!(SaveForm::parse("", "ct-nonce").is_empty());
    }
}
