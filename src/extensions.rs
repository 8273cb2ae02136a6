//! Parsing of the negotiated `Sec-WebSocket-Extensions` value.
//!
//! The engine performs the negotiation; the bridge only exposes what the
//! server agreed to, e.g.
//! `permessage-deflate; client_max_window_bits=15; server_no_context_takeover`.

use std::fmt;

use crate::error::{Error, Result};

/// One `name[=value]` parameter of an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionParam {
    /// Parameter name.
    pub name: String,
    /// Value, `None` for flags.
    pub value: Option<String>,
}

impl ExtensionParam {
    /// Parameter with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// Flag parameter.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Parse `name=value`, `name="value"` or `name`.
    pub fn parse(s: &str) -> Self {
        match s.trim().split_once('=') {
            Some((name, value)) => Self::new(name.trim(), value.trim().trim_matches('"')),
            None => Self::flag(s.trim()),
        }
    }
}

impl fmt::Display for ExtensionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A negotiated extension and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionOffer {
    /// Extension name.
    pub name: String,
    /// Parameters in header order.
    pub params: Vec<ExtensionParam>,
}

impl ExtensionOffer {
    /// Extension without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Extension with parameters.
    pub fn with_params(name: impl Into<String>, params: Vec<ExtensionParam>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parse one `name; param; param=value` element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if the name is empty.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');
        let name = parts.next().unwrap_or_default().trim();
        if name.is_empty() {
            return Err(Error::InvalidExtension(format!("empty extension name in {s:?}")));
        }
        let params = parts
            .filter(|p| !p.trim().is_empty())
            .map(ExtensionParam::parse)
            .collect();
        Ok(Self::with_params(name, params))
    }

    /// Parse a full header value of comma-separated extensions.
    ///
    /// An empty or all-whitespace value yields no extensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExtension`] if any element has an empty name.
    pub fn parse_header(header: &str) -> Result<Vec<Self>> {
        if header.trim().is_empty() {
            return Ok(Vec::new());
        }
        header.split(',').map(Self::parse).collect()
    }

    /// Look up a parameter by name.
    pub fn get_param(&self, name: &str) -> Option<&ExtensionParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Check if a parameter is present.
    pub fn has_param(&self, name: &str) -> bool {
        self.get_param(name).is_some()
    }
}

impl fmt::Display for ExtensionOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for param in &self.params {
            write!(f, "; {param}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_forms() {
        assert_eq!(
            ExtensionParam::parse(" client_max_window_bits = 15 "),
            ExtensionParam::new("client_max_window_bits", "15")
        );
        assert_eq!(
            ExtensionParam::parse("server_no_context_takeover"),
            ExtensionParam::flag("server_no_context_takeover")
        );
        assert_eq!(ExtensionParam::parse("x=\"quoted\"").value.as_deref(), Some("quoted"));
    }

    #[test]
    fn test_deflate_response() {
        let offers = ExtensionOffer::parse_header(
            "permessage-deflate; client_max_window_bits=15; server_no_context_takeover",
        )
        .unwrap();
        assert_eq!(offers.len(), 1);
        let deflate = &offers[0];
        assert_eq!(deflate.name, "permessage-deflate");
        assert_eq!(
            deflate.get_param("client_max_window_bits").and_then(|p| p.value.as_deref()),
            Some("15")
        );
        assert!(deflate.has_param("server_no_context_takeover"));
        assert!(!deflate.has_param("client_no_context_takeover"));
    }

    #[test]
    fn test_several_extensions() {
        let offers =
            ExtensionOffer::parse_header("permessage-deflate, x-webkit-deflate-frame").unwrap();
        let names: Vec<_> = offers.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["permessage-deflate", "x-webkit-deflate-frame"]);
    }

    #[test]
    fn test_empty_header_is_empty_list() {
        assert!(ExtensionOffer::parse_header("").unwrap().is_empty());
        assert!(ExtensionOffer::parse_header("   ").unwrap().is_empty());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(matches!(
            ExtensionOffer::parse_header("permessage-deflate, ; bits=1"),
            Err(Error::InvalidExtension(_))
        ));
    }

    #[test]
    fn test_trailing_semicolon_ignored() {
        let offer = ExtensionOffer::parse("permessage-deflate;").unwrap();
        assert!(offer.params.is_empty());
    }

    #[test]
    fn test_display() {
        let offer = ExtensionOffer::with_params(
            "permessage-deflate",
            vec![
                ExtensionParam::new("client_max_window_bits", "10"),
                ExtensionParam::flag("server_no_context_takeover"),
            ],
        );
        assert_eq!(
            offer.to_string(),
            "permessage-deflate; client_max_window_bits=10; server_no_context_takeover"
        );
        assert_eq!(ExtensionOffer::parse(&offer.to_string()).unwrap(), offer);
    }
}
