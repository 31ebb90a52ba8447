//! Typed Azure Resource Manager IDs.
//!
//! Every ID type declares an ordered template of [`Segment`]s. One parser and
//! one formatter walk that template, so the string an ID formats to is always
//! the string it parses from.
//!
//! ```
//! use azurerm_signalr_provider::resourceids::{ResourceId, WebPubsubHubId};
//!
//! let id = WebPubsubHubId::new(
//!     "12345678-1234-9876-4563-123456789012",
//!     "resGroup1",
//!     "Webpubsub1",
//!     "Webpubsubhub1",
//! );
//! assert_eq!(
//!     id.id(),
//!     "/subscriptions/12345678-1234-9876-4563-123456789012/resourceGroups/resGroup1\
//!      /providers/Microsoft.SignalRService/webPubSub/Webpubsub1/hubs/Webpubsubhub1"
//! );
//!
//! let parsed = WebPubsubHubId::parse(&id.id()).unwrap();
//! assert_eq!(parsed, id);
//!
//! // Some APIs return `WebPubSub` instead of `webPubSub`.
//! let legacy = id.id().replace("/webPubSub/", "/WebPubSub/");
//! assert!(WebPubsubHubId::parse(&legacy).is_err());
//! assert_eq!(WebPubsubHubId::parse_insensitively(&legacy).unwrap(), id);
//! ```

mod signalr;
mod webpubsub;

pub use signalr::{CustomCertificateId, CustomDomainId, SharedPrivateLinkResourceId, SignalRId};
pub use webpubsub::{
    WebPubsubCustomCertificateId, WebPubsubCustomDomainId, WebPubsubHubId, WebPubsubId,
    WebPubsubSharedPrivateLinkResourceId,
};

use crate::error::IdError;

/// The resource provider namespace for SignalR and Web PubSub.
pub const SIGNALR_SERVICE_NAMESPACE: &str = "Microsoft.SignalRService";

/// What follows a literal segment in an ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentValue {
    /// A caller-chosen value, such as a resource name.
    User {
        /// Field name, used to hand parsed values back to the ID type.
        field: &'static str,
        /// Label used in the human-readable description.
        label: &'static str,
    },
    /// A fixed resource provider namespace.
    Namespace(&'static str),
}

/// A literal path segment and the value that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// The canonical spelling of the literal segment.
    pub literal: &'static str,
    /// The value paired with the literal.
    pub value: SegmentValue,
}

impl Segment {
    /// A literal followed by a caller-chosen value.
    pub const fn user(literal: &'static str, field: &'static str, label: &'static str) -> Self {
        Self {
            literal,
            value: SegmentValue::User { field, label },
        }
    }

    /// `providers/{namespace}`.
    pub const fn namespace(namespace: &'static str) -> Self {
        Self {
            literal: "providers",
            value: SegmentValue::Namespace(namespace),
        }
    }
}

/// `subscriptions/{subscriptionId}`
pub const SUBSCRIPTION: Segment = Segment::user("subscriptions", "subscriptionId", "Subscription");

/// `resourceGroups/{resourceGroupName}`
pub const RESOURCE_GROUP: Segment =
    Segment::user("resourceGroups", "resourceGroupName", "Resource Group");

/// `providers/Microsoft.SignalRService`
pub const SIGNALR_PROVIDER: Segment = Segment::namespace(SIGNALR_SERVICE_NAMESPACE);

/// How literal segments (and the provider namespace) are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Literal segments must match their canonical spelling exactly.
    #[default]
    Exact,
    /// Literal segments may use any casing.
    ///
    /// Only for normalizing IDs returned by APIs or stored in state; never for
    /// validating user input.
    Insensitive,
}

impl MatchMode {
    /// Compare an expected literal against the text found in the input.
    pub fn matches(self, expected: &str, actual: &str) -> bool {
        match self {
            MatchMode::Exact => expected == actual,
            MatchMode::Insensitive => expected.eq_ignore_ascii_case(actual),
        }
    }
}

/// One `literal/value` pair from the input path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawSegment<'a> {
    literal: &'a str,
    value: &'a str,
}

fn tokenize(input: &str) -> Result<Vec<RawSegment<'_>>, IdError> {
    if input.is_empty() {
        return Err(IdError::Malformed {
            id: input.to_string(),
            reason: "the ID was empty",
        });
    }

    let Some(path) = input.strip_prefix('/') else {
        return Err(IdError::Malformed {
            id: input.to_string(),
            reason: "the ID must begin with a '/'",
        });
    };

    let parts: Vec<&str> = path.split('/').collect();
    let mut pairs = Vec::with_capacity(parts.len() / 2 + 1);
    for (index, chunk) in parts.chunks(2).enumerate() {
        let literal = chunk[0];
        let value = chunk.get(1).copied().unwrap_or("");
        if literal.is_empty() {
            // `/a/b/` (or `/`) leaves one empty literal at the very end
            let is_last = (index + 1) * 2 >= parts.len();
            if is_last && chunk.len() == 1 {
                break;
            }
            return Err(IdError::Malformed {
                id: input.to_string(),
                reason: "the ID contains an empty segment",
            });
        }
        pairs.push(RawSegment { literal, value });
    }

    Ok(pairs)
}

/// Values extracted by a successful parse, keyed by field name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedSegments {
    values: Vec<(&'static str, String)>,
}

impl ParsedSegments {
    /// Take the value parsed for `field`.
    ///
    /// A successful parse yields every user field of the template, so this only
    /// returns an empty string when asked for a field the template lacks.
    pub fn take(&mut self, field: &str) -> String {
        self.values
            .iter_mut()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| std::mem::take(value))
            .unwrap_or_default()
    }

    /// The ordered `(field, value)` pairs.
    pub fn values(&self) -> &[(&'static str, String)] {
        &self.values
    }
}

/// Parse `input` against `template` using `mode` to compare literals.
pub fn parse_segments(
    input: &str,
    template: &[Segment],
    mode: MatchMode,
) -> Result<ParsedSegments, IdError> {
    let pairs = tokenize(input)?;
    let mut parsed = ParsedSegments {
        values: Vec::with_capacity(template.len()),
    };

    for (position, segment) in template.iter().enumerate() {
        let Some(pair) = pairs.get(position) else {
            return Err(IdError::MissingElement {
                segment: segment.literal,
            });
        };

        if !mode.matches(segment.literal, pair.literal) {
            let later = pairs[position..]
                .iter()
                .any(|p| mode.matches(segment.literal, p.literal));
            if later {
                return Err(IdError::UnexpectedSegment {
                    segment: pair.literal.to_string(),
                });
            }
            return Err(IdError::MissingElement {
                segment: segment.literal,
            });
        }

        if pair.value.is_empty() {
            return Err(IdError::MissingValue {
                segment: segment.literal,
            });
        }

        match segment.value {
            SegmentValue::User { field, .. } => {
                parsed.values.push((field, pair.value.to_string()));
            }
            SegmentValue::Namespace(namespace) => {
                if !mode.matches(namespace, pair.value) {
                    return Err(IdError::UnexpectedNamespace {
                        expected: namespace,
                        actual: pair.value.to_string(),
                    });
                }
            }
        }
    }

    if let Some(extra) = pairs.get(template.len()) {
        return Err(IdError::UnexpectedSegment {
            segment: extra.literal.to_string(),
        });
    }

    Ok(parsed)
}

/// Render `values` (one per user segment, in template order) into an ID string.
///
/// Values are inserted verbatim.
pub fn format_segments(template: &[Segment], values: &[&str]) -> String {
    let mut values = values.iter();
    let mut out = String::new();
    for segment in template {
        out.push('/');
        out.push_str(segment.literal);
        out.push('/');
        match segment.value {
            SegmentValue::User { .. } => out.push_str(values.next().copied().unwrap_or_default()),
            SegmentValue::Namespace(namespace) => out.push_str(namespace),
        }
    }
    out
}

/// Human-readable form: `Web Pubsub Hub: (Hub Name "x" / Web Pub Sub Name "y" / Resource Group "z")`.
pub fn describe_segments(description: &str, template: &[Segment], values: &[&str]) -> String {
    let labels = template.iter().filter_map(|segment| match segment.value {
        SegmentValue::User { field, label } => Some((field, label)),
        SegmentValue::Namespace(_) => None,
    });

    let mut components: Vec<String> = labels
        .zip(values.iter())
        .filter(|((field, _), _)| *field != "subscriptionId")
        .map(|((_, label), value)| format!("{} {:?}", label, value))
        .collect();
    components.reverse();

    format!("{}: ({})", description, components.join(" / "))
}

/// A typed ARM resource ID.
///
/// Implementors supply the template and the mapping between fields and parsed
/// values; parsing, formatting and the description come from the template.
pub trait ResourceId: Sized {
    /// Ordered segments of this ID type.
    const TEMPLATE: &'static [Segment];

    /// Name used in the human-readable description.
    const DESCRIPTION: &'static str;

    /// Build the ID from the values of a successful parse.
    fn from_segments(segments: ParsedSegments) -> Self;

    /// The user values in template order.
    fn segment_values(&self) -> Vec<&str>;

    /// Parse an ID whose literal segments use their canonical casing.
    fn parse(input: &str) -> Result<Self, IdError> {
        Self::parse_with(input, MatchMode::Exact)
    }

    /// Parse an ID ignoring the casing of literal segments.
    ///
    /// Use this only to normalize IDs from API responses or stored state.
    fn parse_insensitively(input: &str) -> Result<Self, IdError> {
        Self::parse_with(input, MatchMode::Insensitive)
    }

    /// Parse with an explicit match mode.
    fn parse_with(input: &str, mode: MatchMode) -> Result<Self, IdError> {
        parse_segments(input, Self::TEMPLATE, mode).map(Self::from_segments)
    }

    /// The canonical ID string.
    fn id(&self) -> String {
        format_segments(Self::TEMPLATE, &self.segment_values())
    }

    /// Human-readable description for error messages and logs.
    fn describe(&self) -> String {
        describe_segments(Self::DESCRIPTION, Self::TEMPLATE, &self.segment_values())
    }
}

/// Implements `Display`, `FromStr` and serde for a [`ResourceId`] type.
///
/// `Display` is the human-readable description; serde uses the canonical ID.
macro_rules! impl_resource_id_traits {
    ($name:ident) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&$crate::resourceids::ResourceId::describe(self))
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$name as $crate::resourceids::ResourceId>::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&$crate::resourceids::ResourceId::id(self))
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                <$name as $crate::resourceids::ResourceId>::parse(&s)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_resource_id_traits;

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &[Segment] = &[
        SUBSCRIPTION,
        RESOURCE_GROUP,
        SIGNALR_PROVIDER,
        Segment::user("webPubSub", "webPubSubName", "Web Pub Sub Name"),
        Segment::user("hubs", "hubName", "Hub Name"),
    ];

    const CANONICAL: &str = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.SignalRService/webPubSub/wps/hubs/hub";

    #[test]
    fn test_tokenize_pairs() {
        let pairs = tokenize("/a/1/b/2").unwrap();
        assert_eq!(
            pairs,
            vec![
                RawSegment {
                    literal: "a",
                    value: "1"
                },
                RawSegment {
                    literal: "b",
                    value: "2"
                },
            ]
        );
    }

    #[test]
    fn test_tokenize_trailing_slash_after_pair_is_ignored() {
        let pairs = tokenize("/a/1/").unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(tokenize("/").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_trailing_slash_after_literal_is_empty_value() {
        let pairs = tokenize("/a/1/b/").unwrap();
        assert_eq!(pairs[1].value, "");
    }

    #[test]
    fn test_tokenize_rejects_malformed() {
        assert!(matches!(tokenize(""), Err(IdError::Malformed { .. })));
        assert!(matches!(tokenize("a/1"), Err(IdError::Malformed { .. })));
        assert!(matches!(
            tokenize("/a/1//2"),
            Err(IdError::Malformed { .. })
        ));
    }

    #[test]
    fn test_parse_exact() {
        let parsed = parse_segments(CANONICAL, TEMPLATE, MatchMode::Exact).unwrap();
        assert_eq!(
            parsed.values(),
            &[
                ("subscriptionId", "sub".to_string()),
                ("resourceGroupName", "rg".to_string()),
                ("webPubSubName", "wps".to_string()),
                ("hubName", "hub".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_exact_rejects_wrong_case() {
        let input = CANONICAL.replace("webPubSub", "WEBPUBSUB");
        assert_eq!(
            parse_segments(&input, TEMPLATE, MatchMode::Exact),
            Err(IdError::MissingElement {
                segment: "webPubSub"
            })
        );
        assert!(parse_segments(&input, TEMPLATE, MatchMode::Insensitive).is_ok());
    }

    #[test]
    fn test_parse_namespace() {
        let input = CANONICAL.replace("Microsoft.SignalRService", "microsoft.signalrservice");
        assert_eq!(
            parse_segments(&input, TEMPLATE, MatchMode::Exact),
            Err(IdError::UnexpectedNamespace {
                expected: "Microsoft.SignalRService",
                actual: "microsoft.signalrservice".to_string(),
            })
        );
        assert!(parse_segments(&input, TEMPLATE, MatchMode::Insensitive).is_ok());

        let input = CANONICAL.replace("Microsoft.SignalRService", "Microsoft.Web");
        assert!(matches!(
            parse_segments(&input, TEMPLATE, MatchMode::Insensitive),
            Err(IdError::UnexpectedNamespace { .. })
        ));
    }

    #[test]
    fn test_parse_missing_value() {
        let input = "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.SignalRService/webPubSub/";
        assert_eq!(
            parse_segments(input, TEMPLATE, MatchMode::Exact),
            Err(IdError::MissingValue {
                segment: "webPubSub"
            })
        );
    }

    #[test]
    fn test_parse_trailing_segments() {
        let input = format!("{}/extra/value", CANONICAL);
        assert_eq!(
            parse_segments(&input, TEMPLATE, MatchMode::Exact),
            Err(IdError::UnexpectedSegment {
                segment: "extra".to_string()
            })
        );
    }

    #[test]
    fn test_parse_out_of_order() {
        let input = "/resourceGroups/rg/subscriptions/sub/providers/Microsoft.SignalRService/webPubSub/wps/hubs/hub";
        assert_eq!(
            parse_segments(input, TEMPLATE, MatchMode::Exact),
            Err(IdError::UnexpectedSegment {
                segment: "resourceGroups".to_string()
            })
        );
    }

    #[test]
    fn test_parse_duplicate_literal_with_different_case() {
        let input = format!("{}/HUBS/other", CANONICAL);
        assert_eq!(
            parse_segments(&input, TEMPLATE, MatchMode::Insensitive),
            Err(IdError::UnexpectedSegment {
                segment: "HUBS".to_string()
            })
        );
    }

    #[test]
    fn test_format_and_describe() {
        let values = ["sub", "rg", "wps", "hub"];
        assert_eq!(format_segments(TEMPLATE, &values), CANONICAL);
        assert_eq!(
            describe_segments("Web Pubsub Hub", TEMPLATE, &values),
            "Web Pubsub Hub: (Hub Name \"hub\" / Web Pub Sub Name \"wps\" / Resource Group \"rg\")"
        );
    }

    #[test]
    fn test_parsed_segments_take() {
        let mut parsed = parse_segments(CANONICAL, TEMPLATE, MatchMode::Exact).unwrap();
        assert_eq!(parsed.take("hubName"), "hub");
        assert_eq!(parsed.take("hubName"), "");
        assert_eq!(parsed.take("unknown"), "");
    }

    #[test]
    fn test_match_mode() {
        assert!(MatchMode::Exact.matches("SignalR", "SignalR"));
        assert!(!MatchMode::Exact.matches("SignalR", "signalR"));
        assert!(MatchMode::Insensitive.matches("SignalR", "sIgNaLr"));
        assert_eq!(MatchMode::default(), MatchMode::Exact);
    }
}
