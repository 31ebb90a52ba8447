//! IDs for Web PubSub services, hubs and their child resources.

use super::{
    impl_resource_id_traits, ParsedSegments, ResourceId, Segment, RESOURCE_GROUP,
    SIGNALR_PROVIDER, SUBSCRIPTION,
};

const WEB_PUBSUB: Segment = Segment::user("webPubSub", "webPubSubName", "Web Pub Sub Name");

/// `/subscriptions/{subscriptionId}/resourceGroups/{resourceGroupName}/providers/Microsoft.SignalRService/webPubSub/{webPubSubName}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebPubsubId {
    /// Subscription the service lives in.
    pub subscription_id: String,
    /// Resource group the service lives in.
    pub resource_group_name: String,
    /// Name of the Web PubSub service.
    pub web_pub_sub_name: String,
}

impl WebPubsubId {
    /// Build an ID from its parts.
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        web_pub_sub_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            web_pub_sub_name: web_pub_sub_name.into(),
        }
    }
}

impl ResourceId for WebPubsubId {
    const TEMPLATE: &'static [Segment] =
        &[SUBSCRIPTION, RESOURCE_GROUP, SIGNALR_PROVIDER, WEB_PUBSUB];
    const DESCRIPTION: &'static str = "Web Pubsub";

    fn from_segments(mut segments: ParsedSegments) -> Self {
        Self {
            subscription_id: segments.take("subscriptionId"),
            resource_group_name: segments.take("resourceGroupName"),
            web_pub_sub_name: segments.take("webPubSubName"),
        }
    }

    fn segment_values(&self) -> Vec<&str> {
        vec![
            self.subscription_id.as_str(),
            self.resource_group_name.as_str(),
            self.web_pub_sub_name.as_str(),
        ]
    }
}

impl_resource_id_traits!(WebPubsubId);

/// Declares an ID type nested directly under a Web PubSub service.
macro_rules! web_pubsub_child_id {
    (
        $(#[$meta:meta])*
        $name:ident {
            field: $field:ident,
            literal: $literal:literal,
            key: $key:literal,
            label: $label:literal,
            description: $description:literal $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            /// Subscription the service lives in.
            pub subscription_id: String,
            /// Resource group the service lives in.
            pub resource_group_name: String,
            /// Name of the parent Web PubSub service.
            pub web_pub_sub_name: String,
            #[allow(missing_docs)]
            pub $field: String,
        }

        impl $name {
            /// Build an ID from its parts.
            pub fn new(
                subscription_id: impl Into<String>,
                resource_group_name: impl Into<String>,
                web_pub_sub_name: impl Into<String>,
                $field: impl Into<String>,
            ) -> Self {
                Self {
                    subscription_id: subscription_id.into(),
                    resource_group_name: resource_group_name.into(),
                    web_pub_sub_name: web_pub_sub_name.into(),
                    $field: $field.into(),
                }
            }

            /// The Web PubSub service this resource belongs to.
            pub fn web_pubsub_id(&self) -> WebPubsubId {
                WebPubsubId::new(
                    &self.subscription_id,
                    &self.resource_group_name,
                    &self.web_pub_sub_name,
                )
            }
        }

        impl ResourceId for $name {
            const TEMPLATE: &'static [Segment] = &[
                SUBSCRIPTION,
                RESOURCE_GROUP,
                SIGNALR_PROVIDER,
                WEB_PUBSUB,
                Segment::user($literal, $key, $label),
            ];
            const DESCRIPTION: &'static str = $description;

            fn from_segments(mut segments: ParsedSegments) -> Self {
                Self {
                    subscription_id: segments.take("subscriptionId"),
                    resource_group_name: segments.take("resourceGroupName"),
                    web_pub_sub_name: segments.take("webPubSubName"),
                    $field: segments.take($key),
                }
            }

            fn segment_values(&self) -> Vec<&str> {
                vec![
                    self.subscription_id.as_str(),
                    self.resource_group_name.as_str(),
                    self.web_pub_sub_name.as_str(),
                    self.$field.as_str(),
                ]
            }
        }

        impl_resource_id_traits!($name);
    };
}

web_pubsub_child_id! {
    /// `.../webPubSub/{webPubSubName}/hubs/{hubName}`
    WebPubsubHubId {
        field: hub_name,
        literal: "hubs",
        key: "hubName",
        label: "Hub Name",
        description: "Web Pubsub Hub",
    }
}

web_pubsub_child_id! {
    /// `.../webPubSub/{webPubSubName}/customCertificates/{customCertificateName}`
    WebPubsubCustomCertificateId {
        field: custom_certificate_name,
        literal: "customCertificates",
        key: "customCertificateName",
        label: "Custom Certificate Name",
        description: "Web Pubsub Custom Certificate",
    }
}

web_pubsub_child_id! {
    /// `.../webPubSub/{webPubSubName}/customDomains/{customDomainName}`
    WebPubsubCustomDomainId {
        field: custom_domain_name,
        literal: "customDomains",
        key: "customDomainName",
        label: "Custom Domain Name",
        description: "Web Pubsub Custom Domain",
    }
}

web_pubsub_child_id! {
    /// `.../webPubSub/{webPubSubName}/sharedPrivateLinkResources/{sharedPrivateLinkResourceName}`
    WebPubsubSharedPrivateLinkResourceId {
        field: shared_private_link_resource_name,
        literal: "sharedPrivateLinkResources",
        key: "sharedPrivateLinkResourceName",
        label: "Shared Private Link Resource Name",
        description: "Web Pubsub Shared Private Link Resource",
    }
}
